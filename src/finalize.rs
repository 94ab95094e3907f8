//! Turning a game that just ended into a history entry.  Commentary is
//! fetched on a worker thread so that the UI keeps running while it's
//! requested; whatever happens, each finished game yields exactly one
//! [`Finished`] value.
use crate::commentary::{fallback_comment, Commentator, CommentaryError};
use crate::game::{GameId, GameOver};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// A finished game together with the comment to record for it
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Finished {
    pub(crate) game_over: GameOver,
    pub(crate) comment: String,
}

impl Finished {
    fn with_fallback(game_over: GameOver) -> Finished {
        Finished {
            game_over,
            comment: fallback_comment(game_over.score).to_owned(),
        }
    }
}

#[derive(Debug)]
struct Reply {
    game: GameId,
    result: Result<String, CommentaryError>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Pending {
    game_over: GameOver,
    /// `None` if the timeout is too large to be represented as an `Instant`,
    /// in which case the commentary is waited for indefinitely
    deadline: Option<Instant>,
}

#[derive(Debug)]
pub(crate) struct Finalizer {
    commentator: Option<Arc<dyn Commentator>>,
    timeout: Duration,
    /// At most one game is awaiting commentary at a time
    pending: Option<Pending>,
    sender: Sender<Reply>,
    receiver: Receiver<Reply>,
}

impl Finalizer {
    pub(crate) fn new(commentator: Option<Arc<dyn Commentator>>, timeout: Duration) -> Finalizer {
        let (sender, receiver) = channel();
        Finalizer {
            commentator,
            timeout,
            pending: None,
            sender,
            receiver,
        }
    }

    /// Start finalizing a game that has just ended.  If no commentary needs
    /// to be waited for, the result is returned immediately; otherwise, it
    /// will be returned by a later call to [`Finalizer::poll()`] or
    /// [`Finalizer::supersede()`].
    pub(crate) fn begin(&mut self, game_over: GameOver, now: Instant) -> Option<Finished> {
        debug_assert!(
            self.pending.is_none(),
            "previous game should be finalized before another one ends"
        );
        let Some(ref commentator) = self.commentator else {
            return Some(Finished::with_fallback(game_over));
        };
        let commentator = Arc::clone(commentator);
        let sender = self.sender.clone();
        let GameOver { game, score, cause } = game_over;
        let spawned = thread::Builder::new()
            .name(String::from("commentary"))
            .spawn(move || {
                let result = commentator.generate(score, cause);
                // Nobody may be listening anymore if the app has quit
                let _ = sender.send(Reply { game, result });
            });
        match spawned {
            Ok(_) => {
                log::debug!("Requested commentary for {game:?} (score {score}, {cause})");
                self.pending = Some(Pending {
                    game_over,
                    deadline: now.checked_add(self.timeout),
                });
                None
            }
            Err(e) => {
                log::warn!("Failed to spawn commentary thread: {e}");
                Some(Finished::with_fallback(game_over))
            }
        }
    }

    /// Collect any commentary that has arrived, and give up on commentary
    /// that is overdue.  Replies for games that have already been finalized
    /// are discarded.
    pub(crate) fn poll(&mut self, now: Instant) -> Option<Finished> {
        while let Ok(Reply { game, result }) = self.receiver.try_recv() {
            match self.pending {
                Some(p) if p.game_over.game == game => {
                    self.pending = None;
                    let comment = match result {
                        Ok(comment) => comment,
                        Err(e) => {
                            log::warn!(
                                "{:?}; using fallback comment",
                                anyhow::Error::from(e)
                            );
                            fallback_comment(p.game_over.score).to_owned()
                        }
                    };
                    return Some(Finished {
                        game_over: p.game_over,
                        comment,
                    });
                }
                _ => log::debug!("Discarding stale commentary for {game:?}"),
            }
        }
        let p = self
            .pending
            .filter(|p| p.deadline.is_some_and(|deadline| now >= deadline))?;
        log::warn!("Timed out waiting for commentary; using fallback comment");
        self.pending = None;
        Some(Finished::with_fallback(p.game_over))
    }

    /// Stop waiting for commentary on the pending game, if any, and finalize
    /// it with the fallback comment.  Called when a new game starts or the
    /// app quits before the commentary arrives.
    pub(crate) fn supersede(&mut self) -> Option<Finished> {
        let p = self.pending.take()?;
        log::info!("No longer waiting for commentary on {:?}", p.game_over.game);
        Some(Finished::with_fallback(p.game_over))
    }

    /// Is commentary currently being waited for?
    pub(crate) fn waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// The time at which the pending commentary will be given up on
    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.pending.and_then(|p| p.deadline)
    }
}
