use crate::command::Command;
use crate::consts;
use crate::finalize::{Finished, Finalizer};
use crate::game::{board_size, Action, Game, Status};
use crate::history::{History, HistoryStore, JsonHistoryStore};
use crate::panel::HistoryPanel;
use crate::util::get_display_area;
use crossterm::event::{poll, read, Event};
use rand::Rng;
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Widget,
    Terminal,
};
use std::io;
use std::time::Instant;

/// The whole program: a game, the score history beside it, and the
/// machinery for recording each finished game
#[derive(Debug)]
pub(crate) struct App<S = JsonHistoryStore, R = rand::rngs::ThreadRng> {
    game: Game<R>,
    store: S,
    /// The ranking currently on display
    history: History,
    finalizer: Finalizer,
    /// When the game should next advance.  Only set while the game is being
    /// played.
    next_tick: Option<Instant>,
    quitting: bool,
}

impl<S: HistoryStore, R: Rng> App<S, R> {
    pub(crate) fn new(game: Game<R>, mut store: S, finalizer: Finalizer) -> App<S, R> {
        let history = store.load();
        App {
            game,
            store,
            history,
            finalizer,
            next_tick: None,
            quitting: false,
        }
    }

    pub(crate) fn run<B: Backend>(mut self, mut terminal: Terminal<B>) -> io::Result<()> {
        let r = self.main_loop(&mut terminal);
        // Make sure a game that ended just before quitting gets recorded
        self.quit();
        r
    }

    fn main_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.quitting {
            terminal.draw(|frame| frame.render_widget(&*self, frame.area()))?;
            self.process_input()?;
        }
        Ok(())
    }

    /// Wait for either the next tick or the next input event, and handle
    /// whichever comes first
    fn process_input(&mut self) -> io::Result<()> {
        self.collect_commentary(Instant::now());
        if self.game.status() == Status::Playing {
            if self.next_tick.is_none() {
                self.next_tick = Some(Instant::now() + self.game.tick_period());
            }
        } else {
            self.next_tick = None;
        }
        let now = Instant::now();
        let mut wait = self.next_tick.map(|t| t.saturating_duration_since(now));
        if self.finalizer.waiting() {
            // Wake up regularly to check on the commentary
            let check = self.finalizer.deadline().map_or(consts::IDLE_POLL_PERIOD, |deadline| {
                deadline
                    .saturating_duration_since(now)
                    .min(consts::IDLE_POLL_PERIOD)
            });
            wait = Some(wait.map_or(check, |w| w.min(check)));
        }
        let have_event = match wait {
            Some(w) => !w.is_zero() && poll(w)?,
            None => true,
        };
        if have_event {
            let event = read()?;
            self.handle_event(event, Instant::now());
        } else if self.next_tick.is_some_and(|t| t <= Instant::now()) {
            self.next_tick = None;
            self.tick(Instant::now());
        }
        Ok(())
    }

    fn tick(&mut self, now: Instant) {
        if let Some(game_over) = self.game.step() {
            log::info!(
                "Game over: scored {} points, died by {}",
                game_over.score,
                game_over.cause
            );
            if let Some(finished) = self.finalizer.begin(game_over, now) {
                self.record(finished);
            }
        }
    }

    fn collect_commentary(&mut self, now: Instant) {
        if let Some(finished) = self.finalizer.poll(now) {
            self.record(finished);
        }
    }

    fn record(&mut self, finished: Finished) {
        self.history = self
            .store
            .save(finished.game_over.score, Some(finished.comment));
    }

    fn handle_event(&mut self, event: Event, now: Instant) {
        if event == Event::FocusLost {
            if self.game.status() == Status::Playing {
                self.game.request_action();
            }
            return;
        }
        self.collect_commentary(now);
        if let Some(cmd) = event.as_key_press_event().and_then(Command::from_key_event) {
            self.handle_command(cmd);
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Turn(direction) => self.game.request_direction(direction),
            Command::Action => {
                if Action::for_status(self.game.status()).starts_game() {
                    if let Some(finished) = self.finalizer.supersede() {
                        self.record(finished);
                    }
                }
                let action = self.game.request_action();
                log::debug!("Player action: {action:?}");
            }
            Command::ClearHistory => {
                if self.can_clear_history() {
                    self.history = self.store.clear();
                }
            }
            Command::Quit => self.quit(),
        }
    }

    fn quit(&mut self) {
        if let Some(finished) = self.finalizer.supersede() {
            self.record(finished);
        }
        self.quitting = true;
    }
}

impl<S, R> App<S, R> {
    fn can_clear_history(&self) -> bool {
        matches!(self.game.status(), Status::Idle | Status::GameOver(_))
    }

    fn render_score_bar(&self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, consts::SCORE_BAR_STYLE);
        let mut spans = vec![
            Span::raw(format!(" SCORE {:>4}", self.game.score())),
            Span::raw(format!("   SPEED {:>3} ms", self.game.tick_period().as_millis())),
        ];
        if let Some(best) = self.history.entries().first() {
            spans.push(Span::styled(
                format!("   BEST {:>4}", best.score),
                consts::TOP_SCORE_STYLE,
            ));
        }
        Line::from(spans).render(area, buf);
        if self.finalizer.waiting() {
            Line::styled("thinking... ", consts::THINKING_STYLE)
                .right_aligned()
                .render(area, buf);
        }
    }

    fn render_hints(&self, area: Rect, buf: &mut Buffer) {
        let action = Action::for_status(self.game.status());
        let mut spans = vec![
            Span::styled("space", consts::KEY_STYLE),
            Span::raw(format!(" {}   ", action.label())),
            Span::styled("←↓↑→", consts::KEY_STYLE),
            Span::raw(" steer   "),
        ];
        if self.can_clear_history() {
            spans.push(Span::styled("c", consts::KEY_STYLE));
            spans.push(Span::raw(" clear history   "));
        }
        spans.push(Span::styled("q", consts::KEY_STYLE));
        spans.push(Span::raw(" quit"));
        Line::from(spans).centered().render(area, buf);
    }
}

impl<S, R> Widget for &App<S, R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let display = get_display_area(area);
        let [bar_area, main_area, hint_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(display);
        let board = board_size();
        let [board_area, panel_area] =
            Layout::horizontal([Constraint::Length(board.width), Constraint::Fill(1)])
                .areas(main_area);
        self.render_score_bar(bar_area, buf);
        self.game.render(board_area, buf);
        HistoryPanel::new(&self.history).render(panel_area, buf);
        self.render_hints(hint_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commentary::{fallback_comment, Commentator, CommentaryError};
    use crate::game::{DeathCause, Direction};
    use crate::history::ScoreEntry;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;
    use std::sync::mpsc::{channel, Receiver, Sender};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct RecordingStore {
        saves: Vec<(u32, Option<String>)>,
        clears: usize,
        history: History,
    }

    impl HistoryStore for RecordingStore {
        fn load(&mut self) -> History {
            self.history.clone()
        }

        fn save(&mut self, score: u32, comment: Option<String>) -> History {
            self.saves.push((score, comment.clone()));
            let id = u64::try_from(self.saves.len()).unwrap();
            self.history.insert(ScoreEntry {
                id,
                score,
                date: String::from("10-16 12:00"),
                comment,
            });
            self.history.clone()
        }

        fn clear(&mut self) -> History {
            self.clears += 1;
            self.history = History::default();
            self.history.clone()
        }
    }

    /// Doesn't reply until the gate is opened or dropped
    #[derive(Debug)]
    struct Gated(Mutex<Receiver<()>>);

    impl Commentator for Gated {
        fn generate(&self, score: u32, _cause: DeathCause) -> Result<String, CommentaryError> {
            let _ = self.0.lock().unwrap().recv();
            Ok(format!("Late remark about {score}"))
        }
    }

    type TestApp = App<RecordingStore, ChaCha12Rng>;

    fn app(finalizer: Finalizer) -> TestApp {
        let rng = ChaCha12Rng::seed_from_u64(0x0123456789ABCDEF);
        App::new(
            Game::new_with_rng(rng),
            RecordingStore::default(),
            finalizer,
        )
    }

    fn gated_app() -> (TestApp, Sender<()>) {
        let (gate, rx) = channel();
        let finalizer = Finalizer::new(
            Some(Arc::new(Gated(Mutex::new(rx)))),
            Duration::from_secs(60),
        );
        (app(finalizer), gate)
    }

    /// Steer the snake into the left wall and tick until it dies
    fn play_into_wall(app: &mut TestApp) {
        app.handle_command(Command::Action);
        assert_eq!(app.game.status(), Status::Playing);
        app.handle_command(Command::Turn(Direction::Left));
        for _ in 0..100 {
            app.tick(Instant::now());
            if app.game.status() != Status::Playing {
                break;
            }
        }
        assert_eq!(app.game.status(), Status::GameOver(DeathCause::Wall));
    }

    fn render(app: &TestApp) -> Vec<String> {
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        app.render(area, &mut buf);
        (0..24)
            .map(|y| (0..80).map(|x| buf[(x, y)].symbol()).collect())
            .collect()
    }

    #[test]
    fn game_over_is_recorded_once() {
        let mut app = app(Finalizer::new(None, Duration::from_secs(60)));
        play_into_wall(&mut app);
        let score = app.game.score();
        assert_eq!(
            app.store.saves,
            [(score, Some(String::from(fallback_comment(score))))]
        );
        assert_eq!(app.history, app.store.history);
        app.tick(Instant::now());
        app.collect_commentary(Instant::now());
        assert_eq!(app.store.saves.len(), 1);
    }

    #[test]
    fn retry_supersedes_pending_commentary() {
        let (mut app, gate) = gated_app();
        play_into_wall(&mut app);
        let score = app.game.score();
        assert!(app.store.saves.is_empty());
        assert!(app.finalizer.waiting());
        assert!(render(&app)[0].contains("thinking..."));
        app.handle_command(Command::Action);
        assert_eq!(app.game.status(), Status::Playing);
        assert_eq!(app.game.score(), 0);
        assert_eq!(
            app.store.saves,
            [(score, Some(String::from(fallback_comment(score))))]
        );
        assert!(!app.finalizer.waiting());
        // The late reply for the first game must not be recorded
        drop(gate);
        std::thread::sleep(Duration::from_millis(50));
        app.collect_commentary(Instant::now());
        assert_eq!(app.store.saves.len(), 1);
    }

    #[test]
    fn commentary_is_recorded_when_it_arrives() {
        let (mut app, gate) = gated_app();
        play_into_wall(&mut app);
        let score = app.game.score();
        gate.send(()).unwrap();
        let start = Instant::now();
        while app.store.saves.is_empty() {
            assert!(start.elapsed() < Duration::from_secs(10));
            std::thread::sleep(Duration::from_millis(1));
            app.collect_commentary(Instant::now());
        }
        assert_eq!(
            app.store.saves,
            [(score, Some(format!("Late remark about {score}")))]
        );
        assert_eq!(
            app.history.entries()[0].comment.as_deref(),
            Some(format!("Late remark about {score}").as_str())
        );
    }

    #[test]
    fn quit_supersedes_pending_commentary() {
        let (mut app, _gate) = gated_app();
        play_into_wall(&mut app);
        app.handle_command(Command::Quit);
        assert!(app.quitting);
        assert_eq!(app.store.saves.len(), 1);
        app.quit();
        assert_eq!(app.store.saves.len(), 1);
    }

    #[test]
    fn clear_history_only_between_games() {
        let mut app = app(Finalizer::new(None, Duration::from_secs(60)));
        play_into_wall(&mut app);
        assert!(!app.history.is_empty());
        app.handle_command(Command::Action);
        app.handle_command(Command::ClearHistory);
        assert_eq!(app.store.clears, 0);
        assert!(!app.history.is_empty());
        app.handle_command(Command::Action);
        assert_eq!(app.game.status(), Status::Paused);
        app.handle_command(Command::ClearHistory);
        assert_eq!(app.store.clears, 0);
        app.handle_command(Command::Action);
        app.handle_command(Command::Turn(Direction::Left));
        for _ in 0..100 {
            app.tick(Instant::now());
        }
        app.handle_command(Command::ClearHistory);
        assert_eq!(app.store.clears, 1);
        assert!(app.history.is_empty());
    }

    #[test]
    fn focus_lost_pauses() {
        let mut app = app(Finalizer::new(None, Duration::from_secs(60)));
        app.handle_event(Event::FocusLost, Instant::now());
        assert_eq!(app.game.status(), Status::Idle);
        app.handle_command(Command::Action);
        app.handle_event(Event::FocusLost, Instant::now());
        assert_eq!(app.game.status(), Status::Paused);
        app.handle_event(Event::FocusLost, Instant::now());
        assert_eq!(app.game.status(), Status::Paused);
    }

    #[test]
    fn render_idle() {
        let app = app(Finalizer::new(None, Duration::from_secs(60)));
        let screen = render(&app);
        assert!(screen[0].starts_with(" SCORE    0   SPEED 150 ms"));
        assert!(!screen[0].contains("BEST"));
        assert!(screen[1].contains(" NEON SNAKE "));
        assert!(screen[1].contains(" HALL OF FAME "));
        assert!(screen[2].contains("No records yet."));
        assert!(screen[23].contains("space Start"));
        assert!(screen[23].contains("c clear history"));
    }

    #[test]
    fn render_playing() {
        let mut app = app(Finalizer::new(None, Duration::from_secs(60)));
        play_into_wall(&mut app);
        let score = app.game.score();
        app.handle_command(Command::Action);
        let screen = render(&app);
        assert!(screen[0].contains(&format!("BEST {score:>4}")));
        assert!(screen[23].contains("space Pause"));
        assert!(!screen[23].contains("clear history"));
    }
}
