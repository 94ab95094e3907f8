use crate::consts;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A record of one finished game
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct ScoreEntry {
    /// Milliseconds since the Unix epoch at which the game was recorded.
    /// Unique within a [`History`]; a larger ID means a more recent game.
    pub(crate) id: u64,
    pub(crate) score: u32,
    /// Local date & time of the game, for display
    pub(crate) date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) comment: Option<String>,
}

impl ScoreEntry {
    fn new(id: u64, score: u32, comment: Option<String>, when: DateTime<Local>) -> ScoreEntry {
        ScoreEntry {
            id,
            score,
            date: when.format("%m-%d %H:%M").to_string(),
            comment,
        }
    }
}

/// The ranked list of past games: highest score first, with ties broken in
/// favor of the more recent game, and never more than
/// [`HISTORY_CAPACITY`][consts::HISTORY_CAPACITY] entries long
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(from = "Vec<ScoreEntry>", into = "Vec<ScoreEntry>")]
pub(crate) struct History(Vec<ScoreEntry>);

impl History {
    pub(crate) fn entries(&self) -> &[ScoreEntry] {
        &self.0
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Add an entry, then re-rank and drop whatever falls off the bottom
    pub(crate) fn insert(&mut self, entry: ScoreEntry) {
        self.0.push(entry);
        self.rank();
    }

    /// Return an ID for a new entry recorded at `now_millis` that is greater
    /// than every ID already present
    pub(crate) fn next_id(&self, now_millis: u64) -> u64 {
        match self.0.iter().map(|e| e.id).max() {
            Some(latest) if latest >= now_millis => latest.saturating_add(1),
            _ => now_millis,
        }
    }

    fn rank(&mut self) {
        self.0
            .sort_by(|a, b| b.score.cmp(&a.score).then_with(|| b.id.cmp(&a.id)));
        self.0.truncate(consts::HISTORY_CAPACITY);
    }
}

impl From<Vec<ScoreEntry>> for History {
    fn from(entries: Vec<ScoreEntry>) -> History {
        let mut history = History(entries);
        history.rank();
        history
    }
}

impl From<History> for Vec<ScoreEntry> {
    fn from(history: History) -> Vec<ScoreEntry> {
        history.0
    }
}

/// Somewhere to keep the score history between runs
pub(crate) trait HistoryStore {
    /// Return the stored history.  Unreadable storage yields an empty
    /// history.
    fn load(&mut self) -> History;

    /// Record a finished game and return the updated history
    fn save(&mut self, score: u32, comment: Option<String>) -> History;

    /// Forget every recorded game
    fn clear(&mut self) -> History;
}

/// A [`HistoryStore`] backed by a JSON file.  Without a file path, the
/// history is only kept in memory for the life of the process.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct JsonHistoryStore {
    path: Option<PathBuf>,
    cache: History,
}

impl JsonHistoryStore {
    pub(crate) fn new(path: Option<PathBuf>) -> JsonHistoryStore {
        JsonHistoryStore {
            path,
            cache: History::default(),
        }
    }

    /// Return the default history file path
    pub(crate) fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|p| p.join("neon-snake").join("history.json"))
    }

    fn read(path: &Path) -> Result<History, LoadError> {
        let src = match fs_err::read(path) {
            Ok(src) => src,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(History::default()),
            Err(e) => return Err(LoadError::read(e)),
        };
        serde_json::from_slice(&src).map_err(LoadError::deserialize)
    }

    fn write(path: &Path, history: &History) -> Result<(), SaveError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent).map_err(SaveError::mkdir)?;
        }
        let mut src = serde_json::to_string_pretty(history).map_err(SaveError::serialize)?;
        src.push('\n');
        fs_err::write(path, &src).map_err(SaveError::write)?;
        Ok(())
    }

    fn current(&self) -> History {
        match self.path {
            Some(ref path) => Self::read(path).unwrap_or_else(|e| {
                log::warn!("{:?}; treating history as empty", anyhow::Error::from(e));
                History::default()
            }),
            None => self.cache.clone(),
        }
    }

    fn store(&mut self, history: History) -> History {
        if let Some(ref path) = self.path {
            if let Err(e) = Self::write(path, &history) {
                log::warn!("{:?}", anyhow::Error::from(e));
            }
        }
        self.cache = history.clone();
        history
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&mut self) -> History {
        self.cache = self.current();
        self.cache.clone()
    }

    fn save(&mut self, score: u32, comment: Option<String>) -> History {
        let now = Local::now();
        let mut history = self.current();
        let id = history.next_id(u64::try_from(now.timestamp_millis()).unwrap_or_default());
        history.insert(ScoreEntry::new(id, score, comment, now));
        log::info!("Recorded score {score} in history ({} entries)", history.entries().len());
        self.store(history)
    }

    fn clear(&mut self) -> History {
        log::info!("Clearing score history");
        self.store(History::default())
    }
}

#[derive(Debug, Error)]
#[error("Failed to save score history to disk")]
pub(crate) struct SaveError(#[source] SaveErrorSource);

impl SaveError {
    fn mkdir(e: std::io::Error) -> Self {
        SaveError(SaveErrorSource::Mkdir(e))
    }

    fn serialize(e: serde_json::Error) -> Self {
        SaveError(SaveErrorSource::Serialize(e))
    }

    fn write(e: std::io::Error) -> Self {
        SaveError(SaveErrorSource::Write(e))
    }
}

#[derive(Debug, Error)]
enum SaveErrorSource {
    #[error("failed to create parent directories")]
    Mkdir(#[source] std::io::Error),
    #[error("failed to serialize score history")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write score history file")]
    Write(#[source] std::io::Error),
}

#[derive(Debug, Error)]
#[error("Failed to read score history from disk")]
pub(crate) struct LoadError(#[source] LoadErrorSource);

impl LoadError {
    fn read(e: std::io::Error) -> Self {
        LoadError(LoadErrorSource::Read(e))
    }

    fn deserialize(e: serde_json::Error) -> Self {
        LoadError(LoadErrorSource::Deserialize(e))
    }
}

#[derive(Debug, Error)]
enum LoadErrorSource {
    #[error("failed to read score history file")]
    Read(#[source] std::io::Error),
    #[error("failed to deserialize score history")]
    Deserialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: u64, score: u32) -> ScoreEntry {
        ScoreEntry {
            id,
            score,
            date: String::from("10-16 12:00"),
            comment: None,
        }
    }

    fn scores(history: &History) -> Vec<u32> {
        history.entries().iter().map(|e| e.score).collect()
    }

    #[test]
    fn ranks_by_score_then_recency() {
        let mut history = History::default();
        history.insert(entry(1, 3));
        history.insert(entry(2, 10));
        history.insert(entry(3, 3));
        history.insert(entry(4, 7));
        let ids = history.entries().iter().map(|e| e.id).collect::<Vec<_>>();
        assert_eq!(ids, [2, 4, 3, 1]);
    }

    #[test]
    fn full_history_evicts_lowest() {
        let mut history = History::from((1..=20).map(|n| entry(u64::from(n), n)).collect::<Vec<_>>());
        assert_eq!(scores(&history), (1..=20).rev().collect::<Vec<_>>());
        history.insert(entry(100, 15));
        assert_eq!(history.entries().len(), 20);
        let mut expected = (2..=20).rev().collect::<Vec<_>>();
        expected.insert(5, 15);
        assert_eq!(scores(&history), expected);
        // The new entry outranks the older entry with the same score
        assert_eq!(history.entries()[5].id, 100);
        assert_eq!(history.entries()[6].id, 15);
        assert!(history.entries().iter().all(|e| e.score != 1));
    }

    #[test]
    fn low_score_does_not_enter_full_history() {
        let mut history = History::from((1..=20).map(|n| entry(u64::from(n), n + 10)).collect::<Vec<_>>());
        let before = history.clone();
        history.insert(entry(100, 5));
        assert_eq!(history, before);
    }

    #[test]
    fn next_id_is_monotonic() {
        let history = History::from(vec![entry(5000, 1), entry(7000, 2)]);
        assert_eq!(history.next_id(9000), 9000);
        assert_eq!(history.next_id(7000), 7001);
        assert_eq!(history.next_id(10), 7001);
        assert_eq!(History::default().next_id(10), 10);
    }

    #[test]
    fn deserialize_reranks() {
        let src = r#"[
            {"id": 1, "score": 2, "date": "01-01 00:00"},
            {"id": 2, "score": 9, "date": "01-02 00:00", "comment": "Nice!"}
        ]"#;
        let history = serde_json::from_str::<History>(src).unwrap();
        assert_eq!(scores(&history), [9, 2]);
        assert_eq!(history.entries()[0].comment.as_deref(), Some("Nice!"));
        assert_eq!(history.entries()[1].comment, None);
    }

    #[test]
    fn entry_without_comment_omits_key() {
        let src = serde_json::to_string(&entry(1, 2)).unwrap();
        assert_eq!(src, r#"{"id":1,"score":2,"date":"10-16 12:00"}"#);
    }

    #[test]
    fn save_and_reload() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("nested").join("history.json");
        let mut store = JsonHistoryStore::new(Some(path.clone()));
        assert!(store.load().is_empty());
        let history = store.save(4, Some(String::from("Keep at it!")));
        assert_eq!(scores(&history), [4]);
        let history = store.save(9, None);
        assert_eq!(scores(&history), [9, 4]);
        assert!(history.entries()[0].id > history.entries()[1].id);
        assert!(path.exists());
        let mut reopened = JsonHistoryStore::new(Some(path));
        assert_eq!(reopened.load(), history);
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("history.json");
        fs_err::write(&path, "{not json").unwrap();
        let mut store = JsonHistoryStore::new(Some(path));
        assert!(store.load().is_empty());
        let history = store.save(3, None);
        assert_eq!(scores(&history), [3]);
    }

    #[test]
    fn clear_forgets_everything() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("history.json");
        let mut store = JsonHistoryStore::new(Some(path.clone()));
        store.save(3, None);
        store.save(5, None);
        assert!(store.clear().is_empty());
        assert!(JsonHistoryStore::new(Some(path)).load().is_empty());
    }

    #[test]
    fn memory_only() {
        let mut store = JsonHistoryStore::new(None);
        assert!(store.load().is_empty());
        store.save(2, None);
        let history = store.save(8, None);
        assert_eq!(scores(&history), [8, 2]);
        assert_eq!(store.load(), history);
    }
}
