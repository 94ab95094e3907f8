use crate::commentary::{Commentator, GeminiCommentator};
use crate::consts;
use crate::finalize::Finalizer;
use crate::history::JsonHistoryStore;
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Program configuration read from a configuration file
#[derive(Clone, Deserialize, Debug, Default, Eq, PartialEq)]
pub(crate) struct Config {
    /// Settings for post-game commentary
    #[serde(default)]
    pub(crate) commentary: CommentaryConfig,

    /// Settings about data files
    #[serde(default)]
    pub(crate) files: FileConfig,
}

impl Config {
    /// Return the default configuration file path
    pub(crate) fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_local_dir()
            .map(|p| p.join("neon-snake").join("config.toml"))
            .ok_or(ConfigError::NoPath)
    }

    /// Read configuration from a file on disk.  If the file does not exist and
    /// `allow_missing` is true, a default `Config` value is returned.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the file could not be read or if the file's contents
    /// could not be deserialized.
    pub(crate) fn load(path: &Path, allow_missing: bool) -> Result<Config, ConfigError> {
        let content = match fs_err::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
                return Ok(Config::default())
            }
            Err(e) => return Err(ConfigError::Read(e)),
        };
        toml::from_str(&content).map_err(Into::into)
    }

    /// Return the filepath at which the score history should be stored: the
    /// file given in the configuration or, if that is not set, the default
    /// history file path.  Return `None` if history should not be saved to
    /// disk or if no path is configured and the default path could not be
    /// computed.
    fn history_file(&self) -> Option<Cow<'_, Path>> {
        if !self.files.save_history {
            return None;
        }
        self.files
            .history_file
            .as_deref()
            .map(Cow::from)
            .or_else(|| JsonHistoryStore::default_path().map(Cow::from))
    }

    pub(crate) fn history_store(&self) -> JsonHistoryStore {
        let path = self.history_file().map(Cow::into_owned);
        match path {
            Some(ref p) => log::info!("Score history file: {}", p.display()),
            None => log::info!("Score history will not be saved to disk"),
        }
        JsonHistoryStore::new(path)
    }

    /// Return the API key for the commentary service: the one in the
    /// configuration or, failing that, the one in the environment
    fn api_key(&self) -> Option<String> {
        pick_api_key(
            self.commentary.api_key.as_deref(),
            std::env::var(consts::API_KEY_ENV_VAR).ok(),
        )
    }

    /// Construct the commentary service client.  Returns `None` if no API
    /// key is available, in which case every game gets a canned comment.
    pub(crate) fn commentator(&self) -> Option<Arc<dyn Commentator>> {
        let Some(api_key) = self.api_key() else {
            log::info!("No commentary API key configured; using canned comments");
            return None;
        };
        let commentator = GeminiCommentator::new(
            api_key,
            self.commentary.model.clone(),
            self.commentary.endpoint.clone(),
            self.commentary.timeout(),
        );
        log::info!("Using commentary service: {commentator:?}");
        Some(Arc::new(commentator))
    }

    pub(crate) fn finalizer(&self) -> Finalizer {
        Finalizer::new(self.commentator(), self.commentary.timeout())
    }
}

fn pick_api_key(configured: Option<&str>, from_env: Option<String>) -> Option<String> {
    configured
        .filter(|key| !key.trim().is_empty())
        .map(String::from)
        .or_else(|| from_env.filter(|key| !key.trim().is_empty()))
}

#[derive(Clone, Deserialize, Debug, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct CommentaryConfig {
    /// Key for the commentary service; overrides the environment variable
    api_key: Option<String>,

    /// Name of the text-generation model to ask for commentary
    model: String,

    /// Base URL of the text-generation API
    endpoint: String,

    /// Number of seconds to wait for commentary before giving up
    timeout_secs: u64,
}

impl CommentaryConfig {
    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs).min(consts::MAX_COMMENTARY_TIMEOUT)
    }
}

impl Default for CommentaryConfig {
    fn default() -> CommentaryConfig {
        CommentaryConfig {
            api_key: None,
            model: String::from(consts::DEFAULT_COMMENTARY_MODEL),
            endpoint: String::from(consts::DEFAULT_COMMENTARY_ENDPOINT),
            timeout_secs: consts::COMMENTARY_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Clone, Deserialize, Debug, Eq, PartialEq)]
#[serde(try_from = "RawFileConfig")]
pub(crate) struct FileConfig {
    /// Path at which the score history should be stored
    history_file: Option<PathBuf>,

    /// Whether to load & save the score history in a file
    save_history: bool,
}

impl Default for FileConfig {
    fn default() -> FileConfig {
        FileConfig {
            history_file: None,
            save_history: true,
        }
    }
}

#[derive(Clone, Deserialize, Debug, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
struct RawFileConfig {
    history_file: Option<String>,
    save_history: bool,
}

impl Default for RawFileConfig {
    fn default() -> RawFileConfig {
        RawFileConfig {
            history_file: None,
            save_history: true,
        }
    }
}

impl TryFrom<RawFileConfig> for FileConfig {
    type Error = std::io::Error;

    fn try_from(value: RawFileConfig) -> Result<FileConfig, std::io::Error> {
        Ok(FileConfig {
            history_file: value.history_file.map(expanduser::expanduser).transpose()?,
            save_history: value.save_history,
        })
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to determine path to local configuration directory")]
    NoPath,
    #[error("failed to read configuration file")]
    Read(#[from] std::io::Error),
    #[error("failed to parse configuration file")]
    Parse(#[from] toml::de::Error),
}
