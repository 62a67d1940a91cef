use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Invalid input detected before a run starts. Never reported as an event.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid temperature '{0}': expected a finite number")]
    InvalidTemperature(String),

    #[error("model name must not be empty")]
    EmptyModel,

    #[error("请输入文本或选择文件")]
    EmptyInput,

    #[error("请至少选择一种目标语言")]
    NoTargetLanguages,

    #[error("unknown language: '{0}'")]
    UnknownLanguage(String),
}

/// Failure of a single language's translation. The run carries on.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Transport(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("translation stopped before the request was sent")]
    Stopped,

    #[error("failed to save {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TranslationError::MalformedResponse(err.to_string())
        } else {
            TranslationError::Transport(err.to_string())
        }
    }
}

/// Failure to start or finish a background run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("a translation run is already in progress")]
    AlreadyRunning,

    #[error("translation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
