use std::time::Duration;

use camino::Utf8PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream error in {context}: {reason}")]
    Upstream { context: String, reason: String },

    #[error("failed to download {count} pages: {pages:?}")]
    PartialDownload { count: usize, pages: Vec<String> },

    #[error("no images found in {0}")]
    EmptyDirectory(Utf8PathBuf),

    #[error("{0} doesn't exist, download the chapter first")]
    MissingLocalChapter(Utf8PathBuf),

    #[error("image viewer command timed out after {0:?}")]
    RenderTimeout(Duration),

    #[error("image viewer exited with {0}")]
    RenderFailed(std::process::ExitStatus),

    #[error("no valid image viewer configured")]
    NoViewer,

    #[error("invalid config key '{0}'")]
    InvalidConfigKey(String),

    #[error("invalid value '{value}' for config key '{key}'")]
    InvalidConfigValue { key: String, value: String },

    #[error("invalid chapter selection: {0}")]
    InvalidChapterSelection(String),

    #[error("'{0}' can't be used as a chapter directory")]
    InvalidLabel(String),

    #[error("home directory couldn't be determined")]
    NoHomeDir,

    #[error("path is not valid utf-8: {0}")]
    NonUtf8Path(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("reqwest middleware error: {0}")]
    ReqwestMiddleware(#[from] reqwest_middleware::Error),

    #[error("url parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    pub(crate) fn upstream(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::Upstream {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
