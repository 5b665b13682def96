use std::path::PathBuf;

/// Crate-wide error type.
///
/// The executor and evaluator never hand these to their callers: they are
/// folded into `ResponseResult::error` and `AssertionOutcome::error`. Setup
/// paths (config, collection files, report output) return them directly.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to access `{}`: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Extraction(String),

    #[error("{0}")]
    Assertion(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl EngineError {
    /// Render the error together with its chain of causes, e.g.
    /// `error sending request for url (..): client error (Connect): tcp connect error`.
    pub fn describe(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.ends_with(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }
}
