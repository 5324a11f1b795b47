use thiserror::Error;

/// Failures raised by the rendering collaborator
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to start rendering session: {0}")]
    Session(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("navigation to {url} timed out after {secs}s")]
    NavigationTimeout { url: String, secs: u64 },

    #[error("browser command failed: {0}")]
    Command(String),
}

impl From<fantoccini::error::CmdError> for RenderError {
    fn from(error: fantoccini::error::CmdError) -> Self {
        RenderError::Command(error.to_string())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid CSS selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("validation error: {0}")]
    Validation(String),
}

/// Run-level errors; individual request failures never surface here
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid seed URL {url}: {source}")]
    InvalidSeed {
        url: String,
        source: url::ParseError,
    },

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("no request could be processed ({failures} failed)")]
    NothingProcessed { failures: usize },
}
