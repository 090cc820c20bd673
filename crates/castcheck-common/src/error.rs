use thiserror::Error;

/// Errors surfaced by a browser driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Driver not ready")]
    NotReady,

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element not visible after {timeout_ms}ms: {locator}")]
    NotVisible { locator: String, timeout_ms: u64 },

    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    /// The page changed underneath a lookup. Waits treat this as "not yet".
    #[error("Stale element: {0}")]
    Stale(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Driver error: {0}")]
    Other(String),
}

impl DriverError {
    /// Whether a bounded wait may keep polling after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, DriverError::ElementNotFound(_) | DriverError::Stale(_))
    }
}
