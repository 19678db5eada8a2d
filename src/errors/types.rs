use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Stale element reference: {0}")]
    StaleElement(String),

    #[error("Element {element} is not clickable, click would land on {obscured_by}")]
    ClickIntercepted { element: String, obscured_by: String },

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Timed out after {waited_ms}ms waiting for {condition}")]
    Timeout { condition: String, waited_ms: u64 },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Driver session is closed")]
    SessionClosed,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Profile parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Chrome error: {0}")]
    ChromeError(String),
}

/// How a fault raised inside an otherwise-resolved flow is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// A bounded wait expired.
    Timeout,
    /// The page refused the interaction (e.g. the click was intercepted).
    Rejected,
    /// Any other failure coming out of the driver.
    Driver,
}

impl ProbeError {
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            ProbeError::Timeout { .. } => FaultKind::Timeout,
            ProbeError::ClickIntercepted { .. } => FaultKind::Rejected,
            _ => FaultKind::Driver,
        }
    }

    pub fn from_any_error<E: std::fmt::Display>(err: E) -> Self {
        ProbeError::ChromeError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_kinds_follow_variant() {
        let timeout = ProbeError::Timeout {
            condition: "title to contain 'x'".to_string(),
            waited_ms: 10,
        };
        assert_eq!(timeout.fault_kind(), FaultKind::Timeout);

        let intercepted = ProbeError::ClickIntercepted {
            element: "<button>".to_string(),
            obscured_by: "<div.overlay>".to_string(),
        };
        assert_eq!(intercepted.fault_kind(), FaultKind::Rejected);
        assert!(intercepted.to_string().contains("not clickable"));

        assert_eq!(ProbeError::SessionClosed.fault_kind(), FaultKind::Driver);
    }
}
