use std::time::Duration;

use thiserror::Error;

/// Faults raised by the browser layer.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("timed out after {:.1}s waiting for '{selector}'", .waited.as_secs_f64())]
    Timeout { selector: String, waited: Duration },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid selector '{0}'")]
    Selector(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no page loaded")]
    NoPage,
}

/// Operator input rejected before anything is sent to the portal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid input!")]
    EmptyTerm,

    #[error("Invalid input!")]
    NotANumber,

    #[error("Number out of range! (expected 1..={max}, got {index})")]
    OutOfRange { index: usize, max: usize },
}
