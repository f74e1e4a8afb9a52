use thiserror::Error;

use crate::config::ConfigError;
use crate::session::SessionError;

/// Unified result type for the curtain crate.
pub type Result<T> = std::result::Result<T, CurtainError>;

/// Errors surfaced by the page runtime.
///
/// Missing elements, missing media and missing fragment targets are not
/// errors; plugins branch on them. These variants cover misconfiguration and
/// host I/O only.
#[derive(Debug, Error)]
pub enum CurtainError {
    #[error("element `{0}` not found")]
    ElementNotFound(String),
    #[error("element `{0}` already exists")]
    DuplicateElement(String),
    #[error("element `{0}` is not a media element")]
    NotMedia(String),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    #[error("invalid deep link: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("terminal backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
