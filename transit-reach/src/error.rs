//! Crate-level error type and its classification for callers.

use crate::config::ConfigError;
use crate::domain::{InvalidDayType, TimeError};
use crate::graph::StoreError;
use crate::reach::SearchError;
use crate::timeline::TimelineError;

/// How a request-handling layer should treat an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request itself is malformed
    BadRequest,
    /// The request names something that does not exist
    NotFound,
    /// Graphs are not loaded yet; retrying later may succeed
    NotReady,
    /// The caller gave up on the request
    Cancelled,
    /// Anything else
    Internal,
}

impl ErrorClass {
    /// Equivalent HTTP status code.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorClass::BadRequest => 400,
            ErrorClass::NotFound => 404,
            // Client closed request
            ErrorClass::Cancelled => 499,
            ErrorClass::NotReady => 503,
            ErrorClass::Internal => 500,
        }
    }

    /// Whether the caller is at fault.
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            ErrorClass::BadRequest | ErrorClass::NotFound | ErrorClass::Cancelled
        )
    }
}

/// Any error the engine can surface.
#[derive(Debug, thiserror::Error)]
pub enum ReachError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    DayType(#[from] InvalidDayType),

    #[error(transparent)]
    Time(#[from] TimeError),

    /// A request field outside the configured limits
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A failure outside the engine's own logic, such as a panicked task
    #[error("internal error: {0}")]
    Internal(String),
}

impl ReachError {
    /// Classify the error for a request-handling layer.
    pub fn class(&self) -> ErrorClass {
        match self {
            ReachError::Search(SearchError::UnknownStop(_)) => ErrorClass::NotFound,
            ReachError::Search(SearchError::InvalidParameter(_)) => ErrorClass::BadRequest,
            ReachError::Search(SearchError::Cancelled) => ErrorClass::Cancelled,
            ReachError::Timeline(_)
            | ReachError::DayType(_)
            | ReachError::Time(_)
            | ReachError::InvalidRequest(_) => ErrorClass::BadRequest,
            ReachError::Store(StoreError::GraphUnavailable(_)) => ErrorClass::NotReady,
            ReachError::Store(_)
            | ReachError::Config(_)
            | ReachError::Internal(_) => ErrorClass::Internal,
        }
    }
}
