//! Route registry errors
//!
//! Every variant is recoverable: the dispatcher turns each one into a reply.

use thiserror::Error;

/// Result type for registry operations
pub type RouteResult<T> = Result<T, RouteError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// No route with this number
    #[error("Route not found: {0}")]
    NotFound(String),

    /// A route with this number already exists
    #[error("Route already exists: {0}")]
    DuplicateKey(String),

    /// Backup or spreadsheet write failed; in-memory state was restored
    #[error("Failed to persist routes: {0}")]
    PersistenceFailure(String),

    /// Malformed administrative payload
    #[error("Malformed payload: {0}")]
    FormatError(String),

    /// Sender is not on the admin allow-list
    #[error("Permission denied")]
    PermissionDenied,

    /// Spreadsheet still loading, or bot still warming up
    #[error("Routes not ready")]
    NotReady,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_detail() {
        let err = RouteError::DuplicateKey("100".to_string());
        assert_eq!(err.to_string(), "Route already exists: 100");

        let err = RouteError::PersistenceFailure("disk full".to_string());
        assert!(err.to_string().contains("disk full"));
    }
}
