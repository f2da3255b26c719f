use thiserror::Error;

/// Errors from the durable conversation store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store cannot be reached or returned malformed data.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A write was rejected or failed mid-flight. The caller decides
    /// whether to retry or surface the failure; the store never retries.
    #[error("store write failed: {0}")]
    WriteFailed(String),
}

/// Errors surfaced by the broadcast coordinator.
///
/// Every variant is handled identically at the boundary: logged, surfaced
/// to the originating connection as an `error` event with a short reason,
/// and the triggering event otherwise dropped with no partial state
/// mutation.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Malformed event, rejected before touching the registry or store.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// A store failure crossing the coordinator boundary.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "store unavailable: connection refused");
    }

    #[test]
    fn test_write_failed_display() {
        let err = StoreError::WriteFailed("disk full".to_string());
        assert_eq!(err.to_string(), "store write failed: disk full");
    }

    #[test]
    fn test_relay_error_from_store_error() {
        let err: RelayError = StoreError::Unavailable("timeout".to_string()).into();
        assert!(matches!(err, RelayError::Store(_)));
        assert_eq!(err.to_string(), "store unavailable: timeout");
    }

    #[test]
    fn test_invalid_payload_display() {
        let err = RelayError::InvalidPayload("missing conversationId".to_string());
        assert_eq!(err.to_string(), "invalid payload: missing conversationId");
    }
}
