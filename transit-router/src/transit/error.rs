//! Snapshot loading error types.

use crate::domain::DomainError;

/// Errors that can occur when loading a transit snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Reading the snapshot file failed
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot JSON is malformed
    #[error("snapshot JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot content is inconsistent
    #[error("invalid snapshot: {0}")]
    Invalid(#[from] DomainError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PatternIndex;

    #[test]
    fn error_display() {
        let err = SnapshotError::from(DomainError::PatternTooShort(PatternIndex(2)));
        assert_eq!(
            err.to_string(),
            "invalid snapshot: pattern P2 has fewer than two stops"
        );

        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = SnapshotError::from(json_err);
        assert!(err.to_string().starts_with("snapshot JSON parse error"));
    }
}
