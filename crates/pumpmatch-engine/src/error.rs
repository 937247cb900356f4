use pumpmatch_catalog::CatalogError;
use thiserror::Error;

/// Hard errors from the scoring pipeline.
///
/// Deliberately small: stage-local model failures (timeout, malformed
/// response) are recovered by degrading that stage's contribution to zero
/// and never appear here. A usable recommendation from the deterministic
/// stages alone must always be producible.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Catalog failed to load or validate. Fatal, startup-time only.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Caller-initiated cancellation. A distinct status, never a partial score.
    #[error("pipeline cancelled by caller")]
    Cancelled,

    /// A second-pass clarification answer did not match what the engine
    /// could have issued (unknown device, delta over cap). A caller bug.
    #[error("clarification answer rejected: {0}")]
    InvalidClarification(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_error_converts() {
        let err: EngineError = CatalogError::NoDevices.into();
        assert!(matches!(err, EngineError::Catalog(_)));
    }

    #[test]
    fn display_is_stable() {
        assert_eq!(
            EngineError::Cancelled.to_string(),
            "pipeline cancelled by caller"
        );
    }
}
