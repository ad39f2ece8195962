//! Error taxonomy for the budget advisor

/// Names of the input fields an [`AdvisorError`] can point at
pub mod fields {
    pub const PEAK_HEAP_USED_BYTES: &str = "peak_heap_used_bytes";
    pub const PEAK_RESIDENT_BYTES: &str = "peak_resident_bytes";
    pub const DESIRED_REPLICA_COUNT: &str = "desired_replica_count";
    pub const SAFETY_MARGIN_RATIO: &str = "safety_margin_ratio";
    pub const RECOMMENDED_CONTAINER_LIMIT_BYTES: &str = "recommended_container_limit_bytes";
}

/// Failure of a single advisory computation.
///
/// Both kinds are deterministic: calling again with the same inputs
/// reproduces the same error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdvisorError {
    /// A precondition on the caller's data was violated
    #[error("invalid input: {field} {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// A postcondition the advisor guarantees did not hold
    #[error("internal inconsistency: {field} {detail}")]
    InternalInconsistency { field: &'static str, detail: String },
}

impl AdvisorError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn inconsistent(field: &'static str, detail: impl Into<String>) -> Self {
        Self::InternalInconsistency {
            field,
            detail: detail.into(),
        }
    }

    /// The offending field
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidInput { field, .. } | Self::InternalInconsistency { field, .. } => field,
        }
    }

    /// Short machine-readable kind, used in log records
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::InternalInconsistency { .. } => "internal_inconsistency",
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_field() {
        let err = AdvisorError::invalid(fields::PEAK_RESIDENT_BYTES, "must be greater than zero");
        assert_eq!(
            err.to_string(),
            "invalid input: peak_resident_bytes must be greater than zero"
        );
        assert_eq!(err.field(), "peak_resident_bytes");
        assert_eq!(err.kind(), "invalid_input");
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_inconsistency_kind() {
        let err = AdvisorError::inconsistent(fields::RECOMMENDED_CONTAINER_LIMIT_BYTES, "too small");
        assert_eq!(err.kind(), "internal_inconsistency");
        assert!(!err.is_invalid_input());
        assert!(err.to_string().starts_with("internal inconsistency:"));
    }
}
