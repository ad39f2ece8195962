//! Structured logging for advisory events
//!
//! Every record carries an `event` field and the workload label so the
//! output of many advisor runs can be filtered and joined downstream.

use crate::error::AdvisorError;
use crate::models::{DeploymentConstraint, MemoryProfile, Recommendation};
use tracing::{error, info, warn};

/// `event` field of the record logged for a rejected call
pub fn rejection_event(err: &AdvisorError) -> &'static str {
    match err {
        AdvisorError::InvalidInput { .. } => "input_rejected",
        AdvisorError::InternalInconsistency { .. } => "postcondition_violated",
    }
}

/// Structured logger for advisor events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    workload: String,
}

impl StructuredLogger {
    pub fn new(workload: impl Into<String>) -> Self {
        Self {
            workload: workload.into(),
        }
    }

    pub fn workload(&self) -> &str {
        &self.workload
    }

    /// Log a computed recommendation, one extra record per warning
    pub fn log_recommendation(
        &self,
        profile: &MemoryProfile,
        constraint: &DeploymentConstraint,
        recommendation: &Recommendation,
    ) {
        info!(
            event = "recommendation_computed",
            workload = %self.workload,
            peak_heap_used_bytes = profile.peak_heap_used_bytes,
            peak_resident_bytes = profile.peak_resident_bytes,
            safety_margin_ratio = %constraint.safety_margin_ratio,
            desired_replica_count = constraint.desired_replica_count,
            heap_limit_bytes = recommendation.recommended_heap_limit_bytes(),
            container_limit_bytes = recommendation.recommended_container_limit_bytes(),
            warnings = recommendation.warnings().len(),
            "Computed memory budget recommendation"
        );

        for warning in recommendation.warnings() {
            warn!(
                event = "recommendation_warning",
                workload = %self.workload,
                kind = %warning.kind,
                details = %warning.message,
                "Risky memory configuration"
            );
        }
    }

    /// Log the total reserved by the fleet
    pub fn log_fleet_budget(&self, replicas: u32, total_bytes: u64) {
        info!(
            event = "fleet_budget_computed",
            workload = %self.workload,
            desired_replica_count = replicas,
            fleet_budget_bytes = total_bytes,
            "Computed fleet memory budget"
        );
    }

    /// Log a rejected advisory call
    pub fn log_rejected(&self, err: &AdvisorError) {
        match err {
            AdvisorError::InvalidInput { .. } => {
                warn!(
                    event = rejection_event(err),
                    workload = %self.workload,
                    kind = err.kind(),
                    field = err.field(),
                    error = %err,
                    "Advisor input rejected"
                );
            }
            AdvisorError::InternalInconsistency { .. } => {
                error!(
                    event = rejection_event(err),
                    workload = %self.workload,
                    kind = err.kind(),
                    field = err.field(),
                    error = %err,
                    "Advisor postcondition violated"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::compute_recommendation;
    use crate::error::fields;

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("checkout-api");
        assert_eq!(logger.workload(), "checkout-api");
    }

    #[test]
    fn test_rejection_events_are_distinct() {
        let invalid = AdvisorError::invalid(fields::PEAK_RESIDENT_BYTES, "must be greater than zero");
        let internal =
            AdvisorError::inconsistent(fields::RECOMMENDED_CONTAINER_LIMIT_BYTES, "too small");
        assert_eq!(rejection_event(&invalid), "input_rejected");
        assert_eq!(rejection_event(&internal), "postcondition_violated");

        let logger = StructuredLogger::new("checkout-api");
        logger.log_rejected(&internal);
    }

    #[test]
    fn test_logging_without_subscriber_is_a_no_op() {
        let logger = StructuredLogger::new("checkout-api");
        let profile = MemoryProfile {
            peak_heap_used_bytes: 100,
            peak_resident_bytes: 150,
        };
        let constraint = DeploymentConstraint {
            desired_replica_count: 2,
            safety_margin_ratio: "0.5".parse().unwrap(),
            platform_default_heap_bytes: 1_000,
            node_pool_capacity_bytes: None,
        };
        let rec = compute_recommendation(&profile, &constraint).unwrap();

        logger.log_recommendation(&profile, &constraint, &rec);
        logger.log_fleet_budget(2, rec.recommended_container_limit_bytes() * 2);
        logger.log_rejected(&AdvisorError::invalid(fields::PEAK_RESIDENT_BYTES, "must be greater than zero"));
    }
}
