//! Entry validation
//!
//! Checks run in a fixed order and the first failure wins, so a given input
//! always reports the same field.

use crate::error::{fields, AdvisorError};
use crate::models::{DeploymentConstraint, MemoryProfile};

/// Reject profiles the advisor cannot budget for.
///
/// `peak_resident_bytes == peak_heap_used_bytes` is rejected on purpose even
/// though it is a consistent sample: a process with no non-heap memory does
/// not exist, and the container limit must stay strictly above the heap limit.
pub fn validate_profile(profile: &MemoryProfile) -> Result<(), AdvisorError> {
    if profile.peak_resident_bytes == 0 {
        return Err(AdvisorError::invalid(
            fields::PEAK_RESIDENT_BYTES,
            "must be greater than zero",
        ));
    }
    if profile.peak_heap_used_bytes == 0 {
        return Err(AdvisorError::invalid(
            fields::PEAK_HEAP_USED_BYTES,
            "must be greater than zero",
        ));
    }
    if profile.peak_heap_used_bytes > profile.peak_resident_bytes {
        return Err(AdvisorError::invalid(
            fields::PEAK_HEAP_USED_BYTES,
            format!(
                "({}) must not exceed peak_resident_bytes ({})",
                profile.peak_heap_used_bytes, profile.peak_resident_bytes
            ),
        ));
    }
    if profile.peak_heap_used_bytes == profile.peak_resident_bytes {
        return Err(AdvisorError::invalid(
            fields::PEAK_RESIDENT_BYTES,
            format!(
                "({}) must exceed peak_heap_used_bytes; equal peaks are rejected \
                 because they leave no room for non-heap memory",
                profile.peak_resident_bytes
            ),
        ));
    }
    Ok(())
}

pub fn validate_constraint(constraint: &DeploymentConstraint) -> Result<(), AdvisorError> {
    let margin = constraint.safety_margin_ratio;
    if !margin.is_positive() {
        return Err(AdvisorError::invalid(
            fields::SAFETY_MARGIN_RATIO,
            format!("({margin}) must be greater than zero"),
        ));
    }
    if margin.exceeds_one() {
        return Err(AdvisorError::invalid(
            fields::SAFETY_MARGIN_RATIO,
            format!("({margin}) must not exceed 1"),
        ));
    }
    if constraint.desired_replica_count == 0 {
        return Err(AdvisorError::invalid(
            fields::DESIRED_REPLICA_COUNT,
            "must be at least 1",
        ));
    }
    Ok(())
}
