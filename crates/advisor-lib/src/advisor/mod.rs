//! Budget advisor
//!
//! Turns a [`MemoryProfile`] and a [`DeploymentConstraint`] into heap and
//! container limits. Every operation is a pure function of its arguments:
//! no I/O, no state between calls, and a failure for one input is a failure
//! for that input forever.
//!
//! The same safety margin is applied to heap and non-heap memory. Heap
//! headroom feeds the runtime heap flag; non-heap headroom is budgeted only
//! in the container limit because the heap flag never covers it.

mod validation;

#[cfg(test)]
mod tests;

pub use validation::{validate_constraint, validate_profile};

use crate::error::{fields, AdvisorError};
use crate::models::{AdvisoryWarning, DeploymentConstraint, MemoryProfile, Recommendation};
use tracing::debug;

/// Compute recommended heap and container limits for one instance
pub fn compute_recommendation(
    profile: &MemoryProfile,
    constraint: &DeploymentConstraint,
) -> Result<Recommendation, AdvisorError> {
    validate_profile(profile)?;
    validate_constraint(constraint)?;

    let margin = constraint.safety_margin_ratio;

    let headroom_heap_bytes = margin.apply_ceil(profile.peak_heap_used_bytes).ok_or_else(|| {
        AdvisorError::invalid(
            fields::PEAK_HEAP_USED_BYTES,
            "is too large to add headroom without overflowing",
        )
    })?;

    // Validation guarantees resident > heap.
    let non_heap_overhead_bytes = profile.peak_resident_bytes - profile.peak_heap_used_bytes;
    let headroom_non_heap_bytes = margin.apply_ceil(non_heap_overhead_bytes).ok_or_else(|| {
        AdvisorError::invalid(
            fields::PEAK_RESIDENT_BYTES,
            "is too large to add headroom without overflowing",
        )
    })?;

    let heap_limit = headroom_heap_bytes;
    let container_limit = headroom_heap_bytes
        .checked_add(headroom_non_heap_bytes)
        .ok_or_else(|| {
            AdvisorError::invalid(
                fields::PEAK_RESIDENT_BYTES,
                "is too large: container limit overflows",
            )
        })?;

    let mut warnings = Vec::new();

    if container_limit < constraint.platform_default_heap_bytes {
        let warning = AdvisoryWarning::explicit_heap_flag_required(
            container_limit,
            constraint.platform_default_heap_bytes,
        );
        debug!(
            kind = %warning.kind,
            container_limit_bytes = container_limit,
            platform_default_heap_bytes = constraint.platform_default_heap_bytes,
            "Flagging recommendation"
        );
        warnings.push(warning);
    }

    if heap_limit >= container_limit {
        return Err(AdvisorError::inconsistent(
            fields::RECOMMENDED_CONTAINER_LIMIT_BYTES,
            format!(
                "({container_limit}) must exceed the recommended heap limit ({heap_limit})"
            ),
        ));
    }

    if let Some(capacity) = constraint.node_pool_capacity_bytes {
        // An unrepresentable fleet total cannot fit any real node pool.
        let fleet = container_limit
            .checked_mul(u64::from(constraint.desired_replica_count))
            .unwrap_or(u64::MAX);
        if fleet > capacity {
            let warning = AdvisoryWarning::node_pool_capacity_exceeded(
                fleet,
                capacity,
                constraint.desired_replica_count,
            );
            debug!(
                kind = %warning.kind,
                fleet_bytes = fleet,
                node_pool_capacity_bytes = capacity,
                "Flagging recommendation"
            );
            warnings.push(warning);
        }
    }

    debug!(
        peak_heap_used_bytes = profile.peak_heap_used_bytes,
        peak_resident_bytes = profile.peak_resident_bytes,
        safety_margin_ratio = %margin,
        heap_limit_bytes = heap_limit,
        container_limit_bytes = container_limit,
        warnings = warnings.len(),
        "Computed recommendation"
    );

    Ok(Recommendation::new(heap_limit, container_limit, warnings))
}

/// Total memory the fleet of replicas must reserve
pub fn aggregate_fleet_budget(
    profile: &MemoryProfile,
    constraint: &DeploymentConstraint,
) -> Result<u64, AdvisorError> {
    compute_recommendation(profile, constraint)?.fleet_budget(constraint.desired_replica_count)
}
