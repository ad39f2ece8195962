//! Core data models for the budget advisor

use crate::error::{fields, AdvisorError};
use crate::margin::SafetyMargin;
use crate::units::{self, deserialize_bytes, deserialize_opt_bytes};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observed memory behavior of a workload over a representative run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryProfile {
    /// Highest observed heap occupancy
    #[serde(deserialize_with = "deserialize_bytes")]
    pub peak_heap_used_bytes: u64,
    /// Highest observed resident memory (heap plus native buffers, stacks, metadata)
    #[serde(deserialize_with = "deserialize_bytes")]
    pub peak_resident_bytes: u64,
}

/// Operator-supplied limits and targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConstraint {
    /// Instances expected to share the node pool
    pub desired_replica_count: u32,
    /// Headroom above the observed peaks, in (0, 1]
    pub safety_margin_ratio: SafetyMargin,
    /// Heap ceiling the runtime uses when no heap flag is given
    #[serde(deserialize_with = "deserialize_bytes")]
    pub platform_default_heap_bytes: u64,
    /// Allocatable memory of the node pool, if known
    #[serde(
        default,
        deserialize_with = "deserialize_opt_bytes",
        skip_serializing_if = "Option::is_none"
    )]
    pub node_pool_capacity_bytes: Option<u64>,
}

/// Kind of risk flagged on a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The container limit sits below the runtime's default heap ceiling
    ExplicitHeapFlagRequired,
    /// Replicas times the container limit does not fit the node pool
    NodePoolCapacityExceeded,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExplicitHeapFlagRequired => "explicit_heap_flag_required",
            Self::NodePoolCapacityExceeded => "node_pool_capacity_exceeded",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic attached to a recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryWarning {
    pub kind: WarningKind,
    pub message: String,
}

impl AdvisoryWarning {
    pub fn explicit_heap_flag_required(container_limit_bytes: u64, platform_default_heap_bytes: u64) -> Self {
        Self {
            kind: WarningKind::ExplicitHeapFlagRequired,
            message: format!(
                "container limit {} is lower than the platform default heap ceiling {}; \
                 an explicit heap-limit flag is mandatory or the runtime will grow its heap \
                 past the container limit and be OOM-killed at or before startup",
                units::format_bytes(container_limit_bytes),
                units::format_bytes(platform_default_heap_bytes),
            ),
        }
    }

    pub fn node_pool_capacity_exceeded(fleet_bytes: u64, capacity_bytes: u64, replicas: u32) -> Self {
        Self {
            kind: WarningKind::NodePoolCapacityExceeded,
            message: format!(
                "{} replicas need {} in total but the node pool only has {}; \
                 some replicas will not be schedulable",
                replicas,
                units::format_bytes(fleet_bytes),
                units::format_bytes(capacity_bytes),
            ),
        }
    }
}

impl fmt::Display for AdvisoryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Output of one advisory computation.
///
/// Only the advisor builds these, so `recommended_container_limit_bytes >
/// recommended_heap_limit_bytes > 0` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    recommended_heap_limit_bytes: u64,
    recommended_container_limit_bytes: u64,
    warnings: Vec<AdvisoryWarning>,
}

impl Recommendation {
    pub(crate) fn new(
        recommended_heap_limit_bytes: u64,
        recommended_container_limit_bytes: u64,
        warnings: Vec<AdvisoryWarning>,
    ) -> Self {
        Self {
            recommended_heap_limit_bytes,
            recommended_container_limit_bytes,
            warnings,
        }
    }

    pub fn recommended_heap_limit_bytes(&self) -> u64 {
        self.recommended_heap_limit_bytes
    }

    pub fn recommended_container_limit_bytes(&self) -> u64 {
        self.recommended_container_limit_bytes
    }

    pub fn warnings(&self) -> &[AdvisoryWarning] {
        &self.warnings
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }

    /// Heap limit in whole mebibytes, rounded up, as heap flags expect
    pub fn heap_limit_mib(&self) -> u64 {
        units::ceil_mib(self.recommended_heap_limit_bytes)
    }

    /// Launch option that pins the runtime heap to the recommended limit
    pub fn node_options(&self) -> String {
        format!("--max-old-space-size={}", self.heap_limit_mib())
    }

    /// Memory `replicas` instances of this recommendation reserve together
    pub fn fleet_budget(&self, replicas: u32) -> Result<u64, AdvisorError> {
        self.recommended_container_limit_bytes
            .checked_mul(u64::from(replicas))
            .ok_or_else(|| {
                AdvisorError::invalid(
                    fields::DESIRED_REPLICA_COUNT,
                    "is too large: fleet budget overflows",
                )
            })
    }
}
