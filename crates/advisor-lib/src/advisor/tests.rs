//! Tests for the budget advisor
//!
//! Concrete scenarios first, then property tests over the whole valid input
//! space.

use crate::advisor::{aggregate_fleet_budget, compute_recommendation};
use crate::error::{fields, AdvisorError};
use crate::margin::SafetyMargin;
use crate::models::{DeploymentConstraint, MemoryProfile, WarningKind};
use proptest::prelude::*;

fn profile(heap: u64, resident: u64) -> MemoryProfile {
    MemoryProfile {
        peak_heap_used_bytes: heap,
        peak_resident_bytes: resident,
    }
}

fn constraint(replicas: u32, margin: &str, default_heap: u64) -> DeploymentConstraint {
    DeploymentConstraint {
        desired_replica_count: replicas,
        safety_margin_ratio: margin.parse().unwrap(),
        platform_default_heap_bytes: default_heap,
        node_pool_capacity_bytes: None,
    }
}

fn assert_invalid(result: Result<impl std::fmt::Debug, AdvisorError>, field: &str) {
    match result {
        Err(err @ AdvisorError::InvalidInput { .. }) => assert_eq!(err.field(), field),
        other => panic!("expected InvalidInput on {field}, got {other:?}"),
    }
}

#[test]
fn test_reference_scenario() {
    let p = profile(150_000_000, 180_000_000);
    let c = constraint(2, "0.33", 900_000_000);

    let rec = compute_recommendation(&p, &c).unwrap();
    assert_eq!(rec.recommended_heap_limit_bytes(), 199_500_000);
    assert_eq!(rec.recommended_container_limit_bytes(), 239_400_000);
    assert_eq!(rec.warnings().len(), 1);
    assert!(rec.has_warning(WarningKind::ExplicitHeapFlagRequired));

    assert_eq!(aggregate_fleet_budget(&p, &c).unwrap(), 478_800_000);
}

#[test]
fn test_no_warning_when_container_covers_default_heap() {
    let p = profile(150_000_000, 180_000_000);
    let c = constraint(2, "0.33", 239_400_000);

    let rec = compute_recommendation(&p, &c).unwrap();
    assert!(rec.warnings().is_empty());
}

#[test]
fn test_zero_profile_fails_on_resident() {
    let result = compute_recommendation(&profile(0, 0), &constraint(1, "0.5", 0));
    assert_invalid(result, fields::PEAK_RESIDENT_BYTES);
}

#[test]
fn test_zero_heap_rejected() {
    let result = compute_recommendation(&profile(0, 100), &constraint(1, "0.5", 0));
    assert_invalid(result, fields::PEAK_HEAP_USED_BYTES);
}

#[test]
fn test_heap_above_resident_is_not_clamped() {
    let result = compute_recommendation(&profile(200, 100), &constraint(1, "0.5", 0));
    assert_invalid(result, fields::PEAK_HEAP_USED_BYTES);
}

#[test]
fn test_heap_equal_to_resident_rejected() {
    let result = compute_recommendation(&profile(100, 100), &constraint(1, "0.5", 0));
    match &result {
        Err(AdvisorError::InvalidInput { reason, .. }) => {
            assert!(reason.contains("equal peaks are rejected"), "reason: {reason}")
        }
        other => panic!("expected InvalidInput, got {other:?}"),
    }
    assert_invalid(result, fields::PEAK_RESIDENT_BYTES);

    // One byte of non-heap memory is enough.
    assert!(compute_recommendation(&profile(100, 101), &constraint(1, "0.5", 0)).is_ok());
}

#[test]
fn test_margin_bounds() {
    let p = profile(100, 200);
    assert_invalid(
        compute_recommendation(&p, &constraint(1, "0", 0)),
        fields::SAFETY_MARGIN_RATIO,
    );
    assert_invalid(
        compute_recommendation(&p, &constraint(1, "-0.2", 0)),
        fields::SAFETY_MARGIN_RATIO,
    );
    assert_invalid(
        compute_recommendation(&p, &constraint(1, "1.5", 0)),
        fields::SAFETY_MARGIN_RATIO,
    );
    assert!(compute_recommendation(&p, &constraint(1, "1", 0)).is_ok());
}

#[test]
fn test_zero_replicas_rejected() {
    let result = compute_recommendation(&profile(100, 200), &constraint(0, "0.5", 0));
    assert_invalid(result, fields::DESIRED_REPLICA_COUNT);
}

#[test]
fn test_fleet_budget_propagates_validation() {
    let result = aggregate_fleet_budget(&profile(0, 0), &constraint(3, "0.5", 0));
    assert_invalid(result, fields::PEAK_RESIDENT_BYTES);
}

#[test]
fn test_profile_checked_before_constraint() {
    let result = compute_recommendation(&profile(0, 0), &constraint(0, "0", 0));
    assert_invalid(result, fields::PEAK_RESIDENT_BYTES);
}

#[test]
fn test_headroom_overflow_is_invalid_input() {
    let p = profile(u64::MAX - 1, u64::MAX);
    let result = compute_recommendation(&p, &constraint(1, "1", 0));
    assert_invalid(result, fields::PEAK_HEAP_USED_BYTES);
}

#[test]
fn test_fleet_overflow_is_invalid_input() {
    let p = profile(1 << 40, 1 << 41);
    let result = aggregate_fleet_budget(&p, &constraint(u32::MAX, "1", 0));
    assert_invalid(result, fields::DESIRED_REPLICA_COUNT);
}

#[test]
fn test_node_pool_capacity_warning() {
    let p = profile(150_000_000, 180_000_000);
    let mut c = constraint(4, "0.33", 0);

    // 4 * 239_400_000 = 957_600_000
    c.node_pool_capacity_bytes = Some(900_000_000);
    let rec = compute_recommendation(&p, &c).unwrap();
    assert!(rec.has_warning(WarningKind::NodePoolCapacityExceeded));
    assert!(!rec.has_warning(WarningKind::ExplicitHeapFlagRequired));

    c.node_pool_capacity_bytes = Some(957_600_000);
    let rec = compute_recommendation(&p, &c).unwrap();
    assert!(rec.warnings().is_empty());
}

#[test]
fn test_warnings_keep_evaluation_order() {
    let p = profile(150_000_000, 180_000_000);
    let mut c = constraint(4, "0.33", 900_000_000);
    c.node_pool_capacity_bytes = Some(500_000_000);

    let rec = compute_recommendation(&p, &c).unwrap();
    let kinds: Vec<_> = rec.warnings().iter().map(|w| w.kind).collect();
    assert_eq!(
        kinds,
        vec![
            WarningKind::ExplicitHeapFlagRequired,
            WarningKind::NodePoolCapacityExceeded
        ]
    );
}

#[test]
fn test_repeated_calls_are_identical() {
    let p = profile(123_456_789, 150_000_001);
    let c = constraint(3, "0.17", 2_000_000_000);
    assert_eq!(
        compute_recommendation(&p, &c),
        compute_recommendation(&p, &c)
    );
    let bad = profile(10, 5);
    assert_eq!(
        compute_recommendation(&bad, &c),
        compute_recommendation(&bad, &c)
    );
}

#[test]
fn test_default_margin_is_twenty_percent() {
    let c = DeploymentConstraint {
        desired_replica_count: 1,
        safety_margin_ratio: SafetyMargin::default(),
        platform_default_heap_bytes: 0,
        node_pool_capacity_bytes: None,
    };
    let rec = compute_recommendation(&profile(100, 150), &c).unwrap();
    assert_eq!(rec.recommended_heap_limit_bytes(), 120);
    assert_eq!(rec.recommended_container_limit_bytes(), 180);
}

/// Margins in (0, 1] with three decimal places
fn margin_strategy() -> impl Strategy<Value = SafetyMargin> {
    (1i64..=1000).prop_map(|n| SafetyMargin::from_parts(n, 3).unwrap())
}

fn profile_strategy() -> impl Strategy<Value = MemoryProfile> {
    (1u64..=1 << 40, 1u64..=1 << 36).prop_map(|(heap, overhead)| MemoryProfile {
        peak_heap_used_bytes: heap,
        peak_resident_bytes: heap + overhead,
    })
}

fn constraint_with(margin: SafetyMargin, replicas: u32, default_heap: u64) -> DeploymentConstraint {
    DeploymentConstraint {
        desired_replica_count: replicas,
        safety_margin_ratio: margin,
        platform_default_heap_bytes: default_heap,
        node_pool_capacity_bytes: None,
    }
}

proptest! {
    #[test]
    fn container_exceeds_heap_exceeds_zero(
        p in profile_strategy(),
        margin in margin_strategy(),
        replicas in 1u32..=1000,
        default_heap in 0u64..=1 << 42,
    ) {
        let rec = compute_recommendation(&p, &constraint_with(margin, replicas, default_heap)).unwrap();
        prop_assert!(rec.recommended_heap_limit_bytes() > 0);
        prop_assert!(rec.recommended_container_limit_bytes() > rec.recommended_heap_limit_bytes());
        prop_assert!(rec.recommended_heap_limit_bytes() >= p.peak_heap_used_bytes);
        prop_assert!(rec.recommended_container_limit_bytes() >= p.peak_resident_bytes);
    }

    #[test]
    fn larger_margin_never_decreases_limits(
        p in profile_strategy(),
        a in 1i64..=1000,
        b in 1i64..=1000,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low = SafetyMargin::from_parts(low, 3).unwrap();
        let high = SafetyMargin::from_parts(high, 3).unwrap();

        let rec_low = compute_recommendation(&p, &constraint_with(low, 1, 0)).unwrap();
        let rec_high = compute_recommendation(&p, &constraint_with(high, 1, 0)).unwrap();
        prop_assert!(rec_high.recommended_heap_limit_bytes() >= rec_low.recommended_heap_limit_bytes());
        prop_assert!(rec_high.recommended_container_limit_bytes() >= rec_low.recommended_container_limit_bytes());
    }

    #[test]
    fn fleet_budget_scales_with_replicas(
        p in profile_strategy(),
        margin in margin_strategy(),
        replicas in 1u32..=10_000,
    ) {
        let c = constraint_with(margin, replicas, 0);
        let rec = compute_recommendation(&p, &c).unwrap();
        let fleet = aggregate_fleet_budget(&p, &c).unwrap();
        prop_assert_eq!(fleet, rec.recommended_container_limit_bytes() * u64::from(replicas));
    }

    #[test]
    fn heap_flag_warning_appears_exactly_once(
        p in profile_strategy(),
        margin in margin_strategy(),
        excess in 1u64..=1 << 30,
    ) {
        let baseline = compute_recommendation(&p, &constraint_with(margin, 1, 0)).unwrap();
        let container = baseline.recommended_container_limit_bytes();
        prop_assert!(baseline.warnings().is_empty());

        let rec = compute_recommendation(&p, &constraint_with(margin, 1, container + excess)).unwrap();
        let count = rec
            .warnings()
            .iter()
            .filter(|w| w.kind == WarningKind::ExplicitHeapFlagRequired)
            .count();
        prop_assert_eq!(count, 1);

        let at_limit = compute_recommendation(&p, &constraint_with(margin, 1, container)).unwrap();
        prop_assert!(at_limit.warnings().is_empty());
    }

    #[test]
    fn heap_above_resident_always_rejected(
        resident in 1u64..=1 << 40,
        excess in 1u64..=1 << 20,
        margin in margin_strategy(),
    ) {
        let p = MemoryProfile {
            peak_heap_used_bytes: resident + excess,
            peak_resident_bytes: resident,
        };
        let result = compute_recommendation(&p, &constraint_with(margin, 1, 0));
        let rejected = matches!(result, Err(AdvisorError::InvalidInput { .. }));
        prop_assert!(rejected, "expected InvalidInput, got {:?}", result);
    }
}
