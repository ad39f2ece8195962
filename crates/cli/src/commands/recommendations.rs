//! Recommendation-related CLI commands

use advisor_lib::{
    aggregate_fleet_budget, compute_recommendation, AdvisorError, DeploymentConstraint,
    MemoryProfile, Recommendation, StructuredLogger,
};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::config::AdvisorInput;
use crate::output::{
    color_warning, print_info, print_json, print_success, print_table, print_warning, BudgetRow,
    OutputFormat,
};

/// JSON document printed by `recommend`
#[derive(Serialize)]
struct AdvisoryReport<'a> {
    generated_at: String,
    workload: &'a str,
    profile: &'a MemoryProfile,
    constraint: &'a DeploymentConstraint,
    recommendation: &'a Recommendation,
    node_options: String,
    fleet_budget_bytes: u64,
}

/// JSON document printed by `fleet`
#[derive(Serialize)]
struct FleetReport<'a> {
    workload: &'a str,
    desired_replica_count: u32,
    fleet_budget_bytes: u64,
}

/// Compute a recommendation, logging rejected input before surfacing it
pub fn advise(input: &AdvisorInput, logger: &StructuredLogger) -> Result<Recommendation> {
    match compute_recommendation(&input.profile, &input.constraint) {
        Ok(recommendation) => {
            logger.log_recommendation(&input.profile, &input.constraint, &recommendation);
            Ok(recommendation)
        }
        Err(e) => {
            logger.log_rejected(&e);
            Err(e.into())
        }
    }
}

/// Log a fleet total, or the rejection that prevented it
fn logged_fleet_total(
    input: &AdvisorInput,
    logger: &StructuredLogger,
    total: Result<u64, AdvisorError>,
) -> Result<u64> {
    match total {
        Ok(total) => {
            logger.log_fleet_budget(input.constraint.desired_replica_count, total);
            Ok(total)
        }
        Err(e) => {
            logger.log_rejected(&e);
            Err(e.into())
        }
    }
}

/// Print heap and container recommendations with their warnings
pub fn recommend(input: &AdvisorInput, logger: &StructuredLogger, format: OutputFormat) -> Result<()> {
    let recommendation = advise(input, logger)?;
    let fleet_budget_bytes = logged_fleet_total(
        input,
        logger,
        recommendation.fleet_budget(input.constraint.desired_replica_count),
    )?;

    match format {
        OutputFormat::Json => {
            let report = AdvisoryReport {
                generated_at: chrono::Utc::now().to_rfc3339(),
                workload: logger.workload(),
                profile: &input.profile,
                constraint: &input.constraint,
                recommendation: &recommendation,
                node_options: recommendation.node_options(),
                fleet_budget_bytes,
            };
            print_json(&report)?;
        }
        OutputFormat::Table => {
            println!(
                "{} {}",
                "Memory budget for".bold(),
                logger.workload().cyan()
            );
            let replicas = input.constraint.desired_replica_count;
            print_table(vec![
                BudgetRow::new("Peak heap used", input.profile.peak_heap_used_bytes),
                BudgetRow::new("Peak resident", input.profile.peak_resident_bytes),
                BudgetRow::new("Heap limit", recommendation.recommended_heap_limit_bytes()),
                BudgetRow::new(
                    "Container limit",
                    recommendation.recommended_container_limit_bytes(),
                ),
                BudgetRow::new(format!("Fleet budget (x{})", replicas), fleet_budget_bytes),
            ]);
            println!(
                "Safety margin:          {}",
                input.constraint.safety_margin_ratio
            );
            print_info(&format!("NODE_OPTIONS={}", recommendation.node_options()));

            if recommendation.warnings().is_empty() {
                print_success("No risky configuration detected");
            } else {
                for warning in recommendation.warnings() {
                    print_warning(&color_warning(warning));
                }
            }
        }
    }

    Ok(())
}

/// Print the total memory the fleet must reserve
pub fn fleet(input: &AdvisorInput, logger: &StructuredLogger, format: OutputFormat) -> Result<()> {
    let total = logged_fleet_total(
        input,
        logger,
        aggregate_fleet_budget(&input.profile, &input.constraint),
    )?;
    let replicas = input.constraint.desired_replica_count;

    match format {
        OutputFormat::Json => {
            print_json(&FleetReport {
                workload: logger.workload(),
                desired_replica_count: replicas,
                fleet_budget_bytes: total,
            })?;
        }
        OutputFormat::Table => {
            print_table(vec![BudgetRow::new(
                format!("Fleet budget (x{})", replicas),
                total,
            )]);
        }
    }

    Ok(())
}
