//! Kubernetes patch rendering
//!
//! Emits a strategic-merge patch for a Deployment's pod template. Applying
//! it is left to the operator (`kubectl patch deployment <name> -p ...`).

use advisor_lib::units::to_quantity_string;
use advisor_lib::{Recommendation, StructuredLogger};
use anyhow::Result;
use k8s_openapi::api::core::v1::{Container, EnvVar, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::recommendations::advise;
use crate::config::AdvisorInput;
use crate::output::{eprint_warning, print_json};

/// Environment variable the Node.js runtime reads launch flags from
pub const NODE_OPTIONS_ENV: &str = "NODE_OPTIONS";

/// Container fragment carrying the recommended memory settings.
///
/// Request equals limit so the pod is never scheduled onto memory it may
/// not get.
pub fn container_patch(recommendation: &Recommendation, container_name: &str) -> Container {
    let memory = Quantity(to_quantity_string(
        recommendation.recommended_container_limit_bytes(),
    ));
    let resources: BTreeMap<String, Quantity> = [("memory".to_string(), memory)].into();

    Container {
        name: container_name.to_string(),
        resources: Some(ResourceRequirements {
            limits: Some(resources.clone()),
            requests: Some(resources),
            ..Default::default()
        }),
        env: Some(vec![EnvVar {
            name: NODE_OPTIONS_ENV.to_string(),
            value: Some(recommendation.node_options()),
            ..Default::default()
        }]),
        ..Default::default()
    }
}

/// Strategic-merge patch for a Deployment
pub fn deployment_patch(recommendation: &Recommendation, container_name: &str) -> Result<Value> {
    let container = serde_json::to_value(container_patch(recommendation, container_name))?;
    Ok(json!({
        "spec": {
            "template": {
                "spec": {
                    "containers": [container]
                }
            }
        }
    }))
}

/// Print the patch on stdout; warnings go to stderr so the output can be piped
pub fn patch(input: &AdvisorInput, logger: &StructuredLogger, container_name: &str) -> Result<()> {
    let recommendation = advise(input, logger)?;
    for warning in recommendation.warnings() {
        eprint_warning(&warning.to_string());
    }
    print_json(&deployment_patch(&recommendation, container_name)?)
}
