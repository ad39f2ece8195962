//! Layered loading of advisor input
//!
//! Lowest to highest precedence: built-in defaults, the user defaults file,
//! the `--input` document, `HEAPWISE__*` environment variables, then flags.

use advisor_lib::margin::DEFAULT_MEMORY_BUFFER_PERCENT;
use advisor_lib::{DeploymentConstraint, MemoryProfile, SafetyMargin};
use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `HEAPWISE__PROFILE__PEAK_HEAP_USED_BYTES`
pub const ENV_PREFIX: &str = "HEAPWISE";

/// Inputs shared by every advisory command
#[derive(Debug, Clone, Default, Args)]
pub struct InputArgs {
    /// Input document (TOML, JSON or YAML) with [profile] and [constraint] tables
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// User defaults file (default: ~/.config/heapwise/config.toml)
    #[arg(long, env = "HEAPWISE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Peak heap used, in bytes or as a quantity (e.g. 150Mi)
    #[arg(long)]
    pub peak_heap: Option<String>,

    /// Peak resident memory, in bytes or as a quantity (e.g. 180Mi)
    #[arg(long)]
    pub peak_resident: Option<String>,

    /// Number of replicas sharing the node pool
    #[arg(long)]
    pub replicas: Option<u32>,

    /// Safety margin ratio in (0, 1], e.g. 0.33 or 33%
    #[arg(long)]
    pub margin: Option<String>,

    /// Runtime default heap ceiling when no heap flag is set
    #[arg(long)]
    pub platform_default_heap: Option<String>,

    /// Allocatable memory of the node pool
    #[arg(long)]
    pub node_capacity: Option<String>,
}

/// Fully resolved advisor input
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorInput {
    pub profile: MemoryProfile,
    pub constraint: DeploymentConstraint,
}

impl AdvisorInput {
    /// Resolve input from every configured layer
    pub fn load(args: &InputArgs) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("constraint.desired_replica_count", 1i64)?
            .set_default(
                "constraint.safety_margin_ratio",
                SafetyMargin::from_percent(DEFAULT_MEMORY_BUFFER_PERCENT).to_string(),
            )?;

        match &args.config {
            Some(path) => {
                builder = builder.add_source(config::File::from(path.as_path()).required(true));
            }
            None => {
                if let Some(path) = user_defaults_path() {
                    builder = builder.add_source(config::File::from(path).required(false));
                }
            }
        }

        if let Some(path) = &args.input {
            tracing::debug!(path = %path.display(), "Reading advisor input document");
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let overrides: [(&str, Option<&String>); 5] = [
            ("profile.peak_heap_used_bytes", args.peak_heap.as_ref()),
            ("profile.peak_resident_bytes", args.peak_resident.as_ref()),
            ("constraint.safety_margin_ratio", args.margin.as_ref()),
            (
                "constraint.platform_default_heap_bytes",
                args.platform_default_heap.as_ref(),
            ),
            ("constraint.node_pool_capacity_bytes", args.node_capacity.as_ref()),
        ];
        for (key, value) in overrides {
            if let Some(value) = value {
                builder = builder.set_override(key, value.as_str())?;
            }
        }
        if let Some(replicas) = args.replicas {
            builder = builder.set_override("constraint.desired_replica_count", i64::from(replicas))?;
        }

        builder
            .build()
            .context("Failed to read advisor input")?
            .try_deserialize()
            .context("Failed to parse advisor input")
    }
}

/// Location of the per-user defaults file without extension; `config`
/// tries each supported format
fn user_defaults_path() -> Option<PathBuf> {
    let home = dirs_next::home_dir()?;
    Some(defaults_stem(&home))
}

fn defaults_stem(home: &Path) -> PathBuf {
    home.join(".config").join("heapwise").join("config")
}
