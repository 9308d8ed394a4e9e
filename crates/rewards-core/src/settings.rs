use clap::Parser;
use std::path::PathBuf;

use crate::error::{Result, RewardsError};
use crate::models::MergePolicy;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Loyalty-rewards analytics over customer, offer and event record sets
#[derive(Parser, Debug, Clone)]
#[command(
    name = "maven-rewards",
    about = "Loyalty-rewards analytics over customer, offer and event record sets",
    version
)]
pub struct Settings {
    /// Path to the customers JSON file
    #[arg(long)]
    pub customers: PathBuf,

    /// Path to the offers JSON file
    #[arg(long)]
    pub offers: PathBuf,

    /// Path to the event-log JSON file
    #[arg(long)]
    pub events: PathBuf,

    /// Referential-merge policy for orphan events
    #[arg(long, default_value = "strict", value_parser = ["strict", "lenient"])]
    pub merge_policy: String,

    /// Lower capping percentile for transaction amounts
    #[arg(long, default_value = "1.0")]
    pub cap_lower: f64,

    /// Upper capping percentile for transaction amounts
    #[arg(long, default_value = "99.0")]
    pub cap_upper: f64,

    /// Number of quantile buckets per RFM axis (2-10)
    #[arg(long, default_value = "4", value_parser = clap::value_parser!(u8).range(2..=10))]
    pub quantile_bins: u8,

    /// Ages above this threshold are treated as missing
    #[arg(long, default_value = "100")]
    pub max_plausible_age: u32,

    /// Path to a segment-policy JSON file (built-in quartile taxonomy if omitted)
    #[arg(long)]
    pub segment_policy: Option<PathBuf>,

    /// CLV projection factor (historical-only when omitted)
    #[arg(long)]
    pub projection_factor: Option<f64>,

    /// Directory to write JSON outputs into (stdout report only if omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,
}

impl Settings {
    /// The merge policy as a typed value.
    pub fn parsed_merge_policy(&self) -> Result<MergePolicy> {
        MergePolicy::parse(&self.merge_policy).ok_or_else(|| {
            RewardsError::Config(format!("unknown merge policy: {}", self.merge_policy))
        })
    }

    /// Check cross-field constraints that clap cannot express.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.cap_lower)
            || !(0.0..=100.0).contains(&self.cap_upper)
            || self.cap_lower >= self.cap_upper
        {
            return Err(RewardsError::Config(format!(
                "capping percentiles must satisfy 0 <= lower < upper <= 100, got {} / {}",
                self.cap_lower, self.cap_upper
            )));
        }
        if let Some(factor) = self.projection_factor {
            if !(factor.is_finite() && factor > 0.0) {
                return Err(RewardsError::Config(format!(
                    "projection factor must be a positive number, got {factor}"
                )));
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
