mod bootstrap;
mod loader;
mod report;

use anyhow::{bail, Result};
use clap::Parser;
use rewards_analytics::pipeline::{run_pipeline, PipelineConfig};
use rewards_core::policy::SegmentPolicy;
use rewards_core::settings::Settings;
use rewards_data::cleaner::CleanerConfig;

fn main() -> Result<()> {
    let settings = Settings::parse();
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Maven Rewards v{} starting", env!("CARGO_PKG_VERSION"));

    settings.validate()?;
    let config = build_config(&settings)?;

    let customers = loader::load_customers(&settings.customers)?;
    let offers = loader::load_offers(&settings.offers)?;
    let events = loader::load_events(&settings.events)?;

    let result = run_pipeline(&customers, &offers, &events, &config)?;

    print!("{}", report::render(&result));
    if let Some(dir) = &settings.output {
        report::export_json(&result, dir)?;
    }

    Ok(())
}

/// Turn validated CLI settings into a pipeline configuration.
///
/// The quantile bin count always comes from the active segment policy, so
/// `--quantile-bins` must agree with it: the built-in taxonomy is
/// quartile, and a policy file carries its own bin count. A custom bin
/// count therefore requires a matching policy file.
fn build_config(settings: &Settings) -> Result<PipelineConfig> {
    let segment_policy = match &settings.segment_policy {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            SegmentPolicy::from_json(&json)?
        }
        None => SegmentPolicy::default_policy(),
    };
    if segment_policy.bins != settings.quantile_bins {
        bail!(
            "--quantile-bins {} does not match the segment policy's {} bins",
            settings.quantile_bins,
            segment_policy.bins
        );
    }

    Ok(PipelineConfig {
        merge_policy: settings.parsed_merge_policy()?,
        cleaner: CleanerConfig {
            max_plausible_age: settings.max_plausible_age,
            ..CleanerConfig::default()
        },
        cap_lower_pct: settings.cap_lower,
        cap_upper_pct: settings.cap_upper,
        segment_policy,
        projection_factor: settings.projection_factor,
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────
