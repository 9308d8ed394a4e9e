//! Plain-text report rendering and JSON export.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::Context;
use rewards_analytics::offers::OfferDimension;
use rewards_analytics::pipeline::PipelineResult;
use tracing::info;

// ── Text report ────────────────────────────────────────────────────────────────

/// Render the run's headline numbers as an aligned plain-text report.
pub fn render(result: &PipelineResult) -> String {
    let mut out = String::new();
    let meta = &result.metadata;

    let _ = writeln!(out, "Maven Rewards analytics — {}", meta.generated_at);
    let _ = writeln!(out);
    let _ = writeln!(out, "Inputs");
    let _ = writeln!(out, "  customers    {:>8}", meta.customers_in);
    let _ = writeln!(out, "  offers       {:>8}", meta.offers_in);
    let _ = writeln!(out, "  events       {:>8}", meta.events_in);
    let _ = writeln!(out, "  merged rows  {:>8}", meta.rows_merged);
    if meta.rows_dropped > 0 {
        let _ = writeln!(out, "  dropped rows {:>8}", meta.rows_dropped);
    }
    let _ = writeln!(
        out,
        "  timing       prepare {:.3}s, analyze {:.3}s",
        meta.prepare_time_seconds, meta.analyze_time_seconds
    );

    let tx = &result.transaction_summary;
    let _ = writeln!(out);
    let _ = writeln!(out, "Transactions");
    let _ = writeln!(out, "  count        {:>8}", tx.total_transactions);
    let _ = writeln!(out, "  revenue      {:>12.2}", tx.total_revenue);
    let _ = writeln!(out, "  avg amount   {:>12.2}", tx.average_amount);

    let rfm = result.segments.summary();
    let _ = writeln!(out);
    let _ = writeln!(out, "Segments");
    let _ = writeln!(out, "  avg recency    {:>8.1} days", rfm.avg_recency_days);
    let _ = writeln!(out, "  avg frequency  {:>8.2}", rfm.avg_frequency);
    let _ = writeln!(out, "  avg monetary   {:>8.2}", rfm.avg_monetary);
    let _ = writeln!(out, "  {:<20} {:>8}", "segment", "size");
    for (label, size) in &rfm.segment_sizes {
        let _ = writeln!(out, "  {label:<20} {size:>8}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Offer performance");
    let _ = writeln!(
        out,
        "  {:<12} {:<20} {:>8} {:>8} {:>10} {:>8}",
        "dimension", "value", "received", "viewed", "completed", "rate"
    );
    for row in &result.offer_performance.rows {
        let _ = writeln!(
            out,
            "  {:<12} {:<20} {:>8} {:>8} {:>10} {:>7.1}%",
            row.dimension.as_str(),
            row.value,
            row.received,
            row.viewed,
            row.completed,
            row.response_rate * 100.0
        );
    }
    for dimension in [
        OfferDimension::OfferType,
        OfferDimension::Channel,
        OfferDimension::Segment,
    ] {
        if let Some(top) = result.offer_performance.top_by_response_rate(dimension) {
            let _ = writeln!(
                out,
                "  best {}: {} ({:.1}%)",
                dimension.as_str(),
                top.value,
                top.response_rate * 100.0
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Customer lifetime value");
    let _ = writeln!(out, "  {:<20} {:>8} {:>12} {:>12}", "segment", "size", "total", "mean");
    for (label, seg) in &result.clv.segments {
        let _ = writeln!(
            out,
            "  {:<20} {:>8} {:>12.2} {:>12.2}",
            label, seg.customers, seg.total, seg.mean
        );
    }
    let _ = writeln!(out, "  top customers:");
    for (id, value) in result.clv.top_customers(10) {
        let _ = writeln!(out, "    {id:<40} {value:>12.2}");
    }

    out
}

// ── JSON export ────────────────────────────────────────────────────────────────

/// Write every analytical output as pretty-printed JSON into `dir`,
/// creating it if necessary.
pub fn export_json(result: &PipelineResult, dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    write_json(dir, "metadata.json", &result.metadata)?;
    write_json(dir, "segments.json", result.segments.assignments())?;
    write_json(dir, "rfm_summary.json", &result.segments.summary())?;
    write_json(dir, "offer_performance.json", &result.offer_performance)?;
    write_json(dir, "clv.json", &result.clv)?;
    write_json(dir, "transaction_summary.json", &result.transaction_summary)?;

    info!("wrote JSON outputs to {}", dir.display());
    Ok(())
}

fn write_json<T: serde::Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> anyhow::Result<()> {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
