//! End-to-end pipeline orchestration.
//!
//! Wires the preparation stages (clean, decode, merge, cap, partition) to
//! the analytics stages (RFM, offer performance, CLV, transaction summary)
//! in their fixed order. Every stage consumes the previous stage's output
//! and never mutates it; a failing stage aborts the run with its error.

use std::time::Instant;

use chrono::Utc;
use rewards_core::error::Result;
use rewards_core::models::{MergePolicy, MergedRecord, Offer, RawCustomer, RawEvent};
use rewards_core::policy::SegmentPolicy;
use rewards_data::capper::OutlierCapper;
use rewards_data::cleaner::{CleanerConfig, RecordCleaner};
use rewards_data::decoder::EventDecoder;
use rewards_data::merger::DatasetMerger;
use rewards_data::partitioner::EventPartitioner;
use serde::Serialize;
use tracing::info;

use crate::clv::{ClvCalculator, ClvTable};
use crate::offers::{OfferPerformanceAnalyzer, OfferPerformanceTable};
use crate::rfm::{RfmSegmenter, SegmentTable};
use crate::transactions::TransactionSummary;

/// Knobs for one pipeline run; [`Default`] matches the CLI defaults.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub merge_policy: MergePolicy,
    pub cleaner: CleanerConfig,
    pub cap_lower_pct: f64,
    pub cap_upper_pct: f64,
    pub segment_policy: SegmentPolicy,
    pub projection_factor: Option<f64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            merge_policy: MergePolicy::Strict,
            cleaner: CleanerConfig::default(),
            cap_lower_pct: 1.0,
            cap_upper_pct: 99.0,
            segment_policy: SegmentPolicy::default_policy(),
            projection_factor: None,
        }
    }
}

/// Run bookkeeping carried alongside the analytical outputs.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineMetadata {
    /// RFC 3339 timestamp of when the run finished.
    pub generated_at: String,
    pub customers_in: usize,
    pub offers_in: usize,
    pub events_in: usize,
    pub rows_merged: usize,
    pub rows_dropped: usize,
    pub prepare_time_seconds: f64,
    pub analyze_time_seconds: f64,
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The capped merged table, before partitioning.
    pub merged: Vec<MergedRecord>,
    pub offer_events: Vec<MergedRecord>,
    pub transactions: Vec<MergedRecord>,
    pub segments: SegmentTable,
    pub offer_performance: OfferPerformanceTable,
    pub clv: ClvTable,
    pub transaction_summary: TransactionSummary,
    pub metadata: PipelineMetadata,
}

/// Execute the full pipeline over in-memory record sets.
pub fn run_pipeline(
    raw_customers: &[RawCustomer],
    raw_offers: &[Offer],
    raw_events: &[RawEvent],
    config: &PipelineConfig,
) -> Result<PipelineResult> {
    let prepare_start = Instant::now();

    let cleaner = RecordCleaner::new(config.cleaner.clone());
    let customers = cleaner.clean_customers(raw_customers)?;
    let offers = cleaner.clean_offers(raw_offers)?;
    let events = EventDecoder::decode(raw_events)?;

    let report = DatasetMerger::new(config.merge_policy).merge(&events, &customers, &offers)?;
    let capper = OutlierCapper::new(config.cap_lower_pct, config.cap_upper_pct)?;
    let merged = capper.cap_transaction_amounts(&report.records);
    let parts = EventPartitioner::partition(merged.clone());
    let prepare_time_seconds = prepare_start.elapsed().as_secs_f64();

    let analyze_start = Instant::now();
    let segmenter = RfmSegmenter::new(config.segment_policy.clone())?;
    let segments = segmenter.segment(&customers, &parts.transactions);
    let offer_performance = OfferPerformanceAnalyzer::analyze(&parts.offer_events, &segments);
    let clv = ClvCalculator::new(config.projection_factor)?.calculate(
        &customers,
        &parts.transactions,
        &segments,
    );
    let transaction_summary = TransactionSummary::summarize(&parts.transactions);
    let analyze_time_seconds = analyze_start.elapsed().as_secs_f64();

    info!(
        "pipeline complete: {} events merged ({} dropped), {} customers segmented",
        merged.len(),
        report.dropped_rows,
        segments.len()
    );

    Ok(PipelineResult {
        metadata: PipelineMetadata {
            generated_at: Utc::now().to_rfc3339(),
            customers_in: raw_customers.len(),
            offers_in: raw_offers.len(),
            events_in: raw_events.len(),
            rows_merged: merged.len(),
            rows_dropped: report.dropped_rows,
            prepare_time_seconds,
            analyze_time_seconds,
        },
        merged,
        offer_events: parts.offer_events,
        transactions: parts.transactions,
        segments,
        offer_performance,
        clv,
        transaction_summary,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
