//! Percentile-based outlier capping.

use rewards_core::error::{Result, RewardsError};
use rewards_core::models::MergedRecord;
use rewards_core::stats::percentile_of;
use tracing::debug;

/// Clips a numeric column into the value range spanned by a pair of
/// percentile bounds.
///
/// Deterministic and idempotent: applying the capper a second time with
/// the same bounds leaves an already-capped column unchanged.
#[derive(Debug, Clone)]
pub struct OutlierCapper {
    lower_pct: f64,
    upper_pct: f64,
}

impl OutlierCapper {
    /// Create a capper with explicit percentile bounds.
    ///
    /// Fails with [`RewardsError::Config`] unless
    /// `0 <= lower < upper <= 100`.
    pub fn new(lower_pct: f64, upper_pct: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&lower_pct)
            || !(0.0..=100.0).contains(&upper_pct)
            || lower_pct >= upper_pct
        {
            return Err(RewardsError::Config(format!(
                "capping percentiles must satisfy 0 <= lower < upper <= 100, got {lower_pct} / {upper_pct}"
            )));
        }
        Ok(Self {
            lower_pct,
            upper_pct,
        })
    }

    /// The conventional 1st/99th percentile bounds.
    pub fn with_defaults() -> Self {
        Self {
            lower_pct: 1.0,
            upper_pct: 99.0,
        }
    }

    /// Value thresholds corresponding to the percentile bounds over the
    /// full column. `None` for an empty column.
    pub fn thresholds(&self, values: &[f64]) -> Option<(f64, f64)> {
        let lower = percentile_of(values, self.lower_pct)?;
        let upper = percentile_of(values, self.upper_pct)?;
        Some((lower, upper))
    }

    /// Clip every value into `[lower, upper]`.
    pub fn cap_values(&self, values: &[f64]) -> Vec<f64> {
        match self.thresholds(values) {
            Some((lower, upper)) => values.iter().map(|v| v.clamp(lower, upper)).collect(),
            None => Vec::new(),
        }
    }

    /// Cap the transaction amounts of a merged table.
    ///
    /// Thresholds are computed over the amounts of transaction rows only;
    /// offer-lifecycle rows pass through untouched. Returns a new table,
    /// leaving the input unmodified.
    pub fn cap_transaction_amounts(&self, records: &[MergedRecord]) -> Vec<MergedRecord> {
        let amounts: Vec<f64> = records
            .iter()
            .filter(|r| r.is_transaction())
            .filter_map(|r| r.amount)
            .collect();
        let Some((lower, upper)) = self.thresholds(&amounts) else {
            return records.to_vec();
        };
        debug!(
            "OutlierCapper: clipping {} transaction amounts into [{:.2}, {:.2}]",
            amounts.len(),
            lower,
            upper
        );
        records
            .iter()
            .map(|r| {
                let mut record = r.clone();
                if record.is_transaction() {
                    record.amount = record.amount.map(|a| a.clamp(lower, upper));
                }
                record
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
