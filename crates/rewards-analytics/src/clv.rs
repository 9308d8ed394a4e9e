//! Customer lifetime value from observed spend.

use std::collections::BTreeMap;

use rewards_core::error::{Result, RewardsError};
use rewards_core::models::{Customer, MergedRecord};
use serde::Serialize;
use tracing::debug;

use crate::rfm::SegmentTable;

/// Aggregate lifetime value for one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentClv {
    pub customers: usize,
    pub total: f64,
    pub mean: f64,
}

/// Per-customer and per-segment lifetime values.
#[derive(Debug, Clone, Serialize)]
pub struct ClvTable {
    /// Every customer in the input population, spenders or not.
    pub customers: BTreeMap<String, f64>,
    pub segments: BTreeMap<String, SegmentClv>,
}

impl ClvTable {
    /// The `n` most valuable customers, highest first; ties break on the
    /// smaller customer id.
    pub fn top_customers(&self, n: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .customers
            .iter()
            .map(|(id, &v)| (id.as_str(), v))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(n);
        ranked
    }
}

/// Computes lifetime value as the historical transaction-amount sum,
/// optionally scaled by a forward projection factor.
pub struct ClvCalculator {
    projection_factor: f64,
}

impl ClvCalculator {
    /// `projection_factor` scales the historical sum; `None` means 1.0
    /// (pure historical value). Must be positive and finite.
    pub fn new(projection_factor: Option<f64>) -> Result<Self> {
        let factor = projection_factor.unwrap_or(1.0);
        if !factor.is_finite() || factor <= 0.0 {
            return Err(RewardsError::Config(format!(
                "projection factor must be positive and finite, got {factor}"
            )));
        }
        Ok(Self {
            projection_factor: factor,
        })
    }

    /// Value every customer: transaction-amount sum times the projection
    /// factor, 0.0 for customers who never spent. Segment aggregates
    /// follow the supplied segment table's labels.
    pub fn calculate(
        &self,
        customers: &[Customer],
        transactions: &[MergedRecord],
        segments: &SegmentTable,
    ) -> ClvTable {
        let mut values: BTreeMap<String, f64> = customers
            .iter()
            .map(|c| (c.id.clone(), 0.0))
            .collect();
        for tx in transactions {
            if let Some(value) = values.get_mut(&tx.customer_id) {
                *value += tx.amount.unwrap_or(0.0);
            }
        }
        for value in values.values_mut() {
            *value *= self.projection_factor;
        }

        let mut segment_values: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (id, &value) in &values {
            if let Some(label) = segments.label_of(id) {
                segment_values.entry(label.to_string()).or_default().push(value);
            }
        }
        let segments = segment_values
            .into_iter()
            .map(|(label, values)| {
                let total: f64 = values.iter().sum();
                let clv = SegmentClv {
                    customers: values.len(),
                    total,
                    mean: total / values.len() as f64,
                };
                (label, clv)
            })
            .collect();

        debug!(
            "ClvCalculator: valued {} customers (factor {})",
            values.len(),
            self.projection_factor
        );
        ClvTable {
            customers: values,
            segments,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
