//! Recency / Frequency / Monetary scoring and segment assignment.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use rewards_core::error::Result;
use rewards_core::models::{Customer, MergedRecord};
use rewards_core::policy::SegmentPolicy;
use serde::Serialize;
use tracing::debug;

// ── SegmentAssignment ─────────────────────────────────────────────────────────

/// One customer's RFM scores, quantile ranks and segment label.
///
/// Ranks are quality ranks in `[1, k]`: 1 is always worst, k always best,
/// on every axis (the recency axis is inverted during bucketing so that a
/// more recent purchase earns a higher rank).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentAssignment {
    pub customer_id: String,
    /// Days between the customer's most recent transaction and the
    /// observation horizon; the full horizon for customers with none.
    pub recency_days: f64,
    /// Number of transactions in the observed window.
    pub frequency: u64,
    /// Sum of transaction amounts in the observed window.
    pub monetary: f64,
    pub recency_rank: u8,
    pub frequency_rank: u8,
    pub monetary_rank: u8,
    pub label: String,
}

// ── SegmentTable ──────────────────────────────────────────────────────────────

/// Segment assignments for the whole customer population, keyed lookups
/// included. Recomputed each run, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentTable {
    assignments: Vec<SegmentAssignment>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Population-level averages and segment size distribution.
#[derive(Debug, Clone, Serialize)]
pub struct RfmSummary {
    pub avg_recency_days: f64,
    pub avg_frequency: f64,
    pub avg_monetary: f64,
    pub segment_sizes: BTreeMap<String, usize>,
}

impl SegmentTable {
    fn new(assignments: Vec<SegmentAssignment>) -> Self {
        let index = assignments
            .iter()
            .enumerate()
            .map(|(i, a)| (a.customer_id.clone(), i))
            .collect();
        Self { assignments, index }
    }

    pub fn assignments(&self) -> &[SegmentAssignment] {
        &self.assignments
    }

    pub fn get(&self, customer_id: &str) -> Option<&SegmentAssignment> {
        self.index.get(customer_id).map(|&i| &self.assignments[i])
    }

    pub fn label_of(&self, customer_id: &str) -> Option<&str> {
        self.get(customer_id).map(|a| a.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Averages across all assigned customers plus per-segment sizes.
    pub fn summary(&self) -> RfmSummary {
        let n = self.assignments.len().max(1) as f64;
        let mut segment_sizes: BTreeMap<String, usize> = BTreeMap::new();
        for a in &self.assignments {
            *segment_sizes.entry(a.label.clone()).or_default() += 1;
        }
        RfmSummary {
            avg_recency_days: self.assignments.iter().map(|a| a.recency_days).sum::<f64>() / n,
            avg_frequency: self.assignments.iter().map(|a| a.frequency as f64).sum::<f64>() / n,
            avg_monetary: self.assignments.iter().map(|a| a.monetary).sum::<f64>() / n,
            segment_sizes,
        }
    }
}

// ── RfmSegmenter ──────────────────────────────────────────────────────────────

/// Computes RFM scores from the transaction partition and assigns segment
/// labels via a [`SegmentPolicy`] table.
pub struct RfmSegmenter {
    policy: SegmentPolicy,
}

impl RfmSegmenter {
    /// Create a segmenter, validating the supplied policy table.
    pub fn new(policy: SegmentPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    /// Create a segmenter with the built-in quartile taxonomy.
    pub fn with_defaults() -> Self {
        Self {
            policy: SegmentPolicy::default_policy(),
        }
    }

    /// Assign every customer a segment.
    ///
    /// 1. Per customer: Recency = horizon − most recent transaction time,
    ///    Frequency = transaction count, Monetary = amount sum. The
    ///    horizon is the latest transaction timestamp in the window.
    /// 2. Each axis is independently bucketed into `[1, k]` quantile
    ///    ranks over the customers that have at least one transaction;
    ///    ties at a bucket boundary resolve by stable row order.
    /// 3. Customers with zero transactions receive rank 1 on all three
    ///    axes rather than being excluded.
    /// 4. The rank triple maps to a label through the policy table.
    pub fn segment(&self, customers: &[Customer], transactions: &[MergedRecord]) -> SegmentTable {
        let bins = self.policy.bins;
        let horizon_hours = transactions
            .iter()
            .map(|t| t.time_hours)
            .max()
            .unwrap_or(0);
        let horizon_days = horizon_hours as f64 / 24.0;

        // Per-customer aggregates, accumulated by customer-set position so
        // the stable tie-break order is the customer table order.
        let position: HashMap<&str, usize> = customers
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.as_str(), i))
            .collect();
        let mut frequency = vec![0u64; customers.len()];
        let mut monetary = vec![0.0f64; customers.len()];
        let mut last_tx = vec![None::<i64>; customers.len()];
        for tx in transactions {
            let Some(&i) = position.get(tx.customer_id.as_str()) else {
                continue;
            };
            frequency[i] += 1;
            monetary[i] += tx.amount.unwrap_or(0.0);
            last_tx[i] = Some(last_tx[i].map_or(tx.time_hours, |t: i64| t.max(tx.time_hours)));
        }

        // Quantile ranks over the active customers only.
        let active: Vec<usize> = (0..customers.len()).filter(|&i| frequency[i] > 0).collect();
        let recency_values: Vec<f64> = active
            .iter()
            .map(|&i| (horizon_hours - last_tx[i].unwrap_or(horizon_hours)) as f64 / 24.0)
            .collect();
        let frequency_values: Vec<f64> = active.iter().map(|&i| frequency[i] as f64).collect();
        let monetary_values: Vec<f64> = active.iter().map(|&i| monetary[i]).collect();

        let recency_ranks = quantile_ranks(&recency_values, bins, false);
        let frequency_ranks = quantile_ranks(&frequency_values, bins, true);
        let monetary_ranks = quantile_ranks(&monetary_values, bins, true);

        let rank_of: HashMap<usize, (u8, u8, u8, f64)> = active
            .iter()
            .enumerate()
            .map(|(pos, &i)| {
                (
                    i,
                    (
                        recency_ranks[pos],
                        frequency_ranks[pos],
                        monetary_ranks[pos],
                        recency_values[pos],
                    ),
                )
            })
            .collect();

        let assignments = customers
            .iter()
            .enumerate()
            .map(|(i, customer)| {
                let (r, f, m, recency_days) = rank_of
                    .get(&i)
                    .copied()
                    .unwrap_or((1, 1, 1, horizon_days));
                SegmentAssignment {
                    customer_id: customer.id.clone(),
                    recency_days,
                    frequency: frequency[i],
                    monetary: monetary[i],
                    recency_rank: r,
                    frequency_rank: f,
                    monetary_rank: m,
                    label: self.policy.label_for(r, f, m).to_string(),
                }
            })
            .collect();

        debug!(
            "RfmSegmenter: segmented {} customers ({} with transactions)",
            customers.len(),
            active.len()
        );
        SegmentTable::new(assignments)
    }
}

/// Bucket `values` into `bins` quantile ranks in `[1, bins]`.
///
/// Positions are assigned by a stable sort on the value alone, so equal
/// values at a bucket boundary keep their input order. With
/// `higher_is_better = false` the bucket is inverted, making the lowest
/// value the best (rank `bins`).
fn quantile_ranks(values: &[f64], bins: u8, higher_is_better: bool) -> Vec<u8> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![1u8; n];
    for (pos, &idx) in order.iter().enumerate() {
        let bucket = (pos * bins as usize / n) as u8 + 1;
        ranks[idx] = if higher_is_better {
            bucket
        } else {
            bins + 1 - bucket
        };
    }
    ranks
}

// ── Tests ─────────────────────────────────────────────────────────────────────
