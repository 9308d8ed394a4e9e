//! Offer funnel statistics across demographic and offer dimensions.

use std::collections::{BTreeMap, HashMap, HashSet};

use rewards_core::models::{EventKind, MergedRecord};
use serde::Serialize;
use tracing::debug;

use crate::rfm::SegmentTable;

// ── Dimensions ────────────────────────────────────────────────────────────────

/// Grouping axis for offer-performance breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferDimension {
    OfferType,
    Channel,
    Segment,
}

impl OfferDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferDimension::OfferType => "offer type",
            OfferDimension::Channel => "channel",
            OfferDimension::Segment => "segment",
        }
    }
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// Funnel counts and response rate for one group on one dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferPerformanceRow {
    pub dimension: OfferDimension,
    pub value: String,
    pub received: u64,
    pub viewed: u64,
    pub completed: u64,
    /// `completed / received`, defined as 0.0 when nothing was received.
    /// Never exceeds 1.0: only completions matched to a distinct received
    /// event within that offer's validity window are counted.
    pub response_rate: f64,
}

/// All breakdown rows, grouped by dimension and sorted by value within it.
#[derive(Debug, Clone, Serialize)]
pub struct OfferPerformanceTable {
    pub rows: Vec<OfferPerformanceRow>,
}

impl OfferPerformanceTable {
    pub fn get(&self, dimension: OfferDimension, value: &str) -> Option<&OfferPerformanceRow> {
        self.rows
            .iter()
            .find(|r| r.dimension == dimension && r.value == value)
    }

    /// The row with the highest response rate on one dimension; ties go
    /// to the lexicographically smaller value.
    pub fn top_by_response_rate(&self, dimension: OfferDimension) -> Option<&OfferPerformanceRow> {
        self.rows
            .iter()
            .filter(|r| r.dimension == dimension)
            .max_by(|a, b| {
                a.response_rate
                    .total_cmp(&b.response_rate)
                    .then_with(|| b.value.cmp(&a.value))
            })
    }
}

// ── Analyzer ──────────────────────────────────────────────────────────────────

#[derive(Default, Clone, Copy)]
struct FunnelCounts {
    received: u64,
    viewed: u64,
    completed: u64,
}

/// Computes funnel breakdowns from the offer-event partition.
pub struct OfferPerformanceAnalyzer;

impl OfferPerformanceAnalyzer {
    /// Break the offer funnel down by offer type, channel and customer
    /// segment.
    ///
    /// A completion only counts if it can be matched to a received event
    /// of the same offer for the same customer, with the completion no
    /// later than `received_time + duration_days * 24` hours (inclusive).
    /// Each received event can satisfy at most one completion, so a group's
    /// response rate is bounded by 1. Offers sent through several channels
    /// are counted once per channel on the channel axis.
    pub fn analyze(
        offer_events: &[MergedRecord],
        segments: &SegmentTable,
    ) -> OfferPerformanceTable {
        let matched = match_completions(offer_events);

        let mut groups: BTreeMap<(OfferDimension, String), FunnelCounts> = BTreeMap::new();
        for (row, event) in offer_events.iter().enumerate() {
            let counted_completion = matched.contains(&row);
            let mut bump = |dimension: OfferDimension, value: String| {
                let counts = groups.entry((dimension, value)).or_default();
                match event.kind {
                    EventKind::OfferReceived => counts.received += 1,
                    EventKind::OfferViewed => counts.viewed += 1,
                    EventKind::OfferCompleted => {
                        if counted_completion {
                            counts.completed += 1;
                        }
                    }
                    EventKind::Transaction => {}
                }
            };

            if let Some(offer_type) = event.offer_type {
                bump(OfferDimension::OfferType, offer_type.as_str().to_string());
            }
            if let Some(channels) = &event.channels {
                for channel in channels {
                    bump(OfferDimension::Channel, channel.as_str().to_string());
                }
            }
            if let Some(label) = segments.label_of(&event.customer_id) {
                bump(OfferDimension::Segment, label.to_string());
            }
        }

        let rows: Vec<OfferPerformanceRow> = groups
            .into_iter()
            .map(|((dimension, value), counts)| OfferPerformanceRow {
                dimension,
                value,
                received: counts.received,
                viewed: counts.viewed,
                completed: counts.completed,
                response_rate: if counts.received > 0 {
                    counts.completed as f64 / counts.received as f64
                } else {
                    0.0
                },
            })
            .collect();

        debug!("OfferPerformanceAnalyzer: {} breakdown rows", rows.len());
        OfferPerformanceTable { rows }
    }
}

/// Greedily match each completion to the earliest unconsumed received
/// event of the same (customer, offer) pair whose validity window covers
/// the completion time. Returns the row indices of matched completions.
fn match_completions(offer_events: &[MergedRecord]) -> HashSet<usize> {
    // (consumed, received_time) per received event, grouped by pair and
    // kept in input order; within a pair the inputs are time-ordered in
    // practice, but the scan below does not depend on it.
    let mut received: HashMap<(&str, &str), Vec<(bool, i64)>> = HashMap::new();
    for event in offer_events {
        if event.kind != EventKind::OfferReceived {
            continue;
        }
        if let Some(offer_id) = &event.offer_id {
            received
                .entry((event.customer_id.as_str(), offer_id.as_str()))
                .or_default()
                .push((false, event.time_hours));
        }
    }

    let mut matched = HashSet::new();
    for (row, event) in offer_events.iter().enumerate() {
        if event.kind != EventKind::OfferCompleted {
            continue;
        }
        let (Some(offer_id), Some(duration_days)) = (&event.offer_id, event.duration_days) else {
            continue;
        };
        let window_hours = duration_days as i64 * 24;
        let Some(candidates) = received.get_mut(&(event.customer_id.as_str(), offer_id.as_str()))
        else {
            continue;
        };
        let hit = candidates
            .iter_mut()
            .filter(|(consumed, t)| {
                !consumed && event.time_hours >= *t && event.time_hours - *t <= window_hours
            })
            .min_by_key(|(_, t)| *t);
        if let Some(slot) = hit {
            slot.0 = true;
            matched.insert(row);
        }
    }
    matched
}

// ── Tests ─────────────────────────────────────────────────────────────────────
