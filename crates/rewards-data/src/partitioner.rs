//! Event-kind partitioning of the merged table.

use rewards_core::models::MergedRecord;
use tracing::debug;

/// The two disjoint, order-preserving subsets of the merged table.
#[derive(Debug, Clone)]
pub struct PartitionedEvents {
    /// Rows with kind ∈ {received, viewed, completed}.
    pub offer_events: Vec<MergedRecord>,
    /// Rows with kind = transaction.
    pub transactions: Vec<MergedRecord>,
}

/// Splits merged records into offer-lifecycle and transaction streams.
pub struct EventPartitioner;

impl EventPartitioner {
    /// Partition the merged table. Every input row lands in exactly one of
    /// the two outputs, preserving its relative order; the output row
    /// counts always sum to the input count.
    pub fn partition(records: Vec<MergedRecord>) -> PartitionedEvents {
        let (transactions, offer_events): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|r| r.is_transaction());
        debug!(
            "EventPartitioner: {} offer events, {} transactions",
            offer_events.len(),
            transactions.len()
        );
        PartitionedEvents {
            offer_events,
            transactions,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
