//! Transaction-stream overview statistics.

use std::collections::BTreeMap;

use rewards_core::models::MergedRecord;
use serde::Serialize;

/// Headline numbers for the (capped) transaction partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionSummary {
    pub total_transactions: u64,
    pub total_revenue: f64,
    /// 0.0 when there are no transactions.
    pub average_amount: f64,
    /// Revenue keyed by elapsed day since the observation start.
    pub daily_revenue: BTreeMap<i64, f64>,
}

impl TransactionSummary {
    pub fn summarize(transactions: &[MergedRecord]) -> Self {
        let mut total_revenue = 0.0;
        let mut daily_revenue: BTreeMap<i64, f64> = BTreeMap::new();
        for tx in transactions {
            let amount = tx.amount.unwrap_or(0.0);
            total_revenue += amount;
            *daily_revenue.entry(tx.elapsed_day()).or_default() += amount;
        }
        let total_transactions = transactions.len() as u64;
        Self {
            total_transactions,
            total_revenue,
            average_amount: if total_transactions > 0 {
                total_revenue / total_transactions as f64
            } else {
                0.0
            },
            daily_revenue,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rewards_core::models::{EventKind, Gender};

    fn make_transaction(time_hours: i64, amount: f64) -> MergedRecord {
        MergedRecord {
            customer_id: "c-1".to_string(),
            kind: EventKind::Transaction,
            time_hours,
            offer_id: None,
            amount: Some(amount),
            reward_earned: None,
            gender: Gender::Unknown,
            age: 40,
            income: 55_000.0,
            member_since: NaiveDate::from_ymd_opt(2017, 7, 15).unwrap(),
            offer_type: None,
            difficulty: None,
            offer_reward: None,
            duration_days: None,
            channels: None,
        }
    }

    #[test]
    fn test_totals_and_average() {
        let txs = vec![
            make_transaction(0, 10.0),
            make_transaction(12, 20.0),
            make_transaction(30, 30.0),
        ];
        let summary = TransactionSummary::summarize(&txs);
        assert_eq!(summary.total_transactions, 3);
        assert!((summary.total_revenue - 60.0).abs() < 1e-9);
        assert!((summary.average_amount - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_daily_revenue_buckets_by_elapsed_day() {
        let txs = vec![
            make_transaction(0, 10.0),  // day 0
            make_transaction(23, 5.0),  // day 0
            make_transaction(24, 7.0),  // day 1
            make_transaction(50, 3.0),  // day 2
        ];
        let summary = TransactionSummary::summarize(&txs);
        assert_eq!(summary.daily_revenue.len(), 3);
        assert!((summary.daily_revenue[&0] - 15.0).abs() < 1e-9);
        assert!((summary.daily_revenue[&1] - 7.0).abs() < 1e-9);
        assert!((summary.daily_revenue[&2] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        let summary = TransactionSummary::summarize(&[]);
        assert_eq!(summary.total_transactions, 0);
        assert_eq!(summary.total_revenue, 0.0);
        assert_eq!(summary.average_amount, 0.0);
        assert!(summary.daily_revenue.is_empty());
    }
}
