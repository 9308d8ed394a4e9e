//! Cross-entity merging into the denormalized working table.

use std::collections::HashMap;

use rewards_core::error::{Result, RewardsError};
use rewards_core::models::{Customer, Event, MergePolicy, MergedRecord, Offer};
use tracing::{debug, warn};

/// The merged table together with bookkeeping about lenient-mode drops.
#[derive(Debug, Clone)]
pub struct MergeReport {
    /// One record per surviving input event, in input order.
    pub records: Vec<MergedRecord>,
    /// Rows dropped under [`MergePolicy::Lenient`]; always 0 under strict.
    pub dropped_rows: usize,
}

/// Joins decoded events onto customers and offers.
pub struct DatasetMerger {
    policy: MergePolicy,
}

impl DatasetMerger {
    pub fn new(policy: MergePolicy) -> Self {
        Self { policy }
    }

    /// Left-join events onto customers (by customer id), then onto offers
    /// (by offer id, null-safe: transaction rows carry all-`None` offer
    /// fields).
    ///
    /// An event whose customer id — or, for offer-lifecycle events, whose
    /// offer id — has no match is an orphan. Under strict policy the first
    /// orphan aborts with [`RewardsError::Referential`]; under lenient
    /// policy the row is dropped, counted and logged.
    pub fn merge(
        &self,
        events: &[Event],
        customers: &[Customer],
        offers: &[Offer],
    ) -> Result<MergeReport> {
        let customers_by_id: HashMap<&str, &Customer> =
            customers.iter().map(|c| (c.id.as_str(), c)).collect();
        let offers_by_id: HashMap<&str, &Offer> =
            offers.iter().map(|o| (o.id.as_str(), o)).collect();

        let mut records = Vec::with_capacity(events.len());
        let mut dropped_rows = 0usize;

        for (row, event) in events.iter().enumerate() {
            let Some(customer) = customers_by_id.get(event.customer_id.as_str()) else {
                self.handle_orphan(
                    row,
                    format!("customer \"{}\" not found", event.customer_id),
                    &mut dropped_rows,
                )?;
                continue;
            };

            let offer = match &event.offer_id {
                Some(offer_id) => match offers_by_id.get(offer_id.as_str()) {
                    Some(offer) => Some(*offer),
                    None => {
                        self.handle_orphan(
                            row,
                            format!("offer \"{offer_id}\" not found"),
                            &mut dropped_rows,
                        )?;
                        continue;
                    }
                },
                None => None,
            };

            records.push(MergedRecord {
                customer_id: event.customer_id.clone(),
                kind: event.kind,
                time_hours: event.time_hours,
                offer_id: event.offer_id.clone(),
                amount: event.amount,
                reward_earned: event.reward,
                gender: customer.gender,
                age: customer.age,
                income: customer.income,
                member_since: customer.member_since,
                offer_type: offer.map(|o| o.offer_type),
                difficulty: offer.map(|o| o.difficulty),
                offer_reward: offer.map(|o| o.reward),
                duration_days: offer.map(|o| o.duration_days),
                channels: offer.map(|o| o.channels.clone()),
            });
        }

        debug!(
            "DatasetMerger ({:?}): merged {} of {} events, dropped {}",
            self.policy,
            records.len(),
            events.len(),
            dropped_rows
        );
        Ok(MergeReport {
            records,
            dropped_rows,
        })
    }

    /// Apply the configured policy to one orphan event.
    fn handle_orphan(&self, row: usize, detail: String, dropped_rows: &mut usize) -> Result<()> {
        match self.policy {
            MergePolicy::Strict => Err(RewardsError::Referential { row, detail }),
            MergePolicy::Lenient => {
                warn!("dropping orphan event at row {row}: {detail}");
                *dropped_rows += 1;
                Ok(())
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rewards_core::models::{Channel, EventKind, Gender, OfferType};

    fn make_customer(id: &str) -> Customer {
        Customer {
            id: id.to_string(),
            gender: Gender::Female,
            age: 40,
            income: 55_000.0,
            member_since: NaiveDate::from_ymd_opt(2017, 7, 15).unwrap(),
        }
    }

    fn make_offer(id: &str) -> Offer {
        Offer {
            id: id.to_string(),
            offer_type: OfferType::Bogo,
            difficulty: 5.0,
            reward: 5.0,
            duration_days: 7,
            channels: vec![Channel::Web, Channel::Mobile],
        }
    }

    fn make_event(customer_id: &str, kind: EventKind, offer_id: Option<&str>) -> Event {
        Event {
            customer_id: customer_id.to_string(),
            kind,
            time_hours: 0,
            offer_id: offer_id.map(str::to_string),
            amount: if kind.is_transaction() { Some(9.5) } else { None },
            reward: None,
        }
    }

    // ── Join behaviour ────────────────────────────────────────────────────────

    #[test]
    fn test_merge_produces_one_record_per_event() {
        let customers = vec![make_customer("c-1")];
        let offers = vec![make_offer("o-1")];
        let events = vec![
            make_event("c-1", EventKind::OfferReceived, Some("o-1")),
            make_event("c-1", EventKind::Transaction, None),
        ];

        let report = DatasetMerger::new(MergePolicy::Strict)
            .merge(&events, &customers, &offers)
            .unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.dropped_rows, 0);
    }

    #[test]
    fn test_offer_fields_joined_for_lifecycle_events() {
        let customers = vec![make_customer("c-1")];
        let offers = vec![make_offer("o-1")];
        let events = vec![make_event("c-1", EventKind::OfferCompleted, Some("o-1"))];

        let report = DatasetMerger::new(MergePolicy::Strict)
            .merge(&events, &customers, &offers)
            .unwrap();
        let record = &report.records[0];
        assert_eq!(record.offer_type, Some(OfferType::Bogo));
        assert_eq!(record.duration_days, Some(7));
        assert_eq!(
            record.channels.as_deref(),
            Some([Channel::Web, Channel::Mobile].as_slice())
        );
    }

    #[test]
    fn test_transaction_rows_carry_all_none_offer_fields() {
        let customers = vec![make_customer("c-1")];
        let events = vec![make_event("c-1", EventKind::Transaction, None)];

        let report = DatasetMerger::new(MergePolicy::Strict)
            .merge(&events, &customers, &[])
            .unwrap();
        let record = &report.records[0];
        assert!(record.offer_type.is_none());
        assert!(record.difficulty.is_none());
        assert!(record.offer_reward.is_none());
        assert!(record.duration_days.is_none());
        assert!(record.channels.is_none());
        assert_eq!(record.amount, Some(9.5));
    }

    #[test]
    fn test_customer_fields_denormalized_onto_every_row() {
        let customers = vec![make_customer("c-1")];
        let events = vec![make_event("c-1", EventKind::Transaction, None)];

        let report = DatasetMerger::new(MergePolicy::Strict)
            .merge(&events, &customers, &[])
            .unwrap();
        assert_eq!(report.records[0].gender, Gender::Female);
        assert_eq!(report.records[0].age, 40);
    }

    // ── Orphan handling ───────────────────────────────────────────────────────

    #[test]
    fn test_strict_policy_aborts_on_unknown_customer() {
        let events = vec![make_event("c-missing", EventKind::Transaction, None)];
        let err = DatasetMerger::new(MergePolicy::Strict)
            .merge(&events, &[], &[])
            .unwrap_err();
        match err {
            RewardsError::Referential { row, detail } => {
                assert_eq!(row, 0);
                assert!(detail.contains("c-missing"));
            }
            other => panic!("expected Referential error, got {other}"),
        }
    }

    #[test]
    fn test_strict_policy_aborts_on_unknown_offer() {
        let customers = vec![make_customer("c-1")];
        let events = vec![make_event("c-1", EventKind::OfferViewed, Some("o-missing"))];
        let err = DatasetMerger::new(MergePolicy::Strict)
            .merge(&events, &customers, &[])
            .unwrap_err();
        assert!(err.to_string().contains("o-missing"));
    }

    #[test]
    fn test_lenient_policy_drops_and_counts_orphans() {
        let customers = vec![make_customer("c-1")];
        let offers = vec![make_offer("o-1")];
        let events = vec![
            make_event("c-1", EventKind::OfferReceived, Some("o-1")),
            make_event("c-missing", EventKind::Transaction, None),
            make_event("c-1", EventKind::OfferViewed, Some("o-missing")),
        ];

        let report = DatasetMerger::new(MergePolicy::Lenient)
            .merge(&events, &customers, &offers)
            .unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.dropped_rows, 2);
    }

    #[test]
    fn test_merge_preserves_event_order() {
        let customers = vec![make_customer("c-1"), make_customer("c-2")];
        let events = vec![
            Event {
                time_hours: 10,
                ..make_event("c-2", EventKind::Transaction, None)
            },
            Event {
                time_hours: 5,
                ..make_event("c-1", EventKind::Transaction, None)
            },
        ];

        let report = DatasetMerger::new(MergePolicy::Strict)
            .merge(&events, &customers, &[])
            .unwrap();
        assert_eq!(report.records[0].time_hours, 10);
        assert_eq!(report.records[1].time_hours, 5);
    }
}
