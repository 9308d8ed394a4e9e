//! Event payload decoding.
//!
//! Each raw event carries a small encoded variant in its `value` field:
//! an offer identifier (offer-lifecycle events, optionally with the earned
//! reward on completions) or a monetary amount (transactions). Decoding is
//! strict: a payload outside the expected shapes aborts the run with a
//! row-indexed error rather than silently dropping the record.

use rewards_core::error::{Result, RewardsError};
use rewards_core::models::{Event, RawEvent};
use tracing::debug;

/// The fields extracted from one payload.
#[derive(Debug, Clone, Default, PartialEq)]
struct DecodedPayload {
    offer_id: Option<String>,
    amount: Option<f64>,
    reward: Option<f64>,
}

/// Stateless decoder that strips payloads into typed event fields.
pub struct EventDecoder;

impl EventDecoder {
    /// Decode every raw event, dropping the encoded payload field.
    ///
    /// Accepted payload shapes:
    /// * `{"offer id": <str>}` or `{"offer_id": <str>}`
    /// * `{"offer_id": <str>, "reward": <num>}`
    /// * `{"amount": <num>}` with a non-negative, finite amount
    ///
    /// The payload must also agree with the event kind: a transaction
    /// carries an amount, an offer-lifecycle event carries an offer id.
    /// Any other shape fails with [`RewardsError::Decode`] naming the
    /// offending row index.
    pub fn decode(rows: &[RawEvent]) -> Result<Vec<Event>> {
        let mut events = Vec::with_capacity(rows.len());
        for (row, raw) in rows.iter().enumerate() {
            let payload = decode_payload(row, &raw.value)?;
            if raw.kind.is_transaction() {
                if payload.amount.is_none() {
                    return Err(decode_error(row, "transaction payload carries no amount"));
                }
            } else if payload.offer_id.is_none() {
                return Err(decode_error(
                    row,
                    "offer-lifecycle payload carries no offer identifier",
                ));
            }
            events.push(Event {
                customer_id: raw.customer_id.clone(),
                kind: raw.kind,
                time_hours: raw.time_hours,
                offer_id: payload.offer_id,
                amount: payload.amount,
                reward: payload.reward,
            });
        }
        debug!("EventDecoder: decoded {} events", events.len());
        Ok(events)
    }
}

fn decode_error(row: usize, detail: impl Into<String>) -> RewardsError {
    RewardsError::Decode {
        row,
        detail: detail.into(),
    }
}

fn decode_payload(row: usize, value: &serde_json::Value) -> Result<DecodedPayload> {
    let object = value
        .as_object()
        .ok_or_else(|| decode_error(row, "payload is not an object"))?;

    let mut payload = DecodedPayload::default();
    for (key, field) in object {
        match key.as_str() {
            "offer id" | "offer_id" => {
                let id = field
                    .as_str()
                    .ok_or_else(|| decode_error(row, "offer identifier is not a string"))?;
                if payload.offer_id.is_some() {
                    return Err(decode_error(row, "duplicate offer identifier keys"));
                }
                payload.offer_id = Some(id.to_string());
            }
            "amount" => {
                let amount = field
                    .as_f64()
                    .ok_or_else(|| decode_error(row, "amount is not a number"))?;
                if !(amount.is_finite() && amount >= 0.0) {
                    return Err(decode_error(row, format!("amount must be >= 0, got {amount}")));
                }
                payload.amount = Some(amount);
            }
            "reward" => {
                let reward = field
                    .as_f64()
                    .ok_or_else(|| decode_error(row, "reward is not a number"))?;
                payload.reward = Some(reward);
            }
            other => {
                return Err(decode_error(row, format!("unexpected key \"{other}\"")));
            }
        }
    }

    // Shape check: offer id (optionally with reward) XOR amount.
    match (&payload.offer_id, payload.amount, payload.reward) {
        (Some(_), None, _) => Ok(payload),
        (None, Some(_), None) => Ok(payload),
        (None, None, _) => Err(decode_error(row, "payload carries no offer id or amount")),
        (Some(_), Some(_), _) => Err(decode_error(
            row,
            "payload carries both an offer id and an amount",
        )),
        (None, Some(_), Some(_)) => Err(decode_error(
            row,
            "reward without an offer identifier",
        )),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
