use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Customer gender as recorded in the profile set.
///
/// Missing values are mapped to [`Gender::Unknown`] by the cleaner rather
/// than dropped, so the cleaned table stays total over the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    Unknown,
}

impl Gender {
    /// Lowercase string form, matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Unknown => "unknown",
        }
    }
}

/// A raw customer profile row, exactly as loaded from storage.
///
/// `became_member_on` carries the membership start as a packed `yyyymmdd`
/// integer; the cleaner normalises it to a calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCustomer {
    /// Unique customer identifier.
    pub id: String,
    /// Gender, when recorded.
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Age in years, when recorded. Implausibly high values act as a
    /// missing-value marker in the source data.
    #[serde(default)]
    pub age: Option<u32>,
    /// Annual income, when recorded.
    #[serde(default)]
    pub income: Option<f64>,
    /// Membership start date as a packed `yyyymmdd` integer.
    pub became_member_on: u32,
}

/// A cleaned customer profile: every field populated, dates normalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer identifier.
    pub id: String,
    /// Gender, with missing values mapped to `unknown`.
    pub gender: Gender,
    /// Age in years, implausible values replaced by the valid-age median.
    pub age: u32,
    /// Annual income, outliers and missing values replaced by the
    /// in-fence median.
    pub income: f64,
    /// Membership start date.
    pub member_since: NaiveDate,
}

/// Promotional offer category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    /// Buy-one-get-one.
    Bogo,
    Discount,
    Informational,
}

impl OfferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferType::Bogo => "bogo",
            OfferType::Discount => "discount",
            OfferType::Informational => "informational",
        }
    }
}

/// Distribution channel through which an offer reaches a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Web,
    Email,
    Mobile,
    Social,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Web => "web",
            Channel::Email => "email",
            Channel::Mobile => "mobile",
            Channel::Social => "social",
        }
    }
}

/// A promotional offer definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    /// Unique offer identifier.
    pub id: String,
    /// Offer category.
    pub offer_type: OfferType,
    /// Minimum spend required to qualify for the reward.
    pub difficulty: f64,
    /// Reward earned on completion.
    pub reward: f64,
    /// Validity window in days, counted from the received event.
    pub duration_days: u32,
    /// Distribution channels; order-irrelevant, must be non-empty.
    pub channels: Vec<Channel>,
}

/// Kind of a record in the event log.
///
/// Serialized names match the source data (`"offer received"` etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "offer received")]
    OfferReceived,
    #[serde(rename = "offer viewed")]
    OfferViewed,
    #[serde(rename = "offer completed")]
    OfferCompleted,
    #[serde(rename = "transaction")]
    Transaction,
}

impl EventKind {
    /// Whether this is one of the three offer-lifecycle kinds.
    pub fn is_offer_lifecycle(&self) -> bool {
        !self.is_transaction()
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self, EventKind::Transaction)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::OfferReceived => "offer received",
            EventKind::OfferViewed => "offer viewed",
            EventKind::OfferCompleted => "offer completed",
            EventKind::Transaction => "transaction",
        }
    }
}

/// A raw event-log row with its payload still encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    /// Customer this event belongs to.
    pub customer_id: String,
    /// Event kind.
    #[serde(rename = "event")]
    pub kind: EventKind,
    /// Elapsed hours since the start of the program.
    #[serde(rename = "time")]
    pub time_hours: i64,
    /// Encoded payload: an offer id, an amount, or an offer id plus the
    /// earned reward, depending on the event kind.
    #[serde(default)]
    pub value: serde_json::Value,
}

/// A decoded event: the payload has been replaced by its extracted fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Customer this event belongs to.
    pub customer_id: String,
    /// Event kind.
    pub kind: EventKind,
    /// Elapsed hours since the start of the program.
    pub time_hours: i64,
    /// Offer referenced by the payload; absent for pure transactions.
    pub offer_id: Option<String>,
    /// Monetary amount carried by a transaction payload.
    pub amount: Option<f64>,
    /// Reward earned, present on completion payloads that carry it.
    pub reward: Option<f64>,
}

/// How the merger treats events whose foreign keys have no match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Abort the run on the first orphan event.
    Strict,
    /// Drop orphan rows, count them, and log each drop.
    Lenient,
}

impl MergePolicy {
    /// Parse a policy name as accepted on the command line.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "strict" => Some(MergePolicy::Strict),
            "lenient" => Some(MergePolicy::Lenient),
            _ => None,
        }
    }
}

/// One row of the denormalized Event × Customer × Offer table.
///
/// Offer fields are `None` for transaction rows; customer fields are
/// always populated (orphan events never reach the merged table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    // Event fields.
    pub customer_id: String,
    pub kind: EventKind,
    pub time_hours: i64,
    pub offer_id: Option<String>,
    pub amount: Option<f64>,
    pub reward_earned: Option<f64>,

    // Customer fields.
    pub gender: Gender,
    pub age: u32,
    pub income: f64,
    pub member_since: NaiveDate,

    // Offer fields (all-None for transaction rows).
    pub offer_type: Option<OfferType>,
    pub difficulty: Option<f64>,
    pub offer_reward: Option<f64>,
    pub duration_days: Option<u32>,
    pub channels: Option<Vec<Channel>>,
}

impl MergedRecord {
    pub fn is_transaction(&self) -> bool {
        self.kind.is_transaction()
    }

    /// Elapsed whole days since the start of the program.
    pub fn elapsed_day(&self) -> i64 {
        self.time_hours.div_euclid(24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── EventKind ─────────────────────────────────────────────────────────

    #[test]
    fn test_event_kind_serde_names() {
        let kind: EventKind = serde_json::from_str(r#""offer received""#).unwrap();
        assert_eq!(kind, EventKind::OfferReceived);
        let json = serde_json::to_string(&EventKind::Transaction).unwrap();
        assert_eq!(json, r#""transaction""#);
    }

    #[test]
    fn test_event_kind_partitioning_predicates() {
        assert!(EventKind::OfferReceived.is_offer_lifecycle());
        assert!(EventKind::OfferViewed.is_offer_lifecycle());
        assert!(EventKind::OfferCompleted.is_offer_lifecycle());
        assert!(EventKind::Transaction.is_transaction());
        assert!(!EventKind::Transaction.is_offer_lifecycle());
    }

    // ── Gender / OfferType / Channel ──────────────────────────────────────

    #[test]
    fn test_gender_serde_lowercase() {
        let g: Gender = serde_json::from_str(r#""female""#).unwrap();
        assert_eq!(g, Gender::Female);
        assert_eq!(g.as_str(), "female");
    }

    #[test]
    fn test_offer_type_round_trip() {
        for (ty, name) in [
            (OfferType::Bogo, "bogo"),
            (OfferType::Discount, "discount"),
            (OfferType::Informational, "informational"),
        ] {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{name}\""));
            assert_eq!(ty.as_str(), name);
        }
    }

    #[test]
    fn test_channel_as_str_matches_serde() {
        for ch in [Channel::Web, Channel::Email, Channel::Mobile, Channel::Social] {
            let json = serde_json::to_string(&ch).unwrap();
            assert_eq!(json, format!("\"{}\"", ch.as_str()));
        }
    }

    // ── RawCustomer / RawEvent deserialization ────────────────────────────

    #[test]
    fn test_raw_customer_optional_fields_default() {
        let raw: RawCustomer =
            serde_json::from_str(r#"{"id": "c-1", "became_member_on": 20170715}"#).unwrap();
        assert_eq!(raw.id, "c-1");
        assert!(raw.gender.is_none());
        assert!(raw.age.is_none());
        assert!(raw.income.is_none());
        assert_eq!(raw.became_member_on, 20170715);
    }

    #[test]
    fn test_raw_event_field_renames() {
        let raw: RawEvent = serde_json::from_str(
            r#"{"customer_id": "c-1", "event": "transaction", "time": 126, "value": {"amount": 9.5}}"#,
        )
        .unwrap();
        assert_eq!(raw.kind, EventKind::Transaction);
        assert_eq!(raw.time_hours, 126);
        assert_eq!(raw.value["amount"], 9.5);
    }

    // ── MergePolicy ───────────────────────────────────────────────────────

    #[test]
    fn test_merge_policy_parse() {
        assert_eq!(MergePolicy::parse("strict"), Some(MergePolicy::Strict));
        assert_eq!(MergePolicy::parse("lenient"), Some(MergePolicy::Lenient));
        assert_eq!(MergePolicy::parse("other"), None);
    }

    // ── MergedRecord ──────────────────────────────────────────────────────

    #[test]
    fn test_merged_record_elapsed_day() {
        let record = MergedRecord {
            customer_id: "c-1".to_string(),
            kind: EventKind::Transaction,
            time_hours: 126,
            offer_id: None,
            amount: Some(9.5),
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
        };
        // 126 hours = day 5.
        assert_eq!(record.elapsed_day(), 5);
        assert!(record.is_transaction());
    }
}
