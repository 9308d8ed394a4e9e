//! Per-entity field normalization and imputation.
//!
//! Cleaning is a pure function of the input rows: it produces new derived
//! copies and never mutates the originals, so re-running it on its own
//! output is a no-op.

use chrono::NaiveDate;
use rewards_core::error::{Result, RewardsError};
use rewards_core::models::{Customer, Gender, Offer, RawCustomer};
use rewards_core::stats::{iqr_fences, median_of};
use tracing::debug;

// ── CleanerConfig ─────────────────────────────────────────────────────────────

/// Thresholds used during customer cleaning.
#[derive(Debug, Clone)]
pub struct CleanerConfig {
    /// Ages above this value are treated as a missing-value marker (the
    /// source data encodes missing age as 118).
    pub max_plausible_age: u32,
    /// Tukey fence multiplier for income outlier detection.
    pub iqr_multiplier: f64,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            max_plausible_age: 100,
            iqr_multiplier: 1.5,
        }
    }
}

// ── RecordCleaner ─────────────────────────────────────────────────────────────

/// Normalises raw customer rows and validates offer definitions.
pub struct RecordCleaner {
    config: CleanerConfig,
}

impl RecordCleaner {
    pub fn new(config: CleanerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(CleanerConfig::default())
    }

    // ── Customers ─────────────────────────────────────────────────────────────

    /// Clean a set of raw customer rows.
    ///
    /// 1. Gender: missing → [`Gender::Unknown`].
    /// 2. Age: values above `max_plausible_age` are replaced by the median
    ///    of the *valid* ages (implausible values excluded from the median).
    /// 3. Income: values outside the IQR fences, and missing values, are
    ///    replaced by the median of the in-fence incomes.
    /// 4. Membership start: packed `yyyymmdd` normalized to a calendar date.
    ///
    /// Fails with [`RewardsError::Validation`] when a median cannot be
    /// computed because a column has no usable values at all.
    pub fn clean_customers(&self, rows: &[RawCustomer]) -> Result<Vec<Customer>> {
        let valid_ages: Vec<f64> = rows
            .iter()
            .filter_map(|r| r.age)
            .filter(|&a| a <= self.config.max_plausible_age)
            .map(f64::from)
            .collect();
        let median_age = median_of(&valid_ages).ok_or_else(|| {
            RewardsError::Validation("no plausible age values in the customer set".to_string())
        })?;
        let median_age = median_age.round() as u32;

        let incomes: Vec<f64> = rows
            .iter()
            .filter_map(|r| r.income)
            .filter(|i| i.is_finite())
            .collect();
        let fences = iqr_fences(&incomes, self.config.iqr_multiplier).ok_or_else(|| {
            RewardsError::Validation("no income values in the customer set".to_string())
        })?;
        // A zero-width IQR means the middle half of the column is a single
        // value; fencing would then flag everything else as an outlier, so
        // the column is carried through unchanged instead.
        let fences = (fences.upper > fences.lower).then_some(fences);
        let in_fence: Vec<f64> = incomes
            .iter()
            .copied()
            .filter(|&i| fences.map_or(true, |f| f.contains(i)))
            .collect();
        let median_income = median_of(&in_fence).ok_or_else(|| {
            RewardsError::Validation("no in-fence income values in the customer set".to_string())
        })?;

        let mut cleaned = Vec::with_capacity(rows.len());
        for row in rows {
            let age = match row.age {
                Some(a) if a <= self.config.max_plausible_age => a,
                _ => median_age,
            };
            let income = match row.income {
                Some(i) if i.is_finite() && fences.map_or(true, |f| f.contains(i)) => i,
                _ => median_income,
            };
            let member_since = parse_member_date(row.became_member_on).ok_or_else(|| {
                RewardsError::Validation(format!(
                    "customer \"{}\": invalid membership date {}",
                    row.id, row.became_member_on
                ))
            })?;
            cleaned.push(Customer {
                id: row.id.clone(),
                gender: row.gender.unwrap_or(Gender::Unknown),
                age,
                income,
                member_since,
            });
        }

        debug!(
            "RecordCleaner: cleaned {} customers (median age {}, median income {:.2})",
            cleaned.len(),
            median_age,
            median_income
        );
        Ok(cleaned)
    }

    // ── Offers ────────────────────────────────────────────────────────────────

    /// Validate offer definitions and normalize their channel sets.
    ///
    /// Channel order is irrelevant, so duplicates are removed (first
    /// occurrence kept). Fails with [`RewardsError::Validation`] on a
    /// negative difficulty or reward, a zero duration, or an empty
    /// channel set.
    pub fn clean_offers(&self, offers: &[Offer]) -> Result<Vec<Offer>> {
        let mut cleaned = Vec::with_capacity(offers.len());
        for offer in offers {
            if !(offer.difficulty.is_finite() && offer.difficulty >= 0.0) {
                return Err(RewardsError::Validation(format!(
                    "offer \"{}\": difficulty must be >= 0, got {}",
                    offer.id, offer.difficulty
                )));
            }
            if !(offer.reward.is_finite() && offer.reward >= 0.0) {
                return Err(RewardsError::Validation(format!(
                    "offer \"{}\": reward must be >= 0, got {}",
                    offer.id, offer.reward
                )));
            }
            if offer.duration_days == 0 {
                return Err(RewardsError::Validation(format!(
                    "offer \"{}\": duration must be > 0 days",
                    offer.id
                )));
            }
            if offer.channels.is_empty() {
                return Err(RewardsError::Validation(format!(
                    "offer \"{}\": channel set is empty",
                    offer.id
                )));
            }
            let mut channels = Vec::with_capacity(offer.channels.len());
            for &ch in &offer.channels {
                if !channels.contains(&ch) {
                    channels.push(ch);
                }
            }
            cleaned.push(Offer {
                channels,
                ..offer.clone()
            });
        }
        Ok(cleaned)
    }
}

/// Split a packed `yyyymmdd` integer into a calendar date.
fn parse_member_date(packed: u32) -> Option<NaiveDate> {
    let year = (packed / 10_000) as i32;
    let month = packed / 100 % 100;
    let day = packed % 100;
    NaiveDate::from_ymd_opt(year, month, day)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
