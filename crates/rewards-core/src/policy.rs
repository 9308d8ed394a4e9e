//! Data-driven segment-label policy.
//!
//! Maps RFM rank triples to segment names via an ordered rule table rather
//! than branching logic, so a new segment taxonomy can be supplied (as JSON)
//! without touching the scoring algorithm.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RewardsError};

/// Label returned when no rule matches; unreachable once a policy has
/// passed [`SegmentPolicy::validate`].
const FALLBACK_LABEL: &str = "standard";

// ── RankRange ─────────────────────────────────────────────────────────────────

/// An inclusive range of quality ranks on one RFM axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankRange {
    pub min: u8,
    pub max: u8,
}

impl RankRange {
    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    /// The full `[1, bins]` range.
    pub fn full(bins: u8) -> Self {
        Self { min: 1, max: bins }
    }

    pub fn contains(&self, rank: u8) -> bool {
        rank >= self.min && rank <= self.max
    }
}

// ── SegmentRule ───────────────────────────────────────────────────────────────

/// One row of the policy table: a label plus the rank ranges it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRule {
    pub label: String,
    pub recency: RankRange,
    pub frequency: RankRange,
    pub monetary: RankRange,
}

impl SegmentRule {
    fn matches(&self, recency: u8, frequency: u8, monetary: u8) -> bool {
        self.recency.contains(recency)
            && self.frequency.contains(frequency)
            && self.monetary.contains(monetary)
    }
}

// ── SegmentPolicy ─────────────────────────────────────────────────────────────

/// An ordered, first-match-wins table of segment rules.
///
/// `bins` is the quantile bucket count `k`; every rank handled by the table
/// lies in `[1, bins]`. A valid policy covers every possible rank triple,
/// which [`validate`](Self::validate) checks exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPolicy {
    pub bins: u8,
    pub rules: Vec<SegmentRule>,
}

impl SegmentPolicy {
    /// The built-in quartile taxonomy used when no policy file is supplied.
    pub fn default_policy() -> Self {
        let bins = 4;
        let rule = |label: &str, r: (u8, u8), f: (u8, u8), m: (u8, u8)| SegmentRule {
            label: label.to_string(),
            recency: RankRange::new(r.0, r.1),
            frequency: RankRange::new(f.0, f.1),
            monetary: RankRange::new(m.0, m.1),
        };
        Self {
            bins,
            rules: vec![
                rule("champions", (4, 4), (4, 4), (4, 4)),
                rule("loyal", (3, 4), (3, 4), (3, 4)),
                rule("at risk", (1, 2), (3, 4), (3, 4)),
                rule("potential loyalist", (3, 4), (1, 2), (1, 4)),
                rule("lost", (1, 1), (1, 1), (1, 1)),
                rule("hibernating", (1, 2), (1, 2), (1, 2)),
                rule("standard", (1, 4), (1, 4), (1, 4)),
            ],
        }
    }

    /// Parse a policy from its JSON representation and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: SegmentPolicy = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Check that the table is well-formed and exhaustive.
    ///
    /// Fails with [`RewardsError::Config`] when:
    /// * `bins` is outside `[2, 10]`,
    /// * the rule list is empty,
    /// * any rank range is empty or extends outside `[1, bins]`,
    /// * some rank triple is covered by no rule.
    pub fn validate(&self) -> Result<()> {
        if !(2..=10).contains(&self.bins) {
            return Err(RewardsError::Config(format!(
                "quantile bin count must be in [2, 10], got {}",
                self.bins
            )));
        }
        if self.rules.is_empty() {
            return Err(RewardsError::Config(
                "segment policy has no rules".to_string(),
            ));
        }
        for rule in &self.rules {
            for (axis, range) in [
                ("recency", rule.recency),
                ("frequency", rule.frequency),
                ("monetary", rule.monetary),
            ] {
                if range.min < 1 || range.max > self.bins || range.min > range.max {
                    return Err(RewardsError::Config(format!(
                        "rule \"{}\": {axis} range [{}, {}] is invalid for {} bins",
                        rule.label, range.min, range.max, self.bins
                    )));
                }
            }
        }
        // Exhaustiveness: at most 10^3 triples, so brute force is fine.
        for r in 1..=self.bins {
            for f in 1..=self.bins {
                for m in 1..=self.bins {
                    if !self.rules.iter().any(|rule| rule.matches(r, f, m)) {
                        return Err(RewardsError::Config(format!(
                            "segment policy does not cover rank triple ({r}, {f}, {m})"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Label for a rank triple; the first matching rule wins.
    pub fn label_for(&self, recency: u8, frequency: u8, monetary: u8) -> &str {
        match self
            .rules
            .iter()
            .find(|rule| rule.matches(recency, frequency, monetary))
        {
            Some(rule) => &rule.label,
            // Unreachable once validate() has passed.
            None => FALLBACK_LABEL,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        SegmentPolicy::default_policy().validate().unwrap();
    }

    #[test]
    fn test_top_ranks_map_to_champions() {
        let policy = SegmentPolicy::default_policy();
        assert_eq!(policy.label_for(4, 4, 4), "champions");
    }

    #[test]
    fn test_worst_ranks_map_to_lost() {
        let policy = SegmentPolicy::default_policy();
        assert_eq!(policy.label_for(1, 1, 1), "lost");
    }

    #[test]
    fn test_poor_recency_good_value_maps_to_at_risk() {
        let policy = SegmentPolicy::default_policy();
        assert_eq!(policy.label_for(1, 4, 4), "at risk");
        assert_eq!(policy.label_for(2, 3, 3), "at risk");
    }

    #[test]
    fn test_first_match_wins_over_later_rules() {
        // (4,4,4) also matches "loyal" and "standard", but "champions" is first.
        let policy = SegmentPolicy::default_policy();
        assert_eq!(policy.label_for(4, 4, 4), "champions");
    }

    #[test]
    fn test_catch_all_covers_mixed_triples() {
        let policy = SegmentPolicy::default_policy();
        assert_eq!(policy.label_for(2, 4, 1), "standard");
    }

    #[test]
    fn test_validate_rejects_bad_bin_count() {
        let mut policy = SegmentPolicy::default_policy();
        policy.bins = 1;
        assert!(matches!(
            policy.validate(),
            Err(RewardsError::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_bounds_range() {
        let mut policy = SegmentPolicy::default_policy();
        policy.rules[0].recency = RankRange::new(4, 5);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_range() {
        let mut policy = SegmentPolicy::default_policy();
        policy.rules[0].monetary = RankRange::new(3, 2);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_exhaustive_table() {
        let policy = SegmentPolicy {
            bins: 4,
            rules: vec![SegmentRule {
                label: "champions".to_string(),
                recency: RankRange::new(4, 4),
                frequency: RankRange::new(4, 4),
                monetary: RankRange::new(4, 4),
            }],
        };
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("does not cover"));
    }

    #[test]
    fn test_from_json_round_trip() {
        let policy = SegmentPolicy::default_policy();
        let json = serde_json::to_string(&policy).unwrap();
        let back = SegmentPolicy::from_json(&json).unwrap();
        assert_eq!(back, policy);
    }

    #[test]
    fn test_from_json_rejects_malformed_document() {
        assert!(SegmentPolicy::from_json("{not json").is_err());
    }

    #[test]
    fn test_from_json_rejects_invalid_policy() {
        let json = r#"{"bins": 4, "rules": []}"#;
        assert!(matches!(
            SegmentPolicy::from_json(json),
            Err(RewardsError::Config(_))
        ));
    }
}
