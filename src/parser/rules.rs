use tracing::debug;

use super::normalize::normalize_field;
use crate::record::{CollegeRecord, StatField};

/// One row of an ordered classification table.
///
/// A rule matches when the lowercased text contains every `all` keyword and,
/// if `any` is non-empty, at least one `any` keyword. A matching rule with no
/// `target` swallows the element so later rules never see it.
pub struct StatRule {
    pub all: &'static [&'static str],
    pub any: &'static [&'static str],
    pub target: Option<StatField>,
    pub labels: &'static [&'static str],
}

impl StatRule {
    pub const fn new(all: &'static [&'static str], target: StatField) -> Self {
        StatRule {
            all,
            any: &[],
            target: Some(target),
            labels: &[],
        }
    }

    pub const fn any(mut self, any: &'static [&'static str]) -> Self {
        self.any = any;
        self
    }

    pub const fn strip(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    pub const fn swallow(all: &'static [&'static str]) -> Self {
        StatRule {
            all,
            any: &[],
            target: None,
            labels: &[],
        }
    }

    fn matches(&self, lower: &str) -> bool {
        self.all.iter().all(|k| lower.contains(k))
            && (self.any.is_empty() || self.any.iter().any(|k| lower.contains(k)))
    }
}

/// First rule in `rules` matching `key`. Later rules are never consulted.
pub fn classify<'r>(rules: &'r [StatRule], key: &str) -> Option<&'r StatRule> {
    let lower = key.to_lowercase();
    rules.iter().find(|r| r.matches(&lower))
}

/// Classify `key` and write the normalized `value` into the first matching
/// slot. Returns the slot written, if any.
pub fn apply(
    rules: &[StatRule],
    record: &mut CollegeRecord,
    key: &str,
    value: &str,
) -> Option<StatField> {
    let rule = classify(rules, key)?;
    let field = rule.target?;
    let normalized = normalize_field(value, rule.labels);
    debug!(?field, value = %normalized, "stat matched");
    record.set_stat(field, normalized);
    Some(field)
}
