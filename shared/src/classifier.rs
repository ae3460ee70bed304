//! Result classification
//!
//! Maps a raw extracted value and a human-readable reference range onto a
//! [`ResultStatus`]. Classification is total: anything that cannot be
//! compared numerically is `Unknown`, never an error.
//!
//! Bounds are inclusive, so a value sitting exactly on a stated boundary
//! is `Normal`. Escalation of an out-of-range result to `Critical` is
//! delegated to a [`CriticalPolicy`], which keeps per-test thresholds out
//! of the comparison logic.

use crate::models::{LabResult, ResultStatus, ResultValue};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

const NUMBER: &str = r"(-?(?:\d+(?:\.\d+)?|\.\d+))";

static THOUSANDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d),(\d{3})").unwrap());

static UPPER_BOUND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?:<=?|=<|less than|up to|below|under)\s*{}",
        NUMBER
    ))
    .unwrap()
});

static LOWER_BOUND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?:>=?|=>|greater than|more than|above|over)\s*{}",
        NUMBER
    ))
    .unwrap()
});

static BETWEEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"{}\s*(?:-|to)\s*{}", NUMBER, NUMBER)).unwrap());

static PLAIN_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(&format!("^{}$", NUMBER)).unwrap());

/// Comparable bounds parsed out of a reference-range string
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ReferenceRange {
    /// `low - high`, both inclusive
    Between { low: f64, high: f64 },
    /// `< x`: anything up to and including `x`
    AtMost { max: f64 },
    /// `> x`: anything from `x` upwards
    AtLeast { min: f64 },
}

impl ReferenceRange {
    /// Parse a range such as `"4.0–10.0"`, `"<200"` or `">= 40 mg/dL"`
    pub fn parse(raw: &str) -> Option<Self> {
        let text = normalize(raw);
        let text = text.trim();

        if let Some(caps) = UPPER_BOUND.captures(text) {
            let max = caps[1].parse::<f64>().ok()?;
            return Some(ReferenceRange::AtMost { max });
        }

        if let Some(caps) = LOWER_BOUND.captures(text) {
            let min = caps[1].parse::<f64>().ok()?;
            return Some(ReferenceRange::AtLeast { min });
        }

        let caps = BETWEEN.captures(text)?;
        let a = caps[1].parse::<f64>().ok()?;
        let b = caps[2].parse::<f64>().ok()?;
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Some(ReferenceRange::Between { low, high })
    }

    /// Compare a value against the bounds
    pub fn evaluate(&self, value: f64) -> ResultStatus {
        if !value.is_finite() {
            return ResultStatus::Unknown;
        }
        match *self {
            ReferenceRange::Between { low, high } => {
                if value < low {
                    ResultStatus::Low
                } else if value > high {
                    ResultStatus::High
                } else {
                    ResultStatus::Normal
                }
            }
            ReferenceRange::AtMost { max } => {
                if value > max {
                    ResultStatus::High
                } else {
                    ResultStatus::Normal
                }
            }
            ReferenceRange::AtLeast { min } => {
                if value < min {
                    ResultStatus::Low
                } else {
                    ResultStatus::Normal
                }
            }
        }
    }
}

/// Parse a textual value as a number.
///
/// Qualitative values (`"Positive"`, `"<0.5"`, `"trace"`) are not numbers.
pub fn parse_numeric(text: &str) -> Option<f64> {
    let text = normalize(text);
    let text = text.trim();
    if !PLAIN_NUMBER.is_match(text) {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Classify a value against a reference range.
///
/// Non-numeric values and unparseable ranges yield `Unknown`.
pub fn classify(value: &ResultValue, reference_range: &str) -> ResultStatus {
    match (value.as_number(), ReferenceRange::parse(reference_range)) {
        (Some(v), Some(range)) => range.evaluate(v),
        _ => ResultStatus::Unknown,
    }
}

fn normalize(raw: &str) -> String {
    let mut text: String = raw
        .chars()
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' | '\u{2212}' | '\u{2010}' | '\u{2011}' => '-',
            _ => c,
        })
        .collect::<String>()
        .replace('\u{2264}', "<=")
        .replace('\u{2265}', ">=")
        .to_lowercase();

    while THOUSANDS.is_match(&text) {
        text = THOUSANDS.replace_all(&text, "${1}${2}").into_owned();
    }
    text
}

// ============================================================================
// Critical escalation
// ============================================================================

/// Decides whether an out-of-range result is critical.
///
/// Only consulted for results already classified `High` or `Low`.
pub trait CriticalPolicy: Send + Sync {
    fn is_critical(
        &self,
        test_name: &str,
        status: ResultStatus,
        value: f64,
        range: &ReferenceRange,
    ) -> bool;
}

/// Never escalates
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCritical;

impl CriticalPolicy for NeverCritical {
    fn is_critical(&self, _: &str, _: ResultStatus, _: f64, _: &ReferenceRange) -> bool {
        false
    }
}

/// Wraps a closure as a policy
pub struct PredicatePolicy<F>(pub F);

impl<F> CriticalPolicy for PredicatePolicy<F>
where
    F: Fn(&str, ResultStatus, f64, &ReferenceRange) -> bool + Send + Sync,
{
    fn is_critical(
        &self,
        test_name: &str,
        status: ResultStatus,
        value: f64,
        range: &ReferenceRange,
    ) -> bool {
        (self.0)(test_name, status, value, range)
    }
}

/// Critical threshold for one test
///
/// A rule with neither bound escalates every out-of-range value of the
/// test. Otherwise a low result is critical below `below` and a high
/// result is critical above `above`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalRule {
    pub test: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<f64>,
}

impl CriticalRule {
    pub fn new(test: impl Into<String>, below: Option<f64>, above: Option<f64>) -> Self {
        Self {
            test: test.into(),
            below,
            above,
        }
    }

    fn applies_to(&self, test_name: &str) -> bool {
        let needle = key(&self.test);
        !needle.is_empty() && key(test_name).contains(&needle)
    }

    fn escalates(&self, status: ResultStatus, value: f64) -> bool {
        match (self.below, self.above) {
            (None, None) => status.is_abnormal(),
            (below, above) => match status {
                ResultStatus::Low => below.is_some_and(|b| value < b),
                ResultStatus::High => above.is_some_and(|a| value > a),
                _ => false,
            },
        }
    }
}

/// Table-driven policy built from configured rules
#[derive(Debug, Clone, Default)]
pub struct CriticalRules {
    rules: Vec<CriticalRule>,
}

impl CriticalRules {
    pub fn new(rules: Vec<CriticalRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[CriticalRule] {
        &self.rules
    }
}

impl CriticalPolicy for CriticalRules {
    fn is_critical(
        &self,
        test_name: &str,
        status: ResultStatus,
        value: f64,
        _range: &ReferenceRange,
    ) -> bool {
        self.rules
            .iter()
            .filter(|rule| rule.applies_to(test_name))
            .any(|rule| rule.escalates(status, value))
    }
}

fn key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Classifier with an escalation policy
pub struct Classifier {
    policy: Box<dyn CriticalPolicy>,
}

impl Classifier {
    pub fn new(policy: impl CriticalPolicy + 'static) -> Self {
        Self {
            policy: Box::new(policy),
        }
    }

    /// Status for one result, escalated when the policy says so
    pub fn classify_result(&self, result: &LabResult) -> ResultStatus {
        let (Some(value), Some(range)) = (
            result.value.as_number(),
            ReferenceRange::parse(&result.reference_range),
        ) else {
            return ResultStatus::Unknown;
        };

        let status = range.evaluate(value);
        if matches!(status, ResultStatus::High | ResultStatus::Low)
            && self
                .policy
                .is_critical(&result.test_name, status, value, &range)
        {
            ResultStatus::Critical
        } else {
            status
        }
    }

    /// Overwrite the status of every result in place
    pub fn apply(&self, results: &mut [LabResult]) {
        for result in results.iter_mut() {
            result.status = self.classify_result(result);
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(NeverCritical)
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier").finish_non_exhaustive()
    }
}
