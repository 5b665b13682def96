use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::ResponseResult;

// ─── Rule Types ───────────────────────────────────────────────────────────────

/// Where the actual value of a rule comes from.
///
/// Unrecognised sources are kept verbatim so they can be echoed back; they
/// extract `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssertionSource {
    StatusCode,
    ResponseTime,
    Header,
    Body,
    Other(String),
}

impl Default for AssertionSource {
    fn default() -> Self {
        AssertionSource::Other(String::new())
    }
}

impl AssertionSource {
    pub fn as_str(&self) -> &str {
        match self {
            AssertionSource::StatusCode => "status_code",
            AssertionSource::ResponseTime => "response_time",
            AssertionSource::Header => "header",
            AssertionSource::Body => "body",
            AssertionSource::Other(name) => name,
        }
    }
}

impl From<String> for AssertionSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            "status_code" => AssertionSource::StatusCode,
            "response_time" => AssertionSource::ResponseTime,
            "header" => AssertionSource::Header,
            "body" => AssertionSource::Body,
            _ => AssertionSource::Other(value),
        }
    }
}

impl From<AssertionSource> for String {
    fn from(source: AssertionSource) -> Self {
        match source {
            AssertionSource::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// Comparison applied between the actual and expected value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssertionOperator {
    Eq,
    Gt,
    Lt,
    Contains,
    Other(String),
}

impl Default for AssertionOperator {
    fn default() -> Self {
        AssertionOperator::Other(String::new())
    }
}

impl AssertionOperator {
    pub fn as_str(&self) -> &str {
        match self {
            AssertionOperator::Eq => "eq",
            AssertionOperator::Gt => "gt",
            AssertionOperator::Lt => "lt",
            AssertionOperator::Contains => "contains",
            AssertionOperator::Other(name) => name,
        }
    }
}

impl From<String> for AssertionOperator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "eq" => AssertionOperator::Eq,
            "gt" => AssertionOperator::Gt,
            "lt" => AssertionOperator::Lt,
            "contains" => AssertionOperator::Contains,
            _ => AssertionOperator::Other(value),
        }
    }
}

impl From<AssertionOperator> for String {
    fn from(operator: AssertionOperator) -> Self {
        match operator {
            AssertionOperator::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// Loosely typed expected value as authored by users.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl RuleValue {
    pub fn to_json(&self) -> Value {
        match self {
            RuleValue::Null => Value::Null,
            RuleValue::Bool(flag) => Value::Bool(*flag),
            RuleValue::Integer(number) => Value::from(*number),
            RuleValue::Float(number) => Value::from(*number),
            RuleValue::String(text) => Value::String(text.clone()),
        }
    }
}

/// Textual form used by `eq` and `contains`: strings verbatim, everything
/// else in compact JSON (`null`, `true`, `200`, `200.0`, `{"a":1}`).
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&stringify(&self.to_json()))
    }
}

/// A single declarative check against a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssertionRule {
    #[serde(default)]
    pub source: AssertionSource,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub operator: AssertionOperator,
    #[serde(default)]
    pub value: RuleValue,
}

/// Verdict for one rule: the rule itself plus what was observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionOutcome {
    #[serde(flatten)]
    pub rule: AssertionRule,
    pub actual_value: Value,
    pub passed: bool,
    pub error: Option<String>,
}

/// True when every outcome passed. No outcomes means nothing failed.
pub fn all_passed(outcomes: &[AssertionOutcome]) -> bool {
    outcomes.iter().all(|outcome| outcome.passed)
}

// ─── Report Types ─────────────────────────────────────────────────────────────

/// Result of running one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRunReport {
    #[serde(default)]
    pub name: String,
    pub result: ResponseResult,
    pub assertions: Vec<AssertionOutcome>,
    pub passed: bool,
}

/// Summary for a batch of test cases run one after another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub name: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Seconds spent on the whole batch.
    pub duration: f64,
    pub reports: Vec<TestRunReport>,
}

impl RunSummary {
    pub fn new(name: impl Into<String>, reports: Vec<TestRunReport>, duration: f64) -> Self {
        let passed = reports.iter().filter(|report| report.passed).count();
        Self {
            name: name.into(),
            total: reports.len(),
            passed,
            failed: reports.len() - passed,
            duration,
            reports,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
