//! Assertion evaluation.
//!
//! Each rule extracts an actual value from the response, then compares it with
//! the expected value. Comparison semantics:
//!
//! - `eq`: when the expected value is an integer and the actual value is a
//!   digit-only string, the actual value becomes that integer first; then the
//!   two are compared by their string forms (see [`stringify`]). `200` and
//!   `200.0` are therefore *not* equal.
//! - `gt` / `lt`: both sides are read as floats; anything non-numeric is an error.
//! - `contains`: substring test on the string forms.
//!
//! Failures are recorded on the rule's outcome; they never stop the batch.

use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::domain::{
    stringify, AssertionOperator, AssertionOutcome, AssertionRule, AssertionSource,
    ResponseResult, RuleValue,
};
use crate::error::EngineError;

use super::extract::{JsonPathExtractor, PathExtractor};

#[derive(Clone)]
pub struct AssertionEvaluator {
    extractor: Arc<dyn PathExtractor>,
}

impl Default for AssertionEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(JsonPathExtractor))
    }
}

impl AssertionEvaluator {
    pub fn new(extractor: Arc<dyn PathExtractor>) -> Self {
        Self { extractor }
    }

    /// Evaluate `rules` in order, one outcome per rule.
    pub fn evaluate(&self, response: &ResponseResult, rules: &[AssertionRule]) -> Vec<AssertionOutcome> {
        rules
            .iter()
            .map(|rule| self.evaluate_rule(response, rule))
            .collect()
    }

    pub fn evaluate_rule(&self, response: &ResponseResult, rule: &AssertionRule) -> AssertionOutcome {
        let (actual_value, verdict) = match self.extract(response, rule) {
            Ok(actual) => compare(&rule.operator, actual, &rule.value),
            Err(err) => (Value::Null, Err(err)),
        };

        let (passed, error) = match verdict {
            Ok(passed) => (passed, None),
            Err(err) => (false, Some(err.describe())),
        };

        match &error {
            Some(message) => tracing::warn!(
                source = rule.source.as_str(),
                operator = rule.operator.as_str(),
                error = %message,
                "assertion errored"
            ),
            None => tracing::debug!(
                source = rule.source.as_str(),
                operator = rule.operator.as_str(),
                expected = %rule.value,
                actual = %stringify(&actual_value),
                passed,
                "assertion evaluated"
            ),
        }

        AssertionOutcome {
            rule: rule.clone(),
            actual_value,
            passed,
            error,
        }
    }

    fn extract(&self, response: &ResponseResult, rule: &AssertionRule) -> Result<Value, EngineError> {
        match &rule.source {
            AssertionSource::StatusCode => Ok(Value::from(response.status_code)),
            AssertionSource::ResponseTime => Ok(Value::from(response.duration)),
            AssertionSource::Header => {
                let name = rule.expression.as_deref().ok_or_else(|| {
                    EngineError::Extraction("Header assertion requires a header name".to_string())
                })?;
                Ok(header_value(response, name))
            }
            AssertionSource::Body => match rule.expression.as_deref() {
                Some(expression) if expression.starts_with('$') => {
                    self.body_value(response, expression)
                }
                _ => Ok(Value::Null),
            },
            AssertionSource::Other(_) => Ok(Value::Null),
        }
    }

    fn body_value(&self, response: &ResponseResult, expression: &str) -> Result<Value, EngineError> {
        let document = response.body_value();
        // Third-party path engines may panic on odd input; keep that inside the rule.
        let found = catch_unwind(AssertUnwindSafe(|| {
            self.extractor.first_match(&document, expression)
        }))
        .map_err(|_| {
            EngineError::Extraction(format!("Path extractor failed on `{expression}`"))
        })??;
        Ok(found.unwrap_or(Value::Null))
    }
}

/// Case-insensitive header lookup; a missing header is `null`.
fn header_value(response: &ResponseResult, name: &str) -> Value {
    let wanted = name.to_lowercase();
    response
        .headers
        .iter()
        .find(|(key, _)| key.to_lowercase() == wanted)
        .map(|(_, value)| Value::String(value.clone()))
        .unwrap_or(Value::Null)
}

/// Apply `operator`. Returns the (possibly coerced) actual value with the verdict.
fn compare(
    operator: &AssertionOperator,
    actual: Value,
    expected: &RuleValue,
) -> (Value, Result<bool, EngineError>) {
    match operator {
        AssertionOperator::Eq => {
            let actual = coerce_digit_string(actual, expected);
            let passed = stringify(&actual) == expected.to_string();
            (actual, Ok(passed))
        }
        AssertionOperator::Gt => {
            let verdict = numeric_pair(&actual, expected).map(|(a, e)| a > e);
            (actual, verdict)
        }
        AssertionOperator::Lt => {
            let verdict = numeric_pair(&actual, expected).map(|(a, e)| a < e);
            (actual, verdict)
        }
        AssertionOperator::Contains => {
            let passed = stringify(&actual).contains(&expected.to_string());
            (actual, Ok(passed))
        }
        AssertionOperator::Other(name) => (
            actual,
            Err(EngineError::Assertion(format!("Unknown operator: {name}"))),
        ),
    }
}

/// `"0200"` against an integer expectation becomes `200`.
fn coerce_digit_string(actual: Value, expected: &RuleValue) -> Value {
    let RuleValue::Integer(_) = expected else {
        return actual;
    };
    match &actual {
        Value::String(text) if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) => {
            match text.parse::<u64>() {
                Ok(number) => Value::from(number),
                // Wider than u64: drop the leading zeros an integer would not print.
                Err(_) => {
                    let trimmed = text.trim_start_matches('0');
                    Value::String(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
                }
            }
        }
        _ => actual,
    }
}

fn numeric_pair(actual: &Value, expected: &RuleValue) -> Result<(f64, f64), EngineError> {
    Ok((to_float(actual)?, to_float(&expected.to_json())?))
}

/// Float coercion for `gt`/`lt`: numbers, numeric strings and booleans.
fn to_float(value: &Value) -> Result<f64, EngineError> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    number.ok_or_else(|| {
        EngineError::Assertion(format!(
            "Cannot compare `{}` as a number",
            stringify(value)
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{all_passed, ResponseBody};
    use crate::engine::extract::UnavailableExtractor;
    use serde_json::json;
    use std::collections::HashMap;

    fn response(status_code: u16, body: Value) -> ResponseResult {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        headers.insert("X-Request-Id".to_string(), "abc-123".to_string());
        ResponseResult {
            status_code,
            headers,
            body: Some(ResponseBody::Json(body)),
            duration: 0.15,
            error: None,
        }
    }

    fn rule(source: &str, expression: Option<&str>, operator: &str, value: RuleValue) -> AssertionRule {
        AssertionRule {
            source: AssertionSource::from(source.to_string()),
            expression: expression.map(str::to_string),
            operator: AssertionOperator::from(operator.to_string()),
            value,
        }
    }

    fn eval(response: &ResponseResult, rule: AssertionRule) -> AssertionOutcome {
        AssertionEvaluator::default().evaluate_rule(response, &rule)
    }

    #[test]
    fn eq_status_code() {
        let resp = response(200, json!({}));
        let outcome = eval(&resp, rule("status_code", None, "eq", RuleValue::Integer(200)));
        assert!(outcome.passed);
        assert_eq!(outcome.actual_value, json!(200));
        assert_eq!(outcome.error, None);

        let outcome = eval(&resp, rule("status_code", None, "eq", RuleValue::Integer(201)));
        assert!(!outcome.passed);
        assert_eq!(outcome.error, None);
    }

    #[test]
    fn eq_digit_string_against_integer() {
        let resp = response(200, json!({"code": "200", "padded": "0200"}));
        let outcome = eval(&resp, rule("body", Some("$.code"), "eq", RuleValue::Integer(200)));
        assert!(outcome.passed);
        assert_eq!(outcome.actual_value, json!(200));

        let outcome = eval(&resp, rule("body", Some("$.padded"), "eq", RuleValue::Integer(200)));
        assert!(outcome.passed);
        assert_eq!(outcome.actual_value, json!(200));
    }

    #[test]
    fn eq_compares_string_forms() {
        let resp = response(200, json!({"name": "abc"}));
        assert!(eval(&resp, rule("body", Some("$.name"), "eq", RuleValue::String("abc".into()))).passed);
        assert!(eval(&resp, rule("status_code", None, "eq", RuleValue::String("200".into()))).passed);
        // No numeric normalisation between integer and float.
        assert!(!eval(&resp, rule("status_code", None, "eq", RuleValue::Float(200.0))).passed);
    }

    #[test]
    fn eq_padded_string_against_string_is_literal() {
        let resp = response(200, json!({"padded": "0200"}));
        let outcome = eval(&resp, rule("body", Some("$.padded"), "eq", RuleValue::String("200".into())));
        assert!(!outcome.passed);
        assert_eq!(outcome.actual_value, json!("0200"));
    }

    #[test]
    fn gt_and_lt_on_numbers() {
        let resp = response(200, json!({"count": 150, "ratio": "0.25"}));
        assert!(eval(&resp, rule("body", Some("$.count"), "gt", RuleValue::Integer(100))).passed);
        assert!(!eval(&resp, rule("body", Some("$.count"), "lt", RuleValue::Integer(100))).passed);
        assert!(eval(&resp, rule("body", Some("$.ratio"), "lt", RuleValue::String("0.5".into()))).passed);
        assert!(eval(&resp, rule("response_time", None, "lt", RuleValue::Float(1.0))).passed);
        assert!(eval(&resp, rule("response_time", None, "gt", RuleValue::Float(0.1))).passed);
    }

    #[test]
    fn gt_on_non_number_is_error() {
        let resp = response(200, json!({"value": "not-a-number"}));
        let outcome = eval(&resp, rule("body", Some("$.value"), "gt", RuleValue::Integer(1)));
        assert!(!outcome.passed);
        assert_eq!(outcome.actual_value, json!("not-a-number"));
        assert!(outcome.error.unwrap().contains("not-a-number"));
    }

    #[test]
    fn lt_against_missing_value_is_error() {
        let resp = response(200, json!({}));
        let outcome = eval(&resp, rule("body", Some("$.missing"), "lt", RuleValue::Integer(1)));
        assert!(!outcome.passed);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn contains_on_stringified_object() {
        let resp = response(200, json!({"msg": "hello world"}));
        let outcome = eval(&resp, rule("body", Some("$"), "contains", RuleValue::String("world".into())));
        assert!(outcome.passed);
        assert_eq!(outcome.actual_value, json!({"msg": "hello world"}));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let resp = response(200, json!({}));
        let outcome = eval(
            &resp,
            rule("header", Some("Content-Type"), "contains", RuleValue::String("json".into())),
        );
        assert!(outcome.passed);
        assert_eq!(outcome.actual_value, json!("application/json"));

        let outcome = eval(
            &resp,
            rule("header", Some("x-request-id"), "eq", RuleValue::String("abc-123".into())),
        );
        assert!(outcome.passed);
    }

    #[test]
    fn missing_header_is_null_not_error() {
        let resp = response(200, json!({}));
        let outcome = eval(&resp, rule("header", Some("X-Missing"), "eq", RuleValue::Null));
        assert_eq!(outcome.actual_value, Value::Null);
        assert_eq!(outcome.error, None);
        assert!(outcome.passed);
    }

    #[test]
    fn header_without_name_is_error() {
        let resp = response(200, json!({}));
        let outcome = eval(&resp, rule("header", None, "eq", RuleValue::String("x".into())));
        assert!(!outcome.passed);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn body_path_extraction() {
        let resp = response(200, json!({"data": {"id": 42}}));
        let outcome = eval(&resp, rule("body", Some("$.data.id"), "eq", RuleValue::Integer(42)));
        assert!(outcome.passed);
        assert_eq!(outcome.actual_value, json!(42));

        let resp = response(200, json!({"data": {}}));
        let outcome = eval(&resp, rule("body", Some("$.data.id"), "eq", RuleValue::Integer(42)));
        assert!(!outcome.passed);
        assert_eq!(outcome.actual_value, Value::Null);
        assert_eq!(outcome.error, None);

        let outcome = eval(&resp, rule("body", Some("$.data.id"), "eq", RuleValue::Null));
        assert!(outcome.passed);
    }

    #[test]
    fn body_expression_without_dollar_is_null() {
        let resp = response(200, json!({"data": {"id": 42}}));
        let outcome = eval(&resp, rule("body", Some("data.id"), "eq", RuleValue::Integer(42)));
        assert_eq!(outcome.actual_value, Value::Null);
        assert_eq!(outcome.error, None);
        assert!(!outcome.passed);
    }

    #[test]
    fn raw_text_body_is_searchable() {
        let mut resp = response(200, json!(null));
        resp.body = Some(ResponseBody::Text("<h1>welcome</h1>".into()));
        let outcome = eval(&resp, rule("body", Some("$"), "contains", RuleValue::String("welcome".into())));
        assert!(outcome.passed);
    }

    #[test]
    fn unavailable_extractor_fails_only_body_rules() {
        let evaluator = AssertionEvaluator::new(Arc::new(UnavailableExtractor));
        let resp = response(200, json!({"data": {"id": 42}}));
        let outcomes = evaluator.evaluate(
            &resp,
            &[
                rule("body", Some("$.data.id"), "eq", RuleValue::Integer(42)),
                rule("status_code", None, "eq", RuleValue::Integer(200)),
            ],
        );
        assert!(!outcomes[0].passed);
        assert_eq!(outcomes[0].error.as_deref(), Some("JSONPath support is not available"));
        assert_eq!(outcomes[0].actual_value, Value::Null);
        assert!(outcomes[1].passed);
    }

    struct PanickingExtractor;

    impl PathExtractor for PanickingExtractor {
        fn first_match(&self, _: &Value, _: &str) -> Result<Option<Value>, EngineError> {
            panic!("extractor exploded");
        }
    }

    #[test]
    fn panicking_extractor_is_rule_error() {
        let evaluator = AssertionEvaluator::new(Arc::new(PanickingExtractor));
        let resp = response(200, json!({}));
        let outcome = evaluator.evaluate_rule(&resp, &rule("body", Some("$.a"), "eq", RuleValue::Null));
        assert!(!outcome.passed);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn unknown_operator_does_not_stop_batch() {
        let resp = response(200, json!({}));
        let outcomes = AssertionEvaluator::default().evaluate(
            &resp,
            &[
                rule("status_code", None, "neq", RuleValue::Integer(404)),
                rule("status_code", None, "eq", RuleValue::Integer(200)),
            ],
        );
        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].passed);
        assert_eq!(outcomes[0].error.as_deref(), Some("Unknown operator: neq"));
        assert!(outcomes[1].passed);
        assert_eq!(outcomes[1].error, None);
        assert!(!all_passed(&outcomes));
    }

    #[test]
    fn unknown_source_extracts_null() {
        let resp = response(200, json!({}));
        let outcome = eval(&resp, rule("cookie", Some("session"), "eq", RuleValue::Null));
        assert_eq!(outcome.actual_value, Value::Null);
        assert!(outcome.passed);
    }

    #[test]
    fn empty_rules_pass() {
        let resp = response(500, json!({}));
        let outcomes = AssertionEvaluator::default().evaluate(&resp, &[]);
        assert!(outcomes.is_empty());
        assert!(all_passed(&outcomes));
    }

    #[test]
    fn transport_failure_status_is_zero() {
        let resp = ResponseResult::transport_error("connection refused", std::time::Duration::ZERO);
        let outcome = eval(&resp, rule("status_code", None, "eq", RuleValue::Integer(200)));
        assert!(!outcome.passed);
        assert_eq!(outcome.actual_value, json!(0));
    }
}
