//! Path extraction over response bodies.
//!
//! Body assertions address values with `$`-rooted JSONPath expressions. The
//! lookup sits behind [`PathExtractor`] so the evaluator does not care which
//! library answers it, and a broken extractor only fails the rules that use it.

use jsonpath_lib::select;
use serde_json::Value;

use crate::error::EngineError;

pub trait PathExtractor: Send + Sync {
    /// Evaluate `expression` against `document` and return the first match.
    fn first_match(&self, document: &Value, expression: &str)
        -> Result<Option<Value>, EngineError>;
}

/// JSONPath extraction backed by `jsonpath_lib`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPathExtractor;

impl PathExtractor for JsonPathExtractor {
    fn first_match(
        &self,
        document: &Value,
        expression: &str,
    ) -> Result<Option<Value>, EngineError> {
        let matches = select(document, expression).map_err(|err| {
            EngineError::Extraction(format!("Invalid JSONPath `{expression}`: {err}"))
        })?;
        Ok(matches.first().map(|value| (*value).clone()))
    }
}

/// Extractor used when path support is switched off; every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableExtractor;

impl PathExtractor for UnavailableExtractor {
    fn first_match(&self, _: &Value, _: &str) -> Result<Option<Value>, EngineError> {
        Err(EngineError::Extraction(
            "JSONPath support is not available".to_string(),
        ))
    }
}
