//! # Collections
//!
//! A collection file bundles the environments, API templates and test cases
//! the command-line runner works on. It is plain JSON:
//!
//! ```json
//! {
//!   "name": "users",
//!   "environments": [{ "name": "dev", "base_url": "http://localhost:8000", "headers": {} }],
//!   "apis": [{ "id": 1, "name": "get user", "method": "GET", "url_path": "/users/1" }],
//!   "test_cases": [{ "name": "user exists", "api_id": 1,
//!                    "assertions": [{ "source": "status_code", "operator": "eq", "value": 200 }] }]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{ApiTemplate, Environment, TestCase};
use crate::error::EngineError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub environments: Vec<Environment>,
    #[serde(default)]
    pub apis: Vec<ApiTemplate>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

impl Collection {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let raw = fs::read_to_string(path).map_err(|source| EngineError::File {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Look up an environment by name.
    pub fn environment(&self, name: &str) -> Result<&Environment, EngineError> {
        self.environments
            .iter()
            .find(|env| env.name == name)
            .ok_or_else(|| EngineError::NotFound(format!("environment `{name}`")))
    }

    /// The API template a case points at through `api_id`, if any.
    pub fn template_for(&self, case: &TestCase) -> Option<&ApiTemplate> {
        let api_id = case.api_id?;
        self.apis.iter().find(|api| api.id == Some(api_id))
    }

    /// Cases whose names appear in `names`; every case when `names` is empty.
    pub fn select_cases<'a>(&'a self, names: &'a [String]) -> impl Iterator<Item = &'a TestCase> + 'a {
        self.test_cases
            .iter()
            .filter(move |case| names.is_empty() || names.iter().any(|name| name == &case.name))
    }
}
