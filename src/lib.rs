//! Request execution and assertion evaluation for API test cases.
//!
//! A run resolves a test case against its environment and API template
//! ([`engine::resolve`]), sends it ([`engine::http::Executor`]) and checks the
//! response against the case's rules ([`engine::assertions::AssertionEvaluator`]).
//! Transport failures and rule failures are reported as data, never as errors.

pub mod cli;
pub mod collections;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod logging;

pub use config::EngineConfig;
pub use domain::*;
pub use engine::assertions::AssertionEvaluator;
pub use engine::extract::{JsonPathExtractor, PathExtractor};
pub use engine::http::Executor;
pub use engine::runner::Runner;
pub use error::EngineError;
