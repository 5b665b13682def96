use std::time::Instant;
use tokio::sync::broadcast;

use crate::collections::Collection;
use crate::config::EngineConfig;
use crate::domain::{
    all_passed, ApiTemplate, DebugRequest, Environment, ResponseResult, RunSummary, TestCase,
    TestRunReport,
};
use crate::error::EngineError;

use super::assertions::AssertionEvaluator;
use super::cancel::CancelRegistry;
use super::http::Executor;
use super::resolve::{resolve_api, resolve_debug, resolve_test_case};

/// Resolve, execute, evaluate: one pipeline per test case.
#[derive(Clone)]
pub struct Runner {
    executor: Executor,
    evaluator: AssertionEvaluator,
}

impl Runner {
    pub fn new(executor: Executor, evaluator: AssertionEvaluator) -> Self {
        Self { executor, evaluator }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        Ok(Self::new(Executor::new(config)?, AssertionEvaluator::default()))
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub async fn run_test_case(
        &self,
        environment: Option<&Environment>,
        template: Option<&ApiTemplate>,
        case: &TestCase,
    ) -> TestRunReport {
        self.run_case_inner(environment, template, case, None).await
    }

    /// Run a test case that can be aborted through `cancel_rx`; a cancelled
    /// run reports a status 0 response and fails its assertions.
    pub async fn run_test_case_cancellable(
        &self,
        environment: Option<&Environment>,
        template: Option<&ApiTemplate>,
        case: &TestCase,
        cancel_rx: &mut broadcast::Receiver<()>,
    ) -> TestRunReport {
        self.run_case_inner(environment, template, case, Some(cancel_rx)).await
    }

    /// Run a test case under `run_id` in `registry`, so that
    /// `registry.cancel(run_id)` aborts it. The entry is removed once the run ends.
    pub async fn run_registered(
        &self,
        registry: &CancelRegistry,
        run_id: &str,
        environment: Option<&Environment>,
        template: Option<&ApiTemplate>,
        case: &TestCase,
    ) -> TestRunReport {
        let mut cancel_rx = registry.register(run_id);
        let report = self
            .run_case_inner(environment, template, case, Some(&mut cancel_rx))
            .await;
        registry.remove(run_id);
        report
    }

    async fn run_case_inner(
        &self,
        environment: Option<&Environment>,
        template: Option<&ApiTemplate>,
        case: &TestCase,
        cancel_rx: Option<&mut broadcast::Receiver<()>>,
    ) -> TestRunReport {
        let spec = resolve_test_case(environment, template, case, self.executor.default_timeout());
        let result = match cancel_rx {
            Some(rx) => self.executor.execute_cancellable(&spec, rx).await,
            None => self.executor.execute(&spec).await,
        };

        let assertions = if case.assertions.is_empty() {
            Vec::new()
        } else {
            self.evaluator.evaluate(&result, &case.assertions)
        };
        let passed = all_passed(&assertions);

        tracing::info!(
            case = %case.name,
            status = result.status_code,
            rules = assertions.len(),
            passed,
            "test case finished"
        );

        TestRunReport {
            name: case.name.clone(),
            result,
            assertions,
            passed,
        }
    }

    /// Send an ad-hoc request without assertions.
    pub async fn debug_run(
        &self,
        environment: Option<&Environment>,
        request: &DebugRequest,
    ) -> ResponseResult {
        let spec = resolve_debug(environment, request, self.executor.default_timeout());
        self.executor.execute(&spec).await
    }

    /// Send an API template's request as-is.
    pub async fn run_api(
        &self,
        environment: Option<&Environment>,
        template: &ApiTemplate,
    ) -> ResponseResult {
        let spec = resolve_api(environment, template, self.executor.default_timeout());
        self.executor.execute(&spec).await
    }

    /// Run the selected cases of a collection one after another.
    pub async fn run_collection(
        &self,
        collection: &Collection,
        environment: Option<&Environment>,
        case_names: &[String],
    ) -> RunSummary {
        let started = Instant::now();
        let mut reports = Vec::new();

        for case in collection.select_cases(case_names) {
            let template = collection.template_for(case);
            reports.push(self.run_test_case(environment, template, case).await);
        }

        let summary = RunSummary::new(
            collection.name.clone(),
            reports,
            started.elapsed().as_secs_f64(),
        );
        tracing::info!(
            collection = %summary.name,
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            "collection finished"
        );
        summary
    }
}
