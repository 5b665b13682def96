use crate::config::EngineConfig;
use crate::domain::{RequestBody, RequestSpec, ResponseBody, ResponseResult};
use crate::error::EngineError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Sends resolved requests and captures what came back.
///
/// Every call yields a `ResponseResult`; transport failures, timeouts and
/// cancellation come back as `status_code == 0` with `error` set. The
/// underlying client is a connection pool and carries no per-run state.
#[derive(Debug, Clone)]
pub struct Executor {
    client: Client,
    default_timeout: Duration,
}

impl Executor {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            default_timeout: config.default_timeout(),
        })
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub async fn execute(&self, spec: &RequestSpec) -> ResponseResult {
        let started = Instant::now();
        let outcome = self.send(spec, started).await;
        finish(spec, outcome, started)
    }

    /// Like [`Executor::execute`], but gives up as soon as `cancel_rx` fires.
    pub async fn execute_cancellable(
        &self,
        spec: &RequestSpec,
        cancel_rx: &mut broadcast::Receiver<()>,
    ) -> ResponseResult {
        let started = Instant::now();
        let outcome = tokio::select! {
            result = self.send(spec, started) => result,
            Ok(()) = cancel_rx.recv() => Err(EngineError::Cancelled),
        };
        finish(spec, outcome, started)
    }

    async fn send(&self, spec: &RequestSpec, started: Instant) -> Result<ResponseResult, EngineError> {
        let method = parse_method(&spec.method)?;
        let url = Url::parse(&spec.url)
            .map_err(|err| EngineError::InvalidRequest(format!("Invalid URL `{}`: {err}", spec.url)))?;
        let headers = header_map(&spec.headers)?;

        let timeout = if spec.timeout.is_zero() {
            self.default_timeout
        } else {
            spec.timeout
        };

        let mut request = self
            .client
            .request(method, url)
            .headers(headers)
            .timeout(timeout);

        if !spec.query.is_empty() {
            request = request.query(&spec.query);
        }

        request = match &spec.body {
            RequestBody::None => request,
            RequestBody::Json(value) => request.json(value),
            RequestBody::Form(fields) => request.form(fields),
            RequestBody::Raw(text) => request.body(text.clone()),
        };

        tracing::debug!(method = %spec.method, url = %spec.url, "sending request");

        let response = request.send().await?;
        let status_code = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let text = response.text().await?;
        let duration = started.elapsed().as_secs_f64();

        Ok(ResponseResult {
            status_code,
            headers,
            body: Some(ResponseBody::from_text(text)),
            duration,
            error: None,
        })
    }
}

fn finish(
    spec: &RequestSpec,
    outcome: Result<ResponseResult, EngineError>,
    started: Instant,
) -> ResponseResult {
    match outcome {
        Ok(result) => {
            tracing::debug!(
                method = %spec.method,
                url = %spec.url,
                status = result.status_code,
                duration = result.duration,
                "request completed"
            );
            result
        }
        Err(err) => {
            let message = err.describe();
            tracing::warn!(method = %spec.method, url = %spec.url, error = %message, "request failed");
            ResponseResult::transport_error(message, started.elapsed())
        }
    }
}

/// Methods are case-insensitive on input and always go out uppercase.
fn parse_method(raw: &str) -> Result<Method, EngineError> {
    Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes())
        .map_err(|err| EngineError::InvalidRequest(format!("Invalid HTTP method `{raw}`: {err}")))
}

/// Empty names were already dropped while merging layers, so any name that
/// reaches this point must be a valid token.
fn header_map(input: &HashMap<String, String>) -> Result<HeaderMap, EngineError> {
    input
        .iter()
        .map(|(key, value)| {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| {
                EngineError::InvalidRequest(format!("Invalid header name `{key}`: {err}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|err| {
                EngineError::InvalidRequest(format!("Invalid header value for `{key}`: {err}"))
            })?;
            Ok((name, value))
        })
        .collect()
}

/// Flatten response headers; repeated names are joined with `", "`.
fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut collected: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}
