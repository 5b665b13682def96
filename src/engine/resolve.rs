use crate::domain::{
    ApiTemplate, BodyKind, DebugRequest, Environment, RequestBody, RequestSpec, TestCase,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Join a base URL and a path with exactly one `/` between them.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Merge header layers into a new map.
/// Priority: later layers override earlier ones. Names compare case-insensitively,
/// so `x-env` in a later layer replaces `X-Env` from an earlier one.
pub fn merge_headers<'a, I>(layers: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = &'a HashMap<String, String>>,
{
    let mut headers: HashMap<String, String> = HashMap::new();

    for layer in layers {
        for (key, value) in layer {
            if key.is_empty() {
                continue;
            }
            headers.retain(|existing, _| !existing.eq_ignore_ascii_case(key));
            headers.insert(key.clone(), value.clone());
        }
    }

    headers
}

/// Merge query layers and flatten them into ordered pairs.
/// Scalars are stringified, arrays expand to repeated keys, nulls are dropped.
pub fn merge_query<'a, I>(layers: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    let mut merged = Map::new();
    for layer in layers {
        for (key, value) in layer {
            merged.insert(key.clone(), value.clone());
        }
    }

    flatten_pairs(&merged)
}

/// Flatten a JSON object into urlencoding pairs: arrays become repeated keys,
/// nulls are dropped.
fn flatten_pairs(fields: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in fields {
        match value {
            Value::Array(items) => {
                pairs.extend(items.iter().filter_map(scalar_text).map(|v| (key.clone(), v)));
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    pairs.push((key.clone(), text));
                }
            }
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Falsy bodies (null, "", {}, [], false, 0) are not sent at all.
pub fn has_body(body: &Value) -> bool {
    match body {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Encode a stored body according to its kind.
pub fn build_body(body: &Value, kind: BodyKind) -> RequestBody {
    if !has_body(body) {
        return RequestBody::None;
    }

    match kind {
        BodyKind::Json => RequestBody::Json(body.clone()),
        BodyKind::Form => match body {
            Value::Object(fields) => RequestBody::Form(flatten_pairs(fields)),
            other => RequestBody::Raw(raw_text(other)),
        },
        BodyKind::Raw => RequestBody::Raw(raw_text(body)),
    }
}

fn raw_text(body: &Value) -> String {
    match body {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn resolve_url(environment: Option<&Environment>, path: &str) -> String {
    match environment {
        Some(env) => join_url(&env.base_url, path),
        None => path.to_string(),
    }
}

fn env_headers(environment: Option<&Environment>) -> Option<&HashMap<String, String>> {
    environment.map(|env| &env.headers)
}

/// Build the request for a test case.
///
/// Layers, lowest priority first: environment, API template, test case. The
/// case's method and URL fall back to the template's when left blank; its body
/// replaces the template's body only when non-empty.
pub fn resolve_test_case(
    environment: Option<&Environment>,
    template: Option<&ApiTemplate>,
    case: &TestCase,
    timeout: Duration,
) -> RequestSpec {
    let method = match template {
        Some(api) if case.method.trim().is_empty() => api.method.clone(),
        _ => case.method.clone(),
    };
    let path = match template {
        Some(api) if case.url.trim().is_empty() => api.url_path.as_str(),
        _ => case.url.as_str(),
    };

    let headers = merge_headers(
        env_headers(environment)
            .into_iter()
            .chain(template.map(|api| &api.headers))
            .chain(Some(&case.headers)),
    );
    let query = merge_query(
        template
            .map(|api| &api.query_params)
            .into_iter()
            .chain(Some(&case.params)),
    );

    let body = match template {
        Some(api) if !has_body(&case.body) => build_body(&api.body, api.body_type),
        _ => build_body(&case.body, case.body_type),
    };

    RequestSpec {
        method,
        url: resolve_url(environment, path),
        query,
        headers,
        body,
        timeout,
    }
}

/// Build the request for an API template run on its own.
pub fn resolve_api(
    environment: Option<&Environment>,
    template: &ApiTemplate,
    timeout: Duration,
) -> RequestSpec {
    RequestSpec {
        method: template.method.clone(),
        url: resolve_url(environment, &template.url_path),
        query: merge_query([&template.query_params]),
        headers: merge_headers(env_headers(environment).into_iter().chain(Some(&template.headers))),
        body: build_body(&template.body, template.body_type),
        timeout,
    }
}

/// Build an ad-hoc debug request. The URL is only joined when an environment is given.
pub fn resolve_debug(
    environment: Option<&Environment>,
    request: &DebugRequest,
    timeout: Duration,
) -> RequestSpec {
    RequestSpec {
        method: request.method.clone(),
        url: resolve_url(environment, &request.url),
        query: merge_query([&request.params]),
        headers: merge_headers(env_headers(environment).into_iter().chain(Some(&request.headers))),
        body: build_body(&request.body, request.body_type),
        timeout,
    }
}
