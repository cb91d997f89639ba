use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started_at.elapsed().as_millis();

    info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = elapsed_ms,
        "request summary"
    );

    if status.is_server_error() {
        warn!(method = %method, path = %path, "request failed with server error");
    }

    response
}

/// Copy of call parameters safe to write to the audit log.
pub fn redact_params(params: Option<&Value>) -> Value {
    params.map(redact_value).unwrap_or(Value::Null)
}

/// Key fragments whose values never reach the audit log. Matched after
/// separators are stripped, so `apiKey`, `api_key` and `api-key` all hit.
const SENSITIVE_KEY_FRAGMENTS: &[&str] = &[
    "authorization",
    "apikey",
    "accesskey",
    "privatekey",
    "token",
    "secret",
    "password",
    "passphrase",
    "credential",
    "cookie",
];

fn redact_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    let item = if is_sensitive_key(key) {
                        Value::String("[REDACTED]".to_string())
                    } else {
                        redact_value(item)
                    };
                    (key.clone(), item)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let normalized: String = key
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | '.' | ' '))
        .flat_map(char::to_lowercase)
        .collect();

    SENSITIVE_KEY_FRAGMENTS
        .iter()
        .any(|fragment| normalized.contains(fragment))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::redact_params;

    #[test]
    fn redacts_sensitive_fields_in_audit_params() {
        let params = json!({
            "name": "echo",
            "arguments": {
                "msg": "hi",
                "token": "should-not-appear",
                "api_key": "should-not-appear",
                "nested": [{ "secret": "should-not-appear" }]
            }
        });

        let redacted = redact_params(Some(&params));

        assert_eq!(redacted["name"], json!("echo"));
        assert_eq!(redacted["arguments"]["msg"], json!("hi"));
        assert_eq!(redacted["arguments"]["token"], json!("[REDACTED]"));
        assert_eq!(redacted["arguments"]["api_key"], json!("[REDACTED]"));
        assert_eq!(redacted["arguments"]["nested"][0]["secret"], json!("[REDACTED]"));
    }

    #[test]
    fn camel_case_tool_arguments_are_redacted() {
        let params = json!({
            "name": "deploy",
            "arguments": {
                "apiKey": "should-not-appear",
                "Private-Key": "should-not-appear",
                "sessionCookie": "should-not-appear",
                "uri": "resource://notes"
            }
        });

        let redacted = redact_params(Some(&params));

        assert_eq!(redacted["arguments"]["apiKey"], json!("[REDACTED]"));
        assert_eq!(redacted["arguments"]["Private-Key"], json!("[REDACTED]"));
        assert_eq!(redacted["arguments"]["sessionCookie"], json!("[REDACTED]"));
        assert_eq!(redacted["arguments"]["uri"], json!("resource://notes"));
    }

    #[test]
    fn missing_params_audit_as_null() {
        assert!(redact_params(None).is_null());
    }
}
