//! Pass/fail judgments over a [`Response`].
//!
//! Every failure quotes the submitted query text and the first server error.

use crate::error::{AssertionFailure, ErrorBuilder};
use crate::graphql::{lookup_path, Response};
use serde_json::Value;

pub type AssertionOutcome = Result<(), AssertionFailure>;

/// The value mutation results carry in `code` on success
pub const SUCCESS_CODE: &str = "SUCCESS";

fn fail(operation: &str, response: &Response, reason: impl Into<String>) -> AssertionFailure {
    ErrorBuilder::assertion(operation)
        .reason(reason)
        .response(response)
        .build()
}

/// Expects the operation to have been rejected.
///
/// With `expect_http_200` the server must answer 2xx with `errors` and no
/// value for the operation; otherwise it must answer non-2xx with `errors`
/// and no `data` at all. Which contract applies is the caller's call.
pub fn confirm_error(response: &Response, operation: &str, expect_http_200: bool) -> AssertionOutcome {
    if expect_http_200 {
        if !response.ok_status_code() {
            return Err(fail(
                operation,
                response,
                format!("expected a 2xx status, got {}", response.http_status()),
            ));
        }
        if !response.has_errors() {
            return Err(fail(operation, response, "expected errors to be present"));
        }
        if response.field(operation).is_some() {
            return Err(fail(
                operation,
                response,
                format!("expected data.{operation} to be absent or null"),
            ));
        }
    } else {
        if response.ok_status_code() {
            return Err(fail(
                operation,
                response,
                format!("expected a non-2xx status, got {}", response.http_status()),
            ));
        }
        if !response.has_errors() {
            return Err(fail(operation, response, "expected errors to be present"));
        }
        if response.data().is_some() {
            return Err(fail(operation, response, "expected data to be absent"));
        }
    }
    Ok(())
}

/// Expects a clean 2xx response whose `data[operation]` carries every field
/// in `expected_fields` (dotted paths reach nested objects).
pub fn confirm_success<S: AsRef<str>>(
    response: &Response,
    operation: &str,
    expected_fields: &[S],
) -> AssertionOutcome {
    success_payload(response, operation, expected_fields).map(|_| ())
}

/// As [`confirm_success`], returning the operation's payload for further checks
pub fn success_payload<'a, S: AsRef<str>>(
    response: &'a Response,
    operation: &str,
    expected_fields: &[S],
) -> Result<&'a Value, AssertionFailure> {
    if !response.ok_status_code() {
        return Err(fail(
            operation,
            response,
            format!("expected a 2xx status, got {}", response.http_status()),
        ));
    }
    if response.has_errors() {
        return Err(fail(operation, response, "expected errors to be absent"));
    }
    let Some(payload) = response.field(operation) else {
        return Err(fail(
            operation,
            response,
            format!("expected data.{operation} to be present"),
        ));
    };

    let missing: Vec<&str> = expected_fields
        .iter()
        .map(AsRef::as_ref)
        .filter(|field| lookup_path(payload, field).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(fail(
            operation,
            response,
            format!("missing or null fields: {}", missing.join(", ")),
        ));
    }
    Ok(payload)
}

/// Expects `data[operation].code` to equal `sentinel` with no populated
/// `error` alongside it.
pub fn confirm_code(response: &Response, operation: &str, sentinel: &str) -> AssertionOutcome {
    let payload = success_payload(response, operation, &["code"])?;
    let code = payload.get("code").and_then(Value::as_str);
    if code != Some(sentinel) {
        return Err(fail(
            operation,
            response,
            format!(
                "expected code {sentinel}, got {}",
                payload.get("code").map(Value::to_string).unwrap_or_default()
            ),
        ));
    }
    if let Some(error) = payload.get("error").filter(|e| is_populated(e)) {
        return Err(fail(operation, response, format!("expected no error, got {error}")));
    }
    Ok(())
}

/// Expects `data[operation]` at `path` to equal `expected`
pub fn confirm_field_eq(
    response: &Response,
    operation: &str,
    path: &str,
    expected: &Value,
) -> AssertionOutcome {
    let payload = success_payload(response, operation, &[path])?;
    match lookup_path(payload, path) {
        Some(actual) if actual == expected => Ok(()),
        actual => Err(fail(
            operation,
            response,
            format!(
                "expected {path} to be {expected}, got {}",
                actual.map(Value::to_string).unwrap_or_else(|| "null".to_string())
            ),
        )),
    }
}

fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => map.values().any(is_populated),
        _ => true,
    }
}
