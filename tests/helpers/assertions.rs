// Assertion helpers for `ServiceResponse`s

use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use serde_json::Value;

/// Assert the response carries the expected status
pub fn assert_status<B>(response: &ServiceResponse<B>, expected: StatusCode) {
    let status = response.status();
    assert_eq!(
        status,
        expected,
        "Expected {} {}, got {} {}",
        expected.as_u16(),
        expected.canonical_reason().unwrap_or("Unknown"),
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    );
}

/// Assert an `AppError` body: `{ "error": { "code", "message" } }`
pub fn assert_error_body(body: &Value, expected: StatusCode, message_fragment: &str) {
    assert_eq!(body["error"]["code"], expected.as_u16());
    let message = body["error"]["message"].as_str().unwrap_or_default();
    assert!(
        message.contains(message_fragment),
        "Expected error message containing {:?}, got {:?}",
        message_fragment,
        message
    );
}
