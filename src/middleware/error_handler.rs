use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::core::AppError;

/// Largest JSON body accepted by the API
const JSON_LIMIT_BYTES: usize = 64 * 1024;

/// Body deserialization failures become 400s in the standard error shape
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(path = %req.path(), error = %err, "Rejected JSON body");

    let message = match &err {
        JsonPayloadError::ContentType => "Content-Type must be application/json".to_string(),
        JsonPayloadError::Deserialize(e) => format!("Invalid request body: {}", e),
        other => format!("Invalid request body: {}", other),
    };
    AppError::validation(message).into()
}

/// Shared `JsonConfig` for every JSON route
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(json_error_handler)
}
