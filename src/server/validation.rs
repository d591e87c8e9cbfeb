use std::sync::LazyLock;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use regex::Regex;

use crate::server::response::ApiError;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9+_.\-]+@[a-zA-Z0-9\-]+\.[a-zA-Z0-9.\-]+$").expect("valid email regex")
});

/// JSON body extractor whose rejections carry the offending field.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Query string extractor with the same rejection shape as [`JsonBody`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let text = rejection.body_text();
        ApiError::key_error(missing_field(&text), text)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        let text = rejection.body_text();
        ApiError::key_error(missing_field(&text), text)
    }
}

/// Pulls the field name out of a serde "missing field `name`" message.
fn missing_field(message: &str) -> Option<String> {
    let (_, rest) = message.split_once("missing field `")?;
    let (field, _) = rest.split_once('`')?;
    Some(field.to_string())
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(ApiError {
            field: Some("email".to_string()),
            ..ApiError::bad_request("EMAIL_VALIDATION_ERROR", "Email address is not valid")
        })
    }
}
