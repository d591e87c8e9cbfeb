use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::error::{Entity, Error};

/// Success body carrying a payload under `data`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            message: None,
            data: Some(data),
        }
    }

    /// Success carrying a machine-readable note such as `ALREADY_FORKED`.
    #[must_use]
    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

impl ApiResponse<()> {
    #[must_use]
    pub fn message(message: &'static str) -> Self {
        Self {
            message: Some(message),
            data: None,
        }
    }
}

/// Success body whose fields sit at the top level, e.g. `{"isStar": true}`.
#[derive(Debug, Serialize)]
pub struct FlatResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(flatten)]
    pub fields: T,
}

impl<T: Serialize> FlatResponse<T> {
    #[must_use]
    pub fn new(fields: T) -> Self {
        Self {
            message: None,
            fields,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

/// API error that converts to a proper HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub field: Option<String>,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            field: None,
        }
    }

    #[must_use]
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    #[must_use]
    pub fn gone(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::GONE, code, message)
    }

    #[must_use]
    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    /// Missing or malformed request input.
    #[must_use]
    pub fn key_error(field: Option<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            ..Self::bad_request("KEY_ERROR", message)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error = json!({ "code": self.code, "message": self.message });
        if let Some(field) = self.field {
            error["field"] = json!(field);
        }
        let body = json!({ "error": error });
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::Missing(Entity::User) => {
                ApiError::bad_request("USER_DOES_NOT_EXIST", "User does not exist")
            }
            Error::Missing(Entity::Exporter) => {
                ApiError::gone("NO_EXPORTER", "Exporter does not exist")
            }
            Error::Missing(Entity::Bucket) => {
                ApiError::gone("NO_EXPORTER_IN_BUCKET", "Exporter is not in your bucket")
            }
            Error::AlreadyExists => ApiError::conflict("ALREADY_EXISTS", "Already exists"),
            Error::UnknownRole(role) => ApiError::gone(
                "USERTYPE_DOES_NOT_EXIST",
                format!("Stored role '{}' is not recognised", role.0),
            ),
            Error::InvalidStateTransition { from, to } => ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                format!("Cannot move a {from} to {to}"),
            ),
            Error::Remote { op, source } => {
                ApiError::bad_request(op.code(), format!("{op} failed: {source}"))
            }
            Error::InvalidToken | Error::TokenExpired => {
                ApiError::new(StatusCode::UNAUTHORIZED, "INVALID_TOKEN", e.to_string())
            }
            e => {
                error!("Request failed: {e}");
                ApiError::internal("Internal server error")
            }
        }
    }
}
