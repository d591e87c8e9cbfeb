use std::sync::Arc;

use crate::error::Error;
use crate::server::AppState;
use crate::types::User;

#[derive(Debug, PartialEq, Eq)]
pub enum TokenValidationError {
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    IdentityNotFound,
    UnknownRole,
    InternalError,
}

/// Extracts the token from a `Bearer` Authorization header.
/// Returns None if no header is present.
pub fn extract_token_from_header(
    auth_header: Option<&str>,
) -> Result<Option<&str>, TokenValidationError> {
    match auth_header {
        Some(header) => header
            .strip_prefix("Bearer ")
            .map(|token| Some(token.trim()))
            .ok_or(TokenValidationError::InvalidScheme),
        None => Ok(None),
    }
}

/// Decodes a session token and loads the identity it names.
/// The returned user carries the stored role, not the one embedded in the token.
pub fn validate_session(
    state: &Arc<AppState>,
    raw_token: &str,
) -> Result<User, TokenValidationError> {
    let claims = state.sessions.decode(raw_token).map_err(|e| match e {
        Error::TokenExpired => TokenValidationError::TokenExpired,
        _ => TokenValidationError::InvalidToken,
    })?;

    state
        .store
        .get_user(&claims.user_id)
        .map_err(|e| match e {
            Error::UnknownRole(_) => TokenValidationError::UnknownRole,
            _ => TokenValidationError::InternalError,
        })?
        .ok_or(TokenValidationError::IdentityNotFound)
}
