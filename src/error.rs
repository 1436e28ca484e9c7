use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use time::OffsetDateTime;

/// Domain error type; every variant maps to one wire status and error code.
///
/// Ownership failures on marker mutations deliberately collapse "does not
/// exist" and "not yours" into one variant so callers cannot probe for the
/// existence of other users' markers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Email not found")]
    UnknownEmail,

    #[error("Password does not match")]
    BadCredentials,

    #[error("Refresh token is missing")]
    MissingRefreshToken,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("User for refresh token no longer exists")]
    RefreshUserGone,

    #[error("Email already in use")]
    EmailTaken,

    #[error("Phone number already in use")]
    PhoneTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Email not found")]
    EmailNotFound,

    #[error("Marker not found")]
    MarkerNotFound,

    #[error("Marker not found or no permission")]
    MarkerNotFoundOrForbidden,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthenticationRequired
            | ApiError::UnknownEmail
            | ApiError::BadCredentials
            | ApiError::MissingRefreshToken
            | ApiError::InvalidRefreshToken
            | ApiError::RefreshUserGone => StatusCode::UNAUTHORIZED,
            ApiError::MarkerNotFoundOrForbidden => StatusCode::FORBIDDEN,
            ApiError::UserNotFound | ApiError::EmailNotFound | ApiError::MarkerNotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::EmailTaken | ApiError::PhoneTaken => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            ApiError::UnknownEmail | ApiError::BadCredentials => "LOGIN_FAILED",
            ApiError::MissingRefreshToken => "NO_REFRESH_TOKEN",
            ApiError::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            ApiError::RefreshUserGone | ApiError::UserNotFound => "USER_NOT_FOUND",
            ApiError::EmailTaken => "EMAIL_ALREADY_EXISTS",
            ApiError::PhoneTaken => "PHONE_ALREADY_EXISTS",
            ApiError::EmailNotFound => "EMAIL_NOT_FOUND",
            ApiError::MarkerNotFound => "MARKER_NOT_FOUND",
            ApiError::MarkerNotFoundOrForbidden => "MARKER_NOT_FOUND_OR_FORBIDDEN",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Error envelope: `{"success":false,"message":...,"error":CODE,"timestamp":...}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    error: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            // Never leak internal detail to the caller.
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            success: false,
            message,
            error: self.code(),
            timestamp: OffsetDateTime::now_utc(),
        };

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::AuthenticationRequired.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::MarkerNotFoundOrForbidden.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::MarkerNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::EmailTaken.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn login_failures_share_a_code() {
        // Wire code does not reveal whether the email or the password was wrong.
        assert_eq!(ApiError::UnknownEmail.code(), "LOGIN_FAILED");
        assert_eq!(ApiError::BadCredentials.code(), "LOGIN_FAILED");
    }

    #[test]
    fn internal_message_is_generic() {
        let response = ApiError::Internal(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
