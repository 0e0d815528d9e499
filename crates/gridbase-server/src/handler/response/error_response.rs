//! The stable-code error envelope returned by every failing endpoint.

use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use schemars::JsonSchema;
use serde::Serialize;

/// HTTP error response envelope.
///
/// Serializes as `{"error": <stable_code>, "message": <human_string>}`.
/// The status code travels out-of-band on the HTTP response.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ErrorResponse<'a> {
    /// Stable machine-readable error code.
    pub error: Cow<'a, str>,
    /// User-friendly error message safe for client display.
    pub message: Cow<'a, str>,
    /// HTTP status code (not serialized in JSON).
    #[serde(skip)]
    #[schemars(skip)]
    pub status: StatusCode,
}

impl<'a> ErrorResponse<'a> {
    // 401 Unauthorized
    pub const UNAUTHORIZED: Self = Self::new(
        "unauthorized",
        "Authentication is required to access this resource",
        StatusCode::UNAUTHORIZED,
    );
    pub const INVALID_CREDENTIALS: Self = Self::new(
        "invalid_credentials",
        "The email or password is incorrect",
        StatusCode::UNAUTHORIZED,
    );
    pub const TOKEN_REQUIRED: Self = Self::new(
        "token_required",
        "A token is required to access this resource",
        StatusCode::UNAUTHORIZED,
    );

    // 403 Forbidden
    pub const FORBIDDEN: Self = Self::new(
        "forbidden",
        "You don't have permission to perform this operation",
        StatusCode::FORBIDDEN,
    );

    // 404 Not Found
    pub const NOT_FOUND: Self = Self::new(
        "not_found",
        "The requested resource was not found",
        StatusCode::NOT_FOUND,
    );

    // 409 Conflict
    pub const CONFLICT: Self = Self::new(
        "conflict",
        "The request conflicts with the current state of the resource",
        StatusCode::CONFLICT,
    );

    // 400 Bad Request
    pub const INVALID_ID: Self = Self::new(
        "invalid_id",
        "The identifier is not a valid UUID",
        StatusCode::BAD_REQUEST,
    );
    pub const INVALID_REQUEST: Self = Self::new(
        "invalid_request",
        "The request could not be processed due to invalid data",
        StatusCode::BAD_REQUEST,
    );
    pub const NAME_REQUIRED: Self = Self::new(
        "name_required",
        "A non-empty name is required",
        StatusCode::BAD_REQUEST,
    );
    pub const INVALID_FIELD_TYPE: Self = Self::new(
        "invalid_field_type",
        "The field type is not supported or the value does not match it",
        StatusCode::BAD_REQUEST,
    );
    pub const INVALID_COLOR: Self = Self::new(
        "invalid_color",
        "The row colour is not recognised",
        StatusCode::BAD_REQUEST,
    );
    pub const INVALID_ROLE: Self = Self::new(
        "invalid_role",
        "The collaborator role is not recognised",
        StatusCode::BAD_REQUEST,
    );
    pub const INVALID_TOKEN: Self = Self::new(
        "invalid_token",
        "The token is not valid",
        StatusCode::BAD_REQUEST,
    );
    pub const EXPIRED_TOKEN: Self = Self::new(
        "expired_token",
        "The token has expired",
        StatusCode::BAD_REQUEST,
    );
    pub const USED_TOKEN: Self = Self::new(
        "used_token",
        "The token has already been used",
        StatusCode::BAD_REQUEST,
    );
    pub const PASSWORD_TOO_SHORT: Self = Self::new(
        "password_too_short",
        "The password does not meet the minimum length",
        StatusCode::BAD_REQUEST,
    );
    pub const EMAIL_REQUIRED: Self = Self::new(
        "email_required",
        "An email address is required",
        StatusCode::BAD_REQUEST,
    );
    pub const FILE_REQUIRED: Self = Self::new(
        "file_required",
        "A file upload is required",
        StatusCode::BAD_REQUEST,
    );
    pub const RECORDS_REQUIRED: Self = Self::new(
        "records_required",
        "At least one record is required",
        StatusCode::BAD_REQUEST,
    );
    pub const FORM_INACTIVE: Self = Self::new(
        "form_inactive",
        "This form is not accepting submissions",
        StatusCode::BAD_REQUEST,
    );

    // 500 Internal Server Error
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "server_error",
        "An internal server error occurred. Please try again later",
        StatusCode::INTERNAL_SERVER_ERROR,
    );

    /// Creates a new error response.
    #[inline]
    pub const fn new(error: &'a str, message: &'a str, status: StatusCode) -> Self {
        Self {
            error: Cow::Borrowed(error),
            message: Cow::Borrowed(message),
            status,
        }
    }

    /// Replaces the human-readable message.
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        self.message = message.into();
        self
    }
}

impl Default for ErrorResponse<'_> {
    #[inline]
    fn default() -> Self {
        Self::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ErrorResponse<'_> {
    #[inline]
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shape() {
        let json = serde_json::to_value(ErrorResponse::FORBIDDEN).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 2);
        assert_eq!(object["error"], "forbidden");
        assert!(object["message"].is_string());
    }

    #[test]
    fn custom_message_keeps_code() {
        let response = ErrorResponse::NOT_FOUND.with_message("No such record");
        assert_eq!(response.error, "not_found");
        assert_eq!(response.message, "No such record");
    }
}
