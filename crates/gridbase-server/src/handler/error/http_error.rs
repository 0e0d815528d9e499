//! HTTP error handling with builder pattern for dynamic error responses.

use std::borrow::Cow;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::handler::response::ErrorResponse;

/// The error type for HTTP handlers in the server.
///
/// Carries a stable [`ErrorKind`], an optional custom client-facing
/// message, and optional internal context that is logged but never
/// serialized to the client.
#[derive(Clone)]
#[must_use = "errors do nothing unless serialized"]
pub struct Error<'a> {
    kind: ErrorKind,
    message: Option<Cow<'a, str>>,
    context: Option<Cow<'a, str>>,
}

impl Error<'static> {
    /// Creates a new [`Error`] with the specified kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            context: None,
        }
    }
}

impl<'a> Error<'a> {
    /// Sets a custom user-facing message for the error.
    #[inline]
    pub fn with_message(self, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            message: Some(message.into()),
            ..self
        }
    }

    /// Attaches internal context used for logging only.
    #[inline]
    pub fn with_context(self, context: impl Into<Cow<'a, str>>) -> Self {
        Self {
            context: Some(context.into()),
            ..self
        }
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the custom message if present.
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the internal context if present.
    #[inline]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Converts this error into a static version by cloning borrowed data.
    pub fn into_static(self) -> Error<'static> {
        Error {
            kind: self.kind,
            message: self.message.map(|m| Cow::Owned(m.into_owned())),
            context: self.context.map(|c| Cow::Owned(c.into_owned())),
        }
    }
}

impl Default for Error<'static> {
    #[inline]
    fn default() -> Self {
        Self::new(ErrorKind::default())
    }
}

impl fmt::Debug for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug_struct = f.debug_struct("Error");
        debug_struct
            .field("kind", &self.kind)
            .field("code", &self.kind.code())
            .field("status", &self.kind.status_code());

        if let Some(ref message) = self.message {
            debug_struct.field("message", message);
        }

        if let Some(ref context) = self.context {
            debug_struct.field("context", context);
        }

        debug_struct.finish()
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.kind.response();
        let message = self.message.as_deref().unwrap_or(&response.message);

        write!(f, "{} ({}): {}", response.error, response.status, message)?;

        if let Some(ref context) = self.context {
            write!(f, " - {}", context)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error<'_> {}

impl IntoResponse for Error<'_> {
    fn into_response(self) -> Response {
        if let Some(context) = self.context {
            tracing::debug!(
                code = %self.kind.code(),
                context = %context,
                "request failed"
            );
        }

        let mut response = self.kind.response();
        if let Some(message) = self.message {
            response = response.with_message(message.into_owned());
        }

        response.into_response()
    }
}

impl From<ErrorKind> for Error<'static> {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl aide::OperationOutput for Error<'_> {
    type Inner = ErrorResponse<'static>;
}

/// A specialized [`Result`] type for HTTP operations.
///
/// [`Result`]: std::result::Result
pub type Result<T, E = Error<'static>> = std::result::Result<T, E>;

/// Enumeration of all stable error codes the API can return.
///
/// Each variant corresponds to one stable code in the error envelope and a
/// fixed HTTP status. Clients key their behaviour off the code, never the
/// message, so codes are append-only.
#[must_use = "error kinds do nothing unless used to create errors"]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // 401 Unauthorized
    /// Missing or invalid authentication credentials.
    Unauthorized,
    /// A login attempt with a wrong email/password combination.
    InvalidCredentials,
    /// A public-token route was called without a token.
    TokenRequired,

    // 403 Forbidden
    /// The caller's role does not allow the operation.
    Forbidden,

    // 404 Not Found
    /// The addressed resource does not exist or is not visible.
    NotFound,

    // 409 Conflict
    /// The request conflicts with current state (e.g. owner role change).
    Conflict,

    // 400 Bad Request
    /// A path or body identifier failed to parse.
    InvalidId,
    /// The request body is malformed or fails validation.
    InvalidRequest,
    /// A required name was empty.
    NameRequired,
    /// The field type is not in the supported set, or the value does not
    /// fit the field's type.
    InvalidFieldType,
    /// The row colour is not a recognised colour tag.
    InvalidColor,
    /// The collaborator role is not in the supported set.
    InvalidRole,
    /// A public or reset token failed to resolve.
    InvalidToken,
    /// The reset token has expired.
    ExpiredToken,
    /// The reset token was already used.
    UsedToken,
    /// The password is shorter than the minimum length.
    PasswordTooShort,
    /// A required email address was missing.
    EmailRequired,
    /// A file upload was expected but absent.
    FileRequired,
    /// A bulk operation was invoked with no records.
    RecordsRequired,
    /// The form is not accepting submissions.
    FormInactive,

    // 500 Internal Server Error
    /// Unexpected server error.
    #[default]
    InternalServerError,
}

impl ErrorKind {
    /// Converts this error kind into a full [`Error`].
    #[inline]
    pub fn into_error(self) -> Error<'static> {
        Error::new(self)
    }

    /// Creates an [`Error`] with the specified message.
    #[inline]
    pub fn with_message<'a>(self, message: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_message(message)
    }

    /// Creates an [`Error`] with the specified internal context.
    #[inline]
    pub fn with_context<'a>(self, context: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_context(context)
    }

    /// Returns the stable code serialized into the envelope.
    #[inline]
    pub fn code(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidCredentials => "invalid_credentials",
            Self::TokenRequired => "token_required",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvalidId => "invalid_id",
            Self::InvalidRequest => "invalid_request",
            Self::NameRequired => "name_required",
            Self::InvalidFieldType => "invalid_field_type",
            Self::InvalidColor => "invalid_color",
            Self::InvalidRole => "invalid_role",
            Self::InvalidToken => "invalid_token",
            Self::ExpiredToken => "expired_token",
            Self::UsedToken => "used_token",
            Self::PasswordTooShort => "password_too_short",
            Self::EmailRequired => "email_required",
            Self::FileRequired => "file_required",
            Self::RecordsRequired => "records_required",
            Self::FormInactive => "form_inactive",
            Self::InternalServerError => "server_error",
        }
    }

    /// Returns the HTTP status code for this error kind.
    #[inline]
    pub fn status_code(self) -> StatusCode {
        self.response().status
    }

    /// Returns the response template for this error kind.
    #[inline]
    pub fn response(self) -> ErrorResponse<'static> {
        match self {
            Self::Unauthorized => ErrorResponse::UNAUTHORIZED,
            Self::InvalidCredentials => ErrorResponse::INVALID_CREDENTIALS,
            Self::TokenRequired => ErrorResponse::TOKEN_REQUIRED,
            Self::Forbidden => ErrorResponse::FORBIDDEN,
            Self::NotFound => ErrorResponse::NOT_FOUND,
            Self::Conflict => ErrorResponse::CONFLICT,
            Self::InvalidId => ErrorResponse::INVALID_ID,
            Self::InvalidRequest => ErrorResponse::INVALID_REQUEST,
            Self::NameRequired => ErrorResponse::NAME_REQUIRED,
            Self::InvalidFieldType => ErrorResponse::INVALID_FIELD_TYPE,
            Self::InvalidColor => ErrorResponse::INVALID_COLOR,
            Self::InvalidRole => ErrorResponse::INVALID_ROLE,
            Self::InvalidToken => ErrorResponse::INVALID_TOKEN,
            Self::ExpiredToken => ErrorResponse::EXPIRED_TOKEN,
            Self::UsedToken => ErrorResponse::USED_TOKEN,
            Self::PasswordTooShort => ErrorResponse::PASSWORD_TOO_SHORT,
            Self::EmailRequired => ErrorResponse::EMAIL_REQUIRED,
            Self::FileRequired => ErrorResponse::FILE_REQUIRED,
            Self::RecordsRequired => ErrorResponse::RECORDS_REQUIRED,
            Self::FormInactive => ErrorResponse::FORM_INACTIVE,
            Self::InternalServerError => ErrorResponse::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl IntoResponse for ErrorKind {
    #[inline]
    fn into_response(self) -> Response {
        self.response().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_http_error() {
        let error = Error::default();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        let _ = error.into_response();
    }

    #[test]
    fn error_builder_chaining() {
        let error = ErrorKind::NotFound
            .with_message("Record not found")
            .with_context("id 123 missing");

        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.message(), Some("Record not found"));
        assert_eq!(error.context(), Some("id 123 missing"));
    }

    #[test]
    fn display_contains_code_and_status() {
        let error = ErrorKind::Forbidden.with_message("No access");
        let display = format!("{}", error);
        assert!(display.contains("forbidden"));
        assert!(display.contains("403"));
        assert!(display.contains("No access"));
    }

    #[test]
    fn all_error_kinds_have_stable_codes() {
        let kinds = [
            ErrorKind::Unauthorized,
            ErrorKind::InvalidCredentials,
            ErrorKind::TokenRequired,
            ErrorKind::Forbidden,
            ErrorKind::NotFound,
            ErrorKind::Conflict,
            ErrorKind::InvalidId,
            ErrorKind::InvalidRequest,
            ErrorKind::NameRequired,
            ErrorKind::InvalidFieldType,
            ErrorKind::InvalidColor,
            ErrorKind::InvalidRole,
            ErrorKind::InvalidToken,
            ErrorKind::ExpiredToken,
            ErrorKind::UsedToken,
            ErrorKind::PasswordTooShort,
            ErrorKind::EmailRequired,
            ErrorKind::FileRequired,
            ErrorKind::RecordsRequired,
            ErrorKind::FormInactive,
            ErrorKind::InternalServerError,
        ];

        for kind in kinds {
            let response = kind.response();
            assert_eq!(response.error, kind.code());
            assert!(response.status.as_u16() >= 400);
        }
    }

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(ErrorKind::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::NameRequired.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorKind::InternalServerError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
