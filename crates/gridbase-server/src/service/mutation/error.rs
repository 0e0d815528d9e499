//! Typed failures produced by the mutation service.

use std::borrow::Cow;

use gridbase_postgres::PgError;

/// Result alias for mutation operations.
pub type MutationResult<T, E = MutationError> = Result<T, E>;

/// The typed failure set of every mutation operation.
///
/// Handlers translate these into the stable-code envelope; internal callers
/// (the automation engine) match on them to classify runs.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// The caller could not be identified.
    #[error("caller is not authenticated")]
    Unauthorized,

    /// The caller's role does not permit the operation.
    #[error("operation not permitted for the caller's role")]
    Forbidden,

    /// The addressed entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The payload failed domain validation.
    #[error("invalid input: {0}")]
    InvalidInput(InvalidInput),

    /// The operation conflicts with current state.
    #[error("conflict: {0}")]
    Conflict(Cow<'static, str>),

    /// An unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

/// Domain-validation failures, each mapping onto one stable error code.
#[derive(Debug, thiserror::Error)]
pub enum InvalidInput {
    #[error("a non-empty name is required")]
    NameRequired,
    #[error("an email address is required")]
    EmailRequired,
    #[error("password is shorter than the minimum length")]
    PasswordTooShort,
    #[error("unsupported field type or mismatched value: {0}")]
    InvalidFieldType(String),
    #[error("unrecognised row colour: {0}")]
    InvalidColor(String),
    #[error("unrecognised collaborator role: {0}")]
    InvalidRole(String),
    #[error("token is not valid")]
    InvalidToken,
    #[error("token has expired")]
    ExpiredToken,
    #[error("token has already been used")]
    UsedToken,
    #[error("form is not accepting submissions")]
    FormInactive,
    #[error("at least one record is required")]
    RecordsRequired,
    #[error("a file upload is required")]
    FileRequired,
    #[error("{0}")]
    Invalid(String),
}

impl MutationError {
    /// Shorthand for a generic invalid-input failure.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(InvalidInput::Invalid(message.into()))
    }

    /// Shorthand for an internal failure from any boxed source.
    pub fn internal(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Internal(Box::new(source))
    }
}

impl From<InvalidInput> for MutationError {
    fn from(input: InvalidInput) -> Self {
        Self::InvalidInput(input)
    }
}

impl From<PgError> for MutationError {
    fn from(err: PgError) -> Self {
        if err.constraint_violation().is_some() || err.is_unique_violation() {
            return Self::Conflict(err.to_string().into());
        }

        Self::Internal(Box::new(err))
    }
}

impl From<diesel::result::Error> for MutationError {
    fn from(err: diesel::result::Error) -> Self {
        Self::from(PgError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_conversion() {
        let err = MutationError::from(InvalidInput::NameRequired);
        assert!(matches!(
            err,
            MutationError::InvalidInput(InvalidInput::NameRequired)
        ));
    }

    #[test]
    fn unique_violations_become_conflicts() {
        let pg_err = PgError::Query(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_string()),
        ));
        assert!(matches!(
            MutationError::from(pg_err),
            MutationError::Conflict(_)
        ));
    }
}
