//! Translation of mutation-service failures into the handler taxonomy.

use crate::service::{InvalidInput, MutationError};

use super::{Error, ErrorKind};

impl From<MutationError> for Error<'static> {
    fn from(err: MutationError) -> Self {
        match err {
            MutationError::Unauthorized => ErrorKind::Unauthorized.into_error(),
            MutationError::Forbidden => ErrorKind::Forbidden.into_error(),
            MutationError::NotFound(resource) => ErrorKind::NotFound
                .with_message(format!("{} not found", capitalize(resource)))
                .into_static(),
            MutationError::InvalidInput(input) => input.into(),
            MutationError::Conflict(reason) => {
                ErrorKind::Conflict.with_context(reason).into_static()
            }
            MutationError::Internal(source) => {
                tracing::error!(error = %source, "mutation failed internally");
                ErrorKind::InternalServerError
                    .with_context(source.to_string())
                    .into_static()
            }
        }
    }
}

impl From<InvalidInput> for Error<'static> {
    fn from(input: InvalidInput) -> Self {
        match input {
            InvalidInput::NameRequired => ErrorKind::NameRequired.into_error(),
            InvalidInput::EmailRequired => ErrorKind::EmailRequired.into_error(),
            InvalidInput::PasswordTooShort => ErrorKind::PasswordTooShort.into_error(),
            InvalidInput::InvalidFieldType(detail) => {
                ErrorKind::InvalidFieldType.with_context(detail).into_static()
            }
            InvalidInput::InvalidColor(detail) => {
                ErrorKind::InvalidColor.with_context(detail).into_static()
            }
            InvalidInput::InvalidRole(detail) => {
                ErrorKind::InvalidRole.with_context(detail).into_static()
            }
            InvalidInput::InvalidToken => ErrorKind::InvalidToken.into_error(),
            InvalidInput::ExpiredToken => ErrorKind::ExpiredToken.into_error(),
            InvalidInput::UsedToken => ErrorKind::UsedToken.into_error(),
            InvalidInput::FormInactive => ErrorKind::FormInactive.into_error(),
            InvalidInput::RecordsRequired => ErrorKind::RecordsRequired.into_error(),
            InvalidInput::FileRequired => ErrorKind::FileRequired.into_error(),
            InvalidInput::Invalid(message) => {
                ErrorKind::InvalidRequest.with_message(message).into_static()
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_onto_stable_codes() {
        let err: Error<'static> = MutationError::Forbidden.into();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err: Error<'static> = MutationError::NotFound("record").into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), Some("Record not found"));

        let err: Error<'static> =
            MutationError::InvalidInput(InvalidInput::FormInactive).into();
        assert_eq!(err.kind(), ErrorKind::FormInactive);
    }
}
