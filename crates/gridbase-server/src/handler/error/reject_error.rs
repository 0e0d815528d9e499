//! Translation of extractor rejections into the handler taxonomy.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use validator::ValidationErrors;

use super::{Error, ErrorKind};

impl From<JsonRejection> for Error<'static> {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ErrorKind::InvalidRequest
                .with_message("Request body does not match the expected shape")
                .with_context(err.to_string())
                .into_static(),
            JsonRejection::JsonSyntaxError(err) => ErrorKind::InvalidRequest
                .with_message("Request body is not valid JSON")
                .with_context(err.to_string())
                .into_static(),
            JsonRejection::MissingJsonContentType(_) => ErrorKind::InvalidRequest
                .with_message("Expected `Content-Type: application/json`")
                .into_static(),
            other => ErrorKind::InternalServerError
                .with_context(other.to_string())
                .into_static(),
        }
    }
}

impl From<PathRejection> for Error<'static> {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(err) => ErrorKind::InvalidId
                .with_context(err.to_string())
                .into_static(),
            other => ErrorKind::InternalServerError
                .with_context(other.to_string())
                .into_static(),
        }
    }
}

impl From<QueryRejection> for Error<'static> {
    fn from(rejection: QueryRejection) -> Self {
        ErrorKind::InvalidRequest
            .with_message("Query parameters could not be parsed")
            .with_context(rejection.to_string())
            .into_static()
    }
}

impl From<ValidationErrors> for Error<'static> {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, issues)| format!("{}: {} issue(s)", field, issues.len()))
            .collect();
        details.sort();

        ErrorKind::InvalidRequest
            .with_message("Request validation failed")
            .with_context(details.join(", "))
            .into_static()
    }
}
