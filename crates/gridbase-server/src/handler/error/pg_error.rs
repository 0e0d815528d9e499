//! Translation of database errors into the handler taxonomy.

use gridbase_postgres::PgError;

use super::{Error, ErrorKind};

impl From<PgError> for Error<'static> {
    fn from(err: PgError) -> Self {
        // Known constraint violations surface as conflicts; everything else
        // is an internal error whose details stay server-side.
        if let Some(violation) = err.constraint_violation() {
            return ErrorKind::Conflict
                .with_context(format!("constraint violation: {violation:?}"))
                .into_static();
        }

        if err.is_unique_violation() {
            return ErrorKind::Conflict
                .with_context(err.to_string())
                .into_static();
        }

        tracing::error!(error = %err, "database operation failed");
        ErrorKind::InternalServerError
            .with_context(err.to_string())
            .into_static()
    }
}
