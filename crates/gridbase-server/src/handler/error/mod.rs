//! Handler-layer error types and conversions.
//!
//! [`Error`] and [`ErrorKind`] produce the stable-code JSON envelope
//! returned to clients; the sibling modules translate lower-layer errors
//! (database, mutation service, extractor rejections) into that taxonomy so
//! raw store errors never reach a client.

mod http_error;
mod mutation_error;
mod pg_error;
mod reject_error;

pub use http_error::{Error, ErrorKind, Result};
