#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod error;
mod health;

pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::health::{ServiceHealth, ServiceStatus};
