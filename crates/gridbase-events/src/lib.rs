#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod bus;
mod event;

pub use gridbase_postgres::types::EventType;

pub use crate::bus::{BusClosed, EventBus, EventStream};
pub use crate::event::BaseEvent;

/// Tracing target for event bus operations.
pub const TRACING_TARGET: &str = "gridbase_events::bus";
