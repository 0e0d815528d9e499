//! Domain types backing the database layer.
//!
//! This module contains the Postgres-backed enumerations, the tagged
//! field-value and field-option types with their per-type validators, and
//! structured constraint-violation mapping.

mod constraints;
mod enums;
mod field_options;
mod field_value;
mod form_fields;

pub use constraints::ConstraintViolation;
pub use enums::{
    ActivityAction, ApiScope, AutomationActionType, AutomationTriggerType, CollaboratorRole,
    EntityKind, EventType, FieldType, RunStatus, ViewType,
};
pub use field_options::{
    FieldOptions, FieldOptionsError, FormulaOptions, LinkedRecordOptions, LookupOptions,
    NumberOptions, RollupAggregate, RollupOptions, SelectOptions,
};
pub use field_value::{FieldValue, FieldValueError};
pub use form_fields::FormField;
