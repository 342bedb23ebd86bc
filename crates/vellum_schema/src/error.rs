//! # Schema Error Types
//!
//! All errors that can occur while assembling or registering schemas.

use thiserror::Error;

/// Errors that can occur in the schema layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Slot indices must match declaration order exactly.
    #[error("slot index out of order in record '{record}': expected {expected}, found {found}")]
    SlotOutOfOrder {
        /// The record being assembled.
        record: String,
        /// The index implied by declaration order.
        expected: u16,
        /// The index actually declared.
        found: u16,
    },

    /// A scalar slot declared a default of the wrong shape.
    #[error("default value does not fit slot {slot} of record '{record}'")]
    DefaultMismatch {
        /// The record being assembled.
        record: String,
        /// The offending slot index.
        slot: u16,
    },

    /// A record was registered twice with two different definitions.
    #[error("conflicting registration for record '{0}'")]
    ConflictingRegistration(String),

    /// A record reference names a type the registry has never seen.
    #[error("unknown record type '{0}'")]
    UnknownRecord(String),
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
