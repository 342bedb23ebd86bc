//! # Wire Error Types
//!
//! All errors that can occur while reading or dynamically building buffers.
//!
//! ## Contract Faults vs. Data Faults
//!
//! Read-side failures are data-dependent and returned as values - a received
//! buffer is untrusted input. Builder misuse (referencing an offset that was
//! never produced, finishing a buffer twice, nesting table construction) is a
//! programmer error: those paths panic immediately instead of returning, and
//! every such method documents its `# Panics` conditions.

use thiserror::Error;
use vellum_schema::SchemaError;

/// Errors that can occur in the wire engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WireError {
    /// An access would touch bytes beyond the buffer's capacity.
    #[error("read of {width} bytes at offset {offset} exceeds buffer capacity {capacity}")]
    OutOfBounds {
        /// Start of the attempted access.
        offset: usize,
        /// Width of the attempted access in bytes.
        width: usize,
        /// Capacity of the buffer.
        capacity: usize,
    },

    /// A table's vtable pointer resolves outside the buffer.
    #[error("vtable pointer at table offset {table} escapes the buffer")]
    DanglingVTable {
        /// Position of the table whose pointer is bad.
        table: usize,
    },

    /// A vtable declares a length that cannot be right.
    #[error("vtable at offset {offset} declares length {declared}, buffer capacity is {capacity}")]
    MalformedVTable {
        /// Position of the vtable.
        offset: usize,
        /// The declared vtable byte length.
        declared: usize,
        /// Capacity of the buffer.
        capacity: usize,
    },

    /// A length-prefixed region ends before its declared length.
    ///
    /// Surfaced to the transport layer as "incomplete, await more data" -
    /// distinct from the hard failures above.
    #[error("truncated: expected {expected} more bytes, only {available} available")]
    Truncated {
        /// Bytes the prefix promised.
        expected: usize,
        /// Bytes actually present.
        available: usize,
    },

    /// A text field's bytes are not valid UTF-8.
    #[error("text at offset {offset} is not valid UTF-8")]
    InvalidUtf8 {
        /// Position of the offending payload.
        offset: usize,
    },

    /// A dynamically supplied value does not match its slot's declared type.
    #[error("value does not match slot {slot} of record '{record}'")]
    ValueMismatch {
        /// The record being built or read.
        record: String,
        /// The offending slot index.
        slot: u16,
    },

    /// A dynamically supplied slot index is not declared by the schema.
    #[error("record '{record}' declares no slot {slot}")]
    UnknownSlot {
        /// The record being built or read.
        record: String,
        /// The undeclared slot index.
        slot: u16,
    },

    /// A schema lookup or validation failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Result type for wire operations.
pub type WireResult<T> = Result<T, WireError>;
