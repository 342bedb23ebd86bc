//! # VELLUM Schema
//!
//! Resolved slot tables consumed by both sides of the wire format.
//!
//! ## What Lives Here
//!
//! - **Types**: the semantic type of every field slot (scalar, text,
//!   record reference, sequence)
//! - **Records**: ordered slot lists per record type
//! - **Registry**: an explicit, shareable name -> schema lookup
//!
//! ## CRITICAL RULE
//!
//! This crate never parses schema source text and never touches buffers.
//! It only models the *resolved* output of a schema compiler: stable slot
//! indices, semantic types, and scalar defaults. Field names are carried for
//! diagnostics only - the slot index is the sole wire-compatibility key.

#![deny(missing_docs)]
#![deny(unsafe_code)]

mod error;
mod record;
mod registry;
mod types;

pub use error::{SchemaError, SchemaResult};
pub use record::{FieldSlot, RecordSchema};
pub use registry::SchemaRegistry;
pub use types::{DefaultValue, FieldType, ScalarType};
