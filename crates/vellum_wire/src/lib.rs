//! # VELLUM Wire - The Scribe Protocol
//!
//! Zero-copy, schema-driven binary serialization for real-time multiplayer
//! messaging.
//!
//! ## Architecture
//!
//! This crate implements the complete encoding/decoding runtime:
//!
//! - **ByteBuffer**: a grow-from-the-end byte region with raw, bounds-checked
//!   little-endian access
//! - **Builder**: back-to-front assembly - children before parents, every
//!   reference an offset to already-written content
//! - **VTables**: per-instance slot -> offset tables, deduplicated across
//!   records sharing a field-presence pattern
//! - **Table**: lazy read-only accessors straight over raw bytes - no
//!   deserialization pass, no allocation
//! - **Framing**: u32 size prefixes for delimiting buffers on a stream
//! - **Dynamic**: registry-driven building and reading without generated code
//!
//! ## Buffer Anatomy
//!
//! ```text
//! ┌─────────────┬─────────┬─────────────────┬───────────────┬──────────┐
//! │ root: u32   │ padding │ vtable          │ table         │ children │
//! └─────────────┴─────────┴─────────────────┴───────────────┴──────────┘
//!      offset ──────────────────▶ every reference points right (backward
//!                                 in build order - children are written
//!                                 first and land at the highest addresses)
//! ```
//!
//! ## Guarantees
//!
//! - A finished buffer is immutable and may be read concurrently from any
//!   number of threads without synchronization
//! - Absent fields cost zero bytes and read back as their schema defaults,
//!   which is the entire additive-evolution story: old readers ignore new
//!   trailing slots, new readers default missing old-writer slots
//! - Every read is bounds-checked; a hostile length field produces an error,
//!   never an out-of-range access
//!
//! ## Example
//!
//! ```rust,ignore
//! use vellum_wire::{Builder, root_table};
//!
//! let mut builder = Builder::new();
//! let player_id = builder.create_string("p-42");
//! builder.start_table(2);
//! builder.push_slot_offset(0, player_id);
//! builder.push_slot_scalar::<u16>(1, 60, 0);
//! let root = builder.end_table();
//! builder.finish(root);
//!
//! let table = root_table(builder.finished_data())?;
//! assert_eq!(table.get_string(0)?, Some("p-42"));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod buffer;
pub mod builder;
pub mod dynamic;
pub mod error;
pub mod framing;
pub mod table;

mod vtable;

// Re-exports for convenience
pub use buffer::{ByteBuffer, WireScalar, MAX_BUFFER_BYTES};
pub use builder::{Builder, BuilderOptions, WireOffset, SIZE_PREFIX_LEN};
pub use dynamic::{decode_record, encode_record, DynamicRecord, Value};
pub use error::{WireError, WireResult};
pub use framing::{frame, frame_into, read_frames, FrameReadError, FrameReader, Frames};
pub use table::{
    root_table, size_prefixed_root_table, ScalarVector, StringVector, Table, TableVector,
};
