//! # VTable Resolution
//!
//! Field-offset tables: the indirection that makes slots optional.
//!
//! ## Wire Layout
//!
//! ```text
//! ┌─────────────────┬────────────────┬─────────────┬─────┬─────────────┐
//! │ vtable len: u16 │ table len: u16 │ slot 0: u16 │ ... │ slot N: u16 │
//! └─────────────────┴────────────────┴─────────────┴─────┴─────────────┘
//! ```
//!
//! Each slot entry is the field's byte offset relative to its table's start,
//! or 0 for "absent - use the schema default". A table opens with an i32
//! back-pointer to its vtable: `vtable_pos = table_pos - pointer`.
//!
//! ## Compatibility Rule
//!
//! A vtable shorter than the requested slot means the writer predates that
//! slot: the lookup reports "absent" rather than failing. Only a vtable whose
//! declared length escapes the buffer (or cannot hold its own header) is
//! malformed.

use crate::buffer::read_scalar;
use crate::error::{WireError, WireResult};

/// Bytes occupied by the (vtable len, table len) header.
pub(crate) const VTABLE_HEADER_LEN: usize = 4;

/// Width of one vtable slot entry.
pub(crate) const SIZE_VOFFSET: usize = 2;

/// Resolves a slot to its table-relative byte offset.
///
/// Returns `Ok(None)` when the field is absent or the vtable predates the
/// slot - the caller substitutes the schema default.
///
/// # Errors
///
/// - [`WireError::DanglingVTable`] if the table's back-pointer escapes the
///   buffer
/// - [`WireError::MalformedVTable`] if the vtable's declared length cannot
///   hold its header or exceeds the buffer
/// - [`WireError::OutOfBounds`] if the table position itself is unreadable
pub(crate) fn field_offset(buf: &[u8], table_pos: usize, slot: u16) -> WireResult<Option<u16>> {
    let back_pointer: i32 = read_scalar(buf, table_pos)?;
    let vtable_pos = table_pos as i64 - i64::from(back_pointer);
    if vtable_pos < 0 || vtable_pos as usize + VTABLE_HEADER_LEN > buf.len() {
        return Err(WireError::DanglingVTable { table: table_pos });
    }
    let vtable_pos = vtable_pos as usize;

    let declared = usize::from(read_scalar::<u16>(buf, vtable_pos)?);
    if declared < VTABLE_HEADER_LEN || vtable_pos + declared > buf.len() {
        return Err(WireError::MalformedVTable {
            offset: vtable_pos,
            declared,
            capacity: buf.len(),
        });
    }

    let entry = VTABLE_HEADER_LEN + usize::from(slot) * SIZE_VOFFSET;
    if entry + SIZE_VOFFSET > declared {
        // The writer never knew this slot.
        return Ok(None);
    }

    let relative = read_scalar::<u16>(buf, vtable_pos + entry)?;
    Ok((relative != 0).then_some(relative))
}
