//! # Table Accessor
//!
//! Lazy, zero-copy reads over a finished buffer.
//!
//! ## Design
//!
//! A [`Table`] is a buffer reference plus a position - nothing is parsed up
//! front and nothing is allocated. Every getter resolves its slot through
//! the vtable at access time:
//!
//! - absent slot (or a vtable too short to know it) -> the caller's default,
//!   which is what makes additive schema evolution automatic
//! - present scalar -> read in place
//! - present reference -> follow one more offset to a string, vector or
//!   sub-table view
//!
//! Bounds are checked on every hop. The format is otherwise unchecksummed;
//! bit-level integrity is the transport's problem.

use std::marker::PhantomData;

use crate::buffer::{read_scalar, WireScalar};
use crate::builder::{SIZE_PREFIX_LEN, SIZE_UOFFSET};
use crate::error::{WireError, WireResult};
use crate::vtable;

/// A read-only view of one record inside a finished buffer.
#[derive(Clone, Copy, Debug)]
pub struct Table<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Table<'a> {
    /// Binds a view at `pos`, where the record's back-pointer must lie.
    ///
    /// # Errors
    ///
    /// [`WireError::OutOfBounds`] if `pos` cannot hold a back-pointer.
    pub fn bind(buf: &'a [u8], pos: usize) -> WireResult<Self> {
        if pos + SIZE_UOFFSET > buf.len() {
            return Err(WireError::OutOfBounds {
                offset: pos,
                width: SIZE_UOFFSET,
                capacity: buf.len(),
            });
        }
        Ok(Self { buf, pos })
    }

    /// Position of this record within the buffer.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Reads a scalar slot, substituting `default` when absent.
    ///
    /// # Errors
    ///
    /// Vtable or field resolution faults; see [`WireError`].
    pub fn get_scalar<T: WireScalar>(&self, slot: u16, default: T) -> WireResult<T> {
        match vtable::field_offset(self.buf, self.pos, slot)? {
            None => Ok(default),
            Some(relative) => read_scalar(self.buf, self.pos + usize::from(relative)),
        }
    }

    /// Reads a text slot; `None` when absent.
    ///
    /// # Errors
    ///
    /// Resolution faults, [`WireError::OutOfBounds`] if the declared length
    /// escapes the buffer, [`WireError::InvalidUtf8`] if the payload is not
    /// UTF-8.
    pub fn get_string(&self, slot: u16) -> WireResult<Option<&'a str>> {
        let Some(pos) = self.indirect(slot)? else {
            return Ok(None);
        };
        let length = read_scalar::<u32>(self.buf, pos)? as usize;
        let start = pos + SIZE_UOFFSET;
        let end = start.checked_add(length).ok_or(WireError::OutOfBounds {
            offset: start,
            width: length,
            capacity: self.buf.len(),
        })?;
        if end > self.buf.len() {
            return Err(WireError::OutOfBounds {
                offset: start,
                width: length,
                capacity: self.buf.len(),
            });
        }
        let text = std::str::from_utf8(&self.buf[start..end])
            .map_err(|_| WireError::InvalidUtf8 { offset: start })?;
        Ok(Some(text))
    }

    /// Reads a nested record slot; `None` when absent.
    ///
    /// # Errors
    ///
    /// Resolution faults; see [`WireError`].
    pub fn get_table(&self, slot: u16) -> WireResult<Option<Table<'a>>> {
        match self.indirect(slot)? {
            None => Ok(None),
            Some(pos) => Table::bind(self.buf, pos).map(Some),
        }
    }

    /// Reads a sequence-of-scalars slot; `None` when absent.
    ///
    /// # Errors
    ///
    /// Resolution faults, [`WireError::OutOfBounds`] if the declared count
    /// implies a range past the buffer's end.
    pub fn get_vector<T: WireScalar>(&self, slot: u16) -> WireResult<Option<ScalarVector<'a, T>>> {
        match self.indirect(slot)? {
            None => Ok(None),
            Some(pos) => ScalarVector::bind(self.buf, pos).map(Some),
        }
    }

    /// Reads a sequence-of-text slot; `None` when absent.
    ///
    /// # Errors
    ///
    /// Same as [`Table::get_vector`].
    pub fn get_string_vector(&self, slot: u16) -> WireResult<Option<StringVector<'a>>> {
        match self.indirect(slot)? {
            None => Ok(None),
            Some(pos) => StringVector::bind(self.buf, pos).map(Some),
        }
    }

    /// Reads a sequence-of-records slot; `None` when absent.
    ///
    /// # Errors
    ///
    /// Same as [`Table::get_vector`].
    pub fn get_table_vector(&self, slot: u16) -> WireResult<Option<TableVector<'a>>> {
        match self.indirect(slot)? {
            None => Ok(None),
            Some(pos) => TableVector::bind(self.buf, pos).map(Some),
        }
    }

    /// Resolves a reference slot to the absolute position of its target.
    fn indirect(&self, slot: u16) -> WireResult<Option<usize>> {
        let Some(relative) = vtable::field_offset(self.buf, self.pos, slot)? else {
            return Ok(None);
        };
        let field_pos = self.pos + usize::from(relative);
        let jump = read_scalar::<u32>(self.buf, field_pos)?;
        Ok(Some(field_pos + jump as usize))
    }
}

/// Validates a `count * element` range starting right after a u32 count.
fn bind_elements(buf: &[u8], pos: usize, element_width: usize) -> WireResult<(usize, usize)> {
    let count = read_scalar::<u32>(buf, pos)? as usize;
    let start = pos + SIZE_UOFFSET;
    let byte_len = count
        .checked_mul(element_width)
        .ok_or(WireError::OutOfBounds {
            offset: start,
            width: usize::MAX,
            capacity: buf.len(),
        })?;
    if start + byte_len > buf.len() {
        return Err(WireError::OutOfBounds {
            offset: start,
            width: byte_len,
            capacity: buf.len(),
        });
    }
    Ok((start, count))
}

/// A view of a densely packed scalar sequence.
#[derive(Clone, Copy, Debug)]
pub struct ScalarVector<'a, T: WireScalar> {
    buf: &'a [u8],
    start: usize,
    count: usize,
    _element: PhantomData<T>,
}

impl<'a, T: WireScalar> ScalarVector<'a, T> {
    fn bind(buf: &'a [u8], pos: usize) -> WireResult<Self> {
        let (start, count) = bind_elements(buf, pos, T::WIDTH)?;
        Ok(Self {
            buf,
            start,
            count,
            _element: PhantomData,
        })
    }

    /// Element count.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true for an empty sequence.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Reads element `index`, or `None` past the end.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.count {
            return None;
        }
        Some(T::read_le(
            &self.buf[self.start + index * T::WIDTH..self.start + (index + 1) * T::WIDTH],
        ))
    }

    /// Iterates the elements in order.
    pub fn iter(&self) -> impl Iterator<Item = T> + 'a {
        let buf = self.buf;
        let start = self.start;
        (0..self.count).map(move |i| T::read_le(&buf[start + i * T::WIDTH..start + (i + 1) * T::WIDTH]))
    }
}

/// A view of a sequence of text references.
#[derive(Clone, Copy, Debug)]
pub struct StringVector<'a> {
    buf: &'a [u8],
    start: usize,
    count: usize,
}

impl<'a> StringVector<'a> {
    fn bind(buf: &'a [u8], pos: usize) -> WireResult<Self> {
        let (start, count) = bind_elements(buf, pos, SIZE_UOFFSET)?;
        Ok(Self { buf, start, count })
    }

    /// Element count.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true for an empty sequence.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Resolves element `index`.
    ///
    /// # Errors
    ///
    /// [`WireError::OutOfBounds`] past the end or on a corrupt element
    /// reference, [`WireError::InvalidUtf8`] on bad payload bytes.
    pub fn get(&self, index: usize) -> WireResult<&'a str> {
        let pos = self.element_target(index)?;
        let length = read_scalar::<u32>(self.buf, pos)? as usize;
        let start = pos + SIZE_UOFFSET;
        if start + length > self.buf.len() {
            return Err(WireError::OutOfBounds {
                offset: start,
                width: length,
                capacity: self.buf.len(),
            });
        }
        std::str::from_utf8(&self.buf[start..start + length])
            .map_err(|_| WireError::InvalidUtf8 { offset: start })
    }

    fn element_target(&self, index: usize) -> WireResult<usize> {
        if index >= self.count {
            return Err(WireError::OutOfBounds {
                offset: self.start + index * SIZE_UOFFSET,
                width: SIZE_UOFFSET,
                capacity: self.buf.len(),
            });
        }
        let element_pos = self.start + index * SIZE_UOFFSET;
        let jump = read_scalar::<u32>(self.buf, element_pos)?;
        Ok(element_pos + jump as usize)
    }
}

/// A view of a sequence of record references.
#[derive(Clone, Copy, Debug)]
pub struct TableVector<'a> {
    buf: &'a [u8],
    start: usize,
    count: usize,
}

impl<'a> TableVector<'a> {
    fn bind(buf: &'a [u8], pos: usize) -> WireResult<Self> {
        let (start, count) = bind_elements(buf, pos, SIZE_UOFFSET)?;
        Ok(Self { buf, start, count })
    }

    /// Element count.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true for an empty sequence.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Resolves element `index` to a record view.
    ///
    /// # Errors
    ///
    /// [`WireError::OutOfBounds`] past the end or on a corrupt element
    /// reference.
    pub fn get(&self, index: usize) -> WireResult<Table<'a>> {
        if index >= self.count {
            return Err(WireError::OutOfBounds {
                offset: self.start + index * SIZE_UOFFSET,
                width: SIZE_UOFFSET,
                capacity: self.buf.len(),
            });
        }
        let element_pos = self.start + index * SIZE_UOFFSET;
        let jump = read_scalar::<u32>(self.buf, element_pos)?;
        Table::bind(self.buf, element_pos + jump as usize)
    }
}

/// Binds the root record of a finished buffer.
///
/// # Errors
///
/// [`WireError::OutOfBounds`] if the buffer cannot hold a root pointer or
/// the pointer escapes it.
pub fn root_table(buf: &[u8]) -> WireResult<Table<'_>> {
    let jump = read_scalar::<u32>(buf, 0)?;
    Table::bind(buf, jump as usize)
}

/// Binds the root record of a size-prefixed buffer.
///
/// # Errors
///
/// [`WireError::Truncated`] if fewer bytes follow the prefix than it
/// declares; otherwise as [`root_table`].
pub fn size_prefixed_root_table(buf: &[u8]) -> WireResult<Table<'_>> {
    let declared = read_scalar::<u32>(buf, 0)? as usize;
    let available = buf.len() - SIZE_PREFIX_LEN;
    if declared > available {
        return Err(WireError::Truncated {
            expected: declared,
            available,
        });
    }
    root_table(&buf[SIZE_PREFIX_LEN..SIZE_PREFIX_LEN + declared])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn sample() -> Vec<u8> {
        let mut builder = Builder::new();
        let name = builder.create_string("p-42");
        let scores = builder.create_vector::<u32>(&[10, 7, 0]);
        builder.start_table(4);
        builder.push_slot_scalar::<u16>(0, 60, 0);
        builder.push_slot_offset(1, name);
        builder.push_slot_offset(2, scores);
        let root = builder.end_table();
        builder.finish(root);
        builder.finished_data().to_vec()
    }

    #[test]
    fn lazy_reads_resolve_each_kind() {
        let buf = sample();
        let table = root_table(&buf).unwrap();
        assert_eq!(table.get_scalar::<u16>(0, 0).unwrap(), 60);
        assert_eq!(table.get_string(1).unwrap(), Some("p-42"));

        let scores = table.get_vector::<u32>(2).unwrap().unwrap();
        assert_eq!(scores.len(), 3);
        assert_eq!(scores.get(0), Some(10));
        assert_eq!(scores.get(2), Some(0));
        assert_eq!(scores.get(3), None);
        assert_eq!(scores.iter().collect::<Vec<_>>(), vec![10, 7, 0]);
    }

    #[test]
    fn absent_slots_read_as_defaults() {
        let buf = sample();
        let table = root_table(&buf).unwrap();
        // Slot 3 was declared but never written.
        assert_eq!(table.get_scalar::<u32>(3, 99).unwrap(), 99);
        assert_eq!(table.get_string(3).unwrap(), None);
        assert!(table.get_table(3).unwrap().is_none());
        // Slot 9 postdates this writer entirely.
        assert_eq!(table.get_scalar::<u32>(9, 7).unwrap(), 7);
    }

    #[test]
    fn corrupt_string_length_is_out_of_bounds() {
        let buf = sample();
        let table = root_table(&buf).unwrap();

        // Locate the string's length word and inflate it.
        let mut evil = buf.clone();
        let field = {
            let relative = crate::vtable::field_offset(&buf, table.position(), 1)
                .unwrap()
                .unwrap();
            table.position() + usize::from(relative)
        };
        let jump = read_scalar::<u32>(&buf, field).unwrap() as usize;
        let string_pos = field + jump;
        evil[string_pos..string_pos + 4].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());

        let table = root_table(&evil).unwrap();
        assert!(matches!(
            table.get_string(1).unwrap_err(),
            WireError::OutOfBounds { .. }
        ));
    }

    #[test]
    fn corrupt_vector_count_is_out_of_bounds() {
        let buf = sample();
        let table = root_table(&buf).unwrap();

        let mut evil = buf.clone();
        let field = {
            let relative = crate::vtable::field_offset(&buf, table.position(), 2)
                .unwrap()
                .unwrap();
            table.position() + usize::from(relative)
        };
        let jump = read_scalar::<u32>(&buf, field).unwrap() as usize;
        let vector_pos = field + jump;
        evil[vector_pos..vector_pos + 4].copy_from_slice(&1_000_000u32.to_le_bytes());

        let table = root_table(&evil).unwrap();
        assert!(matches!(
            table.get_vector::<u32>(2).unwrap_err(),
            WireError::OutOfBounds { .. }
        ));
    }

    #[test]
    fn corrupt_root_pointer_is_out_of_bounds() {
        let mut buf = sample();
        let len = buf.len() as u32;
        buf[0..4].copy_from_slice(&(len + 64).to_le_bytes());
        assert!(matches!(
            root_table(&buf).unwrap_err(),
            WireError::OutOfBounds { .. }
        ));
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let mut builder = Builder::new();
        let text = builder.create_string("abcd");
        builder.start_table(1);
        builder.push_slot_offset(0, text);
        let root = builder.end_table();
        builder.finish(root);
        let mut buf = builder.finished_data().to_vec();

        // The payload is the last 4 bytes of the buffer.
        let at = buf.len() - 4;
        buf[at] = 0xFF;
        let table = root_table(&buf).unwrap();
        assert!(matches!(
            table.get_string(0).unwrap_err(),
            WireError::InvalidUtf8 { .. }
        ));
    }

    #[test]
    fn size_prefixed_root_round_trips() {
        let mut builder = Builder::new();
        builder.start_table(1);
        builder.push_slot_scalar::<u32>(0, 11, 0);
        let root = builder.end_table();
        builder.finish_size_prefixed(root);
        let buf = builder.finished_data();

        let declared = read_scalar::<u32>(buf, 0).unwrap() as usize;
        assert_eq!(declared, buf.len() - 4);

        let table = size_prefixed_root_table(buf).unwrap();
        assert_eq!(table.get_scalar::<u32>(0, 0).unwrap(), 11);

        assert!(matches!(
            size_prefixed_root_table(&buf[..buf.len() - 2]).unwrap_err(),
            WireError::Truncated { .. }
        ));
    }
}
