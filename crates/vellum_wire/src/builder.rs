//! # Builder
//!
//! Bottom-up assembly of one finished buffer.
//!
//! ## Construction Order (MANDATED)
//!
//! Every reference on the wire is an offset to already-written content, so
//! children come before parents - strings, vectors and sub-tables first, the
//! tables that reference them after, the root pointer last:
//!
//! ```text
//! CHILDREN                    PARENT                      ROOT
//!   |                           |                           |
//!   |-- create_string ----------|                           |
//!   |-- create_vector ----------|                           |
//!   |                           |-- start_table             |
//!   |                           |-- push_slot_* ...         |
//!   |                           |-- end_table --------------|
//!   |                           |                           |-- finish
//! ```
//!
//! Violating the order would produce a reference into not-yet-written
//! memory; the builder panics instead of emitting a corrupt buffer.
//!
//! ## Presence Pruning
//!
//! A scalar slot equal to its declared default costs zero bytes: nothing is
//! stored and the slot's vtable entry stays 0. The accessor re-materializes
//! the default on read.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::buffer::{ByteBuffer, WireScalar};
use crate::vtable::{SIZE_VOFFSET, VTABLE_HEADER_LEN};

/// Width of a forward (child) reference on the wire.
pub(crate) const SIZE_UOFFSET: usize = 4;

/// Width of a table's back-pointer to its vtable.
pub(crate) const SIZE_SOFFSET: usize = 4;

/// Width of the optional length prefix ahead of a framed buffer.
pub const SIZE_PREFIX_LEN: usize = 4;

/// A finished object's position, measured from the buffer's end.
///
/// Only meaningful to the builder that produced it; feeding an offset from
/// another builder is undetectable misuse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct WireOffset(u32);

impl WireOffset {
    /// Raw distance from the buffer end to the object's start.
    #[inline]
    pub(crate) const fn value(self) -> u32 {
        self.0
    }
}

/// Deployment tunables for the builder.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BuilderOptions {
    /// Starting capacity in bytes; the buffer doubles from there.
    pub initial_capacity: usize,
    /// Store scalar fields even when they equal their default.
    ///
    /// Costs bytes, buys nothing at read time - exists for wire-level
    /// debugging and A/B size comparisons.
    pub force_defaults: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            force_defaults: false,
        }
    }
}

/// Where one present field landed, recorded between `start_table` and
/// `end_table`.
#[derive(Clone, Copy, Debug)]
struct FieldLoc {
    slot: u16,
    offset: u32,
}

/// Stateful writer that assembles one message back-to-front.
///
/// A builder is exclusively owned by one producer for the duration of one
/// message. After [`Builder::finish`] the buffer is immutable; [`Builder::reset`]
/// reclaims the allocation for the next message.
#[derive(Debug)]
pub struct Builder {
    buf: ByteBuffer,
    field_locs: Vec<FieldLoc>,
    written_vtables: Vec<u32>,
    nested: bool,
    finished: bool,
    min_align: usize,
    force_defaults: bool,
    table_start: u32,
    table_slot_count: u16,
}

impl Builder {
    /// Creates a builder with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(BuilderOptions::default())
    }

    /// Creates a builder with explicit tunables.
    #[must_use]
    pub fn with_options(options: BuilderOptions) -> Self {
        Self {
            buf: ByteBuffer::allocate(options.initial_capacity),
            field_locs: Vec::new(),
            written_vtables: Vec::new(),
            nested: false,
            finished: false,
            min_align: 1,
            force_defaults: options.force_defaults,
            table_start: 0,
            table_slot_count: 0,
        }
    }

    /// Bytes written so far.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.buf.used_bytes() as u32
    }

    /// Rewinds the builder for the next message, keeping the allocation.
    pub fn reset(&mut self) {
        self.buf.reset();
        self.field_locs.clear();
        self.written_vtables.clear();
        self.nested = false;
        self.finished = false;
        self.min_align = 1;
    }

    // ------------------------------------------------------------------
    // Out-of-line objects
    // ------------------------------------------------------------------

    /// Writes UTF-8 text: u32 length, payload, no terminator, padded so the
    /// length word sits on a 4-byte boundary.
    ///
    /// Identical strings are NOT deduplicated - repeated text occupies
    /// separate storage.
    ///
    /// # Panics
    ///
    /// If a table is under construction (children must be written first) or
    /// the text exceeds the u32 addressable range.
    pub fn create_string(&mut self, value: &str) -> WireOffset {
        self.assert_outside_table("create_string");
        let payload = value.as_bytes();
        assert!(
            payload.len() <= u32::MAX as usize,
            "string of {} bytes exceeds the u32 length prefix",
            payload.len()
        );
        self.pre_align(SIZE_UOFFSET + payload.len(), SIZE_UOFFSET);
        let pos = self.buf.make_space(payload.len());
        self.buf.put_bytes(pos, payload);
        self.push(payload.len() as u32);
        WireOffset(self.offset())
    }

    /// Writes a sequence of fixed-width scalars: u32 count, densely packed
    /// elements aligned to their own width.
    ///
    /// # Panics
    ///
    /// If a table is under construction.
    pub fn create_vector<T: WireScalar>(&mut self, items: &[T]) -> WireOffset {
        self.assert_outside_table("create_vector");
        let byte_len = items.len() * T::WIDTH;
        self.pre_align(SIZE_UOFFSET + byte_len, SIZE_UOFFSET);
        self.pre_align(byte_len, T::WIDTH);
        for item in items.iter().rev() {
            let pos = self.buf.make_space(T::WIDTH);
            self.buf.put_scalar(pos, *item);
        }
        self.push(items.len() as u32);
        WireOffset(self.offset())
    }

    /// Writes a sequence of references to already-built objects.
    ///
    /// # Panics
    ///
    /// If a table is under construction, or any element references an offset
    /// this builder has not produced yet.
    pub fn create_vector_of_offsets(&mut self, items: &[WireOffset]) -> WireOffset {
        self.assert_outside_table("create_vector_of_offsets");
        self.pre_align(SIZE_UOFFSET + items.len() * SIZE_UOFFSET, SIZE_UOFFSET);
        for item in items.iter().rev() {
            self.push_uoffset(*item);
        }
        self.push(items.len() as u32);
        WireOffset(self.offset())
    }

    /// Builds each string, then a vector of references to them.
    pub fn create_vector_of_strings(&mut self, items: &[&str]) -> WireOffset {
        let offsets: Vec<WireOffset> = items.iter().map(|s| self.create_string(s)).collect();
        self.create_vector_of_offsets(&offsets)
    }

    // ------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------

    /// Begins a record with `slot_count` declared slots.
    ///
    /// # Panics
    ///
    /// If another table is already under construction, or the buffer is
    /// already finished.
    pub fn start_table(&mut self, slot_count: u16) {
        assert!(
            !self.nested,
            "table already under construction: build sub-tables child-first"
        );
        assert!(!self.finished, "buffer already finished");
        self.nested = true;
        self.table_slot_count = slot_count;
        self.field_locs.clear();
        self.table_start = self.offset();
    }

    /// Stores a scalar slot, skipping it when it equals its default.
    ///
    /// # Panics
    ///
    /// If no table is under construction or `slot` is out of range.
    pub fn push_slot_scalar<T: WireScalar>(&mut self, slot: u16, value: T, default: T) {
        self.assert_slot(slot, "push_slot_scalar");
        if value == default && !self.force_defaults {
            return;
        }
        self.pre_align(T::WIDTH, T::WIDTH);
        let pos = self.buf.make_space(T::WIDTH);
        self.buf.put_scalar(pos, value);
        self.field_locs.push(FieldLoc {
            slot,
            offset: self.offset(),
        });
    }

    /// Stores a reference slot pointing at an already-built object.
    ///
    /// # Panics
    ///
    /// If no table is under construction, `slot` is out of range, or `value`
    /// references an offset this builder has not produced yet.
    pub fn push_slot_offset(&mut self, slot: u16, value: WireOffset) {
        self.assert_slot(slot, "push_slot_offset");
        self.push_uoffset(value);
        self.field_locs.push(FieldLoc {
            slot,
            offset: self.offset(),
        });
    }

    /// Closes the record: writes its vtable (or reuses an identical one) and
    /// the back-pointer connecting the two.
    ///
    /// # Panics
    ///
    /// If no table is under construction, a slot was written twice, or the
    /// record grew past the u16 ranges a vtable can express.
    pub fn end_table(&mut self) -> WireOffset {
        assert!(self.nested, "end_table without start_table");

        // The back-pointer is the table's first word; patched below once the
        // vtable's position is known.
        self.pre_align(SIZE_SOFFSET, SIZE_SOFFSET);
        let placeholder = self.buf.make_space(SIZE_SOFFSET);
        self.buf.put_scalar(placeholder, 0i32);
        let table_pos = self.offset();

        let used_slots = self
            .field_locs
            .iter()
            .map(|loc| loc.slot + 1)
            .max()
            .unwrap_or(0);
        let vtable_len = VTABLE_HEADER_LEN + usize::from(used_slots) * SIZE_VOFFSET;
        let table_len = table_pos - self.table_start;
        assert!(
            vtable_len <= usize::from(u16::MAX),
            "vtable of {vtable_len} bytes exceeds the u16 vtable length"
        );
        assert!(
            table_len <= u16::MAX as u32,
            "record of {table_len} bytes exceeds the u16 table length"
        );

        let mut entries = vec![0u16; usize::from(used_slots)];
        for loc in &self.field_locs {
            let entry = &mut entries[usize::from(loc.slot)];
            assert!(*entry == 0, "slot {} written twice", loc.slot);
            *entry = (table_pos - loc.offset) as u16;
        }

        if let Some(existing) = self.find_vtable(vtable_len, table_len as u16, &entries) {
            trace!(vtable = existing, table = table_pos, "vtable reused");
            self.patch_back_pointer(table_pos, existing as i64 - i64::from(table_pos));
        } else {
            for entry in entries.iter().rev() {
                self.push(*entry);
            }
            self.push(table_len as u16);
            self.push(vtable_len as u16);
            let vtable_pos = self.offset();
            self.written_vtables.push(vtable_pos);
            self.patch_back_pointer(table_pos, i64::from(vtable_pos) - i64::from(table_pos));
        }

        self.nested = false;
        WireOffset(table_pos)
    }

    // ------------------------------------------------------------------
    // Finishing
    // ------------------------------------------------------------------

    /// Writes the root pointer and seals the buffer.
    ///
    /// # Panics
    ///
    /// If a table is under construction, the buffer was already finished
    /// (exactly one root per buffer), or `root` was never produced.
    pub fn finish(&mut self, root: WireOffset) {
        self.finish_internal(root, false);
    }

    /// Like [`Builder::finish`], but lays a u32 length prefix ahead of the
    /// root pointer for stream framing.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Builder::finish`].
    pub fn finish_size_prefixed(&mut self, root: WireOffset) {
        self.finish_internal(root, true);
    }

    /// The finished byte range, root pointer first.
    ///
    /// # Panics
    ///
    /// If called before [`Builder::finish`] - an unfinished buffer is an
    /// invalid, non-transmittable state.
    #[must_use]
    pub fn finished_data(&self) -> &[u8] {
        assert!(self.finished, "finished_data called before finish");
        self.buf.data()
    }

    fn finish_internal(&mut self, root: WireOffset, size_prefixed: bool) {
        assert!(
            !self.nested,
            "finish called while a table is under construction"
        );
        assert!(
            !self.finished,
            "buffer already finished: exactly one root per buffer"
        );
        let trailing = if size_prefixed {
            SIZE_UOFFSET + SIZE_PREFIX_LEN
        } else {
            SIZE_UOFFSET
        };
        let align = self.min_align;
        self.pre_align(trailing, align);
        self.push_uoffset(root);
        if size_prefixed {
            let size = self.offset();
            self.push(size);
        }
        self.finished = true;
        debug!(bytes = self.offset(), size_prefixed, "buffer finished");
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Raw aligned-by-construction push; returns the new offset-from-end.
    fn push<T: WireScalar>(&mut self, value: T) -> u32 {
        let pos = self.buf.make_space(T::WIDTH);
        self.buf.put_scalar(pos, value);
        self.offset()
    }

    /// Pushes a u32 reference to `target`, stored as the distance from the
    /// reference's own location to the object it names.
    fn push_uoffset(&mut self, target: WireOffset) -> u32 {
        assert!(
            target.value() != 0 && target.value() <= self.offset(),
            "invalid reference: offset {} was never produced (write position {})",
            target.value(),
            self.offset()
        );
        self.pre_align(SIZE_UOFFSET, SIZE_UOFFSET);
        let pos = self.buf.make_space(SIZE_UOFFSET);
        let written = self.offset();
        self.buf.put_scalar(pos, written - target.value());
        written
    }

    /// Pads with zeros so that after `len` more bytes the write position is
    /// a multiple of `alignment`.
    fn pre_align(&mut self, len: usize, alignment: usize) {
        debug_assert!(alignment.is_power_of_two());
        if alignment > self.min_align {
            self.min_align = alignment;
        }
        const ZEROS: [u8; 8] = [0u8; 8];
        let after = self.buf.used_bytes() + len;
        let padding = after.wrapping_neg() & (alignment - 1);
        if padding > 0 {
            let pos = self.buf.make_space(padding);
            self.buf.put_bytes(pos, &ZEROS[..padding]);
        }
    }

    /// Byte-for-byte search of previously written vtables.
    fn find_vtable(&self, vtable_len: usize, table_len: u16, entries: &[u16]) -> Option<u32> {
        let raw = self.buf.raw();
        let capacity = self.buf.capacity();
        'candidates: for &candidate in &self.written_vtables {
            let base = capacity - candidate as usize;
            if usize::from(u16::read_le(&raw[base..base + 2])) != vtable_len {
                continue;
            }
            if u16::read_le(&raw[base + 2..base + 4]) != table_len {
                continue;
            }
            for (index, &entry) in entries.iter().enumerate() {
                let at = base + VTABLE_HEADER_LEN + index * SIZE_VOFFSET;
                if u16::read_le(&raw[at..at + 2]) != entry {
                    continue 'candidates;
                }
            }
            return Some(candidate);
        }
        None
    }

    /// Back-patches a table's first word with the signed distance to its
    /// vtable. The placeholder was reserved, never meaningfully written, so
    /// the write-once discipline holds.
    fn patch_back_pointer(&mut self, table_pos: u32, distance: i64) {
        let absolute = self.buf.capacity() - table_pos as usize;
        self.buf.put_scalar(absolute, distance as i32);
    }

    fn assert_outside_table(&self, operation: &str) {
        assert!(
            !self.nested,
            "{operation} while a table is under construction: children are written first"
        );
        assert!(!self.finished, "{operation} after finish");
    }

    fn assert_slot(&self, slot: u16, operation: &str) {
        assert!(self.nested, "{operation} outside start_table/end_table");
        assert!(
            slot < self.table_slot_count,
            "slot {slot} out of range for a table declaring {} slots",
            self.table_slot_count
        );
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
