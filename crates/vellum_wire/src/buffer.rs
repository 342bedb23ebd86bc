//! # ByteBuffer
//!
//! The byte region every message is assembled into.
//!
//! ## Growth Direction
//!
//! Content is written back-to-front: the first object lands at the highest
//! addresses and every later object below it. The buffer therefore grows by
//! doubling *toward the head* - on reallocation the used tail is copied to
//! the end of the new region and every offset-from-end stays valid.
//!
//! ```text
//! capacity ──────────────────────────────────────────┐
//! ┌──────────────────────┬───────────────────────────┤
//! │ free (head bytes)    │ written content           │
//! └──────────────────────┴───────────────────────────┘
//!                        ▲
//!                        position() - the write cursor
//! ```
//!
//! ## Validation
//!
//! This layer checks bounds and nothing else. Whether the bytes at an offset
//! form a well-formed record is the accessor's problem, at read time.

use tracing::debug;

use crate::error::{WireError, WireResult};

/// Upper bound on buffer capacity - offsets are u32 on the wire.
pub const MAX_BUFFER_BYTES: usize = u32::MAX as usize;

/// A fixed-width scalar that can live on the wire.
///
/// All wire scalars are little-endian and 1, 2, 4 or 8 bytes wide.
pub trait WireScalar: Copy + PartialEq {
    /// Width of the scalar in bytes on the wire.
    const WIDTH: usize;

    /// Writes the value little-endian into `dst` (exactly `WIDTH` bytes).
    fn write_le(self, dst: &mut [u8]);

    /// Reads a little-endian value from `src` (exactly `WIDTH` bytes).
    fn read_le(src: &[u8]) -> Self;
}

macro_rules! impl_wire_scalar {
    ($($ty:ty),*) => {
        $(
            impl WireScalar for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn write_le(self, dst: &mut [u8]) {
                    dst.copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_le(src: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(src);
                    Self::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_wire_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl WireScalar for bool {
    const WIDTH: usize = 1;

    #[inline]
    fn write_le(self, dst: &mut [u8]) {
        dst[0] = u8::from(self);
    }

    #[inline]
    fn read_le(src: &[u8]) -> Self {
        src[0] != 0
    }
}

/// Bounds-checked little-endian scalar read over raw bytes.
///
/// Shared by [`ByteBuffer`] and the lazy accessors, which read received
/// buffers as plain slices.
#[inline]
pub(crate) fn read_scalar<T: WireScalar>(buf: &[u8], offset: usize) -> WireResult<T> {
    let end = offset.checked_add(T::WIDTH).ok_or(WireError::OutOfBounds {
        offset,
        width: T::WIDTH,
        capacity: buf.len(),
    })?;
    if end > buf.len() {
        return Err(WireError::OutOfBounds {
            offset,
            width: T::WIDTH,
            capacity: buf.len(),
        });
    }
    Ok(T::read_le(&buf[offset..end]))
}

/// A growable-from-the-end byte region with a back-to-front write cursor.
#[derive(Debug)]
pub struct ByteBuffer {
    /// Backing storage, always fully zero-initialized on allocation.
    bytes: Vec<u8>,
    /// First used byte; content occupies `bytes[head..]`.
    head: usize,
}

impl ByteBuffer {
    /// Allocates a zero-initialized region of at least `capacity` bytes.
    #[must_use]
    pub fn allocate(capacity: usize) -> Self {
        let capacity = capacity.max(16);
        Self {
            bytes: vec![0u8; capacity],
            head: capacity,
        }
    }

    /// Total capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// The current write cursor - the lowest used address.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.head
    }

    /// Bytes written so far (distance from the cursor to the end).
    #[inline]
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.bytes.len() - self.head
    }

    /// The written region, oldest object last.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.bytes[self.head..]
    }

    /// The full backing region, including unused head bytes.
    #[inline]
    pub(crate) fn raw(&self) -> &[u8] {
        &self.bytes
    }

    /// Reads a scalar at an absolute offset.
    ///
    /// # Errors
    ///
    /// [`WireError::OutOfBounds`] if `offset + width` exceeds capacity.
    pub fn read_scalar_at<T: WireScalar>(&self, offset: usize) -> WireResult<T> {
        read_scalar(&self.bytes, offset)
    }

    /// Writes a scalar at an absolute offset.
    ///
    /// # Errors
    ///
    /// [`WireError::OutOfBounds`] if `offset + width` exceeds capacity.
    pub fn write_scalar_at<T: WireScalar>(&mut self, offset: usize, value: T) -> WireResult<()> {
        let end = offset.checked_add(T::WIDTH).ok_or(WireError::OutOfBounds {
            offset,
            width: T::WIDTH,
            capacity: self.bytes.len(),
        })?;
        if end > self.bytes.len() {
            return Err(WireError::OutOfBounds {
                offset,
                width: T::WIDTH,
                capacity: self.bytes.len(),
            });
        }
        value.write_le(&mut self.bytes[offset..end]);
        Ok(())
    }

    /// Copies a run of bytes to an absolute offset.
    ///
    /// # Errors
    ///
    /// [`WireError::OutOfBounds`] if the run exceeds capacity.
    pub fn write_bytes_at(&mut self, offset: usize, src: &[u8]) -> WireResult<()> {
        let end = offset.checked_add(src.len()).ok_or(WireError::OutOfBounds {
            offset,
            width: src.len(),
            capacity: self.bytes.len(),
        })?;
        if end > self.bytes.len() {
            return Err(WireError::OutOfBounds {
                offset,
                width: src.len(),
                capacity: self.bytes.len(),
            });
        }
        self.bytes[offset..end].copy_from_slice(src);
        Ok(())
    }

    /// Reserves `len` bytes below the cursor, growing if needed.
    ///
    /// Returns the absolute offset of the reserved region.
    pub(crate) fn make_space(&mut self, len: usize) -> usize {
        if self.head < len {
            self.grow(len);
        }
        self.head -= len;
        self.head
    }

    /// In-bounds scalar write used by the builder after `make_space`.
    #[inline]
    pub(crate) fn put_scalar<T: WireScalar>(&mut self, offset: usize, value: T) {
        value.write_le(&mut self.bytes[offset..offset + T::WIDTH]);
    }

    /// In-bounds byte-run write used by the builder after `make_space`.
    #[inline]
    pub(crate) fn put_bytes(&mut self, offset: usize, src: &[u8]) {
        self.bytes[offset..offset + src.len()].copy_from_slice(src);
    }

    /// Zeroes the written region and rewinds the cursor for reuse.
    pub(crate) fn reset(&mut self) {
        let head = self.head;
        self.bytes[head..].fill(0);
        self.head = self.bytes.len();
    }

    /// Doubles capacity until `additional` more bytes fit, preserving all
    /// offsets-from-end by copying the used tail to the new end.
    fn grow(&mut self, additional: usize) {
        let used = self.used_bytes();
        let needed = used + additional;
        let mut new_capacity = self.bytes.len();
        while new_capacity < needed {
            assert!(
                new_capacity <= MAX_BUFFER_BYTES / 2,
                "buffer exceeds the {MAX_BUFFER_BYTES}-byte addressable range of u32 offsets"
            );
            new_capacity *= 2;
        }

        let mut new_bytes = vec![0u8; new_capacity];
        new_bytes[new_capacity - used..].copy_from_slice(&self.bytes[self.head..]);
        debug!(
            old_capacity = self.bytes.len(),
            new_capacity, "byte buffer grown"
        );
        self.bytes = new_bytes;
        self.head = new_capacity - used;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip_all_widths() {
        let mut buf = ByteBuffer::allocate(64);
        buf.write_scalar_at(0, 0xABu8).unwrap();
        buf.write_scalar_at(2, -2i16).unwrap();
        buf.write_scalar_at(4, 0xDEAD_BEEFu32).unwrap();
        buf.write_scalar_at(8, -9i64).unwrap();
        buf.write_scalar_at(16, 1.5f32).unwrap();
        buf.write_scalar_at(24, 2.25f64).unwrap();
        buf.write_scalar_at(32, true).unwrap();

        assert_eq!(buf.read_scalar_at::<u8>(0).unwrap(), 0xAB);
        assert_eq!(buf.read_scalar_at::<i16>(2).unwrap(), -2);
        assert_eq!(buf.read_scalar_at::<u32>(4).unwrap(), 0xDEAD_BEEF);
        assert_eq!(buf.read_scalar_at::<i64>(8).unwrap(), -9);
        assert_eq!(buf.read_scalar_at::<f32>(16).unwrap(), 1.5);
        assert_eq!(buf.read_scalar_at::<f64>(24).unwrap(), 2.25);
        assert!(buf.read_scalar_at::<bool>(32).unwrap());
    }

    #[test]
    fn little_endian_on_the_wire() {
        let mut buf = ByteBuffer::allocate(16);
        buf.write_scalar_at(0, 0x1122_3344u32).unwrap();
        assert_eq!(&buf.raw()[0..4], &[0x44, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn out_of_bounds_is_reported_not_truncated() {
        let mut buf = ByteBuffer::allocate(16);
        let err = buf.write_scalar_at(14, 0u32).unwrap_err();
        assert_eq!(
            err,
            WireError::OutOfBounds {
                offset: 14,
                width: 4,
                capacity: 16,
            }
        );
        assert!(buf.read_scalar_at::<u64>(12).is_err());
        assert!(buf.write_bytes_at(10, &[0u8; 8]).is_err());
    }

    #[test]
    fn growth_preserves_offsets_from_end() {
        let mut buf = ByteBuffer::allocate(16);
        let pos = buf.make_space(8);
        buf.put_scalar(pos, 0x0102_0304_0506_0708u64);
        let before = buf.data().to_vec();

        // Force several doublings.
        buf.make_space(100);
        assert!(buf.capacity() >= 108);
        let data = buf.data();
        assert_eq!(&data[data.len() - 8..], &before[..]);
    }

    #[test]
    fn make_space_moves_cursor_down() {
        let mut buf = ByteBuffer::allocate(32);
        assert_eq!(buf.position(), 32);
        let pos = buf.make_space(4);
        assert_eq!(pos, 28);
        assert_eq!(buf.position(), 28);
        assert_eq!(buf.used_bytes(), 4);
    }

    #[test]
    fn reset_zeroes_and_rewinds() {
        let mut buf = ByteBuffer::allocate(16);
        let pos = buf.make_space(4);
        buf.put_scalar(pos, 0xFFFF_FFFFu32);
        buf.reset();
        assert_eq!(buf.used_bytes(), 0);
        assert!(buf.raw().iter().all(|&b| b == 0));
    }
}
