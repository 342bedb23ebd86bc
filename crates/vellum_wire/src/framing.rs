//! # Size-Prefixed Framing
//!
//! Delimits whole buffers on a stream transport.
//!
//! ## Frame Layout
//!
//! ```text
//! ┌──────────────┬─────────────────────────┬──────────────┬─────────┐
//! │ len A: u32   │ buffer A (len A bytes)  │ len B: u32   │ ...     │
//! └──────────────┴─────────────────────────┴──────────────┴─────────┘
//! ```
//!
//! The prefix counts exactly the bytes of the buffer that follows it,
//! never itself.
//!
//! ## Restartability
//!
//! [`read_frames`] walks an in-memory byte run and reports how far it got:
//! a transport accumulating a receive buffer consumes whole frames, drops
//! the consumed prefix via [`Frames::consumed`], and re-enters once more
//! bytes arrive. [`FrameReader`] does the same over a blocking [`std::io::Read`].

use std::io::Read;

use thiserror::Error;
use tracing::trace;

use crate::builder::SIZE_PREFIX_LEN;
use crate::error::{WireError, WireResult};

/// Errors produced while pulling frames off an I/O stream.
#[derive(Error, Debug)]
pub enum FrameReadError {
    /// The underlying transport failed.
    #[error("transport error while reading frame: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended mid-frame.
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Wraps a finished buffer in a length prefix.
#[must_use]
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(SIZE_PREFIX_LEN + payload.len());
    frame_into(payload, &mut framed);
    framed
}

/// Appends a length prefix plus `payload` to `out`.
///
/// Senders batching several messages into one write call this repeatedly on
/// the same sink.
///
/// # Panics
///
/// If `payload` exceeds the u32 length prefix.
pub fn frame_into(payload: &[u8], out: &mut Vec<u8>) {
    assert!(
        payload.len() <= u32::MAX as usize,
        "frame of {} bytes exceeds the u32 length prefix",
        payload.len()
    );
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
}

/// Lazily splits an in-memory byte run into complete frames.
///
/// Yields one `Ok(frame)` per complete frame, zero-copy. If the run ends
/// mid-frame the iterator yields a single [`WireError::Truncated`] and
/// fuses; [`Frames::consumed`] then tells the transport where the incomplete
/// tail begins so it can await more data and restart from there.
#[must_use]
pub fn read_frames(buf: &[u8]) -> Frames<'_> {
    Frames { buf, pos: 0, done: false }
}

/// Iterator state for [`read_frames`].
#[derive(Debug)]
pub struct Frames<'a> {
    buf: &'a [u8],
    pos: usize,
    done: bool,
}

impl Frames<'_> {
    /// Bytes consumed by fully yielded frames.
    #[inline]
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = WireResult<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos == self.buf.len() {
            self.done = true;
            return None;
        }

        let remaining = self.buf.len() - self.pos;
        if remaining < SIZE_PREFIX_LEN {
            self.done = true;
            return Some(Err(WireError::Truncated {
                expected: SIZE_PREFIX_LEN,
                available: remaining,
            }));
        }

        let mut raw = [0u8; SIZE_PREFIX_LEN];
        raw.copy_from_slice(&self.buf[self.pos..self.pos + SIZE_PREFIX_LEN]);
        let declared = u32::from_le_bytes(raw) as usize;

        let start = self.pos + SIZE_PREFIX_LEN;
        let available = self.buf.len() - start;
        if declared > available {
            self.done = true;
            return Some(Err(WireError::Truncated {
                expected: declared,
                available,
            }));
        }

        self.pos = start + declared;
        trace!(bytes = declared, "frame read");
        Some(Ok(&self.buf[start..start + declared]))
    }
}

/// Pulls complete frames off a blocking byte stream.
///
/// Ends cleanly (`None`) only at a frame boundary; a stream that dies
/// mid-frame yields [`WireError::Truncated`] wrapped in
/// [`FrameReadError::Wire`].
#[derive(Debug)]
pub struct FrameReader<R: Read> {
    inner: R,
}

impl<R: Read> FrameReader<R> {
    /// Wraps a byte stream.
    pub const fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Releases the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads exactly `buf.len()` bytes, reporting how many arrived before
    /// end-of-stream.
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize, std::io::Error> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<Vec<u8>, FrameReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut prefix = [0u8; SIZE_PREFIX_LEN];
        match self.read_full(&mut prefix) {
            Ok(0) => return None, // clean end at a frame boundary
            Ok(n) if n < SIZE_PREFIX_LEN => {
                return Some(Err(WireError::Truncated {
                    expected: SIZE_PREFIX_LEN,
                    available: n,
                }
                .into()));
            }
            Ok(_) => {}
            Err(e) => return Some(Err(e.into())),
        }

        let declared = u32::from_le_bytes(prefix) as usize;
        let mut payload = vec![0u8; declared];
        match self.read_full(&mut payload) {
            Ok(n) if n < declared => Some(Err(WireError::Truncated {
                expected: declared,
                available: n,
            }
            .into())),
            Ok(_) => {
                trace!(bytes = declared, "frame read");
                Some(Ok(payload))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}
