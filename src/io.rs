//! Byte-level I/O collaborators and the internal buffering layer.
//!
//! The reader and writer each treat the surrounding byte transport as an
//! external collaborator: a pull-mode [`Source`] for the reader, a
//! push-mode [`Sink`] for the writer. Both are blanket-implemented for
//! any `std::io::Read`/`Write`, so callers bind a `TcpStream`, a
//! `File`, or a `Vec<u8>` cursor directly.
//!
//! Buffering is growable with compaction, and owns its bytes end to end
//! (rather than handing out borrowed slices) since a refill can arrive
//! at any point and must not invalidate data already returned to the
//! caller.

use crate::error::{FormatError, Result};
use std::io;

pub(crate) const DEFAULT_CAPACITY: usize = 4096;

/// A pull-mode byte source. The codec requests exactly the bytes it
/// needs; a short read (`Ok(0)` before enough bytes arrive) is treated
/// as end-of-stream.
pub trait Source {
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<R: io::Read + ?Sized> Source for R {
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }
}

/// A push-mode byte sink: consumes an entire buffer or fails.
pub trait Sink {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;
}

impl<W: io::Write + ?Sized> Sink for W {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        io::Write::write_all(self, buf)
    }
}

/// Growable input buffer with compaction, bound to an optional [`Source`].
///
/// With no source, the buffer is a fixed, fully-populated byte slice
/// (the `from_bytes` construction) and running out of bytes is always
/// `FormatError::UnexpectedEnd`.
pub(crate) struct InputBuffer {
    source: Option<Box<dyn Source>>,
    buf: Vec<u8>,
    pos: usize,
    max: usize,
}

impl InputBuffer {
    pub fn from_source(source: Box<dyn Source>, capacity: usize) -> Self {
        InputBuffer {
            source: Some(source),
            buf: vec![0u8; capacity.max(64)],
            pos: 0,
            max: 0,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let max = bytes.len();
        InputBuffer {
            source: None,
            buf: bytes,
            pos: 0,
            max,
        }
    }

    /// Ensures at least `n` unread bytes are buffered, compacting and
    /// refilling from the bound source as needed.
    fn ensure(&mut self, n: usize) -> Result<()> {
        if self.max - self.pos >= n {
            return Ok(());
        }
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.max, 0);
            self.max -= self.pos;
            self.pos = 0;
        }
        if self.buf.len() < n {
            let grown = self.buf.len().saturating_mul(2).max(n);
            self.buf.resize(grown, 0);
        }
        while self.max < n {
            match self.source.as_mut() {
                None => return Err(FormatError::UnexpectedEnd.into()),
                Some(src) => {
                    let read = src.read_into(&mut self.buf[self.max..])?;
                    if read == 0 {
                        return Err(FormatError::UnexpectedEnd.into());
                    }
                    self.max += read;
                    tracing::trace!(read, buffered = self.max - self.pos, "refilled input buffer");
                }
            }
        }
        Ok(())
    }

    pub fn peek_byte(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf[self.pos])
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        self.ensure(n)?;
        let out = self.buf[self.pos..self.pos + n].to_vec();
        self.pos += n;
        Ok(out)
    }

    /// Discards `n` bytes without copying them out, still going through
    /// the source for any that have not yet arrived.
    pub fn skip_bytes(&mut self, mut n: usize) -> Result<()> {
        while n > 0 {
            let avail = self.max - self.pos;
            if avail == 0 {
                self.ensure(1)?;
                continue;
            }
            let take = avail.min(n);
            self.pos += take;
            n -= take;
        }
        Ok(())
    }
}

/// Push-mode output buffer bound to an optional [`Sink`].
///
/// With no sink, the buffer simply grows (`Vec`'s own doubling) and is
/// handed back whole by [`OutputBuffer::finish`]. With a sink, the
/// buffer is a fixed-size staging area: a write that would overflow it
/// flushes first, and a write larger than the staging area goes
/// straight to the sink once the stage is clear.
pub(crate) struct OutputBuffer {
    sink: Option<Box<dyn Sink>>,
    buf: Vec<u8>,
    cap: usize,
}

impl OutputBuffer {
    pub fn unbound() -> Self {
        OutputBuffer {
            sink: None,
            buf: Vec::with_capacity(256),
            cap: 0,
        }
    }

    pub fn bound(sink: Box<dyn Sink>, capacity: usize) -> Self {
        let cap = capacity.max(1);
        OutputBuffer {
            sink: Some(sink),
            buf: Vec::with_capacity(cap),
            cap,
        }
    }

    pub fn push_byte(&mut self, b: u8) -> Result<()> {
        self.push(&[b])
    }

    pub fn push(&mut self, bytes: &[u8]) -> Result<()> {
        let Some(sink) = self.sink.as_mut() else {
            self.buf.extend_from_slice(bytes);
            return Ok(());
        };
        if bytes.len() > self.cap {
            if !self.buf.is_empty() {
                sink.write_all(&self.buf)?;
                self.buf.clear();
            }
            sink.write_all(bytes)?;
            tracing::trace!(len = bytes.len(), "wrote oversized payload straight through");
            return Ok(());
        }
        if self.buf.len() + bytes.len() > self.cap {
            sink.write_all(&self.buf)?;
            self.buf.clear();
            tracing::trace!("flushed output buffer");
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Flushes any staged bytes to the sink, or hands back the grown
    /// in-memory buffer when unbound.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        match self.sink.as_mut() {
            Some(sink) => {
                if !self.buf.is_empty() {
                    sink.write_all(&self.buf)?;
                    self.buf.clear();
                }
                Ok(Vec::new())
            }
            None => {
                self.buf.shrink_to_fit();
                Ok(self.buf)
            }
        }
    }
}
