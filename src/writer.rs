//! The streaming writer façade: typed setters keyed by field id, with
//! default-elision (a value equal to its declared default is written as
//! nothing at all) and automatic sequential ids when the caller passes
//! `0`.

use crate::container::{Frame, Scope};
use crate::error::{AssertionFailure, Result};
use crate::io::{OutputBuffer, Sink, DEFAULT_CAPACITY};
use crate::tag::{encode_header, Type};
use crate::varint;
use crate::zigzag;

/// Builds a pack one field at a time.
pub struct Writer {
    buf: OutputBuffer,
    stack: Vec<Frame>,
}

impl Writer {
    pub fn new(sink: impl Sink + 'static) -> Self {
        Self::with_capacity(sink, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(sink: impl Sink + 'static, capacity: usize) -> Self {
        Writer {
            buf: OutputBuffer::bound(Box::new(sink), capacity),
            stack: vec![Frame::root()],
        }
    }

    /// Builds a writer with no bound sink: bytes accumulate in memory
    /// and are returned whole by `end_pack`.
    pub fn new_buffered() -> Self {
        Writer {
            buf: OutputBuffer::unbound(),
            stack: vec![Frame::root()],
        }
    }

    /// Resolves `0` to "the next sequential id in this frame", folding
    /// in any nulls written since the last real field.
    fn resolve_id(&self, id: u64) -> u64 {
        let frame = self.stack.last().unwrap();
        if id == 0 {
            frame.id_last + frame.null_pending + 1
        } else {
            id
        }
    }

    /// Records a skipped (default-valued) field. Its id is folded into
    /// the next real field's id-delta instead of being written at all.
    pub fn write_null(&mut self) {
        self.stack.last_mut().unwrap().null_pending += 1;
    }

    fn id_delta_for(&self, resolved_id: u64) -> Result<u64> {
        let frame = self.stack.last().unwrap();
        if resolved_id <= frame.id_last {
            return Err(AssertionFailure::NonIncreasingId { id: resolved_id, id_last: frame.id_last }.into());
        }
        Ok(resolved_id - frame.id_last - 1 - frame.null_pending)
    }

    fn advance_frame(&mut self, resolved_id: u64) {
        let frame = self.stack.last_mut().unwrap();
        frame.id_last = resolved_id;
        frame.null_pending = 0;
    }

    fn write_scalar(&mut self, id: u64, ty: Type, value_bits: u64) -> Result<()> {
        let resolved_id = self.resolve_id(id);
        let id_delta = self.id_delta_for(resolved_id)?;
        encode_header(&mut self.buf, ty, id_delta, value_bits)?;
        self.advance_frame(resolved_id);
        Ok(())
    }

    pub fn write_u32(&mut self, id: u64, value: u32, default: Option<u32>) -> Result<()> {
        if default == Some(value) {
            self.write_null();
            return Ok(());
        }
        self.write_scalar(id, Type::U32, value as u64)
    }

    pub fn write_u64(&mut self, id: u64, value: u64, default: Option<u64>) -> Result<()> {
        if default == Some(value) {
            self.write_null();
            return Ok(());
        }
        self.write_scalar(id, Type::U64, value)
    }

    pub fn write_ptr(&mut self, id: u64, value: u64, default: Option<u64>) -> Result<()> {
        if default == Some(value) {
            self.write_null();
            return Ok(());
        }
        self.write_scalar(id, Type::Ptr, value)
    }

    pub fn write_i32(&mut self, id: u64, value: i32, default: Option<i32>) -> Result<()> {
        if default == Some(value) {
            self.write_null();
            return Ok(());
        }
        self.write_scalar(id, Type::I32, zigzag::encode_i32(value) as u64)
    }

    pub fn write_i64(&mut self, id: u64, value: i64, default: Option<i64>) -> Result<()> {
        if default == Some(value) {
            self.write_null();
            return Ok(());
        }
        self.write_scalar(id, Type::I64, zigzag::encode_i64(value))
    }

    /// Seconds since the Unix epoch.
    pub fn write_time(&mut self, id: u64, value: i64, default: Option<i64>) -> Result<()> {
        if default == Some(value) {
            self.write_null();
            return Ok(());
        }
        self.write_scalar(id, Type::Time, zigzag::encode_i64(value))
    }

    pub fn write_bool(&mut self, id: u64, value: bool, default: Option<bool>) -> Result<()> {
        if default == Some(value) {
            self.write_null();
            return Ok(());
        }
        self.write_scalar(id, Type::Bool, value as u64)
    }

    pub fn write_bin(&mut self, id: u64, value: &[u8], default: Option<&[u8]>) -> Result<()> {
        if default == Some(value) {
            self.write_null();
            return Ok(());
        }
        self.write_blob(id, Type::Bin, value)
    }

    pub fn write_str(&mut self, id: u64, value: &str, default: Option<&str>) -> Result<()> {
        if default == Some(value) {
            self.write_null();
            return Ok(());
        }
        self.write_blob(id, Type::Str, value.as_bytes())
    }

    fn write_blob(&mut self, id: u64, ty: Type, bytes: &[u8]) -> Result<()> {
        let resolved_id = self.resolve_id(id);
        let id_delta = self.id_delta_for(resolved_id)?;
        let presence: u64 = if bytes.is_empty() { 0 } else { 1 };
        encode_header(&mut self.buf, ty, id_delta, presence)?;
        if !bytes.is_empty() {
            varint::encode_to(&mut self.buf, bytes.len() as u64)?;
            self.buf.push(bytes)?;
        }
        self.advance_frame(resolved_id);
        Ok(())
    }

    pub fn obj_begin(&mut self, id: u64) -> Result<()> {
        self.begin_container(id, Type::Obj, Scope::Object)
    }

    pub fn array_begin(&mut self, id: u64) -> Result<()> {
        self.begin_container(id, Type::Array, Scope::Array)
    }

    fn begin_container(&mut self, id: u64, ty: Type, scope: Scope) -> Result<()> {
        let resolved_id = self.resolve_id(id);
        let id_delta = self.id_delta_for(resolved_id)?;
        encode_header(&mut self.buf, ty, id_delta, 0)?;
        self.advance_frame(resolved_id);
        self.stack.push(Frame::new(scope));
        tracing::trace!(scope = scope.name(), "opened container");
        Ok(())
    }

    pub fn obj_end(&mut self) -> Result<()> {
        self.end_container(Scope::Object)
    }

    pub fn array_end(&mut self) -> Result<()> {
        self.end_container(Scope::Array)
    }

    fn end_container(&mut self, expected: Scope) -> Result<()> {
        if self.stack.len() <= 1 {
            return Err(AssertionFailure::NoOpenFrame.into());
        }
        let found = self.stack.last().unwrap().scope;
        if found != expected {
            return Err(AssertionFailure::WrongContainer { expected: expected.name(), found: found.name() }.into());
        }
        self.buf.push_byte(0)?;
        self.stack.pop();
        tracing::trace!(scope = expected.name(), "closed container");
        Ok(())
    }

    /// Closes the pack: writes the root terminator and hands back the
    /// fully-assembled bytes (empty when bound to a sink, since
    /// everything has already been flushed).
    pub fn end_pack(mut self) -> Result<Vec<u8>> {
        if self.stack.len() != 1 {
            return Err(AssertionFailure::OpenFrames { depth: self.stack.len() - 1 }.into());
        }
        self.buf.push_byte(0)?;
        self.buf.finish()
    }
}
