//! The streaming reader façade: one tag of lookahead, typed getters
//! keyed by field id, and id-delta-aware skipping so a reader built
//! against an older schema silently steps over fields it doesn't know.

use crate::container::{Frame, Scope};
use crate::error::{FormatError, Result};
use crate::io::{InputBuffer, Source, DEFAULT_CAPACITY};
use crate::tag::{decode_header, skip_body, Type};
use crate::varint;
use crate::zigzag;

#[derive(Debug, Clone, Copy)]
struct Cached {
    ty: Type,
    /// Absolute id, or `u64::MAX` standing in for "no more fields" (the
    /// terminator was reached).
    id: u64,
    value_bits: u64,
}

enum Lookup {
    Present,
    Absent,
}

/// Pulls a pack apart one field at a time.
///
/// A `Reader` always has exactly one tag decoded and cached ("the next
/// tag"); [`Reader::id`], [`Reader::type_`] and [`Reader::null`] inspect
/// it without consuming anything. Every other operation — the typed
/// `read_*` methods, `obj_begin`/`array_begin`, `next` — advances past
/// it, skipping forward through any fields the caller doesn't ask for
/// by id.
pub struct Reader {
    buf: InputBuffer,
    stack: Vec<Frame>,
    cache: Option<Cached>,
    /// True once a tag has been decoded into `cache` that has not yet
    /// been consumed (by a matching read) or explicitly skipped.
    pending_skip: bool,
}

impl Reader {
    pub fn new(source: impl Source + 'static) -> Result<Self> {
        Self::with_capacity(source, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(source: impl Source + 'static, capacity: usize) -> Result<Self> {
        let mut r = Reader {
            buf: InputBuffer::from_source(Box::new(source), capacity),
            stack: vec![Frame::root()],
            cache: None,
            pending_skip: false,
        };
        r.step()?;
        Ok(r)
    }

    /// Builds a reader over an in-memory pack with no bound source; a
    /// short read is always `FormatError::UnexpectedEnd`.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mut r = Reader {
            buf: InputBuffer::from_bytes(bytes),
            stack: vec![Frame::root()],
            cache: None,
            pending_skip: false,
        };
        r.step()?;
        Ok(r)
    }

    /// Id of the cached next field, or `u64::MAX` if the frame's
    /// terminator has been reached.
    pub fn id(&self) -> u64 {
        self.cache.map(|c| c.id).unwrap_or(u64::MAX)
    }

    /// Type of the cached next field (`Type::Unknown` at a terminator).
    pub fn type_(&self) -> Type {
        self.cache.map(|c| c.ty).unwrap_or(Type::Unknown)
    }

    /// True if `id` is absent on the wire (a later id, or the
    /// terminator, has already been cached). Does not consume anything.
    pub fn null(&self, id: u64) -> bool {
        id < self.id()
    }

    /// Decodes the next tag into the cache, skipping the currently
    /// cached field first if it was never consumed. Returns `false` once
    /// the terminator has been reached.
    pub fn next(&mut self) -> Result<bool> {
        self.step()?;
        Ok(self.type_() != Type::Unknown)
    }

    fn step(&mut self) -> Result<()> {
        if self.pending_skip {
            let cached = self.cache.expect("pending_skip implies a populated cache");
            skip_body(&mut self.buf, cached.ty, cached.value_bits)?;
            if cached.ty != Type::Unknown {
                self.stack.last_mut().unwrap().id_last = cached.id;
            }
        }
        let id_last = self.stack.last().unwrap().id_last;
        let (ty, id_delta, value_bits) = decode_header(&mut self.buf)?;
        self.cache = Some(if ty == Type::Unknown {
            Cached { ty, id: u64::MAX, value_bits: 0 }
        } else {
            Cached { ty, id: id_last + id_delta + 1, value_bits }
        });
        self.pending_skip = true;
        Ok(())
    }

    fn locate(&mut self, id: u64) -> Result<Lookup> {
        let id_last = self.stack.last().unwrap().id_last;
        if id <= id_last {
            return Err(FormatError::IdAlreadyConsumed { id, id_last }.into());
        }
        loop {
            let cached = self.cache.expect("reader cache is always populated after construction");
            if cached.ty == Type::Unknown {
                return Ok(Lookup::Absent);
            }
            match cached.id.cmp(&id) {
                std::cmp::Ordering::Less => self.step()?,
                std::cmp::Ordering::Equal => return Ok(Lookup::Present),
                std::cmp::Ordering::Greater => return Ok(Lookup::Absent),
            }
        }
    }

    fn mark_absent(&mut self, id: u64) {
        self.stack.last_mut().unwrap().id_last = id;
    }

    /// Marks the cached field consumed (it will not be skipped by the
    /// next `step`) and advances `id_last` to it. Returns the cache
    /// entry so the caller can pull `value_bits` or read a deferred
    /// length-prefixed payload before calling `step` itself.
    fn consume_scalar(&mut self, id: u64) -> Cached {
        let cached = self.cache.expect("Lookup::Present implies a populated cache");
        self.stack.last_mut().unwrap().id_last = id;
        self.pending_skip = false;
        cached
    }

    fn type_mismatch(expected: Type, found: Type) -> crate::error::Error {
        FormatError::TypeMismatch { expected: expected.name(), found: found.name() }.into()
    }

    pub fn read_u32(&mut self, id: u64, default: Option<u32>) -> Result<u32> {
        self.read_multibit(id, Type::U32, default, |v| v as u32)
    }

    pub fn read_u64(&mut self, id: u64, default: Option<u64>) -> Result<u64> {
        self.read_multibit(id, Type::U64, default, |v| v)
    }

    pub fn read_ptr(&mut self, id: u64, default: Option<u64>) -> Result<u64> {
        self.read_multibit(id, Type::Ptr, default, |v| v)
    }

    pub fn read_i32(&mut self, id: u64, default: Option<i32>) -> Result<i32> {
        self.read_multibit(id, Type::I32, default, |v| zigzag::decode_i32(v as u32))
    }

    pub fn read_i64(&mut self, id: u64, default: Option<i64>) -> Result<i64> {
        self.read_multibit(id, Type::I64, default, zigzag::decode_i64)
    }

    /// Seconds since the Unix epoch.
    pub fn read_time(&mut self, id: u64, default: Option<i64>) -> Result<i64> {
        self.read_multibit(id, Type::Time, default, zigzag::decode_i64)
    }

    fn read_multibit<T: Copy>(
        &mut self,
        id: u64,
        expected: Type,
        default: Option<T>,
        decode_value: impl FnOnce(u64) -> T,
    ) -> Result<T> {
        match self.locate(id)? {
            Lookup::Absent => match default {
                Some(d) => {
                    self.mark_absent(id);
                    Ok(d)
                }
                None => Err(FormatError::IdNotFound { id }.into()),
            },
            Lookup::Present => {
                let cached = self.cache.unwrap();
                if cached.ty != expected {
                    return Err(Self::type_mismatch(expected, cached.ty));
                }
                let cached = self.consume_scalar(id);
                let value = decode_value(cached.value_bits);
                self.step()?;
                Ok(value)
            }
        }
    }

    pub fn read_bool(&mut self, id: u64, default: Option<bool>) -> Result<bool> {
        match self.locate(id)? {
            Lookup::Absent => match default {
                Some(d) => {
                    self.mark_absent(id);
                    Ok(d)
                }
                None => Err(FormatError::IdNotFound { id }.into()),
            },
            Lookup::Present => {
                let cached = self.cache.unwrap();
                if cached.ty != Type::Bool {
                    return Err(Self::type_mismatch(Type::Bool, cached.ty));
                }
                let cached = self.consume_scalar(id);
                let value = cached.value_bits != 0;
                self.step()?;
                Ok(value)
            }
        }
    }

    pub fn read_bin(&mut self, id: u64, default: Option<Vec<u8>>) -> Result<Vec<u8>> {
        match self.locate(id)? {
            Lookup::Absent => match default {
                Some(d) => {
                    self.mark_absent(id);
                    Ok(d)
                }
                None => Err(FormatError::IdNotFound { id }.into()),
            },
            Lookup::Present => {
                let cached = self.cache.unwrap();
                if cached.ty != Type::Bin {
                    return Err(Self::type_mismatch(Type::Bin, cached.ty));
                }
                let bytes = if cached.value_bits != 0 {
                    let len = varint::decode(&mut self.buf)? as usize;
                    self.buf.read_exact(len)?
                } else {
                    Vec::new()
                };
                self.consume_scalar(id);
                self.step()?;
                Ok(bytes)
            }
        }
    }

    pub fn read_str(&mut self, id: u64, default: Option<String>) -> Result<String> {
        match self.locate(id)? {
            Lookup::Absent => match default {
                Some(d) => {
                    self.mark_absent(id);
                    Ok(d)
                }
                None => Err(FormatError::IdNotFound { id }.into()),
            },
            Lookup::Present => {
                let cached = self.cache.unwrap();
                if cached.ty != Type::Str {
                    return Err(Self::type_mismatch(Type::Str, cached.ty));
                }
                let bytes = if cached.value_bits != 0 {
                    let len = varint::decode(&mut self.buf)? as usize;
                    self.buf.read_exact(len)?
                } else {
                    Vec::new()
                };
                let value = String::from_utf8(bytes).map_err(|_| FormatError::InvalidUtf8)?;
                self.consume_scalar(id);
                self.step()?;
                Ok(value)
            }
        }
    }

    pub fn obj_begin(&mut self, id: u64) -> Result<()> {
        self.begin_container(id, Type::Obj, Scope::Object)
    }

    pub fn array_begin(&mut self, id: u64) -> Result<()> {
        self.begin_container(id, Type::Array, Scope::Array)
    }

    fn begin_container(&mut self, id: u64, expected_ty: Type, scope: Scope) -> Result<()> {
        match self.locate(id)? {
            Lookup::Absent => Err(FormatError::IdNotFound { id }.into()),
            Lookup::Present => {
                let cached = self.cache.unwrap();
                if cached.ty != expected_ty {
                    return Err(Self::type_mismatch(expected_ty, cached.ty));
                }
                self.consume_scalar(id);
                self.stack.push(Frame::new(scope));
                self.step()?;
                tracing::trace!(scope = scope.name(), "entered container");
                Ok(())
            }
        }
    }

    pub fn obj_end(&mut self) -> Result<()> {
        self.end_container(Scope::Object)
    }

    pub fn array_end(&mut self) -> Result<()> {
        self.end_container(Scope::Array)
    }

    fn end_container(&mut self, expected: Scope) -> Result<()> {
        if self.stack.len() <= 1 {
            return Err(FormatError::WrongContainer { expected: expected.name(), found: "root" }.into());
        }
        let found = self.stack.last().unwrap().scope;
        if found != expected {
            return Err(FormatError::WrongContainer { expected: expected.name(), found: found.name() }.into());
        }
        self.drain_current_frame()?;
        self.stack.pop();
        self.step()?;
        tracing::trace!(scope = expected.name(), "left container");
        Ok(())
    }

    fn drain_current_frame(&mut self) -> Result<()> {
        loop {
            let cached = self.cache.expect("reader cache is always populated");
            if cached.ty == Type::Unknown {
                return Ok(());
            }
            self.step()?;
        }
    }

    /// Drains any fields (and any still-open nested containers) left
    /// unread, then consumes the pack's closing terminator.
    pub fn end_pack(&mut self) -> Result<()> {
        while self.stack.len() > 1 {
            self.drain_current_frame()?;
            self.stack.pop();
            self.step()?;
        }
        self.drain_current_frame()
    }
}
