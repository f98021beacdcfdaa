//! Error taxonomy for the pack codec.
//!
//! A plain enum, a hand-written `Display`, and a `From<std::io::Error>`
//! bridge so `?` composes across the source/sink boundary. No
//! `thiserror` — this crate carries no dependency beyond `tracing`.

use std::fmt;

/// Malformed wire data. Once one of these is returned, the pack being
/// read is untrusted from that point on; there is no partial recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The input source ran out of bytes before a tag, varint, or
    /// payload could be fully decoded.
    UnexpectedEnd,
    /// A varint ran past its 10-byte maximum without a terminating byte.
    UnterminatedVarint,
    /// The tag byte's high nibble does not name one of the twelve known
    /// types.
    InvalidType(u8),
    /// The decoded tag's type did not match the type requested on a
    /// non-peek read.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// `obj_end`/`array_end` was called but the frame on top of the
    /// stack is not the expected kind (or there is no open frame at
    /// all).
    WrongContainer {
        expected: &'static str,
        found: &'static str,
    },
    /// A read requested `id`, but the frame has already advanced past it
    /// (`id <= id_last`).
    IdAlreadyConsumed { id: u64, id_last: u64 },
    /// A non-peek read for `id` ran past the end of the frame with no
    /// default supplied (the terminator, or a later id, was reached
    /// first).
    IdNotFound { id: u64 },
    /// A `str` payload was not valid UTF-8.
    InvalidUtf8,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::UnexpectedEnd => write!(f, "unexpected end of input"),
            FormatError::UnterminatedVarint => write!(f, "varint exceeded 10 bytes without terminating"),
            FormatError::InvalidType(b) => write!(f, "invalid tag type nibble: {:#04x}", b),
            FormatError::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            FormatError::WrongContainer { expected, found } => {
                write!(f, "not in {expected} (found {found})")
            }
            FormatError::IdAlreadyConsumed { id, id_last } => {
                write!(f, "requested id {id} is not greater than id_last {id_last}")
            }
            FormatError::IdNotFound { id } => write!(f, "id {id} does not exist in this frame"),
            FormatError::InvalidUtf8 => write!(f, "string payload is not valid UTF-8"),
        }
    }
}

/// Contract violations by the caller. These indicate a bug in the
/// calling code, not a corrupt pack. Rust has no debug-assert escape
/// hatch a library can lean on across a crate boundary, so these are
/// still returned as `Result`s, but are documented as programmer
/// errors: never retry or recover from one, fix the call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionFailure {
    /// `write_*` was called with an id that does not strictly increase
    /// past `id_last` (and any pending nulls) for the current frame.
    NonIncreasingId { id: u64, id_last: u64 },
    /// `obj_end`/`array_end` was called for the wrong container kind.
    WrongContainer {
        expected: &'static str,
        found: &'static str,
    },
    /// `obj_end`/`array_end` was called with the stack already back at
    /// the root.
    NoOpenFrame,
    /// `end_pack` was called with containers still open.
    OpenFrames { depth: usize },
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssertionFailure::NonIncreasingId { id, id_last } => {
                write!(f, "write id {id} does not strictly increase past id_last {id_last}")
            }
            AssertionFailure::WrongContainer { expected, found } => {
                write!(f, "ended {found} expecting {expected}")
            }
            AssertionFailure::NoOpenFrame => write!(f, "no open frame to end"),
            AssertionFailure::OpenFrames { depth } => {
                write!(f, "end_pack called with {depth} container(s) still open")
            }
        }
    }
}

/// Top-level error for every fallible operation in this crate.
#[derive(Debug)]
pub enum Error {
    /// The pack's wire bytes are malformed.
    Format(FormatError),
    /// The caller violated the reader/writer's usage contract.
    Assertion(AssertionFailure),
    /// The bound source or sink failed. Propagated opaquely, unchanged.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Format(e) => write!(f, "format error: {e}"),
            Error::Assertion(e) => write!(f, "assertion failure: {e}"),
            Error::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FormatError> for Error {
    fn from(e: FormatError) -> Self {
        Error::Format(e)
    }
}

impl From<AssertionFailure> for Error {
    fn from(e: AssertionFailure) -> Self {
        Error::Assertion(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Specialized `Result` for pack codec operations.
pub type Result<T> = std::result::Result<T, Error>;
