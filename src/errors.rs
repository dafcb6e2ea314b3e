use std::error::Error;
use std::fmt::{Display, Formatter};
use std::{fmt, io};

/// The different kinds of errors this crate can return.
///
/// There is no recovery once one of these is produced: the block that
/// produced it is abandoned and no further output is generated for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
  /// The caller-supplied output buffer was too small for the operation.
  ShortBuffer,
  /// A meta-codec blob's leading tag byte does not name a known codec.
  InvalidTag,
  /// An rANS frequency table failed to reconstruct to a consistent state
  /// (totals don't sum to the expected scale, or a symbol lookup misses).
  MalformedTable,
  /// A compressed stream, or a tokenised name stream, ended before the
  /// decoder reached a terminator it expected (an END token, a flush
  /// state, a declared length).
  TruncatedInput,
  /// A read name contained a byte with the high bit set, or some other
  /// byte outside the 7-bit ASCII names are assumed to be encoded in.
  BadInput,
  /// A requested allocation was refused.
  AllocFail,
  /// Propagated from a `Read`/`Write` implementation passed to the
  /// framing helpers.
  Io(io::ErrorKind),
}

/// The error type used throughout this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecError {
  pub kind: ErrorKind,
  pub message: String,
}

impl CodecError {
  pub(crate) fn new<S: AsRef<str>>(kind: ErrorKind, message: S) -> Self {
    CodecError {
      kind,
      message: message.as_ref().to_string(),
    }
  }

  pub(crate) fn invalid_tag<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::InvalidTag, message)
  }

  pub(crate) fn malformed_table<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::MalformedTable, message)
  }

  pub(crate) fn truncated_input<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::TruncatedInput, message)
  }

  pub(crate) fn bad_input<S: AsRef<str>>(message: S) -> Self {
    Self::new(ErrorKind::BadInput, message)
  }
}

impl Display for CodecError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "seqid-codec {:?} error: {}", self.kind, &self.message)
  }
}

impl From<io::Error> for CodecError {
  fn from(err: io::Error) -> Self {
    CodecError {
      kind: ErrorKind::Io(err.kind()),
      message: format!("{}", err),
    }
  }
}

impl Error for CodecError {}

pub type CodecResult<T> = Result<T, CodecError>;
