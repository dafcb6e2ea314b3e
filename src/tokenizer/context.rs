//! Per-line cached context (§3 "Per-line cached context").
//!
//! The sole mutable state the tokeniser carries between lines: for each
//! already-processed line, its bytes and the kind/value/width/offset of
//! every content token it recorded. A line's cache always stores the
//! *actual* underlying kind (never `Match`) so later lines compare against
//! real values rather than against "was a match" markers.

use std::ops::Range;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StoredKind {
  Alpha,
  Char,
  Digits,
  Digits0,
}

#[derive(Clone, Debug)]
pub(crate) struct TokenRecord {
  pub(crate) kind: StoredKind,
  /// The byte value for `Char`, the numeric value for `Digits`/`Digits0`;
  /// unused for `Alpha`.
  pub(crate) int_val: u32,
  /// The original digit-count (including leading zeros) for `Digits0`;
  /// unused otherwise.
  pub(crate) width: u8,
  /// Byte offset range into the owning `LineContext`'s `bytes`, valid for
  /// `Alpha` (the substring) and for `Digits`/`Digits0` (the printed
  /// decimal text, used to recover `width` implicitly when needed).
  pub(crate) str_range: Range<usize>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct LineContext {
  pub(crate) bytes: Vec<u8>,
  /// `tokens[k]` is the record for token-position `k + 1` (position 0 is
  /// the DUP/DIFF control token and is never cached here).
  pub(crate) tokens: Vec<TokenRecord>,
}
