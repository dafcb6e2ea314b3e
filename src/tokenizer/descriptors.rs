//! Per-(position, type) byte-stream storage (§3 "Descriptor").
//!
//! A block's tokeniser output is up to `MAX_TOKENS * MAX_TOKEN_TYPES`
//! independent append-only buffers. Encode only ever appends; decode reads
//! each stream back with its own cursor (see `decode.rs`).

use crate::constants::MAX_DESCRIPTORS;

/// All descriptor streams for one block. Indexed by `(position << 4) | type`.
pub struct Descriptors {
  streams: Vec<Vec<u8>>,
}

impl Descriptors {
  pub(crate) fn new() -> Self {
    Descriptors {
      streams: vec![Vec::new(); MAX_DESCRIPTORS],
    }
  }

  pub(crate) fn index(position: usize, ttype: u8) -> usize {
    (position << 4) | ttype as usize
  }

  pub(crate) fn push_byte(&mut self, position: usize, ttype: u8, byte: u8) {
    self.streams[Self::index(position, ttype)].push(byte);
  }

  pub(crate) fn extend(&mut self, position: usize, ttype: u8, bytes: &[u8]) {
    self.streams[Self::index(position, ttype)].extend_from_slice(bytes);
  }

  pub(crate) fn stream(&self, position: usize, ttype: u8) -> &[u8] {
    &self.streams[Self::index(position, ttype)]
  }

  /// Builds an empty set of descriptors sized to receive decoded streams
  /// before `decode_block` reads them back (e.g. after the framing layer
  /// has decompressed each non-empty blob via the meta-codec).
  pub fn empty() -> Self {
    Self::new()
  }

  /// Overwrites the raw bytes backing descriptor `index` (`(position << 4)
  /// | ttype`), as produced by the framing layer's per-descriptor decode.
  pub fn set_raw(&mut self, index: usize, data: Vec<u8>) {
    self.streams[index] = data;
  }

  /// Iterates the non-empty descriptor streams as `(index, bytes)` pairs,
  /// in ascending index order, for the framing layer to compress and emit.
  pub fn non_empty(&self) -> impl Iterator<Item = (usize, &[u8])> {
    self
      .streams
      .iter()
      .enumerate()
      .filter(|(_, s)| !s.is_empty())
      .map(|(i, s)| (i, s.as_slice()))
  }

  pub fn stream_count(&self) -> usize {
    self.streams.len()
  }
}
