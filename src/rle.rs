//! Guarded run-length codec (§4.B).
//!
//! A reserved GUARD byte (233) introduces an escape in the payload:
//! `GUARD 0x00` is a literal GUARD byte, `GUARD <len> <sym>` is a run of
//! `<len>` copies of `<sym>` (len a little-endian 7-bit varint). Runs
//! shorter than [`RLE_MIN_RUN`] are left verbatim since the escape would
//! cost more than it saves.
//!
//! This module owns only the body after the meta-codec's tag byte: a
//! varint uncompressed length, then the guarded payload.

use crate::constants::{RLE_GUARD, RLE_MIN_RUN};
use crate::errors::CodecError;
use crate::varint;

/// Compresses `input` into a self-delimiting (length-prefixed) blob.
pub fn compress(input: &[u8]) -> Vec<u8> {
  let mut out = Vec::new();
  varint::write(&mut out, input.len() as u64);

  let n = input.len();
  let mut i = 0usize;
  while i < n {
    let b = input[i];
    let mut run = 1usize;
    while i + run < n && input[i + run] == b {
      run += 1;
    }

    if b == RLE_GUARD {
      // Every literal GUARD byte, whether part of a short run or not,
      // must itself be escaped; a run of GUARD bytes is still cheaper to
      // encode as a run than as that many individual escapes.
      if run >= RLE_MIN_RUN {
        out.push(RLE_GUARD);
        varint::write(&mut out, run as u64);
        out.push(b);
      } else {
        for _ in 0..run {
          out.push(RLE_GUARD);
          out.push(0x00);
        }
      }
    } else if run >= RLE_MIN_RUN {
      out.push(RLE_GUARD);
      varint::write(&mut out, run as u64);
      out.push(b);
    } else {
      for _ in 0..run {
        out.push(b);
      }
    }
    i += run;
  }
  out
}

/// Decompresses a blob produced by [`compress`]. Returns the decoded
/// bytes and the total number of input bytes consumed.
pub fn decompress(buf: &[u8]) -> Result<(Vec<u8>, usize), CodecError> {
  let (out_len, used) = varint::read(buf)?;
  let out_len = out_len as usize;
  let mut pos = used;
  let mut out = Vec::with_capacity(out_len);

  while out.len() < out_len {
    let b = *buf
      .get(pos)
      .ok_or_else(|| CodecError::truncated_input("rle payload ended mid-stream"))?;
    pos += 1;
    if b != RLE_GUARD {
      out.push(b);
      continue;
    }
    let marker = *buf
      .get(pos)
      .ok_or_else(|| CodecError::truncated_input("rle payload ended after guard byte"))?;
    if marker == 0x00 {
      pos += 1;
      out.push(RLE_GUARD);
    } else {
      let (run, run_used) = varint::read(&buf[pos..])?;
      pos += run_used;
      let sym = *buf
        .get(pos)
        .ok_or_else(|| CodecError::truncated_input("rle run missing symbol byte"))?;
      pos += 1;
      out.resize(out.len() + run as usize, sym);
    }
  }

  if out.len() != out_len {
    return Err(CodecError::malformed_table("rle run overshot declared length"));
  }
  Ok((out, pos))
}
