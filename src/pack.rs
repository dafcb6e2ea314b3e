//! Bit-packing codec for small alphabets (§4.C).
//!
//! Distinct input bytes are assigned codes `0..|S|` in ascending byte
//! value order, then packed `mode` codes per output byte (`8/mode` bits
//! each), high bits first. Mode 1 means "stored raw" (alphabet too
//! large, or packing wasn't worth it); mode 0 means a single repeated
//! symbol with no packed payload at all.
//!
//! This module owns only the body after the meta-codec's tag byte: a
//! varint uncompressed length, a mode byte, a length-prefixed dictionary,
//! then the packed (or raw) data. The dictionary is length-prefixed
//! rather than terminator-delimited because byte value 0x00 can itself
//! be a member of the packed alphabet (it sorts first), which would
//! collide with a bare 0x00 terminator.

use crate::constants::PACK_MAX_ALPHABET;
use crate::errors::CodecError;
use crate::varint;

fn alphabet(input: &[u8]) -> Vec<u8> {
  let mut present = [false; 256];
  for &b in input {
    present[b as usize] = true;
  }
  (0u16..256).filter(|&j| present[j as usize]).map(|j| j as u8).collect()
}

fn choose_mode(alphabet_size: usize) -> u8 {
  if alphabet_size <= 1 {
    0
  } else if alphabet_size <= 2 {
    8
  } else if alphabet_size <= 4 {
    4
  } else if alphabet_size <= PACK_MAX_ALPHABET {
    2
  } else {
    1
  }
}

/// Compresses `input` into a self-delimiting (length-prefixed) blob.
/// Falls back to mode 1 (raw storage) whenever the alphabet exceeds
/// [`PACK_MAX_ALPHABET`] distinct values.
pub fn compress(input: &[u8]) -> Vec<u8> {
  let alpha = alphabet(input);
  let mode = choose_mode(alpha.len());

  let mut out = Vec::new();
  varint::write(&mut out, input.len() as u64);
  out.push(mode);

  if mode == 1 {
    out.extend_from_slice(input);
    return out;
  }

  let mut code = [0u8; 256];
  for (c, &sym) in alpha.iter().enumerate() {
    code[sym as usize] = c as u8;
  }
  out.push(alpha.len() as u8);
  out.extend_from_slice(&alpha);

  if mode == 0 {
    return out;
  }

  let per_byte = mode as usize; // codes per output byte
  let bits = 8 / mode as u32; // bits per code

  let mut chunk = input.chunks_exact(per_byte);
  for group in &mut chunk {
    let mut packed = 0u8;
    for &sym in group {
      packed = (packed << bits) | code[sym as usize];
    }
    out.push(packed);
  }
  let rem = chunk.remainder();
  if !rem.is_empty() {
    let mut packed = 0u8;
    for i in 0..per_byte {
      let c = if i < rem.len() { code[rem[i] as usize] } else { 0 };
      packed = (packed << bits) | c;
    }
    out.push(packed);
  }
  out
}

/// Decompresses a blob produced by [`compress`]. Returns the decoded
/// bytes and the total number of input bytes consumed.
pub fn decompress(buf: &[u8]) -> Result<(Vec<u8>, usize), CodecError> {
  let (out_len, used) = varint::read(buf)?;
  let out_len = out_len as usize;
  let mut pos = used;

  let mode = *buf
    .get(pos)
    .ok_or_else(|| CodecError::truncated_input("pack blob missing mode byte"))?;
  pos += 1;

  if mode == 1 {
    let data = buf
      .get(pos..pos + out_len)
      .ok_or_else(|| CodecError::truncated_input("pack raw payload truncated"))?;
    pos += out_len;
    return Ok((data.to_vec(), pos));
  }

  let dict_len = *buf
    .get(pos)
    .ok_or_else(|| CodecError::truncated_input("pack blob missing dictionary length"))? as usize;
  pos += 1;
  let dict = buf
    .get(pos..pos + dict_len)
    .ok_or_else(|| CodecError::truncated_input("pack dictionary truncated"))?
    .to_vec();
  pos += dict_len;

  if mode == 0 {
    if out_len == 0 {
      return Ok((Vec::new(), pos));
    }
    let sym = *dict
      .first()
      .ok_or_else(|| CodecError::malformed_table("pack mode 0 dictionary is empty"))?;
    return Ok((vec![sym; out_len], pos));
  }

  let per_byte = mode as usize; // codes per input byte
  let bits = 8 / mode as u32;
  let code_mask = (1u8 << bits) - 1;

  let mut out = Vec::with_capacity(out_len);
  while out.len() < out_len {
    let packed = *buf
      .get(pos)
      .ok_or_else(|| CodecError::truncated_input("pack packed payload truncated"))?;
    pos += 1;
    let remaining = out_len - out.len();
    let take = per_byte.min(remaining);
    for slot in 0..take {
      let shift = bits * (per_byte as u32 - 1 - slot as u32);
      let c = (packed >> shift) & code_mask;
      let sym = *dict
        .get(c as usize)
        .ok_or_else(|| CodecError::malformed_table("pack code out of dictionary range"))?;
      out.push(sym);
    }
  }
  Ok((out, pos))
}
