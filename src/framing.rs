//! Block-level wire format (§6): the thin layer that turns a tokeniser's
//! [`Descriptors`] into the byte stream the out-of-scope packing CLI reads
//! and writes, and back. Mirrors how `pco`'s own `standalone` module sits
//! immediately below its (also out-of-scope) CLI: fully owned by this
//! crate, but deliberately ignorant of files, stdin, or argument parsing.
//!
//! Layout (§6):
//!
//! ```text
//! uint32_le total_size
//! repeat until total_size consumed:
//!   uint8 ttype          # 0 introduces a new token position
//!   if ttype == 255:     # duplicate-reference form
//!     uint16_le j        # index of an earlier entry with identical bytes
//!     uint8 ttype_real    # the ttype this entry actually carries
//!   else:
//!     <meta-codec blob>
//! ```
//!
//! A position's descriptors are never reordered: [`Descriptors::non_empty`]
//! already yields them in ascending `(position, type)` order, and every
//! position that wrote any payload stream also wrote its type-tag stream
//! (type 0), so the implicit "ttype 0 advances the position counter" rule
//! in §6 holds without this layer needing to track positions itself.

use crate::config::MetaCodecConfig;
use crate::errors::CodecError;
use crate::meta;
use crate::tokenizer::Descriptors;
use crate::varint;
use crate::CodecResult;

const DUP_TTYPE: u8 = 255;
const ENVELOPE_TAG: u8 = 0xff;

/// Encodes every non-empty descriptor of `desc` into the §6 block wire
/// format. Descriptors whose raw bytes are byte-identical to an
/// already-emitted descriptor are written as a `ttype=255` back-reference
/// instead of being compressed twice.
pub fn encode_block(desc: &Descriptors, cfg: MetaCodecConfig) -> Vec<u8> {
  let mut body = Vec::new();
  let mut seen: Vec<(&[u8], u16)> = Vec::new();
  let mut entry_idx: u16 = 0;

  for (index, bytes) in desc.non_empty() {
    let ttype = (index & 0xf) as u8;
    match seen.iter().find(|&&(seen_bytes, _)| seen_bytes == bytes) {
      Some(&(_, j)) => {
        body.push(DUP_TTYPE);
        body.extend_from_slice(&j.to_le_bytes());
        body.push(ttype);
      }
      None => {
        body.push(ttype);
        body.extend(meta::compress(bytes, cfg));
        seen.push((bytes, entry_idx));
      }
    }
    entry_idx += 1;
  }

  let mut out = Vec::with_capacity(4 + body.len());
  out.extend_from_slice(&(body.len() as u32).to_le_bytes());
  out.extend(body);
  out
}

/// Decodes a §6 block into its `(position, type, bytes)` entries, in the
/// order they occupy the stream. The tokeniser's decode side only needs
/// these fed into a [`Descriptors`] (see [`descriptors_from_entries`]); the
/// raw tuples are exposed too since the out-of-scope packing CLI consumes
/// this layer's output directly without going through the tokeniser.
pub fn decode_block(buf: &[u8]) -> CodecResult<Vec<(u8, u8, Vec<u8>)>> {
  if buf.len() < 4 {
    return Err(CodecError::truncated_input("block header missing total-size field"));
  }
  let total = u32::from_le_bytes(buf[..4].try_into().unwrap()) as usize;
  let body = buf
    .get(4..4 + total)
    .ok_or_else(|| CodecError::truncated_input("block body shorter than its declared total_size"))?;

  let mut entries: Vec<(u8, u8, Vec<u8>)> = Vec::new();
  let mut pos: u8 = 0;
  let mut cursor = 0usize;

  while cursor < body.len() {
    let ttype = body[cursor];
    cursor += 1;

    if ttype == DUP_TTYPE {
      let j = u16::from_le_bytes(
        body
          .get(cursor..cursor + 2)
          .ok_or_else(|| CodecError::truncated_input("dup-reference entry missing index field"))?
          .try_into()
          .unwrap(),
      ) as usize;
      cursor += 2;
      let ttype_real = *body
        .get(cursor)
        .ok_or_else(|| CodecError::truncated_input("dup-reference entry missing real-type byte"))?;
      cursor += 1;
      let bytes = entries
        .get(j)
        .ok_or_else(|| CodecError::malformed_table("dup-reference index out of range"))?
        .2
        .clone();
      entries.push((pos, ttype_real, bytes));
      if ttype_real == 0 {
        pos = pos
          .checked_add(1)
          .ok_or_else(|| CodecError::malformed_table("token position exceeded the 7-bit bound"))?;
      }
    } else {
      let (data, used) = meta::decompress(&body[cursor..])?;
      cursor += used;
      entries.push((pos, ttype, data));
      if ttype == 0 {
        pos = pos
          .checked_add(1)
          .ok_or_else(|| CodecError::malformed_table("token position exceeded the 7-bit bound"))?;
      }
    }
  }

  Ok(entries)
}

/// Assembles the `(position, type, bytes)` entries from [`decode_block`]
/// back into a [`Descriptors`] the tokeniser's decode side can read.
pub fn descriptors_from_entries(entries: Vec<(u8, u8, Vec<u8>)>) -> Descriptors {
  let mut desc = Descriptors::empty();
  for (position, ttype, bytes) in entries {
    desc.set_raw(Descriptors::index(position as usize, ttype), bytes);
  }
  desc
}

/// Encodes `input` as the §6 single-file envelope: a fixed `0xFF` tag
/// followed by one meta-codec blob. Used for round-trip testing and by any
/// external tool that wants a single self-delimiting compressed buffer
/// without the block-level descriptor framing above.
pub fn encode_envelope(input: &[u8], cfg: MetaCodecConfig) -> Vec<u8> {
  let mut out = vec![ENVELOPE_TAG];
  out.extend(meta::compress(input, cfg));
  out
}

/// Decodes a buffer produced by [`encode_envelope`].
pub fn decode_envelope(buf: &[u8]) -> CodecResult<Vec<u8>> {
  let tag = *buf
    .first()
    .ok_or_else(|| CodecError::truncated_input("envelope missing tag byte"))?;
  if tag != ENVELOPE_TAG {
    return Err(CodecError::invalid_tag(format!("expected envelope tag 0xff, got {tag:#x}")));
  }
  let (data, _) = meta::decompress(&buf[1..])?;
  Ok(data)
}

/// Size-bound helper mirroring the C tool's `rans_compress_bound`-style
/// convention: an upper bound on an envelope's size so callers can
/// preallocate, not an exact prediction (the meta-codec may pick any of
/// several codecs, each with its own worst case).
pub fn envelope_compress_bound(len: usize) -> usize {
  1 + crate::rans::rans_compress_bound(len, crate::rans::Order::Zero)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tokenizer;

  #[test]
  fn envelope_round_trips() {
    let input = b"the quick brown fox jumps over the lazy dog".repeat(3);
    let encoded = encode_envelope(&input, MetaCodecConfig::default());
    let decoded = decode_envelope(&encoded).unwrap();
    assert_eq!(decoded, input);
  }

  #[test]
  fn envelope_rejects_wrong_tag() {
    let bad = vec![0x00u8, 0x00];
    assert!(decode_envelope(&bad).is_err());
  }

  #[test]
  fn block_round_trips_through_tokenizer() {
    let names: Vec<Vec<u8>> = ["@SRR608881.1 FCD0F0WABXX:7:1101:1439:2199/1", "@SRR608881.2 FCD0F0WABXX:7:1101:1458:2211/1"]
      .iter()
      .map(|s| s.as_bytes().to_vec())
      .collect();
    let cfg = crate::TokenizerConfig::default();
    let desc = tokenizer::encode_block(&names, &cfg).unwrap();

    let block = encode_block(&desc, MetaCodecConfig::default());
    let entries = decode_block(&block).unwrap();
    let restored = descriptors_from_entries(entries);

    let decoded = tokenizer::decode_block(&restored, names.len(), &cfg).unwrap();
    assert_eq!(decoded, names);
  }

  #[test]
  fn identical_descriptor_bytes_fold_into_a_back_reference() {
    let mut desc = Descriptors::empty();
    desc.set_raw(Descriptors::index(0, 3), vec![1, 2, 3, 4, 5]);
    desc.set_raw(Descriptors::index(1, 3), vec![1, 2, 3, 4, 5]);

    let block = encode_block(&desc, MetaCodecConfig::default());
    assert!(block[4..].contains(&DUP_TTYPE), "second identical descriptor should fold into a back-reference");

    let entries = decode_block(&block).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].2, entries[1].2);
  }

  #[test]
  fn all_duplicate_lines_round_trip_through_framing() {
    let names: Vec<Vec<u8>> = vec![b"same_name".to_vec(); 5];
    let cfg = crate::TokenizerConfig::default();
    let desc = tokenizer::encode_block(&names, &cfg).unwrap();

    let block = encode_block(&desc, MetaCodecConfig::default());
    let entries = decode_block(&block).unwrap();
    let restored = descriptors_from_entries(entries);
    let decoded = tokenizer::decode_block(&restored, names.len(), &cfg).unwrap();
    assert_eq!(decoded, names);
  }

  #[test]
  fn truncated_block_header_is_an_error() {
    assert!(decode_block(&[0u8, 0, 0]).is_err());
  }

  #[test]
  fn block_body_shorter_than_declared_is_an_error() {
    let mut buf = 100u32.to_le_bytes().to_vec();
    buf.push(0);
    assert!(decode_block(&buf).is_err());
  }

  #[test]
  fn empty_descriptors_round_trip_to_an_empty_block() {
    let desc = Descriptors::empty();
    let block = encode_block(&desc, MetaCodecConfig::default());
    let entries = decode_block(&block).unwrap();
    assert!(entries.is_empty());
  }
}
