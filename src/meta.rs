//! Meta-codec: tries every applicable base codec and keeps whichever
//! produced the smallest blob, tagging the winner so decode can dispatch
//! without guessing (§4.D).
//!
//! Every blob this module produces is self-delimiting: [`decompress`]
//! returns both the decoded bytes and the number of input bytes it
//! consumed, so blobs can be chained back to back (as [`Tag::X4`]'s four
//! quarters are).

use crate::config::MetaCodecConfig;
use crate::constants::{META_COMPOSE_MIN_LEN, META_RANS1_MIN_LEN, META_X4_MIN_LEN};
use crate::errors::CodecError;
use crate::rans::{self, Order};
use crate::{pack, rle};
use crate::varint;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
enum Tag {
  Cat = 0,
  Rle = 1,
  Rans0 = 2,
  Rans1 = 3,
  X4 = 4,
  Pack = 5,
  Rle0 = 6,
  Rle1 = 7,
  Pack0 = 8,
  Pack1 = 9,
}

impl Tag {
  fn from_byte(b: u8) -> Result<Self, CodecError> {
    Ok(match b {
      0 => Tag::Cat,
      1 => Tag::Rle,
      2 => Tag::Rans0,
      3 => Tag::Rans1,
      4 => Tag::X4,
      5 => Tag::Pack,
      6 => Tag::Rle0,
      7 => Tag::Rle1,
      8 => Tag::Pack0,
      9 => Tag::Pack1,
      other => return Err(CodecError::invalid_tag(format!("unknown meta-codec tag {other}"))),
    })
  }
}

fn wrap_rans(tag: Tag, rans_body: Vec<u8>) -> Vec<u8> {
  let mut out = vec![tag as u8];
  out.extend_from_slice(&(rans_body.len() as u32).to_le_bytes());
  out.extend(rans_body);
  out
}

/// Compresses `input`, trying every codec the contract allows for this
/// length and `cfg`, and returns the smallest resulting tagged blob.
pub fn compress(input: &[u8], cfg: MetaCodecConfig) -> Vec<u8> {
  let n = input.len();
  let mut best: Vec<u8> = {
    let mut cat = vec![Tag::Cat as u8];
    varint::write(&mut cat, n as u64);
    cat.extend_from_slice(input);
    cat
  };

  let mut consider = |candidate: Vec<u8>, best: &mut Vec<u8>| {
    if candidate.len() < best.len() {
      *best = candidate;
    }
  };

  consider(
    {
      let mut v = vec![Tag::Rle as u8];
      v.extend(rle::compress(input));
      v
    },
    &mut best,
  );
  if let Ok(body) = rans::compress(input, Order::Zero) {
    consider(wrap_rans(Tag::Rans0, body), &mut best);
  }

  if n >= META_RANS1_MIN_LEN {
    if let Ok(body) = rans::compress(input, Order::One) {
      consider(wrap_rans(Tag::Rans1, body), &mut best);
    }
    consider(
      {
        let mut v = vec![Tag::Pack as u8];
        v.extend(pack::compress(input));
        v
      },
      &mut best,
    );
  }

  if n >= META_COMPOSE_MIN_LEN {
    let rle_body = rle::compress(input);
    if let Ok(body) = rans::compress(&rle_body, Order::Zero) {
      consider(wrap_rans(Tag::Rle0, body), &mut best);
    }
    if let Ok(body) = rans::compress(&rle_body, Order::One) {
      consider(wrap_rans(Tag::Rle1, body), &mut best);
    }
    let pack_body = pack::compress(input);
    if let Ok(body) = rans::compress(&pack_body, Order::Zero) {
      consider(wrap_rans(Tag::Pack0, body), &mut best);
    }
    if let Ok(body) = rans::compress(&pack_body, Order::One) {
      consider(wrap_rans(Tag::Pack1, body), &mut best);
    }
  }

  if cfg.allow_x4 && n % 4 == 0 && n >= META_X4_MIN_LEN {
    consider(compress_x4(input), &mut best);
  }

  best
}

fn compress_x4(input: &[u8]) -> Vec<u8> {
  let n = input.len();
  let quarter_len = n / 4;
  let mut quarters = [
    Vec::with_capacity(quarter_len),
    Vec::with_capacity(quarter_len),
    Vec::with_capacity(quarter_len),
    Vec::with_capacity(quarter_len),
  ];
  for (k, &b) in input.iter().enumerate() {
    quarters[k % 4].push(b);
  }

  let inner_cfg = MetaCodecConfig::default().without_x4();
  let mut out = vec![Tag::X4 as u8];
  varint::write(&mut out, n as u64);
  for q in &quarters {
    out.extend(compress(q, inner_cfg));
  }
  out
}

/// Decodes one self-delimiting blob from the front of `buf`. Returns the
/// decoded bytes and the number of bytes of `buf` the blob occupied.
pub fn decompress(buf: &[u8]) -> Result<(Vec<u8>, usize), CodecError> {
  let tag_byte = *buf
    .first()
    .ok_or_else(|| CodecError::truncated_input("meta-codec blob is empty"))?;
  let tag = Tag::from_byte(tag_byte)?;
  let body = &buf[1..];

  match tag {
    Tag::Cat => {
      let (len, used) = varint::read(body)?;
      let len = len as usize;
      let data = body
        .get(used..used + len)
        .ok_or_else(|| CodecError::truncated_input("cat payload truncated"))?;
      Ok((data.to_vec(), 1 + used + len))
    }
    Tag::Rle => {
      let (data, used) = rle::decompress(body)?;
      Ok((data, 1 + used))
    }
    Tag::Pack => {
      let (data, used) = pack::decompress(body)?;
      Ok((data, 1 + used))
    }
    Tag::Rans0 => {
      let (data, used) = decode_rans_wrapped(body, Order::Zero)?;
      Ok((data, 1 + used))
    }
    Tag::Rans1 => {
      let (data, used) = decode_rans_wrapped(body, Order::One)?;
      Ok((data, 1 + used))
    }
    Tag::Rle0 => {
      let (intermediate, used) = decode_rans_wrapped(body, Order::Zero)?;
      let (data, _) = rle::decompress(&intermediate)?;
      Ok((data, 1 + used))
    }
    Tag::Rle1 => {
      let (intermediate, used) = decode_rans_wrapped(body, Order::One)?;
      let (data, _) = rle::decompress(&intermediate)?;
      Ok((data, 1 + used))
    }
    Tag::Pack0 => {
      let (intermediate, used) = decode_rans_wrapped(body, Order::Zero)?;
      let (data, _) = pack::decompress(&intermediate)?;
      Ok((data, 1 + used))
    }
    Tag::Pack1 => {
      let (intermediate, used) = decode_rans_wrapped(body, Order::One)?;
      let (data, _) = pack::decompress(&intermediate)?;
      Ok((data, 1 + used))
    }
    Tag::X4 => {
      let (n, mut used) = varint::read(body)?;
      let n = n as usize;
      let quarter_len = n / 4;
      let mut quarters: [Vec<u8>; 4] = Default::default();
      for q in quarters.iter_mut() {
        let (data, sub_used) = decompress(&body[used..])?;
        *q = data;
        used += sub_used;
      }
      if quarters.iter().any(|q| q.len() != quarter_len) {
        return Err(CodecError::malformed_table("x4 quarter length mismatch"));
      }
      let mut out = vec![0u8; n];
      for (k, q) in quarters.iter().enumerate() {
        for (i, &b) in q.iter().enumerate() {
          out[i * 4 + k] = b;
        }
      }
      Ok((out, 1 + used))
    }
  }
}

/// Reads the `[complen:4][rans body]` wrapper and returns the decoded
/// bytes plus the number of bytes of `body` consumed (`4 + complen`).
fn decode_rans_wrapped(body: &[u8], order: Order) -> Result<(Vec<u8>, usize), CodecError> {
  if body.len() < 4 {
    return Err(CodecError::truncated_input("rans wrapper missing compressed-length field"));
  }
  let complen = u32::from_le_bytes(body[..4].try_into().unwrap()) as usize;
  let rans_body = body
    .get(4..4 + complen)
    .ok_or_else(|| CodecError::truncated_input("rans wrapper body truncated"))?;
  let data = rans::decompress(rans_body, order)?;
  Ok((data, 4 + complen))
}

/// Reports the expected decompressed length of the blob at the front of
/// `buf`, without decoding its body (§4.D "uncompressed_size probe").
/// For the rANS-wrapped combined forms (RLE0/RLE1/PACK0/PACK1) this is the
/// length of the intermediate RLE/PACK buffer the outer rANS layer
/// produces, not the final original length, since recovering that needs a
/// second decode pass; see DESIGN.md.
pub fn uncompressed_size(buf: &[u8]) -> Result<u64, CodecError> {
  let tag_byte = *buf
    .first()
    .ok_or_else(|| CodecError::truncated_input("meta-codec blob is empty"))?;
  let tag = Tag::from_byte(tag_byte)?;
  let body = &buf[1..];

  match tag {
    Tag::Cat | Tag::Rle | Tag::Pack | Tag::X4 => Ok(varint::read(body)?.0),
    Tag::Rans0 | Tag::Rans1 | Tag::Rle0 | Tag::Rle1 | Tag::Pack0 | Tag::Pack1 => {
      if body.len() < 8 {
        return Err(CodecError::truncated_input("rans wrapper too short for length probe"));
      }
      Ok(u32::from_le_bytes(body[4..8].try_into().unwrap()) as u64)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn round_trip(input: &[u8], cfg: MetaCodecConfig) {
    let encoded = compress(input, cfg);
    let (decoded, used) = decompress(&encoded).unwrap();
    assert_eq!(used, encoded.len());
    assert_eq!(decoded, input);
  }

  #[test]
  fn small_input_round_trips() {
    round_trip(b"ab", MetaCodecConfig::default());
    round_trip(b"", MetaCodecConfig::default());
  }

  #[test]
  fn repetitive_input_round_trips() {
    round_trip(&b"abababab".repeat(10), MetaCodecConfig::default());
  }

  #[test]
  fn random_ish_input_round_trips() {
    let input: Vec<u8> = (0u32..500).map(|i| ((i * 2654435761) % 251) as u8).collect();
    round_trip(&input, MetaCodecConfig::default());
  }

  #[test]
  fn x4_eligible_input_round_trips() {
    let input = b"the quick brown fox jumps over the lazy dog!!!!".to_vec();
    assert_eq!(input.len() % 4, 0);
    assert!(input.len() >= 32);
    round_trip(&input, MetaCodecConfig::default());
  }

  #[test]
  fn x4_can_be_forbidden() {
    let input = b"the quick brown fox jumps over the lazy dog!!!!".to_vec();
    let encoded = compress(&input, MetaCodecConfig::default().without_x4());
    assert_ne!(*encoded.first().unwrap(), Tag::X4 as u8);
    let (decoded, _) = decompress(&encoded).unwrap();
    assert_eq!(decoded, input);
  }

  #[test]
  fn uncompressed_size_probe_matches_plain_forms() {
    let input = b"hello hello hello hello hello".to_vec();
    for candidate_tag_forcing_input in [input.clone(), b"x".repeat(3)] {
      let encoded = compress(&candidate_tag_forcing_input, MetaCodecConfig::default());
      let tag = Tag::from_byte(encoded[0]).unwrap();
      if matches!(tag, Tag::Cat | Tag::Rle | Tag::Pack | Tag::Rans0 | Tag::Rans1) {
        let probed = uncompressed_size(&encoded).unwrap();
        assert_eq!(probed as usize, candidate_tag_forcing_input.len());
      }
    }
  }
}
