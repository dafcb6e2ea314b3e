//! Name decoder: the symmetric inverse of `encode.rs` (§4.E "Decode").

use super::context::{LineContext, StoredKind, TokenRecord};
use super::descriptors::Descriptors;
use super::token::*;
use crate::config::TokenizerConfig;
use crate::constants::MAX_TOKENS;
use crate::errors::CodecError;
use crate::CodecResult;

fn read_byte(desc: &Descriptors, p: usize, t: u8, cursors: &mut [usize]) -> CodecResult<u8> {
  let idx = Descriptors::index(p, t);
  let pos = cursors[idx];
  let b = *desc
    .stream(p, t)
    .get(pos)
    .ok_or_else(|| CodecError::truncated_input("tokeniser stream exhausted"))?;
  cursors[idx] = pos + 1;
  Ok(b)
}

fn read_n(desc: &Descriptors, p: usize, t: u8, cursors: &mut [usize], n: usize) -> CodecResult<Vec<u8>> {
  let idx = Descriptors::index(p, t);
  let pos = cursors[idx];
  let slice = desc
    .stream(p, t)
    .get(pos..pos + n)
    .ok_or_else(|| CodecError::truncated_input("tokeniser stream exhausted"))?;
  cursors[idx] = pos + n;
  Ok(slice.to_vec())
}

fn read_u32(desc: &Descriptors, p: usize, t: u8, cursors: &mut [usize]) -> CodecResult<u32> {
  let bytes = read_n(desc, p, t, cursors, 4)?;
  Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
}

fn read_cstr(desc: &Descriptors, p: usize, t: u8, cursors: &mut [usize]) -> CodecResult<Vec<u8>> {
  let idx = Descriptors::index(p, t);
  let stream = desc.stream(p, t);
  let start = cursors[idx];
  let mut pos = start;
  loop {
    let b = *stream
      .get(pos)
      .ok_or_else(|| CodecError::truncated_input("alpha stream missing NUL terminator"))?;
    if b == 0 {
      break;
    }
    pos += 1;
  }
  let s = stream[start..pos].to_vec();
  cursors[idx] = pos + 1;
  Ok(s)
}

fn write_decimal(out: &mut Vec<u8>, value: u32, width: u8) {
  let digits = value.to_string();
  let width = width as usize;
  if digits.len() < width {
    out.extend(std::iter::repeat(b'0').take(width - digits.len()));
  }
  out.extend_from_slice(digits.as_bytes());
}

/// Decodes `n_lines` names from their tokeniser descriptor streams.
pub fn decode_block(desc: &Descriptors, n_lines: usize, _cfg: &TokenizerConfig) -> CodecResult<Vec<Vec<u8>>> {
  let mut cursors = vec![0usize; desc.stream_count()];
  let mut contexts: Vec<LineContext> = Vec::with_capacity(n_lines);
  let mut out: Vec<Vec<u8>> = Vec::with_capacity(n_lines);

  for cnum in 0..n_lines {
    let t0 = read_byte(desc, 0, 0, &mut cursors)?;

    if t0 == TYPE_DUP {
      let dist = u32::from_le_bytes(read_n(desc, 0, TYPE_DUP, &mut cursors, 4)?.try_into().unwrap()) as usize;
      if dist == 0 || dist > cnum {
        return Err(CodecError::malformed_table("dup distance out of range"));
      }
      let reference = contexts[cnum - dist].clone();
      out.push(reference.bytes.clone());
      contexts.push(reference);
      continue;
    }
    if t0 != TYPE_DIFF {
      return Err(CodecError::invalid_tag(format!("expected a DUP/DIFF control token, got {t0}")));
    }

    let dist = u32::from_le_bytes(read_n(desc, 0, TYPE_DIFF, &mut cursors, 4)?.try_into().unwrap()) as usize;
    let reference: Option<LineContext> = if dist == 0 {
      None
    } else {
      if dist > cnum {
        return Err(CodecError::malformed_table("diff distance out of range"));
      }
      Some(contexts[cnum - dist].clone())
    };

    let mut bytes = Vec::new();
    let mut line_tokens: Vec<TokenRecord> = Vec::new();
    let mut ntok = 1usize;

    loop {
      if ntok >= MAX_TOKENS {
        return Err(CodecError::truncated_input("line exceeded MAX_TOKENS without an END token"));
      }
      let ttype = read_byte(desc, ntok, 0, &mut cursors)?;
      if ttype == TYPE_END {
        break;
      }
      let ref_tok = reference.as_ref().and_then(|r| r.tokens.get(ntok - 1));

      match ttype {
        TYPE_ALPHA => {
          let s = read_cstr(desc, ntok, TYPE_ALPHA, &mut cursors)?;
          let start = bytes.len();
          bytes.extend_from_slice(&s);
          line_tokens.push(TokenRecord {
            kind: StoredKind::Alpha,
            int_val: 0,
            width: 0,
            str_range: start..bytes.len(),
          });
        }
        TYPE_CHAR => {
          let b = read_byte(desc, ntok, TYPE_CHAR, &mut cursors)?;
          bytes.push(b);
          line_tokens.push(TokenRecord {
            kind: StoredKind::Char,
            int_val: b as u32,
            width: 0,
            str_range: 0..0,
          });
        }
        TYPE_DIGITS => {
          let v = read_u32(desc, ntok, TYPE_DIGITS, &mut cursors)?;
          let start = bytes.len();
          write_decimal(&mut bytes, v, 0);
          line_tokens.push(TokenRecord {
            kind: StoredKind::Digits,
            int_val: v,
            width: (bytes.len() - start) as u8,
            str_range: start..bytes.len(),
          });
        }
        TYPE_DIGITS0 => {
          let width = read_byte(desc, ntok, TYPE_DZLEN, &mut cursors)?;
          let v = read_u32(desc, ntok, TYPE_DIGITS0, &mut cursors)?;
          let start = bytes.len();
          write_decimal(&mut bytes, v, width);
          line_tokens.push(TokenRecord {
            kind: StoredKind::Digits0,
            int_val: v,
            width,
            str_range: start..bytes.len(),
          });
        }
        TYPE_DDELTA => {
          let delta = read_byte(desc, ntok, TYPE_DDELTA, &mut cursors)?;
          let t = ref_tok.ok_or_else(|| CodecError::malformed_table("DDELTA with no reference token"))?;
          let v = t.int_val + delta as u32;
          let start = bytes.len();
          write_decimal(&mut bytes, v, 0);
          line_tokens.push(TokenRecord {
            kind: StoredKind::Digits,
            int_val: v,
            width: (bytes.len() - start) as u8,
            str_range: start..bytes.len(),
          });
        }
        TYPE_DDELTA0 => {
          let delta = read_byte(desc, ntok, TYPE_DDELTA0, &mut cursors)?;
          let t = ref_tok.ok_or_else(|| CodecError::malformed_table("DDELTA0 with no reference token"))?;
          let v = t.int_val + delta as u32;
          let width = t.width;
          let start = bytes.len();
          write_decimal(&mut bytes, v, width);
          line_tokens.push(TokenRecord {
            kind: StoredKind::Digits0,
            int_val: v,
            width,
            str_range: start..bytes.len(),
          });
        }
        TYPE_MATCH => {
          let t = ref_tok.cloned().ok_or_else(|| CodecError::malformed_table("MATCH with no reference token"))?;
          let r = reference.as_ref().ok_or_else(|| CodecError::malformed_table("MATCH with no reference line"))?;
          let start = bytes.len();
          match t.kind {
            StoredKind::Alpha => bytes.extend_from_slice(&r.bytes[t.str_range.clone()]),
            StoredKind::Char => bytes.push(t.int_val as u8),
            StoredKind::Digits => write_decimal(&mut bytes, t.int_val, 0),
            StoredKind::Digits0 => write_decimal(&mut bytes, t.int_val, t.width),
          }
          line_tokens.push(TokenRecord {
            kind: t.kind,
            int_val: t.int_val,
            width: t.width,
            str_range: start..bytes.len(),
          });
        }
        other => return Err(CodecError::invalid_tag(format!("unrecognised tokeniser type byte {other}"))),
      }
      ntok += 1;
    }

    contexts.push(LineContext {
      bytes: bytes.clone(),
      tokens: line_tokens,
    });
    out.push(bytes);
  }

  Ok(out)
}
