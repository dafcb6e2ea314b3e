//! Name encoder: decomposes each line into runs and delta-encodes them
//! against a reference line (§4.E "Token emission (on DIFF)").

use std::ops::Range;

use super::context::{LineContext, StoredKind, TokenRecord};
use super::descriptors::Descriptors;
use super::token::*;
use super::trie::{detect_fixed_prefix, Trie};
use crate::config::TokenizerConfig;
use crate::constants::{MAX_DIGITS, MAX_TOKENS};
use crate::errors::CodecError;
use crate::CodecResult;

enum Run {
  Alpha(Range<usize>),
  Char(u8),
  Digits { value: u32, width: u8, range: Range<usize> },
  Digits0 { value: u32, width: u8, range: Range<usize> },
}

/// Splits `bytes` into maximal runs: alphabetic spans of length ≥ 2 (a lone
/// alphabetic byte becomes `Char`), digit spans up to 8 digits (classified
/// `Digits0` iff they start with `'0'`), and single non-alphanumeric bytes
/// (§3 "Read name").
fn parse_runs(bytes: &[u8]) -> Vec<Run> {
  let mut runs = Vec::new();
  let n = bytes.len();
  let mut i = 0usize;
  while i < n {
    let b = bytes[i];
    if b.is_ascii_alphabetic() {
      let start = i;
      while i < n && bytes[i].is_ascii_alphabetic() {
        i += 1;
      }
      if i - start >= 2 {
        runs.push(Run::Alpha(start..i));
      } else {
        runs.push(Run::Char(bytes[start]));
      }
    } else if b.is_ascii_digit() {
      let start = i;
      while i < n && bytes[i].is_ascii_digit() && i - start < MAX_DIGITS {
        i += 1;
      }
      let text = &bytes[start..i];
      let width = text.len() as u8;
      let value: u32 = std::str::from_utf8(text).unwrap().parse().unwrap_or(0);
      debug_assert!((value as u64) <= crate::constants::MAX_DIGITS_VALUE, "8-digit run must fit §3's value bound");
      if text[0] == b'0' {
        runs.push(Run::Digits0 { value, width, range: start..i });
      } else {
        runs.push(Run::Digits { value, width, range: start..i });
      }
    } else {
      runs.push(Run::Char(b));
      i += 1;
    }
  }
  runs
}

fn delta_fits(value: u32, reference: u32) -> Option<u8> {
  value.checked_sub(reference).filter(|&d| d <= 0xff).map(|d| d as u8)
}

/// Encodes a block of read names into their tokeniser descriptor streams.
/// `names` must be 7-bit ASCII with no embedded newline (§1 Non-goals).
pub fn encode_block(names: &[Vec<u8>], cfg: &TokenizerConfig) -> CodecResult<Descriptors> {
  for name in names {
    if name.iter().any(|&b| b >= 0x80 || b == b'\n') {
      return Err(CodecError::bad_input("read name contains a non-7-bit-ASCII byte or embedded newline"));
    }
  }

  let mut desc = Descriptors::new();
  let mut trie = Trie::new();
  let mut contexts: Vec<LineContext> = Vec::with_capacity(names.len());
  let max_distance = cfg.max_names.saturating_sub(1);

  for (cnum, name) in names.iter().enumerate() {
    let fixed_prefix = detect_fixed_prefix(name);
    let (from, p3) = trie.visit(name, cnum, fixed_prefix);
    let exact = from.is_some();
    let mut pnum = if exact {
      from.unwrap()
    } else {
      p3.unwrap_or(if cnum > 0 { cnum - 1 } else { 0 })
    };
    if cnum.saturating_sub(pnum) > max_distance {
      pnum = cnum.saturating_sub(max_distance.min(cnum));
    }

    let reference: Option<&LineContext> = if cnum == 0 { None } else { Some(&contexts[pnum]) };
    let is_dup = exact && reference.is_some_and(|r| r.bytes.as_slice() == name.as_slice());

    if is_dup {
      let dist = (cnum - pnum) as u32;
      desc.push_byte(0, 0, TYPE_DUP);
      desc.extend(0, TYPE_DUP, &dist.to_le_bytes());
      contexts.push(contexts[pnum].clone());
      continue;
    }

    let dist = (cnum - pnum) as u32;
    desc.push_byte(0, 0, TYPE_DIFF);
    desc.extend(0, TYPE_DIFF, &dist.to_le_bytes());

    let mut line_tokens: Vec<TokenRecord> = Vec::new();
    let mut ntok: usize = 1;

    let body_start = match fixed_prefix {
      Some(plen) if name.len() >= plen && name[..plen].iter().all(u8::is_ascii_alphabetic) => {
        let ref_tok = reference.and_then(|r| r.tokens.first());
        let is_match = match (ref_tok, reference) {
          (Some(t), Some(r)) => t.kind == StoredKind::Alpha && t.str_range.len() == plen && r.bytes[t.str_range.clone()] == name[..plen],
          _ => false,
        };
        if is_match {
          desc.push_byte(ntok, 0, TYPE_MATCH);
        } else {
          desc.push_byte(ntok, 0, TYPE_ALPHA);
          desc.extend(ntok, TYPE_ALPHA, &name[..plen]);
          desc.push_byte(ntok, TYPE_ALPHA, 0);
        }
        line_tokens.push(TokenRecord {
          kind: StoredKind::Alpha,
          int_val: 0,
          width: 0,
          str_range: 0..plen,
        });
        ntok += 1;
        plen
      }
      _ => 0,
    };

    for run in parse_runs(&name[body_start..]) {
      if ntok >= MAX_TOKENS {
        return Err(CodecError::bad_input("read name has more token positions than MAX_TOKENS supports"));
      }
      let ref_tok = reference.and_then(|r| r.tokens.get(ntok - 1));

      match run {
        Run::Alpha(range) => {
          let range = (range.start + body_start)..(range.end + body_start);
          let is_match = matches!((ref_tok, reference), (Some(t), Some(r)) if t.kind == StoredKind::Alpha
            && t.str_range.len() == range.len()
            && r.bytes[t.str_range.clone()] == name[range.clone()]);
          if is_match {
            desc.push_byte(ntok, 0, TYPE_MATCH);
          } else {
            desc.push_byte(ntok, 0, TYPE_ALPHA);
            desc.extend(ntok, TYPE_ALPHA, &name[range.clone()]);
            desc.push_byte(ntok, TYPE_ALPHA, 0);
          }
          line_tokens.push(TokenRecord {
            kind: StoredKind::Alpha,
            int_val: 0,
            width: 0,
            str_range: range,
          });
        }
        Run::Char(b) => {
          let is_match = matches!(ref_tok, Some(t) if t.kind == StoredKind::Char && t.int_val == b as u32);
          if is_match {
            desc.push_byte(ntok, 0, TYPE_MATCH);
          } else {
            desc.push_byte(ntok, 0, TYPE_CHAR);
            desc.push_byte(ntok, TYPE_CHAR, b);
          }
          line_tokens.push(TokenRecord {
            kind: StoredKind::Char,
            int_val: b as u32,
            width: 0,
            str_range: 0..0,
          });
        }
        Run::Digits0 { value, width, range } => {
          let range = (range.start + body_start)..(range.end + body_start);
          if let Some(t) = ref_tok.filter(|t| t.kind == StoredKind::Digits0) {
            if t.int_val == value && t.width == width {
              desc.push_byte(ntok, 0, TYPE_MATCH);
            } else if t.width == width {
              if let Some(delta) = delta_fits(value, t.int_val) {
                desc.push_byte(ntok, 0, TYPE_DDELTA0);
                desc.push_byte(ntok, TYPE_DDELTA0, delta);
              } else {
                desc.push_byte(ntok, 0, TYPE_DIGITS0);
                desc.push_byte(ntok, TYPE_DZLEN, width);
                desc.extend(ntok, TYPE_DIGITS0, &value.to_le_bytes());
              }
            } else {
              desc.push_byte(ntok, 0, TYPE_DIGITS0);
              desc.push_byte(ntok, TYPE_DZLEN, width);
              desc.extend(ntok, TYPE_DIGITS0, &value.to_le_bytes());
            }
          } else {
            desc.push_byte(ntok, 0, TYPE_DIGITS0);
            desc.push_byte(ntok, TYPE_DZLEN, width);
            desc.extend(ntok, TYPE_DIGITS0, &value.to_le_bytes());
          }
          line_tokens.push(TokenRecord {
            kind: StoredKind::Digits0,
            int_val: value,
            width,
            str_range: range,
          });
        }
        Run::Digits { value, width, range } => {
          let range = (range.start + body_start)..(range.end + body_start);
          // Reroute to the DIGITS0 branch when the reference column is
          // DIGITS0 with the same width, keeping the column homogeneous
          // across lines where leading zeros appear only sometimes.
          if let Some(t) = ref_tok.filter(|t| t.kind == StoredKind::Digits0 && t.width == width) {
            if t.int_val == value {
              desc.push_byte(ntok, 0, TYPE_MATCH);
            } else if let Some(delta) = delta_fits(value, t.int_val) {
              desc.push_byte(ntok, 0, TYPE_DDELTA0);
              desc.push_byte(ntok, TYPE_DDELTA0, delta);
            } else {
              desc.push_byte(ntok, 0, TYPE_DIGITS0);
              desc.push_byte(ntok, TYPE_DZLEN, width);
              desc.extend(ntok, TYPE_DIGITS0, &value.to_le_bytes());
            }
            line_tokens.push(TokenRecord {
              kind: StoredKind::Digits0,
              int_val: value,
              width,
              str_range: range,
            });
          } else {
            let matched_ref = ref_tok.filter(|t| t.kind == StoredKind::Digits);
            if matched_ref.is_some_and(|t| t.int_val == value) {
              desc.push_byte(ntok, 0, TYPE_MATCH);
            } else if let Some(delta) = matched_ref.and_then(|t| delta_fits(value, t.int_val)) {
              desc.push_byte(ntok, 0, TYPE_DDELTA);
              desc.push_byte(ntok, TYPE_DDELTA, delta);
            } else {
              desc.push_byte(ntok, 0, TYPE_DIGITS);
              desc.extend(ntok, TYPE_DIGITS, &value.to_le_bytes());
            }
            line_tokens.push(TokenRecord {
              kind: StoredKind::Digits,
              int_val: value,
              width,
              str_range: range,
            });
          }
        }
      }
      ntok += 1;
    }

    desc.push_byte(ntok, 0, TYPE_END);
    contexts.push(LineContext {
      bytes: name.clone(),
      tokens: line_tokens,
    });
  }

  Ok(desc)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn names(lines: &[&str]) -> Vec<Vec<u8>> {
    lines.iter().map(|s| s.as_bytes().to_vec()).collect()
  }

  #[test]
  fn identical_lines_become_dup() {
    let desc = encode_block(&names(&["read_0001", "read_0001"]), &TokenizerConfig::default()).unwrap();
    assert_eq!(desc.stream(0, TYPE_DIFF).len(), 0);
    assert_eq!(desc.stream(0, 0)[1], TYPE_DUP);
  }

  #[test]
  fn first_line_is_always_diff() {
    let desc = encode_block(&names(&["anything"]), &TokenizerConfig::default()).unwrap();
    assert_eq!(desc.stream(0, 0)[0], TYPE_DIFF);
  }

  #[test]
  fn high_bit_bytes_are_rejected() {
    let bad = vec![vec![0x80u8, 0x81]];
    assert!(encode_block(&bad, &TokenizerConfig::default()).is_err());
  }

  #[test]
  fn digit_column_emits_match_or_delta() {
    let desc = encode_block(&names(&["read/1", "read/2", "read/9999"]), &TokenizerConfig::default()).unwrap();
    // position 1 = "read" (ALPHA match after the first line), position 2 =
    // '/' (CHAR match), position 3 = the numeric suffix.
    assert!(!desc.stream(3, 0).is_empty());
  }
}
