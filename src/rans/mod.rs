//! Static rANS byte-stream codec (§4.A): order-0 and order-1 static
//! models, serialized frequency tables, and the 4-way interleaved coder.

mod coder;
mod freq;

use crate::constants::{RANS_NUM_STATES, RANS_TOTFREQ};
use crate::errors::CodecError;
use crate::varint;
use coder::Model;

/// Model order. Order-1 captures byte-to-byte correlation (e.g. run
/// structure in delta streams) at the cost of a larger table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
  Zero,
  One,
}

const LEN_HEADER_BYTES: usize = 4;

/// Worst-case compressed size for `len` input bytes at the given order:
/// the uncompressed-length header, state header, one renorm word roughly
/// every other byte, and a table that in the worst case (every byte an
/// equally likely distinct symbol) costs a few bytes per alphabet entry.
/// Callers sizing output buffers should use this rather than assuming
/// compression always shrinks input.
pub fn rans_compress_bound(len: usize, order: Order) -> usize {
  let header = LEN_HEADER_BYTES;
  let state = RANS_NUM_STATES * 4;
  let words = len * 3 + 16;
  let table = match order {
    Order::Zero => 256 * 3 + 4,
    Order::One => 256 * (256 * 3 + 4) + 4,
  };
  header + state + words + table
}

/// Compresses `input` with a freshly-built static model of the given
/// order (§4.A). The wire format is a 4-byte little-endian uncompressed
/// length, the serialized frequency table(s), then the interleaved rANS
/// payload.
pub fn compress(input: &[u8], order: Order) -> Result<Vec<u8>, CodecError> {
  if order == Order::One && input.len() < 4 {
    return Err(CodecError::bad_input("rans order-1 requires at least 4 input bytes"));
  }

  let mut out = Vec::new();
  out.extend_from_slice(&(input.len() as u32).to_le_bytes());
  if input.is_empty() {
    return Ok(out);
  }

  match order {
    Order::Zero => {
      let mut freqs = freq::histogram_order0(input);
      freq::normalize(&mut freqs, input.len() as u64, RANS_TOTFREQ);
      out.extend(freq::encode_freq_table(&freqs));
      let model = Model::from_freqs(&freqs);
      out.extend(coder::encode_order0(input, &model));
    }
    Order::One => {
      let (alphabet, models) = build_order1_models(input);
      out.extend(serialize_order1_table(&alphabet, &models)?);
      let models = models_from_freqs(&models);
      out.extend(coder::encode_order1(input, &models));
    }
  }
  Ok(out)
}

/// Decompresses a buffer produced by [`compress`] with the given order.
/// The caller is expected to already know the order (the meta-codec
/// records it in the blob's outer tag, §4.D).
pub fn decompress(payload: &[u8], order: Order) -> Result<Vec<u8>, CodecError> {
  if payload.len() < LEN_HEADER_BYTES {
    return Err(CodecError::truncated_input("rans payload missing length header"));
  }
  let out_len = u32::from_le_bytes(payload[..LEN_HEADER_BYTES].try_into().unwrap()) as usize;
  let mut pos = LEN_HEADER_BYTES;
  if out_len == 0 {
    return Ok(Vec::new());
  }

  match order {
    Order::Zero => {
      let (freqs, table_len) = freq::decode_freq_table(&payload[pos..])?;
      pos += table_len;
      let model = Model::from_freqs(&freqs);
      coder::decode_order0(&payload[pos..], &model, out_len)
    }
    Order::One => {
      let (raw_freqs, table_len) = deserialize_order1_table(&payload[pos..])?;
      pos += table_len;
      let models = models_from_freqs(&raw_freqs);
      coder::decode_order1(&payload[pos..], &models, out_len)
    }
  }
}

fn models_from_freqs(rows: &[[u32; 256]; 256]) -> [Model; 256] {
  let mut out: Vec<Model> = Vec::with_capacity(256);
  for row in rows {
    out.push(Model::from_freqs(row));
  }
  out.try_into().unwrap_or_else(|_| unreachable!())
}

/// Builds the 256 per-context histograms using a single global context
/// chain: the context for `input[i]` is `input[i - 1]`, or 0 at `i == 0`.
/// This is equivalent to seeding four independent segment histograms at
/// their natural contiguous predecessor byte, just without the segmenting.
fn build_order1_models(input: &[u8]) -> ([bool; 256], [[u32; 256]; 256]) {
  let mut alphabet = [false; 256];
  let mut rows = [[0u32; 256]; 256];
  for (i, &b) in input.iter().enumerate() {
    alphabet[b as usize] = true;
    let ctx = if i == 0 { 0 } else { input[i - 1] };
    rows[ctx as usize][b as usize] += 1;
  }
  // Every context row must be able to encode every symbol a decoder might
  // need the context to cover, and it must be fully present for contexts
  // that were never observed (e.g. ctx 0 when input starts with a byte
  // whose natural predecessor never occurs as context 0 again).
  for row in rows.iter_mut() {
    let total: u32 = row.iter().sum();
    if total > 0 {
      freq::normalize(row, total as u64, RANS_TOTFREQ);
    }
  }
  (alphabet, rows)
}

const ORDER1_SELF_COMPRESS_MIN: usize = 1000;

/// Wire format: `[alphabet index list][one row-relative list per present
/// context, terminated by a zero-length marker already embedded in each
/// list][0xff]`, optionally wrapped in an order-0 self-compression layer
/// when that shrinks the raw bytes (spec §4.A "table encoding").
fn serialize_order1_table(alphabet: &[bool; 256], rows: &[[u32; 256]; 256]) -> Result<Vec<u8>, CodecError> {
  let mut contexts_present = [false; 256];
  for ctx in 0..256usize {
    contexts_present[ctx] = rows[ctx].iter().any(|&f| f != 0);
  }

  let mut raw = Vec::new();
  raw.extend(freq::encode_index_list(alphabet));
  raw.extend(freq::encode_index_list(&contexts_present));
  for ctx in 0..256usize {
    if !contexts_present[ctx] {
      continue;
    }
    raw.extend(freq::encode_row_relative(alphabet, &rows[ctx]));
  }

  if raw.len() > ORDER1_SELF_COMPRESS_MIN {
    let compressed = compress(&raw, Order::Zero)?;
    if compressed.len() + 3 < raw.len() {
      let mut out = vec![1u8];
      varint::write(&mut out, compressed.len() as u64);
      out.extend(compressed);
      return Ok(out);
    }
  }
  let mut out = vec![0u8];
  out.extend(raw);
  Ok(out)
}

fn deserialize_order1_table(buf: &[u8]) -> Result<([[u32; 256]; 256], usize), CodecError> {
  let flag = *buf
    .first()
    .ok_or_else(|| CodecError::truncated_input("order-1 table missing flag byte"))?;
  let mut pos = 1usize;

  match flag {
    0 => {
      let (rows, used) = parse_order1_table_body(&buf[pos..])?;
      Ok((rows, pos + used))
    }
    1 => {
      let (clen, used) = varint::read(&buf[pos..])?;
      pos += used;
      let clen = clen as usize;
      let compressed = &buf[pos..pos + clen];
      pos += clen;
      let decompressed = decompress(compressed, Order::Zero)?;
      let (rows, _) = parse_order1_table_body(&decompressed)?;
      Ok((rows, pos))
    }
    _ => Err(CodecError::invalid_tag(format!("unknown order-1 table flag {flag}"))),
  }
}

/// Parses the raw (uncompressed) order-1 table body: an alphabet index
/// list followed by one row-relative list per present context, in
/// ascending context order. Returns the rows and the number of bytes of
/// `raw` consumed.
fn parse_order1_table_body(raw: &[u8]) -> Result<([[u32; 256]; 256], usize), CodecError> {
  let (alphabet, mut used) = freq::decode_index_list(raw)?;
  let (contexts_present, ctx_used) = freq::decode_index_list(&raw[used..])?;
  used += ctx_used;

  let mut rows = [[0u32; 256]; 256];
  for ctx in 0..256usize {
    if !contexts_present[ctx] {
      continue;
    }
    let (mut row, row_used) = freq::decode_row_relative(&alphabet, &raw[used..])?;
    used += row_used;
    let total: u32 = row.iter().sum();
    if total != 0 && total != RANS_TOTFREQ {
      freq::normalize(&mut row, total as u64, RANS_TOTFREQ);
    }
    rows[ctx] = row;
  }
  Ok((rows, used))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn order0_round_trips() {
    let input = b"the quick brown fox jumps over the lazy dog, repeatedly".repeat(5);
    let encoded = compress(&input, Order::Zero).unwrap();
    let decoded = decompress(&encoded, Order::Zero).unwrap();
    assert_eq!(decoded, input);
  }

  #[test]
  fn order1_round_trips() {
    let input = b"acgtacgtacgtacgtacgtacgtttttttttacgtacgtggggggggg".repeat(3);
    let encoded = compress(&input, Order::One).unwrap();
    let decoded = decompress(&encoded, Order::One).unwrap();
    assert_eq!(decoded, input);
  }

  #[test]
  fn empty_input_round_trips() {
    for order in [Order::Zero, Order::One] {
      let encoded = compress(&[], order).unwrap();
      let decoded = decompress(&encoded, order).unwrap();
      assert!(decoded.is_empty());
    }
  }

  #[test]
  fn single_byte_repeated_round_trips() {
    let input = vec![b'Z'; 500];
    for order in [Order::Zero, Order::One] {
      let encoded = compress(&input, order).unwrap();
      let decoded = decompress(&encoded, order).unwrap();
      assert_eq!(decoded, input);
    }
  }

  #[test]
  fn order1_rejects_short_input() {
    assert!(compress(b"abc", Order::One).is_err());
  }

  #[test]
  fn compress_bound_is_never_exceeded_for_order0() {
    let input = b"abcdefghijklmnopqrstuvwxyz0123456789".repeat(50);
    let encoded = compress(&input, Order::Zero).unwrap();
    assert!(encoded.len() <= rans_compress_bound(input.len(), Order::Zero));
  }
}
