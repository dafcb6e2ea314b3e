//! 4-way interleaved static rANS encode/decode kernels (§4.A).
//!
//! Four independent rANS states are kept live at once, each owning every
//! fourth symbol of the stream (`state[i % 4]` owns position `i`). Encoding
//! walks the input backwards (required so the forward decoder replays the
//! same renormalization sequence); decoding walks it forwards. The wire
//! layout is `[state0, state1, state2, state3]` as little-endian `u32`s
//! followed by the renormalization words, also little-endian, in the order
//! the decoder will need to consume them.

use crate::constants::{RANS_LOWER_BOUND, RANS_NUM_STATES, RANS_TOTFREQ, RANS_TOTFREQ_BITS};
use crate::errors::CodecError;

const STATE_BYTES: usize = RANS_NUM_STATES * 4;

/// A normalised static frequency table plus the cumulative-frequency and
/// slot lookup structures needed to encode/decode against it in O(1).
#[derive(Clone)]
pub struct Model {
  freq: [u32; 256],
  cum: [u32; 256],
  slot_to_sym: Vec<u8>,
}

impl Model {
  /// `freqs` must either be all-zero (model never used) or sum to
  /// [`RANS_TOTFREQ`].
  pub fn from_freqs(freqs: &[u32; 256]) -> Self {
    let mut cum = [0u32; 256];
    let mut running = 0u32;
    for j in 0..256 {
      cum[j] = running;
      running += freqs[j];
    }
    let mut slot_to_sym = vec![0u8; RANS_TOTFREQ as usize];
    for j in 0..256usize {
      if freqs[j] == 0 {
        continue;
      }
      let start = cum[j] as usize;
      let end = start + freqs[j] as usize;
      slot_to_sym[start..end].fill(j as u8);
    }
    Model {
      freq: *freqs,
      cum,
      slot_to_sym,
    }
  }

  fn symbol_at(&self, slot: u32) -> u8 {
    self.slot_to_sym[slot as usize]
  }
}

#[inline]
fn put(x: &mut u32, words: &mut Vec<u16>, cum: u32, freq: u32) {
  let x_max = ((RANS_LOWER_BOUND >> RANS_TOTFREQ_BITS) << 16) * freq;
  while *x >= x_max {
    words.push((*x & 0xffff) as u16);
    *x >>= 16;
  }
  *x = (*x / freq) * (1 << RANS_TOTFREQ_BITS) + (*x % freq) + cum;
}

#[inline]
fn get(x: &mut u32, cum: u32, freq: u32) {
  *x = freq.wrapping_mul(*x >> RANS_TOTFREQ_BITS) + (*x & (RANS_TOTFREQ - 1)) - cum;
}

#[inline]
fn renorm(x: &mut u32, words: &mut std::slice::Iter<'_, [u8; 2]>) -> Result<(), CodecError> {
  while *x < RANS_LOWER_BOUND {
    let w = words
      .next()
      .ok_or_else(|| CodecError::truncated_input("rans renorm word stream exhausted"))?;
    *x = (*x << 16) | u16::from_le_bytes(*w) as u32;
  }
  Ok(())
}

/// Encodes `input` against a single static order-0 model.
pub fn encode_order0(input: &[u8], model: &Model) -> Vec<u8> {
  encode_generic(input, |_i, _prev| model)
}

/// Decodes `out_len` symbols from `payload` against a single static
/// order-0 model.
pub fn decode_order0(payload: &[u8], model: &Model, out_len: usize) -> Result<Vec<u8>, CodecError> {
  decode_generic(payload, out_len, |_i, _prev| model)
}

/// Encodes `input` against 256 per-context models, where the context for
/// position `i` is `input[i - 1]` (or 0 at the start of the stream).
pub fn encode_order1(input: &[u8], models: &[Model; 256]) -> Vec<u8> {
  encode_generic(input, |i, prev_byte| {
    let ctx = if i == 0 { 0 } else { prev_byte };
    &models[ctx as usize]
  })
}

/// Decodes `out_len` symbols from `payload` against 256 per-context models.
pub fn decode_order1(payload: &[u8], models: &[Model; 256], out_len: usize) -> Result<Vec<u8>, CodecError> {
  decode_generic(payload, out_len, |i, prev_byte| {
    let ctx = if i == 0 { 0 } else { prev_byte };
    &models[ctx as usize]
  })
}

/// `model_for(i, input[i-1])` must return the model to use at position `i`.
/// Called with the *true* previous input byte (0 at `i == 0`), not a
/// per-stream-local one, so order-1 context lookups stay correct under the
/// 4-way interleave.
fn encode_generic<'a, F>(input: &[u8], model_for: F) -> Vec<u8>
where
  F: Fn(usize, u8) -> &'a Model,
{
  let n = input.len();
  let mut states = [RANS_LOWER_BOUND; RANS_NUM_STATES];
  let mut words: Vec<u16> = Vec::new();

  let mut i = n;
  while i > 0 {
    i -= 1;
    let prev = if i == 0 { 0 } else { input[i - 1] };
    let model = model_for(i, prev);
    let sym = input[i];
    let (cum, freq) = (model.cum[sym as usize], model.freq[sym as usize]);
    put(&mut states[i % RANS_NUM_STATES], &mut words, cum, freq);
  }

  words.reverse();
  let mut out = Vec::with_capacity(STATE_BYTES + 2 * words.len());
  for s in states {
    out.extend_from_slice(&s.to_le_bytes());
  }
  for w in words {
    out.extend_from_slice(&w.to_le_bytes());
  }
  out
}

fn decode_generic<'a, F>(payload: &[u8], out_len: usize, model_for: F) -> Result<Vec<u8>, CodecError>
where
  F: Fn(usize, u8) -> &'a Model,
{
  if payload.len() < STATE_BYTES {
    return Err(CodecError::truncated_input("rans payload shorter than state header"));
  }
  let mut states = [0u32; RANS_NUM_STATES];
  for (k, chunk) in payload[..STATE_BYTES].chunks_exact(4).enumerate() {
    states[k] = u32::from_le_bytes(chunk.try_into().unwrap());
  }

  let word_bytes = &payload[STATE_BYTES..];
  if word_bytes.len() % 2 != 0 {
    return Err(CodecError::truncated_input("rans word stream has an odd trailing byte"));
  }
  let words: Vec<[u8; 2]> = word_bytes.chunks_exact(2).map(|c| [c[0], c[1]]).collect();
  let mut word_iter = words.iter();

  let mut out = Vec::with_capacity(out_len);
  for i in 0..out_len {
    let prev = if i == 0 { 0 } else { out[i - 1] };
    let model = model_for(i, prev);
    let s = i % RANS_NUM_STATES;
    let slot = states[s] & (RANS_TOTFREQ - 1);
    let sym = model.symbol_at(slot);
    let (cum, freq) = (model.cum[sym as usize], model.freq[sym as usize]);
    get(&mut states[s], cum, freq);
    renorm(&mut states[s], &mut word_iter)?;
    out.push(sym);
  }
  Ok(out)
}
