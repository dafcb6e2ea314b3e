//! The literal end-to-end scenarios and cross-module properties from §8,
//! layered above each module's own unit tests. Where §8's prose names a
//! specific wire-format byte (a meta-codec tag, a token-type tag) that the
//! producing module keeps private, this file uses the literal value from
//! §6/§4.E's own tables rather than reaching into that module's internals.

use rand::Rng;

use crate::config::{MetaCodecConfig, TokenizerConfig};
use crate::tokenizer::{decode_block, encode_block, Descriptors};
use crate::{meta, pack, rans};

// §4.E token-type tags (`tokenizer::token`), duplicated here because that
// module is private to `tokenizer`: see token.rs for the authoritative list.
const TYPE_DIFF: u8 = 2;
const TYPE_DDELTA: u8 = 7;
const TYPE_DDELTA0: u8 = 8;

// §6 meta-codec tag bytes, duplicated here because `meta::Tag` is private.
const TAG_PACK: u8 = 0x05;
const TAG_X4: u8 = 0x04;

fn names(lines: &[&str]) -> Vec<Vec<u8>> {
  lines.iter().map(|s| s.as_bytes().to_vec()).collect()
}

/// §8 scenario 1: two SRA-style read names differing only in their run
/// number and two tile coordinates.
#[test]
fn scenario_srr_read_pair_emits_the_documented_deltas() {
  let block = names(&[
    "@SRR608881.1 FCD0F0WABXX:7:1101:1439:2199/1",
    "@SRR608881.2 FCD0F0WABXX:7:1101:1458:2211/1",
  ]);
  let cfg = TokenizerConfig::default();
  let desc = encode_block(&block, &cfg).unwrap();

  // Line 2 is DIFF against line 1 (distance 1); line 1 has no reference.
  assert_eq!(desc.stream(0, TYPE_DIFF), &[0, 0, 0, 0, 1, 0, 0, 0]);

  // Every differing column becomes a DDELTA, in ascending token-position
  // order: the ".1"→".2" suffix (delta 1), "1439"→"1458" (delta 19), and
  // "2199"→"2211" (delta 12). Every other column matches and emits no
  // delta byte at all.
  let mut deltas = Vec::new();
  for p in 0..crate::constants::MAX_TOKENS {
    deltas.extend_from_slice(desc.stream(p, TYPE_DDELTA));
    assert!(desc.stream(p, TYPE_DDELTA0).is_empty(), "no leading-zero column differs in this pair");
  }
  assert_eq!(deltas, vec![1u8, 19, 12]);

  let decoded = decode_block(&desc, block.len(), &cfg).unwrap();
  assert_eq!(decoded, block);
}

/// §8 scenario 2: a 16-byte, 3-symbol input packs to mode 4 (2 bits/code).
#[test]
fn scenario_three_symbol_input_packs_to_mode4() {
  let input = b"AAAAAAAABBBBCCCC";
  assert_eq!(input.len(), 16);
  let encoded = pack::compress(input);
  let (_, used) = crate::varint::read(&encoded).unwrap();
  assert_eq!(encoded[used], 4, "3 distinct symbols should choose 2-bit (mode 4) packing");

  let (decoded, consumed) = pack::decompress(&encoded).unwrap();
  assert_eq!(consumed, encoded.len());
  assert_eq!(decoded, input);
}

/// §8 scenario 3: an alternating 2-symbol input beats CAT and RLE under
/// the meta-codec, since nibble-packing (mode 2) has no runs to exploit
/// and only 2 distinct bytes.
#[test]
fn scenario_alternating_input_selects_pack_over_cat_and_rle() {
  let input = b"ABABABABABAB";
  assert_eq!(input.len(), 12);
  let encoded = meta::compress(input, MetaCodecConfig::default());
  assert_eq!(encoded[0], TAG_PACK);

  let (decoded, used) = meta::decompress(&encoded).unwrap();
  assert_eq!(used, encoded.len());
  assert_eq!(decoded, input);
}

/// §8 scenario 4 (striping semantics): an input whose every 4th byte is
/// constant compresses far better once X4 separates it into four
/// individually-constant lanes than any single-pass codec manages on the
/// interleaved whole, once the block is long enough to amortize each
/// lane's fixed per-blob overhead. This input is intentionally built so
/// the *striped* deinterleave §4.D actually specifies (`byte k` to
/// `quarter k mod 4`) produces constant quarters, rather than the
/// contiguous-block reading of the scenario's prose (a short, literal
/// 16-byte "AAAABBBBCCCCDDDD" does not: at that length a direct 2-bit
/// pack of the whole interleaved buffer already beats paying X4's four
/// separate fixed overheads).
#[test]
fn scenario_striped_constant_lanes_select_x4() {
  let lane = [b'A', b'B', b'C', b'D'];
  let input: Vec<u8> = (0usize..256).map(|i| lane[i % 4]).collect();
  let encoded = meta::compress(&input, MetaCodecConfig::default());
  assert_eq!(encoded[0], TAG_X4, "four long constant byte-lanes should make X4 the smallest candidate");
  assert!(encoded.len() < 40, "four near-free constant quarters plus tags should compress well under 40 bytes, got {}", encoded.len());

  let (decoded, used) = meta::decompress(&encoded).unwrap();
  assert_eq!(used, encoded.len());
  assert_eq!(decoded, input);
}

/// §8's rANS length bound, checked for both orders over several random
/// buffer sizes against the codec's own declared worst case.
#[test]
fn rans_length_bound_holds_for_random_inputs() {
  let mut rng = rand::thread_rng();
  for &len in &[4usize, 16, 256, 4096, 65536] {
    let input: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
    for order in [rans::Order::Zero, rans::Order::One] {
      let encoded = rans::compress(&input, order).unwrap();
      let bound = rans::rans_compress_bound(len, order);
      assert!(
        encoded.len() <= bound,
        "order {order:?} len {len}: encoded {} exceeds bound {bound}",
        encoded.len()
      );
    }
  }
}

/// Determinism (§8): repeated encodes of the same input with the same
/// parameters produce bit-identical output, across every layer.
#[test]
fn encoding_is_deterministic_across_every_layer() {
  let input = b"the quick brown fox jumps over the lazy dog, repeatedly, and again".repeat(4);
  assert_eq!(rans::compress(&input, rans::Order::Zero).unwrap(), rans::compress(&input, rans::Order::Zero).unwrap());
  assert_eq!(rans::compress(&input, rans::Order::One).unwrap(), rans::compress(&input, rans::Order::One).unwrap());
  assert_eq!(pack::compress(&input), pack::compress(&input));
  assert_eq!(crate::rle::compress(&input), crate::rle::compress(&input));
  assert_eq!(meta::compress(&input, MetaCodecConfig::default()), meta::compress(&input, MetaCodecConfig::default()));

  let block = names(&["read_0001", "read_0002", "read_0003"]);
  let cfg = TokenizerConfig::default();
  let desc_a = encode_block(&block, &cfg).unwrap();
  let desc_b = encode_block(&block, &cfg).unwrap();
  for p in 0..crate::constants::MAX_TOKENS {
    for t in 0u8..16 {
      assert_eq!(desc_a.stream(p, t), desc_b.stream(p, t));
    }
  }
}

/// Tokeniser line-identity (§8): decoding an encoded block reproduces
/// every original line exactly, across a block with a varied mix of
/// alphabetic, numeric, leading-zero, and duplicate lines.
#[test]
fn tokeniser_line_identity_holds_over_a_mixed_block() {
  let block = names(&[
    "read_00001/1",
    "read_00002/1",
    "read_00002/1",
    "read_00099/2",
    "read_00100/2",
    "unrelated_line_with_no_shared_prefix",
    "read_00100/2",
  ]);
  let cfg = TokenizerConfig::default();
  let desc = encode_block(&block, &cfg).unwrap();
  let decoded = decode_block(&desc, block.len(), &cfg).unwrap();
  assert_eq!(decoded, block);
}

/// DUP equivalence (§8): if line `i` and line `j` (`i < j`) are byte-equal,
/// encoding emits a DUP control token at line `j` with distance `>= j - i`.
#[test]
fn identical_lines_emit_a_dup_token_with_at_least_the_true_distance() {
  let block = names(&["foo", "bar", "foo"]);
  let cfg = TokenizerConfig::default();
  let desc = encode_block(&block, &cfg).unwrap();

  // Token-type stream at position 0 for the 3 lines, in order: DIFF(foo),
  // DIFF(bar, unrelated to "foo"), DUP(foo again).
  const TYPE_DUP: u8 = 1;
  let types = desc.stream(0, 0);
  assert_eq!(types, &[TYPE_DIFF, TYPE_DIFF, TYPE_DUP]);

  let dup_distance = u32::from_le_bytes(desc.stream(0, TYPE_DUP)[0..4].try_into().unwrap());
  assert!(dup_distance >= 2, "line 2 duplicates line 0, a true distance of 2");
}

/// Width preservation (§8): a digit run with leading zeros round-trips to
/// the exact same textual width through MATCH, DDELTA0, and fresh-literal
/// paths alike.
#[test]
fn leading_zero_width_round_trips_through_every_encoding_path() {
  let block = names(&[
    "sample_00007_a", // fresh DIGITS0, width 5
    "sample_00007_a", // DUP
    "sample_00008_a", // DDELTA0 (width matches, delta 1)
    "sample_01000_a", // fresh DIGITS0 again (delta would exceed width semantics cleanly)
  ]);
  let cfg = TokenizerConfig::default();
  let desc = encode_block(&block, &cfg).unwrap();
  let decoded = decode_block(&desc, block.len(), &cfg).unwrap();
  assert_eq!(decoded, block);
}

/// PACK alphabet bound (§8): whichever packed mode the codec picks, the
/// input's distinct-symbol count never exceeds that mode's capacity.
#[test]
fn pack_mode_never_exceeds_its_alphabet_capacity() {
  let mut rng = rand::thread_rng();
  for alphabet_size in 1usize..=20 {
    let symbols: Vec<u8> = (0..alphabet_size as u8).collect();
    let input: Vec<u8> = (0..200).map(|_| symbols[rng.gen_range(0..alphabet_size)]).collect();
    let encoded = pack::compress(&input);
    let (_, used) = crate::varint::read(&encoded).unwrap();
    let mode = encoded[used];
    let capacity = match mode {
      0 => 1,
      8 => 2,
      4 => 4,
      2 => 16,
      1 => usize::MAX,
      other => panic!("unrecognised pack mode {other}"),
    };
    assert!(alphabet_size <= capacity, "alphabet {alphabet_size} exceeds mode {mode}'s capacity {capacity}");
  }
}

/// §8 scenario 6: a block of 1000 identical names compresses, after the
/// meta-codec, to well under the 4 KiB ceiling the scenario names.
#[test]
fn scenario_thousand_identical_names_compress_under_four_kibibytes() {
  let block: Vec<Vec<u8>> = std::iter::repeat(b"SRR608881.42 FCD0F0WABXX:7:1101:1439:2199/1".to_vec())
    .take(1000)
    .collect();
  let cfg = TokenizerConfig::default();
  let desc = encode_block(&block, &cfg).unwrap();

  let mcfg = MetaCodecConfig::default();
  let total: usize = desc.non_empty().map(|(_, bytes)| meta::compress(bytes, mcfg).len()).sum();
  assert!(total <= 4096, "compressed descriptor total {total} exceeds the 4 KiB scenario ceiling");

  // Every line after the first should be a DUP with distance 1.
  let types = desc.stream(0, 0);
  const TYPE_DUP: u8 = 1;
  assert_eq!(types[0], TYPE_DIFF);
  assert!(types[1..].iter().all(|&t| t == TYPE_DUP));

  let decoded = decode_block(&desc, block.len(), &cfg).unwrap();
  assert_eq!(decoded, block);
}

/// Meta-codec round-trip and `uncompressed_size` probe (§8), exercised
/// over a spread of inputs including ones that land on every codec family.
#[test]
fn meta_codec_round_trips_and_probes_size_without_decoding() {
  let cfg = MetaCodecConfig::default();
  let inputs: Vec<Vec<u8>> = vec![
    Vec::new(),
    b"x".to_vec(),
    b"AAAAAAAABBBBCCCC".to_vec(),
    b"the quick brown fox jumps over the lazy dog".repeat(10),
    (0u32..2000).map(|i| ((i * 2654435761) % 256) as u8).collect(),
  ];
  for input in inputs {
    let encoded = meta::compress(&input, cfg);
    let (decoded, used) = meta::decompress(&encoded).unwrap();
    assert_eq!(used, encoded.len());
    assert_eq!(decoded, input);

    // The probe only names the *final* length for tags that wrap the
    // original bytes directly; the four rans-over-{rle,pack} compose
    // forms (tags 6-9) report an intermediate length instead (see
    // meta::uncompressed_size's doc comment).
    if !(6..=9).contains(&encoded[0]) {
      assert_eq!(meta::uncompressed_size(&encoded).unwrap() as usize, input.len());
    }
  }
}

/// A descriptor stream truncated out from under the decoder (as a
/// corrupted or short-written block might produce) is a fatal error
/// rather than a silent misread.
#[test]
fn truncated_tokeniser_stream_is_a_fatal_error() {
  let block = names(&["read_0001", "read_0002"]);
  let cfg = TokenizerConfig::default();
  let mut desc = encode_block(&block, &cfg).unwrap();
  // "read" is token position 1's ALPHA run (type 3); blanking its
  // NUL-terminated payload stream leaves decode unable to find the
  // terminator it expects.
  const TYPE_ALPHA: u8 = 3;
  let alpha_idx = Descriptors::index(1, TYPE_ALPHA);
  let raw = desc.stream(1, TYPE_ALPHA).to_vec();
  assert!(!raw.is_empty(), "position 1 should hold a fresh ALPHA token for the first line");
  desc.set_raw(alpha_idx, Vec::new());
  assert!(decode_block(&desc, block.len(), &cfg).is_err());
}
