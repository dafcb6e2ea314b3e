//! Shared numeric constants used across the codec catalogue and tokeniser.

// rANS
pub const RANS_TOTFREQ_BITS: u32 = 12;
pub const RANS_TOTFREQ: u32 = 1 << RANS_TOTFREQ_BITS;
pub const RANS_LOWER_BOUND: u32 = 1 << 15;
pub const RANS_NUM_STATES: usize = 4;

// RLE
pub const RLE_GUARD: u8 = 233;
pub const RLE_MIN_RUN: usize = 4;

// PACK
pub const PACK_MAX_ALPHABET: usize = 16;

// meta-codec
pub const META_X4_MIN_LEN: usize = 32;
pub const META_COMPOSE_MIN_LEN: usize = 16;
pub const META_RANS1_MIN_LEN: usize = 4;

// tokeniser
pub const MAX_TOKENS: usize = 128;
pub const MAX_TOKEN_TYPES: usize = 16;
pub const MAX_DESCRIPTORS: usize = MAX_TOKENS * MAX_TOKEN_TYPES;
pub const DEFAULT_MAX_NAMES: usize = 1_000_000;
pub const MAX_DIGITS: usize = 8;
pub const MAX_DIGITS_VALUE: u64 = 100_000_000;
pub const PACBIO_PREFIX_LEN: usize = 60;
pub const ION_TORRENT_PREFIX_LEN: usize = 7;
