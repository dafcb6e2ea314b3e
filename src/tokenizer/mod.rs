//! Name tokeniser (§3, §4.E): decomposes successive read names into a
//! per-line sequence of typed tokens, delta-encoded against a reference
//! line chosen by the encoder's prefix trie, and writes each token's type
//! and payload into the descriptor addressed by (position, type).
//!
//! [`encode_block`] and [`decode_block`] are the two halves of the
//! contract: they must stay in lock-step, since any mis-framing on one
//! side corrupts every line after it on the other.

mod context;
pub mod descriptors;
mod decode;
mod encode;
mod token;
mod trie;

pub use decode::decode_block;
pub use descriptors::Descriptors;
pub use encode::encode_block;
