//! Token-type tags addressing a descriptor's (position, type) slot (§3, §6).
//!
//! Type 0 at any position is reserved for that position's type-byte stream
//! (the sequence of tags recorded here); every other value names the
//! payload stream holding that type's encoded values. `DZLEN` is not a
//! token kind a line can record — it is the auxiliary width stream a fresh
//! DIGITS0 token writes its leading-zero count to.

pub(crate) const TYPE_DUP: u8 = 1;
pub(crate) const TYPE_DIFF: u8 = 2;
pub(crate) const TYPE_ALPHA: u8 = 3;
pub(crate) const TYPE_CHAR: u8 = 4;
pub(crate) const TYPE_DIGITS: u8 = 5;
pub(crate) const TYPE_DIGITS0: u8 = 6;
pub(crate) const TYPE_DDELTA: u8 = 7;
pub(crate) const TYPE_DDELTA0: u8 = 8;
pub(crate) const TYPE_MATCH: u8 = 9;
pub(crate) const TYPE_END: u8 = 10;
pub(crate) const TYPE_DZLEN: u8 = 11;
