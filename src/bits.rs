//! Bitmap helpers shared by every trie node.
//!
//! A node keeps two 32-bit maps indexed by the 5-bit slice of the key at the
//! node's level. Positions inside the packed key/value/child vectors are the
//! number of set bits below the slice.

/// Bits of the key consumed per trie level (32-way branching).
pub const BITS_PER_LEVEL: u32 = 5;

/// Largest shift a node can sit at; the slice there covers bits 30 and 31.
pub const MAX_SHIFT: u32 = 30;

/// Maximum number of levels for a 32-bit key, `ceil(32 / 5)`.
pub const MAX_DEPTH: usize = 7;

const SLICE_MASK: i32 = 0x1F;

/// 5-bit slice of `key` at `shift`.
///
/// Uses an arithmetic shift of the signed key. Sign extension only touches
/// bits above the mask, so negative keys slice consistently.
#[inline]
pub fn slice_at(key: i32, shift: u32) -> u32 {
    debug_assert!(shift <= MAX_SHIFT);
    ((key >> shift) & SLICE_MASK) as u32
}

#[inline]
pub fn set_bit(map: u32, i: u32) -> u32 {
    map | (1 << i)
}

/// Clears bit `i`, which must currently be set.
#[inline]
pub fn unset_bit(map: u32, i: u32) -> u32 {
    debug_assert!(get_bit(map, i), "bit {i} is not set in {map:#034b}");
    map ^ (1 << i)
}

#[inline]
pub fn get_bit(map: u32, i: u32) -> bool {
    (map & (1 << i)) != 0
}

/// Number of set bits strictly below index `i`.
#[inline]
pub fn bits_before(map: u32, i: u32) -> usize {
    (map & ((1u32 << i) - 1)).count_ones() as usize
}
