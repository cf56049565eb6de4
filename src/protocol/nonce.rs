//! Permit2 SignatureTransfer nonce bitmaps
//!
//! SignatureTransfer nonces are unordered. Permit2 stores them as a mapping
//! from a 248-bit word position to a 256-bit bitmap; nonce `n` lives at word
//! `n >> 8`, bit `n & 0xff`, and a set bit means the nonce has been consumed
//! or invalidated.

use alloy_primitives::U256;

/// One 256-bit word of an owner's nonce bitmap
///
/// # Example
///
/// ```rust
/// use permit2_bridge::NonceBitmap;
/// use alloy_primitives::U256;
///
/// // Nonces 0, 1 and 2 used, so 3 is the next free one.
/// let bitmap = NonceBitmap::new(U256::ZERO, U256::from(0b111u64));
/// assert_eq!(bitmap.first_unused(), Some(U256::from(3u64)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceBitmap {
    word: U256,
    bits: U256,
}

impl NonceBitmap {
    pub const BITS_PER_WORD: usize = 256;

    pub fn new(word: U256, bits: U256) -> Self {
        Self { word, bits }
    }

    /// Splits a nonce into its word position and bit index.
    pub fn position(nonce: U256) -> (U256, usize) {
        let bit = (nonce & U256::from(0xffu64)).to::<usize>();
        (nonce >> 8, bit)
    }

    pub fn word(&self) -> U256 {
        self.word
    }

    pub fn bits(&self) -> U256 {
        self.bits
    }

    /// Whether `nonce` is set in this word. Nonces from other words are
    /// reported as unused.
    pub fn is_used(&self, nonce: U256) -> bool {
        let (word, bit) = Self::position(nonce);
        word == self.word && self.bits.bit(bit)
    }

    /// Sets the bit for `nonce` if it belongs to this word.
    pub fn mark_used(&mut self, nonce: U256) {
        let (word, bit) = Self::position(nonce);
        if word == self.word {
            self.bits.set_bit(bit, true);
        }
    }

    /// Lowest unused nonce in this word, or `None` when all 256 are taken.
    pub fn first_unused(&self) -> Option<U256> {
        let bit = self.bits.trailing_ones();
        if bit >= Self::BITS_PER_WORD {
            return None;
        }
        Some((self.word << 8) | U256::from(bit))
    }

    /// Number of nonces still available in this word.
    pub fn remaining(&self) -> usize {
        Self::BITS_PER_WORD - self.bits.count_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(U256::ZERO, 0)]
    #[case(U256::from(0b1u64), 1)]
    #[case(U256::from(0b1011u64), 2)]
    #[case(U256::from(0xffu64), 8)]
    #[case(U256::MAX >> 1, 255)]
    fn first_unused_in_word_zero(#[case] bits: U256, #[case] expected: u64) {
        let bitmap = NonceBitmap::new(U256::ZERO, bits);
        assert_eq!(bitmap.first_unused(), Some(U256::from(expected)));
    }

    #[test]
    fn full_word_has_no_free_nonce() {
        let bitmap = NonceBitmap::new(U256::ZERO, U256::MAX);
        assert_eq!(bitmap.first_unused(), None);
        assert_eq!(bitmap.remaining(), 0);
    }

    #[test]
    fn later_words_offset_by_256() {
        let bitmap = NonceBitmap::new(U256::from(2u64), U256::from(0b11u64));
        assert_eq!(bitmap.first_unused(), Some(U256::from(514u64)));
    }

    #[rstest]
    #[case(0, 0, 0)]
    #[case(255, 0, 255)]
    #[case(256, 1, 0)]
    #[case(513, 2, 1)]
    fn position_splits_word_and_bit(#[case] nonce: u64, #[case] word: u64, #[case] bit: usize) {
        assert_eq!(
            NonceBitmap::position(U256::from(nonce)),
            (U256::from(word), bit)
        );
    }

    #[test]
    fn marking_reserved_nonces_moves_the_cursor() {
        let mut bitmap = NonceBitmap::new(U256::ZERO, U256::from(0b1u64));
        bitmap.mark_used(U256::from(1u64));
        bitmap.mark_used(U256::from(2u64));
        assert!(bitmap.is_used(U256::from(2u64)));
        assert_eq!(bitmap.first_unused(), Some(U256::from(3u64)));
        assert_eq!(bitmap.remaining(), 253);
    }

    #[test]
    fn marking_other_word_is_ignored() {
        let mut bitmap = NonceBitmap::new(U256::ZERO, U256::ZERO);
        bitmap.mark_used(U256::from(256u64));
        assert!(!bitmap.is_used(U256::from(256u64)));
        assert_eq!(bitmap.first_unused(), Some(U256::ZERO));
    }

    #[test]
    fn gap_below_higher_bits_is_found() {
        // Bits 0..=4 and 6 set; bit 5 is the hole.
        let bitmap = NonceBitmap::new(U256::ZERO, U256::from(0b101_1111u64));
        assert_eq!(bitmap.first_unused(), Some(U256::from(5u64)));
    }
}
