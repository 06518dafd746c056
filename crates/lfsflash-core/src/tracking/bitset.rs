//! Fixed-length bitset, one bit per erase block

use alloc::vec;
use alloc::vec::Vec;

const WORD_BITS: u32 = u32::BITS;

/// Fixed-length set of block numbers
///
/// Indices at or beyond [`len`](Self::len) are never members: `set` and
/// `clear` ignore them and `test` reports false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitset {
    words: Vec<u32>,
    len: u32,
}

impl Bitset {
    /// Create an empty set able to hold `len` bits
    pub fn new(len: u32) -> Self {
        let words = len.div_ceil(WORD_BITS) as usize;
        Self {
            words: vec![0; words],
            len,
        }
    }

    /// Number of bits in the set
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Returns true if the set holds no bits at all
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn locate(&self, index: u32) -> Option<(usize, u32)> {
        if index < self.len {
            Some(((index / WORD_BITS) as usize, 1 << (index % WORD_BITS)))
        } else {
            None
        }
    }

    /// Set bit `index`
    pub fn set(&mut self, index: u32) {
        if let Some((word, mask)) = self.locate(index) {
            self.words[word] |= mask;
        }
    }

    /// Clear bit `index`
    pub fn clear(&mut self, index: u32) {
        if let Some((word, mask)) = self.locate(index) {
            self.words[word] &= !mask;
        }
    }

    /// Test bit `index`
    pub fn test(&self, index: u32) -> bool {
        match self.locate(index) {
            Some((word, mask)) => self.words[word] & mask != 0,
            None => false,
        }
    }

    /// Number of set bits
    pub fn count_set(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Clear every bit
    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// Iterate over the indices of set bits in ascending order
    pub fn iter_set(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len).filter(move |&i| self.test(i))
    }
}
