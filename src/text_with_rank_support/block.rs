use crate::maybe_savefile::MaybeSavefile;

// the distinction of block types only exists to be able to set repr(align(64)) for the 512 bit block

/// The bit block used internally by [`CondensedTextWithRankSupport`](super::CondensedTextWithRankSupport).
///
/// Currently, this can either be [`Block64`] or [`Block512`], with [`Block64`] being the default.
///
/// Larger blocks lead to slightly higher running times of rank queries, but consume less memory, because
/// fewer block offsets have to be stored. For small alphabets like DNA, the difference in memory usage is
/// almost irrelevant, so [`Block64`] is recommended.
pub trait Block: sealed::Sealed + Clone + Copy + Send + Sync + MaybeSavefile + 'static {
    #[doc(hidden)]
    const NUM_BITS: usize;

    #[doc(hidden)]
    fn zeroes() -> Self;

    #[doc(hidden)]
    fn ones() -> Self;

    /// Clears every bit of `self` at which `plane` does not hold `bit`.
    #[doc(hidden)]
    fn retain_matching(&mut self, plane: Self, bit: bool);

    #[doc(hidden)]
    fn count_ones_before(&self, idx: usize) -> usize;

    #[doc(hidden)]
    fn get_bit(&self, idx: usize) -> bool;

    #[doc(hidden)]
    fn set_bit(&mut self, idx: usize);
}

/// Smaller blocks, recommended for alphabets with few symbols, like DNA alphabets.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block64 {
    data: u64,
}

impl sealed::Sealed for Block64 {}

impl MaybeSavefile for Block64 {}

impl Block for Block64 {
    const NUM_BITS: usize = 64;

    fn zeroes() -> Self {
        Self { data: 0 }
    }

    fn ones() -> Self {
        Self { data: u64::MAX }
    }

    fn retain_matching(&mut self, plane: Self, bit: bool) {
        self.data &= if bit { plane.data } else { !plane.data };
    }

    fn count_ones_before(&self, idx: usize) -> usize {
        (self.data & low_bits_mask(idx)).count_ones() as usize
    }

    fn get_bit(&self, idx: usize) -> bool {
        (self.data >> idx) & 1 == 1
    }

    fn set_bit(&mut self, idx: usize) {
        self.data |= 1 << idx;
    }
}

/// Larger blocks, recommended for alphabets with many symbols, like ASCII text.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(align(64))]
pub struct Block512 {
    data: [u64; 8],
}

impl sealed::Sealed for Block512 {}

impl MaybeSavefile for Block512 {}

impl Block for Block512 {
    const NUM_BITS: usize = 512;

    fn zeroes() -> Self {
        Self { data: [0; 8] }
    }

    fn ones() -> Self {
        Self {
            data: [u64::MAX; 8],
        }
    }

    fn retain_matching(&mut self, plane: Self, bit: bool) {
        for (word, plane_word) in self.data.iter_mut().zip(plane.data) {
            *word &= if bit { plane_word } else { !plane_word };
        }
    }

    fn count_ones_before(&self, idx: usize) -> usize {
        let full_words = idx / 64;

        let full: u32 = self.data[..full_words].iter().map(|w| w.count_ones()).sum();
        let partial = if full_words < 8 {
            (self.data[full_words] & low_bits_mask(idx % 64)).count_ones()
        } else {
            0
        };

        (full + partial) as usize
    }

    fn get_bit(&self, idx: usize) -> bool {
        (self.data[idx / 64] >> (idx % 64)) & 1 == 1
    }

    fn set_bit(&mut self, idx: usize) {
        self.data[idx / 64] |= 1 << (idx % 64);
    }
}

// mask with the lowest `num_bits` bits set, num_bits < 64
fn low_bits_mask(num_bits: usize) -> u64 {
    !(u64::MAX << num_bits)
}

mod sealed {
    pub trait Sealed {}
}
