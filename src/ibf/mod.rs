//! The interleaved Bloom filter (IBF).
//!
//! An IBF stores many Bloom filters, called bins, in one bit array. For every hash function offset, the bits
//! of all bins are stored next to each other. A membership query therefore answers for all bins at once by
//! combining a few consecutive words of the array.
//!
//! Queries are done by agents, which own the buffers for their results. An agent borrows the filter, so the
//! filter can not be modified while an agent for it is alive.
//!
//! ```
//! use seqdex::ibf::{BinCount, BinIndex, BinSize, HashFunctionCount, InterleavedBloomFilter};
//!
//! let mut ibf = InterleavedBloomFilter::new(BinCount(12), BinSize(8192), HashFunctionCount(2)).unwrap();
//! ibf.emplace(126, BinIndex(0)).unwrap();
//! ibf.emplace(712, BinIndex(3)).unwrap();
//! ibf.emplace(237, BinIndex(9)).unwrap();
//!
//! let mut agent = ibf.membership_agent();
//! let result = agent.bulk_contains(712);
//! assert_eq!(result.ones().collect::<Vec<_>>(), [3]);
//! ```

mod agent;
mod compressed;
mod directory;

use crate::error::{Error, Result};

#[doc(inline)]
pub use agent::{BinningBitvector, CountingAgent, MembershipAgent};
#[doc(inline)]
pub use compressed::CompressedInterleavedBloomFilter;
#[doc(inline)]
pub use directory::{BinningDirectory, DirectoryCountingAgent, SequenceHashing};

/// The number of bins of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BinCount(pub usize);

/// The number of bits per bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BinSize(pub usize);

/// The number of hash functions, between 1 and 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashFunctionCount(pub usize);

/// The index of a bin, smaller than the [`BinCount`] of the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BinIndex(pub usize);

const MAX_HASH_FUNCTIONS: usize = 5;

// 2^64 divided by e/2, sqrt(2), sqrt(3), sqrt(5) and sqrt(7)
const HASH_SEEDS: [u64; MAX_HASH_FUNCTIONS] = [
    13572355802537770549,
    13043817825332782213,
    10650232656628343401,
    16499269484942379435,
    4893150838803335377,
];

// 2^64 divided by the golden ratio
const HASH_SPREAD: u64 = 11400714819323198485;

/// Sizes shared by the uncompressed and the compressed filter.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    bin_count: usize,
    bin_size: usize,
    hash_function_count: usize,
    // number of words that hold one bit of every bin
    bin_words: usize,
    hash_shift: u32,
}

impl Layout {
    fn new(bin_count: BinCount, bin_size: BinSize, hash_function_count: HashFunctionCount) -> Result<Self> {
        if bin_count.0 == 0 {
            return Err(Error::InvalidBinCount);
        }

        if bin_size.0 == 0 {
            return Err(Error::InvalidBinSize);
        }

        if !(1..=MAX_HASH_FUNCTIONS).contains(&hash_function_count.0) {
            return Err(Error::InvalidHashFunctionCount(hash_function_count.0));
        }

        Ok(Self {
            bin_count: bin_count.0,
            bin_size: bin_size.0,
            hash_function_count: hash_function_count.0,
            bin_words: bin_count.0.div_ceil(64),
            hash_shift: (bin_size.0 as u64).leading_zeros(),
        })
    }

    pub(crate) fn bin_count(&self) -> usize {
        self.bin_count
    }

    pub(crate) fn bin_words(&self) -> usize {
        self.bin_words
    }

    fn technical_bin_count(&self) -> usize {
        self.bin_words * 64
    }

    fn num_words(&self) -> usize {
        self.bin_size * self.bin_words
    }

    // index of the first word of the row that the hash function with the given seed maps the value to
    pub(crate) fn row_start_word(&self, value: u64, seed: u64) -> usize {
        let mut h = value.wrapping_mul(seed);
        h ^= h >> self.hash_shift;
        h = h.wrapping_mul(HASH_SPREAD);
        let row = ((h as u128 * self.bin_size as u128) >> 64) as usize;

        row * self.bin_words
    }

    pub(crate) fn hash_seeds(&self) -> &'static [u64] {
        &HASH_SEEDS[..self.hash_function_count]
    }

    fn check_bin(&self, bin: BinIndex) -> Result<()> {
        if bin.0 < self.bin_count {
            Ok(())
        } else {
            Err(Error::BinIndexOutOfRange {
                bin_index: bin.0,
                bin_count: self.bin_count,
            })
        }
    }
}

/// Read access to the bits of a filter. Implemented by both filter variants.
pub trait FilterStorage: sealed::Sealed {
    #[doc(hidden)]
    fn layout(&self) -> &Layout;

    #[doc(hidden)]
    fn word(&self, index: usize) -> u64;
}

/// The mutable interleaved Bloom filter.
///
/// All bins share the same number of bits and hash functions. Values are `u64`, for example k-mer hashes
/// from [`KmerHashes`](crate::kmer::KmerHashes). Concurrent modification needs external synchronization.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterleavedBloomFilter {
    layout: Layout,
    data: Vec<u64>,
}

impl InterleavedBloomFilter {
    /// Creates an empty filter.
    ///
    /// Fails if there are no bins, the bins have no bits or the number of hash functions is not in `1..=5`.
    pub fn new(
        bin_count: BinCount,
        bin_size: BinSize,
        hash_function_count: HashFunctionCount,
    ) -> Result<Self> {
        let layout = Layout::new(bin_count, bin_size, hash_function_count)?;

        log::debug!(
            "created interleaved Bloom filter with {} bins of {} bits and {} hash functions",
            layout.bin_count,
            layout.bin_size,
            layout.hash_function_count
        );

        Ok(Self {
            layout,
            data: vec![0; layout.num_words()],
        })
    }

    /// Inserts `value` into the bin. Inserting the same value twice has no further effect.
    pub fn emplace(&mut self, value: u64, bin: BinIndex) -> Result<()> {
        self.layout.check_bin(bin)?;

        let word_in_row = bin.0 / 64;
        let mask = 1u64 << (bin.0 % 64);

        for &seed in self.layout.hash_seeds() {
            let row_start = self.layout.row_start_word(value, seed);
            self.data[row_start + word_in_row] |= mask;
        }

        Ok(())
    }

    /// Removes all values from the bin. Other bins are not affected.
    pub fn clear(&mut self, bin: BinIndex) -> Result<()> {
        self.clear_many([bin])
    }

    /// Removes all values from the given bins in one pass over the filter.
    ///
    /// If any of the bin indices is out of range, nothing is cleared.
    pub fn clear_many(&mut self, bins: impl IntoIterator<Item = BinIndex>) -> Result<()> {
        let mut keep_mask = vec![u64::MAX; self.layout.bin_words];

        for bin in bins {
            self.layout.check_bin(bin)?;
            keep_mask[bin.0 / 64] &= !(1u64 << (bin.0 % 64));
        }

        for row in self.data.chunks_exact_mut(self.layout.bin_words) {
            for (word, &keep) in row.iter_mut().zip(&keep_mask) {
                *word &= keep;
            }
        }

        Ok(())
    }

    /// Increases the number of bins. The existing bins keep their contents, the new bins are empty.
    ///
    /// Agents of the filter can not outlive this call, so new agents have to be created afterwards.
    /// Fails if `new_bin_count` is smaller than the current bin count.
    pub fn increase_bin_number_to(&mut self, new_bin_count: BinCount) -> Result<()> {
        if new_bin_count.0 < self.layout.bin_count {
            return Err(Error::BinCountDecrease {
                current: self.layout.bin_count,
                requested: new_bin_count.0,
            });
        }

        let new_layout = Layout {
            bin_count: new_bin_count.0,
            bin_words: new_bin_count.0.div_ceil(64),
            ..self.layout
        };

        // hash rows stay the same, only their width changes
        if new_layout.bin_words != self.layout.bin_words {
            let mut data = vec![0; new_layout.num_words()];

            for (new_row, old_row) in data
                .chunks_exact_mut(new_layout.bin_words)
                .zip(self.data.chunks_exact(self.layout.bin_words))
            {
                new_row[..old_row.len()].copy_from_slice(old_row);
            }

            self.data = data;
        }

        log::info!(
            "increased bin count of interleaved Bloom filter from {} to {}",
            self.layout.bin_count,
            new_layout.bin_count
        );

        self.layout = new_layout;

        Ok(())
    }

    pub fn bin_count(&self) -> usize {
        self.layout.bin_count
    }

    pub fn bin_size(&self) -> usize {
        self.layout.bin_size
    }

    pub fn hash_function_count(&self) -> usize {
        self.layout.hash_function_count
    }

    /// The number of bits of the underlying bit array, including the padding bins.
    pub fn bit_size(&self) -> usize {
        self.layout.bin_size * self.layout.technical_bin_count()
    }

    pub fn membership_agent(&self) -> MembershipAgent<'_, Self> {
        MembershipAgent::new(self)
    }

    /// Creates a counting agent with counters of type `T`, for example `u16`.
    pub fn counting_agent<T: num_traits::PrimInt>(&self) -> CountingAgent<'_, Self, T> {
        CountingAgent::new(self)
    }

    pub(crate) fn words(&self) -> &[u64] {
        &self.data
    }
}

impl FilterStorage for InterleavedBloomFilter {
    fn layout(&self) -> &Layout {
        &self.layout
    }

    fn word(&self, index: usize) -> u64 {
        self.data[index]
    }
}

impl sealed::Sealed for InterleavedBloomFilter {}

#[cfg(feature = "savefile")]
impl InterleavedBloomFilter {
    const VERSION_FOR_SAVEFILE: u32 = 0;

    pub fn load_from_reader(reader: &mut impl std::io::Read) -> Result<Self> {
        let filter: Self = savefile::load(reader, Self::VERSION_FOR_SAVEFILE)?;
        filter.validated()
    }

    pub fn load_from_file(filepath: impl AsRef<std::path::Path>) -> Result<Self> {
        let filter: Self = savefile::load_file(filepath, Self::VERSION_FOR_SAVEFILE)?;
        filter.validated()
    }

    pub fn save_to_writer(&self, writer: &mut impl std::io::Write) -> Result<()> {
        savefile::save(writer, Self::VERSION_FOR_SAVEFILE, self)?;
        Ok(())
    }

    pub fn save_to_file(&self, filepath: impl AsRef<std::path::Path>) -> Result<()> {
        savefile::save_file(filepath, Self::VERSION_FOR_SAVEFILE, self)?;
        Ok(())
    }

    // the stored bits must fit the stored layout
    fn validated(self) -> Result<Self> {
        let layout = self.layout.validated()?;

        if self.data.len() != layout.num_words() {
            return Err(Error::CorruptedFilter(format!(
                "expected {} words of bits, found {}",
                layout.num_words(),
                self.data.len()
            )));
        }

        Ok(self)
    }
}

#[cfg(feature = "savefile")]
impl Layout {
    // all derived sizes must agree with the stored parameters
    fn validated(self) -> Result<Self> {
        let expected = Layout::new(
            BinCount(self.bin_count),
            BinSize(self.bin_size),
            HashFunctionCount(self.hash_function_count),
        )
        .map_err(|e| Error::CorruptedFilter(e.to_string()))?;

        if expected != self {
            return Err(Error::CorruptedFilter(format!(
                "stored layout {self:?} does not match its parameters"
            )));
        }

        Ok(self)
    }
}

mod sealed {
    pub trait Sealed {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(bins: usize) -> InterleavedBloomFilter {
        InterleavedBloomFilter::new(BinCount(bins), BinSize(1024), HashFunctionCount(3)).unwrap()
    }

    #[test]
    fn layout_sizes() {
        let ibf = filter(65);

        assert_eq!(ibf.bin_count(), 65);
        assert_eq!(ibf.layout.bin_words, 2);
        assert_eq!(ibf.bit_size(), 1024 * 128);
        assert_eq!(ibf.words().len(), 1024 * 2);
        assert_eq!(ibf.layout.hash_shift, 53);
    }

    #[test]
    fn row_start_is_in_range() {
        let ibf = filter(130);

        for value in 0..10_000u64 {
            for &seed in ibf.layout.hash_seeds() {
                let start = ibf.layout.row_start_word(value, seed);
                assert_eq!(start % 3, 0);
                assert!(start + 3 <= ibf.words().len());
            }
        }
    }

    #[test]
    fn emplace_sets_one_bit_per_hash_function() {
        let mut ibf = filter(10);
        ibf.emplace(42, BinIndex(7)).unwrap();

        let set_bits: u32 = ibf.words().iter().map(|w| w.count_ones()).sum();
        assert!((1..=3).contains(&set_bits));
        assert!(ibf.words().iter().all(|&w| w & !(1 << 7) == 0));
    }

    #[test]
    fn invalid_parameters() {
        assert!(matches!(
            InterleavedBloomFilter::new(BinCount(0), BinSize(8), HashFunctionCount(2)),
            Err(Error::InvalidBinCount)
        ));
        assert!(matches!(
            InterleavedBloomFilter::new(BinCount(3), BinSize(0), HashFunctionCount(2)),
            Err(Error::InvalidBinSize)
        ));
        assert!(matches!(
            InterleavedBloomFilter::new(BinCount(3), BinSize(8), HashFunctionCount(6)),
            Err(Error::InvalidHashFunctionCount(6))
        ));
        assert!(matches!(
            InterleavedBloomFilter::new(BinCount(3), BinSize(8), HashFunctionCount(0)),
            Err(Error::InvalidHashFunctionCount(0))
        ));
    }

    #[test]
    fn resize_within_same_word_count_keeps_data() {
        let mut ibf = filter(10);
        ibf.emplace(5, BinIndex(2)).unwrap();
        let before = ibf.words().to_vec();

        ibf.increase_bin_number_to(BinCount(64)).unwrap();
        assert_eq!(ibf.words(), before);
        assert_eq!(ibf.bin_count(), 64);

        ibf.increase_bin_number_to(BinCount(64)).unwrap();
        assert!(matches!(
            ibf.increase_bin_number_to(BinCount(63)),
            Err(Error::BinCountDecrease {
                current: 64,
                requested: 63
            })
        ));
    }
}
