use super::{CountingAgent, FilterStorage, InterleavedBloomFilter, Layout, MembershipAgent, sealed};
#[cfg(feature = "savefile")]
use crate::error::{Error, Result};

use roaring::RoaringTreemap;

/// An immutable interleaved Bloom filter that only stores the positions of its set bits.
///
/// Sparse filters need much less memory in this representation. Queries give the same results as for the
/// filter it was created from, but are slower.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedInterleavedBloomFilter {
    layout: Layout,
    set_bits: RoaringTreemap,
}

impl CompressedInterleavedBloomFilter {
    pub fn bin_count(&self) -> usize {
        self.layout.bin_count
    }

    pub fn bin_size(&self) -> usize {
        self.layout.bin_size
    }

    pub fn hash_function_count(&self) -> usize {
        self.layout.hash_function_count
    }

    pub fn bit_size(&self) -> usize {
        self.layout.bin_size * self.layout.technical_bin_count()
    }

    /// The number of set bits.
    pub fn count_ones(&self) -> u64 {
        self.set_bits.len()
    }

    pub fn membership_agent(&self) -> MembershipAgent<'_, Self> {
        MembershipAgent::new(self)
    }

    pub fn counting_agent<T: num_traits::PrimInt>(&self) -> CountingAgent<'_, Self, T> {
        CountingAgent::new(self)
    }
}

impl From<&InterleavedBloomFilter> for CompressedInterleavedBloomFilter {
    fn from(filter: &InterleavedBloomFilter) -> Self {
        let set_bits: RoaringTreemap = filter
            .words()
            .iter()
            .enumerate()
            .flat_map(|(word_idx, &word)| {
                (0..64u64)
                    .filter(move |bit| (word >> bit) & 1 == 1)
                    .map(move |bit| word_idx as u64 * 64 + bit)
            })
            .collect();

        log::info!(
            "compressed interleaved Bloom filter of {} bits to {} set bits",
            filter.bit_size(),
            set_bits.len()
        );

        Self {
            layout: *filter.layout(),
            set_bits,
        }
    }
}

impl FilterStorage for CompressedInterleavedBloomFilter {
    fn layout(&self) -> &Layout {
        &self.layout
    }

    fn word(&self, index: usize) -> u64 {
        let first_bit = index as u64 * 64;

        let mut bits = self.set_bits.iter();
        bits.advance_to(first_bit);

        bits.take_while(|&bit| bit < first_bit + 64)
            .fold(0, |word, bit| word | (1 << (bit - first_bit)))
    }
}

impl sealed::Sealed for CompressedInterleavedBloomFilter {}

// the set bits are stored in the portable roaring format
#[cfg(feature = "savefile")]
#[derive(savefile::savefile_derive::Savefile)]
struct CompressedData {
    layout: Layout,
    set_bits: Vec<u8>,
}

#[cfg(feature = "savefile")]
impl CompressedInterleavedBloomFilter {
    const VERSION_FOR_SAVEFILE: u32 = 0;

    pub fn load_from_reader(reader: &mut impl std::io::Read) -> Result<Self> {
        let data: CompressedData = savefile::load(reader, Self::VERSION_FOR_SAVEFILE)?;
        Self::from_loaded_data(data)
    }

    pub fn load_from_file(filepath: impl AsRef<std::path::Path>) -> Result<Self> {
        let data: CompressedData = savefile::load_file(filepath, Self::VERSION_FOR_SAVEFILE)?;
        Self::from_loaded_data(data)
    }

    pub fn save_to_writer(&self, writer: &mut impl std::io::Write) -> Result<()> {
        savefile::save(writer, Self::VERSION_FOR_SAVEFILE, &self.to_data()?)?;
        Ok(())
    }

    pub fn save_to_file(&self, filepath: impl AsRef<std::path::Path>) -> Result<()> {
        savefile::save_file(filepath, Self::VERSION_FOR_SAVEFILE, &self.to_data()?)?;
        Ok(())
    }

    fn to_data(&self) -> Result<CompressedData> {
        let mut set_bits = Vec::with_capacity(self.set_bits.serialized_size());
        self.set_bits.serialize_into(&mut set_bits)?;

        Ok(CompressedData {
            layout: self.layout,
            set_bits,
        })
    }

    fn from_loaded_data(data: CompressedData) -> Result<Self> {
        let layout = data.layout.validated()?;

        let set_bits = RoaringTreemap::deserialize_from(data.set_bits.as_slice())
            .map_err(|e| Error::CorruptedFilter(e.to_string()))?;

        let bit_size = (layout.bin_size * layout.technical_bin_count()) as u64;
        if let Some(max) = set_bits.max()
            && max >= bit_size
        {
            return Err(Error::CorruptedFilter(format!(
                "set bit {max} is outside of the {bit_size} bits of the filter"
            )));
        }

        Ok(Self { layout, set_bits })
    }
}
