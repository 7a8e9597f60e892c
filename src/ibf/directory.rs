use super::{BinCount, BinIndex, BinSize, CountingAgent, HashFunctionCount, InterleavedBloomFilter};
use crate::Symbol;
use crate::error::Result;
use crate::kmer::{self, KmerHashes, MinimiserHashes};

use std::marker::PhantomData;

/// How a sequence is turned into the values that are stored in the filter.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceHashing {
    /// All [`KmerHashes`] of the sequence.
    Kmer { k: usize },
    /// The [`MinimiserHashes`] of the sequence.
    Minimiser {
        k: usize,
        window_size: usize,
        seed: u64,
    },
}

impl SequenceHashing {
    /// Minimisers with the [`DEFAULT_MINIMISER_SEED`](kmer::DEFAULT_MINIMISER_SEED).
    pub fn minimiser(k: usize, window_size: usize) -> Self {
        Self::Minimiser {
            k,
            window_size,
            seed: kmer::DEFAULT_MINIMISER_SEED,
        }
    }

    fn check<S: Symbol>(&self) -> Result<()> {
        match *self {
            Self::Kmer { k } => kmer::check_kmer_size::<S>(k),
            Self::Minimiser { k, window_size, .. } => kmer::check_minimiser_parameters::<S>(k, window_size),
        }
    }

    // parameters were checked for S when the directory was created or loaded
    fn hashes<'s, S: Symbol>(&self, sequence: &'s [S]) -> SequenceHashes<'s, S> {
        match *self {
            Self::Kmer { k } => SequenceHashes::Kmer(KmerHashes::with_checked_k(sequence, k)),
            Self::Minimiser {
                k,
                window_size,
                seed,
            } => SequenceHashes::Minimiser(MinimiserHashes::with_checked_parameters(
                sequence,
                k,
                window_size,
                seed,
            )),
        }
    }
}

enum SequenceHashes<'s, S> {
    Kmer(KmerHashes<'s, S>),
    Minimiser(MinimiserHashes<'s, S>),
}

impl<S: Symbol> Iterator for SequenceHashes<'_, S> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        match self {
            Self::Kmer(hashes) => hashes.next(),
            Self::Minimiser(hashes) => hashes.next(),
        }
    }
}

#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, PartialEq, Eq)]
struct DirectoryData {
    filter: InterleavedBloomFilter,
    hashing: SequenceHashing,
    alphabet_size: usize,
}

/// An [`InterleavedBloomFilter`] that stores whole sequences.
///
/// Sequences are hashed with the [`SequenceHashing`] of the directory. A query sequence is hashed the same
/// way and [`DirectoryCountingAgent::bulk_count`] reports for every bin how many of its hashes the bin
/// (probably) contains.
///
/// ```
/// use seqdex::alphabet::{AsciiSymbol, Dna4};
/// use seqdex::ibf::{BinCount, BinIndex, BinSize, BinningDirectory, HashFunctionCount, SequenceHashing};
///
/// let mut directory = BinningDirectory::<Dna4>::new(
///     BinCount(2),
///     BinSize(4096),
///     HashFunctionCount(2),
///     SequenceHashing::Kmer { k: 4 },
/// )
/// .unwrap();
///
/// directory.emplace(&Dna4::encode(b"ACGTACGTTTGA").unwrap(), BinIndex(1)).unwrap();
///
/// let mut agent = directory.counting_agent::<u16>();
/// let counts = agent.bulk_count(&Dna4::encode(b"CGTACG").unwrap());
///
/// assert_eq!(counts[1], 3);
/// ```
pub struct BinningDirectory<S> {
    data: DirectoryData,
    _symbol_marker: PhantomData<fn() -> S>,
}

impl<S> Clone for BinningDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            _symbol_marker: PhantomData,
        }
    }
}

impl<S> std::fmt::Debug for BinningDirectory<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinningDirectory")
            .field("filter", &self.data.filter)
            .field("hashing", &self.data.hashing)
            .finish()
    }
}

impl<S: Symbol> BinningDirectory<S> {
    /// Fails for invalid filter parameters (see [`InterleavedBloomFilter::new`]) or invalid hashing parameters.
    pub fn new(
        bin_count: BinCount,
        bin_size: BinSize,
        hash_function_count: HashFunctionCount,
        hashing: SequenceHashing,
    ) -> Result<Self> {
        hashing.check::<S>()?;
        let filter = InterleavedBloomFilter::new(bin_count, bin_size, hash_function_count)?;

        Ok(Self::from_data(DirectoryData {
            filter,
            hashing,
            alphabet_size: S::ALPHABET_SIZE,
        }))
    }

    fn from_data(data: DirectoryData) -> Self {
        Self {
            data,
            _symbol_marker: PhantomData,
        }
    }

    /// Inserts all hashes of `sequence` into the bin.
    pub fn emplace(&mut self, sequence: &[S], bin: BinIndex) -> Result<()> {
        self.data.filter.layout.check_bin(bin)?;

        for hash in self.data.hashing.hashes(sequence) {
            self.data.filter.emplace(hash, bin)?;
        }

        Ok(())
    }

    pub fn hashing(&self) -> SequenceHashing {
        self.data.hashing
    }

    /// The underlying filter, for example to run membership queries for single hashes.
    pub fn filter(&self) -> &InterleavedBloomFilter {
        &self.data.filter
    }

    /// Gives access to the bins, for example to [`clear`](InterleavedBloomFilter::clear) them or to increase
    /// their number.
    pub fn filter_mut(&mut self) -> &mut InterleavedBloomFilter {
        &mut self.data.filter
    }

    pub fn counting_agent<T: num_traits::PrimInt>(&self) -> DirectoryCountingAgent<'_, S, T> {
        DirectoryCountingAgent {
            hashing: self.data.hashing,
            agent: self.data.filter.counting_agent(),
            _symbol_marker: PhantomData,
        }
    }
}

#[cfg(feature = "savefile")]
impl<S: Symbol> BinningDirectory<S> {
    const VERSION_FOR_SAVEFILE: u32 = 0;

    pub fn load_from_reader(reader: &mut impl std::io::Read) -> Result<Self> {
        let data: DirectoryData = savefile::load(reader, Self::VERSION_FOR_SAVEFILE)?;
        Self::from_loaded_data(data)
    }

    pub fn load_from_file(filepath: impl AsRef<std::path::Path>) -> Result<Self> {
        let data: DirectoryData = savefile::load_file(filepath, Self::VERSION_FOR_SAVEFILE)?;
        Self::from_loaded_data(data)
    }

    pub fn save_to_writer(&self, writer: &mut impl std::io::Write) -> Result<()> {
        savefile::save(writer, Self::VERSION_FOR_SAVEFILE, &self.data)?;
        Ok(())
    }

    pub fn save_to_file(&self, filepath: impl AsRef<std::path::Path>) -> Result<()> {
        savefile::save_file(filepath, Self::VERSION_FOR_SAVEFILE, &self.data)?;
        Ok(())
    }

    fn from_loaded_data(data: DirectoryData) -> Result<Self> {
        let DirectoryData {
            filter,
            hashing,
            alphabet_size,
        } = data;

        if alphabet_size != S::ALPHABET_SIZE {
            return Err(crate::Error::DirectoryAlphabetMismatch {
                stored: alphabet_size,
                expected: S::ALPHABET_SIZE,
            });
        }

        hashing.check::<S>()?;

        Ok(Self::from_data(DirectoryData {
            filter: filter.validated()?,
            hashing,
            alphabet_size,
        }))
    }
}

/// Counts for all bins of a [`BinningDirectory`] how many hashes of a query sequence they (probably) contain.
pub struct DirectoryCountingAgent<'f, S, T = u16> {
    hashing: SequenceHashing,
    agent: CountingAgent<'f, InterleavedBloomFilter, T>,
    _symbol_marker: PhantomData<fn() -> S>,
}

impl<S: Symbol, T: num_traits::PrimInt> DirectoryCountingAgent<'_, S, T> {
    /// Hashes the query like the stored sequences and counts the hashes per bin.
    pub fn bulk_count(&mut self, query: &[S]) -> &[T] {
        self.agent.bulk_count(self.hashing.hashes(query))
    }
}
