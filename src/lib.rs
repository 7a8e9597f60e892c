//! Compressed full-text indices and interleaved Bloom filters for sequence analysis.
//!
//! - [`FmIndex`]: an FM-Index over one or many texts, supporting exact search with a [`Cursor`].
//! - [`BiFmIndex`]: a bidirectional FM-Index whose [`BiCursor`] extends queries to both sides. It is the
//!   substrate of the error-tolerant [`search`] engine.
//! - [`ibf::InterleavedBloomFilter`]: many Bloom filters ("bins") in one interleaved bit array, queried
//!   for all bins at once by agents.
//!
//! Texts are slices of a [`Symbol`] type, for example [`alphabet::Dna4`].

pub mod alphabet;
pub mod bidirectional;
pub mod config;
pub mod cursor;
pub mod error;
pub mod ibf;
pub mod kmer;
pub mod search;
pub mod text_with_rank_support;

mod construction;
mod sampled_suffix_array;
mod text_id_search_tree;

use std::marker::PhantomData;

#[doc(inline)]
pub use alphabet::Symbol;
#[doc(inline)]
pub use bidirectional::{BiCursor, BiFmIndex};
#[doc(inline)]
pub use config::FmIndexConfig;
#[doc(inline)]
pub use construction::IndexStorage;
#[doc(inline)]
pub use cursor::Cursor;
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use text_with_rank_support::TextWithRankSupport;

use construction::DataStructures;
use sampled_suffix_array::SampledSuffixArray;
use text_id_search_tree::TextIdSearchTree;
use text_with_rank_support::CondensedTextWithRankSupport;

#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
struct IndexData<I, R> {
    count: Vec<usize>,
    text_with_rank_support: R,
    suffix_array: SampledSuffixArray<I>,
    text_ids: TextIdSearchTree,
}

/// The FM-Index over a set of texts.
///
/// Internally, every text is stored reversed. The backward search step of the BWT therefore extends
/// the searched query to the right, which is what [`Cursor::extend_right`] does.
///
/// The index is immutable after construction and can be shared between threads freely.
pub struct FmIndex<S, I = i32, R = CondensedTextWithRankSupport<I>> {
    data: IndexData<I, R>,
    _symbol_marker: PhantomData<fn() -> S>,
}

impl<S: Symbol, I: IndexStorage, R: TextWithRankSupport<I>> FmIndex<S, I, R> {
    /// Constructs the index with the default [`FmIndexConfig`].
    ///
    /// Construction uses the number of threads of the current rayon thread pool.
    pub fn new<T: AsRef<[S]> + Sync>(texts: &[T]) -> Result<Self> {
        FmIndexConfig::<I, R>::new().construct(texts)
    }

    // if texts_are_reversed is set, the index is built over the reverses of the given texts
    pub(crate) fn construct<T: AsRef<[S]> + Sync>(
        texts: &[T],
        suffix_array_sampling_rate: usize,
        texts_are_reversed: bool,
    ) -> Result<Self> {
        let DataStructures {
            count,
            sampled_suffix_array,
            text_ids,
            text_with_rank_support,
        } = construction::create_data_structures::<S, I, R, T>(
            texts,
            suffix_array_sampling_rate,
            !texts_are_reversed,
        )?;

        log::info!(
            "constructed FM-Index over {} texts with total length {} (sampling rate {})",
            text_ids.num_texts(),
            text_with_rank_support.text_len(),
            suffix_array_sampling_rate
        );

        Ok(FmIndex {
            data: IndexData {
                count,
                text_with_rank_support,
                suffix_array: sampled_suffix_array,
                text_ids,
            },
            _symbol_marker: PhantomData,
        })
    }

    /// Returns the number of occurrences of `query` in the set of indexed texts.
    ///
    /// The running time is in O(query.len()).
    pub fn count(&self, query: &[S]) -> usize {
        self.cursor_for_query(query).count()
    }

    /// Returns an iterator over all occurrences of `query` in the set of indexed texts.
    ///
    /// The order of the hits is unspecified. For each hit pulled from the iterator, a sampled suffix
    /// array lookup is performed.
    pub fn locate<'a>(&'a self, query: &[S]) -> impl Iterator<Item = Hit> + use<'a, S, I, R> {
        self.cursor_for_query(query).locate()
    }

    /// Returns a cursor over the full suffix array interval, corresponding to the empty query.
    pub fn cursor(&self) -> Cursor<'_, S, I, R> {
        Cursor::new(self)
    }

    /// Returns a cursor that has already been extended by all symbols of `query`.
    pub fn cursor_for_query(&self, query: &[S]) -> Cursor<'_, S, I, R> {
        let mut cursor = self.cursor();
        cursor.extend_right_seq(query);
        cursor
    }

    /// The number of indexed texts.
    pub fn num_texts(&self) -> usize {
        self.data.text_ids.num_texts()
    }

    /// The length of the text with id `text_id`. Panics if the text id is out of range.
    pub fn text_len(&self, text_id: usize) -> usize {
        self.data.text_ids.text_len(text_id)
    }

    /// The length of the concatenated texts, including one sentinel per text.
    pub fn total_len(&self) -> usize {
        self.data.text_with_rank_support.text_len()
    }

    pub fn suffix_array_sampling_rate(&self) -> usize {
        self.data.suffix_array.sampling_rate()
    }

    pub(crate) fn full_interval(&self) -> HalfOpenInterval {
        HalfOpenInterval {
            start: 0,
            end: self.total_len(),
        }
    }

    // narrows the interval to the rows whose stored suffix is preceded by the given symbol rank
    pub(crate) fn backward_step(&self, rank: u8, interval: HalfOpenInterval) -> HalfOpenInterval {
        HalfOpenInterval {
            start: self.lf_mapping_step(rank, interval.start),
            end: self.lf_mapping_step(rank, interval.end),
        }
    }

    pub(crate) fn count_smaller(&self, rank: u8, interval: HalfOpenInterval) -> usize {
        self.data
            .text_with_rank_support
            .count_smaller(rank, interval.start, interval.end)
    }

    fn lf_mapping_step(&self, rank: u8, idx: usize) -> usize {
        self.data.count[rank as usize] + self.data.text_with_rank_support.rank(rank, idx)
    }

    // depth is the length of the query that corresponds to the interval
    pub(crate) fn locate_interval(
        &self,
        interval: HalfOpenInterval,
        depth: usize,
    ) -> impl Iterator<Item = Hit> + '_ {
        (interval.start..interval.end).map(move |row| {
            let concatenated_text_index = self.data.suffix_array.recover(
                row,
                &self.data.count,
                &self.data.text_with_rank_support,
            );

            let (text_id, offset_in_stored_text) = self
                .data
                .text_ids
                .split_concatenated_text_index(concatenated_text_index);

            Hit {
                text_id,
                position: self.data.text_ids.text_len(text_id) - offset_in_stored_text - depth,
            }
        })
    }
}

#[cfg(feature = "savefile")]
impl<S: Symbol, I: IndexStorage, R: TextWithRankSupport<I>> FmIndex<S, I, R> {
    const VERSION_FOR_SAVEFILE: u32 = 0;

    pub fn load_from_reader(reader: &mut impl std::io::Read) -> Result<Self> {
        let data: IndexData<I, R> = savefile::load(reader, Self::VERSION_FOR_SAVEFILE)?;
        Self::from_loaded_data(data)
    }

    pub fn load_from_file(filepath: impl AsRef<std::path::Path>) -> Result<Self> {
        let data: IndexData<I, R> = savefile::load_file(filepath, Self::VERSION_FOR_SAVEFILE)?;
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

    // an index stored for a different alphabet must not be reinterpreted
    fn from_loaded_data(data: IndexData<I, R>) -> Result<Self> {
        let stored_alphabet_size = data.text_with_rank_support.alphabet_size().saturating_sub(1);

        if stored_alphabet_size != S::ALPHABET_SIZE {
            return Err(Error::InvalidAlphabetSize(stored_alphabet_size));
        }

        Ok(Self {
            data,
            _symbol_marker: PhantomData,
        })
    }
}

/// An occurrence of a query: the id of the text and the position inside that text.
///
/// For an index over a single text, `text_id` is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hit {
    pub text_id: usize,
    pub position: usize,
}

/// A half-open interval `[start, end)` of suffix array rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HalfOpenInterval {
    pub start: usize,
    pub end: usize,
}

impl HalfOpenInterval {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

mod maybe_savefile {
    #[cfg(feature = "savefile")]
    pub trait MaybeSavefile: savefile::Savefile {}

    #[cfg(not(feature = "savefile"))]
    pub trait MaybeSavefile {}

    impl MaybeSavefile for i32 {}
    impl MaybeSavefile for u32 {}
    impl MaybeSavefile for i64 {}
}

mod sealed {
    pub trait Sealed {}
}
