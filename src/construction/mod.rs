mod bwt;

use bytemuck::Pod;
use libsais::{OutputElement, ThreadCount};
use num_traits::{NumCast, PrimInt, Zero};
use rayon::prelude::*;

use crate::alphabet::{self, Symbol};
use crate::error::{Error, Result};
use crate::sampled_suffix_array::SampledSuffixArray;
use crate::text_id_search_tree::TextIdSearchTree;
use crate::{TextWithRankSupport, maybe_savefile, sealed};

pub(crate) struct DataStructures<I, R> {
    pub(crate) count: Vec<usize>,
    pub(crate) sampled_suffix_array: SampledSuffixArray<I>,
    pub(crate) text_ids: TextIdSearchTree,
    pub(crate) text_with_rank_support: R,
}

/// Types that can be used to store indices inside the FM-Index.
///
/// The maximum value of the type is an upper bound for the sum of lengths of indexed texts (plus one
/// sentinel per text). Types with larger maximum values allow indexing larger texts.
///
/// On the other hand, larger types lead to higher memory usage, especially during index
/// construction. There is no suffix array construction backend for `u32`, so it uses as much
/// memory as `i64` during construction.
pub trait IndexStorage:
    PrimInt + Pod + maybe_savefile::MaybeSavefile + sealed::Sealed + Send + Sync + 'static
{
    #[doc(hidden)]
    type LibsaisOutput: OutputElement + PrimInt + Pod + Send + Sync;
}

impl sealed::Sealed for i32 {}

impl IndexStorage for i32 {
    type LibsaisOutput = i32;
}

impl sealed::Sealed for u32 {}

impl IndexStorage for u32 {
    type LibsaisOutput = i64;
}

impl sealed::Sealed for i64 {}

impl IndexStorage for i64 {
    type LibsaisOutput = i64;
}

/// Builds everything an FM-Index needs from the texts.
///
/// The texts are stored reversed (each one on its own) if `reverse_texts` is set. The sentinel has rank
/// `S::ALPHABET_SIZE` and is placed after every text.
pub(crate) fn create_data_structures<S, I, R, T>(
    texts: &[T],
    suffix_array_sampling_rate: usize,
    reverse_texts: bool,
) -> Result<DataStructures<I, R>>
where
    S: Symbol,
    I: IndexStorage,
    R: TextWithRankSupport<I>,
    T: AsRef<[S]> + Sync,
{
    alphabet::validate_alphabet_size::<S>()?;

    if texts.is_empty() {
        return Err(Error::NoTexts);
    }

    if suffix_array_sampling_rate == 0 {
        return Err(Error::InvalidSamplingRate);
    }

    let (text, frequency_table, sentinel_indices) =
        create_concatenated_rank_text(texts, reverse_texts)?;

    let max_len = <usize as NumCast>::from(I::max_value()).unwrap_or(usize::MAX);
    if text.len() > max_len {
        return Err(Error::TextTooLong {
            len: text.len(),
            max: max_len,
        });
    }

    log::debug!(
        "concatenated {} texts into {} symbols, constructing suffix array",
        sentinel_indices.len(),
        text.len()
    );

    let text_ids = TextIdSearchTree::new_from_sentinel_indices(sentinel_indices);
    let count = frequency_table_to_count(&frequency_table);

    let suffix_array = construct_libsais_suffix_array::<I>(&text)?;

    let sentinel = S::ALPHABET_SIZE as u8;
    let (bwt, text_border_lookup) =
        bwt::bwt_from_suffix_array::<I::LibsaisOutput, I>(&suffix_array, &text, sentinel);

    let sampled_suffix_array = SampledSuffixArray::new::<I::LibsaisOutput>(
        &suffix_array,
        suffix_array_sampling_rate,
        text_border_lookup,
    );

    drop(suffix_array);

    log::debug!("constructing rank support for the BWT");

    let text_with_rank_support = R::construct(&bwt, S::ALPHABET_SIZE + 1);

    Ok(DataStructures {
        count,
        sampled_suffix_array,
        text_ids,
        text_with_rank_support,
    })
}

fn construct_libsais_suffix_array<I: IndexStorage>(text: &[u8]) -> Result<Vec<I::LibsaisOutput>> {
    let mut suffix_array = vec![I::LibsaisOutput::zero(); text.len()];
    let num_threads = rayon::current_num_threads().try_into().unwrap_or(u16::MAX);

    libsais::SuffixArrayConstruction::for_text(text)
        .in_borrowed_buffer(&mut suffix_array)
        .multi_threaded(ThreadCount::fixed(num_threads))
        .run()
        .map_err(|e| Error::SuffixArrayConstruction(format!("{e:?}")))?;

    Ok(suffix_array)
}

/// Returns the concatenated rank text, the frequency of every rank (sentinel included) and the
/// positions of the sentinels.
pub(crate) fn create_concatenated_rank_text<S: Symbol, T: AsRef<[S]> + Sync>(
    texts: &[T],
    reverse_texts: bool,
) -> Result<(Vec<u8>, Vec<usize>, Vec<usize>)> {
    let alphabet_size = S::ALPHABET_SIZE;
    let sentinel = alphabet_size as u8;

    let sentinel_indices: Vec<_> = texts
        .iter()
        .scan(0, |state, t| {
            let sentinel_index = *state + t.as_ref().len();
            *state = sentinel_index + 1;
            Some(sentinel_index)
        })
        .collect();

    let total_len = sentinel_indices.last().map_or(0, |&last| last + 1);
    let mut concatenated_text = vec![sentinel; total_len];

    let mut concatenated_text_splits = Vec::with_capacity(texts.len());
    let mut remaining_slice = concatenated_text.as_mut_slice();

    for t in texts {
        let (this, remaining) = remaining_slice.split_at_mut(t.as_ref().len() + 1);
        concatenated_text_splits.push(this);
        remaining_slice = remaining;
    }

    let mut frequency_table = texts
        .par_iter()
        .zip(concatenated_text_splits)
        .enumerate()
        .map(|(text_id, (text, split))| {
            let text = text.as_ref();
            let mut frequency_table = vec![0usize; alphabet_size + 1];

            for (position, &symbol) in text.iter().enumerate() {
                let rank = symbol.to_rank();

                if rank as usize >= alphabet_size {
                    return Err(Error::InvalidRank {
                        text_id,
                        position,
                        rank,
                        alphabet_size,
                    });
                }

                let target = if reverse_texts {
                    text.len() - 1 - position
                } else {
                    position
                };

                split[target] = rank;
                frequency_table[rank as usize] += 1;
            }

            Ok(frequency_table)
        })
        .try_reduce_with(|f1, f2| Ok(merge_frequency_tables(f1, f2)))
        .ok_or(Error::NoTexts)??;

    frequency_table[alphabet_size] = texts.len();

    Ok((concatenated_text, frequency_table, sentinel_indices))
}

fn merge_frequency_tables(mut f1: Vec<usize>, f2: Vec<usize>) -> Vec<usize> {
    for (x1, x2) in f1.iter_mut().zip(f2) {
        *x1 += x2;
    }

    f1
}

// count[c] is the number of symbols smaller than c, the last entry is the total text length
fn frequency_table_to_count(frequency_table: &[usize]) -> Vec<usize> {
    let mut count = Vec::with_capacity(frequency_table.len() + 1);
    let mut sum = 0;

    for &frequency in frequency_table {
        count.push(sum);
        sum += frequency;
    }

    count.push(sum);

    count
}
