use num_traits::{NumCast, PrimInt};
use std::collections::HashMap;

use crate::{IndexStorage, TextWithRankSupport};

// Every sampling_rate-th row of the suffix array is kept. Rows whose BWT symbol is the sentinel are kept
// as well (in the text border lookup), because stepping over a sentinel with the LF mapping is not possible.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone)]
pub(crate) struct SampledSuffixArray<I> {
    samples: Vec<I>,
    sampling_rate: usize,
    text_border_lookup: HashMap<usize, I>,
}

impl<I: IndexStorage> SampledSuffixArray<I> {
    pub(crate) fn new<O: PrimInt>(
        suffix_array: &[O],
        sampling_rate: usize,
        text_border_lookup: HashMap<usize, I>,
    ) -> Self {
        assert!(sampling_rate > 0);

        let samples = suffix_array
            .iter()
            .step_by(sampling_rate)
            .map(|&value| {
                <I as NumCast>::from(value)
                    .expect("text length was checked to fit into the index storage")
            })
            .collect();

        Self {
            samples,
            sampling_rate,
            text_border_lookup,
        }
    }

    /// Recovers the suffix array value of `row` by walking the LF mapping until a stored row is reached.
    pub(crate) fn recover<R: TextWithRankSupport<I>>(
        &self,
        mut row: usize,
        count: &[usize],
        text_with_rank_support: &R,
    ) -> usize {
        let mut num_steps_done = 0;

        loop {
            if row % self.sampling_rate == 0 {
                return to_usize(self.samples[row / self.sampling_rate]) + num_steps_done;
            }

            if let Some(&value) = self.text_border_lookup.get(&row) {
                return to_usize(value) + num_steps_done;
            }

            let symbol = text_with_rank_support.symbol_at(row);
            row = count[symbol as usize] + text_with_rank_support.rank(symbol, row);
            num_steps_done += 1;
        }
    }

    pub(crate) fn sampling_rate(&self) -> usize {
        self.sampling_rate
    }
}

fn to_usize<I: IndexStorage>(value: I) -> usize {
    <usize as NumCast>::from(value).expect("suffix array values are never negative")
}
