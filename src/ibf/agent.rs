use super::FilterStorage;

use num_traits::PrimInt;

/// One bit per bin, the result of [`MembershipAgent::bulk_contains`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinningBitvector {
    words: Vec<u64>,
    len: usize,
}

impl BinningBitvector {
    fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// The number of bins.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the bit of the bin is set. Panics if `bin >= self.len()`.
    pub fn get(&self, bin: usize) -> bool {
        assert!(bin < self.len, "bin {bin} out of range for {} bins", self.len);
        (self.words[bin / 64] >> (bin % 64)) & 1 == 1
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(|bin| self.get(bin))
    }

    /// The indices of the set bits, in increasing order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(word_idx, &word)| {
            let mut remaining = word;

            std::iter::from_fn(move || {
                if remaining == 0 {
                    return None;
                }

                let bit = remaining.trailing_zeros() as usize;
                remaining &= remaining - 1;
                Some(word_idx * 64 + bit)
            })
        })
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Answers membership queries for all bins of a filter at once.
///
/// Create one agent per thread. The result buffer is reused by every query.
pub struct MembershipAgent<'f, F> {
    filter: &'f F,
    row_starts: Vec<usize>,
    result: BinningBitvector,
}

impl<'f, F: FilterStorage> MembershipAgent<'f, F> {
    pub(crate) fn new(filter: &'f F) -> Self {
        let layout = filter.layout();

        Self {
            filter,
            row_starts: Vec::with_capacity(layout.hash_seeds().len()),
            result: BinningBitvector::new(layout.bin_count()),
        }
    }

    /// Returns which bins (probably) contain `value`.
    ///
    /// A bin that `value` was inserted into always reports `true` (unless it was cleared since). Other bins
    /// may report `true` with the false positive rate of the filter.
    pub fn bulk_contains(&mut self, value: u64) -> &BinningBitvector {
        let layout = self.filter.layout();

        self.row_starts.clear();
        self.row_starts.extend(
            layout
                .hash_seeds()
                .iter()
                .map(|&seed| layout.row_start_word(value, seed)),
        );

        for (word_in_row, result_word) in self.result.words.iter_mut().enumerate() {
            *result_word = self
                .row_starts
                .iter()
                .fold(u64::MAX, |acc, &start| acc & self.filter.word(start + word_in_row));
        }

        // padding bins are never set, but are masked to keep the result independent of the storage
        let trailing_bins = self.result.len % 64;
        if trailing_bins != 0
            && let Some(last) = self.result.words.last_mut()
        {
            *last &= (1u64 << trailing_bins) - 1;
        }

        &self.result
    }
}

/// Counts for all bins of a filter how many of a sequence of values they (probably) contain.
///
/// Counters saturate at `T::max_value()`.
pub struct CountingAgent<'f, F, T = u16> {
    membership_agent: MembershipAgent<'f, F>,
    counts: Vec<T>,
}

impl<'f, F: FilterStorage, T: PrimInt> CountingAgent<'f, F, T> {
    pub(crate) fn new(filter: &'f F) -> Self {
        Self {
            membership_agent: MembershipAgent::new(filter),
            counts: vec![T::zero(); filter.layout().bin_count()],
        }
    }

    /// Returns for every bin the number of values it (probably) contains.
    ///
    /// Values that occur multiple times are counted multiple times.
    pub fn bulk_count(&mut self, values: impl IntoIterator<Item = u64>) -> &[T] {
        self.counts.fill(T::zero());

        for value in values {
            let membership = self.membership_agent.bulk_contains(value);

            for bin in membership.ones() {
                let count = &mut self.counts[bin];
                *count = count.checked_add(&T::one()).unwrap_or_else(T::max_value);
            }
        }

        &self.counts
    }
}
