use crate::error::Result;
use crate::text_with_rank_support::CondensedTextWithRankSupport;
use crate::{BiFmIndex, FmIndex, IndexStorage, Symbol, TextWithRankSupport};
use std::marker::PhantomData;

/// Builder for [`FmIndex`] and [`BiFmIndex`].
///
/// The number of threads used for construction is controlled by the current rayon thread pool.
#[derive(Debug, Clone, Copy)]
pub struct FmIndexConfig<I = i32, R = CondensedTextWithRankSupport<I>> {
    suffix_array_sampling_rate: usize,
    _index_storage_marker: PhantomData<I>,
    _text_with_rank_support_marker: PhantomData<R>,
}

impl<I: IndexStorage, R: TextWithRankSupport<I>> FmIndexConfig<I, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `suffix_array_sampling_rate`-th suffix array row is stored.
    ///
    /// Higher values lead to smaller indices and slower [`locate`](crate::Cursor::locate) operations.
    /// Must be greater than 0, the default is 4.
    pub fn suffix_array_sampling_rate(&mut self, suffix_array_sampling_rate: usize) -> &mut Self {
        self.suffix_array_sampling_rate = suffix_array_sampling_rate;
        self
    }

    pub fn construct<S: Symbol, T: AsRef<[S]> + Sync>(&self, texts: &[T]) -> Result<FmIndex<S, I, R>> {
        FmIndex::construct(texts, self.suffix_array_sampling_rate, false)
    }

    pub fn construct_bidirectional<S: Symbol, T: AsRef<[S]> + Sync>(
        &self,
        texts: &[T],
    ) -> Result<BiFmIndex<S, I, R>> {
        BiFmIndex::construct(texts, self.suffix_array_sampling_rate)
    }
}

impl<I: IndexStorage, R: TextWithRankSupport<I>> Default for FmIndexConfig<I, R> {
    fn default() -> Self {
        Self {
            suffix_array_sampling_rate: 4,
            _index_storage_marker: PhantomData,
            _text_with_rank_support_marker: PhantomData,
        }
    }
}
