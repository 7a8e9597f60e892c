//! Texts with support for O(1) rank queries, the core building block of the FM-Index.

mod block;
mod condensed;

use crate::{IndexStorage, maybe_savefile, sealed};

#[doc(inline)]
pub use block::{Block, Block64, Block512};

#[doc(inline)]
pub use condensed::CondensedTextWithRankSupport;

pub trait TextWithRankSupport<I: IndexStorage>:
    sealed::Sealed + maybe_savefile::MaybeSavefile + Send + Sync
{
    /// Construct the data structure for the given text.
    ///
    /// All symbols must be smaller than `alphabet_size`, which must be at least 2.
    /// The running time of this operation is linear in the text length.
    fn construct(text: &[u8], alphabet_size: usize) -> Self;

    /// Returns the number of occurrences of `symbol` in `text[0..idx]`.
    ///
    /// Panics if `symbol` is not smaller than the alphabet size or `idx` is larger than the text length.
    /// The running time is in O(1).
    fn rank(&self, symbol: u8, idx: usize) -> usize;

    /// Returns the number of symbols in `text[start..end]` that are smaller than `symbol`.
    ///
    /// This is what keeps the two intervals of a bidirectional cursor synchronized.
    /// The running time is in O(`symbol`).
    fn count_smaller(&self, symbol: u8, start: usize, end: usize) -> usize {
        (0..symbol)
            .map(|smaller| self.rank(smaller, end) - self.rank(smaller, start))
            .sum()
    }

    /// Recovers the symbol of the text at given index `idx`.
    ///
    /// The running time is in O(log σ).
    fn symbol_at(&self, idx: usize) -> u8;

    fn text_len(&self) -> usize;

    fn alphabet_size(&self) -> usize;
}
