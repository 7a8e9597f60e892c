//! The bidirectional FM-Index.
//!
//! A [`BiFmIndex`] consists of two FM-Indices: one over the texts and one over the reversed texts.
//! Its [`BiCursor`] keeps one suffix array interval in each of them. Both intervals always denote the
//! same occurrences. Extending to the right is a backward search step in the first index, extending to
//! the left one in the second. The interval of the other index is re-derived from the number of symbols
//! smaller than the extension symbol in the stepped interval.

use crate::error::Result;
use crate::text_with_rank_support::CondensedTextWithRankSupport;
use crate::{
    Cursor, FmIndex, FmIndexConfig, HalfOpenInterval, Hit, IndexStorage, Symbol,
    TextWithRankSupport,
};

/// An FM-Index that supports extending queries in both directions.
pub struct BiFmIndex<S, I = i32, R = CondensedTextWithRankSupport<I>> {
    fwd: FmIndex<S, I, R>,
    rev: FmIndex<S, I, R>,
}

impl<S: Symbol, I: IndexStorage, R: TextWithRankSupport<I>> BiFmIndex<S, I, R> {
    /// Constructs the index with the default [`FmIndexConfig`].
    pub fn new<T: AsRef<[S]> + Sync>(texts: &[T]) -> Result<Self> {
        FmIndexConfig::<I, R>::new().construct_bidirectional(texts)
    }

    pub(crate) fn construct<T: AsRef<[S]> + Sync>(
        texts: &[T],
        suffix_array_sampling_rate: usize,
    ) -> Result<Self> {
        let fwd = FmIndex::construct(texts, suffix_array_sampling_rate, false)?;
        let rev = FmIndex::construct(texts, suffix_array_sampling_rate, true)?;

        Ok(Self { fwd, rev })
    }

    /// Returns a cursor corresponding to the empty query.
    pub fn cursor(&self) -> BiCursor<'_, S, I, R> {
        BiCursor::new(self)
    }

    pub fn count(&self, query: &[S]) -> usize {
        self.fwd.count(query)
    }

    pub fn locate<'a>(&'a self, query: &[S]) -> impl Iterator<Item = Hit> + use<'a, S, I, R> {
        self.fwd.locate(query)
    }

    /// The index over the texts, as given.
    pub fn fwd_index(&self) -> &FmIndex<S, I, R> {
        &self.fwd
    }

    /// The index over the reversed texts.
    pub fn rev_index(&self) -> &FmIndex<S, I, R> {
        &self.rev
    }

    pub fn num_texts(&self) -> usize {
        self.fwd.num_texts()
    }

    pub fn text_len(&self, text_id: usize) -> usize {
        self.fwd.text_len(text_id)
    }
}

#[cfg(feature = "savefile")]
impl<S: Symbol, I: IndexStorage, R: TextWithRankSupport<I>> BiFmIndex<S, I, R> {
    /// Reads an index written by [`save_to_writer`](Self::save_to_writer).
    pub fn load_from_reader(reader: &mut impl std::io::Read) -> Result<Self> {
        let fwd = FmIndex::load_from_reader(reader)?;
        let rev = FmIndex::load_from_reader(reader)?;

        if fwd.total_len() != rev.total_len() || fwd.num_texts() != rev.num_texts() {
            return Err(crate::Error::IndexMismatch);
        }

        Ok(Self { fwd, rev })
    }

    pub fn load_from_file(filepath: impl AsRef<std::path::Path>) -> Result<Self> {
        let mut reader = std::io::BufReader::new(std::fs::File::open(filepath)?);
        Self::load_from_reader(&mut reader)
    }

    /// Writes the forward index followed by the reverse index.
    pub fn save_to_writer(&self, writer: &mut impl std::io::Write) -> Result<()> {
        self.fwd.save_to_writer(writer)?;
        self.rev.save_to_writer(writer)
    }

    pub fn save_to_file(&self, filepath: impl AsRef<std::path::Path>) -> Result<()> {
        let mut writer = std::io::BufWriter::new(std::fs::File::create(filepath)?);
        self.save_to_writer(&mut writer)?;
        std::io::Write::flush(&mut writer)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extension {
    Right(u8),
    Left(u8),
}

/// A cursor to the bidirectional FM-Index.
///
/// The cursor maintains a currently searched query, which can be extended at both ends. The last
/// extension can be replaced by the next larger symbol with [`cycle_back`](BiCursor::cycle_back) (after a
/// right extension) or [`cycle_front`](BiCursor::cycle_front) (after a left extension).
///
/// Like [`Cursor`], extending an empty cursor is a silent no-op.
pub struct BiCursor<'a, S, I, R> {
    index: &'a BiFmIndex<S, I, R>,
    // interval in the index over the texts (stores the reversed texts, so its backward step extends right)
    fwd: HalfOpenInterval,
    // interval in the index over the reversed texts
    rev: HalfOpenInterval,
    parent_fwd: HalfOpenInterval,
    parent_rev: HalfOpenInterval,
    last_extension: Option<Extension>,
    depth: usize,
}

impl<S, I, R> Clone for BiCursor<'_, S, I, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, I, R> Copy for BiCursor<'_, S, I, R> {}

impl<'a, S: Symbol, I: IndexStorage, R: TextWithRankSupport<I>> BiCursor<'a, S, I, R> {
    fn new(index: &'a BiFmIndex<S, I, R>) -> Self {
        let fwd = index.fwd.full_interval();
        let rev = index.rev.full_interval();

        Self {
            index,
            fwd,
            rev,
            parent_fwd: fwd,
            parent_rev: rev,
            last_extension: None,
            depth: 0,
        }
    }

    // (fwd, rev) intervals after extending the query with the given parent intervals to the right
    fn step_right(
        &self,
        rank: u8,
        fwd: HalfOpenInterval,
        rev: HalfOpenInterval,
    ) -> (HalfOpenInterval, HalfOpenInterval) {
        let new_fwd = self.index.fwd.backward_step(rank, fwd);
        let start = rev.start + self.index.fwd.count_smaller(rank, fwd);

        let new_rev = HalfOpenInterval {
            start,
            end: start + new_fwd.len(),
        };

        (new_fwd, new_rev)
    }

    fn step_left(
        &self,
        rank: u8,
        fwd: HalfOpenInterval,
        rev: HalfOpenInterval,
    ) -> (HalfOpenInterval, HalfOpenInterval) {
        let new_rev = self.index.rev.backward_step(rank, rev);
        let start = fwd.start + self.index.rev.count_smaller(rank, rev);

        let new_fwd = HalfOpenInterval {
            start,
            end: start + new_rev.len(),
        };

        (new_fwd, new_rev)
    }

    fn apply(&mut self, intervals: (HalfOpenInterval, HalfOpenInterval), extension: Extension) {
        self.parent_fwd = self.fwd;
        self.parent_rev = self.rev;
        (self.fwd, self.rev) = intervals;
        self.last_extension = Some(extension);
        self.depth += 1;
    }

    /// Extends the currently searched query at the end by one symbol.
    ///
    /// Returns whether the query still occurs in the texts. The running time is in O(σ).
    pub fn extend_right(&mut self, symbol: S) -> bool {
        if self.is_empty() {
            return false;
        }

        let rank = symbol.to_rank();
        self.apply(self.step_right(rank, self.fwd, self.rev), Extension::Right(rank));

        !self.is_empty()
    }

    /// Extends the currently searched query at the beginning by one symbol.
    ///
    /// Returns whether the query still occurs in the texts. The running time is in O(σ).
    pub fn extend_left(&mut self, symbol: S) -> bool {
        if self.is_empty() {
            return false;
        }

        let rank = symbol.to_rank();
        self.apply(self.step_left(rank, self.fwd, self.rev), Extension::Left(rank));

        !self.is_empty()
    }

    /// Appends all symbols of `query` to the currently searched query, in order.
    ///
    /// Stops as soon as the cursor becomes empty.
    pub fn extend_right_seq(&mut self, query: &[S]) -> bool {
        query.iter().all(|&symbol| self.extend_right(symbol))
    }

    /// Prepends `query` to the currently searched query.
    ///
    /// The symbols are applied from the last to the first, so that afterwards the searched query starts
    /// with `query` as it is read from left to right. Stops as soon as the cursor becomes empty.
    pub fn extend_left_seq(&mut self, query: &[S]) -> bool {
        query.iter().rev().all(|&symbol| self.extend_left(symbol))
    }

    /// Extends the query at the end by the smallest symbol for which it still occurs in the texts.
    ///
    /// If there is no such symbol, the cursor is left unchanged and `false` is returned.
    pub fn extend_right_any(&mut self) -> bool {
        !self.is_empty()
            && self.replace_last_extension(self.fwd, self.rev, 0, self.depth + 1, Extension::Right)
    }

    /// Extends the query at the beginning by the smallest symbol for which it still occurs in the texts.
    ///
    /// If there is no such symbol, the cursor is left unchanged and `false` is returned.
    pub fn extend_left_any(&mut self) -> bool {
        !self.is_empty()
            && self.replace_last_extension(self.fwd, self.rev, 0, self.depth + 1, Extension::Left)
    }

    /// Replaces the last symbol of the query by the next larger one for which the query still occurs.
    ///
    /// Returns `false` and leaves the cursor unchanged if there is no such symbol.
    ///
    /// Panics if the last extension was not a right extension.
    pub fn cycle_back(&mut self) -> bool {
        let Some(Extension::Right(last_rank)) = self.last_extension else {
            panic!("cycle_back requires a cursor whose last operation was a right extension");
        };

        self.replace_last_extension(
            self.parent_fwd,
            self.parent_rev,
            last_rank + 1,
            self.depth,
            Extension::Right,
        )
    }

    /// Replaces the first symbol of the query by the next larger one for which the query still occurs.
    ///
    /// Returns `false` and leaves the cursor unchanged if there is no such symbol.
    ///
    /// Panics if the last extension was not a left extension.
    pub fn cycle_front(&mut self) -> bool {
        let Some(Extension::Left(last_rank)) = self.last_extension else {
            panic!("cycle_front requires a cursor whose last operation was a left extension");
        };

        self.replace_last_extension(
            self.parent_fwd,
            self.parent_rev,
            last_rank + 1,
            self.depth,
            Extension::Left,
        )
    }

    fn replace_last_extension(
        &mut self,
        parent_fwd: HalfOpenInterval,
        parent_rev: HalfOpenInterval,
        first_rank: u8,
        depth: usize,
        extension: fn(u8) -> Extension,
    ) -> bool {
        for rank in first_rank..S::ALPHABET_SIZE as u8 {
            let (fwd, rev) = match extension(rank) {
                Extension::Right(_) => self.step_right(rank, parent_fwd, parent_rev),
                Extension::Left(_) => self.step_left(rank, parent_fwd, parent_rev),
            };

            if !fwd.is_empty() {
                self.parent_fwd = parent_fwd;
                self.parent_rev = parent_rev;
                self.fwd = fwd;
                self.rev = rev;
                self.last_extension = Some(extension(rank));
                self.depth = depth;
                return true;
            }
        }

        false
    }

    /// Returns the number of occurrences of the currently searched query. The running time is in O(1).
    pub fn count(&self) -> usize {
        self.fwd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fwd.is_empty()
    }

    /// The length of the currently searched query.
    pub fn query_length(&self) -> usize {
        self.depth
    }

    /// The symbol of the last extension, on whichever side it happened.
    pub fn last_symbol(&self) -> Option<S> {
        match self.last_extension {
            Some(Extension::Right(rank) | Extension::Left(rank)) => Some(S::from_rank(rank)),
            None => None,
        }
    }

    /// Returns the occurrences of the currently searched query in the texts. See [`Cursor::locate`].
    pub fn locate(&self) -> impl Iterator<Item = Hit> + use<'a, S, I, R> {
        self.to_fwd_cursor().locate()
    }

    /// Converts this cursor into a unidirectional cursor of the index over the texts.
    ///
    /// [`Cursor::cycle_back`] can be used on the result if the last extension was to the right.
    pub fn to_fwd_cursor(&self) -> Cursor<'a, S, I, R> {
        let last_rank = match self.last_extension {
            Some(Extension::Right(rank)) => Some(rank),
            _ => None,
        };

        Cursor::from_parts(&self.index.fwd, self.fwd, self.parent_fwd, last_rank, self.depth)
    }

    /// Converts this cursor into a unidirectional cursor of the index over the reversed texts.
    ///
    /// The converted cursor searches the reversed query. Its [`locate`](Cursor::locate) reports positions
    /// in the reversed texts. [`Cursor::cycle_back`] can be used on the result if the last extension was
    /// to the left.
    pub fn to_rev_cursor(&self) -> Cursor<'a, S, I, R> {
        let last_rank = match self.last_extension {
            Some(Extension::Left(rank)) => Some(rank),
            _ => None,
        };

        Cursor::from_parts(&self.index.rev, self.rev, self.parent_rev, last_rank, self.depth)
    }

    /// Returns the currently searched query, sliced out of `texts`. See [`Cursor::path_label`].
    pub fn path_label<'t, T: AsRef<[S]>>(&self, texts: &'t [T]) -> Option<&'t [S]> {
        self.to_fwd_cursor().path_label(texts)
    }

    pub(crate) fn interval_key(&self) -> (HalfOpenInterval, usize) {
        (self.fwd, self.depth)
    }

    // restricts the occurrences to the first suffix array row of the forward interval
    pub(crate) fn first_occurrence_cursor(&self) -> Cursor<'a, S, I, R> {
        let interval = HalfOpenInterval {
            start: self.fwd.start,
            end: std::cmp::min(self.fwd.start + 1, self.fwd.end),
        };

        Cursor::from_parts(&self.index.fwd, interval, interval, None, self.depth)
    }
}
