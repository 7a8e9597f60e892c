use crate::{FmIndex, HalfOpenInterval, Hit, IndexStorage, Symbol, TextWithRankSupport};

/// A cursor to the FM-Index.
///
/// The cursor API allows more flexible search procedures using the FM-Index. The cursor implicitly
/// maintains a currently searched query. Symbols can iteratively be added to the end of this query.
///
/// At any point, the number of occurrences of the currently searched query can be retrieved cheaply, and
/// occurrences can be located. The last extension can be replaced by the next larger symbol using
/// [`cycle_back`](Cursor::cycle_back), which together with [`extend_right_any`](Cursor::extend_right_any)
/// allows a depth-first traversal of all substrings of the indexed texts.
///
/// Cursors are small values. Copying a cursor never touches the index.
pub struct Cursor<'a, S, I, R> {
    index: &'a FmIndex<S, I, R>,
    interval: HalfOpenInterval,
    parent_interval: HalfOpenInterval,
    last_rank: Option<u8>,
    depth: usize,
}

impl<S, I, R> Clone for Cursor<'_, S, I, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, I, R> Copy for Cursor<'_, S, I, R> {}

impl<'a, S: Symbol, I: IndexStorage, R: TextWithRankSupport<I>> Cursor<'a, S, I, R> {
    pub(crate) fn new(index: &'a FmIndex<S, I, R>) -> Self {
        let interval = index.full_interval();

        Self {
            index,
            interval,
            parent_interval: interval,
            last_rank: None,
            depth: 0,
        }
    }

    pub(crate) fn from_parts(
        index: &'a FmIndex<S, I, R>,
        interval: HalfOpenInterval,
        parent_interval: HalfOpenInterval,
        last_rank: Option<u8>,
        depth: usize,
    ) -> Self {
        Self {
            index,
            interval,
            parent_interval,
            last_rank,
            depth,
        }
    }

    /// Extends the currently searched query at the end by one symbol.
    ///
    /// Returns whether the query still occurs in the texts. Extending an empty cursor is a silent no-op,
    /// the cursor stays empty. The running time is in O(1).
    pub fn extend_right(&mut self, symbol: S) -> bool {
        if self.is_empty() {
            return false;
        }

        let rank = symbol.to_rank();
        self.parent_interval = self.interval;
        self.interval = self.index.backward_step(rank, self.interval);
        self.last_rank = Some(rank);
        self.depth += 1;

        !self.is_empty()
    }

    /// Extends the currently searched query at the end by all symbols of `query`, in order.
    ///
    /// Stops as soon as the cursor becomes empty. Returns whether the query still occurs in the texts.
    pub fn extend_right_seq(&mut self, query: &[S]) -> bool {
        query.iter().all(|&symbol| self.extend_right(symbol))
    }

    /// Extends the query by the smallest symbol for which it still occurs in the texts.
    ///
    /// If there is no such symbol, the cursor is left unchanged and `false` is returned.
    pub fn extend_right_any(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }

        self.replace_last_extension(self.interval, 0, self.depth + 1)
    }

    /// Replaces the last symbol of the query by the next larger symbol for which the query still occurs
    /// in the texts.
    ///
    /// If there is no such symbol, the cursor is left unchanged and `false` is returned. Repeated calls
    /// enumerate all alternatives in increasing order.
    ///
    /// Panics if the cursor was never extended (or if its last extension was not to the right, when
    /// it was obtained from a [`BiCursor`](crate::BiCursor)).
    pub fn cycle_back(&mut self) -> bool {
        let last_rank = self
            .last_rank
            .expect("cycle_back requires a cursor whose last operation was a right extension");

        self.replace_last_extension(self.parent_interval, last_rank + 1, self.depth)
    }

    fn replace_last_extension(&mut self, parent: HalfOpenInterval, first_rank: u8, depth: usize) -> bool {
        for rank in first_rank..S::ALPHABET_SIZE as u8 {
            let interval = self.index.backward_step(rank, parent);

            if !interval.is_empty() {
                self.parent_interval = parent;
                self.interval = interval;
                self.last_rank = Some(rank);
                self.depth = depth;
                return true;
            }
        }

        false
    }

    /// Returns the number of occurrences of the currently searched query in the set of indexed texts.
    ///
    /// The running time is in O(1).
    pub fn count(&self) -> usize {
        self.interval.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interval.is_empty()
    }

    /// The length of the currently searched query.
    pub fn query_length(&self) -> usize {
        self.depth
    }

    /// The last symbol that the query was extended by, if any.
    pub fn last_symbol(&self) -> Option<S> {
        self.last_rank.map(S::from_rank)
    }

    /// The suffix array interval of the currently searched query.
    pub fn interval(&self) -> HalfOpenInterval {
        self.interval
    }

    /// Returns the occurrences of the currently searched query in the set of indexed texts.
    ///
    /// The initial running time is in O(1).
    /// For each hit pulled from the iterator, a sampled suffix array lookup is performed.
    /// This operation needs `s / 2` steps on average, where `s` is the suffix array
    /// sampling rate of the index.
    pub fn locate(&self) -> impl Iterator<Item = Hit> + use<'a, S, I, R> {
        self.index.locate_interval(self.interval, self.depth)
    }

    /// Returns the currently searched query, sliced out of `texts`.
    ///
    /// `texts` must be the texts that the index was built from. Returns `None` if the cursor is empty.
    /// Intended for debugging and testing.
    pub fn path_label<'t, T: AsRef<[S]>>(&self, texts: &'t [T]) -> Option<&'t [S]> {
        let Hit { text_id, position } = self.locate().next()?;

        Some(&texts[text_id].as_ref()[position..position + self.depth])
    }
}
