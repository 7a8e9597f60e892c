use super::SearchConfig;
use super::algorithm::{self, Leaf};
use crate::{BiCursor, BiFmIndex, Hit, IndexStorage, Symbol, TextWithRankSupport};

use rayon::prelude::*;
use std::collections::VecDeque;

/// A text substring that matches a query within the error budget.
///
/// The occurrences of the substring are only computed when [`locate`](SearchHit::locate) is called.
pub struct SearchHit<'a, S, I, R> {
    query_id: usize,
    errors: u8,
    cursor: BiCursor<'a, S, I, R>,
    single_occurrence: bool,
}

impl<S, I, R> Clone for SearchHit<'_, S, I, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, I, R> Copy for SearchHit<'_, S, I, R> {}

impl<'a, S: Symbol, I: IndexStorage, R: TextWithRankSupport<I>> SearchHit<'a, S, I, R> {
    /// The position of the query in the slice that was passed to [`SearchConfig::search`].
    pub fn query_id(&self) -> usize {
        self.query_id
    }

    /// The fewest errors of an alignment between query and matched substring that skips no text symbol before
    /// the first or after the last query symbol.
    ///
    /// This can be larger than the plain edit distance of the two.
    pub fn errors(&self) -> u8 {
        self.errors
    }

    /// The cursor of the matched substring, which can for example be extended further.
    pub fn cursor(&self) -> &BiCursor<'a, S, I, R> {
        &self.cursor
    }

    /// The number of occurrences this hit reports.
    pub fn count(&self) -> usize {
        if self.single_occurrence {
            self.cursor.count().min(1)
        } else {
            self.cursor.count()
        }
    }

    /// Returns the occurrences of the matched substring, in unspecified order.
    pub fn locate(&self) -> impl Iterator<Item = Hit> + use<'a, S, I, R> {
        let cursor = if self.single_occurrence {
            self.cursor.first_occurrence_cursor()
        } else {
            self.cursor.to_fwd_cursor()
        };

        cursor.locate()
    }
}

/// Lazy iterator over the hits of a batch of queries, created by [`SearchConfig::search`].
///
/// Hits are ordered by query id. The iterator can not be restarted, searching again requires a new call
/// to [`SearchConfig::search`].
pub struct SearchResults<'a, 'q, S, I, R, Q> {
    index: &'a BiFmIndex<S, I, R>,
    queries: &'q [Q],
    config: SearchConfig,
    next_query_id: usize,
    buffer: VecDeque<SearchHit<'a, S, I, R>>,
}

impl<'a, 'q, S, I, R, Q> SearchResults<'a, 'q, S, I, R, Q>
where
    S: Symbol,
    I: IndexStorage,
    R: TextWithRankSupport<I>,
    Q: AsRef<[S]> + Sync,
{
    pub(crate) fn new(index: &'a BiFmIndex<S, I, R>, queries: &'q [Q], config: SearchConfig) -> Self {
        Self {
            index,
            queries,
            config,
            next_query_id: 0,
            buffer: VecDeque::new(),
        }
    }

    fn search_query(&self, query_id: usize) -> Vec<SearchHit<'a, S, I, R>> {
        let query = self.queries[query_id].as_ref();
        let limits = self.config.max_errors.limits_for(query.len());

        let (leaves, single_occurrence) =
            algorithm::search_query(self.index, query, limits, self.config.hit_policy);

        leaves
            .into_iter()
            .map(|Leaf { cursor, errors }| SearchHit {
                query_id,
                errors,
                cursor,
                single_occurrence,
            })
            .collect()
    }

    fn search_next_batch(&mut self) {
        let batch_size = if self.config.parallel {
            rayon::current_num_threads() * 4
        } else {
            1
        };

        let batch = self.next_query_id..(self.next_query_id + batch_size).min(self.queries.len());
        self.next_query_id = batch.end;

        if self.config.parallel {
            let hits: Vec<_> = batch
                .into_par_iter()
                .map(|query_id| self.search_query(query_id))
                .collect();

            self.buffer.extend(hits.into_iter().flatten());
        } else {
            for query_id in batch {
                let hits = self.search_query(query_id);
                self.buffer.extend(hits);
            }
        }
    }
}

impl<'a, 'q, S, I, R, Q> Iterator for SearchResults<'a, 'q, S, I, R, Q>
where
    S: Symbol,
    I: IndexStorage,
    R: TextWithRankSupport<I>,
    Q: AsRef<[S]> + Sync,
{
    type Item = SearchHit<'a, S, I, R>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.is_empty() && self.next_query_id < self.queries.len() {
            self.search_next_batch();
        }

        self.buffer.pop_front()
    }
}
