use super::scheme::{self, Search};
use super::{HitPolicy, Limits};
use crate::{BiCursor, BiFmIndex, HalfOpenInterval, IndexStorage, Symbol, TextWithRankSupport};

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::ControlFlow;

pub(crate) struct Leaf<'a, S, I, R> {
    pub(crate) cursor: BiCursor<'a, S, I, R>,
    pub(crate) errors: u8,
}

/// Searches a single query and applies the hit policy. Every returned leaf has a non-empty cursor.
///
/// The second return value tells whether only a single occurrence of the leaf should be reported.
pub(crate) fn search_query<'a, S, I, R>(
    index: &'a BiFmIndex<S, I, R>,
    query: &[S],
    limits: Limits,
    hit_policy: HitPolicy,
) -> (Vec<Leaf<'a, S, I, R>>, bool)
where
    S: Symbol,
    I: IndexStorage,
    R: TextWithRankSupport<I>,
{
    match hit_policy {
        HitPolicy::All => (collect_leaves(index, query, limits, false), false),
        HitPolicy::AllBest => (
            best_leaves(index, query, limits, false).map_or_else(Vec::new, |(_, leaves)| leaves),
            false,
        ),
        HitPolicy::SingleBest => {
            let leaves = best_leaves(index, query, limits, true)
                .map_or_else(Vec::new, |(_, mut leaves)| {
                    leaves.truncate(1);
                    leaves
                });
            (leaves, true)
        }
        HitPolicy::Strata(stratum) => {
            let leaves = match best_leaves(index, query, limits, true) {
                Some((min_errors, _)) => {
                    let total = min_errors.saturating_add(stratum).min(limits.total);
                    collect_leaves(index, query, limits.with_total(total), false)
                }
                None => Vec::new(),
            };
            (leaves, false)
        }
    }
}

// searches with increasing total budgets until something is found
fn best_leaves<'a, S, I, R>(
    index: &'a BiFmIndex<S, I, R>,
    query: &[S],
    limits: Limits,
    stop_at_first_leaf: bool,
) -> Option<(u8, Vec<Leaf<'a, S, I, R>>)>
where
    S: Symbol,
    I: IndexStorage,
    R: TextWithRankSupport<I>,
{
    (0..=limits.total).find_map(|total| {
        let leaves = collect_leaves(index, query, limits.with_total(total), stop_at_first_leaf);
        (!leaves.is_empty()).then_some((total, leaves))
    })
}

fn collect_leaves<'a, S, I, R>(
    index: &'a BiFmIndex<S, I, R>,
    query: &[S],
    limits: Limits,
    stop_at_first_leaf: bool,
) -> Vec<Leaf<'a, S, I, R>>
where
    S: Symbol,
    I: IndexStorage,
    R: TextWithRankSupport<I>,
{
    let mut leaves = LeafCollector::new();

    if query.is_empty() {
        return Vec::new();
    }

    let searches = scheme::search_scheme(limits.total, query.len());
    let blocks = scheme::block_boundaries(searches[0].num_blocks(), query.len());

    for search in &searches {
        let go_right = search.directions();
        let first_block = search.order[0];
        let start = if go_right[0] {
            blocks[first_block]
        } else {
            blocks[first_block + 1]
        };

        let mut scheme_search = SchemeSearch {
            query,
            search,
            blocks: &blocks,
            go_right,
            stop_at_first_leaf,
            leaves: &mut leaves,
        };

        let region = Region { start, end: start };

        if scheme_search
            .visit(index.cursor(), region, 0, 0, limits)
            .is_break()
        {
            break;
        }
    }

    leaves.leaves
}

// different alignments can lead to the same text substring, which is reported once with its fewest errors
struct LeafCollector<'a, S, I, R> {
    leaves: Vec<Leaf<'a, S, I, R>>,
    seen: HashMap<(HalfOpenInterval, usize), usize>,
}

impl<'a, S: Symbol, I: IndexStorage, R: TextWithRankSupport<I>> LeafCollector<'a, S, I, R> {
    fn new() -> Self {
        Self {
            leaves: Vec::new(),
            seen: HashMap::new(),
        }
    }

    fn add(&mut self, cursor: BiCursor<'a, S, I, R>, errors: u8) {
        match self.seen.entry(cursor.interval_key()) {
            Entry::Occupied(entry) => {
                let leaf = &mut self.leaves[*entry.get()];
                leaf.errors = leaf.errors.min(errors);
            }
            Entry::Vacant(entry) => {
                entry.insert(self.leaves.len());
                self.leaves.push(Leaf { cursor, errors });
            }
        }
    }
}

// the part of the query that was already consumed (matched, substituted or skipped as insertion)
#[derive(Debug, Clone, Copy)]
struct Region {
    start: usize,
    end: usize,
}

impl Region {
    fn advanced(self, right: bool) -> Self {
        if right {
            Region {
                end: self.end + 1,
                ..self
            }
        } else {
            Region {
                start: self.start - 1,
                ..self
            }
        }
    }
}

struct SchemeSearch<'c, 'a, S, I, R> {
    query: &'c [S],
    search: &'c Search,
    blocks: &'c [usize],
    go_right: Vec<bool>,
    stop_at_first_leaf: bool,
    leaves: &'c mut LeafCollector<'a, S, I, R>,
}

impl<'a, S: Symbol, I: IndexStorage, R: TextWithRankSupport<I>> SchemeSearch<'_, 'a, S, I, R> {
    // `step` is the position of the current block in the order of the search. `cursor` is never empty.
    fn visit(
        &mut self,
        cursor: BiCursor<'a, S, I, R>,
        region: Region,
        step: usize,
        errors: u8,
        budget: Limits,
    ) -> ControlFlow<()> {
        let block = self.search.order[step];
        let right = self.go_right[step];

        let block_done = if right {
            region.end == self.blocks[block + 1]
        } else {
            region.start == self.blocks[block]
        };

        if block_done {
            if errors >= self.search.lower[step] {
                if step + 1 == self.search.num_blocks() {
                    return self.report(cursor, errors);
                }

                self.visit(cursor, region, step + 1, errors, budget)?;
            }

            // deletions at the border to the next block
            return self.deletions(cursor, region, step, errors, budget);
        }

        let position = if right { region.end } else { region.start - 1 };
        let symbol = self.query[position];
        let next_region = region.advanced(right);

        let mut child = cursor;
        if extend(&mut child, symbol, right) {
            self.visit(child, next_region, step, errors, budget)?;
        }

        if errors < self.search.upper[step] && budget.total > 0 {
            if budget.substitution > 0 {
                let budget = Limits {
                    total: budget.total - 1,
                    substitution: budget.substitution - 1,
                    ..budget
                };

                let mut child = cursor;
                if first_child(&mut child, right) {
                    loop {
                        if child.last_symbol() != Some(symbol) {
                            self.visit(child, next_region, step, errors + 1, budget)?;
                        }

                        if !next_child(&mut child, right) {
                            break;
                        }
                    }
                }
            }

            if budget.insertion > 0 {
                let budget = Limits {
                    total: budget.total - 1,
                    insertion: budget.insertion - 1,
                    ..budget
                };

                self.visit(cursor, next_region, step, errors + 1, budget)?;
            }
        }

        self.deletions(cursor, region, step, errors, budget)
    }

    // deletions are only placed between two query symbols, never before the first or after the last
    fn deletions(
        &mut self,
        cursor: BiCursor<'a, S, I, R>,
        region: Region,
        step: usize,
        errors: u8,
        budget: Limits,
    ) -> ControlFlow<()> {
        let right = self.go_right[step];
        let gap = if right { region.end } else { region.start };

        if gap == 0
            || gap == self.query.len()
            || errors >= self.search.upper[step]
            || budget.total == 0
            || budget.deletion == 0
        {
            return ControlFlow::Continue(());
        }

        let budget = Limits {
            total: budget.total - 1,
            deletion: budget.deletion - 1,
            ..budget
        };

        let mut child = cursor;
        if first_child(&mut child, right) {
            loop {
                self.visit(child, region, step, errors + 1, budget)?;

                if !next_child(&mut child, right) {
                    break;
                }
            }
        }

        ControlFlow::Continue(())
    }

    fn report(&mut self, cursor: BiCursor<'a, S, I, R>, errors: u8) -> ControlFlow<()> {
        // a query consisting only of insertions matches the empty string, which is no hit
        if cursor.query_length() == 0 {
            return ControlFlow::Continue(());
        }

        self.leaves.add(cursor, errors);

        if self.stop_at_first_leaf {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

fn extend<S: Symbol, I: IndexStorage, R: TextWithRankSupport<I>>(
    cursor: &mut BiCursor<'_, S, I, R>,
    symbol: S,
    right: bool,
) -> bool {
    if right {
        cursor.extend_right(symbol)
    } else {
        cursor.extend_left(symbol)
    }
}

fn first_child<S: Symbol, I: IndexStorage, R: TextWithRankSupport<I>>(
    cursor: &mut BiCursor<'_, S, I, R>,
    right: bool,
) -> bool {
    if right {
        cursor.extend_right_any()
    } else {
        cursor.extend_left_any()
    }
}

fn next_child<S: Symbol, I: IndexStorage, R: TextWithRankSupport<I>>(
    cursor: &mut BiCursor<'_, S, I, R>,
    right: bool,
) -> bool {
    if right {
        cursor.cycle_back()
    } else {
        cursor.cycle_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{AsciiSymbol, Dna4};
    use crate::search::ErrorBudget;

    fn start_positions(index: &BiFmIndex<Dna4>, query: &[u8], budget: ErrorBudget) -> Vec<(usize, u8)> {
        let query = Dna4::encode(query).unwrap();
        let (leaves, _) = search_query(index, &query, budget.limits(), HitPolicy::All);

        let mut positions: Vec<_> = leaves
            .iter()
            .flat_map(|leaf| leaf.cursor.locate().map(|hit| (hit.position, leaf.errors)))
            .collect();
        positions.sort();
        positions.dedup();
        positions
    }

    #[test]
    fn leaves_carry_fewest_errors() {
        let texts = [Dna4::encode(b"ACGTACGTACGT").unwrap()];
        let index = BiFmIndex::new(&texts).unwrap();

        // ACG and CGT are reached with one insertion each, ACGT exactly
        assert_eq!(
            start_positions(&index, b"ACGT", ErrorBudget::edit(1)),
            [(0, 0), (0, 1), (1, 1), (4, 0), (4, 1), (5, 1), (8, 0), (8, 1), (9, 1)]
        );
    }

    #[test]
    fn no_deletion_at_query_ends() {
        let texts = [Dna4::encode(b"TTTTACGTTTTT").unwrap()];
        let index = BiFmIndex::new(&texts).unwrap();

        let budget = ErrorBudget {
            deletion: Some(1),
            ..ErrorBudget::default()
        };

        // ACGTT at 4 skips a T between G and T, TACGT at 3 would need a deletion after the last G
        assert_eq!(start_positions(&index, b"ACGT", budget), [(4, 0), (4, 1)]);
        assert_eq!(start_positions(&index, b"ACT", budget), [(4, 1)]);
        assert_eq!(start_positions(&index, b"TACG", budget), [(2, 1), (3, 0)]);
    }

    #[test]
    fn insertions_only_never_report_empty_hits() {
        let texts = [Dna4::encode(b"AAAA").unwrap()];
        let index = BiFmIndex::new(&texts).unwrap();

        let budget = ErrorBudget {
            insertion: Some(2),
            ..ErrorBudget::default()
        };

        assert!(start_positions(&index, b"CC", budget).is_empty());
        assert_eq!(start_positions(&index, b"CA", budget).len(), 4);
    }
}
