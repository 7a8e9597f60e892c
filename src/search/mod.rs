//! Exact and approximate search in a [`BiFmIndex`].
//!
//! Queries are searched with search schemes: the query is split into blocks, and every search of the
//! scheme matches the blocks in a different order while bounding the errors per block. Substitutions,
//! insertions (a query symbol missing in the text) and deletions (a text symbol missing in the query) are
//! supported, each with its own budget.
//!
//! ```
//! use seqdex::BiFmIndex;
//! use seqdex::alphabet::{AsciiSymbol, Dna4};
//! use seqdex::search::{ErrorBudget, SearchConfig};
//!
//! let texts = [Dna4::encode(b"ACGTACGTACGT").unwrap()];
//! let index: BiFmIndex<Dna4> = BiFmIndex::new(&texts).unwrap();
//!
//! let queries = [Dna4::encode(b"CGG").unwrap()];
//! let mut positions: Vec<_> = SearchConfig::new()
//!     .max_errors(ErrorBudget::hamming(1))
//!     .search(&index, &queries)
//!     .unwrap()
//!     .flat_map(|hit| hit.locate())
//!     .map(|hit| hit.position)
//!     .collect();
//! positions.sort();
//!
//! assert_eq!(positions, [1, 5, 9]);
//! ```

mod algorithm;
mod results;
mod scheme;

use crate::error::{Error, Result};
use crate::{BiFmIndex, IndexStorage, Symbol, TextWithRankSupport};

#[doc(inline)]
pub use results::{SearchHit, SearchResults};

/// Maximum numbers of errors, in total and per kind of error.
///
/// If none of the per-kind budgets is set, every kind may use up to `total` errors. If at least one of them
/// is set, the unset kinds are not allowed at all, and an unset `total` becomes the sum of the set budgets.
/// A per-kind budget must not exceed `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorBudget {
    pub total: Option<u8>,
    pub substitution: Option<u8>,
    pub insertion: Option<u8>,
    pub deletion: Option<u8>,
}

impl ErrorBudget {
    /// No errors at all.
    pub fn exact() -> Self {
        Self::default()
    }

    /// Up to `k` substitutions, no insertions or deletions.
    pub fn hamming(k: u8) -> Self {
        Self {
            total: Some(k),
            substitution: Some(k),
            ..Self::default()
        }
    }

    /// Up to `k` errors of any kind.
    pub fn edit(k: u8) -> Self {
        Self {
            total: Some(k),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        let total = self.resolved_total();

        for (kind, value) in self.kinds() {
            if let Some(value) = value
                && value > total
            {
                return Err(Error::ErrorBudgetExceedsTotal { kind, value, total });
            }
        }

        Ok(())
    }

    fn kinds(&self) -> [(&'static str, Option<u8>); 3] {
        [
            ("substitution", self.substitution),
            ("insertion", self.insertion),
            ("deletion", self.deletion),
        ]
    }

    fn resolved_total(&self) -> u8 {
        self.total.unwrap_or_else(|| {
            self.kinds()
                .into_iter()
                .map(|(_, value)| value.unwrap_or(0))
                .fold(0, u8::saturating_add)
        })
    }

    // per-kind budgets larger than the total are capped (validate reports them as errors)
    pub(crate) fn limits(&self) -> Limits {
        let total = self.resolved_total();
        let any_kind_set = self.kinds().iter().any(|(_, value)| value.is_some());

        let kind_limit = |value: Option<u8>| {
            if any_kind_set {
                value.unwrap_or(0).min(total)
            } else {
                total
            }
        };

        Limits {
            total,
            substitution: kind_limit(self.substitution),
            insertion: kind_limit(self.insertion),
            deletion: kind_limit(self.deletion),
        }
    }
}

/// Maximum errors as fractions of the query length, in the range `[0, 1]`.
///
/// The same rules as for [`ErrorBudget`] apply. For a query of length `n`, a rate `r` allows
/// `ceil(r * n)` errors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ErrorRates {
    pub total: Option<f64>,
    pub substitution: Option<f64>,
    pub insertion: Option<f64>,
    pub deletion: Option<f64>,
}

impl ErrorRates {
    pub fn hamming(rate: f64) -> Self {
        Self {
            total: Some(rate),
            substitution: Some(rate),
            ..Self::default()
        }
    }

    pub fn edit(rate: f64) -> Self {
        Self {
            total: Some(rate),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        let all = [
            ("total", self.total),
            ("substitution", self.substitution),
            ("insertion", self.insertion),
            ("deletion", self.deletion),
        ];

        for (kind, value) in all {
            if let Some(value) = value
                && !(0.0..=1.0).contains(&value)
            {
                return Err(Error::InvalidErrorRate { kind, value });
            }
        }

        if let Some(total) = self.total {
            for &(kind, value) in &all[1..] {
                if let Some(value) = value
                    && value > total
                {
                    return Err(Error::ErrorRateExceedsTotal { kind, value, total });
                }
            }
        }

        Ok(())
    }

    fn to_budget(self, query_len: usize) -> ErrorBudget {
        let count = |rate: Option<f64>| rate.map(|rate| rate_to_count(rate, query_len));

        ErrorBudget {
            total: count(self.total),
            substitution: count(self.substitution),
            insertion: count(self.insertion),
            deletion: count(self.deletion),
        }
    }
}

// the tolerance keeps e.g. 0.1 * 30 from being rounded up to 4
fn rate_to_count(rate: f64, query_len: usize) -> u8 {
    let count = (rate * query_len as f64 - 1e-9).ceil();
    count.clamp(0.0, u8::MAX as f64) as u8
}

/// Decides which of the found hits of a query are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitPolicy {
    /// Every hit within the error budget.
    #[default]
    All,
    /// Every hit with the minimal number of errors.
    AllBest,
    /// Exactly one hit with the minimal number of errors, reporting a single occurrence.
    ///
    /// The first hit in search order is chosen. The total error budget is increased from 0, and within a
    /// search, matching the query symbol comes before substitutions (in alphabet order), insertions and
    /// deletions. Of the occurrences of that hit, the one in the first suffix array row is reported.
    SingleBest,
    /// Every hit with at most `s` more errors than the minimal number of errors (capped at the budget).
    Strata(u8),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MaxErrors {
    Counts(ErrorBudget),
    Rates(ErrorRates),
}

impl MaxErrors {
    fn validate(&self) -> Result<()> {
        match self {
            MaxErrors::Counts(budget) => budget.validate(),
            MaxErrors::Rates(rates) => rates.validate(),
        }
    }

    fn limits_for(&self, query_len: usize) -> Limits {
        match self {
            MaxErrors::Counts(budget) => budget.limits(),
            MaxErrors::Rates(rates) => rates.to_budget(query_len).limits(),
        }
    }
}

/// Normalized error limits of a single query search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Limits {
    pub(crate) total: u8,
    pub(crate) substitution: u8,
    pub(crate) insertion: u8,
    pub(crate) deletion: u8,
}

impl Limits {
    pub(crate) fn with_total(self, total: u8) -> Self {
        Self {
            total,
            substitution: self.substitution.min(total),
            insertion: self.insertion.min(total),
            deletion: self.deletion.min(total),
        }
    }
}

/// Builder for searches in a [`BiFmIndex`].
///
/// By default, an exact search reporting all hits is performed on the calling thread.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    max_errors: MaxErrors,
    hit_policy: HitPolicy,
    parallel: bool,
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets absolute error budgets. Replaces previously set error rates.
    pub fn max_errors(&mut self, budget: ErrorBudget) -> &mut Self {
        self.max_errors = MaxErrors::Counts(budget);
        self
    }

    /// Sets error budgets relative to the length of each query. Replaces previously set absolute budgets.
    pub fn max_error_rates(&mut self, rates: ErrorRates) -> &mut Self {
        self.max_errors = MaxErrors::Rates(rates);
        self
    }

    pub fn hit_policy(&mut self, hit_policy: HitPolicy) -> &mut Self {
        self.hit_policy = hit_policy;
        self
    }

    /// Searches batches of queries on the current rayon thread pool.
    ///
    /// The hits are still produced in the order of the queries.
    pub fn parallel(&mut self, parallel: bool) -> &mut Self {
        self.parallel = parallel;
        self
    }

    /// Returns a lazy iterator over the hits of all `queries`, ordered by query id.
    ///
    /// The configuration is validated before any query is searched. The work for a query is done when
    /// the iterator reaches it, so dropping the iterator early skips the remaining queries.
    pub fn search<'a, 'q, S, I, R, Q>(
        &self,
        index: &'a BiFmIndex<S, I, R>,
        queries: &'q [Q],
    ) -> Result<SearchResults<'a, 'q, S, I, R, Q>>
    where
        S: Symbol,
        I: IndexStorage,
        R: TextWithRankSupport<I>,
        Q: AsRef<[S]> + Sync,
    {
        self.max_errors.validate()?;

        log::debug!(
            "searching {} queries with {:?}, hit policy {:?}, parallel: {}",
            queries.len(),
            self.max_errors,
            self.hit_policy,
            self.parallel
        );

        Ok(SearchResults::new(index, queries, *self))
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_errors: MaxErrors::Counts(ErrorBudget::exact()),
            hit_policy: HitPolicy::All,
            parallel: false,
        }
    }
}
