//! Hashing of k-mers and minimisers, for example to fill an
//! [`InterleavedBloomFilter`](crate::ibf::InterleavedBloomFilter).

use crate::Symbol;
use crate::error::{Error, Result};

use std::collections::VecDeque;

/// Iterator over the hashes of all k-mers (substrings of length k) of a sequence, from left to right.
///
/// The hash of a k-mer is its value as a number in base σ, with the first symbol being the most
/// significant digit. It is unique for every k-mer and is updated in O(1) per step.
///
/// ```
/// use seqdex::alphabet::{AsciiSymbol, Dna4};
/// use seqdex::kmer::KmerHashes;
///
/// let sequence = Dna4::encode(b"ACGT").unwrap();
/// let hashes: Vec<_> = KmerHashes::new(&sequence, 2).unwrap().collect();
///
/// // AC = 0 * 4 + 1, CG = 1 * 4 + 2, GT = 2 * 4 + 3
/// assert_eq!(hashes, [1, 6, 11]);
/// ```
#[derive(Debug, Clone)]
pub struct KmerHashes<'s, S> {
    sequence: &'s [S],
    k: usize,
    next_end: usize,
    hash: u64,
    // σ^(k-1), weight of the symbol that leaves the window, wrapping for σ^k = 2^64
    leading_weight: u64,
}

impl<'s, S: Symbol> KmerHashes<'s, S> {
    /// Fails if `k` is 0 or if σ^k exceeds 2^64, because then the hashes would not be unique.
    pub fn new(sequence: &'s [S], k: usize) -> Result<Self> {
        check_kmer_size::<S>(k)?;
        Ok(Self::with_checked_k(sequence, k))
    }

    pub(crate) fn with_checked_k(sequence: &'s [S], k: usize) -> Self {
        let alphabet_size = S::ALPHABET_SIZE as u64;
        let leading_weight = alphabet_size.wrapping_pow(k as u32 - 1);

        let hash = sequence
            .iter()
            .take(k - 1)
            .fold(0u64, |hash, symbol| {
                hash.wrapping_mul(alphabet_size)
                    .wrapping_add(symbol.to_rank() as u64)
            });

        Self {
            sequence,
            k,
            next_end: k - 1,
            hash,
            leading_weight,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

pub(crate) fn check_kmer_size<S: Symbol>(k: usize) -> Result<()> {
    let alphabet_size = S::ALPHABET_SIZE as u128;

    let max_hashes = (0..k).try_fold(1u128, |acc, _| {
        let next = acc * alphabet_size;
        (next <= 1u128 << 64).then_some(next)
    });

    if k == 0 || max_hashes.is_none() {
        return Err(Error::InvalidKmerSize {
            k,
            alphabet_size: S::ALPHABET_SIZE,
        });
    }

    Ok(())
}

impl<S: Symbol> Iterator for KmerHashes<'_, S> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let incoming = self.sequence.get(self.next_end)?;
        let alphabet_size = S::ALPHABET_SIZE as u64;

        self.hash = self
            .hash
            .wrapping_mul(alphabet_size)
            .wrapping_add(incoming.to_rank() as u64);

        self.next_end += 1;

        let hash = self.hash;

        // remove the first symbol of the current window for the next step
        let outgoing = self.sequence[self.next_end - self.k].to_rank() as u64;
        self.hash = self
            .hash
            .wrapping_sub(outgoing.wrapping_mul(self.leading_weight));

        Some(hash)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sequence.len().saturating_sub(self.next_end);
        (remaining, Some(remaining))
    }
}

impl<S: Symbol> ExactSizeIterator for KmerHashes<'_, S> {}

/// The seed that [`MinimiserHashes::new`] combines with the k-mer hashes.
pub const DEFAULT_MINIMISER_SEED: u64 = 0x8F3F73B5CF1C9ADE;

/// Iterator over the minimisers of a sequence, from left to right.
///
/// Every window of `window_size` consecutive symbols contains `window_size - k + 1` k-mers. Their
/// [`KmerHashes`] are combined with a seed by XOR, and the smallest result is the minimiser of the window.
/// Consecutive windows often share their minimiser, which is then only reported once. Ties are resolved as
/// in robust winnowing: the minimiser of the previous window is kept while it is in the window and still
/// minimal, otherwise the rightmost minimal k-mer is chosen.
///
/// A sequence that is shorter than one window but contains at least one k-mer forms a single window.
///
/// ```
/// use seqdex::alphabet::{AsciiSymbol, Dna4};
/// use seqdex::kmer::MinimiserHashes;
///
/// let sequence = Dna4::encode(b"ACGGCGACGTTTAG").unwrap();
/// let minimisers: Vec<_> = MinimiserHashes::with_seed(&sequence, 4, 8, 0).unwrap().collect();
///
/// // ACGG, CGAC and ACGT
/// assert_eq!(minimisers, [26, 97, 27]);
/// ```
#[derive(Debug, Clone)]
pub struct MinimiserHashes<'s, S> {
    kmers: KmerHashes<'s, S>,
    seed: u64,
    kmers_per_window: usize,
    next_position: usize,
    // (position, seeded hash) with strictly increasing hashes from front to back
    candidates: VecDeque<(usize, u64)>,
    current: Option<(usize, u64)>,
}

impl<'s, S: Symbol> MinimiserHashes<'s, S> {
    /// Uses [`DEFAULT_MINIMISER_SEED`]. Fails if `k` is invalid for [`KmerHashes`] or if `window_size < k`.
    pub fn new(sequence: &'s [S], k: usize, window_size: usize) -> Result<Self> {
        Self::with_seed(sequence, k, window_size, DEFAULT_MINIMISER_SEED)
    }

    /// A seed of 0 keeps the plain k-mer hashes.
    pub fn with_seed(sequence: &'s [S], k: usize, window_size: usize, seed: u64) -> Result<Self> {
        check_minimiser_parameters::<S>(k, window_size)?;
        Ok(Self::with_checked_parameters(sequence, k, window_size, seed))
    }

    pub(crate) fn with_checked_parameters(
        sequence: &'s [S],
        k: usize,
        window_size: usize,
        seed: u64,
    ) -> Self {
        Self {
            kmers: KmerHashes::with_checked_k(sequence, k),
            seed,
            kmers_per_window: window_size - k + 1,
            next_position: 0,
            candidates: VecDeque::new(),
            current: None,
        }
    }

    fn push(&mut self, hash: u64) {
        let hash = hash ^ self.seed;

        while self.candidates.back().is_some_and(|&(_, back)| back >= hash) {
            self.candidates.pop_back();
        }

        self.candidates.push_back((self.next_position, hash));
        self.next_position += 1;
    }
}

pub(crate) fn check_minimiser_parameters<S: Symbol>(k: usize, window_size: usize) -> Result<()> {
    check_kmer_size::<S>(k)?;

    if window_size < k {
        return Err(Error::InvalidWindowSize { window_size, k });
    }

    Ok(())
}

impl<S: Symbol> Iterator for MinimiserHashes<'_, S> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        loop {
            if self.current.is_none() {
                for _ in 0..self.kmers_per_window {
                    match self.kmers.next() {
                        Some(hash) => self.push(hash),
                        None => break,
                    }
                }
            } else {
                let hash = self.kmers.next()?;
                self.push(hash);
            }

            let window_start = self.next_position.saturating_sub(self.kmers_per_window);

            while self
                .candidates
                .front()
                .is_some_and(|&(position, _)| position < window_start)
            {
                self.candidates.pop_front();
            }

            let &(_, smallest) = self.candidates.front()?;

            // the front is the rightmost minimal k-mer, because equal hashes replace older ones
            if let Some((position, hash)) = self.current
                && position >= window_start
                && hash <= smallest
            {
                continue;
            }

            self.current = self.candidates.front().copied();
            return Some(smallest);
        }
    }
}
