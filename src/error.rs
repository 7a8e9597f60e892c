use thiserror::Error;

/// Errors reported by index construction, search configuration, hashing and the interleaved Bloom filter.
///
/// Empty cursor intervals are never errors. They are regular terminal states of a search.
#[derive(Debug, Error)]
pub enum Error {
    #[error("the alphabet size must be in the range [2, 255], but it is {0}")]
    InvalidAlphabetSize(usize),

    #[error("at least one text is required to build an index")]
    NoTexts,

    /// A symbol rank that is not smaller than the alphabet size (and would therefore collide with the sentinel).
    #[error(
        "symbol rank {rank} at position {position} of text {text_id} is not smaller than the alphabet size {alphabet_size}"
    )]
    InvalidRank {
        text_id: usize,
        position: usize,
        rank: u8,
        alphabet_size: usize,
    },

    #[error("byte {byte:#04x} at position {position} is not part of the alphabet")]
    InvalidAsciiSymbol { byte: u8, position: usize },

    #[error("the suffix array sampling rate must be greater than 0")]
    InvalidSamplingRate,

    #[error(
        "the concatenated texts have length {len} (including sentinels), which does not fit into the index storage type (max {max})"
    )]
    TextTooLong { len: usize, max: usize },

    #[error("suffix array construction failed: {0}")]
    SuffixArrayConstruction(String),

    #[error("the {kind} error budget ({value}) must not exceed the total error budget ({total})")]
    ErrorBudgetExceedsTotal {
        kind: &'static str,
        value: u8,
        total: u8,
    },

    #[error("the {kind} error rate must be in the range [0, 1], but it is {value}")]
    InvalidErrorRate { kind: &'static str, value: f64 },

    #[error("the {kind} error rate ({value}) must not exceed the total error rate ({total})")]
    ErrorRateExceedsTotal {
        kind: &'static str,
        value: f64,
        total: f64,
    },

    #[error("the bin count must be greater than 0")]
    InvalidBinCount,

    #[error("the bin size must be greater than 0")]
    InvalidBinSize,

    #[error("the hash function count must be in the range [1, 5], but it is {0}")]
    InvalidHashFunctionCount(usize),

    #[error("bin index {bin_index} is out of range for a filter with {bin_count} bins")]
    BinIndexOutOfRange { bin_index: usize, bin_count: usize },

    #[error("the bin count can only be increased, but {requested} < {current}")]
    BinCountDecrease { current: usize, requested: usize },

    #[error("the stored interleaved Bloom filter is inconsistent: {0}")]
    CorruptedFilter(String),

    #[error("k-mer size {k} is invalid for an alphabet of size {alphabet_size}")]
    InvalidKmerSize { k: usize, alphabet_size: usize },

    #[error("the minimiser window size {window_size} must not be smaller than the k-mer size {k}")]
    InvalidWindowSize { window_size: usize, k: usize },

    #[error("the stored binning directory was built for an alphabet of size {stored}, not {expected}")]
    DirectoryAlphabetMismatch { stored: usize, expected: usize },

    #[error("the forward and the reverse index do not belong to the same texts")]
    IndexMismatch,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "savefile")]
    #[error("serialization failed: {0}")]
    Savefile(#[from] savefile::SavefileError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
