//! Symbols that can be indexed and searched.
//!
//! All data structures of this library work on symbol ranks, small integers in `[0, σ)`. The [`Symbol`]
//! trait describes how a type is converted to and from its rank. Three alphabets are provided:
//! [`Dna4`], [`Dna5`] and [`Ascii`]. Other alphabets can be used by implementing [`Symbol`].

use crate::error::{Error, Result};

/// A type that can be converted to and from a rank in `[0, ALPHABET_SIZE)`.
///
/// The order of ranks defines the lexicographic order used by the indices, for example the order in which
/// [`Cursor::cycle_back`](crate::Cursor::cycle_back) enumerates alternatives.
///
/// The alphabet size must be at least 2 and at most 255, because the rank `ALPHABET_SIZE` is reserved
/// for the sentinel that separates indexed texts. Index construction fails for other alphabet sizes.
pub trait Symbol: Copy + Eq + Send + Sync + 'static {
    const ALPHABET_SIZE: usize;

    fn to_rank(self) -> u8;

    /// `rank` must be smaller than `ALPHABET_SIZE`.
    fn from_rank(rank: u8) -> Self;
}

/// A [`Symbol`] with a textual representation.
pub trait AsciiSymbol: Symbol {
    fn from_ascii(byte: u8) -> Option<Self>;

    fn to_ascii(self) -> u8;

    /// Converts a byte string into symbols, failing on the first byte that is not part of the alphabet.
    fn encode(text: &[u8]) -> Result<Vec<Self>> {
        text.iter()
            .enumerate()
            .map(|(position, &byte)| {
                Self::from_ascii(byte).ok_or(Error::InvalidAsciiSymbol { byte, position })
            })
            .collect()
    }

    fn decode(symbols: &[Self]) -> Vec<u8> {
        symbols.iter().map(|s| s.to_ascii()).collect()
    }
}

const INVALID: u8 = 255;

const DNA4_TRANSLATION_TABLE: [u8; 256] = {
    let mut table = [INVALID; 256];

    table[b'A' as usize] = 0;
    table[b'a' as usize] = 0;

    table[b'C' as usize] = 1;
    table[b'c' as usize] = 1;

    table[b'G' as usize] = 2;
    table[b'g' as usize] = 2;

    table[b'T' as usize] = 3;
    table[b't' as usize] = 3;

    table
};

const DNA5_TRANSLATION_TABLE: [u8; 256] = {
    let mut table = [INVALID; 256];

    table[b'A' as usize] = 0;
    table[b'a' as usize] = 0;

    table[b'C' as usize] = 1;
    table[b'c' as usize] = 1;

    table[b'G' as usize] = 2;
    table[b'g' as usize] = 2;

    table[b'N' as usize] = 3;
    table[b'n' as usize] = 3;

    table[b'T' as usize] = 4;
    table[b't' as usize] = 4;

    table
};

/// The four nucleotides, ordered `A < C < G < T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Dna4 {
    A = 0,
    C = 1,
    G = 2,
    T = 3,
}

impl Symbol for Dna4 {
    const ALPHABET_SIZE: usize = 4;

    fn to_rank(self) -> u8 {
        self as u8
    }

    fn from_rank(rank: u8) -> Self {
        match rank {
            0 => Dna4::A,
            1 => Dna4::C,
            2 => Dna4::G,
            3 => Dna4::T,
            _ => panic!("rank {rank} is not valid for Dna4"),
        }
    }
}

impl AsciiSymbol for Dna4 {
    fn from_ascii(byte: u8) -> Option<Self> {
        match DNA4_TRANSLATION_TABLE[byte as usize] {
            INVALID => None,
            rank => Some(Self::from_rank(rank)),
        }
    }

    fn to_ascii(self) -> u8 {
        b"ACGT"[self as usize]
    }
}

/// The four nucleotides plus the unknown base `N`, ordered `A < C < G < N < T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Dna5 {
    A = 0,
    C = 1,
    G = 2,
    N = 3,
    T = 4,
}

impl Symbol for Dna5 {
    const ALPHABET_SIZE: usize = 5;

    fn to_rank(self) -> u8 {
        self as u8
    }

    fn from_rank(rank: u8) -> Self {
        match rank {
            0 => Dna5::A,
            1 => Dna5::C,
            2 => Dna5::G,
            3 => Dna5::N,
            4 => Dna5::T,
            _ => panic!("rank {rank} is not valid for Dna5"),
        }
    }
}

impl AsciiSymbol for Dna5 {
    fn from_ascii(byte: u8) -> Option<Self> {
        match DNA5_TRANSLATION_TABLE[byte as usize] {
            INVALID => None,
            rank => Some(Self::from_rank(rank)),
        }
    }

    fn to_ascii(self) -> u8 {
        b"ACGNT"[self as usize]
    }
}

/// 7-bit ASCII characters, the rank of a character is its code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ascii(u8);

impl Ascii {
    pub fn new(byte: u8) -> Option<Self> {
        byte.is_ascii().then_some(Self(byte))
    }
}

impl Symbol for Ascii {
    const ALPHABET_SIZE: usize = 128;

    fn to_rank(self) -> u8 {
        self.0
    }

    fn from_rank(rank: u8) -> Self {
        assert!(rank < 128, "rank {rank} is not valid for Ascii");
        Self(rank)
    }
}

impl AsciiSymbol for Ascii {
    fn from_ascii(byte: u8) -> Option<Self> {
        Self::new(byte)
    }

    fn to_ascii(self) -> u8 {
        self.0
    }
}

pub(crate) fn validate_alphabet_size<S: Symbol>() -> Result<()> {
    if (2..=255).contains(&S::ALPHABET_SIZE) {
        Ok(())
    } else {
        Err(Error::InvalidAlphabetSize(S::ALPHABET_SIZE))
    }
}
