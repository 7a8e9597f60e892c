use std::ops::Range;

use num_traits::NumCast;
use rayon::prelude::*;

use super::block::{Block, Block64};
use crate::{IndexStorage, TextWithRankSupport, maybe_savefile::MaybeSavefile, sealed::Sealed};

const SUPERBLOCK_SIZE: usize = u16::MAX as usize + 1;

// The text is stored bit-sliced: every block of B::NUM_BITS symbols is represented by ceil(log2(σ))
// "planes", plane i holding bit i of every symbol. The planes of one block are next to each other.
// Block offsets count the symbols since the start of the superblock, superblock offsets since the
// start of the text. Both are interleaved by symbol.

/// Memory-efficient text with rank support, using bit-sliced blocks and two levels of offsets.
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondensedTextWithRankSupport<I, B = Block64> {
    text_len: usize,
    alphabet_size: usize,
    bits_per_symbol: usize,
    interleaved_planes: Vec<B>,
    interleaved_block_offsets: Vec<u16>,
    interleaved_superblock_offsets: Vec<I>,
}

impl<I: IndexStorage, B: Block> CondensedTextWithRankSupport<I, B> {
    fn planes_range(&self, idx: usize) -> Range<usize> {
        let start = (idx / B::NUM_BITS) * self.bits_per_symbol;
        start..start + self.bits_per_symbol
    }
}

impl<I: IndexStorage, B: Block> MaybeSavefile for CondensedTextWithRankSupport<I, B> {}

impl<I: IndexStorage, B: Block> Sealed for CondensedTextWithRankSupport<I, B> {}

impl<I: IndexStorage, B: Block> TextWithRankSupport<I> for CondensedTextWithRankSupport<I, B> {
    fn construct(text: &[u8], alphabet_size: usize) -> Self {
        assert!(alphabet_size >= 2);

        let bits_per_symbol = ilog2_ceil_for_nonzero(alphabet_size);

        // rank is defined for all indices in [0, text.len()]
        let num_positions = text.len() + 1;
        let num_blocks = num_positions.div_ceil(B::NUM_BITS);
        let num_superblocks = num_positions.div_ceil(SUPERBLOCK_SIZE);
        let blocks_per_superblock = SUPERBLOCK_SIZE / B::NUM_BITS;

        let mut interleaved_planes = vec![B::zeroes(); num_blocks * bits_per_symbol];
        let mut interleaved_block_offsets = vec![0u16; num_blocks * alphabet_size];
        let mut superblock_counts = vec![0usize; num_superblocks * alphabet_size];

        interleaved_planes
            .par_chunks_mut(blocks_per_superblock * bits_per_symbol)
            .zip(interleaved_block_offsets.par_chunks_mut(blocks_per_superblock * alphabet_size))
            .zip(superblock_counts.par_chunks_mut(alphabet_size))
            .enumerate()
            .for_each(|(superblock_idx, ((planes, block_offsets), counts))| {
                let start = std::cmp::min(superblock_idx * SUPERBLOCK_SIZE, text.len());
                let end = std::cmp::min(start + SUPERBLOCK_SIZE, text.len());

                fill_superblock(
                    &text[start..end],
                    planes,
                    block_offsets,
                    counts,
                    alphabet_size,
                    bits_per_symbol,
                );
            });

        // accumulate superblocks in single thread
        let mut interleaved_superblock_offsets = Vec::with_capacity(superblock_counts.len());
        let mut sum_of_previous = vec![0usize; alphabet_size];

        for counts in superblock_counts.chunks(alphabet_size) {
            for (sum, &count) in sum_of_previous.iter_mut().zip(counts) {
                interleaved_superblock_offsets
                    .push(<I as NumCast>::from(*sum).expect("text length was checked to fit into I"));
                *sum += count;
            }
        }

        Self {
            text_len: text.len(),
            alphabet_size,
            bits_per_symbol,
            interleaved_planes,
            interleaved_block_offsets,
            interleaved_superblock_offsets,
        }
    }

    fn rank(&self, symbol: u8, idx: usize) -> usize {
        assert!((symbol as usize) < self.alphabet_size && idx <= self.text_len);

        let superblock_offset = self.interleaved_superblock_offsets
            [(idx / SUPERBLOCK_SIZE) * self.alphabet_size + symbol as usize];
        let superblock_offset =
            <usize as NumCast>::from(superblock_offset).expect("offsets are never negative");

        let block_offset = self.interleaved_block_offsets
            [(idx / B::NUM_BITS) * self.alphabet_size + symbol as usize]
            as usize;

        let mut matches = B::ones();

        for (bit, plane) in self.interleaved_planes[self.planes_range(idx)]
            .iter()
            .enumerate()
        {
            matches.retain_matching(*plane, (symbol >> bit) & 1 == 1);
        }

        superblock_offset + block_offset + matches.count_ones_before(idx % B::NUM_BITS)
    }

    fn symbol_at(&self, idx: usize) -> u8 {
        assert!(idx < self.text_len);

        let index_in_block = idx % B::NUM_BITS;

        self.interleaved_planes[self.planes_range(idx)]
            .iter()
            .enumerate()
            .fold(0, |symbol, (bit, plane)| {
                symbol | ((plane.get_bit(index_in_block) as u8) << bit)
            })
    }

    fn text_len(&self) -> usize {
        self.text_len
    }

    fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }
}

fn fill_superblock<B: Block>(
    text: &[u8],
    interleaved_planes: &mut [B],
    interleaved_block_offsets: &mut [u16],
    superblock_counts: &mut [usize],
    alphabet_size: usize,
    bits_per_symbol: usize,
) {
    // the last block may not have any text symbols, but still needs its offsets
    for (block_idx, (planes, block_offsets)) in interleaved_planes
        .chunks_mut(bits_per_symbol)
        .zip(interleaved_block_offsets.chunks_mut(alphabet_size))
        .enumerate()
    {
        for (offset, &count) in block_offsets.iter_mut().zip(superblock_counts.iter()) {
            *offset = count as u16;
        }

        let start = std::cmp::min(block_idx * B::NUM_BITS, text.len());
        let end = std::cmp::min(start + B::NUM_BITS, text.len());

        for (index_in_block, &symbol) in text[start..end].iter().enumerate() {
            superblock_counts[symbol as usize] += 1;

            for (bit, plane) in planes.iter_mut().enumerate() {
                if (symbol >> bit) & 1 == 1 {
                    plane.set_bit(index_in_block);
                }
            }
        }
    }
}

fn ilog2_ceil_for_nonzero(value: usize) -> usize {
    usize::BITS as usize - value.leading_zeros() as usize - value.is_power_of_two() as usize
}
