use num_traits::{NumCast, PrimInt};
use rayon::prelude::*;
use std::collections::HashMap;

// I1: suffix array values from the construction backend, I2: IndexStorage we want to use for the FM-Index
pub(crate) fn bwt_from_suffix_array<I1: PrimInt + Sync, I2: PrimInt + Send>(
    suffix_array: &[I1],
    text: &[u8],
    sentinel: u8,
) -> (Vec<u8>, HashMap<usize, I2>) {
    let mut bwt = vec![0; text.len()];

    let chunk_size = std::cmp::max(text.len().div_ceil(rayon::current_num_threads() * 4), 1);

    // rows with a sentinel in the BWT are the only ones at which a text begins. their suffix array
    // values are stored directly, so that locating never has to step over a sentinel
    let text_border_lookup = suffix_array
        .par_chunks(chunk_size)
        .zip(bwt.par_chunks_mut(chunk_size))
        .enumerate()
        .map(|(chunk_idx, (suffix_array_chunk, bwt_chunk))| {
            for (&text_idx, bwt_symbol) in suffix_array_chunk.iter().zip(bwt_chunk.iter_mut()) {
                let text_idx = <usize as NumCast>::from(text_idx).expect("valid suffix array value");

                *bwt_symbol = if text_idx > 0 {
                    text[text_idx - 1]
                } else {
                    text[text.len() - 1]
                };
            }

            memchr::memchr_iter(sentinel, bwt_chunk)
                .map(|i| {
                    let text_idx = <I2 as NumCast>::from(suffix_array_chunk[i])
                        .expect("text length was checked to fit into the index storage");
                    (chunk_size * chunk_idx + i, text_idx)
                })
                .collect::<HashMap<_, _>>()
        })
        .reduce_with(|mut m0, m1| {
            m0.extend(m1);
            m0
        })
        .unwrap_or_default();

    (bwt, text_border_lookup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn naive_bwt(text: &[u8]) -> (Vec<u8>, Vec<usize>) {
        let mut suffix_array: Vec<_> = (0..text.len()).collect();
        suffix_array.sort_by_key(|&i| &text[i..]);

        let bwt = suffix_array
            .iter()
            .map(|&i| text[(i + text.len() - 1) % text.len()])
            .collect();

        (bwt, suffix_array)
    }

    #[test]
    fn small_text() {
        // "acab$" with sentinel 3
        let text = [0u8, 2, 0, 1, 3];
        let suffix_array: Vec<i32> = vec![2, 0, 3, 1, 4];

        let (bwt, text_border_lookup) = bwt_from_suffix_array::<i32, i32>(&suffix_array, &text, 3);

        assert_eq!(bwt, [2, 3, 0, 0, 1]);
        assert_eq!(text_border_lookup, HashMap::from_iter([(1, 0)]));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(512))]

        #[test]
        fn correctness_random_texts(
            mut text in prop::collection::vec(0u8..4, 0..600),
            num_threads in 1usize..4
        ) {
            text.push(4);

            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build()
                .unwrap();

            let (expected_bwt, suffix_array) = naive_bwt(&text);
            let suffix_array: Vec<i64> = suffix_array.into_iter().map(|i| i as i64).collect();

            let (bwt, text_border_lookup) =
                pool.install(|| bwt_from_suffix_array::<i64, u32>(&suffix_array, &text, 4));

            prop_assert_eq!(&bwt, &expected_bwt);

            for (row, &symbol) in bwt.iter().enumerate() {
                prop_assert_eq!(text_border_lookup.contains_key(&row), symbol == 4);
            }
        }
    }
}
