use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use seqdex::{
    FmIndex, FmIndexConfig, Hit,
    alphabet::{Ascii, AsciiSymbol, Dna4, Dna5},
    text_with_rank_support::{Block512, CondensedTextWithRankSupport},
};
use std::collections::HashSet;

fn dna(text: &[u8]) -> Vec<Dna4> {
    Dna4::encode(text).unwrap()
}

fn create_index() -> FmIndex<Dna4> {
    FmIndexConfig::<i32>::new()
        .suffix_array_sampling_rate(3)
        .construct(&[dna(b"CCCAAAGGGTTT")])
        .unwrap()
}

fn create_index_u32_block512() -> FmIndex<Dna4, u32, CondensedTextWithRankSupport<u32, Block512>> {
    FmIndexConfig::<u32, CondensedTextWithRankSupport<u32, Block512>>::new()
        .suffix_array_sampling_rate(3)
        .construct(&[dna(b"CCCAAAGGGTTT")])
        .unwrap()
}

fn hits(pairs: &[(usize, usize)]) -> HashSet<Hit> {
    pairs
        .iter()
        .map(|&(text_id, position)| Hit { text_id, position })
        .collect()
}

#[test]
fn basic_search() {
    let index = create_index();
    let index_u32_block512 = create_index_u32_block512();
    let query = dna(b"GG");

    let results: HashSet<_> = index.locate(&query).collect();
    let results_u32_block512: HashSet<_> = index_u32_block512.locate(&query).collect();

    let expected_results = hits(&[(0, 6), (0, 7)]);

    assert_eq!(results, expected_results);
    assert_eq!(results_u32_block512, expected_results);
    assert_eq!(index.count(&query), 2);
}

#[test]
fn text_front_search() {
    let index = create_index();
    let index_u32_block512 = create_index_u32_block512();
    let query = dna(b"C");

    let results: HashSet<_> = index.locate(&query).collect();
    let results_u32_block512: HashSet<_> = index_u32_block512.locate(&query).collect();

    let expected_results = hits(&[(0, 0), (0, 1), (0, 2)]);

    assert_eq!(results, expected_results);
    assert_eq!(results_u32_block512, expected_results);
}

#[test]
fn search_no_wrapping() {
    let index = create_index();
    let index_u32_block512 = create_index_u32_block512();
    let query = dna(b"TC");

    assert_eq!(index.locate(&query).count(), 0);
    assert_eq!(index_u32_block512.locate(&query).count(), 0);
    assert_eq!(index.count(&query), 0);
}

#[test]
fn empty_query_counts_all_suffixes() {
    let index = create_index();

    // every position plus the sentinel
    assert_eq!(index.count(&[]), 13);
    assert_eq!(index.total_len(), 13);
    assert_eq!(index.cursor().query_length(), 0);
}

#[test]
fn search_multitext() {
    let texts = [dna(b"CCCAAAGGGTTT"), dna(b"ACGTACGTACGT")];

    let index = FmIndexConfig::<u32>::new()
        .suffix_array_sampling_rate(3)
        .construct(&texts)
        .unwrap();

    assert_eq!(index.num_texts(), 2);
    assert_eq!(index.text_len(1), 12);

    let results_basic_query: HashSet<_> = index.locate(&dna(b"GG")).collect();
    assert_eq!(results_basic_query, hits(&[(0, 6), (0, 7)]));

    let results_multi_query: HashSet<_> = index.locate(&dna(b"GT")).collect();
    assert_eq!(results_multi_query, hits(&[(0, 8), (1, 2), (1, 6), (1, 10)]));

    // a query must not run over the border between two texts
    assert_eq!(index.count(&dna(b"TA")), 2);
    assert_eq!(index.count(&dna(b"TTTA")), 0);
}

#[test]
fn empty_texts_are_indexed() {
    let texts = [dna(b""), dna(b"ACG"), dna(b"")];
    let index = FmIndex::<Dna4>::new(&texts).unwrap();

    assert_eq!(index.num_texts(), 3);
    assert_eq!(index.text_len(0), 0);

    let results: HashSet<_> = index.locate(&dna(b"CG")).collect();
    assert_eq!(results, hits(&[(1, 1)]));
}

#[test]
fn ascii_text() {
    let text = Ascii::encode(b"Garfield the fat cat without a hat.").unwrap();
    let index = FmIndex::<Ascii>::new(&[text]).unwrap();

    let results: HashSet<_> = index.locate(&Ascii::encode(b"at").unwrap()).collect();
    assert_eq!(results, hits(&[(0, 14), (0, 18), (0, 32)]));

    let results: Vec<_> = index.locate(&Ascii::encode(b"cat").unwrap()).collect();
    assert_eq!(results, [Hit { text_id: 0, position: 17 }]);
}

#[test]
fn cursor_navigation() {
    let texts = [dna(b"ACGTACGTACGT")];
    let index = FmIndex::<Dna4>::new(&texts).unwrap();

    let mut cursor = index.cursor();
    assert!(cursor.extend_right_seq(&dna(b"AC")));
    assert_eq!(cursor.count(), 3);

    // ACG is the only extension, there is nothing to cycle to
    assert!(cursor.extend_right_any());
    assert_eq!(cursor.path_label(&texts), Some(dna(b"ACG").as_slice()));
    assert!(!cursor.cycle_back());
    assert_eq!(cursor.last_symbol(), Some(Dna4::G));
    assert_eq!(cursor.count(), 3);

    let mut cursor = index.cursor();
    assert!(cursor.extend_right_any());

    let mut symbols = vec![cursor.last_symbol().unwrap()];
    while cursor.cycle_back() {
        symbols.push(cursor.last_symbol().unwrap());
        assert_eq!(cursor.count(), 3);
    }

    assert_eq!(symbols, dna(b"ACGT"));
}

#[test]
fn invalid_inputs() {
    let no_texts: [Vec<Dna4>; 0] = [];
    assert!(matches!(
        FmIndex::<Dna4>::new(&no_texts),
        Err(seqdex::Error::NoTexts)
    ));

    let result = FmIndexConfig::<i32>::new()
        .suffix_array_sampling_rate(0)
        .construct(&[dna(b"ACGT")]);
    assert!(matches!(result, Err(seqdex::Error::InvalidSamplingRate)));
}

#[cfg(feature = "savefile")]
#[test]
fn savefile_round_trip() {
    let index = create_index();

    let mut buffer = Vec::new();
    index.save_to_writer(&mut buffer).unwrap();

    let loaded = FmIndex::<Dna4>::load_from_reader(&mut buffer.as_slice()).unwrap();
    let query = dna(b"AAG");

    assert_eq!(
        loaded.locate(&query).collect::<HashSet<_>>(),
        index.locate(&query).collect::<HashSet<_>>()
    );

    // the stored alphabet has 4 symbols, Dna5 has 5
    let wrong_alphabet = FmIndex::<Dna5>::load_from_reader(&mut buffer.as_slice());
    assert!(matches!(
        wrong_alphabet,
        Err(seqdex::Error::InvalidAlphabetSize(4))
    ));
}

struct QuerySampler<'t, 'r> {
    texts: &'t [Vec<Dna5>],
    rng: &'r mut ChaCha8Rng,
    max_extent: usize,
}

impl<'t, 'r> Iterator for QuerySampler<'t, 'r> {
    type Item = (Hit, &'t [Dna5]);

    fn next(&mut self) -> Option<Self::Item> {
        let text_id = self.rng.random_range(0..self.texts.len());
        let text = &self.texts[text_id];

        if text.is_empty() {
            return None;
        }

        let position = self.rng.random_range(0..text.len());
        let extent_range = 1..std::cmp::min(self.max_extent, text.len() - position + 1);
        let extent = self.rng.random_range(extent_range);

        Some((
            Hit { text_id, position },
            &text[position..position + extent],
        ))
    }
}

struct RandomQueryGenerator<'r> {
    max_len: usize,
    rng: &'r mut ChaCha8Rng,
}

impl<'r> Iterator for RandomQueryGenerator<'r> {
    type Item = Vec<Dna5>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.rng.random_range(1..self.max_len);
        let query = (0..len)
            .map(|_| [Dna5::A, Dna5::C, Dna5::G, Dna5::N, Dna5::T][self.rng.random_range(0..5)])
            .collect();

        Some(query)
    }
}

fn naive_search(texts: &[Vec<Dna5>], query: &[Dna5]) -> HashSet<Hit> {
    let mut hits = HashSet::new();

    for (text_id, text) in texts.iter().enumerate() {
        for (position, window) in text.windows(query.len()).enumerate() {
            if window == query {
                hits.insert(Hit { text_id, position });
            }
        }
    }

    hits
}

fn dna5_texts() -> impl Strategy<Value = Vec<Vec<Dna5>>> {
    prop::collection::vec(
        prop::collection::vec(
            prop::sample::select(vec![Dna5::A, Dna5::C, Dna5::G, Dna5::N, Dna5::T]),
            0..1500,
        ),
        1..5,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_failure_persistence(prop::test_runner::FileFailurePersistence::WithSource("proptest-regressions")))]

    #[test]
    fn correctness_random_texts(
        texts in dna5_texts(),
        suffix_array_sampling_rate in 1usize..=64,
        num_threads in 1usize..4,
        seed in any::<u64>()
    ) {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let existing_queries: Vec<_> = QuerySampler { texts: &texts, max_extent: 200, rng: &mut rng }
            .take(20)
            .collect();
        let random_queries: Vec<_> = RandomQueryGenerator { max_len: 20, rng: &mut rng }
            .take(100)
            .collect();

        let random_queries_naive_hits: Vec<_> = random_queries.iter().map(|q| naive_search(&texts, q)).collect();

        pool.install(|| {
            let index_i32 = FmIndexConfig::<i32>::new()
                .suffix_array_sampling_rate(suffix_array_sampling_rate)
                .construct(&texts)
                .unwrap();
            let index_u32 = FmIndexConfig::<u32, CondensedTextWithRankSupport<u32, Block512>>::new()
                .suffix_array_sampling_rate(suffix_array_sampling_rate)
                .construct(&texts)
                .unwrap();
            let index_i64 = FmIndexConfig::<i64>::new()
                .suffix_array_sampling_rate(suffix_array_sampling_rate)
                .construct(&texts)
                .unwrap();

            for (hit, query) in existing_queries {
                let results_i32: HashSet<_> = index_i32.locate(query).collect();
                let results_u32: HashSet<_> = index_u32.locate(query).collect();
                let results_i64: HashSet<_> = index_i64.locate(query).collect();

                assert!(results_i32.contains(&hit));
                assert!(results_u32.contains(&hit));
                assert!(results_i64.contains(&hit));
            }

            for (query, naive_results) in random_queries.iter().zip(random_queries_naive_hits) {
                let results_i32: HashSet<_> = index_i32.locate(query).collect();
                let results_u32: HashSet<_> = index_u32.locate(query).collect();
                let results_i64: HashSet<_> = index_i64.locate(query).collect();

                assert_eq!(index_i32.count(query), naive_results.len());
                assert_eq!(results_i32, naive_results);
                assert_eq!(results_u32, naive_results);
                assert_eq!(results_i64, naive_results);
            }
        });
    }
}
