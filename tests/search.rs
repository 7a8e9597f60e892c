use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use seqdex::{
    BiFmIndex, Error, FmIndexConfig,
    alphabet::{Ascii, AsciiSymbol, Dna4},
    search::{ErrorBudget, ErrorRates, HitPolicy, SearchConfig},
};
use std::collections::BTreeSet;

fn dna(text: &[u8]) -> Vec<Dna4> {
    Dna4::encode(text).unwrap()
}

fn create_index() -> BiFmIndex<Dna4> {
    BiFmIndex::new(&[dna(b"ACGTACGTACGT")]).unwrap()
}

fn positions<S: seqdex::Symbol>(
    config: &SearchConfig,
    index: &BiFmIndex<S>,
    query: &[S],
) -> BTreeSet<usize> {
    config
        .search(index, &[query])
        .unwrap()
        .flat_map(|hit| hit.locate())
        .map(|hit| hit.position)
        .collect()
}

fn with_budget(budget: ErrorBudget) -> SearchConfig {
    *SearchConfig::new().max_errors(budget)
}

fn with_rates(rates: ErrorRates) -> SearchConfig {
    *SearchConfig::new().max_error_rates(rates)
}

fn set(positions: &[usize]) -> BTreeSet<usize> {
    positions.iter().copied().collect()
}

fn levenshtein<S: PartialEq>(a: &[S], b: &[S]) -> usize {
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, x) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;

        for (j, y) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(x != y);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(row[j + 1] + 1);
        }
    }

    row[b.len()]
}

// edit distance where no text symbol is skipped before the first or after the last query symbol
fn edit_distance_without_end_deletions<S: PartialEq>(query: &[S], substring: &[S]) -> usize {
    const UNREACHABLE: usize = usize::MAX / 2;

    let mut previous: Vec<usize> = std::iter::once(0)
        .chain(std::iter::repeat_n(UNREACHABLE, substring.len()))
        .collect();

    for (i, x) in query.iter().enumerate() {
        let mut row = vec![i + 1; substring.len() + 1];
        let deletions_allowed = i + 1 < query.len();

        for (j, y) in substring.iter().enumerate() {
            let mut cost = (previous[j] + usize::from(x != y)).min(previous[j + 1] + 1);

            if deletions_allowed {
                cost = cost.min(row[j] + 1);
            }

            row[j + 1] = cost;
        }

        previous = row;
    }

    previous[substring.len()]
}

fn random_dna(rng: &mut ChaCha8Rng, len: usize) -> Vec<Dna4> {
    let alphabet = [Dna4::A, Dna4::C, Dna4::G, Dna4::T];
    (0..len).map(|_| alphabet[rng.random_range(0..4)]).collect()
}

#[test]
fn exact_search() {
    let index = create_index();
    let config = SearchConfig::new();

    assert_eq!(positions(&config, &index, &dna(b"ACGT")), set(&[0, 4, 8]));
    assert_eq!(positions(&config, &index, &dna(b"GTAC")), set(&[2, 6]));
    assert!(positions(&config, &index, &dna(b"ACGG")).is_empty());
}

#[test]
fn substitution_rates() {
    let index = create_index();
    let config = with_rates(ErrorRates {
        total: Some(0.25),
        substitution: Some(0.25),
        ..ErrorRates::default()
    });

    assert_eq!(positions(&config, &index, &dna(b"CGTC")), set(&[1, 5]));
    assert_eq!(positions(&config, &index, &dna(b"ACGGACG")), set(&[0, 4]));
    assert_eq!(positions(&config, &index, &dna(b"ACGGACGG")), set(&[0, 4]));
}

#[test]
fn substitution_counts() {
    let index = create_index();
    let config = with_budget(ErrorBudget {
        total: Some(1),
        substitution: Some(1),
        ..ErrorBudget::default()
    });

    assert_eq!(positions(&config, &index, &dna(b"CGG")), set(&[1, 5, 9]));
    assert_eq!(positions(&config, &index, &dna(b"CGTCCGTA")), set(&[1]));
    assert!(positions(&config, &index, &dna(b"CGTTT")).is_empty());
}

#[test]
fn insertion_rates() {
    let index = create_index();
    let config = with_rates(ErrorRates {
        total: Some(0.25),
        insertion: Some(0.25),
        ..ErrorRates::default()
    });

    assert_eq!(
        positions(&config, &index, &dna(b"ACGT")),
        set(&[0, 1, 4, 5, 8, 9])
    );
    assert_eq!(positions(&config, &index, &dna(b"CCGT")), set(&[1, 5, 9]));
    assert_eq!(positions(&config, &index, &dna(b"ACCGGTAC")), set(&[0, 4]));
}

#[test]
fn deletion_rates() {
    let index = create_index();
    let config = with_rates(ErrorRates {
        total: Some(0.25),
        deletion: Some(0.25),
        ..ErrorRates::default()
    });

    assert_eq!(positions(&config, &index, &dna(b"AGTA")), set(&[0, 4]));
    assert_eq!(positions(&config, &index, &dna(b"AGTAGTAC")), set(&[0]));
    assert_eq!(positions(&config, &index, &dna(b"CGTACGT")), set(&[1, 5]));

    // 0.25 * 3 is rounded up to one deletion
    assert_eq!(positions(&config, &index, &dna(b"AGT")), set(&[0, 4, 8]));

    let config = with_budget(ErrorBudget {
        total: Some(1),
        deletion: Some(1),
        ..ErrorBudget::default()
    });
    assert_eq!(positions(&config, &index, &dna(b"CGAC")), set(&[1, 5]));

    // a deletion can only be placed between two query symbols, ATGT at 1 is not reported
    let index = BiFmIndex::<Dna4>::new(&[dna(b"AATGTAA")]).unwrap();
    assert_eq!(positions(&config, &index, &dna(b"TGT")), set(&[2]));
}

#[test]
fn edit_distance() {
    let index = create_index();

    assert_eq!(
        positions(&with_budget(ErrorBudget::edit(1)), &index, &dna(b"CCGT")),
        set(&[0, 1, 4, 5, 8, 9])
    );
    assert_eq!(
        positions(&with_budget(ErrorBudget::edit(2)), &index, &dna(b"CCGT")),
        (0..=10).collect()
    );

    let indels_only = with_budget(ErrorBudget {
        total: Some(2),
        insertion: Some(2),
        deletion: Some(2),
        ..ErrorBudget::default()
    });
    assert_eq!(positions(&indels_only, &index, &dna(b"GTACCTAC")), set(&[2]));
}

#[test]
fn hits_report_their_errors() {
    let texts = [dna(b"ACGTACGTACGT")];
    let index = BiFmIndex::<Dna4>::new(&texts).unwrap();
    let queries = [dna(b"CCGT"), dna(b"GTACCTAC"), dna(b"AAAA")];

    let hits: Vec<_> = with_budget(ErrorBudget::edit(2))
        .search(&index, &queries)
        .unwrap()
        .collect();

    assert!(!hits.is_empty());

    for hit in &hits {
        let query = &queries[hit.query_id()];
        let label = hit.cursor().path_label(&texts).unwrap();

        assert!(hit.errors() <= 2);
        assert!(levenshtein(query, label) <= hit.errors() as usize);
        assert_eq!(hit.count(), hit.locate().count());
    }

    // ordered by query id
    assert!(hits.windows(2).all(|w| w[0].query_id() <= w[1].query_id()));
}

#[test]
fn all_best_hits() {
    let index = create_index();
    let mut config = with_budget(ErrorBudget::edit(1));
    config.hit_policy(HitPolicy::AllBest);

    assert_eq!(positions(&config, &index, &dna(b"ACGT")), set(&[0, 4, 8]));
    assert!(positions(&config, &index, &dna(b"AAAA")).is_empty());

    let queries = [dna(b"ACGT")];
    let errors: BTreeSet<_> = config
        .search(&index, &queries)
        .unwrap()
        .map(|hit| hit.errors())
        .collect();
    assert_eq!(errors, BTreeSet::from([0]));

    // the best hits of CCGT have one error
    let queries = [dna(b"CCGT")];
    let errors: BTreeSet<_> = config
        .search(&index, &queries)
        .unwrap()
        .map(|hit| hit.errors())
        .collect();
    assert_eq!(errors, BTreeSet::from([1]));
}

#[test]
fn single_best_hit() {
    let index = create_index();
    let mut config = with_budget(ErrorBudget::edit(1));
    config.hit_policy(HitPolicy::SingleBest);

    let queries = [dna(b"ACGT")];
    let hits: Vec<_> = config.search(&index, &queries).unwrap().collect();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].errors(), 0);
    assert_eq!(hits[0].count(), 1);

    let located: Vec<_> = hits[0].locate().collect();
    assert_eq!(located.len(), 1);
    assert!([0, 4, 8].contains(&located[0].position));

    let queries = [dna(b"AAAA")];
    assert_eq!(config.search(&index, &queries).unwrap().count(), 0);
}

#[test]
fn strata() {
    let index = create_index();

    let mut config = with_budget(ErrorBudget::edit(1));
    config.hit_policy(HitPolicy::Strata(0));
    assert_eq!(positions(&config, &index, &dna(b"ACGT")), set(&[0, 4, 8]));

    config.hit_policy(HitPolicy::Strata(1));
    assert_eq!(
        positions(&config, &index, &dna(b"ACGT")),
        set(&[0, 1, 4, 5, 8, 9])
    );

    // the stratum is capped at the budget
    config.hit_policy(HitPolicy::Strata(5));
    assert_eq!(
        positions(&config, &index, &dna(b"ACGT")),
        positions(&with_budget(ErrorBudget::edit(1)), &index, &dna(b"ACGT"))
    );
}

#[test]
fn ascii_text() {
    let text = Ascii::encode(b"Garfield the fat cat without a hat.").unwrap();
    let index = BiFmIndex::<Ascii>::new(&[text]).unwrap();
    let config = SearchConfig::new();

    assert_eq!(
        positions(&config, &index, &Ascii::encode(b"cat").unwrap()),
        set(&[17])
    );
    assert_eq!(
        positions(&config, &index, &Ascii::encode(b"at").unwrap()),
        set(&[14, 18, 32])
    );
}

#[test]
fn multiple_texts() {
    let texts = [dna(b"AAAACGTAAA"), dna(b"TTTTCGTTTT")];
    let index = BiFmIndex::<Dna4>::new(&texts).unwrap();
    let queries = [dna(b"ACGT")];

    let hits: BTreeSet<_> = with_budget(ErrorBudget::hamming(1))
        .search(&index, &queries)
        .unwrap()
        .flat_map(|hit| hit.locate())
        .map(|hit| (hit.text_id, hit.position))
        .collect();

    assert_eq!(hits, BTreeSet::from([(0, 3), (1, 3)]));
}

#[test]
fn empty_query_has_no_hits() {
    let index = create_index();
    let queries = [dna(b"")];

    let config = with_budget(ErrorBudget::edit(2));
    assert_eq!(config.search(&index, &queries).unwrap().count(), 0);
}

#[test]
fn hamming_against_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let alphabet = [Dna4::A, Dna4::C, Dna4::G, Dna4::T];

    let text: Vec<_> = (0..3000).map(|_| alphabet[rng.random_range(0..4)]).collect();
    let index = FmIndexConfig::<i32>::new()
        .suffix_array_sampling_rate(5)
        .construct_bidirectional(&[&text])
        .unwrap();

    let queries: Vec<Vec<Dna4>> = (0..20)
        .map(|_| {
            let start = rng.random_range(0..text.len() - 90);
            let mut query = text[start..start + 90].to_vec();

            for _ in 0..rng.random_range(0..=3) {
                let position = rng.random_range(0..90);
                query[position] = alphabet[rng.random_range(0..4)];
            }

            query
        })
        .collect();

    for max_errors in 0..=3 {
        let config = with_budget(ErrorBudget::hamming(max_errors));

        for query in &queries {
            let expected: BTreeSet<_> = text
                .windows(query.len())
                .enumerate()
                .filter(|(_, window)| {
                    window.iter().zip(query).filter(|(a, b)| a != b).count() <= max_errors as usize
                })
                .map(|(position, _)| position)
                .collect();

            assert_eq!(positions(&config, &index, query), expected, "max errors: {max_errors}");
        }
    }
}

#[test]
fn short_queries_on_short_text() {
    let mut rng = ChaCha8Rng::seed_from_u64(90);
    let text = random_dna(&mut rng, 90);
    let index = BiFmIndex::<Dna4>::new(&[&text]).unwrap();

    let config = with_budget(ErrorBudget::hamming(1));
    let mut all_best = with_budget(ErrorBudget::hamming(1));
    all_best.hit_policy(HitPolicy::AllBest);

    let alphabet = [Dna4::A, Dna4::C, Dna4::G, Dna4::T];

    for code in 0..64 {
        let query = [alphabet[code >> 4], alphabet[(code >> 2) & 3], alphabet[code & 3]];
        let mismatches = |window: &[Dna4]| window.iter().zip(&query).filter(|(a, b)| a != b).count();

        let expected: BTreeSet<_> = text
            .windows(3)
            .enumerate()
            .filter(|&(_, window)| mismatches(window) <= 1)
            .map(|(position, _)| position)
            .collect();

        assert_eq!(positions(&config, &index, &query), expected, "query {code}");

        let best = text.windows(3).map(mismatches).min().filter(|&m| m <= 1);
        let expected_best: BTreeSet<_> = text
            .windows(3)
            .enumerate()
            .filter(|&(_, window)| Some(mismatches(window)) == best)
            .map(|(position, _)| position)
            .collect();

        assert_eq!(positions(&all_best, &index, &query), expected_best, "query {code}");
    }
}

#[test]
fn edit_against_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xed17);
    let alphabet = [Dna4::A, Dna4::C, Dna4::G, Dna4::T];

    for _ in 0..30 {
        let text_len = rng.random_range(20..60);
        let text = random_dna(&mut rng, text_len);
        let index = BiFmIndex::<Dna4>::new(&[&text]).unwrap();

        // substrings of the text with a few random edits, plus fully random queries
        let queries: Vec<Vec<Dna4>> = (0..6)
            .map(|i| {
                let len = rng.random_range(3..11);

                if i % 3 == 2 {
                    return random_dna(&mut rng, len);
                }

                let start = rng.random_range(0..text.len() - len);
                let mut query = text[start..start + len].to_vec();

                for _ in 0..rng.random_range(0..=2) {
                    let position = rng.random_range(0..query.len());
                    match rng.random_range(0..3) {
                        0 => query[position] = alphabet[rng.random_range(0..4)],
                        1 => query.insert(position, alphabet[rng.random_range(0..4)]),
                        _ if query.len() > 1 => {
                            query.remove(position);
                        }
                        _ => {}
                    }
                }

                query
            })
            .collect();

        for max_errors in 0..=3u8 {
            let config = with_budget(ErrorBudget::edit(max_errors));

            for query in &queries {
                // every deletion makes the match one symbol longer than the query
                let max_len = query.len() + max_errors as usize;
                let expected: BTreeSet<(usize, usize)> = (0..text.len())
                    .flat_map(|start| (1..=max_len.min(text.len() - start)).map(move |len| (start, len)))
                    .filter(|&(start, len)| {
                        edit_distance_without_end_deletions(query, &text[start..start + len])
                            <= max_errors as usize
                    })
                    .collect();

                let mut found = BTreeSet::new();

                for hit in config.search(&index, &[query]).unwrap() {
                    let len = hit.cursor().query_length();
                    assert!(hit.errors() <= max_errors);

                    for located in hit.locate() {
                        let substring = &text[located.position..located.position + len];
                        assert!(
                            edit_distance_without_end_deletions(query, substring) <= hit.errors() as usize
                        );
                        found.insert((located.position, len));
                    }
                }

                assert_eq!(found, expected, "query {query:?}, max errors {max_errors}");
            }
        }
    }
}

#[test]
fn more_errors_find_more_hits() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let alphabet = [Dna4::A, Dna4::C, Dna4::G, Dna4::T];

    let text: Vec<_> = (0..500).map(|_| alphabet[rng.random_range(0..4)]).collect();
    let index = BiFmIndex::<Dna4>::new(&[&text]).unwrap();

    for _ in 0..20 {
        let len = rng.random_range(4..12);
        let query: Vec<_> = (0..len).map(|_| alphabet[rng.random_range(0..4)]).collect();

        let exact = positions(&SearchConfig::new(), &index, &query);
        let hamming = positions(&with_budget(ErrorBudget::hamming(1)), &index, &query);
        let edit = positions(&with_budget(ErrorBudget::edit(1)), &index, &query);
        let edit2 = positions(&with_budget(ErrorBudget::edit(2)), &index, &query);

        assert!(exact.is_subset(&hamming));
        assert!(hamming.is_subset(&edit));
        assert!(edit.is_subset(&edit2));
    }
}

#[test]
fn parallel_search_keeps_query_order() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let alphabet = [Dna4::A, Dna4::C, Dna4::G, Dna4::T];

    let text: Vec<_> = (0..2000).map(|_| alphabet[rng.random_range(0..4)]).collect();
    let index = BiFmIndex::<Dna4>::new(&[&text]).unwrap();

    let queries: Vec<Vec<_>> = (0..200)
        .map(|_| {
            let start = rng.random_range(0..text.len() - 15);
            text[start..start + 15].to_vec()
        })
        .collect();

    let summarize = |parallel: bool| -> Vec<(usize, u8, BTreeSet<usize>)> {
        let mut config = with_budget(ErrorBudget::edit(1));
        config.parallel(parallel);

        config
            .search(&index, &queries)
            .unwrap()
            .map(|hit| {
                let positions = hit.locate().map(|h| h.position).collect();
                (hit.query_id(), hit.errors(), positions)
            })
            .collect()
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(3)
        .build()
        .unwrap();

    let parallel = pool.install(|| summarize(true));
    let sequential = summarize(false);

    assert_eq!(parallel, sequential);
    assert!(parallel.windows(2).all(|w| w[0].0 <= w[1].0));
}

#[test]
fn invalid_configurations() {
    let index = create_index();
    let queries = [dna(b"ACGT")];

    let config = with_budget(ErrorBudget {
        total: Some(1),
        deletion: Some(2),
        ..ErrorBudget::default()
    });
    assert!(matches!(
        config.search(&index, &queries),
        Err(Error::ErrorBudgetExceedsTotal {
            kind: "deletion",
            ..
        })
    ));

    let config = with_rates(ErrorRates::edit(-0.1));
    assert!(matches!(
        config.search(&index, &queries),
        Err(Error::InvalidErrorRate { .. })
    ));

    let config = with_rates(ErrorRates {
        total: Some(0.1),
        substitution: Some(0.5),
        ..ErrorRates::default()
    });
    assert!(matches!(
        config.search(&index, &queries),
        Err(Error::ErrorRateExceedsTotal {
            kind: "substitution",
            ..
        })
    ));
}
