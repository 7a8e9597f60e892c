use seqdex::{
    BiFmIndex,
    alphabet::{AsciiSymbol, Dna4},
    search::{ErrorBudget, ErrorRates, HitPolicy, SearchConfig},
};

fn main() -> seqdex::Result<()> {
    // This example shows error-tolerant search in the bidirectional FM-Index.

    let texts = [
        Dna4::encode(b"ACGTACGTACGT")?,
        Dna4::encode(b"GGCATTACGAGGTTAC")?,
    ];
    let index: BiFmIndex<Dna4> = BiFmIndex::new(&texts)?;

    let queries = [Dna4::encode(b"TACG")?, Dna4::encode(b"TTCG")?];

    // Up to one substitution, insertion or deletion per query.
    let mut config = SearchConfig::new();
    config.max_errors(ErrorBudget::edit(1));

    for hit in config.search(&index, &queries)? {
        for occurrence in hit.locate() {
            println!(
                "Query {} matches text {} at position {} with {} errors.",
                hit.query_id(),
                occurrence.text_id,
                occurrence.position,
                hit.errors()
            );
        }
    }

    // Only the hits with the fewest errors, allowing 25% substitutions, searched on the rayon thread pool.
    config
        .max_error_rates(ErrorRates::hamming(0.25))
        .hit_policy(HitPolicy::AllBest)
        .parallel(true);

    let best: Vec<_> = config.search(&index, &queries)?.collect();
    println!("Found {} best hits.", best.len());

    Ok(())
}
