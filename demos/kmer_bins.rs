use seqdex::{
    alphabet::{AsciiSymbol, Dna4},
    ibf::{
        BinCount, BinIndex, BinSize, BinningDirectory, HashFunctionCount, InterleavedBloomFilter,
        SequenceHashing,
    },
    kmer::KmerHashes,
};

const K: usize = 5;

fn main() -> seqdex::Result<()> {
    // This example distributes the k-mers of a few sequences into the bins of an interleaved Bloom
    // filter and finds out which bins likely contain a query.

    let bins = [
        Dna4::encode(b"ACGTACGTTAGCATCGATCGATTACGATC")?,
        Dna4::encode(b"GGGGCCCCAAAATTTTGGGGCCCCAAAAT")?,
        Dna4::encode(b"TTAGCATCGATCGAGGACTTACGCGCATA")?,
    ];

    let mut ibf = InterleavedBloomFilter::new(BinCount(bins.len()), BinSize(4096), HashFunctionCount(2))?;

    for (bin, sequence) in bins.iter().enumerate() {
        for hash in KmerHashes::new(sequence, K)? {
            ibf.emplace(hash, BinIndex(bin))?;
        }
    }

    let query = Dna4::encode(b"TAGCATCGATCGA")?;
    let num_kmers = KmerHashes::new(&query, K)?.len();

    let mut agent = ibf.counting_agent::<u16>();
    let counts = agent.bulk_count(KmerHashes::new(&query, K)?);

    for (bin, &count) in counts.iter().enumerate() {
        println!("Bin {bin} contains {count} of {num_kmers} k-mers of the query.");
    }

    // Bins can be added later, the existing bins keep their contents.
    ibf.increase_bin_number_to(BinCount(bins.len() + 1))?;
    ibf.emplace(42, BinIndex(bins.len()))?;

    let mut agent = ibf.membership_agent();
    let bins_with_42: Vec<_> = agent.bulk_contains(42).ones().collect();
    println!("42 is probably in bins {bins_with_42:?}.");

    // A binning directory does the hashing itself. Minimisers need fewer bits than all k-mers.
    let mut directory = BinningDirectory::<Dna4>::new(
        BinCount(bins.len()),
        BinSize(4096),
        HashFunctionCount(2),
        SequenceHashing::minimiser(K, 8),
    )?;

    for (bin, sequence) in bins.iter().enumerate() {
        directory.emplace(sequence, BinIndex(bin))?;
    }

    let mut agent = directory.counting_agent::<u16>();
    println!("Minimiser counts per bin: {:?}", agent.bulk_count(&query));

    Ok(())
}
