use seqdex::{
    FmIndexConfig,
    alphabet::{AsciiSymbol, Dna5},
};

fn main() -> seqdex::Result<()> {
    // This example shows how to use the FM-Index in a basic way.

    let texts = [Dna5::encode(b"aACGT")?, Dna5::encode(b"acGtn")?];

    let index = FmIndexConfig::<i32>::new()
        .suffix_array_sampling_rate(2)
        .construct(&texts)?;

    let query = Dna5::encode(b"GT")?;
    assert_eq!(index.count(&query), 2);

    for hit in index.locate(&query) {
        println!(
            "Found query in text {} at position {}.",
            hit.text_id, hit.position
        );
    }

    // The cursor maintains a currently searched query, which can be extended symbol by symbol.
    let mut cursor = index.cursor_for_query(&Dna5::encode(b"C")?);
    cursor.extend_right(Dna5::G);

    // All symbols that can follow CG in the texts are enumerated in alphabet order.
    if cursor.extend_right_any() {
        loop {
            if let Some(symbol) = cursor.last_symbol() {
                println!("CG{} occurs {} times.", symbol.to_ascii() as char, cursor.count());
            }

            if !cursor.cycle_back() {
                break;
            }
        }
    }

    Ok(())
}
