//! Deck texts used across the integration tests.

/// Tab-separated deck with a tag column and named fields.
pub const VOCAB: &str = "#separator:tab\n\
#html:true\n\
#tags column:3\n\
#columns:Front\tBack\tTags\n\
#deck:Spanish\n\
hola\thello\tgreeting common\n\
adiós\tgoodbye\tgreeting\n\
gato\t<img src=\"cat.png\"> cat\tanimal\n";

/// Second deck with the same layout as [`VOCAB`].
pub const MORE_VOCAB: &str = "#separator:tab\n\
#html:true\n\
#tags column:3\n\
#deck:Spanish\n\
perro\tdog [sound:perro.mp3]\tanimal\n";

/// Comma-separated deck without a tag column.
pub const PLAIN_CSV: &str = "#separator:comma\nq1,a1\nq2,a2\n";

/// Deck whose third record has the wrong column count.
pub const RAGGED: &str = "#separator:tab\nq1\ta1\nbroken\nq3\ta3\n";

/// Generate a deck with `num_cards` cards, each tagged `bulk`.
pub fn generated_deck(num_cards: usize) -> String {
    let body: String = (1..=num_cards)
        .map(|i| format!("Question {i}?\tAnswer {i}.\tbulk\n"))
        .collect();
    format!("#separator:tab\n#tags column:3\n{body}")
}
