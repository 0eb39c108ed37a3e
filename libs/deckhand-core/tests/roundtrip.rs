//! Serialize/parse laws over generated decks.

use deckhand_core::{
    parse_str, serialize_to_string, Card, Deck, EscapeTable, ExportHeader,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const DELIMITERS: [char; 6] = ['\t', ',', ';', '|', ' ', ':'];

fn delimiter() -> impl Strategy<Value = char> {
    prop::sample::select(DELIMITERS.to_vec())
}

fn field_text() -> impl Strategy<Value = String> {
    r#"[a-zA-Z0-9#\\\t\n\r ,;:|<>"'é]{0,12}"#
}

fn tags(tagged: bool) -> BoxedStrategy<Vec<String>> {
    if tagged {
        prop::collection::btree_set("[a-z#:]{1,6}", 0..4)
            .prop_map(|set| set.into_iter().collect())
            .boxed()
    } else {
        Just(Vec::new()).boxed()
    }
}

fn card(field_count: usize, tagged: bool) -> impl Strategy<Value = Card> {
    (prop::collection::vec(field_text(), field_count), tags(tagged))
        .prop_map(|(fields, tags)| Card::new(fields).with_tags(tags))
}

fn deck() -> impl Strategy<Value = Deck> {
    (delimiter(), 1usize..=4, any::<bool>(), any::<bool>())
        .prop_flat_map(|(delimiter, field_count, tagged, html)| {
            let tag_column = if tagged {
                (0..=field_count).prop_map(Some).boxed()
            } else {
                Just(None).boxed()
            };
            (
                Just(delimiter),
                Just(field_count),
                tag_column,
                Just(html),
                prop::collection::vec(card(field_count, tagged), 1..=6),
            )
        })
        .prop_map(|(delimiter, field_count, tag_column, html, cards)| {
            let mut header = ExportHeader::new(delimiter, field_count)
                .unwrap()
                .with_html(html);
            if let Some(index) = tag_column {
                header = header.with_tag_column(index).unwrap();
            }
            let mut deck = Deck::new(header);
            for card in cards {
                deck.push_card(card).unwrap();
            }
            deck
        })
}

proptest! {
    #[test]
    fn serialized_deck_parses_back(deck in deck()) {
        let text = serialize_to_string(&deck).unwrap();
        let parsed = parse_str(&text).unwrap();
        prop_assert_eq!(parsed, deck);
    }

    #[test]
    fn serialization_is_stable(deck in deck()) {
        let once = serialize_to_string(&deck).unwrap();
        let twice = serialize_to_string(&parse_str(&once).unwrap()).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn escape_inverts(delimiter in delimiter(), raw in field_text()) {
        let table = EscapeTable::new(delimiter);
        let encoded = table.encode_leading(&raw).unwrap();
        prop_assert!(!encoded.as_str().contains(['\n', '\r']));
        prop_assert!(!encoded.as_str().starts_with('#'));
        prop_assert_eq!(table.decode(encoded.as_str()).unwrap(), raw);
    }
}

#[test]
fn empty_deck_keeps_field_count() {
    let header = ExportHeader::new('|', 3).unwrap().with_tag_column(0).unwrap();
    let deck = Deck::new(header);
    let parsed = parse_str(&serialize_to_string(&deck).unwrap()).unwrap();
    assert!(parsed.is_empty());
    assert_eq!(parsed.header().field_count(), 3);
    assert_eq!(parsed.header().tag_column_index(), Some(0));
}

#[test]
fn edits_survive_a_round_trip() {
    let text = "#separator:tab\n#html:true\n#tags column:3\n#deck:Spanish\nhola\thello\tgreeting\nadiós\tbye\t\n";
    let mut deck = parse_str(text).unwrap();
    deck.edit_card(1, |card| card.add_tag("farewell")).unwrap();
    deck.push_card(Card::new(["#uno", "one\tthing"]).with_tags(["number"]))
        .unwrap();

    let out = serialize_to_string(&deck).unwrap();
    assert_eq!(
        out,
        "#separator:tab\n#html:true\n#tags column:3\n#deck:Spanish\n\
         hola\thello\tgreeting\nadiós\tbye\tfarewell\n\\#uno\tone\\tthing\tnumber\n"
    );
    assert_eq!(parse_str(&out).unwrap(), deck);
    assert_eq!(deck.header().deck(), Some("Spanish"));
}

#[test]
fn deck_serializes_to_json() {
    let deck = parse_str("#separator:comma\n#tags column:2\nq,t1 t2\n").unwrap();
    let value = serde_json::to_value(&deck).unwrap();
    assert_eq!(value["header"]["field_delimiter"], ",");
    assert_eq!(value["header"]["field_count"], 1);
    assert_eq!(value["cards"][0]["tags"], serde_json::json!(["t1", "t2"]));
    assert_eq!(
        value["header"]["directives"][1],
        serde_json::json!({ "kind": "tags_column", "value": 2 })
    );
}
