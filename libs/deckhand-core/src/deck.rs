//! The editable deck document.
//!
//! A `Deck` is plain owned data with no internal locking. Edits are
//! synchronous and validated before they land, so the card list always
//! satisfies the header: every card has `field_count` fields, and tags only
//! exist when the header has a tag column.

use serde::Serialize;

use crate::error::{EditError, Invariant};
use crate::header::ExportHeader;
use crate::media;
use crate::types::{is_valid_tag, Card};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deck {
    header: ExportHeader,
    cards: Vec<Card>,
}

impl Deck {
    /// Empty deck with the given header.
    pub fn new(header: ExportHeader) -> Self {
        Self {
            header,
            cards: Vec::new(),
        }
    }

    /// Assemble a deck from cards the builder already validated.
    pub(crate) fn from_parts(header: ExportHeader, cards: Vec<Card>) -> Self {
        Self { header, cards }
    }

    pub fn header(&self) -> &ExportHeader {
        &self.header
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    fn out_of_range(&self, index: usize) -> EditError {
        EditError::IndexOutOfRange {
            index,
            len: self.cards.len(),
        }
    }

    pub fn card_at(&self, index: usize) -> Result<&Card, EditError> {
        self.cards.get(index).ok_or_else(|| self.out_of_range(index))
    }

    /// Check that `card` could be stored in this deck.
    pub fn validate(&self, card: &Card) -> Result<(), EditError> {
        let expected = self.header.field_count();
        if card.fields.len() != expected {
            return Err(Invariant::FieldCount {
                expected,
                found: card.fields.len(),
            }
            .into());
        }
        if self.header.tag_column_index().is_none() && !card.tags.is_empty() {
            return Err(Invariant::TagsWithoutColumn.into());
        }
        for (i, tag) in card.tags.iter().enumerate() {
            if !is_valid_tag(tag) {
                return Err(Invariant::InvalidTag { tag: tag.clone() }.into());
            }
            if card.tags[..i].contains(tag) {
                return Err(Invariant::DuplicateTag { tag: tag.clone() }.into());
            }
        }
        Ok(())
    }

    /// Swap in `card` at `index`, returning the card it replaced.
    pub fn replace_card(&mut self, index: usize, card: Card) -> Result<Card, EditError> {
        if index >= self.cards.len() {
            return Err(self.out_of_range(index));
        }
        self.validate(&card)?;
        Ok(std::mem::replace(&mut self.cards[index], card))
    }

    /// Insert before `index`; `index == len` appends.
    pub fn insert_card(&mut self, index: usize, card: Card) -> Result<(), EditError> {
        if index > self.cards.len() {
            return Err(self.out_of_range(index));
        }
        self.validate(&card)?;
        self.cards.insert(index, card);
        Ok(())
    }

    pub fn push_card(&mut self, card: Card) -> Result<(), EditError> {
        self.insert_card(self.cards.len(), card)
    }

    pub fn remove_card(&mut self, index: usize) -> Result<Card, EditError> {
        if index >= self.cards.len() {
            return Err(self.out_of_range(index));
        }
        Ok(self.cards.remove(index))
    }

    /// Move the card at `from` so it ends up at position `to`.
    pub fn move_card(&mut self, from: usize, to: usize) -> Result<(), EditError> {
        if from >= self.cards.len() {
            return Err(self.out_of_range(from));
        }
        if to >= self.cards.len() {
            return Err(self.out_of_range(to));
        }
        let card = self.cards.remove(from);
        self.cards.insert(to, card);
        Ok(())
    }

    /// Apply `edit` to a copy of the card at `index` and commit it only if
    /// the edit succeeds and the result is valid.
    pub fn edit_card<T, E, F>(&mut self, index: usize, edit: F) -> Result<T, E>
    where
        F: FnOnce(&mut Card) -> Result<T, E>,
        E: From<EditError>,
    {
        let mut draft = self.card_at(index)?.clone();
        let value = edit(&mut draft)?;
        self.validate(&draft)?;
        self.cards[index] = draft;
        Ok(value)
    }

    /// Keep the cards matching `keep`. Returns how many were removed.
    pub fn retain_cards<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Card) -> bool,
    {
        let before = self.cards.len();
        self.cards.retain(|card| keep(card));
        before - self.cards.len()
    }

    /// Append every card of `other`. Both decks must read their records
    /// the same way; this deck's header is kept.
    pub fn append(&mut self, other: Deck) -> Result<usize, EditError> {
        if let Some(reason) = incompatibility(&self.header, &other.header) {
            return Err(Invariant::IncompatibleDeck { reason }.into());
        }

        let added = other.cards.len();
        self.cards.extend(other.cards);
        Ok(added)
    }

    pub fn set_html_enabled(&mut self, enabled: bool) {
        self.header.set_html_enabled(enabled);
    }

    /// Set a directive the parser does not interpret. It replaces an
    /// existing directive with the same key or is appended after the others.
    pub fn set_passthrough(&mut self, key: &str, value: &str) -> Result<(), EditError> {
        if self.header.set_passthrough(key, value) {
            Ok(())
        } else {
            Err(Invariant::ReservedDirective {
                key: key.to_string(),
            }
            .into())
        }
    }

    /// Index of the field called `name`, see [`ExportHeader::field_names`].
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.header.field_names().iter().position(|n| n == name)
    }

    pub fn note_type<'c>(&self, card: &'c Card) -> Option<&'c str> {
        card.field(self.header.notetype_field()?)
    }

    pub fn deck_name<'c>(&self, card: &'c Card) -> Option<&'c str> {
        card.field(self.header.deck_field()?)
    }

    pub fn guid<'c>(&self, card: &'c Card) -> Option<&'c str> {
        card.field(self.header.guid_field()?)
    }

    /// Distinct media files referenced by any field, first-seen order.
    pub fn media_references(&self) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for field in self.cards.iter().flat_map(|c| c.fields.iter()) {
            for reference in media::references(field) {
                if !files.contains(&reference.file) {
                    files.push(reference.file);
                }
            }
        }
        files
    }
}

impl<'a> IntoIterator for &'a Deck {
    type Item = &'a Card;
    type IntoIter = std::slice::Iter<'a, Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}

/// Why cards of `theirs` would change meaning under `ours`, if they would.
fn incompatibility(ours: &ExportHeader, theirs: &ExportHeader) -> Option<String> {
    if ours.field_delimiter() != theirs.field_delimiter() {
        return Some(format!(
            "separator {:?} differs from {:?}",
            theirs.field_delimiter(),
            ours.field_delimiter()
        ));
    }
    if ours.field_count() != theirs.field_count() {
        return Some(format!(
            "{} fields differ from {}",
            theirs.field_count(),
            ours.field_count()
        ));
    }
    if ours.tag_column_index() != theirs.tag_column_index() {
        return Some("tag columns differ".to_string());
    }

    let columns = [
        ("notetype", ours.notetype_field(), theirs.notetype_field()),
        ("deck", ours.deck_field(), theirs.deck_field()),
        ("guid", ours.guid_field(), theirs.guid_field()),
    ];
    if let Some((name, _, _)) = columns.iter().find(|(_, a, b)| a != b) {
        return Some(format!("{name} columns differ"));
    }

    if ours.html_enabled() != theirs.html_enabled() {
        return Some("html flags differ".to_string());
    }
    if ours.notetype() != theirs.notetype() {
        return Some(format!(
            "notetype {:?} differs from {:?}",
            theirs.notetype(),
            ours.notetype()
        ));
    }
    if ours.deck() != theirs.deck() {
        return Some(format!("deck {:?} differs from {:?}", theirs.deck(), ours.deck()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn deck() -> Deck {
        let header = ExportHeader::new('\t', 2).unwrap().with_tag_column(2).unwrap();
        let mut deck = Deck::new(header);
        deck.push_card(Card::new(["q1", "a1"]).with_tags(["t1"])).unwrap();
        deck.push_card(Card::new(["q2", "a2"])).unwrap();
        deck.push_card(Card::new(["q3", "a3"]).with_tags(["t1", "t3"])).unwrap();
        deck
    }

    fn fronts(deck: &Deck) -> Vec<&str> {
        deck.iter().map(|c| c.fields[0].as_str()).collect()
    }

    #[test]
    fn card_at_bounds() {
        let deck = deck();
        assert_eq!(deck.card_at(1).unwrap().fields[0], "q2");
        assert_eq!(
            deck.card_at(3),
            Err(EditError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn replace_validates_field_count() {
        let mut deck = deck();
        let before = deck.clone();
        let err = deck.replace_card(0, Card::new(["only one"])).unwrap_err();
        assert_eq!(
            err,
            EditError::InvariantViolation(Invariant::FieldCount {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(deck, before);

        let old = deck.replace_card(0, Card::new(["new", "card"])).unwrap();
        assert_eq!(old.fields, vec!["q1", "a1"]);
        assert_eq!(fronts(&deck), vec!["new", "q2", "q3"]);
    }

    #[test]
    fn insert_validates_field_count() {
        let mut deck = deck();
        let err = deck.insert_card(0, Card::new(["a", "b", "c"])).unwrap_err();
        assert!(matches!(
            err,
            EditError::InvariantViolation(Invariant::FieldCount { found: 3, .. })
        ));
        assert_eq!(deck.len(), 3);

        deck.insert_card(3, Card::new(["end", "x"])).unwrap();
        deck.insert_card(0, Card::new(["start", "x"])).unwrap();
        assert_eq!(fronts(&deck), vec!["start", "q1", "q2", "q3", "end"]);
        assert!(deck.insert_card(9, Card::new(["a", "b"])).is_err());
    }

    #[test]
    fn remove_and_move() {
        let mut deck = deck();
        let removed = deck.remove_card(0).unwrap();
        assert_eq!(removed.fields[0], "q1");
        assert!(deck.remove_card(5).is_err());

        deck.move_card(1, 0).unwrap();
        assert_eq!(fronts(&deck), vec!["q3", "q2"]);
        assert!(deck.move_card(0, 2).is_err());
    }

    #[test]
    fn tags_require_tag_column() {
        let mut deck = Deck::new(ExportHeader::new('\t', 1).unwrap());
        let err = deck.push_card(Card::new(["x"]).with_tags(["t"])).unwrap_err();
        assert_eq!(err, EditError::InvariantViolation(Invariant::TagsWithoutColumn));
    }

    #[test]
    fn invalid_tags_rejected() {
        let mut deck = deck();
        let err = deck
            .push_card(Card::new(["a", "b"]).with_tags(["two words"]))
            .unwrap_err();
        assert!(matches!(
            err,
            EditError::InvariantViolation(Invariant::InvalidTag { .. })
        ));
    }

    #[test]
    fn duplicate_tags_rejected() {
        let mut deck = deck();
        let err = deck
            .push_card(Card::new(["a", "b"]).with_tags(["x", "y", "x"]))
            .unwrap_err();
        assert_eq!(
            err,
            EditError::InvariantViolation(Invariant::DuplicateTag {
                tag: "x".to_string()
            })
        );
    }

    #[test]
    fn edit_card_is_atomic() {
        let mut deck = deck();
        let before = deck.clone();

        let result: Result<(), EditError> = deck.edit_card(0, |card| {
            card.set_field(0, "changed")?;
            card.fields.push("extra".to_string());
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(deck, before);

        let result: Result<(), EditError> = deck.edit_card(0, |card| {
            card.set_field(0, "changed")?;
            card.set_field(7, "boom")?;
            Ok(())
        });
        assert!(matches!(result, Err(EditError::IndexOutOfRange { index: 7, .. })));
        assert_eq!(deck, before);

        let renamed: bool = deck
            .edit_card(2, |card| card.rename_tag("t1", "t2"))
            .unwrap();
        assert!(renamed);
        assert_eq!(deck.card_at(2).unwrap().tags, vec!["t2", "t3"]);
    }

    #[test]
    fn retain_reports_removed() {
        let mut deck = deck();
        assert_eq!(deck.retain_cards(|c| !c.has_tag("t1")), 2);
        assert_eq!(fronts(&deck), vec!["q2"]);
    }

    #[test]
    fn append_requires_compatible_headers() {
        let mut deck = deck();
        let other = deck.clone();
        assert_eq!(deck.append(other).unwrap(), 3);
        assert_eq!(deck.len(), 6);

        let narrow = Deck::new(ExportHeader::new('\t', 1).unwrap());
        assert!(matches!(
            deck.append(narrow),
            Err(EditError::InvariantViolation(Invariant::IncompatibleDeck { .. }))
        ));
    }

    fn incompatible(deck: &mut Deck, other: &str) -> bool {
        let other = crate::builder::parse_str(other).unwrap();
        matches!(
            deck.append(other),
            Err(EditError::InvariantViolation(Invariant::IncompatibleDeck { .. }))
        )
    }

    #[test]
    fn append_rejects_moved_special_columns() {
        let mut deck = crate::builder::parse_str("#notetype column:1\nBasic\tq1\n").unwrap();
        assert!(incompatible(&mut deck, "#notetype column:2\nq2\tBasic\n"));
        assert!(incompatible(&mut deck, "#deck column:1\nFrench\tq2\n"));
        assert!(incompatible(&mut deck, "#notetype column:1\n#guid column:2\nBasic\tg1\n"));
        assert_eq!(deck.len(), 1);
        assert_eq!(deck.note_type(&deck.cards()[0]), Some("Basic"));

        assert!(!incompatible(&mut deck, "#notetype column:1\nCloze\tq2\n"));
        assert_eq!(deck.len(), 2);
    }

    #[test]
    fn append_rejects_other_file_settings() {
        let mut deck =
            crate::builder::parse_str("#html:true\n#notetype:Basic\n#deck:French\nq\ta\n").unwrap();
        assert!(incompatible(&mut deck, "#html:false\n#notetype:Basic\n#deck:French\nq\ta\n"));
        assert!(incompatible(&mut deck, "#html:true\n#notetype:Cloze\n#deck:French\nq\ta\n"));
        assert!(incompatible(&mut deck, "#html:true\n#notetype:Basic\n#deck:German\nq\ta\n"));
        assert!(incompatible(&mut deck, "#html:true\n#notetype:Basic\nq\ta\n"));
        assert!(!incompatible(
            &mut deck,
            "#html: true\n#notetype:Basic\n#deck:French\n#exporter:x\nq2\ta2\n"
        ));
        assert_eq!(deck.len(), 2);
    }

    #[test]
    fn passthrough_rejects_known_keys() {
        let mut deck = deck();
        assert!(deck.set_passthrough("exported by", "deckhand").is_ok());
        assert_eq!(
            deck.set_passthrough("separator", "comma"),
            Err(EditError::InvariantViolation(Invariant::ReservedDirective {
                key: "separator".to_string()
            }))
        );
    }

    #[test]
    fn media_references_are_distinct() {
        let mut deck = deck();
        deck.push_card(Card::new(["[sound:a.mp3]", "<img src=\"b.png\"> [sound:a.mp3]"]))
            .unwrap();
        assert_eq!(deck.media_references(), vec!["a.mp3", "b.png"]);
    }
}
