//! Cards and Decks
//!
//! A card is an immutable `(id, symbol)` pair. Whether it is face-up or
//! matched lives on the session, never on the card.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, StateHasher};
use crate::game::deck::ConfigurationError;

// =============================================================================
// SYMBOL
// =============================================================================

/// Opaque face token printed on a card (an emoji in the default pool).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol from any string-like token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Symbol {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CARD ID
// =============================================================================

/// Display position of a card, `0..deck.len()`.
///
/// Implements Ord for deterministic BTreeSet ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl CardId {
    /// Position as a slice index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Stable id, equal to the card's position in the deck
    pub id: CardId,
    /// Face symbol
    pub symbol: Symbol,
}

// =============================================================================
// DECK
// =============================================================================

/// Ordered cards in play for one episode.
///
/// Invariants: ids are `0..len` in order, and every symbol occurs exactly twice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Empty deck (the session's deck before the first start).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Lay out symbols in the given order, numbering them by position.
    ///
    /// Fails with [`ConfigurationError::UnpairedSymbol`] unless every symbol
    /// appears exactly twice.
    pub fn from_symbols<I, S>(symbols: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        let symbols: Vec<Symbol> = symbols.into_iter().map(Into::into).collect();

        let mut counts: BTreeMap<&Symbol, usize> = BTreeMap::new();
        for symbol in &symbols {
            *counts.entry(symbol).or_default() += 1;
        }
        if let Some((symbol, count)) = counts.into_iter().find(|(_, count)| *count != 2) {
            return Err(ConfigurationError::UnpairedSymbol {
                symbol: symbol.clone(),
                count,
            });
        }

        Ok(Self::numbered(symbols))
    }

    /// Assign ids by final position. Callers guarantee the pair invariant.
    pub(crate) fn numbered(symbols: Vec<Symbol>) -> Self {
        let cards = symbols
            .into_iter()
            .enumerate()
            .map(|(position, symbol)| Card {
                id: CardId(position as u32),
                symbol,
            })
            .collect();
        Self { cards }
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// True for a deck with no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Number of pairs.
    pub fn pair_count(&self) -> usize {
        self.cards.len() / 2
    }

    /// Whether `id` names a card in this deck.
    #[inline]
    pub fn contains(&self, id: CardId) -> bool {
        id.index() < self.cards.len()
    }

    /// Card at `id`.
    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.get(id.index())
    }

    /// Symbol of the card at `id`.
    pub fn symbol(&self, id: CardId) -> Option<&Symbol> {
        self.get(id).map(|card| &card.symbol)
    }

    /// All cards in display order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Iterate over cards in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    /// Every card id, in order.
    pub fn ids(&self) -> impl Iterator<Item = CardId> + '_ {
        self.cards.iter().map(|card| card.id)
    }

    /// Ids of the two cards carrying each symbol, keyed by symbol.
    pub fn pairs(&self) -> BTreeMap<&Symbol, Vec<CardId>> {
        let mut pairs: BTreeMap<&Symbol, Vec<CardId>> = BTreeMap::new();
        for card in &self.cards {
            pairs.entry(&card.symbol).or_default().push(card.id);
        }
        pairs
    }

    /// Hash of the layout (ids and symbols in order).
    pub fn fingerprint(&self) -> StateHash {
        let mut hasher = StateHasher::for_deck();
        self.hash_into(&mut hasher);
        hasher.finalize()
    }

    pub(crate) fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.cards.len() as u32);
        for card in &self.cards {
            hasher.update_u32(card.id.0);
            hasher.update_str(card.symbol.as_str());
        }
    }
}

impl<'a> IntoIterator for &'a Deck {
    type Item = &'a Card;
    type IntoIter = std::slice::Iter<'a, Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_symbols_numbers_by_position() {
        let deck = Deck::from_symbols(["A", "B", "B", "A"]).unwrap();

        assert_eq!(deck.len(), 4);
        assert_eq!(deck.pair_count(), 2);
        let ids: Vec<_> = deck.ids().collect();
        assert_eq!(ids, vec![CardId(0), CardId(1), CardId(2), CardId(3)]);
        assert_eq!(deck.symbol(CardId(3)), Some(&Symbol::from("A")));
        assert_eq!(deck.symbol(CardId(4)), None);
    }

    #[test]
    fn test_from_symbols_rejects_unpaired() {
        let err = Deck::from_symbols(["A", "B", "A"]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnpairedSymbol { symbol: Symbol::from("B"), count: 1 }
        );

        let err = Deck::from_symbols(["A", "A", "A", "A"]).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnpairedSymbol { count: 4, .. }));
    }

    #[test]
    fn test_empty_deck() {
        let deck = Deck::from_symbols(Vec::<&str>::new()).unwrap();
        assert!(deck.is_empty());
        assert!(!deck.contains(CardId(0)));
        assert_eq!(deck, Deck::empty());
    }

    #[test]
    fn test_pairs_groups_ids() {
        let deck = Deck::from_symbols(["A", "B", "A", "B"]).unwrap();
        let pairs = deck.pairs();

        assert_eq!(pairs[&Symbol::from("A")], vec![CardId(0), CardId(2)]);
        assert_eq!(pairs[&Symbol::from("B")], vec![CardId(1), CardId(3)]);
    }

    #[test]
    fn test_fingerprint_tracks_layout() {
        let deck1 = Deck::from_symbols(["A", "B", "A", "B"]).unwrap();
        let deck2 = Deck::from_symbols(["A", "B", "A", "B"]).unwrap();
        let deck3 = Deck::from_symbols(["A", "A", "B", "B"]).unwrap();

        assert_eq!(deck1.fingerprint(), deck2.fingerprint());
        assert_ne!(deck1.fingerprint(), deck3.fingerprint());
    }

    #[test]
    fn test_symbol_serializes_as_plain_string() {
        let json = serde_json::to_string(&Symbol::from("🥭")).unwrap();
        assert_eq!(json, "\"🥭\"");
    }
}
