use rand::seq::SliceRandom;
use rand::Rng;

use crate::{Card, EmptyDeck, Rank, Suit};

/// Number of cards in a full deck.
pub const DECK_SIZE: usize = 52;

/// The draw pile. The last card of the vector is the top of the deck.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// All 52 cards, hearts to spades and ace to king, unshuffled.
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                cards.push(Card::new(rank, suit));
            }
        }
        Self { cards }
    }

    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle(rng);
        deck
    }

    /// A deck with exactly these cards, where the last one is on top.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn draw(&mut self) -> Result<Card, EmptyDeck> {
        self.cards.pop().ok_or(EmptyDeck)
    }

    pub fn add_to_bottom(&mut self, card: Card) {
        self.cards.insert(0, card);
    }

    /// Puts `cards` under the deck, keeping their order: the first card of
    /// the batch becomes the new bottom card.
    pub fn add_batch_to_bottom<I: IntoIterator<Item = Card>>(&mut self, cards: I) {
        self.cards.splice(0..0, cards);
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Bottom to top.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
