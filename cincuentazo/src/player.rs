use serde::{Deserialize, Serialize};

use crate::{Card, Deck, EmptyDeck, NoValidMove};

/// How many cards a player holds between turns.
pub const HAND_SIZE: usize = 4;

/// A seat at the table, human or machine, and the cards it holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    name: String,
    is_machine: bool,
    hand: Vec<Card>,
    eliminated: bool,
}

/// A snapshot of a [`Player`] for collaborators outside the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    pub is_machine: bool,
    pub hand: Vec<Card>,
    pub eliminated: bool,
}

impl Player {
    pub fn new(name: impl Into<String>, is_machine: bool) -> Self {
        Self {
            name: name.into(),
            is_machine,
            hand: Vec::with_capacity(HAND_SIZE),
            eliminated: false,
        }
    }

    pub(crate) fn with_hand(name: impl Into<String>, is_machine: bool, hand: Vec<Card>) -> Self {
        Self {
            hand,
            ..Self::new(name, is_machine)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_machine(&self) -> bool {
        self.is_machine
    }

    /// The cards in the order they were drawn.
    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn is_eliminated(&self) -> bool {
        self.eliminated
    }

    /// Deals the starting hand.
    pub fn deal_initial(&mut self, deck: &mut Deck) -> Result<(), EmptyDeck> {
        while self.hand.len() < HAND_SIZE {
            self.hand.push(deck.draw()?);
        }
        Ok(())
    }

    /// Tops the hand back up to [`HAND_SIZE`] and returns how many cards were
    /// drawn. Cards drawn before the deck ran out stay in the hand.
    pub fn draw(&mut self, deck: &mut Deck) -> Result<usize, EmptyDeck> {
        let mut drawn = 0;
        while self.hand.len() < HAND_SIZE {
            self.hand.push(deck.draw()?);
            drawn += 1;
        }
        Ok(drawn)
    }

    /// The first card in hand order that can be played on `current_sum`.
    pub fn first_valid_card(&self, current_sum: i32) -> Option<Card> {
        self.hand
            .iter()
            .copied()
            .find(|card| card.can_be_played_on(current_sum))
    }

    /// The default strategy: pick the first playable card in hand order.
    ///
    /// The card is not removed from the hand; the game does that when the
    /// play is applied. When nothing is playable the player is eliminated
    /// on the spot and the error carries the forfeited hand.
    pub fn choose_card(&mut self, current_sum: i32) -> Result<Card, NoValidMove> {
        match self.first_valid_card(current_sum) {
            Some(card) => Ok(card),
            None => Err(NoValidMove {
                table_sum: current_sum,
                forfeited: self.eliminate(),
            }),
        }
    }

    /// Marks the player as eliminated and empties the hand, returning what
    /// was in it. Calling it again returns nothing.
    pub fn eliminate(&mut self) -> Vec<Card> {
        self.eliminated = true;
        std::mem::take(&mut self.hand)
    }

    pub(crate) fn remove_card(&mut self, card: Card) -> bool {
        match self.hand.iter().position(|&c| c == card) {
            Some(pos) => {
                self.hand.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            name: self.name.clone(),
            is_machine: self.is_machine,
            hand: self.hand.clone(),
            eliminated: self.eliminated,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_machine { "CPU" } else { "Human" };
        write!(f, "{} ({})", self.name, kind)
    }
}
