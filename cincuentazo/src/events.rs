use serde::{Deserialize, Serialize};

use crate::{Card, PlayerView};

/// Something that happened at the table.
///
/// The [`Game`](crate::Game) records these as it goes; a collaborator
/// drains them with [`Game::take_events()`](crate::Game::take_events).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// The card turned up after dealing, which seeds the table sum.
    OpeningCard { card: Card, table_sum: i32 },
    Played {
        player_idx: usize,
        card: Card,
        /// How much the table sum actually changed, which for a face card
        /// on a low sum is less than ten.
        effect: i32,
        table_sum: i32,
    },
    /// The player refilled their hand. Which cards were drawn is private.
    Drew { player_idx: usize, count: usize },
    /// All but the top card of the table pile went back into the deck.
    Recycled { returned: usize, deck_remaining: usize },
    Eliminated { player_idx: usize, returned: usize },
    TurnPassed { player_idx: usize },
    GameEnded { outcome: Outcome },
}

/// How a game ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Outcome {
    /// Everyone else has been eliminated.
    Winner { player_idx: usize },
    /// The deck ran out and could not be recycled; the survivors tie.
    Exhausted { survivors: Vec<usize> },
    /// Nobody is left standing.
    NoSurvivors,
    /// The game was stopped from outside.
    Stopped,
}

/// Where the game is within the current turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    AwaitingMachineMove,
    AwaitingHumanMove,
    /// The current player has moved; the turn still has to be finished
    /// by drawing or passed on with [`Game::advance_turn()`](crate::Game::advance_turn).
    Resolving,
    GameOver,
}

/// A snapshot of the whole table for collaborators outside the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub players: Vec<PlayerView>,
    pub table_sum: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub top_card: Option<Card>,
    pub table_pile_len: usize,
    pub deck_remaining: usize,
    /// `None` once the game is over.
    pub current_player: Option<usize>,
    pub state: TurnState,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub outcome: Option<Outcome>,
}

impl TableView {
    pub fn current(&self) -> Option<&PlayerView> {
        self.current_player.and_then(|idx| self.players.get(idx))
    }
}
