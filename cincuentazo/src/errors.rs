use thiserror::Error;

use crate::Card;

/// The error type for the [`FromStr`](std::str::FromStr) instance of [`Card`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CardFromStrErr {
    #[error("empty card code")]
    Empty,
    #[error("invalid rank '{0}'")]
    InvalidRank(String),
    #[error("invalid suit '{0}'")]
    InvalidSuit(char),
}

/// A draw was attempted with no cards left in the [`Deck`](crate::Deck).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("no cards left in the deck")]
pub struct EmptyDeck;

/// The error type for [`Player::choose_card()`](crate::Player::choose_card).
///
/// By the time this is returned the player has already been eliminated;
/// `forfeited` holds the hand they gave up.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("no card in hand can be played on a table sum of {table_sum}")]
pub struct NoValidMove {
    pub table_sum: i32,
    pub forfeited: Vec<Card>,
}

/// Why a move was rejected. Rejected moves never change the game.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IllegalMove {
    #[error("there is no player with index {player_idx}")]
    UnknownPlayer { player_idx: usize },
    #[error("it is player {current_idx}'s turn, not player {player_idx}'s")]
    NotPlayersTurn { player_idx: usize, current_idx: usize },
    #[error("player {player_idx} has been eliminated")]
    PlayerEliminated { player_idx: usize },
    #[error("{card} is not in the player's hand")]
    CardNotInHand { card: Card },
    #[error("{card} would raise the table sum from {table_sum} to {new_sum}, over 50")]
    ExceedsFifty {
        card: Card,
        table_sum: i32,
        new_sum: i32,
    },
    #[error("a card has already been played this turn")]
    AlreadyPlayed,
    #[error("a card must be played before drawing")]
    MustPlayFirst,
    #[error("the turn is already complete")]
    TurnComplete,
    #[error("the game is over")]
    GameOver,
}

/// The error type for the turn operations on [`Game`](crate::Game).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    /// The move was rejected and nothing changed; the player may try again.
    #[error("invalid move")]
    InvalidMove(#[from] IllegalMove),
    /// The player had no legal card and has been eliminated.
    #[error("{name} has no valid move and is eliminated")]
    NoValidMove { player_idx: usize, name: String },
    /// The deck ran out and the table pile was too small to recycle.
    /// The game has ended.
    #[error("the deck is exhausted and the table pile cannot be recycled")]
    EmptyDeck,
}

/// The error type for setting up a [`Game`](crate::Game).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("a game needs between 1 and 3 machine players, got {0}")]
    MachineCount(usize),
    #[error("player {player_idx} was given {len} cards, the hand limit is 4")]
    HandTooLarge { player_idx: usize, len: usize },
    #[error("{0} appears more than once")]
    DuplicateCard(Card),
    #[error("table sum {0} is outside 0..=50")]
    TableSumOutOfRange(i32),
    #[error("could not deal the opening cards")]
    Deal(#[from] EmptyDeck),
}
