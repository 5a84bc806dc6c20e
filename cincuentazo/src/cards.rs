use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CardFromStrErr;

/// The table sum may never exceed this value.
pub const TARGET_SUM: i32 = 50;

/// A playing card in a standard 52-card game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

/// The suit of a [card](Card).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Suit {
    #[serde(rename = "♥")]
    Heart,
    #[serde(rename = "♦")]
    Diamond,
    #[serde(rename = "♣")]
    Club,
    #[serde(rename = "♠")]
    Spade,
}

/// The rank of a [card](Card).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rank {
    #[serde(rename = "A")]
    Ace,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Heart, Suit::Diamond, Suit::Club, Suit::Spade];

    pub fn symbol(self) -> char {
        match self {
            Suit::Heart => '♥',
            Suit::Diamond => '♦',
            Suit::Club => '♣',
            Suit::Spade => '♠',
        }
    }
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        }
    }

    /// How much a card of this rank adds to a table showing `current_sum`.
    ///
    /// Only the ace depends on `current_sum`: it counts 10 while that still
    /// fits under [`TARGET_SUM`], and 1 otherwise.
    pub fn effect(self, current_sum: i32) -> i32 {
        match self {
            Rank::Ace => {
                if current_sum <= TARGET_SUM - 10 {
                    10
                } else {
                    1
                }
            }
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 0,
            Rank::Ten => 10,
            Rank::Jack | Rank::Queen | Rank::King => -10,
        }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.rank.symbol(), self.suit.symbol())
    }
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// See [`Rank::effect`].
    pub fn effect(&self, current_sum: i32) -> i32 {
        self.rank.effect(current_sum)
    }

    /// The table sum after playing this card on `table_sum`. The table never
    /// shows less than zero, so a face card on a low sum leaves it at zero.
    pub fn sum_after(&self, table_sum: i32) -> i32 {
        table_sum.saturating_add(self.effect(table_sum)).max(0)
    }

    /// Whether playing this card keeps the table sum at or below [`TARGET_SUM`].
    pub fn can_be_played_on(&self, table_sum: i32) -> bool {
        self.sum_after(table_sum) <= TARGET_SUM
    }
}

impl FromStr for Card {
    type Err = CardFromStrErr;

    /// Accepts the rank symbol followed by the suit, e.g. `A♥`, `10♣`, `TD` or `qs`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let suit_char = s.chars().last().ok_or(CardFromStrErr::Empty)?;
        let rank_str = &s[..s.len() - suit_char.len_utf8()];
        let rank = match rank_str.to_ascii_uppercase().as_str() {
            "A" | "1" => Rank::Ace,
            "2" => Rank::Two,
            "3" => Rank::Three,
            "4" => Rank::Four,
            "5" => Rank::Five,
            "6" => Rank::Six,
            "7" => Rank::Seven,
            "8" => Rank::Eight,
            "9" => Rank::Nine,
            "10" | "T" => Rank::Ten,
            "J" => Rank::Jack,
            "Q" => Rank::Queen,
            "K" => Rank::King,
            _ => return Err(CardFromStrErr::InvalidRank(rank_str.to_owned())),
        };
        let suit = match suit_char {
            '♥' | 'h' | 'H' => Suit::Heart,
            '♦' | 'd' | 'D' => Suit::Diamond,
            '♣' | 'c' | 'C' => Suit::Club,
            '♠' | 's' | 'S' => Suit::Spade,
            other => return Err(CardFromStrErr::InvalidSuit(other)),
        };
        Ok(Card { rank, suit })
    }
}

/// Shorthand for creating cards from a string.
///
/// The rank comes first (`A`, `2`..`10`, `J`, `Q`, `K`), followed by the
/// suit, either as a unicode character (♥, ♦, ♣, ♠) or a letter (`H`, `D`,
/// `C`, `S`).
///
/// This macro is just calling the [`FromStr`] instance of [`Card`].
/// ```
/// # use cincuentazo::{card, Card, Rank, Suit};
/// assert_eq!(
///     card!("10♥"),
///     Card { rank: Rank::Ten, suit: Suit::Heart }
/// );
/// ```
#[macro_export]
macro_rules! card {
    ($rs:literal) => {
        <$crate::Card as std::str::FromStr>::from_str($rs)
            .expect("Invalid card code given to card! macro")
    };
}
// Re-exported so that unit tests inside the crate can use the macro by path.
#[allow(unused_imports)]
pub(crate) use card;
