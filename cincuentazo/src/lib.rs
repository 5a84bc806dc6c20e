//! The rule engine for Cincuentazo, a shedding game played with a standard
//! 52-card deck: players take turns adding a card's value to a running table
//! sum, and whoever cannot play without pushing the sum past 50 is out.
//!
//! [`Game`] owns the whole match. A collaborator (a terminal front end, a
//! GUI, a test) drives it by calling the turn operations for whoever's turn it
//! is and reading back [`TableView`] snapshots and [`GameEvent`]s.

pub use cards::*;
pub use deck::*;
pub use errors::*;
pub use events::*;
pub use game::*;
pub use player::*;
pub use visualization::*;

#[cfg(test)]
mod arbitrary;
mod cards;
mod deck;
mod errors;
mod events;
mod game;
mod player;
mod visualization;
