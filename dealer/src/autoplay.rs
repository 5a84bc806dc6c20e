use cincuentazo::{Game, GameError, GameEvent, Outcome, TableView};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::MatchConfig;

/// More turns than any real match takes. A match that gets this far is
/// stopped rather than played forever.
pub const MAX_TURNS: usize = 10_000;

/// A finished match where every seat played the first valid card.
#[derive(Clone, Debug)]
pub struct AutoMatch {
    pub outcome: Outcome,
    pub turns: usize,
    pub events: Vec<GameEvent>,
    pub view: TableView,
}

/// Plays a whole match without waiting for anyone, the human seat included.
///
/// Returns an error only if the engine rejects one of its own moves.
pub fn play_auto_match(config: &MatchConfig, rng: &mut StdRng) -> anyhow::Result<AutoMatch> {
    let mut game = Game::with_human_name(
        &config.human_name,
        config.machines,
        StdRng::from_rng(rng)?,
    )?;

    let mut turns = 0;
    while let Some(player_idx) = game.current_player() {
        if turns == MAX_TURNS {
            warn!(turns, "Match did not finish, stopping it");
            game.stop();
            break;
        }
        match game.execute_machine_turn(player_idx) {
            Ok(_) | Err(GameError::EmptyDeck) => {}
            Err(err) => return Err(err.into()),
        }
        game.advance_turn();
        turns += 1;
    }

    let events = game.take_events();
    let view = game.view();
    let outcome = game.outcome().cloned().unwrap_or(Outcome::Stopped);
    debug!(?outcome, turns, "Auto match finished");
    Ok(AutoMatch {
        outcome,
        turns,
        events,
        view,
    })
}

/// Wins per seat over a series of auto matches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub wins: Vec<usize>,
    pub ties: usize,
    pub no_survivors: usize,
    pub stopped: usize,
}

impl Tally {
    pub fn new(num_players: usize) -> Self {
        Self {
            wins: vec![0; num_players],
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Winner { player_idx } => {
                if let Some(wins) = self.wins.get_mut(*player_idx) {
                    *wins += 1;
                }
            }
            Outcome::Exhausted { .. } => self.ties += 1,
            Outcome::NoSurvivors => self.no_survivors += 1,
            Outcome::Stopped => self.stopped += 1,
        }
    }

    pub fn games(&self) -> usize {
        self.wins.iter().sum::<usize>() + self.ties + self.no_survivors + self.stopped
    }
}

#[cfg(test)]
mod tests {
    use cincuentazo::DECK_SIZE;

    use super::*;

    #[test]
    fn auto_matches_finish() {
        let config = MatchConfig {
            machines: 3,
            ..MatchConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let mut tally = Tally::new(4);
        for _ in 0..20 {
            let result = play_auto_match(&config, &mut rng).unwrap();
            assert_eq!(result.view.outcome.as_ref(), Some(&result.outcome));
            assert!(matches!(
                result.events.last(),
                Some(GameEvent::GameEnded { .. })
            ));
            let cards: usize = result.view.deck_remaining
                + result.view.table_pile_len
                + result.view.players.iter().map(|p| p.hand.len()).sum::<usize>();
            assert_eq!(cards, DECK_SIZE);
            tally.record(&result.outcome);
        }
        assert_eq!(tally.games(), 20);
    }

    #[test]
    fn same_seed_same_match() {
        let config = MatchConfig::default();
        let a = play_auto_match(&config, &mut StdRng::seed_from_u64(77)).unwrap();
        let b = play_auto_match(&config, &mut StdRng::seed_from_u64(77)).unwrap();
        assert_eq!(a.events, b.events);
        assert_eq!(a.turns, b.turns);
    }

    #[test]
    fn tally_counts_every_outcome() {
        let mut tally = Tally::new(2);
        tally.record(&Outcome::Winner { player_idx: 1 });
        tally.record(&Outcome::Winner { player_idx: 1 });
        tally.record(&Outcome::Exhausted {
            survivors: vec![0, 1],
        });
        tally.record(&Outcome::Stopped);
        assert_eq!(tally.wins, vec![0, 2]);
        assert_eq!(tally.ties, 1);
        assert_eq!(tally.stopped, 1);
        assert_eq!(tally.games(), 4);
    }
}
