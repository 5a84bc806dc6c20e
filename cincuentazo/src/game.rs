use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::{
    Card, Deck, EmptyDeck, GameError, GameEvent, IllegalMove, NoValidMove, Outcome, Player,
    SetupError, TableView, TurnState, HAND_SIZE, TARGET_SUM,
};

pub const MIN_MACHINES: usize = 1;
pub const MAX_MACHINES: usize = 3;

/// Progress of the current player's turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Nothing has happened yet.
    Open,
    /// A card was played, the replacement has not been drawn.
    Played,
    /// The player has played and drawn, or has been eliminated.
    Complete,
}

/// One match of Cincuentazo: the players, the deck, and the table.
///
/// All mutation goes through the turn operations, which check whose turn it
/// is and reject anything out of order without changing the game.
#[derive(Clone, Debug)]
pub struct Game {
    deck: Deck,
    /// The human first, then the machines in creation order.
    players: Vec<Player>,
    /// The last card is the top of the pile.
    table_pile: Vec<Card>,
    table_sum: i32,
    current_idx: usize,
    phase: Phase,
    outcome: Option<Outcome>,
    events: Vec<GameEvent>,
    rng: StdRng,
}

impl Game {
    /// Starts a game between a human named "You" and `num_machines` machines.
    pub fn new(num_machines: usize, rng: StdRng) -> Result<Self, SetupError> {
        Self::with_human_name("You", num_machines, rng)
    }

    pub fn with_human_name(
        human_name: &str,
        num_machines: usize,
        mut rng: StdRng,
    ) -> Result<Self, SetupError> {
        if !(MIN_MACHINES..=MAX_MACHINES).contains(&num_machines) {
            return Err(SetupError::MachineCount(num_machines));
        }
        let mut players = vec![Player::new(human_name, false)];
        for i in 1..=num_machines {
            players.push(Player::new(format!("CPU-{}", i), true));
        }

        let mut deck = Deck::shuffled(&mut rng);
        for player in players.iter_mut() {
            player.deal_initial(&mut deck)?;
        }

        // A face card turned up first leaves the sum at zero.
        let opening = deck.draw()?;
        let table_sum = opening.sum_after(0);
        debug!(card = %opening, table_sum, "Opening card");

        Ok(Self {
            deck,
            players,
            table_pile: vec![opening],
            table_sum,
            current_idx: 0,
            phase: Phase::Open,
            outcome: None,
            events: vec![GameEvent::OpeningCard {
                card: opening,
                table_sum,
            }],
            rng,
        })
    }

    /// Sets up a game in a given position.
    ///
    /// `hands[0]` belongs to the human, every further hand to a machine. The
    /// cards not mentioned in `hands` or `table_pile` form the deck, shuffled.
    pub fn arranged(
        hands: Vec<Vec<Card>>,
        table_pile: Vec<Card>,
        table_sum: i32,
        mut rng: StdRng,
    ) -> Result<Self, SetupError> {
        let num_machines = hands.len().saturating_sub(1);
        if !(MIN_MACHINES..=MAX_MACHINES).contains(&num_machines) {
            return Err(SetupError::MachineCount(num_machines));
        }
        if !(0..=TARGET_SUM).contains(&table_sum) {
            return Err(SetupError::TableSumOutOfRange(table_sum));
        }

        let mut seen = BTreeSet::new();
        for (player_idx, hand) in hands.iter().enumerate() {
            if hand.len() > HAND_SIZE {
                return Err(SetupError::HandTooLarge {
                    player_idx,
                    len: hand.len(),
                });
            }
        }
        for &card in hands.iter().flatten().chain(table_pile.iter()) {
            if !seen.insert(card) {
                return Err(SetupError::DuplicateCard(card));
            }
        }

        let mut rest: Vec<Card> = Deck::standard()
            .cards()
            .iter()
            .copied()
            .filter(|card| !seen.contains(card))
            .collect();
        rest.shuffle(&mut rng);

        let players = hands
            .into_iter()
            .enumerate()
            .map(|(idx, hand)| {
                if idx == 0 {
                    Player::with_hand("You", false, hand)
                } else {
                    Player::with_hand(format!("CPU-{}", idx), true, hand)
                }
            })
            .collect();

        Ok(Self {
            deck: Deck::from_cards(rest),
            players,
            table_pile,
            table_sum,
            current_idx: 0,
            phase: Phase::Open,
            outcome: None,
            events: Vec::new(),
            rng,
        })
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_idx: usize) -> Option<&Player> {
        self.players.get(player_idx)
    }

    pub fn table_sum(&self) -> i32 {
        self.table_sum
    }

    pub fn top_card(&self) -> Option<Card> {
        self.table_pile.last().copied()
    }

    pub fn table_pile(&self) -> &[Card] {
        &self.table_pile
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Cards in the deck, in all hands and on the table. Always [`DECK_SIZE`](crate::DECK_SIZE).
    pub fn cards_in_play(&self) -> usize {
        self.deck.remaining()
            + self.players.iter().map(|p| p.hand().len()).sum::<usize>()
            + self.table_pile.len()
    }

    /// Indices of the players still in the game, in turn order.
    pub fn active_players(&self) -> Vec<usize> {
        (0..self.players.len())
            .filter(|&idx| !self.players[idx].is_eliminated())
            .collect()
    }

    /// Whose turn it is, or `None` once the game is over.
    pub fn current_player(&self) -> Option<usize> {
        if self.is_game_over() {
            None
        } else {
            Some(self.current_idx)
        }
    }

    pub fn state(&self) -> TurnState {
        if self.is_game_over() {
            return TurnState::GameOver;
        }
        match self.phase {
            Phase::Open if self.players[self.current_idx].is_machine() => {
                TurnState::AwaitingMachineMove
            }
            Phase::Open => TurnState::AwaitingHumanMove,
            Phase::Played | Phase::Complete => TurnState::Resolving,
        }
    }

    /// Whether the current player is done and the turn can be passed on.
    pub fn turn_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// The last player standing, if the game was decided that way.
    pub fn winner(&self) -> Option<&Player> {
        match self.outcome {
            Some(Outcome::Winner { player_idx }) => self.players.get(player_idx),
            _ => None,
        }
    }

    pub fn is_valid_move(&self, card: Card) -> bool {
        card.can_be_played_on(self.table_sum)
    }

    /// Whether any card in the player's hand can be played right now.
    pub fn has_valid_cards(&self, player_idx: usize) -> bool {
        self.players
            .get(player_idx)
            .is_some_and(|p| p.hand().iter().any(|&card| self.is_valid_move(card)))
    }

    /// Plays `card` from the player's hand onto the table.
    ///
    /// Every check happens before anything is changed, so a rejected play
    /// leaves the game exactly as it was.
    pub fn play_card(&mut self, player_idx: usize, card: Card) -> Result<(), GameError> {
        self.check_turn(player_idx)?;
        self.check_phase_open()?;
        if !self.players[player_idx].hand().contains(&card) {
            return Err(IllegalMove::CardNotInHand { card }.into());
        }
        let new_sum = card.sum_after(self.table_sum);
        if new_sum > TARGET_SUM {
            return Err(IllegalMove::ExceedsFifty {
                card,
                table_sum: self.table_sum,
                new_sum,
            }
            .into());
        }

        self.players[player_idx].remove_card(card);
        self.apply_play(player_idx, card);
        Ok(())
    }

    /// Lets the player's default strategy pick and play a card, then refills
    /// their hand. Returns the card played, or `None` if the player had
    /// nothing playable and was eliminated.
    pub fn execute_machine_turn(&mut self, player_idx: usize) -> Result<Option<Card>, GameError> {
        self.check_turn(player_idx)?;
        self.check_phase_open()?;
        match self.players[player_idx].choose_card(self.table_sum) {
            Ok(card) => {
                self.play_card(player_idx, card)?;
                self.replenish(player_idx)?;
                self.phase = Phase::Complete;
                Ok(Some(card))
            }
            Err(NoValidMove { forfeited, .. }) => {
                self.retire(player_idx, forfeited);
                Ok(None)
            }
        }
    }

    /// Plays the card a human picked.
    ///
    /// A human with no playable card at all is eliminated, whatever card was
    /// passed. Otherwise an unplayable choice is simply rejected and the
    /// human may pick again.
    pub fn execute_human_play(&mut self, player_idx: usize, card: Card) -> Result<(), GameError> {
        self.check_turn(player_idx)?;
        self.check_phase_open()?;
        if !self.has_valid_cards(player_idx) {
            let forfeited = self.players[player_idx].eliminate();
            self.retire(player_idx, forfeited);
            return Err(GameError::NoValidMove {
                player_idx,
                name: self.players[player_idx].name().to_owned(),
            });
        }
        self.play_card(player_idx, card)
    }

    /// Refills the human's hand after their play, which completes the turn.
    pub fn execute_human_draw(&mut self, player_idx: usize) -> Result<(), GameError> {
        self.check_turn(player_idx)?;
        match self.phase {
            Phase::Open => return Err(IllegalMove::MustPlayFirst.into()),
            Phase::Complete => return Err(IllegalMove::TurnComplete.into()),
            Phase::Played => {}
        }
        self.replenish(player_idx)?;
        self.phase = Phase::Complete;
        Ok(())
    }

    /// Returns all but the top card of the table pile to the deck and
    /// shuffles it. Returns the number of cards recycled.
    ///
    /// With fewer than two cards on the table there is nothing to recycle.
    pub fn recycle_deck(&mut self) -> Result<usize, EmptyDeck> {
        if self.table_pile.len() < 2 {
            return Err(EmptyDeck);
        }
        let top = self.table_pile.pop().ok_or(EmptyDeck)?;
        let mut batch = std::mem::replace(&mut self.table_pile, vec![top]);
        batch.shuffle(&mut self.rng);
        let returned = batch.len();
        self.deck.add_batch_to_bottom(batch);
        self.deck.shuffle(&mut self.rng);

        info!(returned, deck_remaining = self.deck.remaining(), "Deck recycled");
        self.events.push(GameEvent::Recycled {
            returned,
            deck_remaining: self.deck.remaining(),
        });
        Ok(returned)
    }

    /// Passes the turn to the next player still in the game.
    pub fn advance_turn(&mut self) {
        if self.is_game_over() {
            return;
        }
        let num_players = self.players.len();
        let next = (1..=num_players)
            .map(|offset| (self.current_idx + offset) % num_players)
            .find(|&idx| !self.players[idx].is_eliminated());
        if let Some(next) = next {
            self.current_idx = next;
            self.phase = Phase::Open;
            debug!(player = self.players[next].name(), "Turn passed");
            self.events.push(GameEvent::TurnPassed { player_idx: next });
        }
    }

    /// Ends the game from outside. Calling it again has no effect.
    pub fn stop(&mut self) {
        if !self.is_game_over() {
            self.finish(Outcome::Stopped);
        }
    }

    /// Removes and returns the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn view(&self) -> TableView {
        TableView {
            players: self.players.iter().map(Player::view).collect(),
            table_sum: self.table_sum,
            top_card: self.top_card(),
            table_pile_len: self.table_pile.len(),
            deck_remaining: self.deck.remaining(),
            current_player: self.current_player(),
            state: self.state(),
            outcome: self.outcome.clone(),
        }
    }

    fn check_turn(&self, player_idx: usize) -> Result<(), IllegalMove> {
        if self.is_game_over() {
            return Err(IllegalMove::GameOver);
        }
        let player = self
            .players
            .get(player_idx)
            .ok_or(IllegalMove::UnknownPlayer { player_idx })?;
        if player.is_eliminated() {
            return Err(IllegalMove::PlayerEliminated { player_idx });
        }
        if player_idx != self.current_idx {
            return Err(IllegalMove::NotPlayersTurn {
                player_idx,
                current_idx: self.current_idx,
            });
        }
        Ok(())
    }

    fn check_phase_open(&self) -> Result<(), IllegalMove> {
        match self.phase {
            Phase::Open => Ok(()),
            Phase::Played | Phase::Complete => Err(IllegalMove::AlreadyPlayed),
        }
    }

    /// The card has already left the player's hand.
    fn apply_play(&mut self, player_idx: usize, card: Card) {
        let new_sum = card.sum_after(self.table_sum);
        let effect = new_sum - self.table_sum;
        self.table_pile.push(card);
        self.table_sum = new_sum;
        self.phase = Phase::Played;
        debug!(
            player = self.players[player_idx].name(),
            card = %card,
            table_sum = self.table_sum,
            "Played"
        );
        self.events.push(GameEvent::Played {
            player_idx,
            card,
            effect,
            table_sum: self.table_sum,
        });
    }

    /// Tops up the player's hand, recycling the table once if the deck runs
    /// dry. If that is not enough the game ends in a tie.
    fn replenish(&mut self, player_idx: usize) -> Result<(), GameError> {
        let before = self.players[player_idx].hand().len();
        if self.players[player_idx].draw(&mut self.deck).is_err()
            && (self.recycle_deck().is_err()
                || self.players[player_idx].draw(&mut self.deck).is_err())
        {
            return Err(self.exhaust());
        }
        let count = self.players[player_idx].hand().len() - before;
        debug!(player = self.players[player_idx].name(), count, "Drew");
        self.events.push(GameEvent::Drew { player_idx, count });
        Ok(())
    }

    fn exhaust(&mut self) -> GameError {
        let survivors = self.active_players();
        self.finish(Outcome::Exhausted { survivors });
        GameError::EmptyDeck
    }

    /// Returns an eliminated player's cards to the deck and checks whether
    /// that decided the game.
    fn retire(&mut self, player_idx: usize, forfeited: Vec<Card>) {
        let returned = forfeited.len();
        self.deck.add_batch_to_bottom(forfeited);
        self.phase = Phase::Complete;
        info!(player = self.players[player_idx].name(), "Eliminated");
        self.events.push(GameEvent::Eliminated {
            player_idx,
            returned,
        });

        match self.active_players().as_slice() {
            [] => self.finish(Outcome::NoSurvivors),
            [winner] => self.finish(Outcome::Winner {
                player_idx: *winner,
            }),
            _ => {}
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        info!(?outcome, "Game over");
        self.events.push(GameEvent::GameEnded {
            outcome: outcome.clone(),
        });
        self.outcome = Some(outcome);
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;
    use rand::SeedableRng;

    use super::*;
    use crate::{card, DECK_SIZE};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1234)
    }

    fn assert_invariants(game: &Game) {
        assert_eq!(game.cards_in_play(), DECK_SIZE);
        assert!((0..=TARGET_SUM).contains(&game.table_sum()));
        for player in game.players() {
            assert!(player.hand().len() <= HAND_SIZE);
        }
    }

    /// Plays every seat with the default strategy until the game ends or
    /// `max_turns` have passed, checking the invariants after each step.
    fn autoplay(game: &mut Game, max_turns: usize) {
        for _ in 0..max_turns {
            let Some(idx) = game.current_player() else {
                return;
            };
            match game.execute_machine_turn(idx) {
                Ok(_) | Err(GameError::EmptyDeck) => {}
                Err(err) => panic!("unexpected error {err:?}"),
            }
            assert_invariants(game);
            game.advance_turn();
        }
    }

    quickcheck! {
        fn cards_are_conserved_through_a_match(seed: u64, machines: u8) -> bool {
            let machines = 1 + (machines as usize % MAX_MACHINES);
            let mut game = Game::new(machines, StdRng::seed_from_u64(seed)).unwrap();
            assert_invariants(&game);
            autoplay(&mut game, 300);
            game.cards_in_play() == DECK_SIZE
        }

        fn rejected_plays_change_nothing(seed: u64, card: Card) -> bool {
            let mut game = Game::new(2, StdRng::seed_from_u64(seed)).unwrap();
            let before = game.view();
            match game.play_card(0, card) {
                Ok(()) => true,
                Err(_) => game.view() == before,
            }
        }
    }

    #[test]
    fn new_game_deals_four_each_and_opens_the_table() {
        let game = Game::new(1, rng()).unwrap();
        assert_eq!(game.players().len(), 2);
        assert_eq!(game.deck().remaining(), 43);
        assert_eq!(game.table_pile().len(), 1);
        assert!(!game.players()[0].is_machine());
        assert!(game.players()[1].is_machine());
        assert_eq!(game.players()[1].name(), "CPU-1");
        assert_eq!(game.state(), TurnState::AwaitingHumanMove);
        assert_invariants(&game);
    }

    #[test]
    fn machine_count_is_bounded() {
        assert_eq!(Game::new(0, rng()).unwrap_err(), SetupError::MachineCount(0));
        assert_eq!(Game::new(4, rng()).unwrap_err(), SetupError::MachineCount(4));
        let game = Game::new(3, rng()).unwrap();
        assert_eq!(game.deck().remaining(), 52 - 16 - 1);
    }

    #[test]
    fn opening_face_card_counts_as_zero() {
        for seed in 0..200 {
            let game = Game::new(1, StdRng::seed_from_u64(seed)).unwrap();
            let opening = game.table_pile()[0];
            assert_eq!(game.table_sum(), opening.effect(0).max(0));
        }
    }

    #[test]
    fn king_lowers_the_sum() {
        let mut game = Game::arranged(
            vec![vec![card!("K♥"), card!("5♣")], vec![card!("2♦")]],
            vec![card!("10♠")],
            45,
            rng(),
        )
        .unwrap();
        game.execute_human_play(0, card!("K♥")).unwrap();
        assert_eq!(game.table_sum(), 35);
        assert_eq!(game.top_card(), Some(card!("K♥")));
        assert_eq!(game.state(), TurnState::Resolving);
        assert_invariants(&game);
    }

    #[test]
    fn ace_adapts_instead_of_overshooting() {
        let mut game = Game::arranged(
            vec![vec![card!("A♥")], vec![card!("2♦")]],
            vec![card!("10♠")],
            45,
            rng(),
        )
        .unwrap();
        assert!(game.is_valid_move(card!("A♥")));
        game.execute_human_play(0, card!("A♥")).unwrap();
        assert_eq!(game.table_sum(), 46);
    }

    #[test]
    fn illegal_choice_is_rejected_without_elimination() {
        let mut game = Game::arranged(
            vec![vec![card!("8♥"), card!("2♣")], vec![card!("2♦")]],
            vec![card!("10♠")],
            45,
            rng(),
        )
        .unwrap();
        let err = game.execute_human_play(0, card!("8♥")).unwrap_err();
        assert_eq!(
            err,
            GameError::InvalidMove(IllegalMove::ExceedsFifty {
                card: card!("8♥"),
                table_sum: 45,
                new_sum: 53,
            })
        );
        assert!(!game.players()[0].is_eliminated());
        assert_eq!(game.table_sum(), 45);
        assert_eq!(game.state(), TurnState::AwaitingHumanMove);
        game.execute_human_play(0, card!("2♣")).unwrap();
        assert_eq!(game.table_sum(), 47);
    }

    #[test]
    fn face_card_on_a_low_sum_leaves_zero() {
        let mut game = Game::arranged(
            vec![vec![card!("K♥")], vec![card!("2♦")]],
            vec![card!("5♠")],
            5,
            rng(),
        )
        .unwrap();
        assert!(game.is_valid_move(card!("K♥")));
        assert!(game.has_valid_cards(0));
        game.take_events();
        game.execute_human_play(0, card!("K♥")).unwrap();
        assert_eq!(game.table_sum(), 0);
        assert!(!game.players()[0].is_eliminated());
        assert_eq!(
            game.take_events(),
            vec![GameEvent::Played {
                player_idx: 0,
                card: card!("K♥"),
                effect: -5,
                table_sum: 0,
            }]
        );
        assert_invariants(&game);
    }

    #[test]
    fn human_with_no_valid_card_is_eliminated_and_the_machine_wins() {
        let mut game = Game::arranged(
            vec![vec![card!("5♥")], vec![card!("9♦"), card!("K♦")]],
            vec![card!("10♠")],
            50,
            rng(),
        )
        .unwrap();
        assert!(!game.has_valid_cards(0));
        assert!(game.has_valid_cards(1));
        let err = game.execute_human_play(0, card!("5♥")).unwrap_err();
        assert!(matches!(err, GameError::NoValidMove { player_idx: 0, .. }));
        assert!(game.players()[0].is_eliminated());
        assert!(game.players()[0].hand().is_empty());
        assert!(game.is_game_over());
        assert_eq!(game.winner().map(Player::name), Some("CPU-1"));
        assert_eq!(game.state(), TurnState::GameOver);
        assert_invariants(&game);
    }

    #[test]
    fn elimination_with_two_left_keeps_playing() {
        let mut game = Game::arranged(
            vec![
                vec![card!("9♥")],
                vec![card!("5♦"), card!("6♦")],
                vec![card!("9♣")],
            ],
            vec![card!("10♠")],
            50,
            rng(),
        )
        .unwrap();
        game.execute_human_play(0, card!("9♥")).unwrap();
        game.execute_human_draw(0).unwrap();
        game.advance_turn();

        assert_eq!(game.state(), TurnState::AwaitingMachineMove);
        assert_eq!(game.execute_machine_turn(1), Ok(None));
        assert!(game.players()[1].is_eliminated());
        assert!(!game.is_game_over());
        assert_eq!(game.winner(), None);
        assert_invariants(&game);

        game.advance_turn();
        assert_eq!(game.current_player(), Some(2));
        assert_eq!(game.execute_machine_turn(2), Ok(Some(card!("9♣"))));
        game.advance_turn();
        assert_eq!(game.current_player(), Some(0));
        game.advance_turn();
        // The eliminated machine is skipped.
        assert_eq!(game.current_player(), Some(2));
    }

    #[test]
    fn machine_turn_plays_first_fit_and_refills() {
        let mut game = Game::arranged(
            vec![
                vec![card!("2♥")],
                vec![card!("8♦"), card!("3♦"), card!("K♦"), card!("4♦")],
            ],
            vec![card!("10♠")],
            45,
            rng(),
        )
        .unwrap();
        game.execute_human_play(0, card!("2♥")).unwrap();
        game.execute_human_draw(0).unwrap();
        assert_eq!(game.players()[0].hand().len(), HAND_SIZE);
        game.advance_turn();

        assert_eq!(game.execute_machine_turn(1), Ok(Some(card!("3♦"))));
        assert_eq!(game.table_sum(), 50);
        assert_eq!(game.players()[1].hand().len(), HAND_SIZE);
        assert!(game.turn_complete());
        assert_invariants(&game);
    }

    #[test]
    fn turn_order_is_enforced() {
        let mut game = Game::new(2, rng()).unwrap();
        let card = game.players()[1].hand()[0];
        assert_eq!(
            game.play_card(1, card),
            Err(GameError::InvalidMove(IllegalMove::NotPlayersTurn {
                player_idx: 1,
                current_idx: 0,
            }))
        );
        assert_eq!(
            game.execute_machine_turn(7),
            Err(GameError::InvalidMove(IllegalMove::UnknownPlayer {
                player_idx: 7
            }))
        );
        assert_eq!(
            game.execute_human_draw(0),
            Err(GameError::InvalidMove(IllegalMove::MustPlayFirst))
        );
    }

    #[test]
    fn one_play_per_turn() {
        let mut game = Game::arranged(
            vec![vec![card!("2♥"), card!("3♥")], vec![card!("2♦")]],
            vec![card!("10♠")],
            10,
            rng(),
        )
        .unwrap();
        game.execute_human_play(0, card!("2♥")).unwrap();
        assert_eq!(
            game.execute_human_play(0, card!("3♥")),
            Err(GameError::InvalidMove(IllegalMove::AlreadyPlayed))
        );
        game.execute_human_draw(0).unwrap();
        assert_eq!(
            game.execute_human_draw(0),
            Err(GameError::InvalidMove(IllegalMove::TurnComplete))
        );
    }

    #[test]
    fn card_must_be_in_hand() {
        let mut game = Game::arranged(
            vec![vec![card!("2♥")], vec![card!("2♦")]],
            vec![card!("10♠")],
            10,
            rng(),
        )
        .unwrap();
        assert_eq!(
            game.play_card(0, card!("3♣")),
            Err(GameError::InvalidMove(IllegalMove::CardNotInHand {
                card: card!("3♣")
            }))
        );
    }

    #[test]
    fn recycle_keeps_the_top_card() {
        let mut game = Game::arranged(
            vec![vec![card!("2♥")], vec![card!("2♦")]],
            vec![card!("10♠"), card!("9♠"), card!("8♠")],
            27,
            rng(),
        )
        .unwrap();
        let deck_before = game.deck().remaining();
        assert_eq!(game.recycle_deck(), Ok(2));
        assert_eq!(game.table_pile(), &[card!("8♠")]);
        assert_eq!(game.deck().remaining(), deck_before + 2);
        assert_eq!(game.table_sum(), 27);
        assert_eq!(game.recycle_deck(), Err(EmptyDeck));
        assert_invariants(&game);
    }

    #[test]
    fn empty_deck_is_refilled_from_the_table() {
        let mut game = Game::arranged(
            vec![vec![card!("2♥"), card!("3♥")], vec![card!("2♦")]],
            vec![card!("10♠"), card!("9♠"), card!("8♠")],
            20,
            rng(),
        )
        .unwrap();
        // Park the deck on the table so drawing has to recycle.
        let parked: Vec<Card> = game.deck.cards().to_vec();
        game.deck = Deck::from_cards(Vec::new());
        game.table_pile.splice(0..0, parked);

        game.execute_human_play(0, card!("2♥")).unwrap();
        game.execute_human_draw(0).unwrap();
        assert_eq!(game.players()[0].hand().len(), HAND_SIZE);
        assert_eq!(game.table_pile(), &[card!("2♥")]);
        assert!(game
            .take_events()
            .iter()
            .any(|e| matches!(e, GameEvent::Recycled { .. })));
        assert_invariants(&game);
    }

    #[test]
    fn exhausted_deck_ends_in_a_tie() {
        let mut game = Game::arranged(
            vec![vec![card!("2♥"), card!("3♥")], vec![card!("2♦")]],
            vec![],
            20,
            rng(),
        )
        .unwrap();
        game.deck = Deck::from_cards(Vec::new());

        game.execute_human_play(0, card!("2♥")).unwrap();
        assert_eq!(game.execute_human_draw(0), Err(GameError::EmptyDeck));
        assert!(game.is_game_over());
        assert_eq!(game.winner(), None);
        assert_eq!(
            game.outcome(),
            Some(&Outcome::Exhausted {
                survivors: vec![0, 1]
            })
        );
    }

    #[test]
    fn stop_is_idempotent_and_freezes_the_game() {
        let mut game = Game::new(1, rng()).unwrap();
        let card = game.players()[0].hand()[0];
        game.stop();
        game.stop();
        assert_eq!(game.outcome(), Some(&Outcome::Stopped));
        assert_eq!(
            game.play_card(0, card),
            Err(GameError::InvalidMove(IllegalMove::GameOver))
        );
        let ended = game
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameEnded { .. }))
            .count();
        assert_eq!(ended, 1);
        assert_invariants(&game);
    }

    #[test]
    fn arranged_rejects_bad_positions() {
        assert_eq!(
            Game::arranged(
                vec![vec![card!("2♥")], vec![card!("2♥")]],
                vec![],
                0,
                rng()
            )
            .unwrap_err(),
            SetupError::DuplicateCard(card!("2♥"))
        );
        assert_eq!(
            Game::arranged(vec![vec![], vec![]], vec![], 51, rng()).unwrap_err(),
            SetupError::TableSumOutOfRange(51)
        );
        assert_eq!(
            Game::arranged(vec![vec![]], vec![], 0, rng()).unwrap_err(),
            SetupError::MachineCount(0)
        );
    }
}
