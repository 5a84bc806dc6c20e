use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use cincuentazo::{Card, Game, GameError, GameEvent, IllegalMove, TableView, TurnState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::MatchConfig;

/// What the human decided on their turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Play(Card),
    /// Take the replacement card, which ends the turn.
    Draw,
}

/// Sent from a running session to its collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionUpdate {
    Event(GameEvent),
    /// It is the human's move. The session does nothing else until it
    /// receives a [`Decision`] or is stopped.
    AwaitingHuman(TableView),
    /// The last decision was not accepted.
    Rejected(GameError),
    /// The session is over and will send nothing else.
    Finished(TableView),
}

enum Command {
    Decide(Decision),
    Stop,
}

/// A match running on its own thread.
///
/// Machine turns happen on that thread without any input. On the human's
/// turn the thread blocks until [`SessionHandle::submit()`] delivers their
/// decision. Dropping the handle stops the session.
pub struct SessionHandle {
    commands: Sender<Command>,
    stopped: Arc<AtomicBool>,
    game: Arc<Mutex<Game>>,
    driver: Option<JoinHandle<()>>,
}

pub struct Session;

impl Session {
    /// Deals a new game according to `config` and starts playing it.
    pub fn start(config: &MatchConfig) -> anyhow::Result<(SessionHandle, Receiver<SessionUpdate>)> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let game = Game::with_human_name(
            &config.human_name,
            config.machines,
            StdRng::from_rng(&mut rng)?,
        )?;
        info!(seed, machines = config.machines, "Session started");
        Ok(Self::with_game(game, config.clone(), rng))
    }

    /// Plays an already set up game. `rng` only paces the machines.
    pub fn with_game(
        game: Game,
        config: MatchConfig,
        rng: StdRng,
    ) -> (SessionHandle, Receiver<SessionUpdate>) {
        let (command_tx, command_rx) = mpsc::channel();
        let (update_tx, update_rx) = mpsc::channel();
        let stopped = Arc::new(AtomicBool::new(false));
        let game = Arc::new(Mutex::new(game));

        let driver = Driver {
            game: Arc::clone(&game),
            commands: command_rx,
            updates: update_tx,
            stopped: Arc::clone(&stopped),
            config,
            rng,
        };
        let driver = thread::spawn(move || driver.run());

        let handle = SessionHandle {
            commands: command_tx,
            stopped,
            game,
            driver: Some(driver),
        };
        (handle, update_rx)
    }
}

impl SessionHandle {
    /// Hands the human's decision to the waiting session.
    pub fn submit(&self, decision: Decision) -> anyhow::Result<()> {
        self.commands
            .send(Command::Decide(decision))
            .map_err(|_| anyhow::anyhow!("The session has already finished"))
    }

    pub fn play(&self, card: Card) -> anyhow::Result<()> {
        self.submit(Decision::Play(card))
    }

    pub fn draw(&self) -> anyhow::Result<()> {
        self.submit(Decision::Draw)
    }

    /// Stops the session before its next turn. Calling it again has no effect.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            // The driver may already have exited, in which case there is nobody to wake.
            let _ = self.commands.send(Command::Stop);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// The current state of the table.
    pub fn snapshot(&self) -> TableView {
        lock(&self.game).view()
    }

    /// Waits for the session thread to exit.
    pub fn join(mut self) -> anyhow::Result<()> {
        match self.driver.take() {
            Some(driver) => driver
                .join()
                .map_err(|_| anyhow::anyhow!("The session thread panicked")),
            None => Ok(()),
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop();
        if let Some(driver) = self.driver.take() {
            let _ = driver.join();
        }
    }
}

fn lock(game: &Mutex<Game>) -> MutexGuard<'_, Game> {
    // Game operations leave the game consistent at every return, so a
    // panic elsewhere does not make it unusable.
    game.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The session thread. It is the only writer of the game.
struct Driver {
    game: Arc<Mutex<Game>>,
    commands: Receiver<Command>,
    updates: Sender<SessionUpdate>,
    stopped: Arc<AtomicBool>,
    config: MatchConfig,
    rng: StdRng,
}

impl Driver {
    fn run(mut self) {
        self.forward_events();
        while self.step().is_continue() {}

        let view = {
            let mut game = lock(&self.game);
            // Whatever ended the loop, no further turn may happen.
            game.stop();
            game.view()
        };
        self.forward_events();
        debug!(outcome = ?view.outcome, "Session finished");
        self.send(SessionUpdate::Finished(view));
    }

    fn step(&mut self) -> ControlFlow<()> {
        if self.stopped.load(Ordering::SeqCst) {
            return ControlFlow::Break(());
        }
        let (player_idx, state, turn_complete) = {
            let game = lock(&self.game);
            match game.current_player() {
                Some(idx) => (idx, game.state(), game.turn_complete()),
                None => return ControlFlow::Break(()),
            }
        };

        let flow = match state {
            TurnState::Resolving if turn_complete => {
                lock(&self.game).advance_turn();
                ControlFlow::Continue(())
            }
            TurnState::AwaitingMachineMove => self.machine_turn(player_idx),
            TurnState::AwaitingHumanMove | TurnState::Resolving => self.human_step(player_idx),
            TurnState::GameOver => ControlFlow::Break(()),
        };
        self.forward_events();
        flow
    }

    /// Waits out the machine's think time, then plays its turn. Only a stop
    /// cuts the wait short; stray decisions are rejected and the wait goes on
    /// until the same deadline.
    fn machine_turn(&mut self, player_idx: usize) -> ControlFlow<()> {
        let deadline = Instant::now() + self.config.think_time(&mut self.rng);
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.commands.recv_timeout(remaining) {
                Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => {
                    return ControlFlow::Break(())
                }
                Ok(Command::Decide(decision)) => {
                    debug!(?decision, "Decision arrived during a machine turn");
                    self.reject_during_machine_turn(player_idx);
                }
                Err(RecvTimeoutError::Timeout) => break,
            }
        }

        let mut game = lock(&self.game);
        match game.execute_machine_turn(player_idx) {
            Ok(Some(card)) => trace!(player_idx, %card, "Machine played"),
            Ok(None) => trace!(player_idx, "Machine was eliminated"),
            Err(err) => warn!(player_idx, %err, "Machine turn ended the game"),
        }
        game.advance_turn();
        ControlFlow::Continue(())
    }

    fn reject_during_machine_turn(&self, current_idx: usize) {
        let human_idx = {
            let game = lock(&self.game);
            game.players().iter().position(|p| !p.is_machine())
        };
        self.send(SessionUpdate::Rejected(GameError::InvalidMove(
            IllegalMove::NotPlayersTurn {
                player_idx: human_idx.unwrap_or(current_idx),
                current_idx,
            },
        )));
    }

    /// Waits for one decision from the human and applies it.
    fn human_step(&mut self, player_idx: usize) -> ControlFlow<()> {
        let view = lock(&self.game).view();
        self.send(SessionUpdate::AwaitingHuman(view));

        let decision = match self.commands.recv() {
            Ok(Command::Decide(decision)) => decision,
            Ok(Command::Stop) | Err(_) => return ControlFlow::Break(()),
        };
        trace!(?decision, "Human decided");

        let mut game = lock(&self.game);
        let result = match decision {
            Decision::Play(card) => game.execute_human_play(player_idx, card),
            Decision::Draw => game.execute_human_draw(player_idx),
        };
        if game.turn_complete() {
            game.advance_turn();
        }
        drop(game);

        if let Err(err) = result {
            debug!(%err, "Decision rejected");
            self.send(SessionUpdate::Rejected(err));
        }
        ControlFlow::Continue(())
    }

    fn forward_events(&mut self) {
        let events = lock(&self.game).take_events();
        for event in events {
            self.send(SessionUpdate::Event(event));
        }
    }

    fn send(&self, update: SessionUpdate) {
        if self.updates.send(update).is_err() {
            trace!("Nobody is listening for session updates");
        }
    }
}
