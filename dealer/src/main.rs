use std::io::BufRead;
use std::path::PathBuf;

use cincuentazo::{describe_table, Card, GameError, GameEvent, Outcome, TableView, TurnState};
use clap::Parser;
use dealer::{play_auto_match, Decision, MatchConfig, Session, SessionUpdate, Tally};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
struct Args {
    /// Path to a JSON match config. Flags given on the command line win.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of machine opponents (1 to 3)
    #[arg(short, long)]
    machines: Option<usize>,

    /// Name of the human player
    #[arg(long)]
    name: Option<String>,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Fixed machine think time in milliseconds
    #[arg(long)]
    think_ms: Option<u64>,

    /// Let the first-valid-card strategy play the human seat too
    #[arg(short, long, default_value_t = false)]
    autoplay: bool,

    /// How many games to play with --autoplay
    #[arg(short, long, default_value_t = 1)]
    num_games: usize,

    /// Print events as JSON lines instead of text
    #[arg(long, default_value_t = false)]
    json_events: bool,

    /// A log level among "off", "error", "warn", "info", "debug", "trace"
    #[arg(short, long, default_value = "warn")]
    log_level: LevelFilter,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    initialize_logging(args.log_level);

    let mut config = match &args.config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    if let Some(machines) = args.machines {
        config.machines = machines;
    }
    if let Some(name) = &args.name {
        config.human_name = name.clone();
    }
    if let Some(think_ms) = args.think_ms {
        config = config.with_think_ms(think_ms);
    }

    // Get a random seed
    let seed = args.seed.or(config.seed).unwrap_or_else(rand::random);
    info!(seed);
    config.seed = Some(seed);
    config.validate()?;

    if args.autoplay {
        run_autoplay(&config, args.num_games, args.json_events)
    } else {
        run_interactive(&config, args.json_events)
    }
}

fn run_autoplay(config: &MatchConfig, num_games: usize, json_events: bool) -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or_default());
    let mut tally = Tally::new(config.machines + 1);
    let mut names = Vec::new();

    for game_idx in 0..num_games {
        let result = play_auto_match(config, &mut rng)?;
        names = result
            .view
            .players
            .iter()
            .map(|p| p.name.clone())
            .collect();
        if num_games == 1 {
            for event in &result.events {
                print_event(event, &names, json_events)?;
            }
        }
        debug!(game_idx, turns = result.turns, outcome = ?result.outcome);
        tally.record(&result.outcome);
    }

    eprintln!("End result after {} games:", tally.games());
    for (name, wins) in names.iter().zip(&tally.wins) {
        eprintln!("- {} wins by {}", wins, name);
    }
    eprintln!("- {} ties", tally.ties);
    if tally.no_survivors > 0 {
        eprintln!("- {} without survivors", tally.no_survivors);
    }
    if tally.stopped > 0 {
        eprintln!("- {} stopped", tally.stopped);
    }
    Ok(())
}

fn run_interactive(config: &MatchConfig, json_events: bool) -> anyhow::Result<()> {
    let (handle, updates) = Session::start(config)?;
    let names: Vec<String> = handle
        .snapshot()
        .players
        .into_iter()
        .map(|p| p.name)
        .collect();
    let mut lines = std::io::stdin().lock().lines();

    for update in updates {
        match update {
            SessionUpdate::Event(event) => print_event(&event, &names, json_events)?,
            SessionUpdate::AwaitingHuman(view) => {
                println!("{}", describe_table(&view));
                if view.state == TurnState::Resolving {
                    println!("Draw your replacement card with 'd'.");
                } else {
                    println!("Play a card by number or name (e.g. 2 or 10♣), 'q' to quit.");
                }
                loop {
                    let Some(line) = lines.next().transpose()? else {
                        handle.stop();
                        break;
                    };
                    match parse_input(line.trim(), &view) {
                        Ok(Some(decision)) => {
                            handle.submit(decision)?;
                            break;
                        }
                        Ok(None) => {
                            handle.stop();
                            break;
                        }
                        Err(msg) => println!("{}", msg),
                    }
                }
            }
            // Already reported through the elimination event.
            SessionUpdate::Rejected(GameError::NoValidMove { .. }) => {}
            SessionUpdate::Rejected(err) => {
                println!("Not allowed: {}", err);
                print_error_chain(&err);
            }
            SessionUpdate::Finished(view) => {
                println!("{}", describe_table(&view));
                break;
            }
        }
    }

    handle.join()
}

/// `Ok(None)` means the human wants to quit.
fn parse_input(input: &str, view: &TableView) -> Result<Option<Decision>, String> {
    match input.to_lowercase().as_str() {
        "q" | "quit" => return Ok(None),
        "d" | "draw" => return Ok(Some(Decision::Draw)),
        _ => {}
    }
    if let Ok(number) = input.parse::<usize>() {
        let hand = view.current().map(|p| p.hand.as_slice()).unwrap_or(&[]);
        return match number.checked_sub(1).and_then(|i| hand.get(i)) {
            Some(&card) => Ok(Some(Decision::Play(card))),
            None => Err(format!("There is no card number {} in your hand", number)),
        };
    }
    input
        .parse::<Card>()
        .map(|card| Some(Decision::Play(card)))
        .map_err(|err| format!("Could not read '{}': {}", input, err))
}

fn print_event(event: &GameEvent, names: &[String], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    let name = |idx: &usize| names.get(*idx).map(String::as_str).unwrap_or("?");
    match event {
        GameEvent::OpeningCard { card, table_sum } => {
            println!("The table opens with {} ({})", card, table_sum)
        }
        GameEvent::Played {
            player_idx,
            card,
            effect,
            table_sum,
        } => println!(
            "{} plays {} ({:+}) -> {}",
            name(player_idx),
            card,
            effect,
            table_sum
        ),
        GameEvent::Drew { player_idx, count } => {
            println!("{} draws {}", name(player_idx), count)
        }
        GameEvent::Recycled {
            returned,
            deck_remaining,
        } => println!(
            "{} cards go back into the deck, {} left",
            returned, deck_remaining
        ),
        GameEvent::Eliminated { player_idx, .. } => {
            println!("{} has no valid card and is out", name(player_idx))
        }
        GameEvent::TurnPassed { player_idx } => debug!(player = name(player_idx), "Turn"),
        GameEvent::GameEnded { outcome } => match outcome {
            Outcome::Winner { player_idx } => println!("{} wins!", name(player_idx)),
            Outcome::Exhausted { survivors } => {
                let survivors: Vec<&str> = survivors.iter().map(name).collect();
                println!("The deck is exhausted, tie between {}", survivors.join(", "))
            }
            Outcome::NoSurvivors => println!("Nobody is left"),
            Outcome::Stopped => println!("Game stopped"),
        },
    }
    Ok(())
}

fn print_error_chain(err: &dyn std::error::Error) {
    let mut err_dyn = err;
    while let Some(src_err) = err_dyn.source() {
        println!("  caused by: {}", src_err);
        err_dyn = src_err;
    }
}

fn initialize_logging(level: LevelFilter) {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();

    let filter = Targets::new().with_default(level);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
