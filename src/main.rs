//! Nova Barrage headless runner
//!
//! Plays the stock campaign with the autopilot and prints every finished game
//! as a JSON line on stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use nova_barrage::autopilot::Autopilot;
use nova_barrage::render::NullRenderer;
use nova_barrage::sim::{Game, GameEvent, GameResult};
use nova_barrage::{EngineError, Settings};

#[derive(Parser, Debug)]
#[command(name = "nova-barrage")]
#[command(about = "Run the arcade shooter engine unattended and report game results")]
struct Cli {
    /// RNG seed (overrides the settings file)
    #[arg(long)]
    seed: Option<u64>,
    /// Number of frames to simulate
    #[arg(long, default_value_t = 36_000)]
    ticks: u64,
    /// JSON settings file; defaults are used when omitted
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn run(cli: &Cli) -> Result<Vec<GameResult>, EngineError> {
    let mut settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }

    let mut autopilot = Autopilot::new(settings.dimensions);
    let mut game = Game::new(settings)?;
    let mut renderer = NullRenderer;
    let mut results = Vec::new();

    game.start();
    for tick in 1..=cli.ticks {
        let keys = autopilot.keys(&game.snapshot());
        game.frame(tick, keys, &mut renderer)?;
        for event in game.drain_events() {
            match event {
                GameEvent::GameOver(result) => {
                    print_result(&result);
                    results.push(result);
                }
                GameEvent::LevelCompleted { level, timed_out } => {
                    log::debug!("tick {tick}: level {level} done (timed out: {timed_out})");
                }
                _ => {}
            }
        }
    }

    let unfinished = GameResult::from_game(&game.snapshot().game);
    log::info!(
        "stopped after {} ticks mid-game at level {} with score {}",
        cli.ticks,
        unfinished.level,
        unfinished.score
    );
    Ok(results)
}

fn print_result(result: &GameResult) {
    match serde_json::to_string(result) {
        Ok(json) => println!("{json}"),
        Err(e) => log::warn!("could not encode result: {e}"),
    }
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let cli = Cli::parse();
    log::info!("Nova Barrage starting ({} ticks)", cli.ticks);

    match run(&cli) {
        Ok(results) => {
            log::info!("{} game(s) finished", results.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
