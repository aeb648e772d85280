//! Runner entry: parse CLI options, read the map file, build one
//! punter host per command line, and hand everything to the arena driver.

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use lambda_punter_arena::arena::Arena;
use lambda_punter_arena::error::ArenaError;
use lambda_punter_arena::host::PunterHost;
use lambda_punter_arena::map::MapJson;
use lambda_punter_arena::options::{Cli, Options};

fn run() -> Result<(), ArenaError> {
    let cli = Cli::parse();
    let options = Options::try_from(cli)?;

    env_logger::Builder::new()
        .filter_level(options.log_level.to_filter())
        .init();

    log::info!("reading map from {}", options.map_path.display());
    let map_text = fs::read_to_string(&options.map_path).map_err(ArenaError::Io)?;
    let raw_map: MapJson =
        serde_json::from_str(&map_text).map_err(|e| ArenaError::MapSchema {
            detail: e.to_string(),
        })?;

    let hosts: Vec<PunterHost> = options
        .commands
        .iter()
        .enumerate()
        .map(|(id, command)| {
            PunterHost::new(
                command.clone(),
                id as u64,
                options.persistent,
                options.feature_negotiation,
            )
        })
        .collect();

    log::info!("{} punters joined", hosts.len());

    let mut arena = Arena::new(raw_map, hosts, &options)?;
    let report = arena.run()?;

    println!("{}", serde_json::to_string(&report).expect("report serializes"));
    log::info!("match complete: scores={:?}", report.scores);
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("referee: {e}");
            ExitCode::FAILURE
        }
    }
}
