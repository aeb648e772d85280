//! Typed match options, threaded explicitly through the arena and the
//! punter hosts instead of read from process-wide globals.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::{ArenaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// The `log` crate has no level above `Error`; `critical` (kept for
    /// compatibility with the original Python `logging` module's level
    /// names) filters the same as `error`.
    pub fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Error | LogLevel::Critical => log::LevelFilter::Error,
        }
    }
}

/// Default command list used when `--commands` is not given; a smoke-test
/// roster of the two bundled demo punters.
fn default_commands() -> Vec<Vec<String>> {
    vec![
        vec!["target/debug/pass_bot".to_string()],
        vec!["target/debug/pass_bot".to_string()],
    ]
}

#[derive(Parser, Debug)]
#[command(name = "referee", about = "Offline referee for a graph-claiming contest")]
pub struct Cli {
    /// Path to a map JSON file.
    #[arg(long)]
    pub map: PathBuf,

    /// JSON array of argv arrays, one per punter. Defaults to a smoke-test
    /// roster of the bundled demo punters when omitted.
    #[arg(long)]
    pub commands: Option<String>,

    /// Reuse one child process per punter for the whole match.
    #[arg(long)]
    pub persistent: bool,

    /// Retain full punter messages (minus state) in the move log.
    #[arg(long)]
    pub include_state: bool,

    /// Annotate each move log entry with elapsed milliseconds.
    #[arg(long)]
    pub include_time: bool,

    /// On conflict, attach the original claim as `cause`.
    #[arg(long)]
    pub include_cause: bool,

    /// Downgrade `--persistent` children to one-shot when they do not
    /// advertise persistent-mode support.
    #[arg(long)]
    pub feature_negotiation: bool,

    /// Compute and log provisional scores after every turn.
    #[arg(long)]
    pub log_score_every_step: bool,

    /// Disable the futures extension (enabled by default).
    #[arg(long)]
    pub no_futures: bool,

    #[arg(long = "log-level", value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub map_path: PathBuf,
    pub commands: Vec<Vec<String>>,
    pub persistent: bool,
    pub include_state: bool,
    pub include_time: bool,
    pub include_cause: bool,
    pub feature_negotiation: bool,
    pub log_score_every_step: bool,
    pub log_level: LogLevel,
    pub futures: bool,
}

impl TryFrom<Cli> for Options {
    type Error = ArenaError;

    fn try_from(cli: Cli) -> Result<Self> {
        let commands = match cli.commands {
            Some(json) => serde_json::from_str(&json).map_err(|e| ArenaError::MapSchema {
                detail: format!("--commands is not a JSON array of argv arrays: {e}"),
            })?,
            None => default_commands(),
        };

        Ok(Options {
            map_path: cli.map,
            commands,
            persistent: cli.persistent,
            include_state: cli.include_state,
            include_time: cli.include_time,
            include_cause: cli.include_cause,
            feature_negotiation: cli.feature_negotiation,
            log_score_every_step: cli.log_score_every_step,
            log_level: cli.log_level,
            futures: !cli.no_futures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_commands_used_when_absent() {
        let cli = Cli::try_parse_from(["referee", "--map", "map.json"]).unwrap();
        let options = Options::try_from(cli).unwrap();
        assert_eq!(options.commands.len(), 2);
        assert!(options.futures);
    }

    #[test]
    fn parses_explicit_commands_and_flags() {
        let cli = Cli::try_parse_from([
            "referee",
            "--map",
            "map.json",
            "--commands",
            r#"[["./a"],["./b","--x"]]"#,
            "--persistent",
            "--include-time",
            "--no-futures",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let options = Options::try_from(cli).unwrap();
        assert_eq!(
            options.commands,
            vec![vec!["./a".to_string()], vec!["./b".to_string(), "--x".to_string()]]
        );
        assert!(options.persistent);
        assert!(options.include_time);
        assert!(!options.futures);
        assert_eq!(options.log_level.to_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn critical_maps_to_error_filter() {
        assert_eq!(LogLevel::Critical.to_filter(), log::LevelFilter::Error);
    }
}
