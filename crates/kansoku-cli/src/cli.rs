use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use kansoku_core::StrategyKind;

#[derive(Debug, Parser)]
#[command(
    name = "kansoku",
    version,
    about = "Detect the episode being watched and update show progress"
)]
pub struct Cli {
    /// Config file to use instead of the per-user one.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Show list file (`[[show]]` tables).
    #[arg(long)]
    pub shows: Option<PathBuf>,

    /// Observation backend.
    #[arg(long, value_enum, default_value_t = StrategyArg::Auto)]
    pub strategy: StrategyArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Auto,
    Polling,
    FsEvents,
    MediaServer,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Auto => Self::Auto,
            StrategyArg::Polling => Self::Polling,
            StrategyArg::FsEvents => Self::FsEvents,
            StrategyArg::MediaServer => Self::MediaServer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let cli = Cli::parse_from(["kansoku", "--strategy", "fs-events", "--shows", "/tmp/shows.toml"]);
        assert_eq!(cli.strategy, StrategyArg::FsEvents);
        assert_eq!(cli.shows, Some(PathBuf::from("/tmp/shows.toml")));
        assert!(cli.config.is_none());
        assert_eq!(StrategyKind::from(cli.strategy), StrategyKind::FsEvents);
    }

    #[test]
    fn test_default_strategy_is_auto() {
        let cli = Cli::parse_from(["kansoku"]);
        assert_eq!(cli.strategy, StrategyArg::Auto);
    }
}
