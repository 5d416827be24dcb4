use clap::{Parser, Subcommand};

use self::{inspect::InspectArg, simulate::SimulateArg, stats::StatsArg, train::TrainArg};

mod inspect;
mod simulate;
mod stats;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Run the predictor population over a draw history
    Simulate(#[clap(flatten)] SimulateArg),
    /// Pre-train one model over a draw history and save it
    Train(#[clap(flatten)] TrainArg),
    /// Print the contents of a saved snapshot
    Inspect(#[clap(flatten)] InspectArg),
    /// Print number frequencies over a draw history
    Stats(#[clap(flatten)] StatsArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Inspect(arg) => inspect::run(&arg)?,
        Mode::Stats(arg) => stats::run(&arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_train_and_simulate_flags() {
        let args = CommandArgs::try_parse_from([
            "lotofacil", "train", "--draws", "d.csv", "--epochs", "5", "--model", "dense",
        ])
        .unwrap();
        assert!(matches!(args.mode, Mode::Train(_)));

        let args = CommandArgs::try_parse_from([
            "lotofacil",
            "simulate",
            "--draws",
            "d.csv",
            "--initial-model",
            "m.json",
            "--reward",
            "bonus",
        ])
        .unwrap();
        assert!(matches!(args.mode, Mode::Simulate(_)));

        assert!(CommandArgs::try_parse_from(["lotofacil", "simulate", "--reward", "x"]).is_err());
    }
}
