use std::path::PathBuf;

use anyhow::Context as _;
use lotofacil_engine::{config::SimulationConfig, features::SystemClock, pretraining};
use lotofacil_model::{ModelKind, pretrain::PretrainConfig};

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Draw history CSV export
    #[arg(long)]
    draws: PathBuf,
    /// JSON simulation config file; decides the model architecture
    #[arg(long)]
    config: Option<PathBuf>,
    /// dense or recurrent
    #[arg(long)]
    model: Option<ModelKind>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = PretrainConfig::default().epochs)]
    epochs: usize,
    #[arg(long, default_value_t = PretrainConfig::default().batch_size)]
    batch_size: usize,
    /// Fraction of the latest draws held out for validation
    #[arg(long, default_value_t = PretrainConfig::default().validation_split)]
    validation_split: f32,
    /// Epochs without validation improvement before stopping
    #[arg(long, default_value_t = PretrainConfig::default().patience)]
    patience: usize,
    /// Model output file [default: stdout]
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let config = build_config(arg)?;
    let feed = util::read_draws_file(&arg.draws)?;
    eprintln!("Loaded {} draws from {}", feed.len(), arg.draws.display());

    let pretrain = PretrainConfig {
        epochs: arg.epochs,
        batch_size: arg.batch_size,
        validation_split: arg.validation_split,
        patience: arg.patience,
    };
    let (model, report) = pretraining::pretrain_model(&config, &feed, &pretrain, &SystemClock)
        .context("Failed to train model")?;

    for record in &report.history {
        match record.val_loss {
            Some(val_loss) => eprintln!(
                "Epoch {:3}: loss {:.5}, val_loss {:.5}",
                record.epoch, record.loss, val_loss
            ),
            None => eprintln!("Epoch {:3}: loss {:.5}", record.epoch, record.loss),
        }
    }
    if report.stopped_early {
        eprintln!("Stopped early after {} epochs", report.history.len());
    }
    match report.best() {
        Some(best) => eprintln!(
            "Kept weights of epoch {} (monitored loss {:.5})",
            best.epoch,
            best.monitored()
        ),
        None => eprintln!("No epoch improved on the initial weights"),
    }

    let mut output = Output::from_output_path(arg.output.clone())?;
    output.write_json(&model.snapshot())?;
    eprintln!("Saved model to {}", output.display_path());
    Ok(())
}

fn build_config(arg: &TrainArg) -> anyhow::Result<SimulationConfig> {
    let mut config = match &arg.config {
        Some(path) => util::read_json_file("config", path)?,
        None => SimulationConfig::default(),
    };
    if let Some(model) = arg.model {
        config.model = model;
    }
    if let Some(seed) = arg.seed {
        config.seed = Some(seed);
    }
    config.validate().context("Invalid simulation config")?;
    Ok(config)
}
