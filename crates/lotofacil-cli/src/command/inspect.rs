use std::path::PathBuf;

use lotofacil_engine::snapshot::Snapshot;

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct InspectArg {
    /// Snapshot file written by `simulate --output`
    #[arg(long)]
    snapshot: PathBuf,
}

pub(crate) fn run(arg: &InspectArg) -> anyhow::Result<()> {
    let InspectArg { snapshot: path } = arg;
    let snapshot: Snapshot = util::read_json_file("snapshot", path)?;

    println!("Snapshot: {}", path.display());
    if let Some(version) = snapshot.version {
        println!("  Version:      {version}");
    }
    if let Some(saved_at) = snapshot.saved_at {
        println!("  Saved at:     {}", saved_at.to_rfc3339());
    }
    println!("  Generation:   {}", display_opt(snapshot.generation));
    println!("  Tick index:   {}", display_opt(snapshot.tick_index));
    println!("  Best score:   {}", display_opt(snapshot.best_score));
    match &snapshot.historical_draws {
        Some(draws) => {
            println!("  Draws:        {}", draws.len());
            if let (Some(first), Some(last)) = (draws.first(), draws.last()) {
                println!(
                    "                contests {}..={} ({} to {})",
                    first.contest_index(),
                    last.contest_index(),
                    first.date(),
                    last.date()
                );
            }
        }
        None => println!("  Draws:        -"),
    }

    let Some(architecture) = snapshot.model_architecture else {
        println!("  Model:        missing");
        return Ok(());
    };
    let layout = architecture.layout();
    println!("  Model:        {}", architecture.kind());
    println!(
        "    Layout:     {} steps x {} features -> {} hidden -> {} outputs",
        layout.steps, layout.features, layout.hidden, layout.outputs
    );
    println!("    Learning:   {}", layout.learning_rate);

    let expected = architecture.tensor_lengths();
    println!("    Tensors:");
    for (i, expected_len) in expected.iter().enumerate() {
        let found = snapshot
            .model_weights
            .get(i)
            .map_or_else(|| "missing".to_owned(), |w| w.len().to_string());
        println!("      {i}: {found} / {expected_len}");
    }
    match snapshot.restore_model() {
        Ok(_) => println!("    Weights:    ok"),
        Err(err) => println!("    Weights:    {err}"),
    }
    Ok(())
}

fn display_opt<T>(value: Option<T>) -> String
where
    T: ToString,
{
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}
