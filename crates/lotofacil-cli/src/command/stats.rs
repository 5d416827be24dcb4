use std::path::PathBuf;

use lotofacil_engine::statistics::Statistics;

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct StatsArg {
    /// Draw history CSV export
    #[arg(long)]
    draws: PathBuf,
    /// Number of hot numbers to list
    #[arg(long, default_value_t = 5)]
    hot: usize,
    /// Moving average window
    #[arg(long, default_value_t = 6)]
    window: usize,
}

pub(crate) fn run(arg: &StatsArg) -> anyhow::Result<()> {
    let StatsArg { draws, hot, window } = arg;
    let feed = util::read_draws_file(draws)?;
    let stats = Statistics::update(feed.draws(), *hot, *window);
    let frequency = stats.frequency();

    println!("Draws: {}", feed.len());
    println!("Frequency:");
    #[expect(clippy::cast_precision_loss)]
    let total = frequency.total() as f64;
    for (number, count) in frequency.iter() {
        let share = if total > 0.0 { f64::from(count) / total } else { 0.0 };
        println!("  {number:2}: {count:5} ({:5.2}%)", share * 100.0);
    }
    println!("Hot numbers: {:?}", stats.hot_numbers());
    if let Some(latest) = stats.moving_average().last() {
        println!("Latest moving average (window {window}): {latest:.2?}");
    }
    Ok(())
}
