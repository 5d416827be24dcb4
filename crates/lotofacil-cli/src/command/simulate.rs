use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, mpsc},
    time::Duration,
};

use anyhow::{Context as _, anyhow, bail};
use lotofacil_engine::{
    Simulation, TickReport,
    config::SimulationConfig,
    evolution::CloneScore,
    reward::RewardKind,
    scheduler::{Scheduler, SchedulerExit},
    snapshot::Snapshot,
    trainer::TrainingTarget,
};
use lotofacil_model::{ModelKind, ModelSnapshot};
use lotofacil_stats::descriptive::DescriptiveStats;

use crate::util::{self, JsonLinesSink, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Draw history CSV export
    #[arg(long)]
    draws: PathBuf,
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Snapshot to resume from
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Model file written by `train`; every agent starts from its weights
    #[arg(long)]
    initial_model: Option<PathBuf>,
    /// Number of full passes over the draws
    #[arg(long, default_value_t = 1)]
    generations: usize,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    population: Option<usize>,
    /// strict, bonus, exponential or penalized
    #[arg(long)]
    reward: Option<RewardKind>,
    /// dense or recurrent
    #[arg(long)]
    model: Option<ModelKind>,
    /// actual or prediction
    #[arg(long)]
    target: Option<TrainingTarget>,
    /// Keep ticking across generation boundaries
    #[arg(long)]
    infinite: bool,
    /// Replace the population with the best agent after each generation
    #[arg(long)]
    clone_best: bool,
    /// Starting score of cloned agents: reset or inherit
    #[arg(long)]
    clone_score: Option<CloneScore>,
    /// Tick on a background scheduler at this interval instead of as fast as possible
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Snapshot output file
    #[arg(long)]
    output: Option<PathBuf>,
    /// Score history output file
    #[arg(long)]
    history: Option<PathBuf>,
    /// Prediction telemetry output file (JSON lines)
    #[arg(long)]
    telemetry: Option<PathBuf>,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let config = build_config(arg)?;
    let feed = util::read_draws_file(&arg.draws)?;
    eprintln!("Loaded {} draws from {}", feed.len(), arg.draws.display());

    let mut simulation = Simulation::new(config, feed).context("Failed to create simulation")?;
    if let Some(path) = &arg.initial_model {
        let model: ModelSnapshot = util::read_json_file("model", path)?;
        let model = model
            .restore()
            .with_context(|| format!("Failed to rebuild model: {}", path.display()))?;
        simulation = simulation
            .with_initial_model(model.as_ref())
            .with_context(|| format!("Failed to seed population from {}", path.display()))?;
        eprintln!("Seeded population from {}", path.display());
    }
    if let Some(path) = &arg.snapshot {
        let snapshot: Snapshot = util::read_json_file("snapshot", path)?;
        simulation
            .restore(&snapshot)
            .with_context(|| format!("Failed to restore snapshot: {}", path.display()))?;
        eprintln!(
            "Resumed from {} at generation {}, tick {}",
            path.display(),
            simulation.state().generation(),
            simulation.state().tick_index()
        );
    }
    if let Some(path) = &arg.telemetry {
        let sink = JsonLinesSink::create(path.clone())?;
        simulation.set_telemetry_sink(Some(Box::new(sink)));
    }

    let mut simulation = match arg.interval_ms {
        Some(ms) => run_scheduled(simulation, Duration::from_millis(ms), arg)?,
        None => {
            run_inline(&mut simulation, arg)?;
            simulation
        }
    };
    simulation.stop();
    simulation.set_telemetry_sink(None);

    if let Some(best) = simulation.best_agent() {
        eprintln!(
            "Best agent: #{} with score {:.3} (now at generation {}, tick {})",
            best.id(),
            best.score(),
            simulation.state().generation(),
            simulation.state().tick_index()
        );
    }
    if let Some(path) = &arg.output {
        let snapshot = simulation.save().context("Failed to capture snapshot")?;
        Output::save_json(&snapshot, Some(path.clone()))?;
        eprintln!("Saved snapshot to {}", path.display());
    }
    if let Some(path) = &arg.history {
        Output::save_json(&simulation.history(), Some(path.clone()))?;
        eprintln!(
            "Saved {} history rows to {}",
            simulation.history().len(),
            path.display()
        );
    }
    Ok(())
}

fn build_config(arg: &SimulateArg) -> anyhow::Result<SimulationConfig> {
    let config = match &arg.config {
        Some(path) => util::read_json_file("config", path)?,
        None => SimulationConfig::default(),
    };
    let config = apply_overrides(config, arg);
    config.validate().context("Invalid simulation config")?;
    Ok(config)
}

/// Flags win over the config file, except `--infinite`, which can only turn
/// infinite mode on.
fn apply_overrides(mut config: SimulationConfig, arg: &SimulateArg) -> SimulationConfig {
    if let Some(seed) = arg.seed {
        config.seed = Some(seed);
    }
    if let Some(population) = arg.population {
        config.population_size = population;
    }
    if let Some(reward) = arg.reward {
        config.reward = reward;
    }
    if let Some(model) = arg.model {
        config.model = model;
    }
    if let Some(target) = arg.target {
        config.training_target = target;
    }
    if let Some(clone_score) = arg.clone_score {
        config.clone_score = clone_score;
    }
    config.infinite_mode |= arg.infinite;
    config
}

fn run_inline(simulation: &mut Simulation, arg: &SimulateArg) -> anyhow::Result<()> {
    let mut tally = GenerationTally::default();
    let mut completed = 0;
    simulation.start();
    while completed < arg.generations {
        let report = simulation.tick()?;
        tally.add(&report);
        if report.generation_completed {
            completed += 1;
            finish_generation(simulation, &mut tally, arg.clone_best)?;
            simulation.resume();
        }
    }
    Ok(())
}

fn run_scheduled(
    simulation: Simulation,
    interval: Duration,
    arg: &SimulateArg,
) -> anyhow::Result<Simulation> {
    let simulation = Arc::new(Mutex::new(simulation));
    lock(&simulation)?.start();

    let (report_tx, report_rx) = mpsc::channel();
    let scheduler = Scheduler::spawn(Arc::clone(&simulation), interval, move |report| {
        // The receiver only goes away once enough generations completed.
        let _ = report_tx.send(report.clone());
    });

    let mut tally = GenerationTally::default();
    let mut completed = 0;
    while completed < arg.generations {
        let Ok(report) = report_rx.recv() else {
            break;
        };
        tally.add(&report);
        if report.generation_completed {
            completed += 1;
            let mut guard = lock(&simulation)?;
            finish_generation(&mut guard, &mut tally, arg.clone_best)?;
            if completed < arg.generations {
                guard.resume();
            }
        }
    }
    if let Ok(mut guard) = simulation.lock() {
        guard.pause();
    }

    match scheduler.stop() {
        SchedulerExit::Stopped => {}
        SchedulerExit::Failed(err) => {
            return Err(anyhow::Error::new(err).context("Simulation stopped on a failed tick"));
        }
        SchedulerExit::Poisoned => bail!("Simulation lock was poisoned"),
        SchedulerExit::Panicked => bail!("Scheduler thread panicked"),
    }

    Arc::try_unwrap(simulation)
        .map_err(|_| anyhow!("Simulation is still shared after the scheduler stopped"))?
        .into_inner()
        .map_err(|_| anyhow!("Simulation lock was poisoned"))
}

fn lock(simulation: &Mutex<Simulation>) -> anyhow::Result<MutexGuard<'_, Simulation>> {
    simulation.lock().map_err(|_| anyhow!("Simulation lock was poisoned"))
}

#[derive(Debug, Default)]
struct GenerationTally {
    generation: u32,
    ticks: usize,
    matches: Vec<f64>,
    training_failures: usize,
}

impl GenerationTally {
    fn add(&mut self, report: &TickReport) {
        self.generation = report.generation;
        self.ticks += 1;
        #[expect(clippy::cast_precision_loss)]
        let matches = report.outcomes.iter().map(|outcome| outcome.matches as f64);
        self.matches.extend(matches);
        self.training_failures += report.training_failures.len();
    }
}

fn finish_generation(
    simulation: &mut Simulation,
    tally: &mut GenerationTally,
    clone_best: bool,
) -> anyhow::Result<()> {
    let tally = std::mem::take(tally);
    eprintln!("Generation #{} ({} ticks):", tally.generation, tally.ticks);
    if let Some(stats) = DescriptiveStats::new(tally.matches.iter().copied()) {
        eprintln!(
            "  Matches: min {:.0}, max {:.0}, mean {:.3}, median {:.1}, stddev {:.3}",
            stats.min, stats.max, stats.mean, stats.median, stats.std_dev
        );
    }
    if let Some(stats) = simulation.state().population().score_stats() {
        eprintln!(
            "  Scores:  min {:.3}, max {:.3}, mean {:.3}, median {:.3}, stddev {:.3}",
            stats.min, stats.max, stats.mean, stats.median, stats.std_dev
        );
    }
    if let Some(best) = simulation.best_agent() {
        eprintln!("  Best:    agent #{} with score {:.3}", best.id(), best.score());
    }
    if tally.training_failures > 0 {
        eprintln!("  Rejected training steps: {}", tally.training_failures);
    }

    if clone_best {
        simulation.clone_best().context("Failed to clone best agent")?;
        eprintln!("  Population replaced with clones of the best agent");
    }
    Ok(())
}
