//! Fixed-interval driver for the tick loop.
//!
//! The scheduler owns a worker thread that ticks a shared [`Simulation`]
//! every `interval`. Control operations (pause, save, clone best) go through
//! the same mutex, so they never observe a half-applied tick. While the
//! simulation is paused or idle the worker keeps waking up and skipping.

use std::{
    sync::{
        Arc, Mutex,
        mpsc::{self, RecvTimeoutError},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use tracing::{debug, error};

use crate::{
    SimulationError,
    simulation::{Simulation, TickReport},
};

/// Why the worker thread ended.
#[derive(Debug, derive_more::IsVariant)]
pub enum SchedulerExit {
    /// [`Scheduler::stop`] was called.
    Stopped,
    /// A tick failed. The simulation was left as it was before that tick.
    Failed(SimulationError),
    /// Another holder of the simulation lock panicked.
    Poisoned,
    /// The observer panicked.
    Panicked,
}

#[derive(Debug)]
pub struct Scheduler {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<SchedulerExit>,
}

impl Scheduler {
    /// Starts ticking `simulation` every `interval`.
    ///
    /// `observer` is called with each tick report after the lock is released.
    pub fn spawn<F>(simulation: Arc<Mutex<Simulation>>, interval: Duration, mut observer: F) -> Self
    where
        F: FnMut(&TickReport) + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return SchedulerExit::Stopped,
                    Err(RecvTimeoutError::Timeout) => {}
                }

                let Ok(mut guard) = simulation.lock() else {
                    error!("simulation lock poisoned, stopping scheduler");
                    return SchedulerExit::Poisoned;
                };
                if !guard.run_state().is_running() {
                    continue;
                }
                match guard.tick() {
                    Ok(report) => {
                        drop(guard);
                        debug!(tick_index = report.tick_index, "scheduled tick");
                        observer(&report);
                    }
                    Err(err) => {
                        error!(error = %err, "tick failed, stopping scheduler");
                        return SchedulerExit::Failed(err);
                    }
                }
            }
        });
        Self { stop_tx, handle }
    }

    /// Returns `true` once the worker has exited on its own.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the worker and waits for it. A tick in progress completes first.
    #[must_use]
    pub fn stop(self) -> SchedulerExit {
        // The worker may already be gone; the join below reports why.
        let _ = self.stop_tx.send(());
        self.handle.join().unwrap_or(SchedulerExit::Panicked)
    }
}
