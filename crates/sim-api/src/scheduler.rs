//! The perpetual background loop that turns controller state into ticks.
//!
//! One iteration per interval: a normal tick while running, one forced tick if a
//! single step was requested, then the whole fast-forward budget back-to-back.
//! Nothing that goes wrong inside an iteration ends the loop; only the shutdown
//! signal does, and it is honoured at the top of each iteration and between
//! fast-forward ticks.

use std::sync::Arc;
use std::time::Duration;

use contracts::{HEARTBEAT_FAST_FORWARD, HEARTBEAT_RUNNING, HEARTBEAT_SINGLE_TICK};
use sim_core::SimController;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::executor::TickExecutor;
use crate::heartbeat::HeartbeatSink;
use crate::persistence::SqliteFacilityStore;

pub type SharedStore = Arc<Mutex<SqliteFacilityStore>>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IterationReport {
    pub normal_ticks: u32,
    pub single_ticks: u32,
    pub fast_forward_ticks: u32,
    pub failed_ticks: u32,
}

impl IterationReport {
    pub fn total_ticks(&self) -> u32 {
        self.normal_ticks + self.single_ticks + self.fast_forward_ticks
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickKind {
    Normal,
    Single,
    FastForward,
}

impl TickKind {
    fn heartbeat(self) -> &'static str {
        match self {
            Self::Normal => HEARTBEAT_RUNNING,
            Self::Single => HEARTBEAT_SINGLE_TICK,
            Self::FastForward => HEARTBEAT_FAST_FORWARD,
        }
    }
}

pub struct SimulationLoop {
    executor: TickExecutor,
    store: SharedStore,
    controller: Arc<SimController>,
    heartbeat: Arc<dyn HeartbeatSink>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl SimulationLoop {
    pub fn new(
        executor: TickExecutor,
        store: SharedStore,
        controller: Arc<SimController>,
        heartbeat: Arc<dyn HeartbeatSink>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            executor,
            store,
            controller,
            heartbeat,
            interval,
            shutdown,
        }
    }

    pub async fn run_iteration(&mut self) -> IterationReport {
        let mut report = IterationReport::default();

        if self.controller.is_running() {
            self.tick(TickKind::Normal, &mut report).await;
        }

        if self.controller.take_single_tick() {
            self.tick(TickKind::Single, &mut report).await;
        }

        while !self.is_shutdown() && self.controller.take_fast_forward_tick() {
            self.tick(TickKind::FastForward, &mut report).await;
        }

        report
    }

    pub async fn run(mut self) {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "carpark simulation loop starting");

        loop {
            if self.is_shutdown() {
                break;
            }

            let report = self.run_iteration().await;
            if report.total_ticks() + report.failed_ticks > 1 {
                tracing::debug!(
                    normal = report.normal_ticks,
                    single = report.single_ticks,
                    fast_forward = report.fast_forward_ticks,
                    failed = report.failed_ticks,
                    "iteration ran extra ticks"
                );
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!("carpark simulation loop stopped");
    }

    fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow()
    }

    async fn tick(&mut self, kind: TickKind, report: &mut IterationReport) {
        let result = {
            let mut store = self.store.lock().await;
            self.executor.run_tick(&mut store)
        };

        match result {
            Ok(_) => {
                match kind {
                    TickKind::Normal => report.normal_ticks += 1,
                    TickKind::Single => report.single_ticks += 1,
                    TickKind::FastForward => report.fast_forward_ticks += 1,
                }
                self.heartbeat.emit(kind.heartbeat());
            }
            Err(err) => {
                report.failed_ticks += 1;
                tracing::warn!(kind = ?kind, error = %err, "simulation tick failed");
            }
        }
    }
}

/// Handle to a spawned [`SimulationLoop`].
pub struct SimulationHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SimulationHandle {
    /// Signals the loop and waits for the current iteration to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "simulation loop task ended abnormally");
        }
    }
}

pub fn spawn_simulation_loop(
    executor: TickExecutor,
    store: SharedStore,
    controller: Arc<SimController>,
    heartbeat: Arc<dyn HeartbeatSink>,
    interval: Duration,
) -> SimulationHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sim_loop = SimulationLoop::new(executor, store, controller, heartbeat, interval, shutdown_rx);
    let task = tokio::spawn(sim_loop.run());

    SimulationHandle {
        shutdown: shutdown_tx,
        task,
    }
}
