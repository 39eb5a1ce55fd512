use std::sync::Arc;

use chrono::Timelike;
use sim_core::{drift_rate, next_occupancy, Clock, NoiseSource, OccupancyChange};

use crate::persistence::{PersistenceError, RowOutcome, SqliteFacilityStore};

const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacilityChange {
    pub facility_id: i64,
    pub change: OccupancyChange,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub hour: u32,
    pub drift_rate: i64,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub changes: Vec<FacilityChange>,
}

/// Applies one simulated time-step to every active facility.
///
/// All facilities in a tick share the hour and drift rate read at the start of
/// the tick; each one gets its own noise draw.
pub struct TickExecutor {
    clock: Arc<dyn Clock>,
    noise: Box<dyn NoiseSource>,
}

impl TickExecutor {
    pub fn new(clock: Arc<dyn Clock>, noise: Box<dyn NoiseSource>) -> Self {
        Self { clock, noise }
    }

    /// Fails only if the active snapshot cannot be read. Per-facility write
    /// errors are logged and counted so the rest of the tick still runs.
    pub fn run_tick(
        &mut self,
        store: &mut SqliteFacilityStore,
    ) -> Result<TickReport, PersistenceError> {
        let now = self.clock.now();
        let hour = now.hour();
        let drift = drift_rate(hour);
        let stamp = now.format(STAMP_FORMAT).to_string();

        let snapshot = store.load_active_snapshot()?;

        let mut report = TickReport {
            hour,
            drift_rate: drift,
            ..TickReport::default()
        };

        for row in snapshot {
            if row.total_capacity < 0 || row.occupied < 0 || row.occupied > row.total_capacity {
                tracing::warn!(
                    facility_id = row.id,
                    total = row.total_capacity,
                    occupied = row.occupied,
                    "facility row out of range; clamping"
                );
            }

            let noise = self.noise.draw();
            let next = next_occupancy(row.occupied, row.total_capacity, drift, noise);
            let change = OccupancyChange::new(row.occupied, next);

            match store.record_tick_change(row.id, change, &stamp) {
                Ok(RowOutcome::Updated) => {
                    report.updated += 1;
                    report.changes.push(FacilityChange {
                        facility_id: row.id,
                        change,
                    });
                }
                Ok(RowOutcome::SkippedInactive) => {
                    tracing::debug!(facility_id = row.id, "facility archived mid-tick; skipped");
                    report.skipped += 1;
                }
                Err(err) => {
                    tracing::warn!(facility_id = row.id, error = %err, "facility update failed");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            hour,
            drift_rate = drift,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            "simulation tick complete"
        );

        Ok(report)
    }
}

/// Timestamp string in the store's `last_updated` format.
pub fn store_stamp(clock: &dyn Clock) -> String {
    clock.now().format(STAMP_FORMAT).to_string()
}
