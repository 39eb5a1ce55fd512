//! Time-of-day occupancy model.
//!
//! A tick moves a facility by `drift + noise`, where the drift comes from a fixed
//! table of hospital day bands and the noise is a single draw from `{-1, 0, +1}`.
//! Results are always clamped into `[0, capacity]`.

use contracts::LogAction;

/// Drift rate for the given hour of day (0..=23).
///
/// Bands are matched first-to-last, so the overlapping hour 12 belongs to the
/// morning admission band.
pub fn drift_rate(hour: u32) -> i64 {
    match hour {
        // morning admissions
        9..=12 => 3,
        // afternoon discharges
        13..=15 => -2,
        // evening visiting hour
        19 => 4,
        // visitors leaving
        20..=22 => -3,
        // overnight
        h if h >= 23 || h < 7 => 0,
        // 07-09 and 16-19 trickle in
        _ => 1,
    }
}

/// Applies one step of drift and noise to `current`, clamped to `[0, total]`.
///
/// A negative capacity is treated as zero and noise is clamped to `[-1, 1]`,
/// so malformed rows never push the result out of range.
pub fn next_occupancy(current: i64, total: i64, drift: i64, noise: i64) -> i64 {
    let capacity = total.max(0);
    let raw = current
        .saturating_add(drift)
        .saturating_add(noise.clamp(-1, 1));
    raw.clamp(0, capacity)
}

/// Before/after pair for one facility within one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupancyChange {
    pub previous: i64,
    pub next: i64,
}

impl OccupancyChange {
    pub fn new(previous: i64, next: i64) -> Self {
        Self { previous, next }
    }

    pub fn delta(&self) -> i64 {
        self.next - self.previous
    }

    pub fn action(&self) -> LogAction {
        LogAction::from_delta(self.previous, self.next)
    }

    pub fn detail(&self) -> String {
        format!("Auto-sim tick: {} → {}", self.previous, self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drift_table_matches_day_shape() {
        assert_eq!(drift_rate(10), 3);
        assert_eq!(drift_rate(12), 3);
        assert_eq!(drift_rate(13), -2);
        assert_eq!(drift_rate(15), -2);
        assert_eq!(drift_rate(19), 4);
        assert_eq!(drift_rate(21), -3);
        assert_eq!(drift_rate(2), 0);
        assert_eq!(drift_rate(23), 0);
        assert_eq!(drift_rate(6), 0);
        assert_eq!(drift_rate(7), 1);
        assert_eq!(drift_rate(8), 1);
        assert_eq!(drift_rate(16), 1);
        assert_eq!(drift_rate(18), 1);
    }

    #[test]
    fn filling_band_positive_emptying_band_negative_overnight_flat() {
        assert!(drift_rate(10) > 0);
        assert!(drift_rate(21) < 0);
        assert_eq!(drift_rate(2), 0);
    }

    #[test]
    fn morning_surge_clamps_at_capacity() {
        let next = next_occupancy(48, 50, drift_rate(10), 1);
        assert_eq!(next, 50);

        let change = OccupancyChange::new(48, next);
        assert_eq!(change.action(), LogAction::Filled);
        assert!(change.detail().contains("48 → 50"));
    }

    #[test]
    fn evening_exit_clamps_at_zero() {
        let next = next_occupancy(1, 20, drift_rate(21), -1);
        assert_eq!(next, 0);
        assert_eq!(OccupancyChange::new(1, next).action(), LogAction::Emptied);
    }

    #[test]
    fn negative_capacity_is_treated_as_empty() {
        assert_eq!(next_occupancy(5, -10, 3, 1), 0);
    }

    #[test]
    fn out_of_range_noise_is_clamped() {
        assert_eq!(next_occupancy(10, 100, 0, 7), 11);
        assert_eq!(next_occupancy(10, 100, 0, -7), 9);
    }

    #[test]
    fn unchanged_value_is_tagged_nochange() {
        let change = OccupancyChange::new(0, next_occupancy(0, 30, 0, -1));
        assert_eq!(change.delta(), 0);
        assert_eq!(change.action(), LogAction::NoChange);
    }
}
