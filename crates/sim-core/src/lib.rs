//! Pure carpark simulation logic: the occupancy model, the run/pause/step controller,
//! and the clock and noise capabilities the tick executor is parameterised over.
//!
//! Nothing in this crate performs I/O.

pub mod clock;
pub mod controller;
pub mod noise;
pub mod occupancy;

pub use clock::{Clock, FixedClock, SystemClock};
pub use controller::{ControllerSnapshot, SimController};
pub use noise::{NoiseSource, ScriptedNoise, SeededNoise};
pub use occupancy::{drift_rate, next_occupancy, OccupancyChange};
