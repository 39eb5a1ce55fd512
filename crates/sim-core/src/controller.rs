//! Run/pause/single-step/fast-forward control state for the simulation loop.
//!
//! The controller is shared by `Arc` between the HTTP handlers and the loop task.
//! Handlers only call the transition methods; the loop only calls the `take_*`
//! consumers between ticks. Every field is a single atomic word, so no lock is
//! held across a tick.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

pub const DEFAULT_FAST_FORWARD_TICKS: u32 = 10;

#[derive(Debug)]
pub struct SimController {
    running: AtomicBool,
    force_single_tick: AtomicBool,
    fast_forward_remaining: AtomicU32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub running: bool,
    pub single_tick_pending: bool,
    pub fast_forward_remaining: u32,
}

impl ControllerSnapshot {
    pub fn mode_label(&self) -> &'static str {
        if self.running {
            "Running"
        } else {
            "Paused"
        }
    }
}

impl Default for SimController {
    fn default() -> Self {
        Self {
            running: AtomicBool::new(true),
            force_single_tick: AtomicBool::new(false),
            fast_forward_remaining: AtomicU32::new(0),
        }
    }
}

impl SimController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn pause(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Requests one extra tick on the next loop iteration, even while paused.
    pub fn request_single_tick(&self) {
        self.force_single_tick.store(true, Ordering::SeqCst);
    }

    /// Sets the fast-forward budget to `ticks`.
    ///
    /// A request made while a previous budget is still draining replaces it
    /// rather than adding to it.
    pub fn request_fast_forward(&self, ticks: u32) {
        self.fast_forward_remaining.store(ticks, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Clears the single-tick flag, returning whether it was set.
    pub fn take_single_tick(&self) -> bool {
        self.force_single_tick.swap(false, Ordering::SeqCst)
    }

    /// Decrements the fast-forward budget if it is positive.
    pub fn take_fast_forward_tick(&self) -> bool {
        self.fast_forward_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }

    pub fn fast_forward_remaining(&self) -> u32 {
        self.fast_forward_remaining.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            running: self.is_running(),
            single_tick_pending: self.force_single_tick.load(Ordering::SeqCst),
            fast_forward_remaining: self.fast_forward_remaining(),
        }
    }
}
