/// Handles shared by every request. The controller and store are the same
/// instances the simulation loop holds.
#[derive(Clone)]
pub struct AppState {
    controller: Arc<SimController>,
    store: SharedStore,
    clock: Arc<dyn Clock>,
    fast_forward_ticks: u32,
}

impl AppState {
    pub fn new(
        controller: Arc<SimController>,
        store: SharedStore,
        clock: Arc<dyn Clock>,
        fast_forward_ticks: u32,
    ) -> Self {
        Self {
            controller,
            store,
            clock,
            fast_forward_ticks,
        }
    }

    pub fn controller(&self) -> &Arc<SimController> {
        &self.controller
    }
}
