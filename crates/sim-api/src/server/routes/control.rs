// Control routes only flip controller state and answer immediately; the loop
// picks the change up on its next iteration. Reset is the exception and
// writes through to the store before responding.

async fn root() -> &'static str {
    ROOT_BANNER
}

async fn get_status(State(state): State<AppState>) -> Json<SimStatusResponse> {
    let snapshot = state.controller.snapshot();
    Json(SimStatusResponse {
        running: snapshot.running,
        status: snapshot.mode_label().to_string(),
        single_tick_pending: snapshot.single_tick_pending,
        fast_forward_remaining: snapshot.fast_forward_remaining,
    })
}

async fn start_sim(State(state): State<AppState>) -> Json<ControlAck> {
    state.controller.start();
    tracing::info!("simulation started");
    Json(ControlAck::new(MSG_SIMULATION_RUNNING))
}

async fn pause_sim(State(state): State<AppState>) -> Json<ControlAck> {
    state.controller.pause();
    tracing::info!("simulation paused");
    Json(ControlAck::new(MSG_SIMULATION_PAUSED))
}

async fn tick_sim(State(state): State<AppState>) -> Json<ControlAck> {
    state.controller.request_single_tick();
    tracing::info!("single tick requested");
    Json(ControlAck::new(MSG_SINGLE_TICK))
}

async fn fast_forward_sim(State(state): State<AppState>) -> Json<ControlAck> {
    state.controller.request_fast_forward(state.fast_forward_ticks);
    tracing::info!(ticks = state.fast_forward_ticks, "fast forward requested");
    Json(ControlAck::new(MSG_FAST_FORWARD))
}

async fn reset_sim(State(state): State<AppState>) -> Result<Json<ControlAck>, HttpApiError> {
    let stamp = store_stamp(state.clock.as_ref());
    let summary = {
        let mut store = state.store.lock().await;
        store
            .reset_all(&stamp)
            .map_err(HttpApiError::from_persistence)?
    };

    tracing::info!(
        facilities_zeroed = summary.facilities_zeroed,
        log_entries_deleted = summary.log_entries_deleted,
        "simulation reset"
    );
    Ok(Json(ControlAck::new(MSG_RESET_COMPLETE)))
}
