use super::*;
use crate::persistence::{NewFacility, SqliteFacilityStore};
use crate::test_support::temp_db_path;
use sim_core::{FixedClock, OccupancyChange};

fn test_state(name: &str) -> AppState {
    let mut store = SqliteFacilityStore::open(temp_db_path(name)).expect("open store");
    let mut north = NewFacility::new("North", 50);
    north.occupied = 48;
    north.hospital_code = Some("CUH".to_string());
    store.insert_facility(&north, "2024-01-01 09:00:00").expect("insert");
    store
        .insert_facility(&NewFacility::new("South", 20), "2024-01-01 09:00:00")
        .expect("insert");
    store
        .record_tick_change(1, OccupancyChange::new(48, 50), "2024-01-01 09:00:05")
        .expect("tick");

    AppState::new(
        Arc::new(SimController::new()),
        Arc::new(tokio::sync::Mutex::new(store)),
        Arc::new(FixedClock::at_hour(11)),
        10,
    )
}

#[tokio::test]
async fn control_routes_flip_controller_flags() {
    let state = test_state("routes_flags");

    let Json(ack) = pause_sim(State(state.clone())).await;
    assert_eq!(ack.message, "Simulation Paused");
    let Json(status) = get_status(State(state.clone())).await;
    assert!(!status.running);
    assert_eq!(status.status, "Paused");

    let Json(ack) = tick_sim(State(state.clone())).await;
    assert_eq!(ack.message, "Single Tick Executed");
    let Json(ack) = fast_forward_sim(State(state.clone())).await;
    assert_eq!(ack.message, "Fast Forward Started");

    let Json(status) = get_status(State(state.clone())).await;
    assert!(status.single_tick_pending);
    assert_eq!(status.fast_forward_remaining, 10);

    let Json(ack) = start_sim(State(state.clone())).await;
    assert_eq!(ack.message, "Simulation Running");
    assert!(state.controller().is_running());
}

#[tokio::test]
async fn reset_route_clears_store_synchronously() {
    let state = test_state("routes_reset");

    let Json(ack) = reset_sim(State(state.clone())).await.expect("reset");
    assert_eq!(ack.message, "Simulation Reset Complete");

    let store = state.store.lock().await;
    assert_eq!(store.log_count().expect("count"), 0);
    let facilities = store.list_active_facilities().expect("list");
    assert!(facilities.iter().all(|facility| facility.occupied == 0));
    assert!(facilities
        .iter()
        .all(|facility| facility.last_updated.as_deref() == Some("2024-01-01 11:00:00")));
}

#[tokio::test]
async fn reset_route_reports_store_failure() {
    let state = test_state("routes_reset_failure");
    state
        .store
        .lock()
        .await
        .conn_for_tests()
        .execute_batch("DROP TABLE carpark_log;")
        .expect("drop log");

    let response = reset_sim(State(state)).await.expect_err("store failure").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let error: ApiError = serde_json::from_slice(&body).expect("api error");
    assert_eq!(error.error_code, ErrorCode::InternalError);
    assert!(error.details.is_some());
}

#[tokio::test]
async fn facilities_route_lists_active_with_free_spaces() {
    let state = test_state("routes_facilities");
    state
        .store
        .lock()
        .await
        .set_active(2, false, "2024-01-01 10:00:00")
        .expect("archive");

    let Json(response) = list_facilities(State(state)).await.expect("list");
    assert_eq!(response.facilities.len(), 1);
    let north = &response.facilities[0];
    assert_eq!(north.name, "North");
    assert_eq!(north.hospital_code.as_deref(), Some("CUH"));
    assert_eq!(north.occupied, 50);
    assert_eq!(north.free, 0);
}

#[tokio::test]
async fn log_route_returns_latest_entries() {
    let state = test_state("routes_log");

    let Json(response) = get_log(State(state.clone()), Query(LogQuery { limit: None }))
        .await
        .expect("log");
    assert_eq!(response.entries.len(), 1);
    assert_eq!(response.entries[0].action, "FILLED");

    let rejected = get_log(State(state), Query(LogQuery { limit: Some(0) }))
        .await
        .expect_err("zero limit")
        .into_response();
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn log_limit_is_capped() {
    assert_eq!(resolve_log_limit(None).expect("default"), DEFAULT_LOG_LIMIT);
    assert_eq!(resolve_log_limit(Some(7)).expect("small"), 7);
    assert_eq!(resolve_log_limit(Some(10_000)).expect("capped"), MAX_LOG_LIMIT);
}

#[tokio::test]
async fn root_banner_is_plain_text() {
    assert_eq!(root().await, "Carpark Simulation Engine is running.");
}

#[tokio::test]
async fn status_body_matches_wire_shape() {
    let state = test_state("routes_status_shape");
    state.controller().pause();

    let Json(status) = get_status(State(state)).await;
    let value = serde_json::to_value(&status).expect("serialize");
    assert_eq!(value["running"], false);
    assert_eq!(value["status"], "Paused");
    assert_eq!(value["fast_forward_remaining"], 0);
}
