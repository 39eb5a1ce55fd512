use std::sync::Arc;

use contracts::LogAction;
use proptest::prelude::*;
use sim_api::{NewFacility, SqliteFacilityStore, TickExecutor};
use sim_core::{drift_rate, FixedClock, ScriptedNoise, SeededNoise};

fn temp_db_path(name: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time should be monotonic")
        .as_nanos();

    std::env::temp_dir().join(format!("carpark_sim_prop_{name}_{nanos}.sqlite"))
}

#[test]
fn property_reset_is_idempotent_after_ticks() {
    let mut store = SqliteFacilityStore::open(temp_db_path("reset_idempotent")).expect("open");
    for (name, total) in [("A", 40), ("B", 15)] {
        store
            .insert_facility(&NewFacility::new(name, total), "2024-01-01 00:00:00")
            .expect("insert");
    }

    let mut executor = TickExecutor::new(
        Arc::new(FixedClock::at_hour(19)),
        Box::new(SeededNoise::from_seed(3)),
    );
    for _ in 0..5 {
        executor.run_tick(&mut store).expect("tick");
    }
    assert_eq!(store.log_count().expect("count"), 10);

    for _ in 0..2 {
        store.reset_all("2024-01-01 20:00:00").expect("reset");
        assert_eq!(store.log_count().expect("count"), 0);
        assert!(store
            .list_active_facilities()
            .expect("list")
            .iter()
            .all(|facility| facility.occupied == 0));
    }
}

#[test]
fn property_end_to_end_scenarios_are_reproducible() {
    let mut store = SqliteFacilityStore::open(temp_db_path("scenarios")).expect("open");
    let mut first = NewFacility::new("Scenario One", 50);
    first.occupied = 48;
    let mut second = NewFacility::new("Scenario Two", 20);
    second.occupied = 1;
    store.insert_facility(&first, "2024-01-01 00:00:00").expect("insert");
    store.insert_facility(&second, "2024-01-01 00:00:00").expect("insert");
    store.set_active(2, false, "2024-01-01 00:00:00").expect("park second");

    let report = TickExecutor::new(Arc::new(FixedClock::at_hour(10)), Box::new(ScriptedNoise::new([1])))
        .run_tick(&mut store)
        .expect("morning tick");
    assert_eq!(report.drift_rate, 3);
    assert_eq!(report.changes[0].change.next, 50);

    store.set_active(1, false, "2024-01-01 00:00:00").expect("park first");
    store.set_active(2, true, "2024-01-01 00:00:00").expect("resume second");

    let report = TickExecutor::new(Arc::new(FixedClock::at_hour(21)), Box::new(ScriptedNoise::new([-1])))
        .run_tick(&mut store)
        .expect("evening tick");
    assert_eq!(report.drift_rate, -3);
    assert_eq!(report.changes[0].change.next, 0);

    let log = store.recent_log(10).expect("log");
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].facility_id, 2);
    assert_eq!(log[0].log_action(), Some(LogAction::Emptied));
    assert_eq!(log[1].facility_id, 1);
    assert_eq!(log[1].log_action(), Some(LogAction::Filled));
    assert!(log[1].detail.contains("48 → 50"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn property_ticks_keep_rows_in_range_and_log_every_active_row(
        rows in prop::collection::vec((1_i64..200, 0.0_f64..=1.0, any::<bool>()), 1..6),
        hours in prop::collection::vec(0_u32..24, 1..12),
        seed in any::<u64>(),
    ) {
        let mut store = SqliteFacilityStore::open(temp_db_path("prop_ticks")).expect("open");
        let mut archived = Vec::new();
        for (index, (total, fraction, active)) in rows.iter().enumerate() {
            let mut facility = NewFacility::new(format!("F{index}"), *total);
            facility.occupied = ((*total as f64) * fraction).floor() as i64;
            let id = store.insert_facility(&facility, "2024-01-01 00:00:00").expect("insert");
            if !active {
                store.set_active(id, false, "2024-01-01 00:00:00").expect("archive");
                archived.push((id, facility.occupied));
            }
        }

        let clock = Arc::new(FixedClock::at_hour(0));
        let mut executor = TickExecutor::new(clock.clone(), Box::new(SeededNoise::from_seed(seed)));
        for hour in &hours {
            clock.set_hour(*hour);
            let report = executor.run_tick(&mut store).expect("tick");
            prop_assert_eq!(report.drift_rate, drift_rate(*hour));
            prop_assert_eq!(report.failed, 0);
        }

        let active_rows = rows.iter().filter(|(_, _, active)| *active).count();
        prop_assert_eq!(store.log_count().expect("count"), active_rows * hours.len());

        for facility in store.list_active_facilities().expect("list") {
            prop_assert!(facility.occupied >= 0);
            prop_assert!(facility.occupied <= facility.total_capacity);
        }
        for (id, occupied) in archived {
            let row = store.facility(id).expect("load").expect("exists");
            prop_assert_eq!(row.occupied, occupied);
        }
        let log = store.recent_log(10_000).expect("log");
        prop_assert!(log.iter().all(|entry| entry.log_action().is_some()));
    }
}
