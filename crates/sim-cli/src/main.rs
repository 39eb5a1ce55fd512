use std::env;
use std::sync::Arc;

use sim_api::config::parse_addr;
use sim_api::executor::store_stamp;
use sim_api::{serve, NewFacility, SimConfig, SqliteFacilityStore, TickExecutor};
use sim_core::{Clock, FixedClock, NoiseSource, SeededNoise, SystemClock};
use tracing_subscriber::prelude::*;

fn print_usage() {
    println!("carpark-sim <command>");
    println!("commands:");
    println!("  serve [addr]");
    println!("    default addr: $CARPARK_SIM_ADDR or 127.0.0.1:5070");
    println!("  tick [hour]");
    println!("    runs one tick now, optionally pretending the clock reads <hour>:00");
    println!("  reset");
    println!("  list");
    println!("  log [limit]");
    println!("  add <name> <capacity> [hospital_code]");
    println!("  archive <facility_id>");
    println!("environment:");
    println!("  CARPARK_SIM_DB_PATH (required), CARPARK_SIM_HEARTBEAT_URL, CARPARK_SIM_TICK_INTERVAL_MS,");
    println!("  CARPARK_SIM_FAST_FORWARD_TICKS, CARPARK_SIM_SEED, RUST_LOG");
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn parse_i64(value: Option<&String>, label: &str) -> Result<i64, String> {
    let raw = value.ok_or_else(|| format!("missing {}", label))?;
    raw.parse::<i64>()
        .map_err(|_| format!("invalid {}: {}", label, raw))
}

fn open_store(config: &SimConfig) -> Result<SqliteFacilityStore, String> {
    SqliteFacilityStore::open(&config.db_path).map_err(|err| {
        format!(
            "failed to open store at {}: {err}",
            config.db_path.display()
        )
    })
}

fn run_tick(config: &SimConfig, args: &[String]) -> Result<(), String> {
    let clock: Arc<dyn Clock> = match args.get(2) {
        Some(raw) => {
            let hour = raw
                .parse::<u32>()
                .ok()
                .filter(|hour| *hour < 24)
                .ok_or_else(|| format!("invalid hour: {raw}"))?;
            Arc::new(FixedClock::at_hour(hour))
        }
        None => Arc::new(SystemClock),
    };
    let noise: Box<dyn NoiseSource> = match config.seed {
        Some(seed) => Box::new(SeededNoise::from_seed(seed)),
        None => Box::new(SeededNoise::from_entropy()),
    };

    let mut store = open_store(config)?;
    let report = TickExecutor::new(clock, noise)
        .run_tick(&mut store)
        .map_err(|err| format!("tick failed: {err}"))?;

    println!(
        "tick hour={} drift={} updated={} skipped={} failed={}",
        report.hour, report.drift_rate, report.updated, report.skipped, report.failed
    );
    for entry in &report.changes {
        println!(
            "  facility={} {} {}",
            entry.facility_id,
            entry.change.action(),
            entry.change.detail()
        );
    }
    Ok(())
}

fn run_reset(config: &SimConfig) -> Result<(), String> {
    let mut store = open_store(config)?;
    let summary = store
        .reset_all(&store_stamp(&SystemClock))
        .map_err(|err| format!("reset failed: {err}"))?;
    println!(
        "reset facilities_zeroed={} log_entries_deleted={}",
        summary.facilities_zeroed, summary.log_entries_deleted
    );
    Ok(())
}

fn run_list(config: &SimConfig) -> Result<(), String> {
    let store = open_store(config)?;
    let facilities = store
        .list_active_facilities()
        .map_err(|err| format!("list failed: {err}"))?;

    for facility in facilities {
        println!(
            "{:>4} {:<24} {:>5}/{:<5} free={:<5} status={} updated={}",
            facility.id,
            facility.name,
            facility.occupied,
            facility.total_capacity,
            facility.free,
            facility.status,
            facility.last_updated.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn run_log(config: &SimConfig, args: &[String]) -> Result<(), String> {
    let limit = match args.get(2) {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| format!("invalid limit: {raw}"))?,
        None => 20,
    };

    let store = open_store(config)?;
    let entries = store
        .recent_log(limit)
        .map_err(|err| format!("log failed: {err}"))?;

    for entry in entries {
        println!(
            "{} facility={} {} {}",
            entry.created_at, entry.facility_id, entry.action, entry.detail
        );
    }
    Ok(())
}

fn run_add(config: &SimConfig, args: &[String]) -> Result<(), String> {
    let name = args
        .get(2)
        .cloned()
        .ok_or_else(|| "missing name".to_string())?;
    let capacity = parse_i64(args.get(3), "capacity")?;
    if capacity <= 0 {
        return Err(format!("capacity must be positive: {capacity}"));
    }

    let mut facility = NewFacility::new(name, capacity);
    facility.hospital_code = args.get(4).map(|code| code.to_uppercase());

    let mut store = open_store(config)?;
    let id = store
        .insert_facility(&facility, &store_stamp(&SystemClock))
        .map_err(|err| format!("insert failed: {err}"))?;
    println!("added facility_id={id}");
    Ok(())
}

fn run_archive(config: &SimConfig, args: &[String]) -> Result<(), String> {
    let id = parse_i64(args.get(2), "facility_id")?;
    let mut store = open_store(config)?;
    let changed = store
        .set_active(id, false, &store_stamp(&SystemClock))
        .map_err(|err| format!("archive failed: {err}"))?;

    if changed {
        println!("archived facility_id={id}");
    } else {
        println!("facility_id={id} was already archived");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    let Some(command) = command else {
        print_usage();
        return;
    };

    let mut config = match SimConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };

    let result = match command {
        "serve" => {
            if let Some(raw) = args.get(2) {
                match parse_addr(raw) {
                    Ok(addr) => config.bind_addr = addr,
                    Err(err) => {
                        eprintln!("error: {err}");
                        print_usage();
                        std::process::exit(2);
                    }
                }
            }
            println!("serving carpark simulation on http://{}", config.bind_addr);
            serve(config)
                .await
                .map_err(|err| format!("server error: {err}"))
        }
        "tick" => run_tick(&config, &args),
        "reset" => run_reset(&config),
        "list" => run_list(&config),
        "log" => run_log(&config, &args),
        "add" => run_add(&config, &args),
        "archive" => run_archive(&config, &args),
        _ => {
            print_usage();
            return;
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
