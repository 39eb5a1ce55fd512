use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use sim_core::controller::DEFAULT_FAST_FORWARD_TICKS;

pub const ENV_DB_PATH: &str = "CARPARK_SIM_DB_PATH";
pub const ENV_ADDR: &str = "CARPARK_SIM_ADDR";
pub const ENV_HEARTBEAT_URL: &str = "CARPARK_SIM_HEARTBEAT_URL";
pub const ENV_TICK_INTERVAL_MS: &str = "CARPARK_SIM_TICK_INTERVAL_MS";
pub const ENV_FAST_FORWARD_TICKS: &str = "CARPARK_SIM_FAST_FORWARD_TICKS";
pub const ENV_SEED: &str = "CARPARK_SIM_SEED";

pub const DEFAULT_ADDR: &str = "127.0.0.1:5070";
pub const DEFAULT_HEARTBEAT_URL: &str = "http://localhost:5199/heartbeat";
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Heartbeat URL value that disables reporting.
const HEARTBEAT_OFF: &str = "off";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("CARPARK_SIM_DB_PATH is not set; refusing to start without a database")]
    MissingDatabasePath,
    #[error("invalid {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub heartbeat_url: Option<String>,
    pub tick_interval: Duration,
    pub fast_forward_ticks: u32,
    pub seed: Option<u64>,
}

impl SimConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = get(ENV_DB_PATH)
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingDatabasePath)?;

        let addr_raw = get(ENV_ADDR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let bind_addr = parse_addr(&addr_raw)?;

        let heartbeat_url = match get(ENV_HEARTBEAT_URL) {
            Some(url) if url.eq_ignore_ascii_case(HEARTBEAT_OFF) => None,
            Some(url) => Some(url),
            None => Some(DEFAULT_HEARTBEAT_URL.to_string()),
        };

        let tick_interval = match get(ENV_TICK_INTERVAL_MS) {
            Some(raw) => {
                let millis = parse_number::<u64>(ENV_TICK_INTERVAL_MS, &raw)?;
                if millis == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_TICK_INTERVAL_MS,
                        value: raw,
                    });
                }
                Duration::from_millis(millis)
            }
            None => DEFAULT_TICK_INTERVAL,
        };

        let fast_forward_ticks = match get(ENV_FAST_FORWARD_TICKS) {
            Some(raw) => parse_number::<u32>(ENV_FAST_FORWARD_TICKS, &raw)?,
            None => DEFAULT_FAST_FORWARD_TICKS,
        };

        let seed = get(ENV_SEED)
            .map(|raw| parse_number::<u64>(ENV_SEED, &raw))
            .transpose()?;

        Ok(Self {
            db_path,
            bind_addr,
            heartbeat_url,
            tick_interval,
            fast_forward_ticks,
            seed,
        })
    }

    /// Config with defaults for everything but the database path.
    pub fn with_db_path(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5070)),
            heartbeat_url: Some(DEFAULT_HEARTBEAT_URL.to_string()),
            tick_interval: DEFAULT_TICK_INTERVAL,
            fast_forward_ticks: DEFAULT_FAST_FORWARD_TICKS,
            seed: None,
        }
    }
}

pub fn parse_addr(raw: &str) -> Result<SocketAddr, ConfigError> {
    raw.parse::<SocketAddr>()
        .map_err(|_| ConfigError::InvalidValue {
            key: ENV_ADDR,
            value: raw.to_string(),
        })
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}
