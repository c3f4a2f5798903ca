//! Simulator settings, loaded from a JSON file.
//!
//! ```json
//! {
//!     "log_level": "info",
//!     "nos": { "uri": "tcp://127.0.0.1:12001", "node": "battery", "i2c_bus": "i2c_2" },
//!     "battery_01": { "address": 64 },
//!     "battery_02": { "address": "0x41" }
//! }
//! ```

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::{bus::ADDRESS_MAX, util::parse_number};

const BATTERY_PREFIX: &str = "battery_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed config")]
    Parse(#[from] serde_json::Error),
    #[error("unknown log level {0:?}")]
    LogLevel(String),
    #[error("{key}: invalid address {value}, expected 0x00..=0x7f")]
    Address { key: String, value: String },
    #[error("{0:?} is not a battery id, expected battery_<n>")]
    BatteryKey(String),
    #[error("no batteries configured")]
    NoBatteries,
    #[error("batteries {first} and {second} share address {address:#04x}")]
    DuplicateAddress { address: u8, first: u8, second: u8 },
}

/// Where the bus lives and what it is called.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusSettings {
    pub uri: String,
    pub node: String,
    pub i2c_bus: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatterySettings {
    pub id: u8,
    pub address: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub log_level: LevelFilter,
    pub bus: BusSettings,
    pub batteries: Vec<BatterySettings>,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    nos: BusSettings,
    #[serde(flatten)]
    rest: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawBattery {
    address: RawAddress,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAddress {
    Number(u64),
    Text(String),
}

fn default_log_level() -> String {
    "error".to_string()
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let raw: RawSettings = serde_json::from_str(text)?;

        let mut batteries = Vec::new();
        for (key, value) in raw.rest {
            let Some(suffix) = key.strip_prefix(BATTERY_PREFIX) else {
                continue;
            };

            let id = suffix
                .parse::<u8>()
                .map_err(|_| ConfigError::BatteryKey(key.clone()))?;
            let entry: RawBattery = serde_json::from_value(value)?;
            let address = parse_address(&key, entry.address)?;

            batteries.push(BatterySettings { id, address });
        }

        if batteries.is_empty() {
            return Err(ConfigError::NoBatteries);
        }

        batteries.sort_by_key(|b| b.id);

        let mut seen = BTreeMap::new();
        for battery in &batteries {
            if let Some(first) = seen.insert(battery.address, battery.id) {
                return Err(ConfigError::DuplicateAddress {
                    address: battery.address,
                    first,
                    second: battery.id,
                });
            }
        }

        Ok(Self {
            log_level: parse_log_level(&raw.log_level)?,
            bus: raw.nos,
            batteries,
        })
    }
}

fn parse_address(key: &str, raw: RawAddress) -> Result<u8, ConfigError> {
    let (parsed, shown) = match raw {
        RawAddress::Number(n) => (u8::try_from(n).ok(), n.to_string()),
        RawAddress::Text(s) => (parse_number(&s), format!("{s:?}")),
    };

    parsed
        .filter(|address| *address <= ADDRESS_MAX)
        .ok_or_else(|| ConfigError::Address {
            key: key.to_string(),
            value: shown,
        })
}

/// Maps a log level name onto a filter. Accepts the usual `tracing` names and
/// the `warning`, `fatal` and `critical` spellings.
pub fn parse_log_level(level: &str) -> Result<LevelFilter, ConfigError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "fatal" | "critical" => Ok(LevelFilter::ERROR),
        "off" | "none" => Ok(LevelFilter::OFF),
        _ => Err(ConfigError::LogLevel(level.to_string())),
    }
}
