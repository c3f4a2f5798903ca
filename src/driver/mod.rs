pub mod battery;

pub use battery::{BatteryDriver, Error, Survey};
