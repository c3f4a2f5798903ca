//! Logging capability handed to each simulated unit.

use std::fmt;

use tracing::Level;

/// Receives leveled text events from a simulated unit.
pub trait LogSink {
    fn event(&mut self, level: Level, args: fmt::Arguments<'_>);
}

/// Forwards events to `tracing`, tagged with the unit's id and bus address.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    pub battery: u8,
    pub address: u8,
}

impl TracingSink {
    pub fn new(battery: u8, address: u8) -> Self {
        Self { battery, address }
    }
}

impl LogSink for TracingSink {
    fn event(&mut self, level: Level, args: fmt::Arguments<'_>) {
        let Self { battery, address } = *self;

        // tracing macros need the level at compile time
        match level {
            Level::ERROR => tracing::error!(battery, address = %Hex(address), "{args}"),
            Level::WARN => tracing::warn!(battery, address = %Hex(address), "{args}"),
            Level::INFO => tracing::info!(battery, address = %Hex(address), "{args}"),
            Level::DEBUG => tracing::debug!(battery, address = %Hex(address), "{args}"),
            Level::TRACE => tracing::trace!(battery, address = %Hex(address), "{args}"),
        }
    }
}

struct Hex(u8);

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<(Level, String)>,
}

impl RecordingSink {
    pub fn count(&self, level: Level) -> usize {
        self.events.iter().filter(|(l, _)| *l == level).count()
    }

    pub fn last(&self) -> Option<&(Level, String)> {
        self.events.last()
    }
}

impl LogSink for RecordingSink {
    fn event(&mut self, level: Level, args: fmt::Arguments<'_>) {
        self.events.push((level, args.to_string()));
    }
}

#[cfg(test)]
mod test {
    use tracing::Level;

    use super::{Hex, LogSink, RecordingSink};

    #[test]
    fn recording_sink_keeps_order() {
        let mut sink = RecordingSink::default();
        sink.event(Level::INFO, format_args!("first {}", 1));
        sink.event(Level::ERROR, format_args!("second {}", 2));

        assert_eq!(sink.events.len(), 2);
        assert_eq!(sink.count(Level::INFO), 1);
        assert_eq!(sink.count(Level::ERROR), 1);
        assert_eq!(sink.last(), Some(&(Level::ERROR, "second 2".to_string())));
    }

    #[test]
    fn hex_address() {
        assert_eq!(Hex(0x4).to_string(), "0x04");
        assert_eq!(Hex(0x7F).to_string(), "0x7f");
    }
}
