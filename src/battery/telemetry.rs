use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

/// Telemetry channels, keyed by the 16-bit code sent after the get telemetry
/// opcode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(u16)]
pub enum Channel {
    /// Battery output voltage
    BatteryVoltage = 0xE280,
    /// Battery current magnitude
    BatteryCurrent = 0xE284,
    /// Battery current direction, raw ADC: below 512 is charging
    BatteryCurrentDirection = 0xE28E,
    /// Motherboard temperature
    BoardTemperature = 0xE308,
    /// Current draw of the 5V bus
    Bus5vCurrent = 0xE214,
    /// Output voltage of the 5V bus
    Bus5vVoltage = 0xE210,
    /// Current draw of the 3.3V bus
    Bus3v3Current = 0xE204,
    /// Output voltage of the 3.3V bus
    Bus3v3Voltage = 0xE200,
    Daughterboard1Temperature = 0xE398,
    Daughterboard1Heater = 0xE39F,
    Daughterboard2Temperature = 0xE3A8,
    Daughterboard2Heater = 0xE3AF,
    Daughterboard3Temperature = 0xE3B8,
    Daughterboard3Heater = 0xE3BF,
    Daughterboard4Temperature = 0xE3C8,
    Daughterboard4Heater = 0xE3CF,
}

impl Channel {
    pub const ALL: [Channel; 16] = [
        Channel::BatteryVoltage,
        Channel::BatteryCurrent,
        Channel::BatteryCurrentDirection,
        Channel::BoardTemperature,
        Channel::Bus5vCurrent,
        Channel::Bus5vVoltage,
        Channel::Bus3v3Current,
        Channel::Bus3v3Voltage,
        Channel::Daughterboard1Temperature,
        Channel::Daughterboard1Heater,
        Channel::Daughterboard2Temperature,
        Channel::Daughterboard2Heater,
        Channel::Daughterboard3Temperature,
        Channel::Daughterboard3Heater,
        Channel::Daughterboard4Temperature,
        Channel::Daughterboard4Heater,
    ];

    pub fn from_code(code: u16) -> Option<Self> {
        Self::from_u16(code)
    }

    pub fn code(self) -> u16 {
        self as u16
    }

    /// Fixed reading reported for this channel.
    pub const fn reading(self) -> u16 {
        use Channel::*;

        match self {
            BatteryVoltage => 918,
            BatteryCurrent => 81,
            BatteryCurrentDirection => 700,
            BoardTemperature => 790,
            Bus5vCurrent => 757,
            Bus5vVoltage => 852,
            Bus3v3Current => 753,
            Bus3v3Voltage => 765,
            Daughterboard1Temperature => 795,
            Daughterboard1Heater => 680,
            Daughterboard2Temperature => 790,
            Daughterboard2Heater => 400,
            Daughterboard3Temperature => 780,
            Daughterboard3Heater => 450,
            Daughterboard4Temperature => 786,
            Daughterboard4Heater => 530,
        }
    }

    pub fn description(self) -> &'static str {
        use Channel::*;

        match self {
            BatteryVoltage => "battery output voltage",
            BatteryCurrent => "battery current magnitude",
            BatteryCurrentDirection => "battery current direction",
            BoardTemperature => "motherboard temperature",
            Bus5vCurrent => "5V bus current",
            Bus5vVoltage => "5V bus voltage",
            Bus3v3Current => "3.3V bus current",
            Bus3v3Voltage => "3.3V bus voltage",
            Daughterboard1Temperature => "daughterboard 1 temperature",
            Daughterboard1Heater => "daughterboard 1 heater status",
            Daughterboard2Temperature => "daughterboard 2 temperature",
            Daughterboard2Heater => "daughterboard 2 heater status",
            Daughterboard3Temperature => "daughterboard 3 temperature",
            Daughterboard3Heater => "daughterboard 3 heater status",
            Daughterboard4Temperature => "daughterboard 4 temperature",
            Daughterboard4Heater => "daughterboard 4 heater status",
        }
    }
}

/// Looks up the reading for a raw channel code.
pub fn lookup(code: u16) -> Option<u16> {
    Channel::from_code(code).map(Channel::reading)
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::{lookup, Channel};

    #[test]
    fn every_channel_round_trips_its_code() {
        for channel in Channel::ALL {
            assert_eq!(Channel::from_code(channel.code()), Some(channel));
            assert_eq!(lookup(channel.code()), Some(channel.reading()));
        }
    }

    #[test]
    fn codes_are_distinct() {
        let codes: HashSet<u16> = Channel::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(codes.len(), Channel::ALL.len());
    }

    #[test]
    fn unknown_codes() {
        assert_eq!(lookup(0x0000), None);
        assert_eq!(lookup(0xE281), None);
        assert_eq!(lookup(0xFFFF), None);
    }

    #[test]
    fn readings_never_collide_with_sentinel() {
        for channel in Channel::ALL {
            assert_ne!(channel.reading(), 0xFFFF, "{channel:?}");
        }
    }
}
