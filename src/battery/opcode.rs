use num_derive::{FromPrimitive, ToPrimitive};
use thiserror::Error;

use super::status::{StatusEdit, MALFORMED_ARGUMENT};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum Opcode {
    GetBoardStatus = 0x01,
    GetLastError = 0x03,
    GetVersion = 0x04,
    GetChecksum = 0x05,
    GetTelemetry = 0x10,
    GetBrownoutResets = 0x31,
    GetAutoSoftwareResets = 0x32,
    GetManualResets = 0x33,
    ManualReset = 0x80,
    GetHeaterControllerStatus = 0x90,
    SetHeaterControllerStatus = 0x91,
}

/// Argument layout an opcode expects after its first byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Byte 1 must be `0x00`. A third byte, if present, is ignored.
    ZeroArgument,
    /// Exactly two more bytes: a big-endian telemetry channel code.
    ChannelCode,
    /// Exactly one more byte, passed to the command as-is.
    Value,
}

/// A decoded, well-formed command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Request {
    GetBoardStatus,
    GetLastError,
    GetVersion,
    GetChecksum,
    GetTelemetry { channel: u16 },
    GetBrownoutResets,
    GetAutoSoftwareResets,
    GetManualResets,
    ManualReset,
    GetHeaterControllerStatus,
    SetHeaterControllerStatus { status: u8 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum Malformed {
    #[error("data {0:#04x}, expected 0x00")]
    Value(u8),
    #[error("data size {found}, expected {expected}")]
    Length { found: usize, expected: usize },
}

impl Opcode {
    pub const ALL: [Opcode; 11] = [
        Opcode::GetBoardStatus,
        Opcode::GetLastError,
        Opcode::GetVersion,
        Opcode::GetChecksum,
        Opcode::GetTelemetry,
        Opcode::GetBrownoutResets,
        Opcode::GetAutoSoftwareResets,
        Opcode::GetManualResets,
        Opcode::ManualReset,
        Opcode::GetHeaterControllerStatus,
        Opcode::SetHeaterControllerStatus,
    ];

    pub fn name(self) -> &'static str {
        use Opcode::*;

        match self {
            GetBoardStatus => "get board status",
            GetLastError => "get last error",
            GetVersion => "get version",
            GetChecksum => "get checksum",
            GetTelemetry => "get telemetry",
            GetBrownoutResets => "get BOR",
            GetAutoSoftwareResets => "get ASR",
            GetManualResets => "get MR",
            ManualReset => "manual reset",
            GetHeaterControllerStatus => "get heater controller status",
            SetHeaterControllerStatus => "set heater controller status",
        }
    }

    pub fn shape(self) -> Shape {
        match self {
            Opcode::GetTelemetry => Shape::ChannelCode,
            Opcode::SetHeaterControllerStatus => Shape::Value,
            _ => Shape::ZeroArgument,
        }
    }

    /// Status register change applied when the arguments don't fit
    /// [`Opcode::shape`].
    ///
    /// A short or long get telemetry write clears the malformed-argument bit
    /// instead of setting it.
    pub fn on_reject(self) -> StatusEdit {
        match self {
            Opcode::GetTelemetry => StatusEdit::Clear(MALFORMED_ARGUMENT),
            _ => StatusEdit::Set(MALFORMED_ARGUMENT),
        }
    }

    /// Checks the whole write (opcode byte included) against this opcode's
    /// argument shape.
    pub fn decode(self, wbuf: &[u8]) -> Result<Request, Malformed> {
        use Opcode::*;

        let expected = match self.shape() {
            Shape::ZeroArgument => 2..=3,
            Shape::ChannelCode => 3..=3,
            Shape::Value => 2..=2,
        };

        if !expected.contains(&wbuf.len()) {
            return Err(Malformed::Length {
                found: wbuf.len(),
                expected: *expected.start(),
            });
        }

        if self.shape() == Shape::ZeroArgument && wbuf[1] != 0x00 {
            return Err(Malformed::Value(wbuf[1]));
        }

        Ok(match self {
            GetBoardStatus => Request::GetBoardStatus,
            GetLastError => Request::GetLastError,
            GetVersion => Request::GetVersion,
            GetChecksum => Request::GetChecksum,
            GetTelemetry => Request::GetTelemetry {
                channel: u16::from_be_bytes([wbuf[1], wbuf[2]]),
            },
            GetBrownoutResets => Request::GetBrownoutResets,
            GetAutoSoftwareResets => Request::GetAutoSoftwareResets,
            GetManualResets => Request::GetManualResets,
            ManualReset => Request::ManualReset,
            GetHeaterControllerStatus => Request::GetHeaterControllerStatus,
            SetHeaterControllerStatus => Request::SetHeaterControllerStatus { status: wbuf[1] },
        })
    }
}
