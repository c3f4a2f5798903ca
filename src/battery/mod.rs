//! Simulated battery management unit.
//!
//! A master writes an opcode and its arguments, the unit latches a 16-bit
//! response, and a later read returns that response little-endian. Every
//! failure latches [`SENTINEL`] and records a sticky bit in the board status
//! register.

use num_traits::FromPrimitive;
use tracing::Level;

use crate::bus::BusSlave;
use crate::sink::LogSink;

pub mod opcode;
pub mod status;
pub mod telemetry;

use opcode::{Opcode, Request};
use status::{BoardStatus, COMMAND_FAULTS, INVALID_CHANNEL, UNKNOWN_COMMAND};

/// Response latched for every rejected command.
pub const SENTINEL: u16 = 0xFFFF;

pub const VERSION: u16 = 0x1001;
pub const CHECKSUM: u16 = 0xBEEF;

/// Acknowledged byte count for writes that are neither 2 nor 3 bytes long.
pub const INVALID_LENGTH_ACK: usize = 2;

pub struct Battery<L> {
    id: u8,
    response: u16,
    last_error: u16,
    board_status: BoardStatus,
    version: u16,
    checksum: u16,
    brownout_resets: u16,
    auto_software_resets: u16,
    manual_resets: u16,
    heater_controller_status: bool,
    sink: L,
}

macro_rules! log {
    ($self:ident, $level:expr, $($arg:tt)+) => {
        $self.sink.event($level, format_args!($($arg)+))
    };
}

impl<L: LogSink> Battery<L> {
    pub fn new(id: u8, sink: L) -> Self {
        Self {
            id,
            response: 0,
            last_error: 0,
            board_status: BoardStatus::default(),
            version: VERSION,
            checksum: CHECKSUM,
            brownout_resets: 0,
            auto_software_resets: 0,
            manual_resets: 0,
            heater_controller_status: true,
            sink,
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Response the next read will return.
    pub fn response(&self) -> u16 {
        self.response
    }

    pub fn board_status(&self) -> BoardStatus {
        self.board_status
    }

    pub fn manual_resets(&self) -> u16 {
        self.manual_resets
    }

    pub fn heater_controller_status(&self) -> bool {
        self.heater_controller_status
    }

    pub fn sink(&self) -> &L {
        &self.sink
    }

    /// Handles a master write. Returns the number of bytes consumed.
    pub fn i2c_write(&mut self, wbuf: &[u8]) -> usize {
        if !(2..=3).contains(&wbuf.len()) {
            log!(self, Level::ERROR, "invalid battery command of {} bytes", wbuf.len());
            self.response = SENTINEL;
            return INVALID_LENGTH_ACK;
        }

        self.response = match Opcode::from_u8(wbuf[0]) {
            Some(opcode) => self.dispatch(opcode, wbuf),
            None => {
                log!(self, Level::ERROR, "invalid command received: {:#04x}", wbuf[0]);
                self.board_status.set(UNKNOWN_COMMAND);
                SENTINEL
            }
        };

        wbuf.len()
    }

    /// Writes the latched response into `rbuf`, low byte first.
    ///
    /// The returned count is always `rbuf.len()`, whatever was actually
    /// written. A buffer shorter than two bytes gets the bytes that fit.
    pub fn i2c_read(&mut self, rbuf: &mut [u8]) -> usize {
        let bytes = self.response.to_le_bytes();
        let n = bytes.len().min(rbuf.len());
        rbuf[..n].copy_from_slice(&bytes[..n]);

        rbuf.len()
    }

    fn dispatch(&mut self, opcode: Opcode, wbuf: &[u8]) -> u16 {
        match opcode.decode(wbuf) {
            Ok(request) => {
                self.board_status.clear(COMMAND_FAULTS);
                self.execute(request)
            }
            Err(malformed) => {
                log!(self, Level::ERROR, "invalid {} {malformed}", opcode.name());
                self.board_status.apply(opcode.on_reject());
                SENTINEL
            }
        }
    }

    fn execute(&mut self, request: Request) -> u16 {
        match request {
            Request::GetBoardStatus => self.get_board_status(),
            Request::GetLastError => self.get_last_error(),
            Request::GetVersion => self.get_version(),
            Request::GetChecksum => self.get_checksum(),
            Request::GetTelemetry { channel } => self.get_telemetry(channel),
            Request::GetBrownoutResets => self.get_brownout_resets(),
            Request::GetAutoSoftwareResets => self.get_auto_software_resets(),
            Request::GetManualResets => self.get_manual_resets(),
            Request::ManualReset => {
                self.manual_reset();
                0
            }
            Request::GetHeaterControllerStatus => self.get_heater_controller_status(),
            Request::SetHeaterControllerStatus { status } => {
                self.set_heater_controller_status(status)
            }
        }
    }

    pub fn get_board_status(&mut self) -> u16 {
        log!(self, Level::INFO, "get board status received");
        self.board_status.bits()
    }

    pub fn get_last_error(&mut self) -> u16 {
        log!(self, Level::INFO, "get last error received");
        self.last_error
    }

    pub fn get_version(&mut self) -> u16 {
        log!(self, Level::INFO, "get version received");
        self.version
    }

    pub fn get_checksum(&mut self) -> u16 {
        log!(self, Level::INFO, "get checksum received");
        self.checksum
    }

    /// Reads a telemetry channel. Unknown channels set the invalid channel
    /// bit and return [`SENTINEL`]; known ones clear it.
    pub fn get_telemetry(&mut self, channel: u16) -> u16 {
        log!(self, Level::INFO, "get telemetry received, channel {channel:#06x}");

        match telemetry::lookup(channel) {
            Some(reading) => {
                self.board_status.clear(INVALID_CHANNEL);
                reading
            }
            None => {
                log!(self, Level::ERROR, "invalid telemetry channel {channel:#06x}");
                self.board_status.set(INVALID_CHANNEL);
                SENTINEL
            }
        }
    }

    pub fn get_brownout_resets(&mut self) -> u16 {
        log!(self, Level::INFO, "get number of brownout resets received");
        self.brownout_resets
    }

    pub fn get_auto_software_resets(&mut self) -> u16 {
        log!(self, Level::INFO, "get number of automatic software resets received");
        self.auto_software_resets
    }

    pub fn get_manual_resets(&mut self) -> u16 {
        log!(self, Level::INFO, "get number of manual resets received");
        self.manual_resets
    }

    pub fn get_heater_controller_status(&mut self) -> u16 {
        log!(self, Level::INFO, "get heater controller status received");
        u16::from(self.heater_controller_status)
    }

    /// Accepts 0 (off) or 1 (on) and returns 0. Anything else is ignored and
    /// returns [`SENTINEL`].
    pub fn set_heater_controller_status(&mut self, status: u8) -> u16 {
        log!(self, Level::INFO, "set heater controller status received: status {status}");

        if status > 1 {
            log!(self, Level::ERROR, "set heater controller status {status} out of range");
            return SENTINEL;
        }

        self.heater_controller_status = status == 1;
        0
    }

    pub fn manual_reset(&mut self) {
        log!(self, Level::INFO, "manual reset received");
        self.manual_resets = self.manual_resets.wrapping_add(1);
    }
}

impl<L: LogSink> BusSlave for Battery<L> {
    fn write(&mut self, wbuf: &[u8]) -> usize {
        self.i2c_write(wbuf)
    }

    fn read(&mut self, rbuf: &mut [u8]) -> usize {
        self.i2c_read(rbuf)
    }
}
