//! Master-side driver for the battery unit command set.

use std::fmt;

use embedded_hal::blocking::i2c::{Read, Write};
use thiserror::Error;
use tracing::debug;

use crate::battery::{opcode::Opcode, status::BoardStatus, telemetry::Channel, SENTINEL};

pub struct BatteryDriver<I2C> {
    pub i2c: I2C,
    pub address: u8,
}

#[derive(Debug, Error)]
pub enum Error<E> {
    #[error("i2c error: {0:?}")]
    I2c(E),
    #[error("battery rejected {0:?}")]
    Rejected(Opcode),
}

impl<I2C, E> BatteryDriver<I2C>
where
    I2C: Read<Error = E> + Write<Error = E>,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    fn command(&mut self, opcode: Opcode, args: &[u8]) -> Result<u16, Error<E>> {
        let mut tx_buf = [0u8; 3];
        let end = 1 + args.len();

        tx_buf[0] = opcode as u8;
        tx_buf[1..end].copy_from_slice(args);

        self.i2c
            .write(self.address, &tx_buf[..end])
            .map_err(Error::I2c)?;

        let mut rx_buf = [0u8; 2];
        self.i2c
            .read(self.address, &mut rx_buf)
            .map_err(Error::I2c)?;

        match u16::from_le_bytes(rx_buf) {
            SENTINEL => Err(Error::Rejected(opcode)),
            response => Ok(response),
        }
    }

    pub fn get_board_status(&mut self) -> Result<BoardStatus, Error<E>> {
        self.command(Opcode::GetBoardStatus, &[0x00])
            .map(BoardStatus::from)
    }

    pub fn get_last_error(&mut self) -> Result<u16, Error<E>> {
        self.command(Opcode::GetLastError, &[0x00])
    }

    pub fn get_version(&mut self) -> Result<u16, Error<E>> {
        self.command(Opcode::GetVersion, &[0x00])
    }

    pub fn get_checksum(&mut self) -> Result<u16, Error<E>> {
        self.command(Opcode::GetChecksum, &[0x00])
    }

    pub fn get_telemetry(&mut self, channel: Channel) -> Result<u16, Error<E>> {
        self.get_telemetry_raw(channel.code())
    }

    /// Reads a telemetry channel by its raw code, known to the driver or not.
    pub fn get_telemetry_raw(&mut self, code: u16) -> Result<u16, Error<E>> {
        self.command(Opcode::GetTelemetry, &code.to_be_bytes())
    }

    pub fn get_brownout_resets(&mut self) -> Result<u16, Error<E>> {
        self.command(Opcode::GetBrownoutResets, &[0x00])
    }

    pub fn get_auto_software_resets(&mut self) -> Result<u16, Error<E>> {
        self.command(Opcode::GetAutoSoftwareResets, &[0x00])
    }

    pub fn get_manual_resets(&mut self) -> Result<u16, Error<E>> {
        self.command(Opcode::GetManualResets, &[0x00])
    }

    pub fn manual_reset(&mut self) -> Result<(), Error<E>> {
        self.command(Opcode::ManualReset, &[0x00]).map(|_| ())
    }

    pub fn get_heater_controller_status(&mut self) -> Result<bool, Error<E>> {
        self.command(Opcode::GetHeaterControllerStatus, &[0x00])
            .map(|status| status != 0)
    }

    pub fn set_heater_controller_status(&mut self, on: bool) -> Result<(), Error<E>> {
        self.command(Opcode::SetHeaterControllerStatus, &[u8::from(on)])
            .map(|_| ())
    }

    /// Reads everything the unit reports.
    pub fn survey(&mut self) -> Result<Survey, Error<E>> {
        let version = self.get_version()?;
        debug!(address = self.address, "battery version = {version:#06x}");

        let mut telemetry = Vec::with_capacity(Channel::ALL.len());
        for channel in Channel::ALL {
            telemetry.push((channel, self.get_telemetry(channel)?));
        }

        Ok(Survey {
            address: self.address,
            version,
            checksum: self.get_checksum()?,
            last_error: self.get_last_error()?,
            brownout_resets: self.get_brownout_resets()?,
            auto_software_resets: self.get_auto_software_resets()?,
            manual_resets: self.get_manual_resets()?,
            heater_on: self.get_heater_controller_status()?,
            telemetry,
            // read last so it reflects the commands above
            board_status: self.get_board_status()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Survey {
    pub address: u8,
    pub version: u16,
    pub checksum: u16,
    pub board_status: BoardStatus,
    pub last_error: u16,
    pub brownout_resets: u16,
    pub auto_software_resets: u16,
    pub manual_resets: u16,
    pub heater_on: bool,
    pub telemetry: Vec<(Channel, u16)>,
}

impl fmt::Display for Survey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "battery at {:#04x}", self.address)?;
        writeln!(f, "  version              {:#06x}", self.version)?;
        writeln!(f, "  checksum             {:#06x}", self.checksum)?;
        writeln!(f, "  board status         {:#06x}", self.board_status.bits())?;
        writeln!(f, "  last error           {}", self.last_error)?;
        writeln!(f, "  brownout resets      {}", self.brownout_resets)?;
        writeln!(f, "  auto software resets {}", self.auto_software_resets)?;
        writeln!(f, "  manual resets        {}", self.manual_resets)?;
        writeln!(
            f,
            "  heater controller    {}",
            if self.heater_on { "on" } else { "off" }
        )?;

        for (channel, reading) in &self.telemetry {
            writeln!(
                f,
                "  {:#06x} {:<30} {}",
                channel.code(),
                channel.description(),
                reading
            )?;
        }

        Ok(())
    }
}
