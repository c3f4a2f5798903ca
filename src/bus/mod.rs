//! In-process two-wire bus that routes master transactions to simulated
//! slaves by address.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::trace;

mod handle;

pub use handle::{spawn_thread, BusHandle, Transaction};

/// Highest 7-bit address.
pub const ADDRESS_MAX: u8 = 0x7F;

/// A device answering transactions on the bus.
pub trait BusSlave {
    /// Handles a master write and returns how many bytes were consumed.
    fn write(&mut self, wbuf: &[u8]) -> usize;

    /// Fills `rbuf` for a master read and returns the reported byte count.
    fn read(&mut self, rbuf: &mut [u8]) -> usize;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("no device at address {0:#04x}")]
    NoDevice(u8),
    #[error("address {0:#04x} is already in use")]
    AddressInUse(u8),
    #[error("address {0:#04x} does not fit in 7 bits")]
    InvalidAddress(u8),
    #[error("bus closed")]
    Closed,
}

pub struct Bus {
    name: String,
    slaves: BTreeMap<u8, Box<dyn BusSlave + Send>>,
}

impl Bus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slaves: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addresses(&self) -> impl Iterator<Item = u8> + '_ {
        self.slaves.keys().copied()
    }

    pub fn attach(
        &mut self,
        address: u8,
        slave: impl BusSlave + Send + 'static,
    ) -> Result<(), BusError> {
        if address > ADDRESS_MAX {
            return Err(BusError::InvalidAddress(address));
        }

        if self.slaves.contains_key(&address) {
            return Err(BusError::AddressInUse(address));
        }

        self.slaves.insert(address, Box::new(slave));
        Ok(())
    }

    pub fn write(&mut self, address: u8, wbuf: &[u8]) -> Result<usize, BusError> {
        let slave = self
            .slaves
            .get_mut(&address)
            .ok_or(BusError::NoDevice(address))?;

        let consumed = slave.write(wbuf);
        trace!(bus = %self.name, address, ?wbuf, consumed, "write");
        Ok(consumed)
    }

    pub fn read(&mut self, address: u8, rbuf: &mut [u8]) -> Result<usize, BusError> {
        let slave = self
            .slaves
            .get_mut(&address)
            .ok_or(BusError::NoDevice(address))?;

        let produced = slave.read(rbuf);
        trace!(bus = %self.name, address, ?rbuf, produced, "read");
        Ok(produced)
    }
}

#[cfg(test)]
mod test {
    use super::{Bus, BusError, BusSlave};

    /// Echoes the last write back on read.
    #[derive(Default)]
    struct Echo(Vec<u8>);

    impl BusSlave for Echo {
        fn write(&mut self, wbuf: &[u8]) -> usize {
            self.0 = wbuf.to_vec();
            wbuf.len()
        }

        fn read(&mut self, rbuf: &mut [u8]) -> usize {
            let n = rbuf.len().min(self.0.len());
            rbuf[..n].copy_from_slice(&self.0[..n]);
            n
        }
    }

    #[test]
    fn routes_by_address() {
        let mut bus = Bus::new("i2c_test");
        bus.attach(0x10, Echo::default()).unwrap();
        bus.attach(0x11, Echo::default()).unwrap();

        assert_eq!(bus.write(0x10, &[1, 2, 3]), Ok(3));
        assert_eq!(bus.write(0x11, &[9]), Ok(1));

        let mut rbuf = [0u8; 3];
        assert_eq!(bus.read(0x10, &mut rbuf), Ok(3));
        assert_eq!(rbuf, [1, 2, 3]);
        assert_eq!(bus.read(0x11, &mut rbuf), Ok(1));
        assert_eq!(rbuf[0], 9);

        assert_eq!(bus.addresses().collect::<Vec<_>>(), vec![0x10, 0x11]);
    }

    #[test]
    fn attach_rejects_bad_addresses() {
        let mut bus = Bus::new("i2c_test");
        bus.attach(0x40, Echo::default()).unwrap();

        assert_eq!(
            bus.attach(0x40, Echo::default()),
            Err(BusError::AddressInUse(0x40))
        );
        assert_eq!(
            bus.attach(0x80, Echo::default()),
            Err(BusError::InvalidAddress(0x80))
        );
    }

    #[test]
    fn missing_device() {
        let mut bus = Bus::new("i2c_test");
        assert_eq!(bus.write(0x22, &[0x01, 0x00]), Err(BusError::NoDevice(0x22)));
        assert_eq!(bus.read(0x22, &mut [0u8; 2]), Err(BusError::NoDevice(0x22)));
    }
}
