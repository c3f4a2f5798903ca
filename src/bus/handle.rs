use std::thread::JoinHandle;

use bytes::{Bytes, BytesMut};
use embedded_hal::blocking::i2c::{Read, Write, WriteRead};
use tracing::{debug, trace};

use super::{Bus, BusError};

/// A single master transaction, answered on `reply`.
#[derive(Debug)]
pub enum Transaction {
    Write {
        address: u8,
        data: Bytes,
        reply: flume::Sender<Result<usize, BusError>>,
    },
    Read {
        address: u8,
        len: usize,
        reply: flume::Sender<Result<Bytes, BusError>>,
    },
}

/// Moves `bus` onto its own thread and serves transactions until every
/// sender for `txn_rx` is dropped.
pub fn spawn_thread(
    mut bus: Bus,
    txn_rx: flume::Receiver<Transaction>,
) -> JoinHandle<anyhow::Result<()>> {
    std::thread::spawn(move || {
        debug!(bus = %bus.name(), "bus thread started");

        for txn in txn_rx.iter() {
            trace!("serving {txn:?}");

            match txn {
                Transaction::Write {
                    address,
                    data,
                    reply,
                } => {
                    let _ = reply.send(bus.write(address, &data));
                }
                Transaction::Read {
                    address,
                    len,
                    reply,
                } => {
                    let mut buf = BytesMut::zeroed(len);
                    let result = bus.read(address, &mut buf).map(|produced| {
                        buf.truncate(produced.min(len));
                        buf.freeze()
                    });
                    let _ = reply.send(result);
                }
            }
        }

        debug!(bus = %bus.name(), "all handles dropped, closing bus");

        Ok(())
    })
}

/// Master-side endpoint of a bus served by [`spawn_thread`].
#[derive(Debug, Clone)]
pub struct BusHandle {
    txn_tx: flume::Sender<Transaction>,
}

impl BusHandle {
    pub fn new(txn_tx: flume::Sender<Transaction>) -> Self {
        Self { txn_tx }
    }

    /// Writes `data` to `address`, returning the count the slave consumed.
    pub fn send_write(&self, address: u8, data: &[u8]) -> Result<usize, BusError> {
        let (reply, reply_rx) = flume::bounded(1);
        self.txn_tx
            .send(Transaction::Write {
                address,
                data: Bytes::copy_from_slice(data),
                reply,
            })
            .map_err(|_| BusError::Closed)?;

        reply_rx.recv().map_err(|_| BusError::Closed)?
    }

    /// Reads `len` bytes from `address`.
    pub fn send_read(&self, address: u8, len: usize) -> Result<Bytes, BusError> {
        let (reply, reply_rx) = flume::bounded(1);
        self.txn_tx
            .send(Transaction::Read {
                address,
                len,
                reply,
            })
            .map_err(|_| BusError::Closed)?;

        reply_rx.recv().map_err(|_| BusError::Closed)?
    }
}

impl Write for BusHandle {
    type Error = BusError;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        let consumed = self.send_write(address, bytes)?;
        if consumed != bytes.len() {
            trace!(address, consumed, len = bytes.len(), "short write acknowledged");
        }
        Ok(())
    }
}

impl Read for BusHandle {
    type Error = BusError;

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let data = self.send_read(address, buffer.len())?;
        buffer[..data.len()].copy_from_slice(&data);
        Ok(())
    }
}

impl WriteRead for BusHandle {
    type Error = BusError;

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        Write::write(self, address, bytes)?;
        Read::read(self, address, buffer)
    }
}
