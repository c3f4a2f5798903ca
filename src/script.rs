//! Line-oriented bus master, for driving the simulator by hand or from a file.
//!
//! ```text
//! # comments and blank lines are skipped
//! write 0x40 0x04 0x00
//! read 0x40
//! w 0x41 0x10 0xe2 0x80
//! r 0x41 2
//! ```
//!
//! Numbers are decimal or `0x` prefixed hex.

use std::io::{BufRead, Write};

use anyhow::Context;
use thiserror::Error;
use tracing::warn;

use crate::{
    bus::BusHandle,
    util::{hex_bytes, parse_number},
};

const DEFAULT_READ_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Write { address: u8, data: Vec<u8> },
    Read { address: u8, len: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command {0:?}")]
    Command(String),
    #[error("missing address")]
    MissingAddress,
    #[error("invalid number {0:?}")]
    Number(String),
    #[error("unexpected argument {0:?}")]
    Trailing(String),
}

fn number(token: &str) -> Result<u8, ParseError> {
    parse_number(token).ok_or_else(|| ParseError::Number(token.to_string()))
}

/// Parses one line. Blank lines and comments give `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Step>, ParseError> {
    let line = line.split('#').next().unwrap_or_default();
    let mut tokens = line.split_whitespace();

    let Some(command) = tokens.next() else {
        return Ok(None);
    };

    let address = number(tokens.next().ok_or(ParseError::MissingAddress)?)?;

    let step = match command {
        "write" | "w" => Step::Write {
            address,
            data: tokens.map(number).collect::<Result<_, _>>()?,
        },
        "read" | "r" => {
            let len = match tokens.next() {
                Some(token) => number(token)? as usize,
                None => DEFAULT_READ_LEN,
            };

            if let Some(extra) = tokens.next() {
                return Err(ParseError::Trailing(extra.to_string()));
            }

            Step::Read { address, len }
        }
        other => return Err(ParseError::Command(other.to_string())),
    };

    Ok(Some(step))
}

/// Runs every line of `input` against the bus and prints one result line per
/// transaction. Unparseable lines and bus errors are reported and skipped.
pub fn run(handle: &BusHandle, input: impl BufRead, mut output: impl Write) -> anyhow::Result<()> {
    for (index, line) in input.lines().enumerate() {
        let line = line.context("failed to read script")?;
        let lineno = index + 1;

        let step = match parse_line(&line) {
            Ok(Some(step)) => step,
            Ok(None) => continue,
            Err(err) => {
                warn!("line {lineno}: {err}");
                writeln!(output, "line {lineno}: {err}")?;
                continue;
            }
        };

        match step {
            Step::Write { address, data } => match handle.send_write(address, &data) {
                Ok(consumed) => writeln!(
                    output,
                    "write {address:#04x} [{}] -> {consumed}",
                    hex_bytes(&data)
                )?,
                Err(err) => writeln!(output, "write {address:#04x}: {err}")?,
            },
            Step::Read { address, len } => match handle.send_read(address, len) {
                Ok(data) if data.len() >= 2 => writeln!(
                    output,
                    "read {address:#04x} -> [{}] {:#06x}",
                    hex_bytes(&data),
                    u16::from_le_bytes([data[0], data[1]])
                )?,
                Ok(data) => writeln!(output, "read {address:#04x} -> [{}]", hex_bytes(&data))?,
                Err(err) => writeln!(output, "read {address:#04x}: {err}")?,
            },
        }
    }

    output.flush()?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::{parse_line, run, ParseError, Step};
    use crate::battery::Battery;
    use crate::bus::{spawn_thread, Bus, BusHandle};
    use crate::sink::RecordingSink;

    #[test]
    fn parse_steps() {
        assert_eq!(
            parse_line("write 0x40 0x04 0x00"),
            Ok(Some(Step::Write {
                address: 0x40,
                data: vec![0x04, 0x00]
            }))
        );
        assert_eq!(
            parse_line("  r 64  # version"),
            Ok(Some(Step::Read {
                address: 0x40,
                len: 2
            }))
        );
        assert_eq!(
            parse_line("read 0x40 4"),
            Ok(Some(Step::Read {
                address: 0x40,
                len: 4
            }))
        );
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   # nothing"), Ok(None));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            parse_line("poke 0x40"),
            Err(ParseError::Command("poke".into()))
        );
        assert_eq!(parse_line("write"), Err(ParseError::MissingAddress));
        assert_eq!(
            parse_line("write 0x40 0x100"),
            Err(ParseError::Number("0x100".into()))
        );
        assert_eq!(
            parse_line("read 0x40 2 2"),
            Err(ParseError::Trailing("2".into()))
        );
    }

    #[test]
    fn run_script() {
        let mut bus = Bus::new("i2c_test");
        bus.attach(0x40, Battery::new(1, RecordingSink::default()))
            .unwrap();
        let (txn_tx, txn_rx) = flume::bounded(16);
        let join = spawn_thread(bus, txn_rx);
        let handle = BusHandle::new(txn_tx);

        let script = "\
            # identity\n\
            write 0x40 0x04 0x00\n\
            read 0x40\n\
            write 0x40 0x10 0xe2\n\
            read 0x40\n\
            bogus 1\n\
            read 0x41\n";

        let mut output = Vec::new();
        run(&handle, script.as_bytes(), &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "write 0x40 [04 00] -> 2",
                "read 0x40 -> [01 10] 0x1001",
                "write 0x40 [10 e2] -> 2",
                "read 0x40 -> [ff ff] 0xffff",
                "line 6: unknown command \"bogus\"",
                "read 0x41: no device at address 0x41",
            ]
        );

        drop(handle);
        join.join().unwrap().unwrap();
    }
}
