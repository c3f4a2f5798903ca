//! Battery management unit simulator: addressable units answering a two-phase
//! command protocol on an in-process two-wire bus.

pub mod battery;
pub mod bus;
pub mod config;
pub mod driver;
pub mod script;
pub mod sink;
pub mod util;
