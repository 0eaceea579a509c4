//! Talks to a Quectel modem over its AT serial port and presents what
//! [`quectel_signal`] makes of the responses.

pub mod args;
pub mod logging;
pub mod poll;
pub mod render;
pub mod settings;
pub mod transport;
pub mod uci;
