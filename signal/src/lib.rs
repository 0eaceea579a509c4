//! Turns the text that a Quectel 5G modem prints in reply to AT commands into
//! typed, serializable status records.
//!
//! Everything here is a pure function of its input. The transport that talks to
//! the modem lives elsewhere; this crate only ever sees complete response text.
//!
//! Start with [`status::StatusSnapshot::from_responses`] if you have the raw
//! replies of one poll, or with the individual parsers in [`parser`].

#![forbid(unsafe_code)]

pub mod error;
pub mod frequency;
pub mod model;
pub mod parser;
pub mod quality;
pub mod status;
pub mod tokenizer;

pub use error::ParseError;
pub use model::{
    BandPreference, Carrier, CarrierLayout, CarrierRole, CarrierSignal,
    CellLock, CellState, DeviceInfo, LockEntry, LteServingCell, NeighbourCell,
    NeighbourScope, NrServingCell, OperatorInfo, PreferenceValue, Rat,
    ServingCell, Uplink,
};
pub use quality::{SignalQuality, beep_count};
pub use status::{RawResponses, StatusInputs, StatusSnapshot};
