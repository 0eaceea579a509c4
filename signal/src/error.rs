use thiserror::Error;

/// Errors from converting user supplied text into typed values.
///
/// Modem responses never produce these; malformed modem output degrades to
/// absent fields instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown radio access technology: {0}")]
    UnknownRat(String),

    #[error("invalid band number '{0}' in band list")]
    InvalidBand(String),

    #[error("band list is empty")]
    EmptyBandList,
}
