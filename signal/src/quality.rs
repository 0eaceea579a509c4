//! Maps signal metrics to a coarse quality level and an audible SINR cue.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Ordered worst to best, so `Poor < Excellent`.
#[derive(
    Debug,
    Display,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SignalQuality {
    #[display("poor")]
    Poor,
    #[display("fair")]
    Fair,
    #[display("good")]
    Good,
    #[display("excellent")]
    Excellent,
}

impl SignalQuality {
    /// RSRP in dBm.
    pub fn from_rsrp(rsrp: i32) -> Self {
        match rsrp {
            -80.. => Self::Excellent,
            -90.. => Self::Good,
            -100.. => Self::Fair,
            _ => Self::Poor,
        }
    }

    /// RSRQ in dB.
    pub fn from_rsrq(rsrq: i32) -> Self {
        match rsrq {
            -10.. => Self::Excellent,
            -12.. => Self::Good,
            -15.. => Self::Fair,
            _ => Self::Poor,
        }
    }

    /// SINR in dB. Same thresholds for LTE and NR.
    pub fn from_sinr(sinr: f64) -> Self {
        if sinr >= 20.0 {
            Self::Excellent
        } else if sinr >= 13.0 {
            Self::Good
        } else if sinr >= 0.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    /// Quality of a cell from the first metric available, in the order SINR,
    /// RSRP, RSRQ.
    pub fn overall(
        sinr: Option<f64>,
        rsrp: Option<i32>,
        rsrq: Option<i32>,
    ) -> Option<Self> {
        sinr.map(Self::from_sinr)
            .or_else(|| rsrp.map(Self::from_rsrp))
            .or_else(|| rsrq.map(Self::from_rsrq))
    }
}

/// Number of beeps (0 to 6) announcing the current SINR while aiming an
/// antenna. Never decreases as SINR grows.
pub fn beep_count(sinr: Option<f64>) -> u8 {
    let Some(sinr) = sinr else {
        return 0;
    };
    const STEPS: [(f64, u8); 6] =
        [(19.0, 6), (18.0, 5), (17.0, 4), (16.0, 3), (14.0, 2), (12.0, 1)];

    STEPS
        .iter()
        .find(|(threshold, _)| sinr >= *threshold)
        .map_or(0, |(_, beeps)| *beeps)
}
