//! Typed records produced by the parsers and assembled into a
//! [`crate::status::StatusSnapshot`].
//!
//! Every value the modem may omit or report as `-` is an `Option`. Fields named
//! `*_mhz` are not reported by the modem; the status synthesizer derives them
//! from the channel tables.

use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{error::ParseError, frequency, quality::SignalQuality};

/// Radio access technology of a cell or carrier.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Rat {
    #[display("LTE")]
    Lte,
    #[display("NR5G")]
    Nr5g,
}

impl Rat {
    /// Maps the radio tag printed by `AT+QENG` (`"LTE"`, `"NR5G-NSA"`).
    pub fn from_qeng_tag(tag: &str) -> Option<Self> {
        match tag {
            "LTE" => Some(Self::Lte),
            "NR5G-NSA" => Some(Self::Nr5g),
            _ => None,
        }
    }
}

impl FromStr for Rat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lte" | "4g" => Ok(Self::Lte),
            "nr5g" | "nr" | "5g" => Ok(Self::Nr5g),
            _ => Err(ParseError::UnknownRat(s.to_owned())),
        }
    }
}

/// Identification block printed by `ATI`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub model: String,
    pub revision: Option<String>,
}

/// Registered network as reported by `AT+QSPN`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorInfo {
    pub long_name: String,
    pub short_name: String,
    /// MCC and MNC concatenated, exactly as reported (e.g. `"22201"`).
    pub plmn: String,
}

impl OperatorInfo {
    /// Mobile country code: the first three digits of the PLMN.
    pub fn mcc(&self) -> Option<&str> {
        self.plmn_parts().map(|(mcc, _)| mcc)
    }

    /// Mobile network code, leading zeros preserved.
    pub fn mnc(&self) -> Option<&str> {
        self.plmn_parts().map(|(_, mnc)| mnc)
    }

    fn plmn_parts(&self) -> Option<(&str, &str)> {
        let plmn = self.plmn.as_str();
        let valid = (5..=6).contains(&plmn.len())
            && plmn.bytes().all(|b| b.is_ascii_digit());

        valid.then(|| plmn.split_at(3))
    }
}

/// Result of `AT+QENG="servingcell"`.
///
/// In NSA mode both cells are present at the same time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServingCell {
    /// UE state: `SEARCH`, `LIMSRV`, `NOCONN` or `CONNECT`.
    pub state: Option<String>,
    pub lte: Option<LteServingCell>,
    pub nr: Option<NrServingCell>,
}

impl ServingCell {
    pub fn cell(&self, rat: Rat) -> Option<CellMetrics> {
        match rat {
            Rat::Lte => self.lte.as_ref().map(LteServingCell::metrics),
            Rat::Nr5g => self.nr.as_ref().map(NrServingCell::metrics),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LteServingCell {
    /// `FDD` or `TDD`.
    pub duplex: Option<String>,
    pub mcc: Option<u16>,
    pub mnc: Option<String>,
    /// 28 bit E-UTRAN cell identity, hex encoded as reported.
    pub cell_id: Option<String>,
    pub pci: Option<u16>,
    pub earfcn: Option<u32>,
    pub band: Option<u16>,
    pub ul_bandwidth_idx: Option<u8>,
    pub dl_bandwidth_idx: Option<u8>,
    /// Tracking area code, hex encoded as reported.
    pub tac: Option<String>,
    pub rsrp: Option<i32>,
    pub rsrq: Option<i32>,
    pub rssi: Option<i32>,
    pub sinr: Option<f64>,
    pub cqi: Option<u8>,
    pub tx_power_dbm: Option<f64>,
    pub srxlev: Option<i32>,

    pub freq_mhz: Option<f64>,
    pub dl_bandwidth_mhz: Option<f64>,
    pub ul_bandwidth_mhz: Option<f64>,
}

impl LteServingCell {
    /// eNodeB id, the upper 20 bits of the cell identity.
    pub fn enodeb_id(&self) -> Option<u32> {
        self.cell_id.as_deref().and_then(frequency::extract_enodeb)
    }

    /// Sector id, the lower 8 bits of the cell identity.
    pub fn sector_id(&self) -> Option<u8> {
        self.cell_id.as_deref().and_then(frequency::extract_sector)
    }

    pub fn tac_value(&self) -> Option<u32> {
        self.tac
            .as_deref()
            .and_then(|tac| u32::from_str_radix(tac, 16).ok())
    }

    pub fn quality(&self) -> Option<SignalQuality> {
        SignalQuality::overall(self.sinr, self.rsrp, self.rsrq)
    }

    fn metrics(&self) -> CellMetrics {
        CellMetrics {
            pci: self.pci,
            channel: self.earfcn,
            rsrp: self.rsrp,
            rsrq: self.rsrq,
            sinr: self.sinr,
            bandwidth_mhz: self.dl_bandwidth_mhz,
        }
    }
}

/// NR cell of an NSA connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NrServingCell {
    pub mcc: Option<u16>,
    pub mnc: Option<String>,
    pub pci: Option<u16>,
    pub rsrp: Option<i32>,
    pub sinr: Option<f64>,
    pub rsrq: Option<i32>,
    pub arfcn: Option<u32>,
    pub band: Option<u16>,
    pub bandwidth_idx: Option<u8>,
    /// Subcarrier spacing index, see [`frequency::nr_scs_khz`].
    pub scs_idx: Option<u8>,

    pub freq_mhz: Option<f64>,
    pub bandwidth_mhz: Option<f64>,
}

impl NrServingCell {
    pub fn scs_khz(&self) -> Option<u16> {
        self.scs_idx.and_then(frequency::nr_scs_khz)
    }

    pub fn quality(&self) -> Option<SignalQuality> {
        SignalQuality::overall(self.sinr, self.rsrp, self.rsrq)
    }

    fn metrics(&self) -> CellMetrics {
        CellMetrics {
            pci: self.pci,
            channel: self.arfcn,
            rsrp: self.rsrp,
            rsrq: self.rsrq,
            sinr: self.sinr,
            bandwidth_mhz: self.bandwidth_mhz,
        }
    }
}

/// The part of a serving cell that carrier reconciliation looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub pci: Option<u16>,
    pub channel: Option<u32>,
    pub rsrp: Option<i32>,
    pub rsrq: Option<i32>,
    pub sinr: Option<f64>,
    pub bandwidth_mhz: Option<f64>,
}

#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CarrierRole {
    #[display("PCC")]
    Primary,
    #[display("SCC")]
    Secondary,
}

/// Carrier state column of `AT+QCAINFO`.
///
/// Primary and secondary carriers use different code tables.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    Idle,
    Registered,
    Searching,
    Denied,
    Unknown,
    Roaming,
    Deconfigured,
    Inactive,
    Active,
}

impl CellState {
    pub fn from_code(role: CarrierRole, code: &str) -> Option<Self> {
        let state = match (role, code.trim()) {
            (CarrierRole::Primary, "0") => Self::Idle,
            (CarrierRole::Primary, "1") => Self::Registered,
            (CarrierRole::Primary, "2") => Self::Searching,
            (CarrierRole::Primary, "3") => Self::Denied,
            (CarrierRole::Primary, "4") => Self::Unknown,
            (CarrierRole::Primary, "5") => Self::Roaming,
            (CarrierRole::Secondary, "0") => Self::Deconfigured,
            (CarrierRole::Secondary, "1") => Self::Inactive,
            (CarrierRole::Secondary, "2") => Self::Active,
            _ => return None,
        };

        Some(state)
    }
}

/// Which of the documented `AT+QCAINFO` line shapes a carrier was read from.
///
/// The shape is chosen purely by field count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierLayout {
    /// 5 fields: NR secondary carrier reporting only its PCI.
    PciOnly,
    /// 9 fields: state, PCI and uplink block, no signal.
    NoSignal,
    /// 10 fields: state, PCI, RSRP, RSRQ, RSSI, RSSNR.
    Signal,
    /// 12 fields: uplink block followed by RSRP, RSRQ, RSSNR.
    UplinkThenSignal,
    /// 13 fields: signal block followed by uplink block.
    SignalThenUplink,
    /// Any other field count. Only role, RAT, channel, bandwidth and band are
    /// trusted.
    Unrecognized(usize),
}

/// Per-carrier signal block.
///
/// `rssnr` is what `AT+QCAINFO` reports; it is not SINR and is never copied
/// into `sinr`. `sinr` is only ever filled in from the serving cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CarrierSignal {
    pub rsrp: Option<i32>,
    pub rsrq: Option<i32>,
    pub rssi: Option<i32>,
    pub rssnr: Option<f64>,
    pub sinr: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uplink {
    pub configured: Option<bool>,
    pub band: Option<String>,
    pub channel: Option<u32>,
}

/// One component carrier of `AT+QCAINFO`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    pub role: CarrierRole,
    pub rat: Rat,
    pub channel: Option<u32>,
    /// Resource block count for LTE, bandwidth index for NR.
    pub bandwidth_raw: Option<u16>,
    /// Band column as reported, e.g. `"LTE BAND 3"`.
    pub band_name: String,
    pub band: Option<u16>,
    pub pci: Option<u16>,
    pub state: Option<CellState>,
    pub signal: CarrierSignal,
    pub uplink: Option<Uplink>,
    pub layout: CarrierLayout,

    pub freq_mhz: Option<f64>,
    pub bandwidth_mhz: Option<f64>,
}

impl Carrier {
    /// Quality from the authoritative metrics only; `rssnr` is ignored.
    pub fn quality(&self) -> Option<SignalQuality> {
        let signal = &self.signal;
        SignalQuality::overall(signal.sinr, signal.rsrp, signal.rsrq)
    }
}

#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NeighbourScope {
    /// Same frequency as the serving cell.
    #[display("intra")]
    Intra,
    #[display("inter")]
    Inter,
}

/// One line of `AT+QENG="neighbourcell"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighbourCell {
    pub scope: NeighbourScope,
    pub rat: Rat,
    pub channel: u32,
    pub pci: Option<u16>,
    pub rsrq: Option<i32>,
    pub rsrp: Option<i32>,
    pub rssi: Option<i32>,
    pub sinr: Option<f64>,
    pub srxlev: Option<i32>,

    pub freq_mhz: Option<f64>,
}

/// One `AT+QNWPREFCFG` setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandPreference {
    pub name: String,
    pub value: PreferenceValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreferenceValue {
    /// Band numbers in reported order, without duplicates.
    Bands(Vec<u16>),
    Scalar(String),
}

impl BandPreference {
    pub fn bands(&self) -> Option<&[u16]> {
        match &self.value {
            PreferenceValue::Bands(bands) => Some(bands),
            PreferenceValue::Scalar(_) => None,
        }
    }
}

/// Cell lock configuration of one radio, from `AT+QNWLOCK`.
///
/// An empty entry list means locking is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellLock {
    pub rat: Rat,
    pub entries: Vec<LockEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LockEntry {
    Lte {
        channel: u32,
        pci: u16,
    },
    Nr {
        pci: u16,
        channel: u32,
        scs_khz: u16,
        band: u16,
    },
}
