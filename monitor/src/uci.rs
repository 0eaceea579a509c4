//! Reads the `quectel.modem` UCI section on OpenWrt routers.
//!
//! UCI stores every option as text, with durations in seconds. The overlay
//! converts them to the units of [`crate::settings::Settings`] and drops values
//! that do not parse.

use std::{path::Path, process::Command};

use serde::Serialize;
use tracing::{debug, warn};

use crate::settings::Backend;

pub const OPENWRT_RELEASE: &str = "/etc/openwrt_release";
const SECTION: &str = "quectel.modem";

/// Only the options that are set; serializes to the same shape as the config
/// file so it can be merged over it.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct UciOverlay {
    #[serde(skip_serializing_if = "ModemOverlay::is_empty")]
    pub modem: ModemOverlay,
    #[serde(skip_serializing_if = "MonitorOverlay::is_empty")]
    pub monitor: MonitorOverlay,
    #[serde(skip_serializing_if = "BandsOverlay::is_empty")]
    pub bands: BandsOverlay,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct ModemOverlay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baudrate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus_id: Option<String>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct MonitorOverlay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_interval_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beep_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beeps_enabled: Option<bool>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct BandsOverlay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<Vec<u16>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nr5g: Option<Vec<u16>>,
}

impl ModemOverlay {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl MonitorOverlay {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl BandsOverlay {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl UciOverlay {
    /// Reads UCI when running on OpenWrt, otherwise returns an empty overlay.
    pub fn load() -> Self {
        if !Path::new(OPENWRT_RELEASE).exists() {
            return Self::default();
        }
        debug!("OpenWrt detected, reading UCI options");

        Self::from_lookup(uci_get)
    }

    /// Builds the overlay from `lookup(option)`, which returns the raw UCI
    /// value of `quectel.modem.<option>`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let secs = |key: &str| {
            get(key)
                .and_then(|v| parse_logged::<f64>(key, &v))
                .and_then(secs_to_ms)
        };
        let bands = |key: &str| get(key).and_then(|v| band_list(key, &v));

        Self {
            modem: ModemOverlay {
                backend: get("backend")
                    .and_then(|v| parse_logged("backend", &v)),
                device: get("device"),
                baudrate: get("baudrate")
                    .and_then(|v| parse_logged("baudrate", &v)),
                timeout_ms: secs("timeout"),
                bus_id: get("bus_id"),
            },
            monitor: MonitorOverlay {
                refresh_interval_secs: get("refresh_interval")
                    .and_then(|v| parse_logged("refresh_interval", &v)),
                beep_interval_ms: secs("beep_interval"),
                beeps_enabled: get("beeps_enabled").map(|v| {
                    matches!(
                        v.to_ascii_lowercase().as_str(),
                        "1" | "true" | "yes" | "on"
                    )
                }),
            },
            bands: BandsOverlay {
                lte: bands("lte_bands"),
                nr5g: bands("nr5g_bands"),
            },
        }
    }
}

fn uci_get(option: &str) -> Option<String> {
    let output = Command::new("uci")
        .args(["-q", "get", &format!("{SECTION}.{option}")])
        .output();
    match output {
        Ok(out) if out.status.success() => {
            Some(String::from_utf8_lossy(&out.stdout).into_owned())
        }
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "failed to run uci");
            None
        }
    }
}

fn parse_logged<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    let parsed = value.parse().ok();
    if parsed.is_none() {
        warn!(key, value, "ignoring unparsable UCI option");
    }

    parsed
}

fn secs_to_ms(secs: f64) -> Option<u64> {
    (secs.is_finite() && secs >= 0.0).then(|| (secs * 1000.0).round() as u64)
}

/// UCI lists come back space separated.
fn band_list(key: &str, value: &str) -> Option<Vec<u16>> {
    let bands: Option<Vec<u16>> =
        value.split_whitespace().map(|b| b.parse().ok()).collect();
    if bands.is_none() {
        warn!(key, value, "ignoring UCI band list with non-numeric entries");
    }

    bands
}
