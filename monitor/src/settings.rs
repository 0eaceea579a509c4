use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::{
    args::{Args, Command},
    uci::UciOverlay,
};

pub const ENV_PREFIX: &str = "QUECTEL_";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub modem: ModemSettings,
    pub monitor: MonitorSettings,
    pub bands: BandSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModemSettings {
    pub backend: Backend,
    /// Serial AT port. `auto` (or empty) searches the `ttyUSB` ports for one
    /// that answers `ATI` as a Quectel modem.
    pub device: String,
    pub baudrate: u32,
    pub timeout_ms: u64,
    /// USB bus of the modem, passed to `gl_modem -B`.
    pub bus_id: String,
}

/// How AT commands reach the modem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Direct access to the AT serial port.
    #[default]
    Serial,
    /// The `gl_modem` tool shipped on GL.iNet routers, which owns the port.
    GlModem,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Serial => "serial",
            Self::GlModem => "gl_modem",
        })
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "serial" => Ok(Self::Serial),
            "gl_modem" => Ok(Self::GlModem),
            other => Err(format!(
                "unknown backend '{other}', expected 'serial' or 'gl_modem'"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub refresh_interval_secs: f64,
    pub beep_interval_ms: u64,
    pub beeps_enabled: bool,
    pub color: bool,
}

/// Band lists applied by `bands set` when no list is given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BandSettings {
    pub lte: Vec<u16>,
    pub nr5g: Vec<u16>,
}

impl Default for ModemSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Serial,
            device: "/dev/ttyUSB2".to_owned(),
            baudrate: 115_200,
            timeout_ms: 2_000,
            bus_id: "1-1.2".to_owned(),
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 5.0,
            beep_interval_ms: 600,
            beeps_enabled: true,
            color: true,
        }
    }
}

pub const AUTO_DEVICE: &str = "auto";

impl ModemSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// True when the serial port should be searched for.
    pub fn auto_detect(&self) -> bool {
        let device = self.device.trim();
        device.is_empty() || device.eq_ignore_ascii_case(AUTO_DEVICE)
    }
}

impl MonitorSettings {
    /// Refresh interval, clamped to at least 100ms.
    pub fn refresh_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.refresh_interval_secs)
            .unwrap_or_default()
            .max(Duration::from_millis(100))
    }

    pub fn beep_interval(&self) -> Duration {
        Duration::from_millis(self.beep_interval_ms)
    }
}

/// Command line flags that override configuration. Only flags that were given
/// are serialized, so absent flags leave lower layers alone.
#[derive(Debug, Default, Serialize)]
struct CliOverrides {
    modem: ModemOverrides,
    monitor: MonitorOverrides,
}

#[derive(Debug, Default, Serialize)]
struct ModemOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    backend: Option<Backend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    baudrate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bus_id: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct MonitorOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_interval_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    beeps_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<bool>,
}

impl From<&Args> for CliOverrides {
    fn from(args: &Args) -> Self {
        let (interval, no_beep) = match &args.command {
            Command::Watch { interval, no_beep } => (*interval, *no_beep),
            _ => (None, false),
        };

        Self {
            modem: ModemOverrides {
                backend: args.backend,
                device: args.device.clone(),
                baudrate: args.baudrate,
                timeout_ms: args.timeout_ms,
                bus_id: args.bus_id.clone(),
            },
            monitor: MonitorOverrides {
                refresh_interval_secs: interval,
                beeps_enabled: no_beep.then_some(false),
                color: args.no_color.then_some(false),
            },
        }
    }
}

impl Settings {
    /// Layers, lowest precedence first: built-in defaults, the config file,
    /// UCI on OpenWrt, `QUECTEL_` environment variables (`__` separates the
    /// section from the key, as in `QUECTEL_MODEM__DEVICE`), command line
    /// flags.
    pub fn get(
        args: &Args,
        config: Option<&Path>,
        uci: &UciOverlay,
    ) -> figment::error::Result<Self> {
        let mut figment =
            Figment::from(Serialized::defaults(Settings::default()));
        if let Some(config) = config {
            if !config.is_file() {
                return Err(format!(
                    "config file {} does not exist",
                    config.display()
                )
                .into());
            }
            figment = figment.merge(Toml::file_exact(config));
        }

        figment
            .merge(Serialized::defaults(uci))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(CliOverrides::from(args)))
            .extract()
    }
}

/// Default config file locations, in search order.
pub fn default_config_paths(home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/quectel/config.toml")];
    if let Some(home) = home {
        paths.push(home.join(".config/quectel/config.toml"));
    }
    paths.push(PathBuf::from("./config/quectel.toml"));

    paths
}

/// The first default location that exists, if any.
pub fn find_config(home: Option<&Path>) -> Option<PathBuf> {
    default_config_paths(home)
        .into_iter()
        .find(|path| path.is_file())
}
