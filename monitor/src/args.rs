use std::{path::PathBuf, str::FromStr};

use clap::{
    Args as ClapArgs, Parser, Subcommand,
    builder::{Styles, styling::AnsiColor},
};
use quectel_signal::{ParseError, parser::parse_band_list};

use crate::settings::Backend;

#[derive(Debug, Parser)]
#[command(version, about, styles = clap_v3_styles())]
pub struct Args {
    /// Config file, instead of searching the default locations.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// How to reach the modem: `serial` or `gl_modem`.
    #[arg(long, global = true)]
    pub backend: Option<Backend>,

    /// Serial device of the modem's AT port, or `auto` to search for it.
    #[arg(short, long, global = true)]
    pub device: Option<String>,

    #[arg(long, global = true)]
    pub baudrate: Option<u32>,

    /// Response timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// USB bus of the modem for the `gl_modem` backend, e.g. `1-1.2`.
    #[arg(long = "bus", global = true)]
    pub bus_id: Option<String>,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// More log output; repeat for more.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print one status snapshot.
    Status {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Refresh the status periodically, beeping with NR SINR.
    Watch {
        /// Seconds between refreshes.
        #[arg(short, long)]
        interval: Option<f64>,

        #[arg(long)]
        no_beep: bool,
    },
    /// Show or change band preferences.
    Bands(BandsArgs),
    /// Show the 4G and 5G cell locks.
    Lock,
}

#[derive(Debug, ClapArgs)]
pub struct BandsArgs {
    #[command(subcommand)]
    pub action: Option<BandsAction>,
}

#[derive(Debug, Subcommand)]
pub enum BandsAction {
    /// Restrict the modem to the given bands. Without flags, the lists from
    /// the `[bands]` config section are applied.
    Set {
        /// LTE bands, e.g. `1:3:7:20`.
        #[arg(long)]
        lte: Option<BandList>,

        /// NR bands for NSA and SA, e.g. `78`.
        #[arg(long)]
        nr5g: Option<BandList>,
    },
}

/// Band numbers given on the command line, separated by `:` or `,`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandList(pub Vec<u16>);

impl FromStr for BandList {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_band_list(s).map(Self)
    }
}

fn clap_v3_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default())
        .usage(AnsiColor::Green.on_default())
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}
