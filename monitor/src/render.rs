//! Plain text views of snapshots, band preferences and cell locks.

use std::fmt::{Display, Write as _};

use owo_colors::{AnsiColors, OwoColorize};
use quectel_signal::{
    BandPreference, Carrier, CellLock, LockEntry, LteServingCell,
    NeighbourCell, NrServingCell, PreferenceValue, Rat, SignalQuality,
    StatusSnapshot,
    frequency::{self, BandwidthEncoding},
};

/// Presentation options, decided once by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStyle {
    pub color: bool,
}

impl RenderStyle {
    pub const PLAIN: Self = Self { color: false };

    fn paint(
        self,
        text: impl Display,
        quality: Option<SignalQuality>,
    ) -> String {
        match quality {
            Some(q) if self.color => text.color(quality_color(q)).to_string(),
            _ => text.to_string(),
        }
    }

    fn header(self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_owned()
        }
    }
}

fn quality_color(quality: SignalQuality) -> AnsiColors {
    match quality {
        SignalQuality::Excellent => AnsiColors::Green,
        SignalQuality::Good => AnsiColors::Cyan,
        SignalQuality::Fair => AnsiColors::Yellow,
        SignalQuality::Poor => AnsiColors::Red,
    }
}

fn or_dash<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}

fn channel(rat: Rat, channel: Option<u32>) -> String {
    channel.map_or_else(
        || "-".to_owned(),
        |ch| frequency::format_frequency(rat, ch),
    )
}

fn bandwidth(encoding: BandwidthEncoding, code: Option<u8>) -> String {
    code.map_or_else(
        || "-".to_owned(),
        |code| frequency::format_bandwidth(encoding, code.into()),
    )
}

/// Decoded width if known (possibly taken over from the serving cell),
/// otherwise the raw column.
fn carrier_bandwidth(c: &Carrier) -> String {
    match (c.bandwidth_mhz, c.bandwidth_raw) {
        (Some(mhz), _) => frequency::format_mhz(mhz),
        (None, Some(raw)) => frequency::format_bandwidth(
            BandwidthEncoding::carrier(c.rat),
            raw,
        ),
        (None, None) => "-".to_owned(),
    }
}

fn quality(style: RenderStyle, quality: Option<SignalQuality>) -> String {
    style.paint(or_dash(quality), quality)
}

fn rsrp(style: RenderStyle, value: Option<i32>) -> String {
    style.paint(or_dash(value), value.map(SignalQuality::from_rsrp))
}

fn rsrq(style: RenderStyle, value: Option<i32>) -> String {
    style.paint(or_dash(value), value.map(SignalQuality::from_rsrq))
}

fn sinr(style: RenderStyle, value: Option<f64>) -> String {
    style.paint(or_dash(value), value.map(SignalQuality::from_sinr))
}

pub fn render_status(snapshot: &StatusSnapshot, style: RenderStyle) -> String {
    if snapshot.is_empty() {
        return "No data from modem (no signal or modem unreachable)\n"
            .to_owned();
    }
    let mut out = String::new();

    if let Some(device) = &snapshot.device {
        let _ = write!(
            out,
            "Modem     : {} {}",
            device.manufacturer, device.model
        );
        if let Some(rev) = &device.revision {
            let _ = write!(out, " ({rev})");
        }
        out.push('\n');
    }
    if let Some(op) = &snapshot.operator {
        let _ = writeln!(
            out,
            "Operator  : {} ({}) {}-{}",
            op.long_name,
            op.short_name,
            or_dash(op.mcc()),
            or_dash(op.mnc())
        );
    }
    let state = snapshot.serving.as_ref().and_then(|s| s.state.as_deref());
    if let Some(state) = state {
        let _ = writeln!(out, "State     : {state}");
    }
    if let Some(lte) = snapshot.lte() {
        render_lte(&mut out, lte, style);
    }
    if let Some(nr) = snapshot.nr() {
        render_nr(&mut out, nr, style);
        let _ = writeln!(out, "Beeps     : {}", snapshot.beep_count());
    }

    if !snapshot.carriers.is_empty() {
        let _ = writeln!(out, "\n{}", style.header("Carriers"));
        for carrier in &snapshot.carriers {
            render_carrier(&mut out, carrier, style);
        }
    }
    if !snapshot.neighbours.is_empty() {
        let _ = writeln!(out, "\n{}", style.header("Neighbours"));
        for cell in &snapshot.neighbours {
            render_neighbour(&mut out, cell, style);
        }
    }

    out
}

fn render_lte(out: &mut String, lte: &LteServingCell, style: RenderStyle) {
    let _ = write!(
        out,
        "\n{}  : {} | EARFCN {} | PCI {} | eNB {} / {} | TAC {}",
        style.header("LTE     "),
        channel(Rat::Lte, lte.earfcn),
        or_dash(lte.earfcn),
        or_dash(lte.pci),
        or_dash(lte.enodeb_id()),
        or_dash(lte.sector_id()),
        or_dash(lte.tac.as_deref()),
    );
    if let Some(tac) = lte.tac_value() {
        let _ = write!(out, " ({tac})");
    }
    let _ = writeln!(
        out,
        " | BW DL {} / UL {}",
        bandwidth(BandwidthEncoding::LteIndex, lte.dl_bandwidth_idx),
        bandwidth(BandwidthEncoding::LteIndex, lte.ul_bandwidth_idx),
    );
    let _ = write!(
        out,
        "Signal    : RSRP {} | RSRQ {} | SINR {} | RSSI {}",
        rsrp(style, lte.rsrp),
        rsrq(style, lte.rsrq),
        sinr(style, lte.sinr),
        or_dash(lte.rssi),
    );
    if let Some(tx) = lte.tx_power_dbm {
        let _ = write!(out, " | TX {tx:.1} dBm");
    }
    let _ = writeln!(out, " | Quality {}", quality(style, lte.quality()));
}

fn render_nr(out: &mut String, nr: &NrServingCell, style: RenderStyle) {
    let scs = nr
        .scs_khz()
        .map_or_else(|| "-".to_owned(), |khz| format!("{khz} kHz"));
    let _ = writeln!(
        out,
        "\n{}  : {} | ARFCN {} | PCI {} | BW {} | SCS {scs}",
        style.header("NR5G-NSA"),
        channel(Rat::Nr5g, nr.arfcn),
        or_dash(nr.arfcn),
        or_dash(nr.pci),
        bandwidth(BandwidthEncoding::NrIndex, nr.bandwidth_idx),
    );
    let _ = writeln!(
        out,
        "Signal    : RSRP {} | RSRQ {} | SINR {} | Quality {}",
        rsrp(style, nr.rsrp),
        rsrq(style, nr.rsrq),
        sinr(style, nr.sinr),
        quality(style, nr.quality()),
    );
}

fn render_carrier(out: &mut String, c: &Carrier, style: RenderStyle) {
    let _ = write!(
        out,
        " {} {:<14} | PCI {:<4} | SINR {} | RSRP {} | RSRQ {} | {} | {}",
        c.role,
        c.band_name,
        or_dash(c.pci),
        sinr(style, c.signal.sinr),
        rsrp(style, c.signal.rsrp),
        rsrq(style, c.signal.rsrq),
        carrier_bandwidth(c),
        channel(c.rat, c.channel),
    );
    // Shown separately so it is never mistaken for SINR.
    if let Some(rssnr) = c.signal.rssnr {
        let _ = write!(out, " | RSSNR {rssnr}");
    }
    if let Some(q) = c.quality() {
        let _ = write!(out, " | {}", style.paint(q, Some(q)));
    }
    let uplink = c.uplink.as_ref().filter(|ul| ul.configured == Some(true));
    if let Some(ul) = uplink {
        let _ = write!(
            out,
            " | UL {} {}",
            or_dash(ul.band.as_deref()),
            or_dash(ul.channel)
        );
    }
    if let Some(state) = c.state {
        let _ = write!(out, " | {state}");
    }
    out.push('\n');
}

fn render_neighbour(out: &mut String, n: &NeighbourCell, style: RenderStyle) {
    let _ = writeln!(
        out,
        " {:<5} {} {} | PCI {} | RSRP {} | RSRQ {} | RSSI {}",
        n.scope,
        n.rat,
        channel(n.rat, Some(n.channel)),
        or_dash(n.pci),
        rsrp(style, n.rsrp),
        rsrq(style, n.rsrq),
        or_dash(n.rssi),
    );
}

pub fn render_band_preferences(prefs: &[BandPreference]) -> String {
    if prefs.is_empty() {
        return "No band preferences reported\n".to_owned();
    }

    prefs
        .iter()
        .map(|pref| {
            let value = match &pref.value {
                PreferenceValue::Bands(bands) => bands
                    .iter()
                    .map(u16::to_string)
                    .collect::<Vec<_>>()
                    .join(":"),
                PreferenceValue::Scalar(value) => value.clone(),
            };
            format!("{:<14} {value}\n", pref.name)
        })
        .collect()
}

pub fn render_cell_locks(locks: &[CellLock]) -> String {
    if locks.is_empty() {
        return "No cell lock information reported\n".to_owned();
    }
    let mut out = String::new();
    for lock in locks {
        let label = match lock.rat {
            Rat::Lte => "4G",
            Rat::Nr5g => "5G",
        };
        if lock.entries.is_empty() {
            let _ = writeln!(out, "{label}: not locked");
            continue;
        }
        let _ = writeln!(out, "{label}:");
        for entry in &lock.entries {
            let _ = match entry {
                LockEntry::Lte { channel, pci } => {
                    writeln!(out, "  EARFCN {channel} PCI {pci}")
                }
                LockEntry::Nr {
                    pci,
                    channel,
                    scs_khz,
                    band,
                } => writeln!(
                    out,
                    "  n{band} ARFCN {channel} PCI {pci} SCS {scs_khz} kHz"
                ),
            };
        }
    }

    out
}
