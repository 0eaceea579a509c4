use tracing::{debug, warn};

use super::{field, text};
use crate::{
    model::{
        Carrier, CarrierLayout, CarrierRole, CarrierSignal, CellState, Rat,
        Uplink,
    },
    tokenizer,
};

pub const COMMAND: &str = "AT+QCAINFO";
const PREFIX: &str = "+QCAINFO";

/// Parses `AT+QCAINFO`, one [`Carrier`] per line in reported order.
///
/// Every line starts with `<role>,<channel>,<bandwidth>,<band name>`. What
/// follows depends on firmware, role and radio and is told apart by the field
/// count alone:
///
/// - 5: pci
/// - 9: state, pci, ul configured, ul band, ul channel
/// - 10: state, pci, rsrp, rsrq, rssi, rssnr
/// - 12: state, pci, ul configured, ul band, ul channel, rsrp, rsrq, rssnr
/// - 13: state, pci, rsrp, rsrq, rssi, rssnr, ul configured, ul band,
///   ul channel
///
/// The trailing metric is RSSNR, which is stored as such and never as SINR.
pub fn parse_carriers(response: &str) -> Vec<Carrier> {
    tokenizer::rows(response, PREFIX)
        .filter_map(|fields| parse_carrier(&fields))
        .collect()
}

fn parse_carrier(f: &[String]) -> Option<Carrier> {
    if f.len() < 4 {
        debug!(?f, "short +QCAINFO line skipped");
        return None;
    }
    let role = match f[0].as_str() {
        "PCC" => CarrierRole::Primary,
        "SCC" => CarrierRole::Secondary,
        other => {
            warn!(role = other, "unknown carrier role, line skipped");
            return None;
        }
    };
    let band_name = f[3].trim().to_owned();
    let rat = if band_name.contains("NR5G") {
        Rat::Nr5g
    } else {
        Rat::Lte
    };
    let band = band_name
        .split_whitespace()
        .next_back()
        .and_then(|n| n.parse().ok());
    let state = || f.get(4).and_then(|code| CellState::from_code(role, code));

    let mut carrier = Carrier {
        role,
        rat,
        channel: field(f, 1),
        bandwidth_raw: field(f, 2),
        band_name,
        band,
        pci: None,
        state: None,
        signal: CarrierSignal::default(),
        uplink: None,
        layout: CarrierLayout::Unrecognized(f.len()),
        freq_mhz: None,
        bandwidth_mhz: None,
    };

    match f.len() {
        5 => {
            carrier.layout = CarrierLayout::PciOnly;
            carrier.pci = field(f, 4);
        }
        9 => {
            carrier.layout = CarrierLayout::NoSignal;
            carrier.state = state();
            carrier.pci = field(f, 5);
            carrier.uplink = Some(uplink(f, 6));
        }
        10 => {
            carrier.layout = CarrierLayout::Signal;
            carrier.state = state();
            carrier.pci = field(f, 5);
            carrier.signal = CarrierSignal {
                rsrp: field(f, 6),
                rsrq: field(f, 7),
                rssi: field(f, 8),
                rssnr: field(f, 9),
                sinr: None,
            };
        }
        12 => {
            carrier.layout = CarrierLayout::UplinkThenSignal;
            carrier.state = state();
            carrier.pci = field(f, 5);
            carrier.uplink = Some(uplink(f, 6));
            carrier.signal = CarrierSignal {
                rsrp: field(f, 9),
                rsrq: field(f, 10),
                rssi: None,
                rssnr: field(f, 11),
                sinr: None,
            };
        }
        13 => {
            carrier.layout = CarrierLayout::SignalThenUplink;
            carrier.state = state();
            carrier.pci = field(f, 5);
            carrier.signal = CarrierSignal {
                rsrp: field(f, 6),
                rsrq: field(f, 7),
                rssi: field(f, 8),
                rssnr: field(f, 9),
                sinr: None,
            };
            carrier.uplink = Some(uplink(f, 10));
        }
        n => warn!(
            fields = n,
            role = %role,
            "unrecognized +QCAINFO layout, keeping channel and band only"
        ),
    }

    Some(carrier)
}

fn uplink(f: &[String], start: usize) -> Uplink {
    Uplink {
        configured: field::<u8>(f, start).map(|v| v != 0),
        band: text(f, start + 1),
        channel: field(f, start + 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(line: &str) -> Carrier {
        let mut carriers = parse_carriers(line);
        assert_eq!(carriers.len(), 1, "{line}");
        carriers.remove(0)
    }

    #[test]
    fn primary_ten_fields() {
        let c =
            one(r#"+QCAINFO: "PCC",275,75,"LTE BAND 1",1,280,-99,-14,-67,-4"#);
        assert_eq!(c.role, CarrierRole::Primary);
        assert_eq!(c.rat, Rat::Lte);
        assert_eq!(c.channel, Some(275));
        assert_eq!(c.bandwidth_raw, Some(75));
        assert_eq!(c.band, Some(1));
        assert_eq!(c.state, Some(CellState::Registered));
        assert_eq!(c.pci, Some(280));
        assert_eq!(c.layout, CarrierLayout::Signal);
        assert_eq!(c.signal.rsrp, Some(-99));
        assert_eq!(c.signal.rsrq, Some(-14));
        assert_eq!(c.signal.rssi, Some(-67));
        assert_eq!(c.signal.rssnr, Some(-4.0));
        assert_eq!(c.signal.sinr, None);
    }

    #[test]
    fn secondary_ten_fields_uses_signal_layout() {
        let c =
            one(r#"+QCAINFO: "SCC",275,75,"LTE BAND 1",1,280,-99,-14,-67,-4"#);
        assert_eq!(c.role, CarrierRole::Secondary);
        assert_eq!(c.state, Some(CellState::Inactive));
        assert_eq!(c.signal.rsrp, Some(-99));
        assert_eq!(c.signal.sinr, None);
    }

    #[test]
    fn secondary_nr_pci_only() {
        let c = one(r#"+QCAINFO: "SCC",648768,10,"NR5G BAND 78",920"#);
        assert_eq!(c.rat, Rat::Nr5g);
        assert_eq!(c.band, Some(78));
        assert_eq!(c.pci, Some(920));
        assert_eq!(c.layout, CarrierLayout::PciOnly);
        assert_eq!(c.signal, CarrierSignal::default());
        assert_eq!(c.uplink, None);
    }

    #[test]
    fn secondary_without_signal() {
        let c = one(r#"+QCAINFO: "SCC",1350,100,"LTE BAND 3",2,240,0,-,-"#);
        assert_eq!(c.layout, CarrierLayout::NoSignal);
        assert_eq!(c.state, Some(CellState::Active));
        assert_eq!(c.pci, Some(240));
        let ul = c.uplink.unwrap();
        assert_eq!(ul.configured, Some(false));
        assert_eq!(ul.band, None);
        assert_eq!(ul.channel, None);
    }

    #[test]
    fn secondary_uplink_then_signal() {
        let c = one(
            "+QCAINFO: \"SCC\",1350,100,\"LTE BAND 3\",2,240,\
             1,\"LTE BAND 3\",19350,-95,-18,-10",
        );
        assert_eq!(c.layout, CarrierLayout::UplinkThenSignal);
        assert_eq!(c.signal.rsrp, Some(-95));
        assert_eq!(c.signal.rsrq, Some(-18));
        assert_eq!(c.signal.rssi, None);
        assert_eq!(c.signal.rssnr, Some(-10.0));
        let ul = c.uplink.unwrap();
        assert_eq!(ul.configured, Some(true));
        assert_eq!(ul.band.as_deref(), Some("LTE BAND 3"));
        assert_eq!(ul.channel, Some(19350));
    }

    #[test]
    fn secondary_signal_then_uplink() {
        let c = one(
            "+QCAINFO: \"SCC\",1350,100,\"LTE BAND 3\",1,240,\
             -95,-18,-68,-10,0,-,-",
        );
        assert_eq!(c.layout, CarrierLayout::SignalThenUplink);
        assert_eq!(c.signal.rsrp, Some(-95));
        assert_eq!(c.signal.rssi, Some(-68));
        assert_eq!(c.signal.rssnr, Some(-10.0));
        assert_eq!(c.signal.sinr, None);
        assert_eq!(c.uplink.unwrap().configured, Some(false));
    }

    #[test]
    fn unknown_layout_keeps_identity_only() {
        let c = one(r#"+QCAINFO: "SCC",1350,100,"LTE BAND 3",1,240,-95"#);
        assert_eq!(c.layout, CarrierLayout::Unrecognized(7));
        assert_eq!(c.channel, Some(1350));
        assert_eq!(c.bandwidth_raw, Some(100));
        assert_eq!(c.band, Some(3));
        assert_eq!(c.pci, None);
        assert_eq!(c.state, None);
        assert_eq!(c.signal, CarrierSignal::default());
    }

    #[test]
    fn line_shorter_than_the_common_prefix_is_skipped() {
        let resp = "+QCAINFO: \"SCC\",1350,100\r\n\
            +QCAINFO: \"SCC\",648768,10,\"NR5G BAND 78\",920\r\n\
            OK\r\n";
        let carriers = parse_carriers(resp);
        assert_eq!(carriers.len(), 1);
        assert_eq!(carriers[0].channel, Some(648768));
        assert!(parse_carriers("+QCAINFO: \"SCC\",1350,100\r\nOK").is_empty());
    }

    #[test]
    fn dash_metrics_are_absent() {
        let c = one(r#"+QCAINFO: "PCC",275,75,"LTE BAND 1",1,280,-,-,-,-"#);
        assert_eq!(c.signal, CarrierSignal::default());
    }

    #[test]
    fn keeps_order_and_skips_junk() {
        let resp = "\
            +QCAINFO: \"PCC\",275,75,\"LTE BAND 1\",1,280,-99,-14,-67,-4\r\n\
            +QCAINFO: \"XCC\",1,2,\"LTE BAND 1\"\r\n\
            +QCAINFO: \"SCC\",1\r\n\
            +QCAINFO: \"SCC\",648768,10,\"NR5G BAND 78\",920\r\n\
            \r\nOK\r\n";
        let carriers = parse_carriers(resp);
        assert_eq!(carriers.len(), 2);
        assert_eq!(carriers[0].role, CarrierRole::Primary);
        assert_eq!(carriers[1].rat, Rat::Nr5g);
    }

    #[test]
    fn terminator_only_is_empty() {
        assert!(parse_carriers("OK").is_empty());
    }
}
