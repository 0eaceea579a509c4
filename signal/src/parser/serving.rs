use tracing::{debug, warn};

use super::{field, text};
use crate::{
    model::{LteServingCell, NrServingCell, Rat, ServingCell},
    tokenizer,
};

pub const COMMAND: &str = "AT+QENG=\"servingcell\"";
const PREFIX: &str = "+QENG";

/// Fields up to and including SINR.
const LTE_MIN_FIELDS: usize = 15;
/// Fields up to and including the bandwidth index.
const NR_MIN_FIELDS: usize = 10;

/// Parses `AT+QENG="servingcell"`.
///
/// The modem uses two shapes. Either a status line followed by one line per
/// radio:
///
/// ```text
/// +QENG: "servingcell","NOCONN"
/// +QENG: "LTE","FDD",222,01,328261F,280,275,1,4,4,BE3,-99,-14,-66,7,4,30,-
/// +QENG: "NR5G-NSA",222,01,920,-96,18,-10,648768,78,10,1
/// ```
///
/// or, in LTE-only mode, the radio fields appended to the status line:
///
/// ```text
/// +QENG: "servingcell","NOCONN","LTE","FDD",222,01,...
/// ```
///
/// Both produce the same record. `None` when the response has no serving cell
/// line at all.
pub fn parse_serving_cell(response: &str) -> Option<ServingCell> {
    let mut serving = ServingCell::default();
    let mut seen = false;

    for fields in tokenizer::rows(response, PREFIX) {
        let radio = match fields.first().map(String::as_str) {
            Some("servingcell") => {
                seen = true;
                serving.state = text(&fields, 1);
                // A third field means the radio line was appended.
                if fields.len() > 2 { &fields[2..] } else { continue }
            }
            Some(_) => fields.as_slice(),
            None => continue,
        };

        let tag = radio[0].as_str();
        match Rat::from_qeng_tag(tag) {
            Some(Rat::Lte) => {
                seen = true;
                serving.lte = Some(parse_lte(radio));
            }
            Some(Rat::Nr5g) => {
                seen = true;
                serving.nr = Some(parse_nr(radio));
            }
            None if tag.starts_with("neighbourcell") => {
                debug!("neighbour cell line in servingcell response skipped");
            }
            None => warn!(tag, "unrecognized serving cell radio line"),
        }
    }

    seen.then_some(serving)
}

fn parse_lte(f: &[String]) -> LteServingCell {
    if f.len() < LTE_MIN_FIELDS {
        warn!(
            fields = f.len(),
            expected = LTE_MIN_FIELDS,
            "short LTE serving cell line, keeping what is present"
        );
    }

    LteServingCell {
        duplex: text(f, 1),
        mcc: field(f, 2),
        mnc: text(f, 3),
        cell_id: text(f, 4),
        pci: field(f, 5),
        earfcn: field(f, 6),
        band: field(f, 7),
        ul_bandwidth_idx: field(f, 8),
        dl_bandwidth_idx: field(f, 9),
        tac: text(f, 10),
        rsrp: field(f, 11),
        rsrq: field(f, 12),
        rssi: field(f, 13),
        sinr: field(f, 14),
        cqi: field(f, 15),
        // Reported in tenths of a dBm.
        tx_power_dbm: field::<f64>(f, 16).map(|raw| raw / 10.0),
        srxlev: field(f, 17),
        ..Default::default()
    }
}

fn parse_nr(f: &[String]) -> NrServingCell {
    if f.len() < NR_MIN_FIELDS {
        warn!(
            fields = f.len(),
            expected = NR_MIN_FIELDS,
            "short NR5G-NSA serving cell line, keeping what is present"
        );
    }

    NrServingCell {
        mcc: field(f, 1),
        mnc: text(f, 2),
        pci: field(f, 3),
        rsrp: field(f, 4),
        sinr: field(f, 5),
        rsrq: field(f, 6),
        arfcn: field(f, 7),
        band: field(f, 8),
        bandwidth_idx: field(f, 9),
        scs_idx: field(f, 10),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NSA: &str = "+QENG: \"servingcell\",\"NOCONN\"\r\n\
        +QENG: \"LTE\",\"FDD\",222,01,328261F,280,275,1,4,4,BE3,\
        -99,-14,-66,7,4,30,-\r\n\
        +QENG: \"NR5G-NSA\",222,01,920,-96,18,-10,648768,78,10,1\r\n\
        \r\nOK\r\n";

    #[test]
    fn parses_nsa_multi_line() {
        let serving = parse_serving_cell(NSA).unwrap();
        assert_eq!(serving.state.as_deref(), Some("NOCONN"));

        let lte = serving.lte.unwrap();
        assert_eq!(lte.duplex.as_deref(), Some("FDD"));
        assert_eq!(lte.mcc, Some(222));
        assert_eq!(lte.mnc.as_deref(), Some("01"));
        assert_eq!(lte.cell_id.as_deref(), Some("328261F"));
        assert_eq!(lte.pci, Some(280));
        assert_eq!(lte.earfcn, Some(275));
        assert_eq!(lte.band, Some(1));
        assert_eq!(lte.tac.as_deref(), Some("BE3"));
        assert_eq!(lte.rsrp, Some(-99));
        assert_eq!(lte.rsrq, Some(-14));
        assert_eq!(lte.rssi, Some(-66));
        assert_eq!(lte.sinr, Some(7.0));
        assert_eq!(lte.cqi, Some(4));
        assert_eq!(lte.tx_power_dbm, Some(3.0));
        assert_eq!(lte.srxlev, None);

        let nr = serving.nr.unwrap();
        assert_eq!(nr.pci, Some(920));
        assert_eq!(nr.rsrp, Some(-96));
        assert_eq!(nr.sinr, Some(18.0));
        assert_eq!(nr.rsrq, Some(-10));
        assert_eq!(nr.arfcn, Some(648768));
        assert_eq!(nr.band, Some(78));
        assert_eq!(nr.bandwidth_idx, Some(10));
        assert_eq!(nr.scs_khz(), Some(30));
    }

    #[test]
    fn single_line_shape_matches_multi_line() {
        let multi = "+QENG: \"servingcell\",\"NOCONN\"\r\n\
            +QENG: \"LTE\",\"FDD\",222,01,328261F,280,275,1,4,4,BE3,\
            -99,-14,-66,7\r\n\
            OK\r\n";
        let single = "+QENG: \"servingcell\",\"NOCONN\",\
            \"LTE\",\"FDD\",222,01,328261F,280,275,1,4,4,BE3,-99,-14,-66,7\r\n\
            OK\r\n";

        assert_eq!(parse_serving_cell(multi), parse_serving_cell(single));
        assert!(parse_serving_cell(single).unwrap().lte.is_some());
    }

    #[test]
    fn single_line_shape_with_nr_row() {
        let multi = "+QENG: \"servingcell\",\"NOCONN\"\r\n\
            +QENG: \"NR5G-NSA\",222,01,920,-96,18,-10,648768,78,10,1\r\n\
            OK\r\n";
        let single = "+QENG: \"servingcell\",\"NOCONN\",\
            \"NR5G-NSA\",222,01,920,-96,18,-10,648768,78,10,1\r\n\
            OK\r\n";

        let serving = parse_serving_cell(single).unwrap();
        assert_eq!(serving, parse_serving_cell(multi).unwrap());
        assert_eq!(serving.lte, None);
        let nr = serving.nr.unwrap();
        assert_eq!(nr.pci, Some(920));
        assert_eq!(nr.arfcn, Some(648768));
        assert_eq!(nr.sinr, Some(18.0));
    }

    #[test]
    fn searching_has_state_only() {
        let serving =
            parse_serving_cell("+QENG: \"servingcell\",\"SEARCH\"\r\nOK")
                .unwrap();
        assert_eq!(serving.state.as_deref(), Some("SEARCH"));
        assert_eq!(serving.lte, None);
        assert_eq!(serving.nr, None);
    }

    #[test]
    fn short_line_keeps_leading_fields() {
        let serving = parse_serving_cell(
            "+QENG: \"LTE\",\"FDD\",222,01,328261F,280,275\r\nOK",
        )
        .unwrap();
        let lte = serving.lte.unwrap();
        assert_eq!(lte.pci, Some(280));
        assert_eq!(lte.earfcn, Some(275));
        assert_eq!(lte.rsrp, None);
        assert_eq!(lte.sinr, None);
    }

    #[test]
    fn dashes_are_absent_not_zero() {
        let serving = parse_serving_cell(
            "+QENG: \"NR5G-NSA\",222,01,920,-,-,-,648768,78,10,1\r\nOK",
        )
        .unwrap();
        let nr = serving.nr.unwrap();
        assert_eq!(nr.rsrp, None);
        assert_eq!(nr.sinr, None);
        assert_eq!(nr.pci, Some(920));
    }

    #[test]
    fn nothing_to_parse() {
        assert_eq!(parse_serving_cell("OK"), None);
        assert_eq!(parse_serving_cell("ERROR"), None);
        assert_eq!(parse_serving_cell("+QENG: \"WCDMA\",1,2\r\nOK"), None);
    }
}
