use tracing::debug;

use super::field;
use crate::{
    model::{NeighbourCell, NeighbourScope, Rat},
    tokenizer,
};

pub const COMMAND: &str = "AT+QENG=\"neighbourcell\"";
const PREFIX: &str = "+QENG";

/// Parses LTE lines of `AT+QENG="neighbourcell"`:
///
/// ```text
/// +QENG: "neighbourcell intra","LTE",<earfcn>,<pci>,<rsrq>,<rsrp>,<rssi>,
///        <sinr>,<srxlev>,...
/// ```
///
/// Lines for other radios and lines without a channel are skipped.
pub fn parse_neighbour_cells(response: &str) -> Vec<NeighbourCell> {
    tokenizer::rows(response, PREFIX)
        .filter_map(|fields| parse_neighbour(&fields))
        .collect()
}

fn parse_neighbour(f: &[String]) -> Option<NeighbourCell> {
    let scope = match f.first()?.as_str() {
        "neighbourcell intra" => NeighbourScope::Intra,
        "neighbourcell inter" => NeighbourScope::Inter,
        _ => return None,
    };
    if f.get(1).map(String::as_str) != Some("LTE") {
        debug!(rat = ?f.get(1), "non-LTE neighbour cell skipped");
        return None;
    }
    let Some(channel) = field(f, 2) else {
        debug!(?f, "neighbour cell without channel skipped");
        return None;
    };

    Some(NeighbourCell {
        scope,
        rat: Rat::Lte,
        channel,
        pci: field(f, 3),
        rsrq: field(f, 4),
        rsrp: field(f, 5),
        rssi: field(f, 6),
        sinr: field(f, 7),
        srxlev: field(f, 8),
        freq_mhz: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "+QENG: \"neighbourcell intra\",\"LTE\",\
        275,280,-14,-99,-67,-,-,-,-,-,-\r\n\
        +QENG: \"neighbourcell inter\",\"LTE\",\
        1350,240,-18,-95,-68,3,22,-,-,-\r\n\
        +QENG: \"neighbourcell\",\"WCDMA\",10588,1,2,3\r\n\
        +QENG: \"neighbourcell inter\",\"NR5G\",648768,920\r\n\
        \r\nOK\r\n";

    #[test]
    fn parses_lte_neighbours_in_order() {
        let cells = parse_neighbour_cells(RESPONSE);
        assert_eq!(cells.len(), 2);

        let intra = &cells[0];
        assert_eq!(intra.scope, NeighbourScope::Intra);
        assert_eq!(intra.channel, 275);
        assert_eq!(intra.pci, Some(280));
        assert_eq!(intra.rsrq, Some(-14));
        assert_eq!(intra.rsrp, Some(-99));
        assert_eq!(intra.rssi, Some(-67));
        assert_eq!(intra.sinr, None);

        let inter = &cells[1];
        assert_eq!(inter.scope, NeighbourScope::Inter);
        assert_eq!(inter.channel, 1350);
        assert_eq!(inter.sinr, Some(3.0));
        assert_eq!(inter.srxlev, Some(22));
    }

    #[test]
    fn short_line_without_metrics() {
        let cells = parse_neighbour_cells(
            "+QENG: \"neighbourcell intra\",\"LTE\",275,280\r\nOK",
        );
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].rsrp, None);

        let no_channel = "+QENG: \"neighbourcell intra\",\"LTE\",-,280\r\nOK";
        assert!(parse_neighbour_cells(no_channel).is_empty());
    }

    #[test]
    fn ignores_serving_lines() {
        let resp = "+QENG: \"servingcell\",\"NOCONN\"\r\n\
            +QENG: \"LTE\",\"FDD\",222,01\r\nOK";
        assert!(parse_neighbour_cells(resp).is_empty());
        assert!(parse_neighbour_cells("OK").is_empty());
    }
}
