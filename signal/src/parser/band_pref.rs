use tracing::debug;

use crate::{
    error::ParseError,
    model::{BandPreference, PreferenceValue},
    tokenizer,
};

pub const PREFIX: &str = "+QNWPREFCFG";

/// Settings shown by `bands`, in display order.
pub const KNOWN_SETTINGS: [&str; 4] =
    ["mode_pref", "lte_band", "nsa_nr5g_band", "nr5g_band"];

/// Query command for one setting, e.g. `AT+QNWPREFCFG="lte_band"`.
pub fn query_command(setting: &str) -> String {
    format!("AT{PREFIX}=\"{setting}\"")
}

/// Write command for a band list setting, e.g.
/// `AT+QNWPREFCFG="lte_band",1:3:7`.
pub fn set_bands_command(setting: &str, bands: &[u16]) -> String {
    let list = bands
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(":");

    format!("AT{PREFIX}=\"{setting}\",{list}")
}

/// Parses every `+QNWPREFCFG: "<name>",<value>` line of a response.
///
/// Settings whose name ends in `_band` hold a colon separated band list and are
/// returned as [`PreferenceValue::Bands`]; anything else is kept verbatim.
pub fn parse_band_preferences(response: &str) -> Vec<BandPreference> {
    tokenizer::rows(response, PREFIX)
        .filter_map(|fields| {
            let [name, value, ..] = fields.as_slice() else {
                debug!(?fields, "+QNWPREFCFG line without value skipped");
                return None;
            };
            let value = if name.ends_with("_band") {
                PreferenceValue::Bands(lossy_band_list(value))
            } else {
                PreferenceValue::Scalar(value.clone())
            };

            Some(BandPreference {
                name: name.clone(),
                value,
            })
        })
        .collect()
}

/// Modem output: unparsable entries are dropped, duplicates collapse.
fn lossy_band_list(raw: &str) -> Vec<u16> {
    let mut bands = Vec::new();
    for entry in raw.split(':') {
        match entry.trim().parse::<u16>() {
            Ok(band) if !bands.contains(&band) => bands.push(band),
            Ok(_) => {}
            Err(_) => debug!(entry, "non-numeric band list entry dropped"),
        }
    }

    bands
}

/// Parses a band list typed by a user, separated by `:` or `,`.
///
/// Unlike modem output this is strict: every entry must be a band number.
/// Duplicates collapse and order is kept.
pub fn parse_band_list(input: &str) -> Result<Vec<u16>, ParseError> {
    let mut bands = Vec::new();
    for entry in input.split([':', ',']).map(str::trim) {
        if entry.is_empty() {
            continue;
        }
        let band = entry
            .strip_prefix(['b', 'B', 'n', 'N'])
            .unwrap_or(entry)
            .parse::<u16>()
            .map_err(|_| ParseError::InvalidBand(entry.to_owned()))?;
        if band == 0 {
            return Err(ParseError::InvalidBand(entry.to_owned()));
        }
        if !bands.contains(&band) {
            bands.push(band);
        }
    }
    if bands.is_empty() {
        return Err(ParseError::EmptyBandList);
    }

    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_lists_and_scalars() {
        let resp = "+QNWPREFCFG: \"mode_pref\",AUTO\r\n\
            +QNWPREFCFG: \"lte_band\",1:3:7:20:3\r\n\
            +QNWPREFCFG: \"nsa_nr5g_band\",78\r\n\
            \r\nOK\r\n";
        let prefs = parse_band_preferences(resp);
        assert_eq!(prefs.len(), 3);
        assert_eq!(prefs[0].value, PreferenceValue::Scalar("AUTO".into()));
        assert_eq!(prefs[1].bands(), Some(&[1, 3, 7, 20][..]));
        assert_eq!(prefs[2].bands(), Some(&[78][..]));
    }

    #[test]
    fn lossy_list_drops_garbage() {
        assert_eq!(lossy_band_list("1::x:3"), [1, 3]);
        assert!(lossy_band_list("").is_empty());
    }

    #[test]
    fn user_band_lists() {
        assert_eq!(parse_band_list("1:3:7"), Ok(vec![1, 3, 7]));
        assert_eq!(parse_band_list("b1, B3,20,3"), Ok(vec![1, 3, 20]));
        assert_eq!(parse_band_list("n78"), Ok(vec![78]));
        assert_eq!(
            parse_band_list("1:x"),
            Err(ParseError::InvalidBand("x".into()))
        );
        assert_eq!(
            parse_band_list("0"),
            Err(ParseError::InvalidBand("0".into()))
        );
        assert_eq!(parse_band_list(" : "), Err(ParseError::EmptyBandList));
    }

    #[test]
    fn builds_commands() {
        assert_eq!(query_command("lte_band"), "AT+QNWPREFCFG=\"lte_band\"");
        assert_eq!(
            set_bands_command("lte_band", &[1, 3, 7]),
            "AT+QNWPREFCFG=\"lte_band\",1:3:7"
        );
    }

    #[test]
    fn terminator_only_is_empty() {
        assert!(parse_band_preferences("OK").is_empty());
    }
}
