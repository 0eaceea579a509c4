use tracing::debug;

use crate::{model::OperatorInfo, tokenizer};

pub const COMMAND: &str = "AT+QSPN";
const PREFIX: &str = "+QSPN";

/// `+QSPN: <FNN>,<SNN>,<SPN>,<alphabet>,<RPLMN>`, first usable line wins.
pub fn parse_operator(response: &str) -> Option<OperatorInfo> {
    tokenizer::rows(response, PREFIX).find_map(|fields| {
        if fields.len() < 5 {
            debug!(?fields, "short +QSPN line skipped");
            return None;
        }
        let [long_name, short_name, _, _, plmn, ..] = fields.as_slice() else {
            return None;
        };

        Some(OperatorInfo {
            long_name: long_name.clone(),
            short_name: short_name.clone(),
            plmn: plmn.clone(),
        })
    })
}
