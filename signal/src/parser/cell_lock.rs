use tracing::{debug, warn};

use super::parse_opt;
use crate::{
    model::{CellLock, LockEntry, Rat},
    tokenizer,
};

const PREFIX: &str = "+QNWLOCK";

/// Query command for the cell lock of one radio.
pub fn query_command(rat: Rat) -> &'static str {
    match rat {
        Rat::Lte => "AT+QNWLOCK=\"common/4g\"",
        Rat::Nr5g => "AT+QNWLOCK=\"common/5g\"",
    }
}

/// Parses the first `+QNWLOCK` line naming a radio.
///
/// ```text
/// +QNWLOCK: "common/4g",2,1300,123,6300,45
/// +QNWLOCK: "common/5g",1,920,648768,30,78
/// +QNWLOCK: "common/5g",920,648768,30,78
/// +QNWLOCK: "common/5g",0
/// ```
///
/// The first value is the number of locked cells, followed by `(channel, pci)`
/// pairs for LTE and `(pci, channel, scs kHz, band)` groups for NR. A 5G lock
/// holds one cell, which some firmware reports without the count. Grouping
/// stops as soon as the remaining fields cannot fill a group. A lock without
/// entries means locking is disabled.
pub fn parse_cell_lock(response: &str) -> Option<CellLock> {
    tokenizer::rows(response, PREFIX).find_map(|fields| {
        let (tag, values) = fields.split_first()?;
        let Some(rat) = lock_rat(tag) else {
            debug!(tag = %tag, "unknown +QNWLOCK target skipped");
            return None;
        };
        let entries = match rat {
            Rat::Lte => lte_entries(values),
            Rat::Nr5g => nr_entries(values),
        };

        Some(CellLock { rat, entries })
    })
}

fn lock_rat(tag: &str) -> Option<Rat> {
    let tag = tag.to_ascii_lowercase();
    if tag.contains("4g") || tag.contains("lte") {
        Some(Rat::Lte)
    } else if tag.contains("5g") || tag.contains("nr") {
        Some(Rat::Nr5g)
    } else {
        None
    }
}

const LTE_GROUP: usize = 2;
const NR_GROUP: usize = 4;

/// Splits `count, values...` into `width` sized groups, at most `count` of
/// them.
fn counted_groups(rat: Rat, values: &[String], width: usize) -> Vec<&[String]> {
    let Some((count, rest)) = values.split_first() else {
        return Vec::new();
    };
    let Some(count) = parse_opt::<usize>(count) else {
        warn!(%rat, count = %count, "cell lock count is not a number");
        return Vec::new();
    };
    if rest.len() != count.saturating_mul(width) {
        warn!(
            %rat,
            count,
            fields = rest.len(),
            "cell lock fields do not match the announced count"
        );
    }

    rest.chunks_exact(width).take(count).collect()
}

fn lte_entries(values: &[String]) -> Vec<LockEntry> {
    counted_groups(Rat::Lte, values, LTE_GROUP)
        .into_iter()
        .filter_map(|pair| {
            Some(LockEntry::Lte {
                channel: parse_opt(&pair[0])?,
                pci: parse_opt(&pair[1])?,
            })
        })
        .collect()
}

fn nr_entries(values: &[String]) -> Vec<LockEntry> {
    let groups = if values.len() == NR_GROUP {
        vec![values]
    } else {
        counted_groups(Rat::Nr5g, values, NR_GROUP)
    };

    groups
        .into_iter()
        .filter_map(|g| {
            Some(LockEntry::Nr {
                pci: parse_opt(&g[0])?,
                channel: parse_opt(&g[1])?,
                scs_khz: parse_opt(&g[2])?,
                band: parse_opt(&g[3])?,
            })
        })
        .collect()
}
