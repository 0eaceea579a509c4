//! One parser per AT command. Each takes the complete response text, terminator
//! included, and never fails: lines it cannot use are skipped and reported
//! through `tracing`.

pub mod band_pref;
pub mod carrier;
pub mod cell_lock;
pub mod device;
pub mod neighbour;
pub mod operator;
pub mod serving;

use std::str::FromStr;

pub use band_pref::{parse_band_list, parse_band_preferences};
pub use carrier::parse_carriers;
pub use cell_lock::parse_cell_lock;
pub use device::parse_device_info;
pub use neighbour::parse_neighbour_cells;
pub use operator::parse_operator;
pub use serving::parse_serving_cell;

/// `-` and empty mean "not reported"; anything unparsable is treated the same.
pub(crate) fn parse_opt<T: FromStr>(raw: &str) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "-" {
        return None;
    }

    raw.parse().ok()
}

/// Parsed field at `idx`, `None` if the line is too short.
pub(crate) fn field<T: FromStr>(fields: &[String], idx: usize) -> Option<T> {
    fields.get(idx).and_then(|raw| parse_opt(raw))
}

/// Raw text of the field at `idx`, `None` if missing, empty or `-`.
pub(crate) fn text(fields: &[String], idx: usize) -> Option<String> {
    fields
        .get(idx)
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty() && *raw != "-")
        .map(str::to_owned)
}
