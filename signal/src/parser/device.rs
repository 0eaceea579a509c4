use tracing::debug;

use crate::model::DeviceInfo;

pub const COMMAND: &str = "ATI";

/// `ATI` prints plain lines: manufacturer, model, then `Revision: <fw>`.
pub fn parse_device_info(response: &str) -> Option<DeviceInfo> {
    let lines: Vec<&str> = response
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| !matches!(*l, "OK" | "ERROR" | COMMAND))
        .filter(|l| !l.starts_with('+'))
        .collect();

    if lines.len() < 3 {
        if !lines.is_empty() {
            debug!(lines = lines.len(), "ATI response too short, ignoring");
        }
        return None;
    }

    let revision = lines[2..]
        .iter()
        .find_map(|l| l.strip_prefix("Revision:"))
        .map(|rev| rev.trim().to_owned())
        .filter(|rev| !rev.is_empty());

    Some(DeviceInfo {
        manufacturer: lines[0].to_owned(),
        model: lines[1].to_owned(),
        revision,
    })
}
