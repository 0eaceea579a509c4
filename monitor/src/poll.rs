use eyre::{Result, bail};
use quectel_signal::{
    BandPreference, CellLock, Rat, RawResponses, StatusSnapshot,
    parser::{
        self, band_pref, carrier, cell_lock, device, neighbour, operator,
        serving,
    },
};
use tracing::{info, warn};

use crate::transport::{self, AtTransport};

/// Issues the query commands of one status poll and assembles the result.
pub struct Poller<T> {
    transport: T,
}

impl<T: AtTransport> Poller<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// A failed command is logged and left out; the rest of the snapshot is
    /// still built.
    fn query(&mut self, command: &str) -> Option<String> {
        match self.transport.send(command) {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(
                    command,
                    error = %e,
                    "AT command failed, treating as empty"
                );
                None
            }
        }
    }

    pub fn poll_raw(&mut self) -> RawResponses {
        RawResponses {
            ati: self.query(device::COMMAND),
            qspn: self.query(operator::COMMAND),
            servingcell: self.query(serving::COMMAND),
            qcainfo: self.query(carrier::COMMAND),
            neighbourcell: self.query(neighbour::COMMAND),
        }
    }

    pub fn poll(&mut self) -> StatusSnapshot {
        StatusSnapshot::from_responses(&self.poll_raw())
    }

    /// Current value of every setting in [`band_pref::KNOWN_SETTINGS`] the
    /// modem answers for.
    pub fn band_preferences(&mut self) -> Vec<BandPreference> {
        band_pref::KNOWN_SETTINGS
            .iter()
            .filter_map(|setting| {
                self.query(&band_pref::query_command(setting))
            })
            .flat_map(|response| parser::parse_band_preferences(&response))
            .collect()
    }

    /// Writes a band list setting. Unlike queries, a rejected write is an
    /// error.
    pub fn set_bands(&mut self, setting: &str, bands: &[u16]) -> Result<()> {
        let command = band_pref::set_bands_command(setting, bands);
        let response = self.transport.send(&command)?;
        if transport::final_status(&response) != Some("OK") {
            bail!("modem rejected {command}: {}", response.trim());
        }
        info!(setting, ?bands, "band preference updated");

        Ok(())
    }

    pub fn cell_locks(&mut self) -> Vec<CellLock> {
        [Rat::Lte, Rat::Nr5g]
            .into_iter()
            .filter_map(|rat| self.query(cell_lock::query_command(rat)))
            .filter_map(|response| parser::parse_cell_lock(&response))
            .collect()
    }
}
