//! Combines the parser outputs of one poll into a [`StatusSnapshot`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    frequency::{self, BandwidthEncoding},
    model::{
        Carrier, CellMetrics, DeviceInfo, LteServingCell, NeighbourCell,
        NrServingCell, OperatorInfo, ServingCell,
    },
    parser, quality,
};

/// Raw response text of one poll, one entry per command. `None` for a command
/// that was not issued or failed.
#[derive(Debug, Clone, Default)]
pub struct RawResponses {
    pub ati: Option<String>,
    pub qspn: Option<String>,
    pub servingcell: Option<String>,
    pub qcainfo: Option<String>,
    pub neighbourcell: Option<String>,
}

/// Parser outputs of one poll, before enrichment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusInputs {
    pub device: Option<DeviceInfo>,
    pub operator: Option<OperatorInfo>,
    pub serving: Option<ServingCell>,
    pub carriers: Vec<Carrier>,
    pub neighbours: Vec<NeighbourCell>,
}

impl RawResponses {
    pub fn parse(&self) -> StatusInputs {
        StatusInputs {
            device: self.ati.as_deref().and_then(parser::parse_device_info),
            operator: self.qspn.as_deref().and_then(parser::parse_operator),
            serving: self
                .servingcell
                .as_deref()
                .and_then(parser::parse_serving_cell),
            carriers: self
                .qcainfo
                .as_deref()
                .map(parser::parse_carriers)
                .unwrap_or_default(),
            neighbours: self
                .neighbourcell
                .as_deref()
                .map(parser::parse_neighbour_cells)
                .unwrap_or_default(),
        }
    }
}

/// Everything known about the modem's radio state at one point in time.
///
/// A snapshot with every field empty is valid and means the modem had no
/// signal or could not be reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub device: Option<DeviceInfo>,
    pub operator: Option<OperatorInfo>,
    pub serving: Option<ServingCell>,
    pub carriers: Vec<Carrier>,
    pub neighbours: Vec<NeighbourCell>,
}

impl StatusSnapshot {
    pub fn from_responses(raw: &RawResponses) -> Self {
        Self::synthesize(raw.parse())
    }

    /// Enriches the inputs with frequencies and bandwidths, then fills gaps in
    /// each carrier's metrics from the serving cell it belongs to.
    ///
    /// A carrier belongs to a serving cell of the same radio when either its
    /// PCI or its channel is equal. Only absent RSRP, RSRQ, SINR and bandwidth
    /// are filled in; RSSNR is never touched and never becomes SINR.
    ///
    /// Running it again on its own output changes nothing.
    pub fn synthesize(inputs: StatusInputs) -> Self {
        let StatusInputs {
            device,
            operator,
            mut serving,
            mut carriers,
            mut neighbours,
        } = inputs;

        if let Some(serving) = &mut serving {
            if let Some(lte) = &mut serving.lte {
                enrich_lte(lte);
            }
            if let Some(nr) = &mut serving.nr {
                enrich_nr(nr);
            }
        }
        for carrier in &mut carriers {
            enrich_carrier(carrier);
        }
        for neighbour in &mut neighbours {
            neighbour.freq_mhz =
                frequency::channel_to_mhz(neighbour.rat, neighbour.channel)
                    .map(|f| f.mhz);
        }

        if let Some(serving) = &serving {
            for carrier in &mut carriers {
                if let Some(cell) = serving.cell(carrier.rat) {
                    backfill(carrier, &cell);
                }
            }
        }

        Self {
            device,
            operator,
            serving,
            carriers,
            neighbours,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.device.is_none()
            && self.operator.is_none()
            && self.serving.is_none()
            && self.carriers.is_empty()
            && self.neighbours.is_empty()
    }

    pub fn lte(&self) -> Option<&LteServingCell> {
        self.serving.as_ref()?.lte.as_ref()
    }

    pub fn nr(&self) -> Option<&NrServingCell> {
        self.serving.as_ref()?.nr.as_ref()
    }

    /// Beeps for the NR serving cell's SINR; 0 without an NR cell.
    pub fn beep_count(&self) -> u8 {
        quality::beep_count(self.nr().and_then(|nr| nr.sinr))
    }
}

impl From<StatusSnapshot> for StatusInputs {
    fn from(snapshot: StatusSnapshot) -> Self {
        Self {
            device: snapshot.device,
            operator: snapshot.operator,
            serving: snapshot.serving,
            carriers: snapshot.carriers,
            neighbours: snapshot.neighbours,
        }
    }
}

fn enrich_lte(lte: &mut LteServingCell) {
    if let Some(f) = lte.earfcn.and_then(frequency::earfcn_to_mhz) {
        lte.freq_mhz = Some(f.mhz);
        lte.band.get_or_insert(f.band);
    }
    let lte_index = |idx: u8| {
        frequency::bandwidth_mhz(BandwidthEncoding::LteIndex, idx.into())
    };
    lte.dl_bandwidth_mhz = lte.dl_bandwidth_idx.and_then(lte_index);
    lte.ul_bandwidth_mhz = lte.ul_bandwidth_idx.and_then(lte_index);
}

fn enrich_nr(nr: &mut NrServingCell) {
    if let Some(f) = nr.arfcn.and_then(frequency::nrarfcn_to_mhz) {
        nr.freq_mhz = Some(f.mhz);
        nr.band.get_or_insert(f.band);
    }
    nr.bandwidth_mhz = nr.bandwidth_idx.and_then(|idx| {
        frequency::bandwidth_mhz(BandwidthEncoding::NrIndex, idx.into())
    });
}

fn enrich_carrier(carrier: &mut Carrier) {
    if let Some(f) = carrier
        .channel
        .and_then(|ch| frequency::channel_to_mhz(carrier.rat, ch))
    {
        carrier.freq_mhz = Some(f.mhz);
        carrier.band.get_or_insert(f.band);
    }
    let encoding = BandwidthEncoding::carrier(carrier.rat);
    if let Some(mhz) = carrier
        .bandwidth_raw
        .and_then(|raw| frequency::bandwidth_mhz(encoding, raw))
    {
        carrier.bandwidth_mhz = Some(mhz);
    }
}

fn belongs_to(carrier: &Carrier, cell: &CellMetrics) -> bool {
    let same = |a: Option<u32>, b: Option<u32>| {
        matches!((a, b), (Some(a), Some(b)) if a == b)
    };

    same(carrier.pci.map(u32::from), cell.pci.map(u32::from))
        || same(carrier.channel, cell.channel)
}

fn backfill(carrier: &mut Carrier, cell: &CellMetrics) {
    if !belongs_to(carrier, cell) {
        return;
    }
    debug!(
        role = %carrier.role,
        rat = %carrier.rat,
        pci = ?carrier.pci,
        "carrier matched serving cell"
    );

    let signal = &mut carrier.signal;
    signal.rsrp = signal.rsrp.or(cell.rsrp);
    signal.rsrq = signal.rsrq.or(cell.rsrq);
    signal.sinr = signal.sinr.or(cell.sinr);
    carrier.bandwidth_mhz = carrier.bandwidth_mhz.or(cell.bandwidth_mhz);
}
