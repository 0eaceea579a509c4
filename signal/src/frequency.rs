//! Channel number to frequency and band conversion (3GPP TS 36.101 table
//! 5.7.3-1, TS 38.101-1/-2 section 5.4.2) and bandwidth code tables.

use crate::model::Rat;

/// Downlink centre frequency of a channel and the band it was found in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelFrequency {
    pub mhz: f64,
    pub band: u16,
}

struct LteBand {
    band: u16,
    earfcn_low: u32,
    earfcn_high: u32,
    /// F_DL_low in MHz.
    base_mhz: f64,
    /// N_Offs-DL.
    offset: u32,
}

const fn lte(
    band: u16,
    low: u32,
    high: u32,
    base_mhz: f64,
    offset: u32,
) -> LteBand {
    LteBand {
        band,
        earfcn_low: low,
        earfcn_high: high,
        base_mhz,
        offset,
    }
}

#[rustfmt::skip]
static LTE_BANDS: &[LteBand] = &[
    lte(1, 0, 599, 2110.0, 0),
    lte(2, 600, 1199, 1930.0, 600),
    lte(3, 1200, 1949, 1805.0, 1200),
    lte(4, 1950, 2399, 2110.0, 1950),
    lte(5, 2400, 2649, 869.0, 2400),
    lte(6, 2650, 2749, 875.0, 2650),
    lte(7, 2750, 3449, 2620.0, 2750),
    lte(8, 3450, 3799, 925.0, 3450),
    lte(9, 3800, 4149, 1844.9, 3800),
    lte(10, 4150, 4749, 2110.0, 4150),
    lte(11, 4750, 4949, 1475.9, 4750),
    lte(12, 5010, 5179, 729.0, 5010),
    lte(13, 5180, 5279, 746.0, 5180),
    lte(14, 5280, 5379, 758.0, 5280),
    lte(17, 5730, 5849, 734.0, 5730),
    lte(18, 5850, 5999, 860.0, 5850),
    lte(19, 6000, 6149, 875.0, 6000),
    lte(20, 6150, 6449, 791.0, 6150),
    lte(21, 6450, 6599, 1495.9, 6450),
    lte(22, 6600, 7399, 3510.0, 6600),
    lte(23, 7500, 7699, 2180.0, 7500),
    lte(24, 7700, 8039, 1525.0, 7700),
    lte(25, 8040, 8689, 1930.0, 8040),
    lte(26, 8690, 9039, 859.0, 8690),
    lte(27, 9040, 9209, 852.0, 9040),
    lte(28, 9210, 9659, 758.0, 9210),
    lte(29, 9660, 9769, 717.0, 9660),
    lte(30, 9770, 9869, 2350.0, 9770),
    lte(31, 9870, 9919, 462.5, 9870),
    lte(32, 9920, 10359, 1452.0, 9920),
    // TDD
    lte(33, 36000, 36199, 1900.0, 36000),
    lte(34, 36200, 36349, 2010.0, 36200),
    lte(35, 36350, 36949, 1850.0, 36350),
    lte(36, 36950, 37549, 1930.0, 36950),
    lte(37, 37550, 37749, 1910.0, 37550),
    lte(38, 37750, 38249, 2570.0, 37750),
    lte(39, 38250, 38649, 1880.0, 38250),
    lte(40, 38650, 39649, 2300.0, 38650),
    lte(41, 39650, 41589, 2496.0, 39650),
    lte(42, 41590, 43589, 3400.0, 41590),
    lte(43, 43590, 45589, 3600.0, 43590),
    lte(44, 45590, 46589, 703.0, 45590),
    lte(45, 46590, 46789, 1447.0, 46590),
    lte(46, 46790, 54539, 5150.0, 46790),
    lte(47, 54540, 55239, 5855.0, 54540),
    lte(48, 55240, 56739, 3550.0, 55240),
    lte(49, 56740, 58239, 3550.0, 56740),
    lte(50, 58240, 59089, 1432.0, 58240),
    lte(51, 59090, 59139, 1427.0, 59090),
    lte(52, 59140, 60139, 3300.0, 59140),
    lte(53, 60140, 60254, 2483.5, 60140),
    lte(65, 65536, 66435, 2110.0, 65536),
    lte(66, 66436, 67335, 2110.0, 66436),
    lte(67, 67336, 67535, 738.0, 67336),
    lte(68, 67536, 67835, 753.0, 67536),
    lte(69, 67836, 68335, 2570.0, 67836),
    lte(70, 68336, 68585, 1995.0, 68336),
    lte(71, 68586, 68935, 617.0, 68586),
    lte(72, 68936, 68985, 461.0, 68936),
    lte(73, 68986, 69035, 460.0, 68986),
    lte(74, 69036, 69465, 1475.0, 69036),
    lte(75, 69466, 70315, 1432.0, 69466),
    lte(76, 70316, 70365, 1427.0, 70316),
    lte(85, 70366, 70545, 728.0, 70366),
    lte(87, 70546, 70595, 420.0, 70546),
    lte(88, 70596, 70645, 422.0, 70596),
];

/// Downlink NR-ARFCN ranges, `(band, low, high)` inclusive.
///
/// Bands overlap, and the scan returns the first hit, so a range must never be
/// fully contained in one listed before it (`nr_table_narrower_ranges_first`).
/// Supplementary uplink bands are omitted.
#[rustfmt::skip]
static NR_BANDS: &[(u16, u32, u32)] = &[
    (71, 123_400, 130_400),
    (29, 143_400, 145_600),
    (12, 145_800, 149_200),
    (85, 145_600, 149_200),
    (13, 149_200, 151_200),
    (67, 147_600, 151_600),
    (20, 158_200, 164_200),
    (28, 151_600, 160_600),
    (5, 173_800, 178_800),
    (18, 172_000, 175_000),
    (26, 171_800, 178_800),
    (8, 185_000, 192_000),
    (51, 285_400, 286_400),
    (50, 286_400, 303_400),
    (74, 295_000, 303_600),
    (3, 361_000, 376_000),
    (39, 376_000, 384_000),
    (2, 386_000, 398_000),
    (25, 386_000, 399_000),
    (70, 399_000, 404_000),
    (34, 402_000, 405_000),
    (1, 422_000, 434_000),
    (66, 422_000, 440_000),
    (40, 460_000, 480_000),
    (53, 496_700, 499_000),
    (38, 514_000, 524_000),
    (7, 524_000, 538_000),
    (41, 499_200, 537_999),
    (78, 620_000, 653_333),
    (77, 620_000, 680_000),
    (79, 693_334, 733_333),
    (46, 743_334, 795_000),
    (96, 795_000, 875_000),
    // FR2
    (261, 2_070_833, 2_084_999),
    (257, 2_054_166, 2_104_165),
    (258, 2_016_667, 2_070_832),
    (260, 2_229_166, 2_279_165),
    (259, 2_270_833, 2_337_499),
    (262, 2_399_166, 2_415_832),
    (263, 2_564_083, 2_794_249),
];

const NR_ARFCN_MAX: u32 = 3_279_165;

/// `F_DL = F_DL_low + 0.1 (N_DL - N_Offs-DL)`, first matching band wins.
pub fn earfcn_to_mhz(earfcn: u32) -> Option<ChannelFrequency> {
    LTE_BANDS
        .iter()
        .find(|b| (b.earfcn_low..=b.earfcn_high).contains(&earfcn))
        .map(|b| ChannelFrequency {
            mhz: b.base_mhz + 0.1 * f64::from(earfcn - b.offset),
            band: b.band,
        })
}

/// Global frequency raster: NR-ARFCN to kHz.
///
/// `None` past the end of the FR2 raster.
pub fn nr_raster_khz(arfcn: u32) -> Option<u64> {
    let arfcn = u64::from(arfcn);
    let khz = match arfcn {
        0..600_000 => arfcn * 5,
        600_000..2_016_667 => 3_000_000 + (arfcn - 600_000) * 15,
        2_016_667..=3_279_165 => 24_250_080 + (arfcn - 2_016_667) * 60,
        _ => return None,
    };

    Some(khz)
}

/// NR-ARFCN to MHz and band. A channel on the raster but outside every
/// known band is `None`.
pub fn nrarfcn_to_mhz(arfcn: u32) -> Option<ChannelFrequency> {
    if arfcn > NR_ARFCN_MAX {
        return None;
    }
    let band = nr_band(arfcn)?;
    let khz = nr_raster_khz(arfcn)?;

    Some(ChannelFrequency {
        mhz: khz as f64 / 1000.0,
        band,
    })
}

fn nr_band(arfcn: u32) -> Option<u16> {
    NR_BANDS
        .iter()
        .find(|(_, low, high)| (*low..=*high).contains(&arfcn))
        .map(|(band, _, _)| *band)
}

pub fn channel_to_mhz(rat: Rat, channel: u32) -> Option<ChannelFrequency> {
    match rat {
        Rat::Lte => earfcn_to_mhz(channel),
        Rat::Nr5g => nrarfcn_to_mhz(channel),
    }
}

/// Human readable channel: `1845.0 MHz (B3)`, `3731.5 MHz (n78)`, or
/// `Unknown (<channel>)`.
pub fn format_frequency(rat: Rat, channel: u32) -> String {
    let prefix = match rat {
        Rat::Lte => "B",
        Rat::Nr5g => "n",
    };
    match channel_to_mhz(rat, channel) {
        Some(f) => format!("{:.1} MHz ({prefix}{})", f.mhz, f.band),
        None => format!("Unknown ({channel})"),
    }
}

/// How a bandwidth value was reported.
///
/// `AT+QENG` reports LTE bandwidth as an index while `AT+QCAINFO` reports a
/// resource block count; the two must not be mixed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandwidthEncoding {
    LteIndex,
    LteResourceBlocks,
    NrIndex,
}

impl BandwidthEncoding {
    /// Encoding of the bandwidth column of `AT+QCAINFO`.
    pub fn carrier(rat: Rat) -> Self {
        match rat {
            Rat::Lte => Self::LteResourceBlocks,
            Rat::Nr5g => Self::NrIndex,
        }
    }
}

pub fn bandwidth_mhz(encoding: BandwidthEncoding, code: u16) -> Option<f64> {
    let mhz = match (encoding, code) {
        (BandwidthEncoding::LteIndex, 0) => 1.4,
        (BandwidthEncoding::LteIndex, 1) => 3.0,
        (BandwidthEncoding::LteIndex, 2) => 5.0,
        (BandwidthEncoding::LteIndex, 3) => 10.0,
        (BandwidthEncoding::LteIndex, 4) => 15.0,
        (BandwidthEncoding::LteIndex, 5) => 20.0,

        (BandwidthEncoding::LteResourceBlocks, 6) => 1.4,
        (BandwidthEncoding::LteResourceBlocks, 15) => 3.0,
        (BandwidthEncoding::LteResourceBlocks, 25) => 5.0,
        (BandwidthEncoding::LteResourceBlocks, 50) => 10.0,
        (BandwidthEncoding::LteResourceBlocks, 75) => 15.0,
        (BandwidthEncoding::LteResourceBlocks, 100) => 20.0,

        (BandwidthEncoding::NrIndex, 0) => 5.0,
        (BandwidthEncoding::NrIndex, 1) => 10.0,
        (BandwidthEncoding::NrIndex, 2) => 15.0,
        (BandwidthEncoding::NrIndex, 3) => 20.0,
        (BandwidthEncoding::NrIndex, 4) => 25.0,
        (BandwidthEncoding::NrIndex, 5) => 30.0,
        (BandwidthEncoding::NrIndex, 6) => 40.0,
        (BandwidthEncoding::NrIndex, 7) => 50.0,
        (BandwidthEncoding::NrIndex, 8) => 60.0,
        (BandwidthEncoding::NrIndex, 9) => 70.0,
        (BandwidthEncoding::NrIndex, 10) => 80.0,
        (BandwidthEncoding::NrIndex, 11) => 90.0,
        (BandwidthEncoding::NrIndex, 12) => 100.0,
        (BandwidthEncoding::NrIndex, 13) => 200.0,
        (BandwidthEncoding::NrIndex, 14) => 400.0,

        _ => return None,
    };

    Some(mhz)
}

/// `20 MHz`, `1.4 MHz`: no decimals for whole values.
pub fn format_mhz(mhz: f64) -> String {
    if mhz.fract() == 0.0 {
        format!("{mhz:.0} MHz")
    } else {
        format!("{mhz:.1} MHz")
    }
}

/// `20 MHz`, `1.4 MHz`, or a marker that keeps the raw code visible.
pub fn format_bandwidth(encoding: BandwidthEncoding, code: u16) -> String {
    match bandwidth_mhz(encoding, code) {
        Some(mhz) => format_mhz(mhz),
        None if encoding == BandwidthEncoding::LteResourceBlocks => {
            format!("? ({code} RB)")
        }
        None => format!("? (idx {code})"),
    }
}

/// NR subcarrier spacing index (numerology) to kHz.
pub fn nr_scs_khz(idx: u8) -> Option<u16> {
    match idx {
        0 => Some(15),
        1 => Some(30),
        2 => Some(60),
        3 => Some(120),
        4 => Some(240),
        _ => None,
    }
}

/// eNodeB id of a hex encoded LTE cell identity (cell id / 256).
pub fn extract_enodeb(cell_id_hex: &str) -> Option<u32> {
    parse_cell_id(cell_id_hex).map(|id| id >> 8)
}

/// Sector (local cell) id, the low byte of the cell identity.
pub fn extract_sector(cell_id_hex: &str) -> Option<u8> {
    parse_cell_id(cell_id_hex).map(|id| (id & 0xFF) as u8)
}

fn parse_cell_id(hex: &str) -> Option<u32> {
    let hex = hex.trim();
    let hex = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex);
    if hex.is_empty() {
        return None;
    }

    u32::from_str_radix(hex, 16).ok()
}
