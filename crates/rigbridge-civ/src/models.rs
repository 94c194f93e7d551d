//! Icom model definitions.
//!
//! Models are factory functions (e.g. [`ic_7300()`]) returning a fully
//! populated [`IcomModel`].
//!
//! | Model       | CI-V   | Baud    | Power | Echo | Filter byte | Memories |
//! |-------------|--------|---------|-------|------|-------------|----------|
//! | IC-7300     | `0x94` | 115200  | 100W  | no   | yes         | 1-99     |
//! | IC-7610     | `0x98` | 115200  | 100W  | no   | yes         | 1-99     |
//! | IC-705      | `0xA4` | 115200  | 10W   | no   | yes         | -        |
//! | IC-706MkIIG | `0x58` | 19200   | 100W  | yes  | no          | -        |
//! | IC-718      | `0x5E` | 19200   | 100W  | yes  | no          | -        |
//!
//! "Echo" means the interface loops every transmitted byte back to the
//! receiver (single-wire CI-V bus via a CT-17 style level converter).

use rigbridge_core::{BandRange, MeterPoint, Mode, RigCapabilities};

#[derive(Debug, Clone)]
pub struct IcomModel {
    /// Human-readable model name (e.g. "IC-7300").
    pub name: &'static str,
    /// Factory-default CI-V bus address.
    pub default_civ_address: u8,
    pub default_baud_rate: u32,
    /// The link echoes every command before the reply.
    pub echoes_commands: bool,
    /// Set-mode accepts a trailing filter number. Older rigs NAK it.
    pub mode_filter_byte: bool,
    /// Data sub-modes are selected with command `1A 06`.
    pub has_data_mode: bool,
    pub capabilities: RigCapabilities,
}

fn base_modes() -> Vec<Mode> {
    vec![
        Mode::LSB,
        Mode::USB,
        Mode::CW,
        Mode::CWR,
        Mode::RTTY,
        Mode::RTTYR,
        Mode::AM,
        Mode::FM,
    ]
}

fn modes_with_data() -> Vec<Mode> {
    let mut modes = base_modes();
    modes.extend([Mode::DataUSB, Mode::DataLSB, Mode::DataFM, Mode::DataAM]);
    modes
}

fn icom_meter() -> Vec<MeterPoint> {
    vec![
        MeterPoint { raw: 0, db: -54 },
        MeterPoint { raw: 120, db: 0 },
        MeterPoint { raw: 241, db: 60 },
    ]
}

fn caps(
    frequency_ranges: Vec<BandRange>,
    supported_modes: Vec<Mode>,
    max_power_watts: f32,
) -> RigCapabilities {
    RigCapabilities {
        frequency_ranges,
        supported_modes,
        max_power_watts,
        meter_calibration: icom_meter(),
        ..RigCapabilities::default()
    }
}

/// IC-7300: HF/6m/4m SDR, 100 W, USB CI-V without echo.
pub fn ic_7300() -> IcomModel {
    IcomModel {
        name: "IC-7300",
        default_civ_address: 0x94,
        default_baud_rate: 115_200,
        echoes_commands: false,
        mode_filter_byte: true,
        has_data_mode: true,
        capabilities: RigCapabilities {
            memory_channels: Some((1, 99)),
            ..caps(
                vec![BandRange::new(30_000, 74_800_000)],
                modes_with_data(),
                100.0,
            )
        },
    }
}

/// IC-7610: dual-receiver HF/6m SDR. VFOs are addressed as Main/Sub.
pub fn ic_7610() -> IcomModel {
    IcomModel {
        name: "IC-7610",
        default_civ_address: 0x98,
        default_baud_rate: 115_200,
        echoes_commands: false,
        mode_filter_byte: true,
        has_data_mode: true,
        capabilities: RigCapabilities {
            has_vfo_b: false,
            has_main_sub: true,
            memory_channels: Some((1, 99)),
            ..caps(
                vec![BandRange::new(30_000, 60_000_000)],
                modes_with_data(),
                100.0,
            )
        },
    }
}

/// IC-705: portable HF/VHF/UHF, 10 W.
pub fn ic_705() -> IcomModel {
    IcomModel {
        name: "IC-705",
        default_civ_address: 0xA4,
        default_baud_rate: 115_200,
        echoes_commands: false,
        mode_filter_byte: true,
        has_data_mode: true,
        capabilities: caps(
            vec![
                BandRange::new(30_000, 199_999_999),
                BandRange::new(400_000_000, 470_000_000),
            ],
            modes_with_data(),
            10.0,
        ),
    }
}

/// IC-706MkIIG: mobile HF/VHF/UHF on the shared CI-V bus.
pub fn ic_706mk2g() -> IcomModel {
    IcomModel {
        name: "IC-706MkIIG",
        default_civ_address: 0x58,
        default_baud_rate: 19_200,
        echoes_commands: true,
        mode_filter_byte: false,
        has_data_mode: false,
        capabilities: RigCapabilities {
            has_xit: false,
            ..caps(
                vec![
                    BandRange::new(30_000, 199_999_999),
                    BandRange::new(400_000_000, 470_000_000),
                ],
                base_modes(),
                100.0,
            )
        },
    }
}

/// IC-718: entry-level HF, no FM, no RIT/XIT over CI-V.
pub fn ic_718() -> IcomModel {
    IcomModel {
        name: "IC-718",
        default_civ_address: 0x5E,
        default_baud_rate: 19_200,
        echoes_commands: true,
        mode_filter_byte: false,
        has_data_mode: false,
        capabilities: RigCapabilities {
            has_rit: false,
            has_xit: false,
            ..caps(
                vec![BandRange::new(30_000, 29_999_999)],
                vec![
                    Mode::LSB,
                    Mode::USB,
                    Mode::CW,
                    Mode::CWR,
                    Mode::RTTY,
                    Mode::RTTYR,
                    Mode::AM,
                ],
                100.0,
            )
        },
    }
}

/// Every Icom model this crate knows about.
pub fn all_icom_models() -> Vec<IcomModel> {
    vec![ic_7300(), ic_7610(), ic_705(), ic_706mk2g(), ic_718()]
}
