//! Text CAT model definitions.
//!
//! Each factory returns a [`CatModel`] tying a rig to its [`Dialect`] and
//! capability descriptor.
//!
//! | Model    | Dialect  | Baud   | Power | Memories |
//! |----------|----------|--------|-------|----------|
//! | TS-590SG | Kenwood  | 115200 | 100W  | 0-99     |
//! | TS-890S  | Kenwood  | 115200 | 100W  | 0-99     |
//! | TS-480   | Kenwood  | 9600   | 100W  | 0-99     |
//! | K3       | Elecraft | 38400  | 100W  | -        |
//! | KX3      | Elecraft | 38400  | 15W   | -        |
//! | KX2      | Elecraft | 38400  | 12W   | -        |
//! | FT-991A  | Yaesu    | 38400  | 100W  | 1-99     |
//! | FT-DX10  | Yaesu    | 38400  | 100W  | 1-99     |
//! | FT-710   | Yaesu    | 38400  | 100W  | 1-99     |

use rigbridge_core::{BandRange, Manufacturer, MeterPoint, Mode, RigCapabilities};

use crate::dialect::{Dialect, ELECRAFT, KENWOOD, YAESU};

#[derive(Debug, Clone)]
pub struct CatModel {
    pub name: &'static str,
    pub manufacturer: Manufacturer,
    pub dialect: &'static Dialect,
    pub default_baud_rate: u32,
    pub capabilities: RigCapabilities,
}

/// Modes the dialect can encode, in table order, without read-only aliases.
fn dialect_modes(dialect: &Dialect) -> Vec<Mode> {
    let mut modes = Vec::new();
    for (_, mode) in dialect.modes {
        if !modes.contains(mode) {
            modes.push(*mode);
        }
    }
    modes
}

fn hf_6m() -> Vec<BandRange> {
    vec![BandRange::new(30_000, 54_000_000)]
}

fn kenwood_meter() -> Vec<MeterPoint> {
    vec![
        MeterPoint { raw: 0, db: -54 },
        MeterPoint { raw: 15, db: 0 },
        MeterPoint { raw: 30, db: 60 },
    ]
}

fn elecraft_meter() -> Vec<MeterPoint> {
    vec![
        MeterPoint { raw: 0, db: -54 },
        MeterPoint { raw: 9, db: 0 },
        MeterPoint { raw: 21, db: 60 },
    ]
}

fn yaesu_meter() -> Vec<MeterPoint> {
    vec![
        MeterPoint { raw: 0, db: -54 },
        MeterPoint { raw: 130, db: 0 },
        MeterPoint { raw: 255, db: 60 },
    ]
}

fn kenwood(name: &'static str, default_baud_rate: u32) -> CatModel {
    CatModel {
        name,
        manufacturer: Manufacturer::Kenwood,
        dialect: &KENWOOD,
        default_baud_rate,
        capabilities: RigCapabilities {
            frequency_ranges: hf_6m(),
            supported_modes: dialect_modes(&KENWOOD),
            memory_channels: Some((0, 99)),
            meter_calibration: kenwood_meter(),
            ..RigCapabilities::default()
        },
    }
}

fn elecraft(name: &'static str, max_power_watts: f32) -> CatModel {
    CatModel {
        name,
        manufacturer: Manufacturer::Elecraft,
        dialect: &ELECRAFT,
        default_baud_rate: 38_400,
        capabilities: RigCapabilities {
            frequency_ranges: hf_6m(),
            supported_modes: dialect_modes(&ELECRAFT),
            max_power_watts,
            meter_calibration: elecraft_meter(),
            ..RigCapabilities::default()
        },
    }
}

fn yaesu(name: &'static str, frequency_ranges: Vec<BandRange>) -> CatModel {
    CatModel {
        name,
        manufacturer: Manufacturer::Yaesu,
        dialect: &YAESU,
        default_baud_rate: 38_400,
        capabilities: RigCapabilities {
            frequency_ranges,
            supported_modes: dialect_modes(&YAESU),
            memory_channels: Some((1, 99)),
            meter_calibration: yaesu_meter(),
            ..RigCapabilities::default()
        },
    }
}

pub fn ts_590sg() -> CatModel {
    kenwood("TS-590SG", 115_200)
}

pub fn ts_890s() -> CatModel {
    kenwood("TS-890S", 115_200)
}

pub fn ts_480() -> CatModel {
    kenwood("TS-480", 9_600)
}

pub fn k3() -> CatModel {
    elecraft("K3", 100.0)
}

pub fn kx3() -> CatModel {
    elecraft("KX3", 15.0)
}

pub fn kx2() -> CatModel {
    elecraft("KX2", 12.0)
}

/// FT-991A: HF through 70 cm.
pub fn ft_991a() -> CatModel {
    yaesu(
        "FT-991A",
        vec![
            BandRange::new(30_000, 56_000_000),
            BandRange::new(118_000_000, 164_000_000),
            BandRange::new(420_000_000, 470_000_000),
        ],
    )
}

pub fn ft_dx10() -> CatModel {
    yaesu("FT-DX10", hf_6m())
}

pub fn ft_710() -> CatModel {
    yaesu("FT-710", hf_6m())
}

pub fn all_cat_models() -> Vec<CatModel> {
    vec![
        ts_590sg(),
        ts_890s(),
        ts_480(),
        k3(),
        kx3(),
        kx2(),
        ft_991a(),
        ft_dx10(),
        ft_710(),
    ]
}
