//! Core types used throughout rigbridge.
//!
//! These types provide a manufacturer-agnostic abstraction layer over the
//! binary (CI-V) and text (CAT) control protocols.

use std::fmt;
use std::str::FromStr;

/// Which VFO an operation targets.
///
/// `Current` means "whatever the rig is using right now" and never causes a
/// VFO switch. `Main`/`Sub` address dual-receiver rigs (IC-7610, IC-9700);
/// `A`/`B` address rigs with a conventional VFO pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vfo {
    A,
    B,
    Main,
    Sub,
    Current,
}

impl fmt::Display for Vfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Vfo::A => "VFOA",
            Vfo::B => "VFOB",
            Vfo::Main => "Main",
            Vfo::Sub => "Sub",
            Vfo::Current => "currVFO",
        };
        write!(f, "{s}")
    }
}

/// Error returned when a string cannot be parsed into a [`Vfo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVfoError(String);

impl fmt::Display for ParseVfoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown VFO: {}", self.0)
    }
}

impl std::error::Error for ParseVfoError {}

impl FromStr for Vfo {
    type Err = ParseVfoError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "VFOA" | "A" => Ok(Vfo::A),
            "VFOB" | "B" => Ok(Vfo::B),
            "MAIN" => Ok(Vfo::Main),
            "SUB" => Ok(Vfo::Sub),
            "CURRVFO" | "VFO" | "CURRENT" => Ok(Vfo::Current),
            _ => Err(ParseVfoError(s.to_string())),
        }
    }
}

/// Operating mode of the transceiver.
///
/// Covers standard analog modes plus data sub-modes used by digital
/// software (WSJT-X, fldigi, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Upper sideband voice.
    USB,
    /// Lower sideband voice.
    LSB,
    /// CW (morse), typically with upper sideband offset.
    CW,
    /// CW reverse (lower sideband offset).
    CWR,
    /// Amplitude modulation.
    AM,
    /// Frequency modulation.
    FM,
    /// Radio teletype (FSK), upper sideband.
    RTTY,
    /// Radio teletype (FSK), reverse / lower sideband.
    RTTYR,
    /// Data mode using upper sideband (AFSK, sound-card digital).
    DataUSB,
    /// Data mode using lower sideband.
    DataLSB,
    /// Data mode using FM.
    DataFM,
    /// Data mode using AM.
    DataAM,
}

impl Mode {
    /// Every mode, in display order.
    pub const ALL: [Mode; 12] = [
        Mode::USB,
        Mode::LSB,
        Mode::CW,
        Mode::CWR,
        Mode::AM,
        Mode::FM,
        Mode::RTTY,
        Mode::RTTYR,
        Mode::DataUSB,
        Mode::DataLSB,
        Mode::DataFM,
        Mode::DataAM,
    ];

    /// Whether this is one of the sound-card data sub-modes.
    pub fn is_data(&self) -> bool {
        matches!(
            self,
            Mode::DataUSB | Mode::DataLSB | Mode::DataFM | Mode::DataAM
        )
    }

    /// The voice mode a data sub-mode rides on (identity for voice modes).
    pub fn base(&self) -> Mode {
        match self {
            Mode::DataUSB => Mode::USB,
            Mode::DataLSB => Mode::LSB,
            Mode::DataFM => Mode::FM,
            Mode::DataAM => Mode::AM,
            other => *other,
        }
    }

    /// The data sub-mode riding on this voice mode, if one exists.
    pub fn with_data(&self) -> Option<Mode> {
        match self {
            Mode::USB => Some(Mode::DataUSB),
            Mode::LSB => Some(Mode::DataLSB),
            Mode::FM => Some(Mode::DataFM),
            Mode::AM => Some(Mode::DataAM),
            _ => None,
        }
    }

    /// The passband a rig normally selects for this mode.
    pub fn default_passband(&self) -> Passband {
        let hz = match self.base() {
            Mode::CW | Mode::CWR => 500,
            Mode::RTTY | Mode::RTTYR => 500,
            Mode::AM => 6000,
            Mode::FM => 15000,
            _ => 2400,
        };
        Passband::from_hz(hz)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::USB => "USB",
            Mode::LSB => "LSB",
            Mode::CW => "CW",
            Mode::CWR => "CWR",
            Mode::AM => "AM",
            Mode::FM => "FM",
            Mode::RTTY => "RTTY",
            Mode::RTTYR => "RTTYR",
            Mode::DataUSB => "DATA-USB",
            Mode::DataLSB => "DATA-LSB",
            Mode::DataFM => "DATA-FM",
            Mode::DataAM => "DATA-AM",
        };
        write!(f, "{s}")
    }
}

/// Error returned when a string cannot be parsed into a [`Mode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModeError(String);

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mode: {}", self.0)
    }
}

impl std::error::Error for ParseModeError {}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USB" => Ok(Mode::USB),
            "LSB" => Ok(Mode::LSB),
            "CW" => Ok(Mode::CW),
            "CWR" => Ok(Mode::CWR),
            "AM" => Ok(Mode::AM),
            "FM" => Ok(Mode::FM),
            "RTTY" => Ok(Mode::RTTY),
            "RTTYR" => Ok(Mode::RTTYR),
            "DATA-USB" | "DATAUSB" | "PKTUSB" => Ok(Mode::DataUSB),
            "DATA-LSB" | "DATALSB" | "PKTLSB" => Ok(Mode::DataLSB),
            "DATA-FM" | "DATAFM" | "PKTFM" => Ok(Mode::DataFM),
            "DATA-AM" | "DATAAM" | "PKTAM" => Ok(Mode::DataAM),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Receiver passband (filter width) in hertz.
///
/// Common values: 500 Hz for CW, 2400 Hz for SSB, 6000 Hz for AM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Passband(u32);

impl Passband {
    /// Create a new passband width from a value in hertz.
    pub fn from_hz(hz: u32) -> Self {
        Passband(hz)
    }

    /// Return the passband width in hertz.
    pub fn hz(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Passband {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

/// A mode together with the passband the rig reports for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeReading {
    pub mode: Mode,
    pub passband: Passband,
}

/// Transceiver manufacturer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Manufacturer {
    /// Icom (CI-V protocol).
    Icom,
    /// Yaesu (CAT protocol).
    Yaesu,
    /// Elecraft (extended Kenwood command set).
    Elecraft,
    /// Kenwood (standard CAT commands).
    Kenwood,
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Manufacturer::Icom => "Icom",
            Manufacturer::Yaesu => "Yaesu",
            Manufacturer::Elecraft => "Elecraft",
            Manufacturer::Kenwood => "Kenwood",
        };
        write!(f, "{s}")
    }
}

/// Static information about a connected rig.
#[derive(Debug, Clone)]
pub struct RigInfo {
    /// The manufacturer of the rig.
    pub manufacturer: Manufacturer,
    /// Human-readable model name (e.g. "IC-7300", "K3", "FT-991A").
    pub model_name: String,
    /// Machine-readable model identifier, as used by the model registry.
    pub model_id: String,
}

/// A contiguous frequency range, typically corresponding to a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandRange {
    /// Lower bound of the range in hertz (inclusive).
    pub low_hz: u64,
    /// Upper bound of the range in hertz (inclusive).
    pub high_hz: u64,
}

impl BandRange {
    /// Create a new band range.
    pub fn new(low_hz: u64, high_hz: u64) -> Self {
        BandRange { low_hz, high_hz }
    }

    /// Check whether a frequency (in hertz) falls within this range (inclusive).
    pub fn contains(&self, freq_hz: u64) -> bool {
        freq_hz >= self.low_hz && freq_hz <= self.high_hz
    }
}

impl fmt::Display for BandRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} Hz", self.low_hz, self.high_hz)
    }
}

/// One point of an S-meter calibration table: a raw meter reading and the
/// signal level it corresponds to, in dB relative to S9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterPoint {
    pub raw: u16,
    pub db: i32,
}

/// A stored memory channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryChannel {
    pub number: u16,
    pub frequency_hz: u64,
    pub mode: Mode,
}

/// What a particular rig model can do.
///
/// The coordinator validates every operation against this descriptor
/// before anything is written to the wire.
#[derive(Debug, Clone)]
pub struct RigCapabilities {
    /// Tunable frequency ranges.
    pub frequency_ranges: Vec<BandRange>,
    /// Modes the rig can be set to.
    pub supported_modes: Vec<Mode>,
    /// Maximum RF output power in watts.
    pub max_power_watts: f32,
    /// Conventional VFO A/B pair.
    pub has_vfo_b: bool,
    /// Main/Sub dual receiver.
    pub has_main_sub: bool,
    pub has_split: bool,
    pub has_rit: bool,
    pub has_xit: bool,
    /// Largest RIT/XIT offset magnitude in hertz.
    pub max_offset_hz: i32,
    /// Inclusive memory channel numbers, `None` if memories are not
    /// addressable over CAT.
    pub memory_channels: Option<(u16, u16)>,
    /// Raw S-meter reading to dB-over-S9 calibration, ascending by `raw`.
    pub meter_calibration: Vec<MeterPoint>,
}

impl RigCapabilities {
    /// Whether `freq_hz` falls in any tunable range.
    pub fn covers(&self, freq_hz: u64) -> bool {
        self.frequency_ranges.iter().any(|r| r.contains(freq_hz))
    }

    /// Number of addressable memory channels.
    pub fn memory_count(&self) -> u32 {
        match self.memory_channels {
            Some((low, high)) if low <= high => u32::from(high - low) + 1,
            _ => 0,
        }
    }
}

impl Default for RigCapabilities {
    fn default() -> Self {
        RigCapabilities {
            frequency_ranges: vec![BandRange::new(30_000, 60_000_000)],
            supported_modes: vec![
                Mode::LSB,
                Mode::USB,
                Mode::CW,
                Mode::CWR,
                Mode::AM,
                Mode::FM,
            ],
            max_power_watts: 100.0,
            has_vfo_b: true,
            has_main_sub: false,
            has_split: true,
            has_rit: true,
            has_xit: true,
            max_offset_hz: 9_999,
            memory_channels: None,
            meter_calibration: vec![
                MeterPoint { raw: 0, db: -54 },
                MeterPoint { raw: 120, db: 0 },
                MeterPoint { raw: 241, db: 60 },
            ],
        }
    }
}
