//! The vendor-neutral operation set and its replies.
//!
//! Every request to a rig, whatever the protocol underneath, is expressed as
//! an [`Operation`]. Protocol engines translate operations into wire bytes
//! and return a [`Reply`].

use std::fmt;

use crate::types::{MemoryChannel, Mode, ModeReading, Passband, Vfo};

/// A single request to a rig.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    GetFrequency(Vfo),
    SetFrequency(Vfo, u64),
    GetMode(Vfo),
    /// Set the operating mode. The passband is a hint; engines that cannot
    /// select a filter ignore it.
    SetMode(Vfo, Mode, Option<Passband>),
    GetPtt,
    SetPtt(bool),
    /// Report which VFO is currently selected.
    GetVfo,
    SelectVfo(Vfo),
    /// RF output power in watts.
    GetPower,
    SetPower(f32),
    GetSplit,
    SetSplit(bool),
    /// Signal strength in dB relative to S9.
    GetSignalStrength,
    GetRit,
    SetRit { enabled: bool, offset_hz: i32 },
    GetXit,
    SetXit { enabled: bool, offset_hz: i32 },
    ReadMemory(u16),
    WriteMemory(MemoryChannel),
    ClearMemory(u16),
    MemoryCount,
}

impl Operation {
    /// Short name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GetFrequency(_) => "get_frequency",
            Operation::SetFrequency(..) => "set_frequency",
            Operation::GetMode(_) => "get_mode",
            Operation::SetMode(..) => "set_mode",
            Operation::GetPtt => "get_ptt",
            Operation::SetPtt(_) => "set_ptt",
            Operation::GetVfo => "get_vfo",
            Operation::SelectVfo(_) => "select_vfo",
            Operation::GetPower => "get_power",
            Operation::SetPower(_) => "set_power",
            Operation::GetSplit => "get_split",
            Operation::SetSplit(_) => "set_split",
            Operation::GetSignalStrength => "get_signal_strength",
            Operation::GetRit => "get_rit",
            Operation::SetRit { .. } => "set_rit",
            Operation::GetXit => "get_xit",
            Operation::SetXit { .. } => "set_xit",
            Operation::ReadMemory(_) => "read_memory",
            Operation::WriteMemory(_) => "write_memory",
            Operation::ClearMemory(_) => "clear_memory",
            Operation::MemoryCount => "memory_count",
        }
    }

    /// Whether the operation only observes rig state.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Operation::GetFrequency(_)
                | Operation::GetMode(_)
                | Operation::GetPtt
                | Operation::GetVfo
                | Operation::GetPower
                | Operation::GetSplit
                | Operation::GetSignalStrength
                | Operation::GetRit
                | Operation::GetXit
                | Operation::ReadMemory(_)
                | Operation::MemoryCount
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The result of a successful [`Operation`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Frequency(u64),
    Mode(ModeReading),
    Ptt(bool),
    Vfo(Vfo),
    Power(f32),
    Split(bool),
    SignalStrength(i32),
    Offset { enabled: bool, offset_hz: i32 },
    Memory(Option<MemoryChannel>),
    Count(u32),
    /// A set operation was acknowledged.
    Done,
}

impl Reply {
    /// Short name of the reply kind, used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Frequency(_) => "frequency",
            Reply::Mode(_) => "mode",
            Reply::Ptt(_) => "ptt",
            Reply::Vfo(_) => "vfo",
            Reply::Power(_) => "power",
            Reply::Split(_) => "split",
            Reply::SignalStrength(_) => "signal strength",
            Reply::Offset { .. } => "offset",
            Reply::Memory(_) => "memory",
            Reply::Count(_) => "count",
            Reply::Done => "done",
        }
    }
}
