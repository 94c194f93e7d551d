//! The `Rig` trait -- vendor-agnostic control of one transceiver.
//!
//! Implementors supply [`execute`](Rig::execute); the typed helpers on top
//! build the matching [`Operation`] and unwrap the [`Reply`]. The rigctld
//! server and other front ends program against `dyn Rig`.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::operation::{Operation, Reply};
use crate::types::*;

fn unexpected(op: &str, reply: &Reply) -> Error {
    Error::InvalidResponse(format!("{op}: unexpected {} reply", reply.kind()))
}

#[async_trait]
pub trait Rig: Send + Sync {
    /// Return static information about the connected rig (manufacturer, model).
    fn info(&self) -> &RigInfo;

    /// Return the capabilities of the connected rig.
    fn capabilities(&self) -> &RigCapabilities;

    /// Run one operation against the rig.
    async fn execute(&self, op: Operation) -> Result<Reply>;

    /// Get the frequency of a VFO in hertz.
    async fn get_frequency(&self, vfo: Vfo) -> Result<u64> {
        match self.execute(Operation::GetFrequency(vfo)).await? {
            Reply::Frequency(hz) => Ok(hz),
            other => Err(unexpected("get_frequency", &other)),
        }
    }

    /// Set the frequency of a VFO in hertz.
    async fn set_frequency(&self, vfo: Vfo, freq_hz: u64) -> Result<()> {
        self.execute(Operation::SetFrequency(vfo, freq_hz)).await?;
        Ok(())
    }

    /// Get the operating mode and passband of a VFO.
    async fn get_mode(&self, vfo: Vfo) -> Result<ModeReading> {
        match self.execute(Operation::GetMode(vfo)).await? {
            Reply::Mode(reading) => Ok(reading),
            other => Err(unexpected("get_mode", &other)),
        }
    }

    /// Set the operating mode of a VFO, optionally with a passband.
    async fn set_mode(&self, vfo: Vfo, mode: Mode, passband: Option<Passband>) -> Result<()> {
        self.execute(Operation::SetMode(vfo, mode, passband)).await?;
        Ok(())
    }

    /// Returns `true` if the rig is transmitting.
    async fn get_ptt(&self) -> Result<bool> {
        match self.execute(Operation::GetPtt).await? {
            Reply::Ptt(on) => Ok(on),
            other => Err(unexpected("get_ptt", &other)),
        }
    }

    /// Key (`true`) or unkey (`false`) the transmitter.
    async fn set_ptt(&self, on: bool) -> Result<()> {
        self.execute(Operation::SetPtt(on)).await?;
        Ok(())
    }

    async fn get_vfo(&self) -> Result<Vfo> {
        match self.execute(Operation::GetVfo).await? {
            Reply::Vfo(vfo) => Ok(vfo),
            other => Err(unexpected("get_vfo", &other)),
        }
    }

    async fn select_vfo(&self, vfo: Vfo) -> Result<()> {
        self.execute(Operation::SelectVfo(vfo)).await?;
        Ok(())
    }

    /// Get the transmit power setting in watts.
    async fn get_power(&self) -> Result<f32> {
        match self.execute(Operation::GetPower).await? {
            Reply::Power(watts) => Ok(watts),
            other => Err(unexpected("get_power", &other)),
        }
    }

    /// Set the transmit power in watts.
    async fn set_power(&self, watts: f32) -> Result<()> {
        self.execute(Operation::SetPower(watts)).await?;
        Ok(())
    }

    async fn get_split(&self) -> Result<bool> {
        match self.execute(Operation::GetSplit).await? {
            Reply::Split(on) => Ok(on),
            other => Err(unexpected("get_split", &other)),
        }
    }

    async fn set_split(&self, on: bool) -> Result<()> {
        self.execute(Operation::SetSplit(on)).await?;
        Ok(())
    }

    /// Signal strength in dB relative to S9.
    async fn get_signal_strength(&self) -> Result<i32> {
        match self.execute(Operation::GetSignalStrength).await? {
            Reply::SignalStrength(db) => Ok(db),
            other => Err(unexpected("get_signal_strength", &other)),
        }
    }

    /// RIT state as `(enabled, offset_hz)`.
    async fn get_rit(&self) -> Result<(bool, i32)> {
        match self.execute(Operation::GetRit).await? {
            Reply::Offset { enabled, offset_hz } => Ok((enabled, offset_hz)),
            other => Err(unexpected("get_rit", &other)),
        }
    }

    async fn set_rit(&self, enabled: bool, offset_hz: i32) -> Result<()> {
        self.execute(Operation::SetRit { enabled, offset_hz }).await?;
        Ok(())
    }

    /// XIT state as `(enabled, offset_hz)`.
    async fn get_xit(&self) -> Result<(bool, i32)> {
        match self.execute(Operation::GetXit).await? {
            Reply::Offset { enabled, offset_hz } => Ok((enabled, offset_hz)),
            other => Err(unexpected("get_xit", &other)),
        }
    }

    async fn set_xit(&self, enabled: bool, offset_hz: i32) -> Result<()> {
        self.execute(Operation::SetXit { enabled, offset_hz }).await?;
        Ok(())
    }

    /// Read a memory channel; `None` if the channel is empty.
    async fn read_memory(&self, channel: u16) -> Result<Option<MemoryChannel>> {
        match self.execute(Operation::ReadMemory(channel)).await? {
            Reply::Memory(contents) => Ok(contents),
            other => Err(unexpected("read_memory", &other)),
        }
    }

    async fn write_memory(&self, channel: MemoryChannel) -> Result<()> {
        self.execute(Operation::WriteMemory(channel)).await?;
        Ok(())
    }

    async fn clear_memory(&self, channel: u16) -> Result<()> {
        self.execute(Operation::ClearMemory(channel)).await?;
        Ok(())
    }

    async fn memory_count(&self) -> Result<u32> {
        match self.execute(Operation::MemoryCount).await? {
            Reply::Count(n) => Ok(n),
            other => Err(unexpected("memory_count", &other)),
        }
    }
}
