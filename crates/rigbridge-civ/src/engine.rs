//! The CI-V [`ProtocolEngine`].
//!
//! One exchange is: write the frame, optionally consume and verify the
//! echo, read until `FD`, then validate addresses and the ACK/NAK or
//! command byte. A NAK is reported as [`Error::CommandFailed`] and never
//! retried with a different frame.
//!
//! Operations aimed at a VFO other than the selected one select it first
//! and switch back afterwards, so the rig is left as the operator set it.
//! When a failed exchange leaves the rig's selection unknown, the next
//! operation selects the operator's VFO again before doing anything else.

use async_trait::async_trait;
use rigbridge_core::error::{Error, Result};
use rigbridge_core::{
    calibrate_meter, model_id, Manufacturer, MemoryChannel, Mode, ModeReading, Operation, Passband,
    ProtocolEngine, Reply, RigCapabilities, RigInfo, SerialLink, Vfo,
};

use crate::civ::{decode_reply, CivFrame, CONTROLLER_ADDR, TERMINATOR};
use crate::commands::*;
use crate::models::IcomModel;

pub struct CivEngine {
    model: IcomModel,
    civ_address: u8,
    info: RigInfo,
    /// The VFO the operator selected; `Vfo::Current` resolves to it.
    selected: Vfo,
    /// What the rig has selected right now, `None` once unknown.
    on_rig: Option<Vfo>,
}

impl CivEngine {
    pub fn new(model: IcomModel) -> Self {
        let civ_address = model.default_civ_address;
        Self::with_address(model, civ_address)
    }

    /// Use a CI-V address other than the model's factory default.
    pub fn with_address(model: IcomModel, civ_address: u8) -> Self {
        let info = RigInfo {
            manufacturer: Manufacturer::Icom,
            model_name: model.name.to_string(),
            model_id: model_id(model.name),
        };
        let selected = if model.capabilities.has_main_sub {
            Vfo::Main
        } else {
            Vfo::A
        };
        CivEngine {
            model,
            civ_address,
            info,
            selected,
            on_rig: Some(selected),
        }
    }

    pub fn civ_address(&self) -> u8 {
        self.civ_address
    }

    // ---------------------------------------------------------------
    // Exchanges
    // ---------------------------------------------------------------

    async fn exchange(&self, link: &mut SerialLink, frame: &[u8]) -> Result<CivFrame> {
        tracing::trace!(frame = ?frame, "civ tx");
        link.write(frame).await?;

        if self.model.echoes_commands {
            let echo = link.read_exact(frame.len()).await?;
            if echo != frame {
                tracing::warn!(sent = ?frame, echo = ?echo, "CI-V echo mismatch");
                return Err(Error::InvalidResponse(format!(
                    "echo mismatch: sent {frame:02X?}, read {echo:02X?}"
                )));
            }
        }

        let bytes = link.read_until(TERMINATOR).await?;
        let reply = decode_reply(&bytes)?;
        if reply.dst_addr != CONTROLLER_ADDR || reply.src_addr != self.civ_address {
            return Err(Error::InvalidResponse(format!(
                "reply addressed {:02X}->{:02X}, expected {:02X}->{:02X}",
                reply.src_addr, reply.dst_addr, self.civ_address, CONTROLLER_ADDR
            )));
        }
        if reply.is_nak() {
            return Err(Error::CommandFailed(format!(
                "rig rejected command {frame:02X?} (NAK)"
            )));
        }
        Ok(reply)
    }

    /// Send a set command and require an ACK.
    async fn set(&self, link: &mut SerialLink, frame: &[u8]) -> Result<()> {
        let reply = self.exchange(link, frame).await?;
        if !reply.is_ack() {
            return Err(Error::InvalidResponse(format!(
                "expected ACK, got command 0x{:02X}",
                reply.cmd
            )));
        }
        Ok(())
    }

    /// Send a read command and return the payload after `cmd` and `sub`.
    async fn read(
        &self,
        link: &mut SerialLink,
        frame: &[u8],
        cmd: u8,
        sub: Option<u8>,
    ) -> Result<Vec<u8>> {
        let reply = self.exchange(link, frame).await?;
        if reply.cmd != cmd {
            return Err(Error::InvalidResponse(format!(
                "expected reply to command 0x{cmd:02X}, got 0x{:02X}",
                reply.cmd
            )));
        }
        let mut payload = reply.payload;
        if let Some(sub) = sub {
            if payload.first() != Some(&sub) {
                return Err(Error::InvalidResponse(format!(
                    "expected sub-command 0x{sub:02X} in reply to 0x{cmd:02X}"
                )));
            }
            payload.remove(0);
        }
        Ok(payload)
    }

    // ---------------------------------------------------------------
    // VFO handling
    // ---------------------------------------------------------------

    fn vfo_sub(vfo: Vfo) -> Result<u8> {
        match vfo {
            Vfo::A => Ok(SUB_VFO_A),
            Vfo::B => Ok(SUB_VFO_B),
            Vfo::Main => Ok(SUB_VFO_MAIN),
            Vfo::Sub => Ok(SUB_VFO_SUB),
            Vfo::Current => Err(Error::InvalidParameter(
                "cannot select the current VFO".into(),
            )),
        }
    }

    async fn select(&mut self, link: &mut SerialLink, vfo: Vfo) -> Result<()> {
        let frame = cmd_select_vfo(self.civ_address, Self::vfo_sub(vfo)?);
        self.on_rig = None;
        self.set(link, &frame).await?;
        self.on_rig = Some(vfo);
        Ok(())
    }

    /// Reselect the operator's VFO if the rig's selection is unknown.
    async fn resync_vfo(&mut self, link: &mut SerialLink) -> Result<()> {
        if self.on_rig.is_none() {
            let home = self.selected;
            tracing::debug!(vfo = %home, "VFO selection unknown, reselecting");
            self.select(link, home).await?;
        }
        Ok(())
    }

    /// Switch to `vfo` if needed; true when a switch back is owed.
    async fn enter_vfo(&mut self, link: &mut SerialLink, vfo: Vfo) -> Result<bool> {
        if vfo == Vfo::Current || vfo == self.selected {
            return Ok(false);
        }
        self.select(link, vfo).await?;
        Ok(true)
    }

    async fn leave_vfo<T>(
        &mut self,
        link: &mut SerialLink,
        swapped: bool,
        result: Result<T>,
    ) -> Result<T> {
        if !swapped {
            return result;
        }
        if let Err(e) = &result {
            if e.desyncs_link() {
                if let Err(fe) = link.flush().await {
                    tracing::warn!("flush before VFO restore failed: {fe}");
                }
            }
        }
        let home = self.selected;
        let restored = self.select(link, home).await;
        match (result, restored) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), restored) => {
                if let Err(re) = restored {
                    tracing::warn!("failed to restore {home} after error: {re}");
                }
                Err(e)
            }
        }
    }

    // ---------------------------------------------------------------
    // Operations
    // ---------------------------------------------------------------

    async fn read_frequency(&self, link: &mut SerialLink) -> Result<u64> {
        let data = self
            .read(link, &cmd_read_frequency(self.civ_address), CMD_READ_FREQ, None)
            .await?;
        parse_frequency(&data)
    }

    async fn write_frequency(&self, link: &mut SerialLink, freq_hz: u64) -> Result<()> {
        let frame = cmd_set_frequency(self.civ_address, freq_hz)?;
        self.set(link, &frame).await
    }

    async fn read_mode(&self, link: &mut SerialLink) -> Result<ModeReading> {
        let data = self
            .read(link, &cmd_read_mode(self.civ_address), CMD_READ_MODE, None)
            .await?;
        let (mut mode, passband) = parse_mode(&data)?;
        if self.model.has_data_mode {
            if let Some(data_mode) = mode.with_data() {
                let flag = self
                    .read(
                        link,
                        &cmd_read_data_mode(self.civ_address),
                        CMD_EXTENDED,
                        Some(SUB_DATA_MODE),
                    )
                    .await?;
                if parse_data_mode(&flag)? {
                    mode = data_mode;
                }
            }
        }
        Ok(ModeReading { mode, passband })
    }

    async fn write_mode(
        &self,
        link: &mut SerialLink,
        mode: Mode,
        passband: Option<Passband>,
    ) -> Result<()> {
        let mode_byte = mode_to_byte(mode).ok_or(Error::ModeNotSupported(mode))?;
        if mode.is_data() && !self.model.has_data_mode {
            return Err(Error::ModeNotSupported(mode));
        }
        let filter = passband_to_filter(mode, passband);
        let filter_byte = self.model.mode_filter_byte.then_some(filter);
        self.set(link, &cmd_set_mode(self.civ_address, mode_byte, filter_byte))
            .await?;
        if self.model.has_data_mode {
            self.set(
                link,
                &cmd_set_data_mode(self.civ_address, mode.is_data(), filter),
            )
            .await?;
        }
        Ok(())
    }

    async fn read_switch(
        &self,
        link: &mut SerialLink,
        frame: &[u8],
        cmd: u8,
        sub: Option<u8>,
        what: &str,
    ) -> Result<bool> {
        let data = self.read(link, frame, cmd, sub).await?;
        parse_switch(&data, what)
    }

    async fn read_offset(&self, link: &mut SerialLink, switch_sub: u8) -> Result<Reply> {
        let addr = self.civ_address;
        let enabled = self
            .read_switch(
                link,
                &cmd_read_offset_switch(addr, switch_sub),
                CMD_RIT_XIT,
                Some(switch_sub),
                "RIT/XIT switch",
            )
            .await?;
        let data = self
            .read(
                link,
                &cmd_read_offset(addr),
                CMD_RIT_XIT,
                Some(SUB_RIT_OFFSET),
            )
            .await?;
        Ok(Reply::Offset {
            enabled,
            offset_hz: parse_offset(&data)?,
        })
    }

    async fn write_offset(
        &self,
        link: &mut SerialLink,
        switch_sub: u8,
        enabled: bool,
        offset_hz: i32,
    ) -> Result<()> {
        let addr = self.civ_address;
        self.set(link, &cmd_set_offset(addr, offset_hz)?).await?;
        self.set(link, &cmd_set_offset_switch(addr, switch_sub, enabled))
            .await
    }

    async fn read_level(
        &self,
        link: &mut SerialLink,
        frame: &[u8],
        cmd: u8,
        sub: u8,
    ) -> Result<u16> {
        let data = self.read(link, frame, cmd, Some(sub)).await?;
        parse_level(&data)
    }

    fn watts_to_level(&self, watts: f32) -> u16 {
        let max = self.model.capabilities.max_power_watts;
        ((watts / max) * 255.0).round().clamp(0.0, 255.0) as u16
    }

    fn level_to_watts(&self, level: u16) -> f32 {
        let max = self.model.capabilities.max_power_watts;
        (f32::from(level) * max / 255.0 * 10.0).round() / 10.0
    }

    async fn write_memory(&self, link: &mut SerialLink, channel: &MemoryChannel) -> Result<()> {
        if channel.mode.is_data() && !self.model.has_data_mode {
            return Err(Error::ModeNotSupported(channel.mode));
        }
        let mode_byte = mode_to_byte(channel.mode).ok_or(Error::ModeNotSupported(channel.mode))?;
        let frame = cmd_write_memory(
            self.civ_address,
            channel,
            mode_byte,
            self.model.has_data_mode,
        )?;
        self.set(link, &frame).await
    }
}

#[async_trait]
impl ProtocolEngine for CivEngine {
    fn info(&self) -> &RigInfo {
        &self.info
    }

    fn capabilities(&self) -> &RigCapabilities {
        &self.model.capabilities
    }

    fn default_baud_rate(&self) -> u32 {
        self.model.default_baud_rate
    }

    async fn execute(&mut self, link: &mut SerialLink, op: &Operation) -> Result<Reply> {
        tracing::debug!(op = %op, addr = self.civ_address, "civ operation");
        let addr = self.civ_address;
        if !matches!(op, Operation::SelectVfo(_) | Operation::MemoryCount) {
            self.resync_vfo(link).await?;
        }
        match op {
            Operation::GetFrequency(vfo) => {
                let swapped = self.enter_vfo(link, *vfo).await?;
                let result = self.read_frequency(link).await;
                self.leave_vfo(link, swapped, result)
                    .await
                    .map(Reply::Frequency)
            }
            Operation::SetFrequency(vfo, freq_hz) => {
                let swapped = self.enter_vfo(link, *vfo).await?;
                let result = self.write_frequency(link, *freq_hz).await;
                self.leave_vfo(link, swapped, result).await?;
                Ok(Reply::Done)
            }
            Operation::GetMode(vfo) => {
                let swapped = self.enter_vfo(link, *vfo).await?;
                let result = self.read_mode(link).await;
                self.leave_vfo(link, swapped, result).await.map(Reply::Mode)
            }
            Operation::SetMode(vfo, mode, passband) => {
                let swapped = self.enter_vfo(link, *vfo).await?;
                let result = self.write_mode(link, *mode, *passband).await;
                self.leave_vfo(link, swapped, result).await?;
                Ok(Reply::Done)
            }
            Operation::GetPtt => {
                let on = self
                    .read_switch(link, &cmd_read_ptt(addr), CMD_PTT, Some(SUB_TX), "PTT")
                    .await?;
                Ok(Reply::Ptt(on))
            }
            Operation::SetPtt(on) => {
                self.set(link, &cmd_set_ptt(addr, *on)).await?;
                Ok(Reply::Done)
            }
            Operation::GetVfo => Ok(Reply::Vfo(self.selected)),
            Operation::SelectVfo(vfo) => {
                self.select(link, *vfo).await?;
                self.selected = *vfo;
                Ok(Reply::Done)
            }
            Operation::GetPower => {
                let level = self
                    .read_level(link, &cmd_read_power(addr), CMD_LEVEL, SUB_RF_POWER)
                    .await?;
                Ok(Reply::Power(self.level_to_watts(level)))
            }
            Operation::SetPower(watts) => {
                let frame = cmd_set_power(addr, self.watts_to_level(*watts))?;
                self.set(link, &frame).await?;
                Ok(Reply::Done)
            }
            Operation::GetSplit => {
                let on = self
                    .read_switch(link, &cmd_read_split(addr), CMD_SPLIT, None, "split")
                    .await?;
                Ok(Reply::Split(on))
            }
            Operation::SetSplit(on) => {
                self.set(link, &cmd_set_split(addr, *on)).await?;
                Ok(Reply::Done)
            }
            Operation::GetSignalStrength => {
                let raw = self
                    .read_level(link, &cmd_read_s_meter(addr), CMD_METER, SUB_S_METER)
                    .await?;
                let db = calibrate_meter(&self.model.capabilities.meter_calibration, raw);
                Ok(Reply::SignalStrength(db))
            }
            Operation::GetRit => self.read_offset(link, SUB_RIT_ON).await,
            Operation::SetRit { enabled, offset_hz } => {
                self.write_offset(link, SUB_RIT_ON, *enabled, *offset_hz)
                    .await?;
                Ok(Reply::Done)
            }
            Operation::GetXit => self.read_offset(link, SUB_XIT_ON).await,
            Operation::SetXit { enabled, offset_hz } => {
                self.write_offset(link, SUB_XIT_ON, *enabled, *offset_hz)
                    .await?;
                Ok(Reply::Done)
            }
            Operation::ReadMemory(channel) => {
                let frame = cmd_read_memory(addr, *channel)?;
                let data = self
                    .read(link, &frame, CMD_EXTENDED, Some(SUB_MEMORY_CONTENTS))
                    .await?;
                Ok(Reply::Memory(parse_memory(
                    &data,
                    *channel,
                    self.model.has_data_mode,
                )?))
            }
            Operation::WriteMemory(channel) => {
                self.write_memory(link, channel).await?;
                Ok(Reply::Done)
            }
            Operation::ClearMemory(channel) => {
                self.set(link, &cmd_clear_memory(addr, *channel)?).await?;
                Ok(Reply::Done)
            }
            Operation::MemoryCount => Ok(Reply::Count(self.model.capabilities.memory_count())),
        }
    }

    fn reset(&mut self) {
        self.on_rig = None;
    }
}
