//! The text CAT [`ProtocolEngine`].
//!
//! Every exchange is one command and one `;`-terminated reply. A set must
//! come back as the identical text; a query must come back starting with
//! the mnemonic that was sent. Anything else means the stream is out of
//! step and is reported as [`Error::InvalidResponse`].

use async_trait::async_trait;
use rigbridge_core::error::{Error, Result};
use rigbridge_core::framing::{encode_decimal, encode_signed_decimal, parse_decimal, parse_signed_decimal};
use rigbridge_core::{
    calibrate_meter, model_id, MemoryChannel, Mode, ModeReading, Operation, Passband, ProtocolEngine,
    Reply, RigCapabilities, RigInfo, SerialLink, Vfo,
};

use crate::dialect::{Dialect, MemoryFormat, OffsetWrite, SplitControl, VfoSelect};
use crate::models::CatModel;
use crate::protocol::{decode_reply, encode_command, reply_payload, TERMINATOR};

/// RIT or XIT, which share the offset field in the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clarifier {
    Rit,
    Xit,
}

impl Clarifier {
    fn switch(self) -> &'static str {
        match self {
            Clarifier::Rit => "RT",
            Clarifier::Xit => "XT",
        }
    }
}

pub struct CatEngine {
    model: CatModel,
    info: RigInfo,
    /// Selected VFO, `None` until read from the rig or after a reset.
    selected: Option<Vfo>,
}

impl CatEngine {
    pub fn new(model: CatModel) -> Self {
        let info = RigInfo {
            manufacturer: model.manufacturer,
            model_name: model.name.to_string(),
            model_id: model_id(model.name),
        };
        CatEngine {
            model,
            info,
            selected: None,
        }
    }

    pub fn dialect(&self) -> &'static Dialect {
        self.model.dialect
    }

    // ---------------------------------------------------------------
    // Exchanges
    // ---------------------------------------------------------------

    async fn transact(&self, link: &mut SerialLink, command: &str) -> Result<String> {
        tracing::trace!(command, "cat tx");
        link.write(command.as_bytes()).await?;
        let bytes = link.read_until(TERMINATOR).await?;
        let reply = decode_reply(&bytes, command)?;
        tracing::trace!(reply = %reply, "cat rx");
        Ok(reply)
    }

    /// Send a set command and require the identical echo.
    async fn set(&self, link: &mut SerialLink, mnemonic: &str, payload: &str) -> Result<()> {
        let command = encode_command(mnemonic, payload);
        let reply = self.transact(link, &command).await?;
        if reply != command {
            return Err(Error::InvalidResponse(format!(
                "sent {command}, rig answered {reply}"
            )));
        }
        Ok(())
    }

    /// Send the bare `prefix` as a query and return what follows it.
    async fn query(&self, link: &mut SerialLink, prefix: &str) -> Result<String> {
        let command = encode_command(prefix, "");
        let reply = self.transact(link, &command).await?;
        reply_payload(&reply, prefix).map(str::to_string)
    }

    async fn query_flag(&self, link: &mut SerialLink, mnemonic: &str) -> Result<bool> {
        let payload = self.query(link, mnemonic).await?;
        match payload.as_str() {
            "0" => Ok(false),
            "1" | "2" => Ok(true),
            other => Err(Error::InvalidResponse(format!(
                "unexpected {mnemonic} value {other:?}"
            ))),
        }
    }

    /// Read the `IF;` status line, checking it is long enough to slice.
    async fn read_info(&self, link: &mut SerialLink) -> Result<String> {
        let payload = self.query(link, "IF").await?;
        let needed = self.dialect().info.min_len();
        if !payload.is_ascii() || payload.len() < needed {
            return Err(Error::InvalidResponse(format!(
                "IF reply too short: {} chars, need {needed}",
                payload.len()
            )));
        }
        Ok(payload)
    }

    // ---------------------------------------------------------------
    // VFO handling
    // ---------------------------------------------------------------

    fn vfo_digit(vfo: Vfo) -> Result<&'static str> {
        match vfo {
            Vfo::A => Ok("0"),
            Vfo::B => Ok("1"),
            Vfo::Main | Vfo::Sub => Err(Error::UnsupportedOperation(format!(
                "{vfo} is not addressable over text CAT"
            ))),
            Vfo::Current => Err(Error::InvalidParameter(
                "cannot select the current VFO".into(),
            )),
        }
    }

    fn parse_vfo(payload: &str, mnemonic: &str) -> Result<Vfo> {
        match payload {
            "0" => Ok(Vfo::A),
            "1" => Ok(Vfo::B),
            other => Err(Error::InvalidResponse(format!(
                "unexpected {mnemonic} value {other:?}"
            ))),
        }
    }

    async fn read_selected(&mut self, link: &mut SerialLink) -> Result<Vfo> {
        let mnemonic = match self.dialect().vfo_select {
            VfoSelect::Paired { rx, .. } => rx,
            VfoSelect::Single(cmd) => cmd,
        };
        let payload = self.query(link, mnemonic).await?;
        let vfo = Self::parse_vfo(&payload, mnemonic)?;
        self.selected = Some(vfo);
        Ok(vfo)
    }

    /// The selected VFO, read from the rig if not yet known.
    async fn selected(&mut self, link: &mut SerialLink) -> Result<Vfo> {
        match self.selected {
            Some(vfo) => Ok(vfo),
            None => self.read_selected(link).await,
        }
    }

    /// Map `vfo` onto A or B.
    async fn resolve(&mut self, link: &mut SerialLink, vfo: Vfo) -> Result<Vfo> {
        match vfo {
            Vfo::Current => self.selected(link).await,
            Vfo::A | Vfo::B => Ok(vfo),
            Vfo::Main | Vfo::Sub => Err(Error::UnsupportedOperation(format!(
                "{vfo} is not addressable over text CAT"
            ))),
        }
    }

    async fn select(&mut self, link: &mut SerialLink, vfo: Vfo) -> Result<()> {
        let digit = Self::vfo_digit(vfo)?;
        // Unknown until both halves of a paired select have landed.
        self.selected = None;
        match self.dialect().vfo_select {
            VfoSelect::Paired { rx, tx } => {
                self.set(link, rx, digit).await?;
                self.set(link, tx, digit).await?;
            }
            VfoSelect::Single(cmd) => self.set(link, cmd, digit).await?,
        }
        self.selected = Some(vfo);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Frequency and mode
    // ---------------------------------------------------------------

    fn frequency_mnemonic(vfo: Vfo) -> &'static str {
        if vfo == Vfo::B {
            "FB"
        } else {
            "FA"
        }
    }

    async fn read_frequency(&mut self, link: &mut SerialLink, vfo: Vfo) -> Result<u64> {
        let vfo = self.resolve(link, vfo).await?;
        let mnemonic = Self::frequency_mnemonic(vfo);
        let payload = self.query(link, mnemonic).await?;
        if payload.len() != self.dialect().frequency_digits {
            return Err(Error::InvalidResponse(format!(
                "{mnemonic} reply has {} digits, expected {}",
                payload.len(),
                self.dialect().frequency_digits
            )));
        }
        parse_decimal(&payload)
    }

    async fn write_frequency(&mut self, link: &mut SerialLink, vfo: Vfo, freq_hz: u64) -> Result<()> {
        let field = encode_decimal(freq_hz, self.dialect().frequency_digits)?;
        let vfo = self.resolve(link, vfo).await?;
        self.set(link, Self::frequency_mnemonic(vfo), &field).await
    }

    async fn mode_mnemonic(&mut self, link: &mut SerialLink, vfo: Vfo) -> Result<&'static str> {
        let dialect = self.dialect();
        let target = self.resolve(link, vfo).await?;
        if let Some(b) = dialect.mode_command_b {
            return Ok(if target == Vfo::B { b } else { dialect.mode_command });
        }
        if target == self.selected(link).await? {
            Ok(dialect.mode_command)
        } else {
            Err(Error::UnsupportedOperation(format!(
                "{} rigs only address the mode of the selected VFO",
                dialect.name
            )))
        }
    }

    fn decode_mode(&self, payload: &str) -> Result<Mode> {
        let mut chars = payload.chars();
        let code = match (chars.next(), chars.next()) {
            (Some(code), None) => code,
            _ => {
                return Err(Error::InvalidResponse(format!(
                    "mode field {payload:?} is not one character"
                )))
            }
        };
        self.dialect()
            .mode_for_code(code)
            .ok_or_else(|| Error::InvalidResponse(format!("unknown mode code {code:?}")))
    }

    async fn read_mode(&mut self, link: &mut SerialLink, vfo: Vfo) -> Result<ModeReading> {
        let mnemonic = self.mode_mnemonic(link, vfo).await?;
        let payload = self.query(link, mnemonic).await?;
        let mode = self.decode_mode(&payload)?;
        Ok(ModeReading {
            mode,
            passband: mode.default_passband(),
        })
    }

    async fn write_mode(
        &mut self,
        link: &mut SerialLink,
        vfo: Vfo,
        mode: Mode,
        passband: Option<Passband>,
    ) -> Result<()> {
        let code = self
            .dialect()
            .mode_code(mode)
            .ok_or(Error::ModeNotSupported(mode))?;
        if let Some(passband) = passband {
            tracing::debug!(hz = passband.hz(), "passband is not set over text CAT, ignoring");
        }
        let mnemonic = self.mode_mnemonic(link, vfo).await?;
        self.set(link, mnemonic, &code.to_string()).await
    }

    // ---------------------------------------------------------------
    // PTT and split
    // ---------------------------------------------------------------

    async fn read_ptt(&self, link: &mut SerialLink) -> Result<bool> {
        let dialect = self.dialect();
        if let Some(query) = dialect.ptt_query {
            return self.query_flag(link, query).await;
        }
        let Some(pos) = dialect.info.ptt else {
            return Err(Error::UnsupportedOperation(format!(
                "{} dialect has no PTT readback",
                dialect.name
            )));
        };
        let info = self.read_info(link).await?;
        Ok(&info[pos..=pos] == "1")
    }

    async fn write_ptt(&self, link: &mut SerialLink, on: bool) -> Result<()> {
        let dialect = self.dialect();
        let mnemonic = if on { dialect.ptt_on } else { dialect.ptt_off };
        self.set(link, mnemonic, "").await
    }

    async fn read_split(&mut self, link: &mut SerialLink) -> Result<bool> {
        match (self.dialect().split, self.dialect().vfo_select) {
            (SplitControl::Command(cmd), _) => self.query_flag(link, cmd).await,
            (SplitControl::TxVfo, VfoSelect::Paired { rx, tx }) => {
                let rx_vfo = Self::parse_vfo(&self.query(link, rx).await?, rx)?;
                let tx_vfo = Self::parse_vfo(&self.query(link, tx).await?, tx)?;
                self.selected = Some(rx_vfo);
                Ok(rx_vfo != tx_vfo)
            }
            (SplitControl::TxVfo, VfoSelect::Single(cmd)) => self.query_flag(link, cmd).await,
        }
    }

    async fn write_split(&mut self, link: &mut SerialLink, on: bool) -> Result<()> {
        let digit = if on { "1" } else { "0" };
        match (self.dialect().split, self.dialect().vfo_select) {
            (SplitControl::Command(cmd), _) => self.set(link, cmd, digit).await,
            (SplitControl::TxVfo, VfoSelect::Paired { tx, .. }) => {
                // Receive stays put; only the transmit VFO moves.
                let rx_vfo = self.selected(link).await?;
                let tx_vfo = match (on, rx_vfo) {
                    (false, vfo) => vfo,
                    (true, Vfo::A) => Vfo::B,
                    (true, _) => Vfo::A,
                };
                self.set(link, tx, Self::vfo_digit(tx_vfo)?).await
            }
            (SplitControl::TxVfo, VfoSelect::Single(cmd)) => {
                self.selected = None;
                self.set(link, cmd, digit).await?;
                self.selected = Some(if on { Vfo::B } else { Vfo::A });
                Ok(())
            }
        }
    }

    // ---------------------------------------------------------------
    // Levels
    // ---------------------------------------------------------------

    async fn read_power(&self, link: &mut SerialLink) -> Result<f32> {
        let payload = self.query(link, "PC").await?;
        Ok(parse_decimal(&payload)? as f32)
    }

    async fn write_power(&self, link: &mut SerialLink, watts: f32) -> Result<()> {
        let field = encode_decimal(watts.round().max(0.0) as u64, 3)?;
        self.set(link, "PC", &field).await
    }

    async fn read_s_meter(&self, link: &mut SerialLink) -> Result<i32> {
        let mnemonic = self.dialect().s_meter;
        let payload = self.query(link, mnemonic).await?;
        let raw = u16::try_from(parse_decimal(&payload)?)
            .map_err(|_| Error::InvalidResponse(format!("S-meter value {payload} out of range")))?;
        Ok(calibrate_meter(&self.model.capabilities.meter_calibration, raw))
    }

    // ---------------------------------------------------------------
    // RIT / XIT
    // ---------------------------------------------------------------

    async fn read_offset(&self, link: &mut SerialLink, which: Clarifier) -> Result<Reply> {
        let layout = self.dialect().info;
        let info = self.read_info(link).await?;
        let offset_hz = parse_signed_decimal(&info[layout.offset.0..layout.offset.1])?;
        let flag = match which {
            Clarifier::Rit => layout.rit,
            Clarifier::Xit => layout.xit,
        };
        Ok(Reply::Offset {
            enabled: &info[flag..=flag] == "1",
            offset_hz,
        })
    }

    async fn write_offset(
        &self,
        link: &mut SerialLink,
        which: Clarifier,
        enabled: bool,
        offset_hz: i32,
    ) -> Result<()> {
        match self.dialect().offset_write {
            OffsetWrite::Absolute { mnemonic, digits } => {
                let field = encode_signed_decimal(offset_hz, digits)?;
                self.set(link, mnemonic, &field).await?;
            }
            OffsetWrite::Steps { digits } => {
                let step = encode_decimal(u64::from(offset_hz.unsigned_abs()), digits)?;
                self.set(link, "RC", "").await?;
                if offset_hz > 0 {
                    self.set(link, "RU", &step).await?;
                } else if offset_hz < 0 {
                    self.set(link, "RD", &step).await?;
                }
            }
        }
        self.set(link, which.switch(), if enabled { "1" } else { "0" })
            .await
    }

    // ---------------------------------------------------------------
    // Memory
    // ---------------------------------------------------------------

    fn memory_format(&self) -> Result<MemoryFormat> {
        self.dialect().memory.ok_or_else(|| {
            Error::UnsupportedOperation(format!(
                "{} has no memory access over CAT",
                self.model.name
            ))
        })
    }

    async fn read_memory(&self, link: &mut SerialLink, number: u16) -> Result<Option<MemoryChannel>> {
        let format = self.memory_format()?;
        let channel = encode_decimal(u64::from(number), format.channel_digits)?;
        let payload = self
            .query(link, &format!("{}{channel}", format.read))
            .await?;

        let digits = self.dialect().frequency_digits;
        let mode_at = digits + format.filler.len();
        if !payload.is_ascii() || payload.len() <= mode_at {
            return Err(Error::InvalidResponse(format!(
                "memory reply too short: {payload:?}"
            )));
        }
        let frequency_hz = parse_decimal(&payload[..digits])?;
        if frequency_hz == 0 {
            return Ok(None);
        }
        let mode = self.decode_mode(&payload[mode_at..=mode_at])?;
        Ok(Some(MemoryChannel {
            number,
            frequency_hz,
            mode,
        }))
    }

    async fn write_memory_fields(
        &self,
        link: &mut SerialLink,
        number: u16,
        frequency_hz: u64,
        mode_code: char,
    ) -> Result<()> {
        let format = self.memory_format()?;
        let payload = format!(
            "{}{}{}{mode_code}{}",
            encode_decimal(u64::from(number), format.channel_digits)?,
            encode_decimal(frequency_hz, self.dialect().frequency_digits)?,
            format.filler,
            format.trailer,
        );
        self.set(link, format.write, &payload).await
    }
}

#[async_trait]
impl ProtocolEngine for CatEngine {
    fn info(&self) -> &RigInfo {
        &self.info
    }

    fn capabilities(&self) -> &RigCapabilities {
        &self.model.capabilities
    }

    fn default_baud_rate(&self) -> u32 {
        self.model.default_baud_rate
    }

    /// Turn off unsolicited status output so every read is a reply.
    async fn initialize(&mut self, link: &mut SerialLink) -> Result<()> {
        self.set(link, "AI", "0").await?;
        tracing::debug!(dialect = self.dialect().name, "auto-information disabled");
        Ok(())
    }

    async fn execute(&mut self, link: &mut SerialLink, op: &Operation) -> Result<Reply> {
        tracing::debug!(op = %op, dialect = self.dialect().name, "cat operation");
        match op {
            Operation::GetFrequency(vfo) => self.read_frequency(link, *vfo).await.map(Reply::Frequency),
            Operation::SetFrequency(vfo, freq_hz) => {
                self.write_frequency(link, *vfo, *freq_hz).await?;
                Ok(Reply::Done)
            }
            Operation::GetMode(vfo) => self.read_mode(link, *vfo).await.map(Reply::Mode),
            Operation::SetMode(vfo, mode, passband) => {
                self.write_mode(link, *vfo, *mode, *passband).await?;
                Ok(Reply::Done)
            }
            Operation::GetPtt => self.read_ptt(link).await.map(Reply::Ptt),
            Operation::SetPtt(on) => {
                self.write_ptt(link, *on).await?;
                Ok(Reply::Done)
            }
            Operation::GetVfo => self.read_selected(link).await.map(Reply::Vfo),
            Operation::SelectVfo(vfo) => {
                self.select(link, *vfo).await?;
                Ok(Reply::Done)
            }
            Operation::GetPower => self.read_power(link).await.map(Reply::Power),
            Operation::SetPower(watts) => {
                self.write_power(link, *watts).await?;
                Ok(Reply::Done)
            }
            Operation::GetSplit => self.read_split(link).await.map(Reply::Split),
            Operation::SetSplit(on) => {
                self.write_split(link, *on).await?;
                Ok(Reply::Done)
            }
            Operation::GetSignalStrength => self.read_s_meter(link).await.map(Reply::SignalStrength),
            Operation::GetRit => self.read_offset(link, Clarifier::Rit).await,
            Operation::SetRit { enabled, offset_hz } => {
                self.write_offset(link, Clarifier::Rit, *enabled, *offset_hz)
                    .await?;
                Ok(Reply::Done)
            }
            Operation::GetXit => self.read_offset(link, Clarifier::Xit).await,
            Operation::SetXit { enabled, offset_hz } => {
                self.write_offset(link, Clarifier::Xit, *enabled, *offset_hz)
                    .await?;
                Ok(Reply::Done)
            }
            Operation::ReadMemory(number) => self.read_memory(link, *number).await.map(Reply::Memory),
            Operation::WriteMemory(channel) => {
                let code = self
                    .dialect()
                    .mode_code(channel.mode)
                    .ok_or(Error::ModeNotSupported(channel.mode))?;
                self.write_memory_fields(link, channel.number, channel.frequency_hz, code)
                    .await?;
                Ok(Reply::Done)
            }
            Operation::ClearMemory(number) => {
                self.write_memory_fields(link, *number, 0, '0').await?;
                Ok(Reply::Done)
            }
            Operation::MemoryCount => Ok(Reply::Count(self.model.capabilities.memory_count())),
        }
    }

    fn reset(&mut self) {
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ft_991a, k3, ts_590sg};
    use rigbridge_core::DEFAULT_COMMAND_TIMEOUT;
    use rigbridge_test_harness::{MockHandle, MockTransport};

    fn setup(model: CatModel) -> (CatEngine, SerialLink, MockTransport, MockHandle) {
        let mock = MockTransport::new();
        let handle = mock.handle();
        let link = SerialLink::new(Box::new(mock.clone()), DEFAULT_COMMAND_TIMEOUT);
        (CatEngine::new(model), link, mock, handle)
    }

    /// Script a set command that the rig echoes.
    fn echo(mock: &MockTransport, command: &str) {
        mock.expect(command.as_bytes(), command.as_bytes());
    }

    fn exchange(mock: &MockTransport, command: &str, reply: &str) {
        mock.expect(command.as_bytes(), reply.as_bytes());
    }

    // Kenwood IF payload: freq(11) step(5) offset(5) rit xit bank ch(2) tx ...
    const KENWOOD_IF: &str = "IF00014230000     -01201000000020000000;";

    // ---------------------------------------------------------------
    // PTT per dialect
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn ptt_wire_text_per_dialect() {
        for (model, on, off) in [
            (ts_590sg(), "TX1;", "RX;"),
            (k3(), "TX;", "RX;"),
            (ft_991a(), "TX1;", "TX0;"),
        ] {
            let (mut engine, mut link, mock, handle) = setup(model);
            echo(&mock, on);
            echo(&mock, off);
            engine.execute(&mut link, &Operation::SetPtt(true)).await.unwrap();
            engine.execute(&mut link, &Operation::SetPtt(false)).await.unwrap();
            assert_eq!(handle.sent_text(), vec![on.to_string(), off.to_string()]);
        }
    }

    #[tokio::test]
    async fn yaesu_ptt_readback_uses_tx_query() {
        let (mut engine, mut link, mock, _) = setup(ft_991a());
        exchange(&mock, "TX;", "TX1;");
        assert_eq!(
            engine.execute(&mut link, &Operation::GetPtt).await.unwrap(),
            Reply::Ptt(true)
        );
    }

    #[tokio::test]
    async fn kenwood_ptt_readback_uses_status_line() {
        let (mut engine, mut link, mock, _) = setup(ts_590sg());
        exchange(&mock, "IF;", KENWOOD_IF);
        assert_eq!(
            engine.execute(&mut link, &Operation::GetPtt).await.unwrap(),
            Reply::Ptt(false)
        );
    }

    // ---------------------------------------------------------------
    // Acknowledgment rules
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn question_mark_reply_is_command_failed() {
        let (mut engine, mut link, mock, _) = setup(ts_590sg());
        exchange(&mock, "FR;", "FR0;");
        exchange(&mock, "MD6;", "?;");
        let result = engine
            .execute(&mut link, &Operation::SetMode(Vfo::Current, Mode::RTTY, None))
            .await;
        assert!(matches!(result, Err(Error::CommandFailed(_))));
    }

    #[tokio::test]
    async fn wrong_mnemonic_is_invalid_response() {
        let (mut engine, mut link, mock, _) = setup(ts_590sg());
        exchange(&mock, "FA;", "FB00007000000;");
        let result = engine
            .execute(&mut link, &Operation::GetFrequency(Vfo::A))
            .await;
        assert!(matches!(result, Err(Error::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn altered_echo_is_invalid_response() {
        let (mut engine, mut link, mock, _) = setup(ts_590sg());
        exchange(&mock, "FA00014230000;", "FA00014230001;");
        let result = engine
            .execute(&mut link, &Operation::SetFrequency(Vfo::A, 14_230_000))
            .await;
        assert!(matches!(result, Err(Error::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn missing_terminator_times_out() {
        let (mut engine, mut link, mock, _) = setup(ts_590sg());
        exchange(&mock, "FA;", "FA000142");
        let result = engine
            .execute(&mut link, &Operation::GetFrequency(Vfo::A))
            .await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn initialize_disables_auto_information() {
        let (mut engine, mut link, mock, handle) = setup(k3());
        echo(&mock, "AI0;");
        engine.initialize(&mut link).await.unwrap();
        assert_eq!(handle.sent_text(), vec!["AI0;".to_string()]);
    }

    // ---------------------------------------------------------------
    // Frequency
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn field_width_follows_dialect() {
        let (mut engine, mut link, mock, _) = setup(ts_590sg());
        echo(&mock, "FB00007074000;");
        engine
            .execute(&mut link, &Operation::SetFrequency(Vfo::B, 7_074_000))
            .await
            .unwrap();

        let (mut engine, mut link, mock, _) = setup(ft_991a());
        exchange(&mock, "FA;", "FA014230000;");
        assert_eq!(
            engine
                .execute(&mut link, &Operation::GetFrequency(Vfo::A))
                .await
                .unwrap(),
            Reply::Frequency(14_230_000)
        );
    }

    #[tokio::test]
    async fn current_vfo_is_read_once_then_tracked() {
        let (mut engine, mut link, mock, handle) = setup(ft_991a());
        exchange(&mock, "VS;", "VS1;");
        exchange(&mock, "FB;", "FB007074000;");
        exchange(&mock, "FB;", "FB007075000;");
        engine
            .execute(&mut link, &Operation::GetFrequency(Vfo::Current))
            .await
            .unwrap();
        assert_eq!(
            engine
                .execute(&mut link, &Operation::GetFrequency(Vfo::Current))
                .await
                .unwrap(),
            Reply::Frequency(7_075_000)
        );
        assert_eq!(handle.send_count(), 3);
    }

    #[tokio::test]
    async fn oversized_frequency_never_reaches_wire() {
        let (mut engine, mut link, _, handle) = setup(ft_991a());
        let result = engine
            .execute(&mut link, &Operation::SetFrequency(Vfo::A, 1_300_000_000))
            .await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
        assert_eq!(handle.send_count(), 0);
    }

    // ---------------------------------------------------------------
    // VFO select and split
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn vfo_select_per_dialect() {
        let (mut engine, mut link, mock, handle) = setup(ts_590sg());
        echo(&mock, "FR1;");
        echo(&mock, "FT1;");
        engine
            .execute(&mut link, &Operation::SelectVfo(Vfo::B))
            .await
            .unwrap();
        assert_eq!(handle.send_count(), 2);

        let (mut engine, mut link, mock, handle) = setup(k3());
        echo(&mock, "FT1;");
        engine
            .execute(&mut link, &Operation::SelectVfo(Vfo::B))
            .await
            .unwrap();
        assert_eq!(handle.sent_text(), vec!["FT1;".to_string()]);

        let (mut engine, mut link, mock, handle) = setup(ft_991a());
        echo(&mock, "VS1;");
        engine
            .execute(&mut link, &Operation::SelectVfo(Vfo::B))
            .await
            .unwrap();
        assert_eq!(handle.sent_text(), vec!["VS1;".to_string()]);
    }

    #[tokio::test]
    async fn kenwood_split_compares_rx_and_tx_vfo() {
        let (mut engine, mut link, mock, _) = setup(ts_590sg());
        exchange(&mock, "FR;", "FR0;");
        exchange(&mock, "FT;", "FT1;");
        assert_eq!(
            engine.execute(&mut link, &Operation::GetSplit).await.unwrap(),
            Reply::Split(true)
        );
    }

    #[tokio::test]
    async fn kenwood_split_keeps_receive_vfo() {
        let (mut engine, mut link, mock, handle) = setup(ts_590sg());
        exchange(&mock, "FR;", "FR1;");
        echo(&mock, "FT0;");
        echo(&mock, "FT1;");
        engine
            .execute(&mut link, &Operation::SetSplit(true))
            .await
            .unwrap();
        engine
            .execute(&mut link, &Operation::SetSplit(false))
            .await
            .unwrap();
        assert_eq!(
            handle.sent_text(),
            vec!["FR;".to_string(), "FT0;".to_string(), "FT1;".to_string()]
        );
    }

    #[tokio::test]
    async fn yaesu_split_has_its_own_command() {
        let (mut engine, mut link, mock, handle) = setup(ft_991a());
        echo(&mock, "ST1;");
        engine
            .execute(&mut link, &Operation::SetSplit(true))
            .await
            .unwrap();
        assert_eq!(handle.sent_text(), vec!["ST1;".to_string()]);
    }

    #[tokio::test]
    async fn main_sub_is_unsupported() {
        let (mut engine, mut link, _, handle) = setup(ts_590sg());
        let result = engine
            .execute(&mut link, &Operation::SelectVfo(Vfo::Sub))
            .await;
        assert!(matches!(result, Err(Error::UnsupportedOperation(_))));
        assert_eq!(handle.send_count(), 0);
    }

    // ---------------------------------------------------------------
    // Mode
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn elecraft_code_six_is_data() {
        let (mut engine, mut link, mock, _) = setup(k3());
        exchange(&mock, "FT;", "FT0;");
        exchange(&mock, "MD;", "MD6;");
        assert_eq!(
            engine
                .execute(&mut link, &Operation::GetMode(Vfo::Current))
                .await
                .unwrap(),
            Reply::Mode(ModeReading {
                mode: Mode::DataUSB,
                passband: Mode::DataUSB.default_passband(),
            })
        );
    }

    #[tokio::test]
    async fn elecraft_rejects_rtty_before_writing() {
        let (mut engine, mut link, _, handle) = setup(k3());
        let result = engine
            .execute(&mut link, &Operation::SetMode(Vfo::A, Mode::RTTY, None))
            .await;
        assert!(matches!(result, Err(Error::ModeNotSupported(Mode::RTTY))));
        assert_eq!(handle.send_count(), 0);
    }

    #[tokio::test]
    async fn vfo_b_mode_uses_dialect_variant() {
        let (mut engine, mut link, mock, _) = setup(k3());
        echo(&mock, "MD$3;");
        engine
            .execute(&mut link, &Operation::SetMode(Vfo::B, Mode::CW, None))
            .await
            .unwrap();

        let (mut engine, mut link, mock, _) = setup(ft_991a());
        exchange(&mock, "MD1;", "MD1C;");
        let reply = engine
            .execute(&mut link, &Operation::GetMode(Vfo::B))
            .await
            .unwrap();
        assert!(matches!(reply, Reply::Mode(ModeReading { mode: Mode::DataUSB, .. })));
    }

    #[tokio::test]
    async fn kenwood_mode_of_unselected_vfo_is_unsupported() {
        let (mut engine, mut link, mock, _) = setup(ts_590sg());
        exchange(&mock, "FR;", "FR0;");
        let result = engine
            .execute(&mut link, &Operation::GetMode(Vfo::B))
            .await;
        assert!(matches!(result, Err(Error::UnsupportedOperation(_))));
    }

    #[tokio::test]
    async fn yaesu_narrow_fm_reads_as_fm() {
        let (mut engine, mut link, mock, _) = setup(ft_991a());
        exchange(&mock, "MD0;", "MD0B;");
        let reply = engine
            .execute(&mut link, &Operation::GetMode(Vfo::A))
            .await
            .unwrap();
        assert!(matches!(reply, Reply::Mode(ModeReading { mode: Mode::FM, .. })));
    }

    // ---------------------------------------------------------------
    // Levels, RIT/XIT, memory
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn power_and_meter() {
        let (mut engine, mut link, mock, _) = setup(ts_590sg());
        echo(&mock, "PC050;");
        exchange(&mock, "SM0;", "SM00015;");
        engine
            .execute(&mut link, &Operation::SetPower(50.0))
            .await
            .unwrap();
        assert_eq!(
            engine
                .execute(&mut link, &Operation::GetSignalStrength)
                .await
                .unwrap(),
            Reply::SignalStrength(0)
        );
    }

    #[tokio::test]
    async fn rit_read_from_status_line() {
        let (mut engine, mut link, mock, _) = setup(ts_590sg());
        exchange(&mock, "IF;", KENWOOD_IF);
        assert_eq!(
            engine.execute(&mut link, &Operation::GetRit).await.unwrap(),
            Reply::Offset {
                enabled: true,
                offset_hz: -120
            }
        );
    }

    #[tokio::test]
    async fn short_status_line_is_invalid() {
        let (mut engine, mut link, mock, _) = setup(ts_590sg());
        exchange(&mock, "IF;", "IF00014230000;");
        let result = engine.execute(&mut link, &Operation::GetXit).await;
        assert!(matches!(result, Err(Error::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn offset_write_styles() {
        let (mut engine, mut link, mock, handle) = setup(ts_590sg());
        echo(&mock, "RC;");
        echo(&mock, "RD00120;");
        echo(&mock, "RT1;");
        engine
            .execute(
                &mut link,
                &Operation::SetRit {
                    enabled: true,
                    offset_hz: -120,
                },
            )
            .await
            .unwrap();
        assert_eq!(handle.remaining_expectations(), 0);

        let (mut engine, mut link, mock, handle) = setup(k3());
        echo(&mock, "RO+0050;");
        echo(&mock, "XT0;");
        engine
            .execute(
                &mut link,
                &Operation::SetXit {
                    enabled: false,
                    offset_hz: 50,
                },
            )
            .await
            .unwrap();
        assert_eq!(handle.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn memory_round_trip_kenwood() {
        let (mut engine, mut link, mock, _) = setup(ts_590sg());
        echo(&mock, "MW00070001407400020;");
        exchange(&mock, "MR0007;", "MR0007000140740002000;");
        exchange(&mock, "MR0008;", "MR0008000000000000000;");
        let channel = MemoryChannel {
            number: 7,
            frequency_hz: 14_074_000,
            mode: Mode::USB,
        };
        engine
            .execute(&mut link, &Operation::WriteMemory(channel))
            .await
            .unwrap();
        assert_eq!(
            engine
                .execute(&mut link, &Operation::ReadMemory(7))
                .await
                .unwrap(),
            Reply::Memory(Some(channel))
        );
        assert_eq!(
            engine
                .execute(&mut link, &Operation::ReadMemory(8))
                .await
                .unwrap(),
            Reply::Memory(None)
        );
    }

    #[tokio::test]
    async fn yaesu_memory_clear_writes_zero_frequency() {
        let (mut engine, mut link, mock, handle) = setup(ft_991a());
        echo(&mock, "MW012000000000+000000000000;");
        engine
            .execute(&mut link, &Operation::ClearMemory(12))
            .await
            .unwrap();
        assert_eq!(handle.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn elecraft_memory_is_unsupported() {
        let (mut engine, mut link, _, _) = setup(k3());
        let result = engine.execute(&mut link, &Operation::ReadMemory(1)).await;
        assert!(matches!(result, Err(Error::UnsupportedOperation(_))));
    }

    #[tokio::test]
    async fn reset_forgets_selected_vfo() {
        let (mut engine, mut link, mock, handle) = setup(ft_991a());
        exchange(&mock, "VS;", "VS0;");
        exchange(&mock, "VS;", "VS1;");
        engine.execute(&mut link, &Operation::GetVfo).await.unwrap();
        engine.reset();
        assert_eq!(
            engine.execute(&mut link, &Operation::GetVfo).await.unwrap(),
            Reply::Vfo(Vfo::B)
        );
        assert_eq!(handle.send_count(), 2);
    }
}
