//! One client's view of the server: its response mode and how each command
//! maps onto the rig.

use std::sync::Arc;

use rigbridge_core::{Error, Rig, RigCapabilities, Vfo};
use tracing::debug;

use crate::command::{self, Command, Level};
use crate::response::{
    self, hamlib_mode, rprt_code, Outcome, ResponseMode, RPRT_EINVAL, RPRT_ENAVAIL,
};

type Answer = std::result::Result<Outcome, i32>;

/// The result of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineReply {
    pub output: String,
    /// The client asked to close the connection.
    pub close: bool,
}

/// The VFO that transmits while split is on.
fn split_tx_vfo(caps: &RigCapabilities) -> Vfo {
    if caps.has_main_sub && !caps.has_vfo_b {
        Vfo::Sub
    } else {
        Vfo::B
    }
}

fn flag(on: bool) -> String {
    if on { "1" } else { "0" }.to_string()
}

fn yes_no(on: bool) -> &'static str {
    if on {
        "Y"
    } else {
        "N"
    }
}

fn rig_failure(name: &str, err: Error) -> i32 {
    debug!(command = name, "rig error: {err}");
    rprt_code(&err)
}

pub struct Session {
    rig: Arc<dyn Rig>,
    mode: ResponseMode,
}

impl Session {
    pub fn new(rig: Arc<dyn Rig>) -> Self {
        Session {
            rig,
            mode: ResponseMode::Default,
        }
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    /// Handle one line, without its terminator.
    pub async fn handle_line(&mut self, line: &str) -> LineReply {
        let line = line.trim();
        let (line, once) = match line.strip_prefix('+') {
            Some(rest) => (rest, true),
            None => (line, false),
        };
        let mode = if once {
            ResponseMode::Extended
        } else {
            self.mode
        };

        let request = match command::parse(line) {
            Ok(Some(request)) => request,
            Ok(None) => {
                return LineReply {
                    output: String::new(),
                    close: false,
                }
            }
            Err(e) => {
                debug!(line, "rejected: {e}");
                return LineReply {
                    output: response::render_error(mode, e.code()),
                    close: false,
                };
            }
        };

        let name = request.command.long_name();
        let close = request.command == Command::Quit;
        let answer = self.run(&request.command).await;

        // The toggle takes effect after its own acknowledgement.
        if let (Command::SetExtResponse(on), Ok(_)) = (&request.command, &answer) {
            self.mode = if *on {
                ResponseMode::Extended
            } else {
                ResponseMode::Default
            };
        }

        let output = match answer {
            // Closing is the whole answer.
            Ok(_) if close => String::new(),
            Ok(outcome) => response::render(mode, name, &request.args, &outcome),
            Err(code) => response::render_error(mode, code),
        };
        LineReply { output, close }
    }

    async fn run(&self, command: &Command) -> Answer {
        let rig = self.rig.as_ref();
        let name = command.long_name();
        let fail = |e: Error| rig_failure(name, e);
        let caps = rig.capabilities();

        match command {
            Command::GetFreq => {
                let hz = rig.get_frequency(Vfo::Current).await.map_err(fail)?;
                Ok(Outcome::Values(vec![hz.to_string()]))
            }
            Command::SetFreq(hz) => {
                rig.set_frequency(Vfo::Current, *hz).await.map_err(fail)?;
                Ok(Outcome::Done)
            }
            Command::GetMode => self.read_mode(Vfo::Current, name).await,
            Command::SetMode(mode, passband) => {
                rig.set_mode(Vfo::Current, *mode, *passband)
                    .await
                    .map_err(fail)?;
                Ok(Outcome::Done)
            }
            Command::GetVfo => {
                let vfo = rig.get_vfo().await.map_err(fail)?;
                Ok(Outcome::Values(vec![vfo.to_string()]))
            }
            Command::SetVfo(vfo) => {
                rig.select_vfo(*vfo).await.map_err(fail)?;
                Ok(Outcome::Done)
            }
            Command::GetPtt => {
                let on = rig.get_ptt().await.map_err(fail)?;
                Ok(Outcome::Values(vec![flag(on)]))
            }
            Command::SetPtt(on) => {
                rig.set_ptt(*on).await.map_err(fail)?;
                Ok(Outcome::Done)
            }
            Command::GetLevel(level) => match level {
                Level::RfPower => {
                    let watts = rig.get_power().await.map_err(fail)?;
                    let fraction = if caps.max_power_watts > 0.0 {
                        watts / caps.max_power_watts
                    } else {
                        0.0
                    };
                    Ok(Outcome::Values(vec![format!("{fraction:.6}")]))
                }
                Level::Strength => {
                    let db = rig.get_signal_strength().await.map_err(fail)?;
                    Ok(Outcome::Values(vec![db.to_string()]))
                }
                Level::Unavailable(_) => Err(RPRT_ENAVAIL),
            },
            Command::SetLevel(level, value) => match level {
                Level::RfPower => {
                    if !(0.0..=1.0).contains(value) {
                        return Err(RPRT_EINVAL);
                    }
                    let watts = (*value as f32) * caps.max_power_watts;
                    rig.set_power(watts).await.map_err(fail)?;
                    Ok(Outcome::Done)
                }
                // Read-only meter.
                Level::Strength => Err(RPRT_EINVAL),
                Level::Unavailable(_) => Err(RPRT_ENAVAIL),
            },
            Command::GetSplitVfo => {
                let on = rig.get_split().await.map_err(fail)?;
                Ok(Outcome::Values(vec![
                    flag(on),
                    split_tx_vfo(caps).to_string(),
                ]))
            }
            Command::SetSplitVfo(on, tx) => {
                if *on && *tx != split_tx_vfo(caps) {
                    return Err(RPRT_EINVAL);
                }
                rig.set_split(*on).await.map_err(fail)?;
                Ok(Outcome::Done)
            }
            Command::GetSplitFreq => {
                let hz = rig
                    .get_frequency(split_tx_vfo(caps))
                    .await
                    .map_err(fail)?;
                Ok(Outcome::Values(vec![hz.to_string()]))
            }
            Command::SetSplitFreq(hz) => {
                rig.set_frequency(split_tx_vfo(caps), *hz)
                    .await
                    .map_err(fail)?;
                Ok(Outcome::Done)
            }
            Command::GetSplitMode => self.read_mode(split_tx_vfo(caps), name).await,
            Command::SetSplitMode(mode, passband) => {
                rig.set_mode(split_tx_vfo(caps), *mode, *passband)
                    .await
                    .map_err(fail)?;
                Ok(Outcome::Done)
            }
            Command::GetRit => {
                let (enabled, offset) = rig.get_rit().await.map_err(fail)?;
                let offset = if enabled { offset } else { 0 };
                Ok(Outcome::Values(vec![offset.to_string()]))
            }
            Command::SetRit(offset) => {
                rig.set_rit(*offset != 0, *offset).await.map_err(fail)?;
                Ok(Outcome::Done)
            }
            Command::GetXit => {
                let (enabled, offset) = rig.get_xit().await.map_err(fail)?;
                let offset = if enabled { offset } else { 0 };
                Ok(Outcome::Values(vec![offset.to_string()]))
            }
            Command::SetXit(offset) => {
                rig.set_xit(*offset != 0, *offset).await.map_err(fail)?;
                Ok(Outcome::Done)
            }
            Command::GetInfo => Ok(Outcome::Values(vec![rig.info().model_name.clone()])),
            Command::DumpCaps => Ok(Outcome::Block(self.dump_caps())),
            // This server never expects a VFO argument on commands.
            Command::ChkVfo => Ok(Outcome::Values(vec!["0".to_string()])),
            Command::SetExtResponse(_) | Command::Quit => Ok(Outcome::Done),
        }
    }

    async fn read_mode(&self, vfo: Vfo, name: &str) -> Answer {
        let reading = self
            .rig
            .get_mode(vfo)
            .await
            .map_err(|e| rig_failure(name, e))?;
        Ok(Outcome::Values(vec![
            hamlib_mode(reading.mode).to_string(),
            reading.passband.hz().to_string(),
        ]))
    }

    fn dump_caps(&self) -> Vec<String> {
        let info = self.rig.info();
        let caps = self.rig.capabilities();
        let mut lines = vec![
            format!("Model name: {}", info.model_name),
            format!("Mfg name: {}", info.manufacturer),
            "Frequency ranges:".to_string(),
        ];
        lines.extend(caps.frequency_ranges.iter().map(|r| format!("  {r}")));

        let modes: Vec<&str> = caps.supported_modes.iter().map(|m| hamlib_mode(*m)).collect();
        lines.push(format!("Mode list: {}", modes.join(" ")));
        lines.push(format!("Max power: {} W", caps.max_power_watts));
        lines.push(format!(
            "VFO list: {}",
            if caps.has_main_sub {
                "Main Sub"
            } else if caps.has_vfo_b {
                "VFOA VFOB"
            } else {
                "VFOA"
            }
        ));
        lines.push(format!("Can split: {}", yes_no(caps.has_split)));
        lines.push(format!("Can RIT: {}", yes_no(caps.has_rit)));
        lines.push(format!("Can XIT: {}", yes_no(caps.has_xit)));
        lines.push(format!("Max RIT/XIT: {} Hz", caps.max_offset_hz));
        match caps.memory_channels {
            Some((low, high)) => lines.push(format!("Memory channels: {low}-{high}")),
            None => lines.push("Memory channels: none".to_string()),
        }
        lines.push("Get level: RFPOWER STRENGTH".to_string());
        lines.push("Set level: RFPOWER".to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rigbridge_core::{
        BandRange, Manufacturer, Mode, ModeReading, Operation, Passband, Reply, RigInfo,
    };

    use super::*;

    /// A rig that records operations and answers from fixed state.
    struct FakeRig {
        info: RigInfo,
        caps: RigCapabilities,
        ops: Mutex<Vec<Operation>>,
        fail_with: Mutex<Option<Error>>,
    }

    impl FakeRig {
        fn new() -> Self {
            FakeRig {
                info: RigInfo {
                    manufacturer: Manufacturer::Icom,
                    model_name: "IC-7300".into(),
                    model_id: "ic7300".into(),
                },
                caps: RigCapabilities {
                    frequency_ranges: vec![BandRange::new(30_000, 74_800_000)],
                    max_power_watts: 100.0,
                    has_vfo_b: true,
                    has_split: true,
                    has_rit: true,
                    has_xit: true,
                    ..RigCapabilities::default()
                },
                ops: Mutex::new(Vec::new()),
                fail_with: Mutex::new(None),
            }
        }

        fn ops(&self) -> Vec<Operation> {
            self.ops.lock().unwrap().clone()
        }

        fn fail_next(&self, err: Error) {
            *self.fail_with.lock().unwrap() = Some(err);
        }
    }

    #[async_trait]
    impl Rig for FakeRig {
        fn info(&self) -> &RigInfo {
            &self.info
        }

        fn capabilities(&self) -> &RigCapabilities {
            &self.caps
        }

        async fn execute(&self, op: Operation) -> rigbridge_core::Result<Reply> {
            self.ops.lock().unwrap().push(op.clone());
            if let Some(err) = self.fail_with.lock().unwrap().take() {
                return Err(err);
            }
            let reply = match op {
                Operation::GetFrequency(Vfo::B) => Reply::Frequency(14_250_000),
                Operation::GetFrequency(_) => Reply::Frequency(14_074_000),
                Operation::GetMode(_) => Reply::Mode(ModeReading {
                    mode: Mode::DataUSB,
                    passband: Passband::from_hz(3000),
                }),
                Operation::GetPtt => Reply::Ptt(false),
                Operation::GetVfo => Reply::Vfo(Vfo::A),
                Operation::GetPower => Reply::Power(50.0),
                Operation::GetSplit => Reply::Split(true),
                Operation::GetSignalStrength => Reply::SignalStrength(-12),
                Operation::GetRit => Reply::Offset {
                    enabled: true,
                    offset_hz: -150,
                },
                Operation::GetXit => Reply::Offset {
                    enabled: false,
                    offset_hz: 300,
                },
                _ => Reply::Done,
            };
            Ok(reply)
        }
    }

    fn session() -> (Session, Arc<FakeRig>) {
        let rig = Arc::new(FakeRig::new());
        (Session::new(rig.clone()), rig)
    }

    async fn out(session: &mut Session, line: &str) -> String {
        session.handle_line(line).await.output
    }

    #[tokio::test]
    async fn default_reads_print_bare_values() {
        let (mut s, _) = session();
        assert_eq!(out(&mut s, "f").await, "14074000\n");
        assert_eq!(out(&mut s, "m").await, "PKTUSB\n3000\n");
        assert_eq!(out(&mut s, "t").await, "0\n");
        assert_eq!(out(&mut s, "v").await, "VFOA\n");
        assert_eq!(out(&mut s, "_").await, "IC-7300\n");
    }

    #[tokio::test]
    async fn default_sets_print_nothing() {
        let (mut s, rig) = session();
        assert_eq!(out(&mut s, "F 7074000").await, "");
        assert_eq!(out(&mut s, "T 1").await, "");
        assert_eq!(
            rig.ops(),
            vec![
                Operation::SetFrequency(Vfo::Current, 7_074_000),
                Operation::SetPtt(true)
            ]
        );
    }

    #[tokio::test]
    async fn extended_toggle_is_acknowledged_in_previous_mode() {
        let (mut s, _) = session();
        assert_eq!(out(&mut s, "\\set_ext_response 1").await, "");
        assert_eq!(s.mode(), ResponseMode::Extended);
        assert_eq!(out(&mut s, "f").await, "get_freq: 14074000\nRPRT 0\n");
        assert_eq!(
            out(&mut s, "\\set_ext_response 0").await,
            "set_ext_response: 0\nRPRT 0\n"
        );
        assert_eq!(s.mode(), ResponseMode::Default);
        assert_eq!(out(&mut s, "f").await, "14074000\n");
    }

    #[tokio::test]
    async fn plus_prefix_is_one_shot_extended() {
        let (mut s, _) = session();
        assert_eq!(out(&mut s, "+f").await, "get_freq: 14074000\nRPRT 0\n");
        assert_eq!(out(&mut s, "+\\get_ptt").await, "get_ptt: 0\nRPRT 0\n");
        assert_eq!(out(&mut s, "f").await, "14074000\n");
        assert_eq!(s.mode(), ResponseMode::Default);
    }

    #[tokio::test]
    async fn errors_are_silent_in_default_and_coded_in_extended() {
        let (mut s, rig) = session();
        rig.fail_next(Error::Timeout);
        assert_eq!(out(&mut s, "f").await, "");

        rig.fail_next(Error::Timeout);
        assert_eq!(out(&mut s, "+f").await, "RPRT -5\n");
        rig.fail_next(Error::CommandFailed("NAK".into()));
        assert_eq!(out(&mut s, "+F 14074000").await, "RPRT -9\n");
        assert_eq!(out(&mut s, "+w").await, "RPRT -4\n");
        assert_eq!(out(&mut s, "+F abc").await, "RPRT -1\n");
    }

    #[tokio::test]
    async fn parse_errors_keep_the_session_open() {
        let (mut s, _) = session();
        let reply = s.handle_line("\\no_such_command").await;
        assert!(!reply.close);
        assert_eq!(out(&mut s, "f").await, "14074000\n");
    }

    #[tokio::test]
    async fn levels() {
        let (mut s, rig) = session();
        assert_eq!(out(&mut s, "l RFPOWER").await, "0.500000\n");
        assert_eq!(out(&mut s, "l STRENGTH").await, "-12\n");
        assert_eq!(out(&mut s, "+l AGC").await, "RPRT -11\n");
        assert_eq!(out(&mut s, "+L NB 1").await, "RPRT -11\n");
        assert_eq!(out(&mut s, "+L STRENGTH 1").await, "RPRT -1\n");
        assert_eq!(out(&mut s, "+L RFPOWER 1.5").await, "RPRT -1\n");
        assert_eq!(out(&mut s, "L RFPOWER 0.25").await, "");
        assert_eq!(rig.ops().last(), Some(&Operation::SetPower(25.0)));
    }

    #[tokio::test]
    async fn split_uses_vfo_b() {
        let (mut s, rig) = session();
        assert_eq!(out(&mut s, "s").await, "1\nVFOB\n");
        assert_eq!(out(&mut s, "i").await, "14250000\n");
        assert_eq!(out(&mut s, "S 1 VFOB").await, "");
        assert_eq!(out(&mut s, "+S 1 VFOA").await, "RPRT -1\n");
        assert_eq!(out(&mut s, "I 14255000").await, "");
        assert_eq!(out(&mut s, "X USB 2400").await, "");
        let ops = rig.ops();
        assert!(ops.contains(&Operation::SetSplit(true)));
        assert!(ops.contains(&Operation::SetFrequency(Vfo::B, 14_255_000)));
        assert!(ops.contains(&Operation::SetMode(
            Vfo::B,
            Mode::USB,
            Some(Passband::from_hz(2400))
        )));
    }

    #[tokio::test]
    async fn rit_and_xit_report_zero_when_off() {
        let (mut s, rig) = session();
        assert_eq!(out(&mut s, "j").await, "-150\n");
        assert_eq!(out(&mut s, "z").await, "0\n");
        assert_eq!(out(&mut s, "J 0").await, "");
        assert_eq!(out(&mut s, "Z 200").await, "");
        let ops = rig.ops();
        assert!(ops.contains(&Operation::SetRit {
            enabled: false,
            offset_hz: 0
        }));
        assert!(ops.contains(&Operation::SetXit {
            enabled: true,
            offset_hz: 200
        }));
    }

    #[tokio::test]
    async fn dump_caps_and_chk_vfo() {
        let (mut s, _) = session();
        let caps = out(&mut s, "\\dump_caps").await;
        assert!(caps.starts_with("Model name: IC-7300\nMfg name: Icom\n"));
        assert!(caps.contains("  30000-74800000 Hz\n"));
        assert!(caps.contains("Can split: Y\n"));
        assert_eq!(out(&mut s, "\\chk_vfo").await, "0\n");
    }

    #[tokio::test]
    async fn quit_closes() {
        let (mut s, _) = session();
        assert!(s.handle_line("q").await.close);
        assert_eq!(out(&mut s, "+q").await, "");
        assert!(s.handle_line("\\quit").await.close);
        assert!(!s.handle_line("f").await.close);
    }

    #[tokio::test]
    async fn blank_lines_are_ignored() {
        let (mut s, rig) = session();
        assert_eq!(out(&mut s, "").await, "");
        assert!(rig.ops().is_empty());
    }
}
