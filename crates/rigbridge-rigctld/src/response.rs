//! Rendering command outcomes in Default and Extended form.

use std::fmt::Write;

use rigbridge_core::{Error, Mode};

pub const RPRT_OK: i32 = 0;
pub const RPRT_EINVAL: i32 = -1;
pub const RPRT_ENIMPL: i32 = -4;
pub const RPRT_ETIMEOUT: i32 = -5;
pub const RPRT_EIO: i32 = -6;
pub const RPRT_EPROTO: i32 = -8;
pub const RPRT_ERJCTED: i32 = -9;
pub const RPRT_ENAVAIL: i32 = -11;
pub const RPRT_EDOM: i32 = -17;

/// How a session answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Bare values, one per line; sets and errors print nothing.
    #[default]
    Default,
    /// `name: values` followed by `RPRT <code>`.
    Extended,
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// One value per line in Default form, space-joined in Extended form.
    Values(Vec<String>),
    /// Multi-line text printed as-is in both forms.
    Block(Vec<String>),
    /// A set with nothing to report.
    Done,
}

/// Hamlib status code for a rig error.
pub fn rprt_code(err: &Error) -> i32 {
    match err {
        Error::InvalidParameter(_) | Error::ModeNotSupported(_) => RPRT_EINVAL,
        Error::Timeout => RPRT_ETIMEOUT,
        Error::NotConnected | Error::Transport(_) | Error::Io(_) => RPRT_EIO,
        Error::InvalidResponse(_) => RPRT_EPROTO,
        Error::CommandFailed(_) => RPRT_ERJCTED,
        Error::UnsupportedOperation(_) => RPRT_ENAVAIL,
        Error::FrequencyOutOfRange(_) => RPRT_EDOM,
    }
}

/// Hamlib's name for a mode.
pub fn hamlib_mode(mode: Mode) -> &'static str {
    match mode {
        Mode::USB => "USB",
        Mode::LSB => "LSB",
        Mode::CW => "CW",
        Mode::CWR => "CWR",
        Mode::AM => "AM",
        Mode::FM => "FM",
        Mode::RTTY => "RTTY",
        Mode::RTTYR => "RTTYR",
        Mode::DataUSB => "PKTUSB",
        Mode::DataLSB => "PKTLSB",
        Mode::DataFM => "PKTFM",
        Mode::DataAM => "PKTAM",
    }
}

/// Render a successful outcome. `name` and `args` are only used in
/// Extended form.
pub fn render(mode: ResponseMode, name: &str, args: &[String], outcome: &Outcome) -> String {
    let mut out = String::new();
    match mode {
        ResponseMode::Default => match outcome {
            Outcome::Values(values) | Outcome::Block(values) => {
                for v in values {
                    out.push_str(v);
                    out.push('\n');
                }
            }
            Outcome::Done => {}
        },
        ResponseMode::Extended => {
            match outcome {
                Outcome::Values(values) => {
                    let _ = writeln!(out, "{name}: {}", values.join(" "));
                }
                Outcome::Done if args.is_empty() => {
                    let _ = writeln!(out, "{name}:");
                }
                Outcome::Done => {
                    let _ = writeln!(out, "{name}: {}", args.join(" "));
                }
                Outcome::Block(lines) => {
                    let _ = writeln!(out, "{name}:");
                    for line in lines {
                        out.push_str(line);
                        out.push('\n');
                    }
                }
            }
            let _ = writeln!(out, "RPRT {RPRT_OK}");
        }
    }
    out
}

/// Render a failure. Default form stays silent.
pub fn render_error(mode: ResponseMode, code: i32) -> String {
    match mode {
        ResponseMode::Default => String::new(),
        ResponseMode::Extended => format!("RPRT {code}\n"),
    }
}
