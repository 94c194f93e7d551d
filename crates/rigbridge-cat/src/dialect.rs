//! Per-vendor parameter tables for the text CAT engine.
//!
//! The three dialects share one grammar and one acknowledgment rule and
//! differ along three behavioural axes:
//!
//! | Axis        | Kenwood          | Elecraft      | Yaesu          |
//! |-------------|------------------|---------------|----------------|
//! | PTT on/off  | `TX1;` / `RX;`   | `TX;` / `RX;` | `TX1;` / `TX0;`|
//! | VFO select  | `FRn;` + `FTn;`  | `FTn;`        | `VSn;`         |
//! | Mode codes  | 6/9 = FSK        | 6/9 = DATA    | 6/9 = RTTY     |
//!
//! The remaining columns are fixed wire-format facts (field widths, which
//! mnemonic carries a value) rather than behaviour.

use rigbridge_core::Mode;

/// How a VFO is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VfoSelect {
    /// Receive and transmit VFOs are set by separate commands, both sent.
    Paired {
        rx: &'static str,
        tx: &'static str,
    },
    /// One command selects the VFO.
    Single(&'static str),
}

/// How split operation is switched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitControl {
    /// Split means transmitting on VFO B (`FT1;`).
    TxVfo,
    /// A dedicated on/off command.
    Command(&'static str),
}

/// How a RIT/XIT offset is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetWrite {
    /// Signed absolute value, e.g. `RO-0120;`.
    Absolute { mnemonic: &'static str, digits: usize },
    /// Clear with `RC;` then step with `RUnnnn;` / `RDnnnn;`.
    Steps { digits: usize },
}

/// Field positions in the `IF;` status payload (after the mnemonic).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoLayout {
    /// Signed offset field `+nnnn`.
    pub offset: (usize, usize),
    pub rit: usize,
    pub xit: usize,
    /// TX/RX flag, if the status line carries one.
    pub ptt: Option<usize>,
}

impl InfoLayout {
    pub fn min_len(&self) -> usize {
        let mut end = self.offset.1.max(self.rit + 1).max(self.xit + 1);
        if let Some(ptt) = self.ptt {
            end = end.max(ptt + 1);
        }
        end
    }
}

/// Memory channel read/write format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryFormat {
    pub read: &'static str,
    pub write: &'static str,
    pub channel_digits: usize,
    /// Fixed fields between frequency and mode when writing.
    pub filler: &'static str,
    /// Fixed fields after the mode when writing.
    pub trailer: &'static str,
}

/// Everything the CAT engine needs to speak one vendor's dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub name: &'static str,

    pub ptt_on: &'static str,
    pub ptt_off: &'static str,
    pub vfo_select: VfoSelect,
    pub modes: &'static [(char, Mode)],

    pub frequency_digits: usize,
    /// Mode of VFO A, or of the selected VFO when `mode_command_b` is
    /// `None`.
    pub mode_command: &'static str,
    /// Mode of VFO B regardless of which VFO is selected.
    pub mode_command_b: Option<&'static str>,
    /// Query for PTT state; `None` reads it from the `IF;` line.
    pub ptt_query: Option<&'static str>,
    pub split: SplitControl,
    pub s_meter: &'static str,
    pub info: InfoLayout,
    pub offset_write: OffsetWrite,
    pub memory: Option<MemoryFormat>,
}

impl Dialect {
    /// The code for `mode`, if the dialect has one.
    pub fn mode_code(&self, mode: Mode) -> Option<char> {
        self.modes
            .iter()
            .find(|(_, m)| *m == mode)
            .map(|(code, _)| *code)
    }

    /// The mode for a code read from the rig.
    pub fn mode_for_code(&self, code: char) -> Option<Mode> {
        self.modes
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, mode)| *mode)
    }
}

const KENWOOD_INFO: InfoLayout = InfoLayout {
    offset: (16, 21),
    rit: 21,
    xit: 22,
    ptt: Some(26),
};

pub const KENWOOD: Dialect = Dialect {
    name: "Kenwood",
    ptt_on: "TX1",
    ptt_off: "RX",
    vfo_select: VfoSelect::Paired { rx: "FR", tx: "FT" },
    modes: &[
        ('1', Mode::LSB),
        ('2', Mode::USB),
        ('3', Mode::CW),
        ('4', Mode::FM),
        ('5', Mode::AM),
        ('6', Mode::RTTY),
        ('7', Mode::CWR),
        ('9', Mode::RTTYR),
    ],
    frequency_digits: 11,
    mode_command: "MD",
    mode_command_b: None,
    ptt_query: None,
    split: SplitControl::TxVfo,
    s_meter: "SM0",
    info: KENWOOD_INFO,
    offset_write: OffsetWrite::Steps { digits: 5 },
    memory: Some(MemoryFormat {
        read: "MR0",
        write: "MW0",
        channel_digits: 3,
        filler: "",
        trailer: "0",
    }),
};

pub const ELECRAFT: Dialect = Dialect {
    name: "Elecraft",
    ptt_on: "TX",
    ptt_off: "RX",
    vfo_select: VfoSelect::Single("FT"),
    modes: &[
        ('1', Mode::LSB),
        ('2', Mode::USB),
        ('3', Mode::CW),
        ('4', Mode::FM),
        ('5', Mode::AM),
        ('6', Mode::DataUSB),
        ('7', Mode::CWR),
        ('9', Mode::DataLSB),
    ],
    frequency_digits: 11,
    mode_command: "MD",
    mode_command_b: Some("MD$"),
    ptt_query: None,
    split: SplitControl::TxVfo,
    s_meter: "SM",
    info: KENWOOD_INFO,
    offset_write: OffsetWrite::Absolute {
        mnemonic: "RO",
        digits: 4,
    },
    memory: None,
};

pub const YAESU: Dialect = Dialect {
    name: "Yaesu",
    ptt_on: "TX1",
    ptt_off: "TX0",
    vfo_select: VfoSelect::Single("VS"),
    modes: &[
        ('1', Mode::LSB),
        ('2', Mode::USB),
        ('3', Mode::CW),
        ('4', Mode::FM),
        ('5', Mode::AM),
        ('6', Mode::RTTY),
        ('7', Mode::CWR),
        ('8', Mode::DataLSB),
        ('9', Mode::RTTYR),
        ('A', Mode::DataFM),
        ('C', Mode::DataUSB),
        // Narrow variants read back as their base mode.
        ('B', Mode::FM),
        ('D', Mode::AM),
    ],
    frequency_digits: 9,
    mode_command: "MD0",
    mode_command_b: Some("MD1"),
    ptt_query: Some("TX"),
    split: SplitControl::Command("ST"),
    s_meter: "SM0",
    info: InfoLayout {
        offset: (12, 17),
        rit: 17,
        xit: 18,
        ptt: None,
    },
    offset_write: OffsetWrite::Steps { digits: 4 },
    memory: Some(MemoryFormat {
        read: "MR",
        write: "MW",
        channel_digits: 3,
        filler: "+000000",
        trailer: "00000",
    }),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ptt_mnemonics_per_dialect() {
        assert_eq!((KENWOOD.ptt_on, KENWOOD.ptt_off), ("TX1", "RX"));
        assert_eq!((ELECRAFT.ptt_on, ELECRAFT.ptt_off), ("TX", "RX"));
        assert_eq!((YAESU.ptt_on, YAESU.ptt_off), ("TX1", "TX0"));
    }

    #[test]
    fn elecraft_has_no_rtty_code() {
        assert_eq!(ELECRAFT.mode_code(Mode::RTTY), None);
        assert_eq!(KENWOOD.mode_code(Mode::RTTY), Some('6'));
        assert_eq!(YAESU.mode_code(Mode::RTTY), Some('6'));
        assert_eq!(ELECRAFT.mode_for_code('6'), Some(Mode::DataUSB));
    }

    #[test]
    fn yaesu_narrow_codes_decode_but_do_not_encode() {
        assert_eq!(YAESU.mode_for_code('B'), Some(Mode::FM));
        assert_eq!(YAESU.mode_code(Mode::FM), Some('4'));
    }

    #[test]
    fn mode_codes_are_unique_per_dialect() {
        for dialect in [KENWOOD, ELECRAFT, YAESU] {
            for (i, (code, _)) in dialect.modes.iter().enumerate() {
                assert!(
                    dialect.modes[i + 1..].iter().all(|(c, _)| c != code),
                    "{} repeats code {code}",
                    dialect.name
                );
            }
        }
    }

    #[test]
    fn info_layout_lengths() {
        assert_eq!(KENWOOD.info.min_len(), 27);
        assert_eq!(YAESU.info.min_len(), 19);
    }
}
