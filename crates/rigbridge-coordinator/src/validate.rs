//! Capability checks run before an operation is queued.
//!
//! Anything rejected here never reaches the wire.

use rigbridge_core::error::{Error, Result};
use rigbridge_core::{MemoryChannel, Mode, Operation, RigCapabilities, Vfo};

fn check_vfo(caps: &RigCapabilities, vfo: Vfo) -> Result<()> {
    match vfo {
        Vfo::Current | Vfo::A => Ok(()),
        Vfo::B if caps.has_vfo_b => Ok(()),
        Vfo::Main | Vfo::Sub if caps.has_main_sub => Ok(()),
        _ => Err(Error::UnsupportedOperation(format!("rig has no {vfo}"))),
    }
}

fn check_frequency(caps: &RigCapabilities, freq_hz: u64) -> Result<()> {
    if caps.covers(freq_hz) {
        Ok(())
    } else {
        Err(Error::FrequencyOutOfRange(freq_hz))
    }
}

fn check_mode(caps: &RigCapabilities, mode: Mode) -> Result<()> {
    if caps.supported_modes.contains(&mode) {
        Ok(())
    } else {
        Err(Error::ModeNotSupported(mode))
    }
}

fn check_feature(present: bool, what: &str) -> Result<()> {
    if present {
        Ok(())
    } else {
        Err(Error::UnsupportedOperation(format!("rig has no {what}")))
    }
}

fn check_offset(caps: &RigCapabilities, offset_hz: i32) -> Result<()> {
    if offset_hz.unsigned_abs() > caps.max_offset_hz.unsigned_abs() {
        return Err(Error::InvalidParameter(format!(
            "offset {offset_hz} Hz outside ±{} Hz",
            caps.max_offset_hz
        )));
    }
    Ok(())
}

fn check_channel(caps: &RigCapabilities, number: u16) -> Result<()> {
    let Some((low, high)) = caps.memory_channels else {
        return Err(Error::UnsupportedOperation(
            "rig has no memory access".into(),
        ));
    };
    if !(low..=high).contains(&number) {
        return Err(Error::InvalidParameter(format!(
            "memory channel {number} outside {low}..={high}"
        )));
    }
    Ok(())
}

fn check_memory(caps: &RigCapabilities, channel: &MemoryChannel) -> Result<()> {
    check_channel(caps, channel.number)?;
    check_frequency(caps, channel.frequency_hz)?;
    check_mode(caps, channel.mode)
}

/// Check `op` against what the rig can do.
pub fn validate(op: &Operation, caps: &RigCapabilities) -> Result<()> {
    match op {
        Operation::GetFrequency(vfo) | Operation::GetMode(vfo) => check_vfo(caps, *vfo),
        Operation::SetFrequency(vfo, freq_hz) => {
            check_vfo(caps, *vfo)?;
            check_frequency(caps, *freq_hz)
        }
        Operation::SetMode(vfo, mode, _) => {
            check_vfo(caps, *vfo)?;
            check_mode(caps, *mode)
        }
        Operation::SelectVfo(Vfo::Current) => Err(Error::InvalidParameter(
            "cannot select the current VFO".into(),
        )),
        Operation::SelectVfo(vfo) => check_vfo(caps, *vfo),
        Operation::SetPower(watts) => {
            if (0.0..=caps.max_power_watts).contains(watts) {
                Ok(())
            } else {
                Err(Error::InvalidParameter(format!(
                    "power {watts} W outside 0..={} W",
                    caps.max_power_watts
                )))
            }
        }
        Operation::GetSplit | Operation::SetSplit(_) => check_feature(caps.has_split, "split"),
        Operation::GetRit => check_feature(caps.has_rit, "RIT"),
        Operation::SetRit { offset_hz, .. } => {
            check_feature(caps.has_rit, "RIT")?;
            check_offset(caps, *offset_hz)
        }
        Operation::GetXit => check_feature(caps.has_xit, "XIT"),
        Operation::SetXit { offset_hz, .. } => {
            check_feature(caps.has_xit, "XIT")?;
            check_offset(caps, *offset_hz)
        }
        Operation::ReadMemory(number) | Operation::ClearMemory(number) => {
            check_channel(caps, *number)
        }
        Operation::WriteMemory(channel) => check_memory(caps, channel),
        Operation::GetPtt
        | Operation::SetPtt(_)
        | Operation::GetVfo
        | Operation::GetPower
        | Operation::GetSignalStrength
        | Operation::MemoryCount => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigbridge_core::BandRange;

    fn caps() -> RigCapabilities {
        RigCapabilities {
            frequency_ranges: vec![BandRange::new(1_800_000, 54_000_000)],
            memory_channels: Some((1, 99)),
            ..RigCapabilities::default()
        }
    }

    #[test]
    fn frequency_outside_ranges() {
        let result = validate(&Operation::SetFrequency(Vfo::A, 500_000), &caps());
        assert!(matches!(result, Err(Error::FrequencyOutOfRange(500_000))));
        assert!(validate(&Operation::SetFrequency(Vfo::A, 14_230_000), &caps()).is_ok());
    }

    #[test]
    fn unsupported_mode() {
        let result = validate(
            &Operation::SetMode(Vfo::Current, Mode::DataUSB, None),
            &caps(),
        );
        assert!(matches!(result, Err(Error::ModeNotSupported(Mode::DataUSB))));
    }

    #[test]
    fn vfo_kinds_follow_capabilities() {
        let caps = caps();
        assert!(validate(&Operation::GetFrequency(Vfo::B), &caps).is_ok());
        assert!(matches!(
            validate(&Operation::SelectVfo(Vfo::Sub), &caps),
            Err(Error::UnsupportedOperation(_))
        ));
        assert!(matches!(
            validate(&Operation::SelectVfo(Vfo::Current), &caps),
            Err(Error::InvalidParameter(_))
        ));

        let dual = RigCapabilities {
            has_vfo_b: false,
            has_main_sub: true,
            ..RigCapabilities::default()
        };
        assert!(validate(&Operation::SelectVfo(Vfo::Sub), &dual).is_ok());
        assert!(validate(&Operation::GetMode(Vfo::B), &dual).is_err());
    }

    #[test]
    fn power_bounds() {
        assert!(validate(&Operation::SetPower(100.0), &caps()).is_ok());
        assert!(validate(&Operation::SetPower(0.0), &caps()).is_ok());
        assert!(validate(&Operation::SetPower(100.5), &caps()).is_err());
        assert!(validate(&Operation::SetPower(-1.0), &caps()).is_err());
        assert!(validate(&Operation::SetPower(f32::NAN), &caps()).is_err());
    }

    #[test]
    fn offset_bounds() {
        let set = |offset_hz| Operation::SetRit {
            enabled: true,
            offset_hz,
        };
        assert!(validate(&set(9_999), &caps()).is_ok());
        assert!(validate(&set(-9_999), &caps()).is_ok());
        assert!(matches!(
            validate(&set(10_000), &caps()),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn missing_features() {
        let caps = RigCapabilities {
            has_split: false,
            has_xit: false,
            ..caps()
        };
        assert!(matches!(
            validate(&Operation::GetSplit, &caps),
            Err(Error::UnsupportedOperation(_))
        ));
        assert!(matches!(
            validate(
                &Operation::SetXit {
                    enabled: false,
                    offset_hz: 0
                },
                &caps
            ),
            Err(Error::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn memory_range_and_contents() {
        assert!(validate(&Operation::ReadMemory(99), &caps()).is_ok());
        assert!(matches!(
            validate(&Operation::ReadMemory(0), &caps()),
            Err(Error::InvalidParameter(_))
        ));
        let channel = MemoryChannel {
            number: 5,
            frequency_hz: 200_000_000,
            mode: Mode::USB,
        };
        assert!(matches!(
            validate(&Operation::WriteMemory(channel), &caps()),
            Err(Error::FrequencyOutOfRange(_))
        ));
        let no_memories = RigCapabilities::default();
        assert!(matches!(
            validate(&Operation::ClearMemory(1), &no_memories),
            Err(Error::UnsupportedOperation(_))
        ));
    }
}
