//! SPI configuration presets
//!
//! Ordinal bit 0 selects the role (0 master, 1 slave), bit 1 is CPOL and
//! bit 2 is CPHA.

use bitwire_hal::{Mode, Phase, Polarity, Role};

use super::SpiError;

/// Clock frequency used until [`super::SpiDevice::set_frequency`] is called
pub const DEFAULT_FREQUENCY_HZ: u32 = 1_000_000;

/// Resolved configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiPreset {
    pub role: Role,
    pub mode: Mode,
}

impl SpiPreset {
    pub fn polarity(&self) -> Polarity {
        self.mode.polarity()
    }

    pub fn phase(&self) -> Phase {
        self.mode.phase()
    }
}

/// Number of defined presets
pub const PRESET_COUNT: usize = 8;

static PRESETS: [SpiPreset; PRESET_COUNT] = [
    SpiPreset { role: Role::Master, mode: Mode::Mode0 },
    SpiPreset { role: Role::Slave, mode: Mode::Mode0 },
    SpiPreset { role: Role::Master, mode: Mode::Mode2 },
    SpiPreset { role: Role::Slave, mode: Mode::Mode2 },
    SpiPreset { role: Role::Master, mode: Mode::Mode1 },
    SpiPreset { role: Role::Slave, mode: Mode::Mode1 },
    SpiPreset { role: Role::Master, mode: Mode::Mode3 },
    SpiPreset { role: Role::Slave, mode: Mode::Mode3 },
];

/// CPOL=0, CPHA=0 master
pub const MODE0_MASTER: u8 = 0;
/// CPOL=0, CPHA=0 slave
pub const MODE0_SLAVE: u8 = 1;
/// CPOL=1, CPHA=0 master
pub const MODE2_MASTER: u8 = 2;
/// CPOL=1, CPHA=0 slave
pub const MODE2_SLAVE: u8 = 3;
/// CPOL=0, CPHA=1 master
pub const MODE1_MASTER: u8 = 4;
/// CPOL=0, CPHA=1 slave
pub const MODE1_SLAVE: u8 = 5;
/// CPOL=1, CPHA=1 master
pub const MODE3_MASTER: u8 = 6;
/// CPOL=1, CPHA=1 slave
pub const MODE3_SLAVE: u8 = 7;

/// Resolve a preset ordinal
pub fn resolve(ordinal: u8) -> Result<SpiPreset, SpiError> {
    PRESETS
        .get(ordinal as usize)
        .copied()
        .ok_or(SpiError::InvalidConfig)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_layout() {
        for ordinal in 0..PRESET_COUNT as u8 {
            let preset = resolve(ordinal).unwrap();
            let slave = ordinal & 0b001 != 0;
            let cpol = ordinal & 0b010 != 0;
            let cpha = ordinal & 0b100 != 0;

            assert_eq!(preset.role == Role::Slave, slave);
            assert_eq!(preset.polarity() == Polarity::IdleHigh, cpol);
            assert_eq!(preset.phase() == Phase::CaptureOnSecondTransition, cpha);
        }
    }

    #[test]
    fn test_named_presets() {
        assert_eq!(resolve(MODE3_SLAVE).unwrap().mode, Mode::Mode3);
        assert_eq!(resolve(MODE1_MASTER).unwrap().role, Role::Master);
        assert_eq!(SpiPreset::default(), resolve(MODE0_MASTER).unwrap());
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(resolve(8), Err(SpiError::InvalidConfig));
    }
}
