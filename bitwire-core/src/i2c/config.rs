//! I2C configuration presets
//!
//! A preset ordinal packs the speed tier into bits 1:0 and the role into
//! bit 2 (0 master, 1 slave). Resolution is a pure table lookup; ordinals
//! are validated once, at configuration time.

use bitwire_hal::{I2cSpeed, Role};

use super::I2cError;

/// Address width on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressWidth {
    SevenBit,
}

/// Bus timing derived from a speed tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cTiming {
    /// Nominal SCL frequency, 0 when unthrottled
    pub scl_frequency_hz: u32,
    /// Full SCL period
    pub scl_period_ns: u32,
    /// SDA setup before an SCL edge in start/stop conditions
    pub sda_setup_ns: u32,
    pub address_width: AddressWidth,
}

impl I2cTiming {
    pub const STANDARD: Self = Self::for_period(10_000, 100_000);
    pub const FAST: Self = Self::for_period(2_500, 400_000);
    pub const FAST_PLUS: Self = Self::for_period(1_000, 1_000_000);
    pub const INFINITY: Self = Self::for_period(0, 0);

    const fn for_period(scl_period_ns: u32, scl_frequency_hz: u32) -> Self {
        Self {
            scl_frequency_hz,
            scl_period_ns,
            sda_setup_ns: scl_period_ns / 4,
            address_width: AddressWidth::SevenBit,
        }
    }

    /// Interval between consecutive SCL edges
    pub const fn half_period_ns(&self) -> u32 {
        self.scl_period_ns / 2
    }
}

/// Resolved configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cPreset {
    pub role: Role,
    pub speed: I2cSpeed,
    pub timing: I2cTiming,
}

impl I2cPreset {
    const fn new(role: Role, speed: I2cSpeed) -> Self {
        let timing = match speed {
            I2cSpeed::Standard => I2cTiming::STANDARD,
            I2cSpeed::Fast => I2cTiming::FAST,
            I2cSpeed::FastPlus => I2cTiming::FAST_PLUS,
            I2cSpeed::Infinity => I2cTiming::INFINITY,
        };
        Self { role, speed, timing }
    }

    /// Ordinal that resolves to this preset
    pub const fn ordinal(&self) -> u8 {
        let speed = match self.speed {
            I2cSpeed::Standard => 0,
            I2cSpeed::Fast => 1,
            I2cSpeed::FastPlus => 2,
            I2cSpeed::Infinity => 3,
        };
        let role = match self.role {
            Role::Master => 0,
            Role::Slave => 1,
        };
        speed | (role << 2)
    }
}

impl Default for I2cPreset {
    fn default() -> Self {
        PRESETS[0]
    }
}

/// Number of defined presets
pub const PRESET_COUNT: usize = 8;

static PRESETS: [I2cPreset; PRESET_COUNT] = [
    I2cPreset::new(Role::Master, I2cSpeed::Standard),
    I2cPreset::new(Role::Master, I2cSpeed::Fast),
    I2cPreset::new(Role::Master, I2cSpeed::FastPlus),
    I2cPreset::new(Role::Master, I2cSpeed::Infinity),
    I2cPreset::new(Role::Slave, I2cSpeed::Standard),
    I2cPreset::new(Role::Slave, I2cSpeed::Fast),
    I2cPreset::new(Role::Slave, I2cSpeed::FastPlus),
    I2cPreset::new(Role::Slave, I2cSpeed::Infinity),
];

/// Standard-mode master
pub const STANDARD_MASTER: u8 = 0;
/// Fast-mode master
pub const FAST_MASTER: u8 = 1;
/// Fast-mode-plus master
pub const FAST_PLUS_MASTER: u8 = 2;
/// Unthrottled master
pub const INFINITY_MASTER: u8 = 3;
/// Standard-mode slave
pub const STANDARD_SLAVE: u8 = 4;
/// Fast-mode slave
pub const FAST_SLAVE: u8 = 5;
/// Fast-mode-plus slave
pub const FAST_PLUS_SLAVE: u8 = 6;
/// Unthrottled slave
pub const INFINITY_SLAVE: u8 = 7;

/// Resolve a preset ordinal
pub fn resolve(ordinal: u8) -> Result<I2cPreset, I2cError> {
    PRESETS
        .get(ordinal as usize)
        .copied()
        .ok_or(I2cError::InvalidConfig)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_speed_tiers() {
        assert_eq!(resolve(STANDARD_MASTER).unwrap().timing.scl_frequency_hz, 100_000);
        assert_eq!(resolve(FAST_MASTER).unwrap().timing.scl_period_ns, 2_500);
        assert_eq!(resolve(FAST_PLUS_MASTER).unwrap().timing.scl_frequency_hz, 1_000_000);
        assert_eq!(resolve(INFINITY_MASTER).unwrap().timing.half_period_ns(), 0);
    }

    #[test]
    fn test_role_bit() {
        assert_eq!(resolve(FAST_MASTER).unwrap().role, Role::Master);
        let slave = resolve(FAST_SLAVE).unwrap();
        assert_eq!(slave.role, Role::Slave);
        assert_eq!(slave.speed, I2cSpeed::Fast);
    }

    #[test]
    fn test_setup_is_quarter_period() {
        let timing = resolve(STANDARD_SLAVE).unwrap().timing;
        assert_eq!(timing.sda_setup_ns, 2_500);
        assert_eq!(timing.address_width, AddressWidth::SevenBit);
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(resolve(8), Err(I2cError::InvalidConfig));
        assert_eq!(resolve(u8::MAX), Err(I2cError::InvalidConfig));
    }

    proptest! {
        #[test]
        fn test_resolve_is_pure(ordinal in any::<u8>()) {
            let first = resolve(ordinal);
            let second = resolve(ordinal);
            prop_assert_eq!(first, second);
            match first {
                Ok(preset) => {
                    prop_assert!((ordinal as usize) < PRESET_COUNT);
                    prop_assert_eq!(preset.ordinal(), ordinal);
                    prop_assert_eq!(preset.speed, I2cSpeed::from_bits(ordinal));
                }
                Err(e) => prop_assert_eq!(e, I2cError::InvalidConfig),
            }
        }
    }
}
