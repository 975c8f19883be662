//! I2C bus vocabulary
//!
//! Speed tiers and the read/write bit of the address frame. Timing derived
//! from a tier lives with the engine in `bitwire-core`.

/// SCL speed tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cSpeed {
    /// Standard mode (100 kHz)
    #[default]
    Standard,
    /// Fast mode (400 kHz)
    Fast,
    /// Fast mode plus (1 MHz)
    FastPlus,
    /// No throttling; edges are generated as fast as they are requested
    Infinity,
}

impl I2cSpeed {
    /// Nominal SCL frequency in Hz, 0 for [`I2cSpeed::Infinity`]
    pub const fn frequency_hz(self) -> u32 {
        match self {
            I2cSpeed::Standard => 100_000,
            I2cSpeed::Fast => 400_000,
            I2cSpeed::FastPlus => 1_000_000,
            I2cSpeed::Infinity => 0,
        }
    }

    /// Decode the two-bit speed field of a preset ordinal
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => I2cSpeed::Standard,
            1 => I2cSpeed::Fast,
            2 => I2cSpeed::FastPlus,
            _ => I2cSpeed::Infinity,
        }
    }
}

/// Direction bit carried in the address frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReadWrite {
    /// Master writes to the addressed device
    Write = 0,
    /// Master reads from the addressed device
    Read = 1,
}

impl ReadWrite {
    pub const fn bit(self) -> u8 {
        self as u8
    }

    pub const fn from_bit(bit: u8) -> Self {
        if bit & 1 == 0 {
            ReadWrite::Write
        } else {
            ReadWrite::Read
        }
    }
}

/// Address frame for a 7-bit address: `addr << 1 | rw`
pub const fn address_frame(address: u8, rw: ReadWrite) -> u8 {
    (address << 1) | rw.bit()
}
