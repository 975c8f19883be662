//! Bit serialisation helpers

use crate::gpio::Level;

/// Order in which the bits of a byte appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    #[default]
    MsbFirst,
    LsbFirst,
}

impl BitOrder {
    /// Shift of the `slot`-th transmitted bit (0..8) within the byte
    pub const fn shift(self, slot: u8) -> u8 {
        match self {
            BitOrder::MsbFirst => 7 - (slot & 7),
            BitOrder::LsbFirst => slot & 7,
        }
    }

    /// Level of the `slot`-th transmitted bit of `byte`
    pub fn level(self, byte: u8, slot: u8) -> Level {
        byte.check(self.shift(slot)).into()
    }

    /// Place a received bit into `byte` at the position of `slot`
    pub fn place(self, byte: u8, slot: u8, level: Level) -> u8 {
        let shift = self.shift(slot);
        if level.is_high() {
            byte.set(shift)
        } else {
            byte.clear(shift)
        }
    }
}

/// Single-bit operations on register-sized values
pub trait BitsExt {
    fn set(self, shift: u8) -> Self;
    fn clear(self, shift: u8) -> Self;
    fn check(self, shift: u8) -> bool;
}

impl BitsExt for u8 {
    fn set(self, shift: u8) -> Self {
        self | (1 << shift)
    }

    fn clear(self, shift: u8) -> Self {
        self & !(1 << shift)
    }

    fn check(self, shift: u8) -> bool {
        self & (1 << shift) != 0
    }
}
