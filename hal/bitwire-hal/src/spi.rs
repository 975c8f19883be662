//! SPI clock modes

use embedded_hal::spi as hal_spi;

use crate::gpio::Level;

/// SPI clock polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Clock idles low (CPOL=0)
    IdleLow,
    /// Clock idles high (CPOL=1)
    IdleHigh,
}

impl Polarity {
    /// Level of SCLK between transfers
    pub const fn idle_level(self) -> Level {
        match self {
            Polarity::IdleLow => Level::Low,
            Polarity::IdleHigh => Level::High,
        }
    }
}

/// SPI clock phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Data captured on first clock transition (CPHA=0)
    CaptureOnFirstTransition,
    /// Data captured on second clock transition (CPHA=1)
    CaptureOnSecondTransition,
}

/// SPI mode (combined polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Mode 0: CPOL=0, CPHA=0
    #[default]
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

impl Mode {
    pub fn polarity(self) -> Polarity {
        <(Polarity, Phase)>::from(self).0
    }

    pub fn phase(self) -> Phase {
        <(Polarity, Phase)>::from(self).1
    }
}

impl From<Mode> for (Polarity, Phase) {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mode0 => (Polarity::IdleLow, Phase::CaptureOnFirstTransition),
            Mode::Mode1 => (Polarity::IdleLow, Phase::CaptureOnSecondTransition),
            Mode::Mode2 => (Polarity::IdleHigh, Phase::CaptureOnFirstTransition),
            Mode::Mode3 => (Polarity::IdleHigh, Phase::CaptureOnSecondTransition),
        }
    }
}

impl From<(Polarity, Phase)> for Mode {
    fn from((polarity, phase): (Polarity, Phase)) -> Self {
        match (polarity, phase) {
            (Polarity::IdleLow, Phase::CaptureOnFirstTransition) => Mode::Mode0,
            (Polarity::IdleLow, Phase::CaptureOnSecondTransition) => Mode::Mode1,
            (Polarity::IdleHigh, Phase::CaptureOnFirstTransition) => Mode::Mode2,
            (Polarity::IdleHigh, Phase::CaptureOnSecondTransition) => Mode::Mode3,
        }
    }
}

impl From<Mode> for hal_spi::Mode {
    fn from(mode: Mode) -> Self {
        let (polarity, phase) = mode.into();
        hal_spi::Mode {
            polarity: match polarity {
                Polarity::IdleLow => hal_spi::Polarity::IdleLow,
                Polarity::IdleHigh => hal_spi::Polarity::IdleHigh,
            },
            phase: match phase {
                Phase::CaptureOnFirstTransition => hal_spi::Phase::CaptureOnFirstTransition,
                Phase::CaptureOnSecondTransition => hal_spi::Phase::CaptureOnSecondTransition,
            },
        }
    }
}

impl From<hal_spi::Mode> for Mode {
    fn from(mode: hal_spi::Mode) -> Self {
        let polarity = match mode.polarity {
            hal_spi::Polarity::IdleLow => Polarity::IdleLow,
            hal_spi::Polarity::IdleHigh => Polarity::IdleHigh,
        };
        let phase = match mode.phase {
            hal_spi::Phase::CaptureOnFirstTransition => Phase::CaptureOnFirstTransition,
            hal_spi::Phase::CaptureOnSecondTransition => Phase::CaptureOnSecondTransition,
        };
        (polarity, phase).into()
    }
}
