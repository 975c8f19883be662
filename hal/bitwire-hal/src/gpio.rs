//! Bus line abstractions
//!
//! The engines address lines by [`LineId`] rather than by pin type, so one
//! engine implementation serves every pin layout. Lines are treated as
//! open-drain for I2C: driving [`Level::High`] releases the line and the
//! read-back level is what the bus actually carries.

use core::convert::Infallible;
use core::ops::Not;

use embedded_hal::digital::{InputPin, OutputPin, PinState};

/// Logic level of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }

    pub fn is_low(self) -> bool {
        self == Level::Low
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level.is_high()
    }
}

impl From<Level> for PinState {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => PinState::Low,
            Level::High => PinState::High,
        }
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Named bus line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineId {
    /// I2C clock
    Scl,
    /// I2C data
    Sda,
    /// SPI clock
    Sclk,
    /// SPI master-out slave-in
    Mosi,
    /// SPI master-in slave-out
    Miso,
    /// SPI chip select (active low)
    Cs,
}

/// Line driver and sampler
///
/// Implementations are called from interrupt context and must not block.
pub trait LineIo {
    /// Drive a line to the given level
    fn set_line(&mut self, line: LineId, level: Level);

    /// Sample the level currently present on a line
    fn read_line(&mut self, line: LineId) -> Level;

    /// Let a line return to its idle (pulled-up) level
    fn release_line(&mut self, line: LineId) {
        self.set_line(line, Level::High);
    }
}

fn drive<P: OutputPin<Error = Infallible>>(pin: &mut P, level: Level) {
    match pin.set_state(level.into()) {
        Ok(()) => {}
        Err(never) => match never {},
    }
}

fn sample<P: InputPin<Error = Infallible>>(pin: &mut P) -> Level {
    match pin.is_high() {
        Ok(high) => high.into(),
        Err(never) => match never {},
    }
}

/// I2C line pair over `embedded-hal` pins
///
/// Both pins must be configured open-drain with pull-ups by the platform.
/// Requests for non-I2C lines are ignored and read back as high.
pub struct I2cPins<SCL, SDA> {
    scl: SCL,
    sda: SDA,
}

impl<SCL, SDA> I2cPins<SCL, SDA>
where
    SCL: OutputPin<Error = Infallible> + InputPin,
    SDA: OutputPin<Error = Infallible> + InputPin,
{
    pub fn new(scl: SCL, sda: SDA) -> Self {
        Self { scl, sda }
    }

    /// Give the pins back
    pub fn into_inner(self) -> (SCL, SDA) {
        (self.scl, self.sda)
    }
}

impl<SCL, SDA> LineIo for I2cPins<SCL, SDA>
where
    SCL: OutputPin<Error = Infallible> + InputPin,
    SDA: OutputPin<Error = Infallible> + InputPin,
{
    fn set_line(&mut self, line: LineId, level: Level) {
        match line {
            LineId::Scl => drive(&mut self.scl, level),
            LineId::Sda => drive(&mut self.sda, level),
            _ => {}
        }
    }

    fn read_line(&mut self, line: LineId) -> Level {
        match line {
            LineId::Scl => sample(&mut self.scl),
            LineId::Sda => sample(&mut self.sda),
            _ => Level::High,
        }
    }
}

/// SPI line set over `embedded-hal` pins
///
/// The same pin set serves both roles: a master drives SCLK, MOSI and CS and
/// samples MISO, a slave does the opposite.
pub struct SpiPins<CLK, MOSI, MISO, CS> {
    clk: CLK,
    mosi: MOSI,
    miso: MISO,
    cs: CS,
}

impl<CLK, MOSI, MISO, CS> SpiPins<CLK, MOSI, MISO, CS>
where
    CLK: OutputPin<Error = Infallible> + InputPin,
    MOSI: OutputPin<Error = Infallible> + InputPin,
    MISO: OutputPin<Error = Infallible> + InputPin,
    CS: OutputPin<Error = Infallible> + InputPin,
{
    pub fn new(clk: CLK, mosi: MOSI, miso: MISO, cs: CS) -> Self {
        Self {
            clk,
            mosi,
            miso,
            cs,
        }
    }

    pub fn into_inner(self) -> (CLK, MOSI, MISO, CS) {
        (self.clk, self.mosi, self.miso, self.cs)
    }
}

impl<CLK, MOSI, MISO, CS> LineIo for SpiPins<CLK, MOSI, MISO, CS>
where
    CLK: OutputPin<Error = Infallible> + InputPin,
    MOSI: OutputPin<Error = Infallible> + InputPin,
    MISO: OutputPin<Error = Infallible> + InputPin,
    CS: OutputPin<Error = Infallible> + InputPin,
{
    fn set_line(&mut self, line: LineId, level: Level) {
        match line {
            LineId::Sclk => drive(&mut self.clk, level),
            LineId::Mosi => drive(&mut self.mosi, level),
            LineId::Miso => drive(&mut self.miso, level),
            LineId::Cs => drive(&mut self.cs, level),
            _ => {}
        }
    }

    fn read_line(&mut self, line: LineId) -> Level {
        match line {
            LineId::Sclk => sample(&mut self.clk),
            LineId::Mosi => sample(&mut self.mosi),
            LineId::Miso => sample(&mut self.miso),
            LineId::Cs => sample(&mut self.cs),
            _ => Level::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::ErrorType;

    /// Open-drain pin with an external pull-up and an optional external
    /// driver holding the line low.
    struct MockPin {
        driven_low: bool,
        held_low: bool,
    }

    impl MockPin {
        fn new() -> Self {
            Self {
                driven_low: false,
                held_low: false,
            }
        }
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.driven_low = true;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.driven_low = false;
            Ok(())
        }
    }

    impl InputPin for MockPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(!(self.driven_low || self.held_low))
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(self.driven_low || self.held_low)
        }
    }

    #[test]
    fn test_level_conversions() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::from(false), Level::Low);
        assert!(bool::from(Level::High));
        assert_eq!(!Level::High, Level::Low);
        assert_eq!(PinState::from(Level::Low), PinState::Low);
    }

    #[test]
    fn test_i2c_pins_drive_and_sample() {
        let mut pins = I2cPins::new(MockPin::new(), MockPin::new());

        assert_eq!(pins.read_line(LineId::Sda), Level::High);
        pins.set_line(LineId::Sda, Level::Low);
        assert_eq!(pins.read_line(LineId::Sda), Level::Low);
        assert_eq!(pins.read_line(LineId::Scl), Level::High);

        pins.release_line(LineId::Sda);
        assert_eq!(pins.read_line(LineId::Sda), Level::High);
    }

    #[test]
    fn test_i2c_pins_read_back_external_hold() {
        let mut scl = MockPin::new();
        scl.held_low = true;
        let mut pins = I2cPins::new(scl, MockPin::new());

        pins.set_line(LineId::Scl, Level::High);
        assert_eq!(pins.read_line(LineId::Scl), Level::Low);
    }

    #[test]
    fn test_i2c_pins_ignore_spi_lines() {
        let mut pins = I2cPins::new(MockPin::new(), MockPin::new());
        pins.set_line(LineId::Mosi, Level::Low);
        assert_eq!(pins.read_line(LineId::Mosi), Level::High);

        let (scl, sda) = pins.into_inner();
        assert!(!scl.driven_low);
        assert!(!sda.driven_low);
    }

    #[test]
    fn test_spi_pins_route_lines() {
        let mut pins = SpiPins::new(
            MockPin::new(),
            MockPin::new(),
            MockPin::new(),
            MockPin::new(),
        );

        pins.set_line(LineId::Cs, Level::Low);
        pins.set_line(LineId::Mosi, Level::Low);
        assert_eq!(pins.read_line(LineId::Cs), Level::Low);
        assert_eq!(pins.read_line(LineId::Mosi), Level::Low);
        assert_eq!(pins.read_line(LineId::Sclk), Level::High);
        assert_eq!(pins.read_line(LineId::Scl), Level::High);

        let (_, _, miso, cs) = pins.into_inner();
        assert!(!miso.driven_low);
        assert!(cs.driven_low);
    }
}
