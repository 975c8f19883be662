//! Bit-level SPI
//!
//! A master runs a whole transaction synchronously from
//! [`SpiDevice::start_transaction`]; a slave follows the master through
//! [`SpiDevice::on_cs_edge`] and [`SpiDevice::on_clk_edge`]. Both share the
//! buffer model of the I2C engine.

pub mod config;
pub mod status;
pub mod transaction;

pub use config::SpiPreset;
pub use status::SpiStatus;
pub use transaction::SpiDevice;

use embedded_hal::spi::ErrorKind;

/// SPI error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiError {
    /// A transaction is already running
    DeviceBusy,
    /// Neither buffer is set, or an empty region was offered
    InvalidBuffer,
    /// Unknown preset, zero frequency, or call not valid for the role
    InvalidConfig,
}

impl embedded_hal::spi::Error for SpiError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl From<crate::buffer::BufferError> for SpiError {
    fn from(_: crate::buffer::BufferError) -> Self {
        SpiError::InvalidBuffer
    }
}
