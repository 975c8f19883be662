//! Bit-level I2C bus engine
//!
//! An [`I2cDevice`] generates or follows SCL/SDA one edge at a time. The
//! platform calls [`I2cDevice::on_scl_edge`] from a timer (master) or from an
//! SCL edge interrupt (slave), and [`I2cDevice::on_sda_edge`] from an SDA
//! edge interrupt. Transfers are armed with [`I2cDevice::send_buffer`] /
//! [`I2cDevice::receive_buffer`] and complete asynchronously; completion is
//! observed with [`I2cDevice::poll`].
//!
//! ```text
//! Idle ─arm─▶ Start ─▶ Address ─ack─▶ DataTx / DataRx ─exhausted─▶ Stop ─▶ Idle
//!                         │                 │
//!                         └──nack──▶ Error ◀┘          (reset() → Idle)
//! ```

pub mod config;
pub mod engine;
pub mod options;
pub mod state;

pub use config::{I2cPreset, I2cTiming};
pub use engine::I2cDevice;
pub use options::TransferOptions;
pub use state::{BusEvent, BusState, Direction};

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// Frame whose acknowledge slot carried a NACK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckStage {
    Address,
    Data,
}

/// I2C engine error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cError {
    /// Receiver did not acknowledge a frame
    NoAck(AckStage),
    /// Buffer unset or empty
    InvalidBuffer,
    /// Unknown preset, bad address, or call not valid for the role
    InvalidConfig,
    /// A transfer is already in flight (or the bus is held by another master)
    DeviceBusy,
    /// SDA read low while this device released it
    ArbitrationLost,
    /// A slave held SCL low past the stretch limit
    ClockStretchTimeout,
}

impl embedded_hal::i2c::Error for I2cError {
    fn kind(&self) -> ErrorKind {
        match self {
            I2cError::NoAck(AckStage::Address) => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            I2cError::NoAck(AckStage::Data) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            I2cError::ArbitrationLost => ErrorKind::ArbitrationLoss,
            I2cError::ClockStretchTimeout => ErrorKind::Bus,
            I2cError::InvalidBuffer | I2cError::InvalidConfig | I2cError::DeviceBusy => {
                ErrorKind::Other
            }
        }
    }
}

impl From<crate::buffer::BufferError> for I2cError {
    fn from(_: crate::buffer::BufferError) -> Self {
        I2cError::InvalidBuffer
    }
}
