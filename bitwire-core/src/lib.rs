//! Bit-level bus engines
//!
//! This crate drives I2C and SPI one line transition at a time on top of
//! the [`bitwire_hal::LineIo`] boundary:
//!
//! - Interrupt-driven I2C engine, master and slave ([`i2c`])
//! - Polled SPI master transactions and edge-driven SPI slave ([`spi`])
//! - Borrowed transfer buffers ([`buffer`])
//! - Critical-section bracket for start/stop windows ([`critical`])
//! - Handle-addressed device storage for interrupt dispatch ([`arena`])
//!
//! Nothing here allocates; every buffer is borrowed from the caller.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod log;

pub mod arena;
pub mod buffer;
pub mod critical;
pub mod i2c;
pub mod spi;

#[cfg(test)]
mod sim;

pub use arena::{DeviceArena, Handle, SharedArena};
pub use buffer::BufferError;
pub use critical::{CriticalSection, InterruptFree, NoCriticalSection};
pub use i2c::{I2cDevice, I2cError, TransferOptions};
pub use spi::{SpiDevice, SpiError, SpiStatus};
