//! Bitwire Hardware Abstraction Layer
//!
//! This crate defines the boundary between the bit-level bus engines in
//! `bitwire-core` and the platform. The engines only ever drive and sample
//! named lines; a platform provides that through [`gpio::LineIo`], either
//! directly over its registers or by wrapping `embedded-hal` pins in
//! [`gpio::I2cPins`] / [`gpio::SpiPins`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application / device drivers           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  bitwire-core (I2C engine, SPI master)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  bitwire-hal (this crate - line traits) │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ embedded-hal  │       │ chip GPIO /   │
//! │ pins          │       │ edge IRQs     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Contents
//!
//! - [`gpio::LineIo`] - Drive and sample bus lines
//! - [`i2c::I2cSpeed`], [`i2c::ReadWrite`] - I2C bus vocabulary
//! - [`spi::Mode`], [`spi::Polarity`], [`spi::Phase`] - SPI clock modes
//! - [`bits::BitOrder`] - Serialisation order of a byte on the wire

#![no_std]
#![deny(unsafe_code)]

pub mod bits;
pub mod gpio;
pub mod i2c;
pub mod spi;

// Re-export key types at crate root for convenience
pub use bits::BitOrder;
pub use gpio::{I2cPins, Level, LineId, LineIo, SpiPins};
pub use i2c::{I2cSpeed, ReadWrite};
pub use spi::{Mode, Phase, Polarity};

/// Bus role of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Device generates the clock and starts transfers
    #[default]
    Master,
    /// Device follows a clock generated elsewhere
    Slave,
}
