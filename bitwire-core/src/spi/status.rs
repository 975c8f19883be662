//! Buffer occupancy flags
//!
//! Purely observational: computed from buffer index and size on every
//! call, never stored.

use bitflags::bitflags;

use crate::buffer::{RxBuffer, TxBuffer};

bitflags! {
    /// SPI buffer status
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SpiStatus: u8 {
        /// Transmit buffer set and nothing shifted out yet
        const TBUFF_FULL = 0b0001;
        /// Receive buffer has no room left (or is unset)
        const RBUFF_FULL = 0b0010;
        /// Transmit buffer fully shifted out (or unset)
        const TBUFF_EMPTY = 0b0100;
        /// Receive buffer set and nothing received yet
        const RBUFF_EMPTY = 0b1000;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SpiStatus {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "SpiStatus({=u8:#x})", self.bits())
    }
}

impl SpiStatus {
    pub fn from_buffers(tx: &TxBuffer<'_>, rx: &RxBuffer<'_>) -> Self {
        let mut status = SpiStatus::empty();
        if tx.is_set() && tx.index() == 0 {
            status |= SpiStatus::TBUFF_FULL;
        }
        if tx.is_exhausted() {
            status |= SpiStatus::TBUFF_EMPTY;
        }
        if rx.is_set() && rx.index() == 0 {
            status |= SpiStatus::RBUFF_EMPTY;
        }
        if rx.is_exhausted() {
            status |= SpiStatus::RBUFF_FULL;
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_buffers() {
        let status = SpiStatus::from_buffers(&TxBuffer::new(), &RxBuffer::new());
        assert_eq!(status, SpiStatus::TBUFF_EMPTY | SpiStatus::RBUFF_FULL);
    }

    #[test]
    fn test_fresh_buffers() {
        let data = [1, 2];
        let mut region = [0u8; 2];
        let mut tx = TxBuffer::new();
        let mut rx = RxBuffer::new();
        tx.set(&data).unwrap();
        rx.set(&mut region).unwrap();

        let status = SpiStatus::from_buffers(&tx, &rx);
        assert_eq!(status, SpiStatus::TBUFF_FULL | SpiStatus::RBUFF_EMPTY);
    }

    #[test]
    fn test_follows_indices() {
        let data = [1, 2];
        let mut region = [0u8; 2];
        let mut tx = TxBuffer::new();
        let mut rx = RxBuffer::new();
        tx.set(&data).unwrap();
        rx.set(&mut region).unwrap();

        tx.next_byte().unwrap();
        rx.put_byte(9).unwrap();
        assert!(SpiStatus::from_buffers(&tx, &rx).is_empty());

        tx.next_byte().unwrap();
        rx.put_byte(9).unwrap();
        assert_eq!(
            SpiStatus::from_buffers(&tx, &rx),
            SpiStatus::TBUFF_EMPTY | SpiStatus::RBUFF_FULL
        );

        tx.reset_index();
        assert!(SpiStatus::from_buffers(&tx, &rx).contains(SpiStatus::TBUFF_FULL));
    }
}
