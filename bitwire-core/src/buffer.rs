//! Transfer buffers
//!
//! Bus engines never allocate. They borrow a caller-owned region for the
//! lifetime of the device and walk it with an index. The index only ever
//! moves forward; resetting it is the only way to restart a region.
//!
//! An unset buffer is represented as `None` and reported as
//! [`BufferError::Invalid`] by every accessor that needs data.

/// Buffer access error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferError {
    /// No region assigned, or an empty region was offered
    Invalid,
    /// Index reached the end of the region
    Exhausted,
}

/// Outgoing byte source
#[derive(Debug, Default)]
pub struct TxBuffer<'a> {
    data: Option<&'a [u8]>,
    index: usize,
}

impl<'a> TxBuffer<'a> {
    pub const fn new() -> Self {
        Self {
            data: None,
            index: 0,
        }
    }

    /// Assign a region and rewind
    ///
    /// An empty region leaves the buffer unset.
    pub fn set(&mut self, data: &'a [u8]) -> Result<(), BufferError> {
        self.index = 0;
        if data.is_empty() {
            self.data = None;
            return Err(BufferError::Invalid);
        }
        self.data = Some(data);
        Ok(())
    }

    /// Drop the region reference
    pub fn detach(&mut self) {
        self.data = None;
        self.index = 0;
    }

    pub fn reset_index(&mut self) {
        self.index = 0;
    }

    /// Take the byte at the index and advance
    pub fn next_byte(&mut self) -> Result<u8, BufferError> {
        let byte = self.peek_byte()?;
        self.index += 1;
        Ok(byte)
    }

    /// Byte at the index without advancing
    pub fn peek_byte(&self) -> Result<u8, BufferError> {
        let data = self.data.ok_or(BufferError::Invalid)?;
        data.get(self.index).copied().ok_or(BufferError::Exhausted)
    }

    pub fn is_set(&self) -> bool {
        self.data.is_some()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Region size, 0 when unset
    pub fn capacity(&self) -> usize {
        self.data.map_or(0, <[u8]>::len)
    }

    pub fn remaining(&self) -> usize {
        self.capacity() - self.index
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

/// Incoming byte sink
#[derive(Debug, Default)]
pub struct RxBuffer<'a> {
    data: Option<&'a mut [u8]>,
    index: usize,
}

impl<'a> RxBuffer<'a> {
    pub const fn new() -> Self {
        Self {
            data: None,
            index: 0,
        }
    }

    /// Assign a region and rewind
    ///
    /// An empty region leaves the buffer unset.
    pub fn set(&mut self, data: &'a mut [u8]) -> Result<(), BufferError> {
        self.index = 0;
        if data.is_empty() {
            self.data = None;
            return Err(BufferError::Invalid);
        }
        self.data = Some(data);
        Ok(())
    }

    /// Drop the region reference, handing it back to the caller
    pub fn detach(&mut self) -> Option<&'a mut [u8]> {
        self.index = 0;
        self.data.take()
    }

    pub fn reset_index(&mut self) {
        self.index = 0;
    }

    /// Store a byte at the index and advance
    pub fn put_byte(&mut self, byte: u8) -> Result<(), BufferError> {
        let data = self.data.as_deref_mut().ok_or(BufferError::Invalid)?;
        let slot = data.get_mut(self.index).ok_or(BufferError::Exhausted)?;
        *slot = byte;
        self.index += 1;
        Ok(())
    }

    /// Zero the region and rewind
    pub fn clear(&mut self) {
        if let Some(data) = self.data.as_deref_mut() {
            data.fill(0);
        }
        self.index = 0;
    }

    /// Bytes written since the last rewind
    pub fn filled(&self) -> &[u8] {
        match self.data.as_deref() {
            Some(data) => &data[..self.index],
            None => &[],
        }
    }

    pub fn is_set(&self) -> bool {
        self.data.is_some()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Region size, 0 when unset
    pub fn capacity(&self) -> usize {
        self.data.as_deref().map_or(0, <[u8]>::len)
    }

    pub fn remaining(&self) -> usize {
        self.capacity() - self.index
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tx_walks_region() {
        let data = [1, 2, 3];
        let mut tx = TxBuffer::new();
        tx.set(&data).unwrap();

        assert_eq!(tx.next_byte(), Ok(1));
        assert_eq!(tx.next_byte(), Ok(2));
        assert_eq!(tx.next_byte(), Ok(3));
        assert_eq!(tx.next_byte(), Err(BufferError::Exhausted));
        assert_eq!(tx.index(), 3);
        assert!(tx.is_exhausted());
    }

    #[test]
    fn test_tx_reset_keeps_contents() {
        let data = [7, 8];
        let mut tx = TxBuffer::new();
        tx.set(&data).unwrap();
        tx.next_byte().unwrap();
        tx.next_byte().unwrap();

        tx.reset_index();
        assert_eq!(tx.index(), 0);
        assert_eq!(tx.capacity(), 2);
        assert_eq!(tx.next_byte(), Ok(7));
    }

    #[test]
    fn test_empty_region_rejected() {
        let mut tx = TxBuffer::new();
        assert_eq!(tx.set(&[]), Err(BufferError::Invalid));
        assert!(!tx.is_set());
        assert_eq!(tx.next_byte(), Err(BufferError::Invalid));

        let mut empty: [u8; 0] = [];
        let mut rx = RxBuffer::new();
        assert_eq!(rx.set(&mut empty), Err(BufferError::Invalid));
        assert_eq!(rx.put_byte(1), Err(BufferError::Invalid));
        assert_eq!(rx.capacity(), 0);
    }

    #[test]
    fn test_set_rewinds() {
        let first = [1, 2];
        let second = [9];
        let mut tx = TxBuffer::new();
        tx.set(&first).unwrap();
        tx.next_byte().unwrap();

        tx.set(&second).unwrap();
        assert_eq!(tx.index(), 0);
        assert_eq!(tx.peek_byte(), Ok(9));
    }

    #[test]
    fn test_rx_fills_and_stops() {
        let mut region = [0u8; 2];
        let mut rx = RxBuffer::new();
        rx.set(&mut region).unwrap();

        rx.put_byte(0xAA).unwrap();
        assert_eq!(rx.filled(), &[0xAA]);
        rx.put_byte(0x55).unwrap();
        assert_eq!(rx.put_byte(0x00), Err(BufferError::Exhausted));
        assert_eq!(rx.filled(), &[0xAA, 0x55]);

        rx.clear();
        assert_eq!(rx.index(), 0);
        let region = rx.detach().unwrap();
        assert_eq!(region, &[0, 0]);
        assert!(!rx.is_set());
    }

    proptest! {
        #[test]
        fn test_index_never_exceeds_size(len in 1usize..32, ops in 0usize..64) {
            let data = vec![0x5Au8; len];
            let mut tx = TxBuffer::new();
            tx.set(&data).unwrap();

            let mut region = vec![0u8; len];
            let mut rx = RxBuffer::new();
            rx.set(&mut region).unwrap();

            for i in 0..ops {
                let sent = tx.next_byte();
                let stored = rx.put_byte(i as u8);
                prop_assert!(tx.index() <= tx.capacity());
                prop_assert!(rx.index() <= rx.capacity());
                prop_assert_eq!(sent.is_ok(), i < len);
                prop_assert_eq!(stored.is_ok(), i < len);
            }
        }
    }
}
