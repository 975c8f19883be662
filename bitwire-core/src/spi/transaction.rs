//! SPI transactions
//!
//! The master asserts chip select once, exchanges `min(tx, rx)` bytes
//! full-duplex (or the set side's remaining length when only one buffer is
//! attached) and deasserts chip select, all inside one critical section.
//!
//! With CPHA=0 the first bit is placed before the leading clock edge, data
//! is sampled on leading edges and shifted on trailing edges. With CPHA=1
//! data is shifted on leading edges and sampled on trailing edges.

use bitwire_hal::{BitOrder, Level, LineId, LineIo, Phase, Role};
use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{ErrorType, SpiBus};

use super::config::{self, SpiPreset, DEFAULT_FREQUENCY_HZ};
use super::status::SpiStatus;
use super::SpiError;
use crate::buffer::{RxBuffer, TxBuffer};
use crate::critical::CriticalSection;

/// Shifted out when there is no transmit data
const FILL_BYTE: u8 = 0x00;

/// Slave shift register
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Shifter {
    out_byte: u8,
    /// Next output slot; 8 means a byte must be loaded first
    out_slot: u8,
    in_byte: u8,
    in_slot: u8,
}

/// Bit-level SPI device
pub struct SpiDevice<'a, L, C, D> {
    lines: L,
    critical: C,
    delay: D,
    preset: SpiPreset,
    frequency_hz: u32,
    bit_order: BitOrder,
    tx: TxBuffer<'a>,
    rx: RxBuffer<'a>,
    active: bool,
    shifter: Shifter,
}

impl<'a, L, C, D> SpiDevice<'a, L, C, D>
where
    L: LineIo,
    C: CriticalSection,
    D: DelayNs,
{
    /// Create a mode 0 master at the default frequency
    pub fn new(lines: L, critical: C, delay: D) -> Self {
        Self {
            lines,
            critical,
            delay,
            preset: SpiPreset::default(),
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            bit_order: BitOrder::MsbFirst,
            tx: TxBuffer::new(),
            rx: RxBuffer::new(),
            active: false,
            shifter: Shifter::default(),
        }
    }

    /// Put the lines in their idle state for the configured role
    pub fn startup(&mut self) {
        match self.preset.role {
            Role::Master => {
                let idle = self.preset.polarity().idle_level();
                self.lines.set_line(LineId::Sclk, idle);
                self.lines.set_line(LineId::Cs, Level::High);
            }
            Role::Slave => self.lines.release_line(LineId::Miso),
        }
    }

    /// Tear the device down and return its resources
    pub fn release(mut self) -> (L, C, D) {
        self.lines.release_line(LineId::Cs);
        self.lines.release_line(LineId::Miso);
        (self.lines, self.critical, self.delay)
    }

    /// Apply a preset ordinal (see [`config`])
    pub fn configure(&mut self, ordinal: u8) -> Result<(), SpiError> {
        self.ensure_idle()?;
        self.preset = config::resolve(ordinal)?;
        log_debug!(
            "spi: preset {} ({:?}, {:?})",
            ordinal,
            self.preset.role,
            self.preset.mode
        );
        Ok(())
    }

    pub fn set_frequency(&mut self, frequency_hz: u32) -> Result<(), SpiError> {
        self.ensure_idle()?;
        if frequency_hz == 0 {
            return Err(SpiError::InvalidConfig);
        }
        self.frequency_hz = frequency_hz;
        Ok(())
    }

    pub fn set_bit_order(&mut self, order: BitOrder) -> Result<(), SpiError> {
        self.ensure_idle()?;
        self.bit_order = order;
        Ok(())
    }

    pub fn preset(&self) -> &SpiPreset {
        &self.preset
    }

    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    pub fn set_transmit_buffer(&mut self, data: &'a [u8]) -> Result<(), SpiError> {
        self.ensure_idle()?;
        self.tx.set(data)?;
        Ok(())
    }

    pub fn set_receive_buffer(&mut self, data: &'a mut [u8]) -> Result<(), SpiError> {
        self.ensure_idle()?;
        self.rx.set(data)?;
        Ok(())
    }

    pub fn reset_transmit_index(&mut self) -> Result<(), SpiError> {
        self.ensure_idle()?;
        self.tx.reset_index();
        Ok(())
    }

    pub fn reset_receive_index(&mut self) -> Result<(), SpiError> {
        self.ensure_idle()?;
        self.rx.reset_index();
        Ok(())
    }

    /// Return the transmit buffer to the unset state
    pub fn detach_transmit_buffer(&mut self) -> Result<(), SpiError> {
        self.ensure_idle()?;
        self.tx.detach();
        Ok(())
    }

    /// Return the receive buffer to the unset state, handing the region back
    pub fn detach_receive_buffer(&mut self) -> Result<Option<&'a mut [u8]>, SpiError> {
        self.ensure_idle()?;
        Ok(self.rx.detach())
    }

    /// Transmit buffer size, 0 when unset
    pub fn transmit_size(&self) -> usize {
        self.tx.capacity()
    }

    /// Receive buffer size, 0 when unset
    pub fn receive_size(&self) -> usize {
        self.rx.capacity()
    }

    pub fn transmit_index(&self) -> usize {
        self.tx.index()
    }

    pub fn receive_index(&self) -> usize {
        self.rx.index()
    }

    /// Bytes received since the receive buffer was last rewound
    pub fn received(&self) -> &[u8] {
        self.rx.filled()
    }

    pub fn status(&self) -> SpiStatus {
        SpiStatus::from_buffers(&self.tx, &self.rx)
    }

    pub fn is_busy(&self) -> bool {
        self.active
    }

    /// Run a full master transaction; returns the number of bytes exchanged
    pub fn start_transaction(&mut self) -> Result<usize, SpiError> {
        self.ensure_idle()?;
        if self.preset.role != Role::Master {
            return Err(SpiError::InvalidConfig);
        }
        let length = match (self.tx.is_set(), self.rx.is_set()) {
            (false, false) => return Err(SpiError::InvalidBuffer),
            (true, false) => self.tx.remaining(),
            (false, true) => self.rx.remaining(),
            (true, true) => self.tx.remaining().min(self.rx.remaining()),
        };

        self.active = true;
        let half_period = self.half_period_ns();
        self.critical.enter();
        self.lines
            .set_line(LineId::Sclk, self.preset.polarity().idle_level());
        self.lines.set_line(LineId::Cs, Level::Low);
        self.delay.delay_ns(half_period);

        for _ in 0..length {
            let out = self.tx.next_byte().unwrap_or(FILL_BYTE);
            let input = self.exchange_byte(out);
            // `length` never exceeds the receive room; unset drops the byte
            let _ = self.rx.put_byte(input);
        }

        self.delay.delay_ns(half_period);
        self.lines.set_line(LineId::Cs, Level::High);
        self.critical.exit();
        self.active = false;

        log_trace!("spi: exchanged {} bytes", length);
        Ok(length)
    }

    fn half_period_ns(&self) -> u32 {
        500_000_000 / self.frequency_hz.max(1)
    }

    /// Clock one byte out on MOSI while sampling MISO
    fn exchange_byte(&mut self, out: u8) -> u8 {
        let half_period = self.half_period_ns();
        let idle = self.preset.polarity().idle_level();
        let order = self.bit_order;
        let mut input = 0;

        for slot in 0..8 {
            match self.preset.phase() {
                Phase::CaptureOnFirstTransition => {
                    self.lines.set_line(LineId::Mosi, order.level(out, slot));
                    self.delay.delay_ns(half_period);
                    self.lines.set_line(LineId::Sclk, !idle);
                    let miso = self.lines.read_line(LineId::Miso);
                    input = order.place(input, slot, miso);
                    self.delay.delay_ns(half_period);
                    self.lines.set_line(LineId::Sclk, idle);
                }
                Phase::CaptureOnSecondTransition => {
                    self.lines.set_line(LineId::Sclk, !idle);
                    self.lines.set_line(LineId::Mosi, order.level(out, slot));
                    self.delay.delay_ns(half_period);
                    self.lines.set_line(LineId::Sclk, idle);
                    let miso = self.lines.read_line(LineId::Miso);
                    input = order.place(input, slot, miso);
                    self.delay.delay_ns(half_period);
                }
            }
        }
        input
    }

    // ------------------------------------------------------------------
    // Slave
    // ------------------------------------------------------------------

    /// Chip-select edge interrupt (slave)
    pub fn on_cs_edge(&mut self) {
        if self.preset.role != Role::Slave {
            return;
        }
        if self.lines.read_line(LineId::Cs).is_low() {
            self.active = true;
            self.shifter = Shifter {
                out_slot: 8,
                ..Shifter::default()
            };
            if self.preset.phase() == Phase::CaptureOnFirstTransition {
                self.shift_out();
            }
        } else if self.active {
            self.active = false;
            self.lines.release_line(LineId::Miso);
            log_trace!("spi: slave done, {} bytes in", self.rx.index());
        }
    }

    /// Clock edge interrupt (slave)
    pub fn on_clk_edge(&mut self) {
        if self.preset.role != Role::Slave || !self.active {
            return;
        }
        let idle = self.preset.polarity().idle_level();
        let leading = self.lines.read_line(LineId::Sclk) != idle;
        let sample = match self.preset.phase() {
            Phase::CaptureOnFirstTransition => leading,
            Phase::CaptureOnSecondTransition => !leading,
        };
        if sample {
            self.shift_in();
        } else {
            self.shift_out();
        }
    }

    /// Drive the next MISO bit, loading a byte when the last one is done
    ///
    /// With CPHA=0 the byte after the last one is preloaded on the final
    /// trailing edge, so the transmit index can run one ahead of the bytes
    /// the master actually clocked in.
    fn shift_out(&mut self) {
        if self.shifter.out_slot >= 8 {
            self.shifter.out_byte = self.tx.next_byte().unwrap_or(FILL_BYTE);
            self.shifter.out_slot = 0;
        }
        let level = self
            .bit_order
            .level(self.shifter.out_byte, self.shifter.out_slot);
        self.lines.set_line(LineId::Miso, level);
        self.shifter.out_slot += 1;
    }

    fn shift_in(&mut self) {
        let mosi = self.lines.read_line(LineId::Mosi);
        let shifter = &mut self.shifter;
        shifter.in_byte = self.bit_order.place(shifter.in_byte, shifter.in_slot, mosi);
        shifter.in_slot += 1;
        if shifter.in_slot == 8 {
            let byte = shifter.in_byte;
            shifter.in_byte = 0;
            shifter.in_slot = 0;
            // A full or unset buffer drops the byte
            let _ = self.rx.put_byte(byte);
        }
    }

    fn ensure_idle(&self) -> Result<(), SpiError> {
        if self.active {
            Err(SpiError::DeviceBusy)
        } else {
            Ok(())
        }
    }

    fn ensure_master(&self) -> Result<(), SpiError> {
        self.ensure_idle()?;
        if self.preset.role != Role::Master {
            return Err(SpiError::InvalidConfig);
        }
        Ok(())
    }
}

impl<'a, L, C, D> ErrorType for SpiDevice<'a, L, C, D> {
    type Error = SpiError;
}

/// Bus-level access for `embedded-hal` drivers; chip select is left to the
/// caller
impl<'a, L, C, D> SpiBus<u8> for SpiDevice<'a, L, C, D>
where
    L: LineIo,
    C: CriticalSection,
    D: DelayNs,
{
    fn read(&mut self, words: &mut [u8]) -> Result<(), SpiError> {
        self.ensure_master()?;
        for word in words.iter_mut() {
            *word = self.exchange_byte(FILL_BYTE);
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), SpiError> {
        self.ensure_master()?;
        for &word in words {
            self.exchange_byte(word);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), SpiError> {
        self.ensure_master()?;
        for i in 0..read.len().max(write.len()) {
            let out = write.get(i).copied().unwrap_or(FILL_BYTE);
            let input = self.exchange_byte(out);
            if let Some(slot) = read.get_mut(i) {
                *slot = input;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), SpiError> {
        self.ensure_master()?;
        for word in words.iter_mut() {
            *word = self.exchange_byte(*word);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SpiError> {
        Ok(())
    }
}
