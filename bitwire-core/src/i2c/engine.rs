//! Interrupt-driven I2C engine
//!
//! # Master
//!
//! A transfer call validates the request, generates the start condition and
//! returns. Every later call to [`I2cDevice::on_scl_edge`] produces exactly
//! one SCL transition: a low-phase tick releases SCL (and watches for clock
//! stretching), a high-phase tick samples SDA, lowers SCL and drives SDA for
//! the next bit slot. The platform calls it at twice the SCL frequency, or
//! uses [`I2cDevice::run_blocking`] to clock the transfer with the delay
//! provider.
//!
//! # Slave
//!
//! [`I2cDevice::on_sda_edge`] watches for start and stop conditions and
//! [`I2cDevice::on_scl_edge`] samples on rising and drives on falling SCL.
//! A matching address is acknowledged, master writes land in the receive
//! buffer and master reads are served from the transmit buffer.
//!
//! Bit slots 0..=7 carry data, slot 8 is the acknowledge slot. Address
//! frames are always MSB first; data frames follow the configured bit order.

use bitwire_hal::i2c::address_frame;
use bitwire_hal::{BitOrder, Level, LineId, LineIo, ReadWrite, Role};
use embedded_hal::delay::DelayNs;

use super::config::{self, I2cPreset};
use super::options::TransferOptions;
use super::state::{BusEvent, BusState, Direction};
use super::{AckStage, I2cError};
use crate::buffer::{RxBuffer, TxBuffer};
use crate::critical::CriticalSection;

/// Ticks a slave may hold SCL low before the master gives up
pub const DEFAULT_STRETCH_LIMIT: u16 = 256;

/// Highest 7-bit address
const MAX_ADDRESS: u8 = 0x7F;

/// Filler a slave shifts out once its transmit buffer runs dry
const IDLE_BYTE: u8 = 0xFF;

const ACK_SLOT: u8 = 8;

/// Master clock phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clock {
    /// SCL low; next tick releases it
    Low,
    /// SCL high; next tick samples SDA and lowers it
    High,
    /// SCL released but held low by a slave for this many ticks
    Stretched(u16),
}

/// Payload of the single-byte helpers, carried inside the device
#[derive(Debug, Clone, Copy)]
struct InlineBytes {
    bytes: [u8; 2],
    len: u8,
    index: u8,
}

impl InlineBytes {
    fn new(bytes: [u8; 2], len: u8) -> Self {
        Self {
            bytes,
            len,
            index: 0,
        }
    }

    fn next(&mut self) -> Option<u8> {
        let byte = self.bytes[..self.len as usize].get(self.index as usize).copied()?;
        self.index += 1;
        Some(byte)
    }

    fn put(&mut self, byte: u8) -> bool {
        match self.bytes[..self.len as usize].get_mut(self.index as usize) {
            Some(slot) => {
                *slot = byte;
                self.index += 1;
                true
            }
            None => false,
        }
    }

    fn remaining(&self) -> usize {
        (self.len - self.index) as usize
    }
}

/// Per-transfer bookkeeping
#[derive(Debug, Clone, Copy)]
struct Frame {
    direction: Direction,
    options: TransferOptions,
    /// Byte being shifted out or assembled
    byte: u8,
    /// Current bit slot, 0..=8
    bit: u8,
    clock: Clock,
    /// Level this device drives in the current slot
    sda: Level,
    /// Acknowledge result of the last completed byte
    acked: bool,
    /// Slave saw the rising edge of the current slot
    rising_seen: bool,
    /// Data bytes moved in this transfer
    transferred: usize,
}

impl Frame {
    const fn new(direction: Direction, options: TransferOptions) -> Self {
        Self {
            direction,
            options,
            byte: 0,
            bit: 0,
            clock: Clock::Low,
            sda: Level::High,
            acked: false,
            rising_seen: false,
            transferred: 0,
        }
    }
}

/// Bit-level I2C device
///
/// Owns its line interface, critical-section primitive and delay provider
/// for its whole lifetime; [`I2cDevice::release`] hands them back.
pub struct I2cDevice<'a, L, C, D> {
    lines: L,
    critical: C,
    delay: D,
    preset: I2cPreset,
    own_address: u8,
    bit_order: BitOrder,
    stretch_limit: u16,
    tx: TxBuffer<'a>,
    rx: RxBuffer<'a>,
    inline: Option<InlineBytes>,
    state: BusState,
    frame: Frame,
    active: bool,
    outcome: Option<Result<usize, I2cError>>,
    /// Another master holds the bus
    external_busy: bool,
    /// Master left the bus claimed (`skip_stop`, NACK)
    holds_bus: bool,
}

impl<'a, L, C, D> I2cDevice<'a, L, C, D>
where
    L: LineIo,
    C: CriticalSection,
    D: DelayNs,
{
    /// Create a standard-mode master with no buffers attached
    pub fn new(lines: L, critical: C, delay: D) -> Self {
        Self {
            lines,
            critical,
            delay,
            preset: I2cPreset::default(),
            own_address: 0,
            bit_order: BitOrder::MsbFirst,
            stretch_limit: DEFAULT_STRETCH_LIMIT,
            tx: TxBuffer::new(),
            rx: RxBuffer::new(),
            inline: None,
            state: BusState::Idle,
            frame: Frame::new(Direction::Transmit, TransferOptions::new()),
            active: false,
            outcome: None,
            external_busy: false,
            holds_bus: false,
        }
    }

    /// Release both lines so the bus idles high
    pub fn startup(&mut self) {
        self.lines.release_line(LineId::Scl);
        self.lines.release_line(LineId::Sda);
    }

    /// Tear the device down and return its resources
    pub fn release(mut self) -> (L, C, D) {
        self.startup();
        (self.lines, self.critical, self.delay)
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Apply a preset ordinal (see [`config`])
    pub fn configure(&mut self, ordinal: u8) -> Result<(), I2cError> {
        self.ensure_idle()?;
        self.preset = config::resolve(ordinal)?;
        log_debug!(
            "i2c: preset {} ({:?}, {:?})",
            ordinal,
            self.preset.role,
            self.preset.speed
        );
        Ok(())
    }

    /// Address this device answers to in the slave role
    pub fn set_own_address(&mut self, address: u8) -> Result<(), I2cError> {
        self.ensure_idle()?;
        if address > MAX_ADDRESS {
            return Err(I2cError::InvalidConfig);
        }
        self.own_address = address;
        Ok(())
    }

    /// Order of data bits on the wire; address frames are always MSB first
    pub fn set_bit_order(&mut self, order: BitOrder) -> Result<(), I2cError> {
        self.ensure_idle()?;
        self.bit_order = order;
        Ok(())
    }

    /// Ticks to wait for a stretched clock before failing the transfer
    pub fn set_stretch_limit(&mut self, ticks: u16) -> Result<(), I2cError> {
        self.ensure_idle()?;
        self.stretch_limit = ticks;
        Ok(())
    }

    pub fn preset(&self) -> &I2cPreset {
        &self.preset
    }

    pub fn role(&self) -> Role {
        self.preset.role
    }

    pub fn own_address(&self) -> u8 {
        self.own_address
    }

    // ------------------------------------------------------------------
    // Buffers
    // ------------------------------------------------------------------

    pub fn set_transmit_buffer(&mut self, data: &'a [u8]) -> Result<(), I2cError> {
        self.ensure_idle()?;
        self.tx.set(data)?;
        Ok(())
    }

    pub fn set_receive_buffer(&mut self, data: &'a mut [u8]) -> Result<(), I2cError> {
        self.ensure_idle()?;
        self.rx.set(data)?;
        Ok(())
    }

    pub fn reset_transmit_index(&mut self) -> Result<(), I2cError> {
        self.ensure_idle()?;
        self.tx.reset_index();
        Ok(())
    }

    pub fn reset_receive_index(&mut self) -> Result<(), I2cError> {
        self.ensure_idle()?;
        self.rx.reset_index();
        Ok(())
    }

    /// Zero the receive buffer and rewind it
    pub fn clear_receive_buffer(&mut self) -> Result<(), I2cError> {
        self.ensure_idle()?;
        self.rx.clear();
        Ok(())
    }

    /// Return the transmit buffer to the unset state
    pub fn detach_transmit_buffer(&mut self) -> Result<(), I2cError> {
        self.ensure_idle()?;
        self.tx.detach();
        Ok(())
    }

    /// Return the receive buffer to the unset state, handing the region back
    pub fn detach_receive_buffer(&mut self) -> Result<Option<&'a mut [u8]>, I2cError> {
        self.ensure_idle()?;
        Ok(self.rx.detach())
    }

    /// Bytes received since the receive buffer was last rewound
    pub fn received(&self) -> &[u8] {
        self.rx.filled()
    }

    pub fn transmit_index(&self) -> usize {
        self.tx.index()
    }

    pub fn receive_index(&self) -> usize {
        self.rx.index()
    }

    // ------------------------------------------------------------------
    // Transfers
    // ------------------------------------------------------------------

    /// Arm a master write of the transmit buffer
    ///
    /// `rw` is the bit placed in the address frame.
    pub fn send_buffer(
        &mut self,
        address: u8,
        rw: ReadWrite,
        options: TransferOptions,
    ) -> Result<(), I2cError> {
        self.arm(address, rw, Direction::Transmit, None, options)
    }

    /// Arm a master read into the receive buffer
    pub fn receive_buffer(
        &mut self,
        address: u8,
        rw: ReadWrite,
        options: TransferOptions,
    ) -> Result<(), I2cError> {
        self.arm(address, rw, Direction::Receive, None, options)
    }

    /// Arm a master write of a single byte
    pub fn send_byte(
        &mut self,
        address: u8,
        rw: ReadWrite,
        byte: u8,
        options: TransferOptions,
    ) -> Result<(), I2cError> {
        let inline = InlineBytes::new([byte, 0], 1);
        self.arm(address, rw, Direction::Transmit, Some(inline), options)
    }

    /// Arm a master write of two bytes, high byte first
    pub fn send_double_byte(
        &mut self,
        address: u8,
        rw: ReadWrite,
        high: u8,
        low: u8,
        options: TransferOptions,
    ) -> Result<(), I2cError> {
        let inline = InlineBytes::new([high, low], 2);
        self.arm(address, rw, Direction::Transmit, Some(inline), options)
    }

    /// Arm a master read of a single byte; fetch it with [`Self::received_byte`]
    pub fn receive_byte(
        &mut self,
        address: u8,
        rw: ReadWrite,
        options: TransferOptions,
    ) -> Result<(), I2cError> {
        let inline = InlineBytes::new([0, 0], 1);
        self.arm(address, rw, Direction::Receive, Some(inline), options)
    }

    /// Byte read by the last completed [`Self::receive_byte`]
    pub fn received_byte(&self) -> Option<u8> {
        match self.inline {
            Some(inline)
                if !self.active
                    && self.frame.direction == Direction::Receive
                    && inline.index > 0 =>
            {
                Some(inline.bytes[0])
            }
            _ => None,
        }
    }

    /// Completion status of the last transfer
    ///
    /// `WouldBlock` while in flight, the number of data bytes moved once
    /// idle, the error while in [`BusState::Error`] or after a fault.
    pub fn poll(&self) -> nb::Result<usize, I2cError> {
        if let BusState::Error(error) = self.state {
            return Err(nb::Error::Other(error));
        }
        if self.active {
            return Err(nb::Error::WouldBlock);
        }
        match self.outcome {
            Some(Ok(count)) => Ok(count),
            Some(Err(error)) => Err(nb::Error::Other(error)),
            None => Ok(0),
        }
    }

    /// Clock an armed master transfer to completion with the delay provider
    pub fn run_blocking(&mut self) -> Result<usize, I2cError> {
        if self.preset.role != Role::Master {
            return Err(I2cError::InvalidConfig);
        }
        let half_period = self.preset.timing.half_period_ns();
        loop {
            match self.poll() {
                Ok(count) => return Ok(count),
                Err(nb::Error::Other(error)) => return Err(error),
                Err(nb::Error::WouldBlock) => {
                    self.delay.delay_ns(half_period);
                    self.on_scl_edge();
                }
            }
        }
    }

    /// Abandon any transfer and return to idle
    ///
    /// A master that still holds the bus, in flight or left claimed by
    /// `skip_stop`, issues a stop condition. Both buffer indices are rewound.
    pub fn reset(&mut self) {
        if self.preset.role == Role::Master && (self.active || self.holds_bus) {
            self.critical.enter();
            self.stop_condition();
            self.critical.exit();
        } else {
            self.lines.release_line(LineId::Sda);
        }
        self.state = self.state.transition(BusEvent::Reset);
        self.active = false;
        self.external_busy = false;
        self.holds_bus = false;
        self.outcome = None;
        self.tx.reset_index();
        self.rx.reset_index();
        log_debug!("i2c: reset");
    }

    pub fn state(&self) -> BusState {
        self.state
    }

    /// Check if a transfer holds the device
    pub fn is_busy(&self) -> bool {
        self.active
    }

    // ------------------------------------------------------------------
    // Interrupt entry points
    // ------------------------------------------------------------------

    /// SCL tick (master) or SCL edge interrupt (slave)
    pub fn on_scl_edge(&mut self) {
        match self.preset.role {
            Role::Master => {
                if self.active && self.state.in_flight() {
                    self.master_tick();
                }
            }
            Role::Slave => self.slave_scl_edge(),
        }
    }

    /// SDA edge interrupt
    pub fn on_sda_edge(&mut self) {
        let scl = self.lines.read_line(LineId::Scl);
        let sda = self.lines.read_line(LineId::Sda);
        match self.preset.role {
            Role::Master => self.master_sda_edge(scl, sda),
            Role::Slave => self.slave_sda_edge(scl, sda),
        }
    }

    // ------------------------------------------------------------------
    // Master
    // ------------------------------------------------------------------

    fn arm(
        &mut self,
        address: u8,
        rw: ReadWrite,
        direction: Direction,
        inline: Option<InlineBytes>,
        options: TransferOptions,
    ) -> Result<(), I2cError> {
        if self.active || self.external_busy {
            return Err(I2cError::DeviceBusy);
        }
        if self.preset.role != Role::Master || address > MAX_ADDRESS {
            return Err(I2cError::InvalidConfig);
        }
        if options.reset_tx_index {
            self.tx.reset_index();
        }
        if options.reset_rx_index {
            self.rx.reset_index();
        }
        if inline.is_none() {
            let ready = match direction {
                Direction::Transmit => self.tx.is_set(),
                Direction::Receive => self.rx.is_set(),
            };
            if !ready {
                return Err(I2cError::InvalidBuffer);
            }
        }

        if !options.skip_entry_critical_section {
            self.critical.enter();
        }
        self.inline = inline;
        self.frame = Frame::new(direction, options);
        self.outcome = None;
        self.active = true;
        self.holds_bus = true;
        self.state = self.state.transition(BusEvent::Arm);
        if !options.skip_start {
            self.start_condition();
        }
        self.state = self.state.transition(BusEvent::StartIssued {
            skip_address: options.skip_address_frame,
            direction,
        });
        if !options.skip_entry_critical_section {
            self.critical.exit();
        }

        log_trace!("i2c: armed {:#x} {:?}", address, direction);

        if options.skip_address_frame {
            self.begin_data_byte();
        } else {
            self.frame.byte = address_frame(address, rw);
            self.prepare_slot();
        }
        Ok(())
    }

    /// SDA falls while SCL is high; leaves SCL low
    fn start_condition(&mut self) {
        let timing = self.preset.timing;
        // SDA first so a repeated start never looks like a stop
        self.lines.release_line(LineId::Sda);
        self.lines.release_line(LineId::Scl);
        self.delay.delay_ns(timing.half_period_ns());
        self.lines.set_line(LineId::Sda, Level::Low);
        self.delay.delay_ns(timing.sda_setup_ns);
        self.lines.set_line(LineId::Scl, Level::Low);
        self.frame.clock = Clock::Low;
    }

    /// SDA rises while SCL is high; leaves both lines released
    fn stop_condition(&mut self) {
        let setup = self.preset.timing.sda_setup_ns;
        self.lines.set_line(LineId::Scl, Level::Low);
        self.lines.set_line(LineId::Sda, Level::Low);
        self.delay.delay_ns(setup);
        self.lines.release_line(LineId::Scl);
        self.delay.delay_ns(setup);
        self.lines.release_line(LineId::Sda);
    }

    fn master_tick(&mut self) {
        match self.frame.clock {
            Clock::Low => {
                self.lines.release_line(LineId::Scl);
                self.check_clock_released(0);
            }
            Clock::Stretched(ticks) => self.check_clock_released(ticks),
            Clock::High => self.master_sample(),
        }
    }

    fn check_clock_released(&mut self, ticks: u16) {
        if self.lines.read_line(LineId::Scl).is_high() {
            self.frame.clock = Clock::High;
        } else if ticks >= self.stretch_limit {
            self.fault(I2cError::ClockStretchTimeout);
        } else {
            self.frame.clock = Clock::Stretched(ticks + 1);
        }
    }

    fn lower_clock(&mut self) {
        self.lines.set_line(LineId::Scl, Level::Low);
        self.frame.clock = Clock::Low;
    }

    fn master_sample(&mut self) {
        let sda = self.lines.read_line(LineId::Sda);
        let bit = self.frame.bit;

        if bit < ACK_SLOT {
            match self.state {
                BusState::Address | BusState::DataTx => {
                    if self.frame.sda.is_high() && sda.is_low() {
                        self.fault(I2cError::ArbitrationLost);
                        return;
                    }
                }
                BusState::DataRx => {
                    self.frame.byte = self.bit_order.place(self.frame.byte, bit, sda);
                }
                _ => {}
            }
            self.lower_clock();
            self.frame.bit += 1;
            self.prepare_slot();
            return;
        }

        self.lower_clock();
        match self.state {
            BusState::Address if sda.is_low() => {
                self.state = self
                    .state
                    .transition(BusEvent::AddressAck(self.frame.direction));
                self.begin_data_byte();
            }
            BusState::Address => self.nack(AckStage::Address),
            BusState::DataTx if sda.is_low() => {
                self.frame.transferred += 1;
                self.begin_data_byte();
            }
            BusState::DataTx => self.nack(AckStage::Data),
            BusState::DataRx => self.begin_data_byte(),
            _ => {}
        }
    }

    /// Drive SDA for the current slot while SCL is low
    fn prepare_slot(&mut self) {
        let level = match (self.state, self.frame.bit) {
            (BusState::Address, bit) if bit < ACK_SLOT => {
                BitOrder::MsbFirst.level(self.frame.byte, bit)
            }
            (BusState::DataTx, bit) if bit < ACK_SLOT => self.bit_order.level(self.frame.byte, bit),
            (BusState::DataRx, ACK_SLOT) => self.store_received(),
            _ => Level::High,
        };
        self.frame.sda = level;
        self.lines.set_line(LineId::Sda, level);
    }

    /// Store the assembled byte and pick the acknowledge level
    fn store_received(&mut self) -> Level {
        let byte = self.frame.byte;
        let stored = match self.inline.as_mut() {
            Some(inline) => inline.put(byte),
            None => self.rx.put_byte(byte).is_ok(),
        };
        if stored {
            self.frame.transferred += 1;
        }
        let last = self.rx_remaining() == 0;
        if last && !self.frame.options.ack_final_byte {
            Level::High
        } else {
            Level::Low
        }
    }

    fn rx_remaining(&self) -> usize {
        match &self.inline {
            Some(inline) => inline.remaining(),
            None => self.rx.remaining(),
        }
    }

    fn next_tx_byte(&mut self) -> Option<u8> {
        match self.inline.as_mut() {
            Some(inline) => inline.next(),
            None => self.tx.next_byte().ok(),
        }
    }

    /// Load the next data byte, or finish once the buffer is exhausted
    fn begin_data_byte(&mut self) {
        let next = match self.frame.direction {
            Direction::Transmit => self.next_tx_byte(),
            Direction::Receive => (self.rx_remaining() > 0).then_some(0),
        };
        match next {
            Some(byte) => {
                self.frame.byte = byte;
                self.frame.bit = 0;
                self.prepare_slot();
            }
            None => self.finish(),
        }
    }

    fn finish(&mut self) {
        let options = self.frame.options;
        if !options.skip_exit_critical_section {
            self.critical.enter();
        }
        self.state = self.state.transition(BusEvent::DataComplete);
        if !options.skip_stop {
            self.stop_condition();
        }
        self.state = self.state.transition(BusEvent::StopIssued);
        self.active = false;
        self.holds_bus = options.skip_stop;
        self.outcome = Some(Ok(self.frame.transferred));
        if !options.skip_exit_critical_section {
            self.critical.exit();
        }
        log_trace!("i2c: done, {} bytes", self.frame.transferred);
    }

    /// Receiver declined a frame; SCL stays low until [`Self::reset`]
    fn nack(&mut self, stage: AckStage) {
        self.lines.release_line(LineId::Sda);
        self.state = self.state.transition(BusEvent::Nack(stage));
        self.outcome = Some(Err(I2cError::NoAck(stage)));
        log_warn!("i2c: no ack ({:?})", stage);
    }

    fn fault(&mut self, error: I2cError) {
        self.lines.release_line(LineId::Sda);
        self.lines.release_line(LineId::Scl);
        self.state = self.state.transition(BusEvent::Fault(error));
        self.active = false;
        self.holds_bus = false;
        self.outcome = Some(Err(error));
        log_warn!("i2c: bus fault {:?}", error);
    }

    fn master_sda_edge(&mut self, scl: Level, sda: Level) {
        if !self.active {
            // Track start/stop from other masters
            if scl.is_high() {
                self.external_busy = sda.is_low();
            }
            return;
        }
        let transmitting =
            matches!(self.state, BusState::Address | BusState::DataTx) && self.frame.bit < ACK_SLOT;
        if transmitting && scl.is_high() && self.frame.sda.is_high() && sda.is_low() {
            self.fault(I2cError::ArbitrationLost);
        }
    }

    // ------------------------------------------------------------------
    // Slave
    // ------------------------------------------------------------------

    fn slave_sda_edge(&mut self, scl: Level, sda: Level) {
        if scl.is_low() || self.state.is_error() {
            return;
        }
        if sda.is_low() {
            let carried = if self.active { self.frame.transferred } else { 0 };
            self.state = self.state.transition(BusEvent::StartDetected);
            self.frame = Frame::new(Direction::Receive, TransferOptions::new());
            self.frame.transferred = carried;
            self.inline = None;
            self.outcome = None;
            self.active = true;
        } else if self.active {
            self.lines.release_line(LineId::Sda);
            self.state = self.state.transition(BusEvent::StopDetected);
            self.active = false;
            self.outcome = Some(Ok(self.frame.transferred));
            log_trace!("i2c: slave done, {} bytes", self.frame.transferred);
        }
    }

    fn slave_scl_edge(&mut self) {
        let addressed = matches!(
            self.state,
            BusState::Address | BusState::DataTx | BusState::DataRx
        );
        if !self.active || !addressed {
            return;
        }
        if self.lines.read_line(LineId::Scl).is_high() {
            let sda = self.lines.read_line(LineId::Sda);
            self.slave_sample(sda);
            self.frame.rising_seen = true;
        } else if self.frame.rising_seen {
            self.frame.rising_seen = false;
            self.slave_advance();
        }
    }

    fn slave_sample(&mut self, sda: Level) {
        let bit = self.frame.bit;
        match self.state {
            BusState::Address if bit < ACK_SLOT => {
                self.frame.byte = BitOrder::MsbFirst.place(self.frame.byte, bit, sda);
            }
            BusState::DataRx if bit < ACK_SLOT => {
                self.frame.byte = self.bit_order.place(self.frame.byte, bit, sda);
            }
            BusState::DataTx if bit == ACK_SLOT => self.frame.acked = sda.is_low(),
            _ => {}
        }
    }

    /// Falling SCL: move to the next slot and drive it
    fn slave_advance(&mut self) {
        match self.frame.bit {
            bit if bit + 1 < ACK_SLOT => {
                self.frame.bit += 1;
                self.slave_drive_slot();
            }
            bit if bit + 1 == ACK_SLOT => {
                self.frame.bit = ACK_SLOT;
                self.slave_ack_slot();
            }
            _ => self.slave_after_ack(),
        }
    }

    fn slave_drive_slot(&mut self) {
        let level = match self.state {
            BusState::DataTx => self.bit_order.level(self.frame.byte, self.frame.bit),
            _ => Level::High,
        };
        self.lines.set_line(LineId::Sda, level);
    }

    fn slave_ack_slot(&mut self) {
        match self.state {
            BusState::Address => {
                let frame = self.frame.byte;
                if frame >> 1 == self.own_address {
                    self.frame.direction = match ReadWrite::from_bit(frame) {
                        ReadWrite::Write => Direction::Receive,
                        ReadWrite::Read => Direction::Transmit,
                    };
                    self.frame.acked = true;
                    self.lines.set_line(LineId::Sda, Level::Low);
                } else {
                    self.lines.release_line(LineId::Sda);
                    self.state = self.state.transition(BusEvent::AddressMismatch);
                    self.active = false;
                    // Repeated start to another device ends our transfer
                    if self.frame.transferred > 0 {
                        self.outcome = Some(Ok(self.frame.transferred));
                    }
                }
            }
            BusState::DataRx => {
                let stored = self.rx.put_byte(self.frame.byte).is_ok();
                if stored {
                    self.frame.transferred += 1;
                }
                self.frame.acked = stored;
                let level = if stored { Level::Low } else { Level::High };
                self.lines.set_line(LineId::Sda, level);
            }
            // Master acknowledges
            BusState::DataTx => self.lines.release_line(LineId::Sda),
            _ => {}
        }
    }

    fn slave_after_ack(&mut self) {
        match self.state {
            BusState::Address => {
                self.state = self
                    .state
                    .transition(BusEvent::AddressAck(self.frame.direction));
                self.slave_begin_byte();
            }
            BusState::DataTx => {
                self.frame.transferred += 1;
                if self.frame.acked {
                    self.slave_begin_byte();
                } else {
                    self.slave_end_data();
                }
            }
            BusState::DataRx if self.frame.acked => self.slave_begin_byte(),
            BusState::DataRx => self.slave_end_data(),
            _ => {}
        }
    }

    fn slave_begin_byte(&mut self) {
        self.frame.bit = 0;
        self.frame.byte = match self.state {
            BusState::DataTx => self.tx.next_byte().unwrap_or(IDLE_BYTE),
            _ => 0,
        };
        self.slave_drive_slot();
    }

    /// Release the bus and wait for the master's stop
    fn slave_end_data(&mut self) {
        self.lines.release_line(LineId::Sda);
        self.state = self.state.transition(BusEvent::DataComplete);
    }

    fn ensure_idle(&self) -> Result<(), I2cError> {
        if self.active {
            Err(I2cError::DeviceBusy)
        } else {
            Ok(())
        }
    }
}
