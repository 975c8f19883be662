//! Wired-AND bus simulator for engine tests
//!
//! Every [`SimPort`] contributes a driver per line; a line reads low when
//! any port drives it low. Level changes are recorded in a trace with a
//! snapshot of all lines, and delivered to one attached peer device so a
//! master and a slave engine can run against each other.

use std::cell::RefCell;
use std::rc::Rc;

use bitwire_hal::{Level, LineId, LineIo};
use embedded_hal::delay::DelayNs;

use crate::critical::CriticalSection;
use crate::i2c::I2cDevice;
use crate::spi::SpiDevice;

pub const MASTER_PORT: usize = 0;
pub const SLAVE_PORT: usize = 1;
/// Port used by tests to hold lines low from outside
pub const HOLDER_PORT: usize = 2;

const PORTS: usize = 3;
const LINES: usize = 6;

fn line_index(line: LineId) -> usize {
    match line {
        LineId::Scl => 0,
        LineId::Sda => 1,
        LineId::Sclk => 2,
        LineId::Mosi => 3,
        LineId::Miso => 4,
        LineId::Cs => 5,
    }
}

/// Device that reacts to line changes made by other ports
pub trait EdgeSink {
    fn on_edge(&mut self, line: LineId);
}

/// A recorded level change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub line: LineId,
    pub level: Level,
    /// Levels of all lines after the change
    pub levels: [Level; LINES],
}

impl Edge {
    pub fn level_of(&self, line: LineId) -> Level {
        self.levels[line_index(line)]
    }

    pub fn is_rising(&self, line: LineId) -> bool {
        self.line == line && self.level.is_high()
    }

    pub fn is_falling(&self, line: LineId) -> bool {
        self.line == line && self.level.is_low()
    }
}

pub type SharedWire = Rc<RefCell<Wire>>;

pub struct Wire {
    drivers: [[Level; LINES]; PORTS],
    pub trace: Vec<Edge>,
    listener: Option<(usize, Rc<RefCell<dyn EdgeSink>>)>,
}

impl Wire {
    pub fn new() -> SharedWire {
        Rc::new(RefCell::new(Self {
            drivers: [[Level::High; LINES]; PORTS],
            trace: Vec::new(),
            listener: None,
        }))
    }

    /// Deliver changes made by other ports to `sink`, which drives `port`
    pub fn attach(&mut self, port: usize, sink: Rc<RefCell<dyn EdgeSink>>) {
        self.listener = Some((port, sink));
    }

    pub fn level(&self, line: LineId) -> Level {
        let index = line_index(line);
        if self.drivers.iter().any(|port| port[index].is_low()) {
            Level::Low
        } else {
            Level::High
        }
    }

    fn levels(&self) -> [Level; LINES] {
        let mut levels = [Level::High; LINES];
        for line in [
            LineId::Scl,
            LineId::Sda,
            LineId::Sclk,
            LineId::Mosi,
            LineId::Miso,
            LineId::Cs,
        ] {
            levels[line_index(line)] = self.level(line);
        }
        levels
    }

    /// Update one driver; returns the peer to notify when the line changed
    fn drive(
        &mut self,
        port: usize,
        line: LineId,
        level: Level,
    ) -> Option<Rc<RefCell<dyn EdgeSink>>> {
        let before = self.level(line);
        self.drivers[port][line_index(line)] = level;
        let after = self.level(line);
        if before == after {
            return None;
        }
        self.trace.push(Edge {
            line,
            level: after,
            levels: self.levels(),
        });
        match &self.listener {
            Some((listener_port, sink)) if *listener_port != port => Some(Rc::clone(sink)),
            _ => None,
        }
    }

    pub fn rising_edges(&self, line: LineId) -> usize {
        self.trace.iter().filter(|e| e.is_rising(line)).count()
    }

    pub fn falling_edges(&self, line: LineId) -> usize {
        self.trace.iter().filter(|e| e.is_falling(line)).count()
    }
}

/// One device's connection to the wire
pub struct SimPort {
    wire: SharedWire,
    port: usize,
}

impl SimPort {
    pub fn new(wire: &SharedWire, port: usize) -> Self {
        Self {
            wire: Rc::clone(wire),
            port,
        }
    }
}

impl LineIo for SimPort {
    fn set_line(&mut self, line: LineId, level: Level) {
        let peer = self.wire.borrow_mut().drive(self.port, line, level);
        if let Some(peer) = peer {
            peer.borrow_mut().on_edge(line);
        }
    }

    fn read_line(&mut self, line: LineId) -> Level {
        self.wire.borrow().level(line)
    }
}

/// Delay that returns at once and remembers how long it was asked to wait
#[derive(Debug, Default)]
pub struct NoopDelay {
    pub total_ns: u64,
}

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

impl<'a, L: LineIo, C: CriticalSection, D: DelayNs> EdgeSink for I2cDevice<'a, L, C, D> {
    fn on_edge(&mut self, line: LineId) {
        match line {
            LineId::Scl => self.on_scl_edge(),
            LineId::Sda => self.on_sda_edge(),
            _ => {}
        }
    }
}

impl<'a, L: LineIo, C: CriticalSection, D: DelayNs> EdgeSink for SpiDevice<'a, L, C, D> {
    fn on_edge(&mut self, line: LineId) {
        match line {
            LineId::Sclk => self.on_clk_edge(),
            LineId::Cs => self.on_cs_edge(),
            _ => {}
        }
    }
}

/// Symbol decoded from an I2C trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cSymbol {
    Start,
    Stop,
    Bit(Level),
}

/// Decode start, stop and sampled bits from a trace
pub fn decode_i2c(trace: &[Edge]) -> Vec<I2cSymbol> {
    let mut symbols = Vec::new();
    for edge in trace {
        let scl_high = edge.level_of(LineId::Scl).is_high();
        match edge.line {
            LineId::Scl if edge.level.is_high() => {
                symbols.push(I2cSymbol::Bit(edge.level_of(LineId::Sda)));
            }
            LineId::Sda if scl_high && edge.level.is_low() => symbols.push(I2cSymbol::Start),
            LineId::Sda if scl_high && edge.level.is_high() => symbols.push(I2cSymbol::Stop),
            _ => {}
        }
    }
    symbols
}

/// Group the bits after each start into `(byte, acked)` frames, MSB first
pub fn frames_after_start(symbols: &[I2cSymbol]) -> Vec<(u8, bool)> {
    let mut frames = Vec::new();
    let mut bits: Vec<Level> = Vec::new();
    for symbol in symbols {
        match symbol {
            I2cSymbol::Start | I2cSymbol::Stop => bits.clear(),
            I2cSymbol::Bit(level) => {
                bits.push(*level);
                if bits.len() == 9 {
                    let byte = bits[..8]
                        .iter()
                        .fold(0u8, |acc, level| (acc << 1) | u8::from(level.is_high()));
                    frames.push((byte, bits[8].is_low()));
                    bits.clear();
                }
            }
        }
    }
    frames
}

/// Leak a buffer so a device stored behind `Rc<RefCell<dyn EdgeSink>>` can
/// borrow it for `'static`
pub fn leak(bytes: &[u8]) -> &'static mut [u8] {
    Box::leak(bytes.to_vec().into_boxed_slice())
}
