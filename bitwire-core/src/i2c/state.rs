//! I2C bus state machine
//!
//! The bus state is a pure function of the previous state and an event.
//! The engine decides which event a line change means; this module only
//! decides where that event leads.

use super::{AckStage, I2cError};

/// Data direction as seen by this device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// This device drives SDA during data bits
    Transmit,
    /// This device samples SDA during data bits
    Receive,
}

/// Bus states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    /// No transfer in flight
    #[default]
    Idle,
    /// Master armed, start condition being generated
    Start,
    /// Address frame on the bus
    Address,
    /// Data frames leaving this device
    DataTx,
    /// Data frames arriving at this device
    DataRx,
    /// Data phase over, stop condition pending
    Stop,
    /// Transfer aborted; only a reset leaves this state
    Error(I2cError),
}

/// Events driving the bus state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    /// Master accepted a transfer request
    Arm,
    /// Start condition generated (or skipped)
    StartIssued {
        skip_address: bool,
        direction: Direction,
    },
    /// Address frame acknowledged
    AddressAck(Direction),
    /// Address frame names another device (slave)
    AddressMismatch,
    /// Acknowledge slot carried a NACK
    Nack(AckStage),
    /// Data phase ended normally
    DataComplete,
    /// Stop condition generated (or skipped)
    StopIssued,
    /// Start or repeated start seen on the bus (slave)
    StartDetected,
    /// Stop seen on the bus (slave)
    StopDetected,
    /// Bus-level fault; the transfer is abandoned
    Fault(I2cError),
    /// Explicit reset
    Reset,
}

fn data_state(direction: Direction) -> BusState {
    match direction {
        Direction::Transmit => BusState::DataTx,
        Direction::Receive => BusState::DataRx,
    }
}

impl BusState {
    /// Check if a transfer is between arm and stop
    pub fn in_flight(&self) -> bool {
        !matches!(self, BusState::Idle | BusState::Error(_))
    }

    /// Check if this is an error state
    pub fn is_error(&self) -> bool {
        matches!(self, BusState::Error(_))
    }

    /// Check if data frames are on the bus
    pub fn is_data(&self) -> bool {
        matches!(self, BusState::DataTx | BusState::DataRx)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: BusEvent) -> Self {
        use BusEvent::*;
        use BusState::*;

        match (self, event) {
            // Reset is the only exit from Error, and works from anywhere
            (_, Reset) => Idle,
            (Error(e), _) => Error(e),

            // Master sequence
            (Idle, Arm) => Start,
            (Start, StartIssued { skip_address: false, .. }) => Address,
            (Start, StartIssued { skip_address: true, direction }) => data_state(direction),
            (Address, AddressAck(direction)) => data_state(direction),
            (Address | DataTx | DataRx, Nack(stage)) => Error(I2cError::NoAck(stage)),
            (DataTx | DataRx, DataComplete) => Stop,
            (Stop, StopIssued) => Idle,

            // Slave observation
            (Address, AddressMismatch) => Idle,
            (_, StartDetected) => Address,
            (_, StopDetected) => Idle,

            // Faults abandon the transfer
            (_, Fault(_)) => Idle,

            // Everything else leaves the state unchanged
            (state, _) => state,
        }
    }
}
