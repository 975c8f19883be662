//! Per-transfer options
//!
//! Every option defaults to `false`, which gives a complete, self-contained
//! transfer: critical-section-guarded start, address frame, data, stop.
//! Setting options lets callers compose transfers, e.g. a register write
//! with `skip_stop` followed by a read with a repeated start.

/// Modifiers for a single transfer call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferOptions {
    /// Do not generate a start condition (continue a held bus)
    pub skip_start: bool,
    /// Leave the bus held after the last byte
    pub skip_stop: bool,
    /// Caller already masks interrupts around the start condition
    pub skip_entry_critical_section: bool,
    /// Caller already masks interrupts around the stop condition
    pub skip_exit_critical_section: bool,
    /// Go straight to the data phase
    ///
    /// Independent of `skip_start`: on its own a start condition is still
    /// generated (one extra SCL edge ahead of the data). Use
    /// [`TransferOptions::continuation`] to resume on a bus already held.
    pub skip_address_frame: bool,
    /// Rewind the transmit buffer before the transfer
    pub reset_tx_index: bool,
    /// Rewind the receive buffer before the transfer
    pub reset_rx_index: bool,
    /// ACK the final received byte instead of NACKing it
    pub ack_final_byte: bool,
}

impl TransferOptions {
    pub const fn new() -> Self {
        Self {
            skip_start: false,
            skip_stop: false,
            skip_entry_critical_section: false,
            skip_exit_critical_section: false,
            skip_address_frame: false,
            reset_tx_index: false,
            reset_rx_index: false,
            ack_final_byte: false,
        }
    }

    pub const fn skip_start(mut self) -> Self {
        self.skip_start = true;
        self
    }

    pub const fn skip_stop(mut self) -> Self {
        self.skip_stop = true;
        self
    }

    pub const fn skip_critical_sections(mut self) -> Self {
        self.skip_entry_critical_section = true;
        self.skip_exit_critical_section = true;
        self
    }

    pub const fn skip_address_frame(mut self) -> Self {
        self.skip_address_frame = true;
        self
    }

    pub const fn reset_indices(mut self) -> Self {
        self.reset_tx_index = true;
        self.reset_rx_index = true;
        self
    }

    pub const fn ack_final_byte(mut self) -> Self {
        self.ack_final_byte = true;
        self
    }

    /// Options for continuing a transfer on a bus this device still holds
    pub const fn continuation() -> Self {
        Self::new().skip_start().skip_address_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_all_false() {
        assert_eq!(TransferOptions::new(), TransferOptions::default());
        let opts = TransferOptions::default();
        assert!(!opts.skip_start && !opts.skip_stop && !opts.ack_final_byte);
    }

    #[test]
    fn test_builders() {
        let opts = TransferOptions::continuation().skip_stop();
        assert!(opts.skip_start);
        assert!(opts.skip_address_frame);
        assert!(opts.skip_stop);
        assert!(!opts.reset_tx_index);

        let opts = TransferOptions::new().skip_critical_sections().reset_indices();
        assert!(opts.skip_entry_critical_section && opts.skip_exit_critical_section);
        assert!(opts.reset_tx_index && opts.reset_rx_index);
    }
}
