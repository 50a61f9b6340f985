//!# Error & status monitor
//! Single owner of [ControllerStatus]. Flags are only changed as reaction to register values
//! observed by the controller, mostly while handling interrupts.
//!
//! Bus state classification:
//!
//! | Condition                                           | State          |
//! |-----------------------------------------------------|----------------|
//! | bus status bit set or TX error counter == 255       | `BusOff`       |
//! | any error counter >= 128                            | `ErrorPassive` |
//! | any error counter >= error warning limit            | `ErrorWarning` |
//! | otherwise                                           | `ErrorActive`  |
use crate::config::DEFAULT_ERROR_WARNING_LIMIT;
use crate::status::{ArbitrationLost, BusState, ControllerStatus, ErrorCode, ErrorCounters, HardwareStatus};
use log::{debug, info, warn};

/// Error counter level of error passive state
pub const ERROR_PASSIVE_LIMIT: u8 = 128;

/// Transmit error counter level of bus-off state
pub const BUS_OFF_LIMIT: u8 = 255;

impl BusState {
    /// Classifies the bus state of a participating controller
    pub fn classify(bus_off: bool, counters: ErrorCounters, warning_limit: u8) -> Self {
        let max = counters.receive.max(counters.transmit);

        if bus_off || counters.transmit >= BUS_OFF_LIMIT {
            Self::BusOff
        } else if max >= ERROR_PASSIVE_LIMIT {
            Self::ErrorPassive
        } else if max >= warning_limit {
            Self::ErrorWarning
        } else {
            Self::ErrorActive
        }
    }
}

#[derive(Debug)]
pub(crate) struct StatusMonitor {
    status: ControllerStatus,
    warning_limit: u8,
    last_error_code: Option<ErrorCode>,
    last_arbitration_lost: Option<ArbitrationLost>,
}

impl Default for StatusMonitor {
    fn default() -> Self {
        Self {
            status: ControllerStatus::default(),
            warning_limit: DEFAULT_ERROR_WARNING_LIMIT,
            last_error_code: None,
            last_arbitration_lost: None,
        }
    }
}

impl StatusMonitor {
    pub fn status(&self) -> ControllerStatus {
        self.status
    }

    pub fn last_error_code(&self) -> Option<ErrorCode> {
        self.last_error_code
    }

    pub fn last_arbitration_lost(&self) -> Option<ArbitrationLost> {
        self.last_arbitration_lost
    }

    /// Configuration was written
    pub fn on_configured(&mut self, warning_limit: u8) {
        self.warning_limit = warning_limit;
        self.status.initialized = true;
    }

    /// Controller entered reset mode, which also clears the receive FIFO and the overrun status.
    /// Bus-off is kept until bus-on is observed again.
    pub fn on_reset_mode(&mut self) {
        self.status.transmit_busy = false;
        self.status.message_waiting = false;
        self.status.data_overrun = false;

        if self.status.bus_state != BusState::BusOff {
            self.status.bus_state = BusState::Offline;
        }
    }

    /// Bus-on was observed after leaving reset mode. Error counters survive reset mode.
    pub fn on_bus_on(&mut self, counters: ErrorCounters) {
        if self.status.bus_state == BusState::BusOff {
            info!("Bus-off recovery completed");
        }

        self.status.bus_state = BusState::classify(false, counters, self.warning_limit);
    }

    /// Error warning or error passive interrupt, returns the new bus state
    pub fn on_error_state(&mut self, hardware: HardwareStatus, counters: ErrorCounters) -> BusState {
        let state = BusState::classify(hardware.bus_off, counters, self.warning_limit);

        if state != self.status.bus_state {
            match state {
                BusState::BusOff => warn!("Controller is bus-off. Error counters: {counters:?}"),
                _ => debug!("Bus state changed to {state:?}. Error counters: {counters:?}"),
            }
        }

        if state == BusState::BusOff {
            // pending transmission is aborted by the controller
            self.status.transmit_busy = false;
        }

        self.status.bus_state = state;
        state
    }

    pub fn on_data_overrun(&mut self) {
        debug!("Receive FIFO overrun");
        self.status.data_overrun = true;
    }

    pub fn on_bus_error(&mut self, code: ErrorCode) {
        debug!("Bus error: {code:?}");
        self.status.bus_error = true;
        self.last_error_code = Some(code);
    }

    pub fn on_arbitration_lost(&mut self, capture: ArbitrationLost) {
        debug!("Arbitration lost at bit {}", capture.bit);
        self.status.arbitration_lost = true;
        self.last_arbitration_lost = Some(capture);
    }

    pub fn on_message_waiting(&mut self) {
        self.status.message_waiting = true;
    }

    /// Receive buffer was released, `pending` is true if another message follows
    pub fn on_receive_released(&mut self, pending: bool) {
        self.status.message_waiting = pending;
    }

    pub fn on_overrun_acknowledged(&mut self) {
        self.status.data_overrun = false;
    }

    pub fn on_transmit_requested(&mut self) {
        self.status.transmit_busy = true;
    }

    pub fn on_transmit_finished(&mut self) {
        self.status.transmit_busy = false;
    }

    /// Acknowledges arbitration lost and bus error flags
    pub fn clear_error_flags(&mut self) {
        self.status.arbitration_lost = false;
        self.status.bus_error = false;
        self.last_error_code = None;
        self.last_arbitration_lost = None;
    }
}
