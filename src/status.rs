use crate::registers::{ModeReg, StatusReg};
use serde::{Deserialize, Serialize};

/// Operating mode of the controller
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Reset mode, required for changing the configuration
    Reset,
    /// Operating mode with the given sub modes
    Operating(SubModes),
}

impl Mode {
    /// Maps mode register values
    pub(crate) fn from_register(register: u8) -> Self {
        let mode = ModeReg::from(register);
        if mode.reset() {
            return Self::Reset;
        }

        Self::Operating(SubModes {
            listen_only: mode.listen_only(),
            self_test: mode.self_test(),
            sleep: mode.sleep(),
        })
    }
}

/// Optional sub modes of operating mode
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SubModes {
    /// No acknowledge and no error frames are sent, transmission is not possible
    pub listen_only: bool,

    /// Transmission succeeds without acknowledge, used with self reception requests
    pub self_test: bool,

    /// Controller sleeps until bus activity or an interrupt wakes it up
    pub sleep: bool,
}

/// Bus health classification
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BusState {
    /// Controller is in reset mode and does not participate on the bus
    #[default]
    Offline,
    /// Error counters below the warning limit
    ErrorActive,
    /// At least one error counter reached the warning limit
    ErrorWarning,
    /// At least one error counter reached 128
    ErrorPassive,
    /// Transmit error counter overflowed, controller disconnected from the bus.
    /// Recovery requires reset mode and operating mode to be entered again.
    BusOff,
}

/// Driver status flags, updated while handling interrupts
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ControllerStatus {
    pub(crate) initialized: bool,
    pub(crate) message_waiting: bool,
    pub(crate) transmit_busy: bool,
    pub(crate) data_overrun: bool,
    pub(crate) arbitration_lost: bool,
    pub(crate) bus_error: bool,
    pub(crate) bus_state: BusState,
}

impl ControllerStatus {
    /// Controller has been configured
    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// At least one received message is waiting in the receive buffer
    pub fn message_waiting(&self) -> bool {
        self.message_waiting
    }

    /// Controller participates on the bus
    pub fn bus_on(&self) -> bool {
        matches!(
            self.bus_state,
            BusState::ErrorActive | BusState::ErrorWarning | BusState::ErrorPassive
        )
    }

    /// Transmission requested and not yet completed
    pub fn transmit_busy(&self) -> bool {
        self.transmit_busy
    }

    /// At least one error counter reached the error warning limit
    pub fn error_warning(&self) -> bool {
        matches!(
            self.bus_state,
            BusState::ErrorWarning | BusState::ErrorPassive | BusState::BusOff
        )
    }

    /// Receive FIFO overrun, not yet acknowledged
    pub fn data_overrun(&self) -> bool {
        self.data_overrun
    }

    pub fn error_passive(&self) -> bool {
        self.bus_state == BusState::ErrorPassive
    }

    pub fn bus_off(&self) -> bool {
        self.bus_state == BusState::BusOff
    }

    /// Arbitration was lost since last call of [crate::can::Controller::clear_error_flags]
    pub fn arbitration_lost(&self) -> bool {
        self.arbitration_lost
    }

    /// Bus error was detected since last call of [crate::can::Controller::clear_error_flags]
    pub fn bus_error(&self) -> bool {
        self.bus_error
    }

    pub fn bus_state(&self) -> BusState {
        self.bus_state
    }
}

/// Status register
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HardwareStatus {
    /// Controller is bus-off
    pub bus_off: bool,

    /// At least one error counter reached the error warning limit
    pub error_status: bool,

    /// Controller is transmitting a message
    pub transmitting: bool,

    /// Controller is receiving a message
    pub receiving: bool,

    /// Last requested transmission completed successfully
    pub transmission_complete: bool,

    /// Transmit buffer is released and may be written
    pub transmit_buffer_released: bool,

    /// Message was lost because the receive FIFO was full
    pub data_overrun: bool,

    /// At least one message is available in the receive FIFO
    pub receive_buffer_full: bool,
}

impl HardwareStatus {
    pub(crate) fn from_register(register: u8) -> Self {
        let status = StatusReg::from(register);

        Self {
            bus_off: status.bus_off(),
            error_status: status.error_status(),
            transmitting: status.transmitting(),
            receiving: status.receiving(),
            transmission_complete: status.transmission_complete(),
            transmit_buffer_released: status.transmit_buffer_released(),
            data_overrun: status.data_overrun(),
            receive_buffer_full: status.receive_buffer_full(),
        }
    }
}

/// Interrupt register, also used as interrupt enable configuration
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interrupts {
    pub receive: bool,
    pub transmit: bool,
    pub error_warning: bool,
    pub data_overrun: bool,
    pub wake_up: bool,
    pub error_passive: bool,
    pub arbitration_lost: bool,
    pub bus_error: bool,
}

impl Interrupts {
    /// Every interrupt source except wake-up
    pub const fn all_except_wake_up() -> Self {
        Self {
            receive: true,
            transmit: true,
            error_warning: true,
            data_overrun: true,
            wake_up: false,
            error_passive: true,
            arbitration_lost: true,
            bus_error: true,
        }
    }

    pub(crate) fn from_register(register: u8) -> Self {
        Self {
            receive: register & 1 != 0,
            transmit: register & (1 << 1) != 0,
            error_warning: register & (1 << 2) != 0,
            data_overrun: register & (1 << 3) != 0,
            wake_up: register & (1 << 4) != 0,
            error_passive: register & (1 << 5) != 0,
            arbitration_lost: register & (1 << 6) != 0,
            bus_error: register & (1 << 7) != 0,
        }
    }

    pub(crate) fn as_register(&self) -> u8 {
        let mut register = 0x0;

        register |= self.receive as u8;
        register |= (self.transmit as u8) << 1;
        register |= (self.error_warning as u8) << 2;
        register |= (self.data_overrun as u8) << 3;
        register |= (self.wake_up as u8) << 4;
        register |= (self.error_passive as u8) << 5;
        register |= (self.arbitration_lost as u8) << 6;
        register |= (self.bus_error as u8) << 7;

        register
    }

    /// True if no interrupt is set
    pub fn is_empty(&self) -> bool {
        self.as_register() == 0
    }
}

/// Type of a bus error
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusErrorKind {
    Bit,
    Form,
    Stuff,
    Other,
}

/// Direction of the frame in which a bus error occurred
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Transmit,
    Receive,
}

/// Error code capture register
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ErrorCode {
    pub kind: BusErrorKind,
    pub direction: Direction,
    /// Frame segment code (e.g. 0x03 start of frame, 0x18 acknowledge slot)
    pub segment: u8,
}

impl ErrorCode {
    pub(crate) fn from_register(register: u8) -> Self {
        let kind = match register >> 6 {
            0b00 => BusErrorKind::Bit,
            0b01 => BusErrorKind::Form,
            0b10 => BusErrorKind::Stuff,
            _ => BusErrorKind::Other,
        };

        let direction = if register & (1 << 5) != 0 {
            Direction::Receive
        } else {
            Direction::Transmit
        };

        Self {
            kind,
            direction,
            segment: register & 0x1F,
        }
    }
}

/// Arbitration lost capture register
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArbitrationLost {
    /// Bit position within the arbitration field (0 => ID28)
    pub bit: u8,
}

impl ArbitrationLost {
    pub(crate) fn from_register(register: u8) -> Self {
        Self { bit: register & 0x1F }
    }
}

/// Receive and transmit error counters
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorCounters {
    pub receive: u8,
    pub transmit: u8,
}
