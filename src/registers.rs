#![allow(unused_braces)]
use modular_bitfield_msb::prelude::*;

pub const MODE: u8 = 0;
pub const COMMAND: u8 = 1;
pub const STATUS: u8 = 2;
pub const INTERRUPT: u8 = 3;
pub const INTERRUPT_ENABLE: u8 = 4;
pub const BUS_TIMING_0: u8 = 6;
pub const BUS_TIMING_1: u8 = 7;
pub const OUTPUT_CONTROL: u8 = 8;
pub const ARBITRATION_LOST_CAPTURE: u8 = 11;
pub const ERROR_CODE_CAPTURE: u8 = 12;
pub const ERROR_WARNING_LIMIT: u8 = 13;
pub const RX_ERROR_COUNTER: u8 = 14;
pub const TX_ERROR_COUNTER: u8 = 15;

/// Acceptance code registers 0-3, only accessible in reset mode
pub const ACCEPTANCE_CODE: u8 = 16;
/// Acceptance mask registers 0-3, only accessible in reset mode
pub const ACCEPTANCE_MASK: u8 = 20;

/// Start of receive buffer (read) and transmit buffer (write) in operating mode
pub const FRAME_BUFFER: u8 = 16;
pub const RX_MESSAGE_COUNTER: u8 = 29;
pub const RX_BUFFER_START: u8 = 30;
pub const CLOCK_DIVIDER: u8 = 31;

/// Read-only shadow of the transmit buffer
pub const TX_BUFFER_READBACK: u8 = 96;

/// Frame info + 4 identifier bytes + 8 data bytes
pub const FRAME_BUFFER_LEN: usize = 13;

#[bitfield]
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
/// Mode register
pub struct ModeReg {
    #[skip]
    __: B3,
    /// Sleep mode bit
    pub sleep: bool,
    /// Acceptance filter mode bit, set => single filter
    pub single_filter: bool,
    /// Self test mode bit
    pub self_test: bool,
    /// Listen only mode bit
    pub listen_only: bool,
    /// Reset mode (request) bit
    pub reset: bool,
}

#[bitfield]
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
/// Status register, read only
pub struct StatusReg {
    /// Bus status bit
    pub bus_off: bool,
    /// Error status bit
    pub error_status: bool,
    /// Transmit status bit
    pub transmitting: bool,
    /// Receive status bit
    pub receiving: bool,
    /// Transmission complete status bit
    pub transmission_complete: bool,
    /// Transmit buffer status bit
    pub transmit_buffer_released: bool,
    /// Data overrun status bit
    pub data_overrun: bool,
    /// Receive buffer status bit
    pub receive_buffer_full: bool,
}

#[bitfield]
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
/// Command register, write only
pub struct CommandReg {
    #[skip]
    __: B3,
    /// Self reception request bit
    pub self_reception_request: bool,
    /// Clear data overrun bit
    pub clear_data_overrun: bool,
    /// Release receive buffer bit
    pub release_receive_buffer: bool,
    /// Abort transmission bit
    pub abort_transmission: bool,
    /// Transmission request bit
    pub transmission_request: bool,
}

#[bitfield]
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
/// First byte of receive/transmit buffer
pub struct FrameInfo {
    /// Frame format bit, set => extended frame format
    pub extended: bool,
    /// Remote transmission request bit
    pub remote: bool,
    #[skip]
    __: B2,
    /// Data length code
    pub dlc: B4,
}

#[bitfield]
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
/// Bus timing register 0
pub struct BusTiming0 {
    /// Synchronization jump width
    pub sjw: B2,
    /// Baud rate prescaler
    pub brp: B6,
}

#[bitfield]
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
/// Bus timing register 1
pub struct BusTiming1 {
    /// Sampling bit, set => bus is sampled three times
    pub triple_sample: bool,
    /// Time segment 2
    pub tseg2: B3,
    /// Time segment 1
    pub tseg1: B4,
}
