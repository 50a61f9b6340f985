use crate::filter::AcceptanceFilter;
use crate::status::Interrupts;
use crate::timing::{BitRate, TimingParameters};
use serde::{Deserialize, Serialize};

/// Default error warning limit of the controller
pub const DEFAULT_ERROR_WARNING_LIMIT: u8 = 96;

/// Entire configuration applied in reset mode
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Bus timing register values, see [crate::timing]
    pub timing: TimingParameters,

    /// Acceptance code and mask
    pub filter: AcceptanceFilter,

    /// Output driver configuration
    pub output: OutputControl,

    /// CLKOUT and comparator configuration
    pub clock_divider: ClockDivider,

    /// Enabled interrupt sources
    pub interrupts: Interrupts,

    /// Error counter level for error warning state
    pub error_warning_limit: u8,

    /// Transmission request type
    pub transmission: TransmissionMode,

    /// Max. time for reaching bus-on after leaving reset mode. Bus-off recovery takes
    /// 128 * 11 recessive bits, so this should be long enough for the lowest bit rate in use.
    /// Interrupts stay masked while polling inside a critical section, see [crate::shared].
    pub bus_on_timeout_ms: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            timing: BitRate::default().timing(),
            filter: AcceptanceFilter::accept_all(),
            output: OutputControl::default(),
            clock_divider: ClockDivider::default(),
            interrupts: Interrupts::all_except_wake_up(),
            error_warning_limit: DEFAULT_ERROR_WARNING_LIMIT,
            transmission: TransmissionMode::Normal,
            bus_on_timeout_ms: 500,
        }
    }
}

/// Transmission request type
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransmissionMode {
    /// Controller retransmits until success
    Normal,
    /// No retransmission on error or lost arbitration
    SingleShot,
}

/// Output control register
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputControl {
    /// Output mode
    pub mode: OutputMode,

    /// TX0 driver configuration
    pub tx0: PinConfiguration,

    /// TX0 output polarity inverted
    pub tx0_inverted: bool,

    /// TX1 driver configuration
    pub tx1: PinConfiguration,

    /// TX1 output polarity inverted
    pub tx1_inverted: bool,
}

impl Default for OutputControl {
    /// Normal output mode, TX0 push/pull, TX1 floating
    fn default() -> Self {
        Self {
            mode: OutputMode::Normal,
            tx0: PinConfiguration::PushPull,
            tx0_inverted: false,
            tx1: PinConfiguration::Float,
            tx1_inverted: false,
        }
    }
}

impl OutputControl {
    /// Maps register values to configuration
    pub(crate) fn from_register(register: u8) -> Self {
        Self {
            mode: OutputMode::from_bits(register),
            tx0: PinConfiguration::from_bits(register >> 3),
            tx0_inverted: register & (1 << 2) != 0,
            tx1: PinConfiguration::from_bits(register >> 6),
            tx1_inverted: register & (1 << 5) != 0,
        }
    }

    /// Encodes the configuration to register byte
    pub(crate) fn as_register(&self) -> u8 {
        let mut register = 0x0;

        register |= (self.tx1 as u8) << 6;
        register |= (self.tx1_inverted as u8) << 5;
        register |= (self.tx0 as u8) << 3;
        register |= (self.tx0_inverted as u8) << 2;
        register |= self.mode as u8;

        register
    }
}

/// Output mode of TX0/TX1
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    BiPhase = 0b00,
    Test = 0b01,
    Normal = 0b10,
    Clock = 0b11,
}

impl OutputMode {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::BiPhase,
            0b01 => Self::Test,
            0b10 => Self::Normal,
            _ => Self::Clock,
        }
    }
}

/// Output driver configuration of a single transmit pin
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinConfiguration {
    Float = 0b00,
    PullDown = 0b01,
    PullUp = 0b10,
    PushPull = 0b11,
}

impl PinConfiguration {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Float,
            0b01 => Self::PullDown,
            0b10 => Self::PullUp,
            _ => Self::PushPull,
        }
    }
}

/// Clock divider register. The PeliCAN mode bit is always set.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockDivider {
    /// CLKOUT pin frequency
    pub clock_output: ClockOutput,

    /// Bypass the input comparator (external transceiver)
    pub comparator_bypass: bool,

    /// Use TX1 as dedicated receive interrupt output
    pub rx_interrupt_output: bool,
}

impl ClockDivider {
    /// Maps register values to configuration
    pub(crate) fn from_register(register: u8) -> Self {
        Self {
            clock_output: ClockOutput::from_register(register),
            comparator_bypass: register & (1 << 6) != 0,
            rx_interrupt_output: register & (1 << 5) != 0,
        }
    }

    /// Encodes the configuration to register byte
    pub(crate) fn as_register(&self) -> u8 {
        let mut register = 1 << 7;

        register |= (self.comparator_bypass as u8) << 6;
        register |= (self.rx_interrupt_output as u8) << 5;
        register |= self.clock_output.as_bits();

        register
    }
}

/// CLKOUT frequency relative to the oscillator
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockOutput {
    Off,
    DivideBy1,
    DivideBy2,
    DivideBy4,
    DivideBy6,
    DivideBy8,
    DivideBy10,
    DivideBy12,
    DivideBy14,
}

impl Default for ClockOutput {
    fn default() -> Self {
        Self::DivideBy2
    }
}

impl ClockOutput {
    fn from_register(register: u8) -> Self {
        if register & (1 << 3) != 0 {
            return Self::Off;
        }

        match register & 0b111 {
            0b000 => Self::DivideBy2,
            0b001 => Self::DivideBy4,
            0b010 => Self::DivideBy6,
            0b011 => Self::DivideBy8,
            0b100 => Self::DivideBy10,
            0b101 => Self::DivideBy12,
            0b110 => Self::DivideBy14,
            _ => Self::DivideBy1,
        }
    }

    /// Clock off bit and divider bits
    fn as_bits(&self) -> u8 {
        match self {
            Self::Off => 1 << 3,
            Self::DivideBy1 => 0b111,
            Self::DivideBy2 => 0b000,
            Self::DivideBy4 => 0b001,
            Self::DivideBy6 => 0b010,
            Self::DivideBy8 => 0b011,
            Self::DivideBy10 => 0b100,
            Self::DivideBy12 => 0b101,
            Self::DivideBy14 => 0b110,
        }
    }
}
