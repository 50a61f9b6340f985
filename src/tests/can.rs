use crate::bus::BusError;
use crate::can::{interrupt_pending, ConfigError, Controller};
use crate::config::{ClockOutput, Configuration, OutputMode, PinConfiguration};
use crate::filter::{AcceptanceFilter, FilterMode};
use crate::mocks::{MockDelay, MockIntPin, MockPin, MockRegisters, TestClock};
use crate::registers::*;
use crate::status::{BusState, ErrorCounters, Mode, SubModes};
use crate::timing::BitRate;
use embedded_can::StandardId;
use mockall::predicate::eq;
use mockall::Sequence;

#[test]
fn test_enter_reset_mode_correct() {
    let clock = TestClock::new(vec![
        100, // Timer start
        200, // First expiration check
    ]);

    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();

    // Request reset mode, dual filter after power-up
    mocks.mock_write(MODE, 0x01, &mut seq);
    // Not yet confirmed
    mocks.mock_read(MODE, 0x00, &mut seq);
    // Confirmed
    mocks.mock_read(MODE, 0x01, &mut seq);

    let mut controller = mocks.into_operating(SubModes::default());
    controller.enter_reset_mode(&clock).unwrap();

    assert_eq!(Mode::Reset, controller.mode());
    assert_eq!(BusState::Offline, controller.status().bus_state());
    assert!(!controller.status().bus_on());
}

#[test]
fn test_enter_reset_mode_timeout() {
    let clock = TestClock::new(vec![
        100,   // Timer start
        200,   // First expiration check
        2_200, // Second expiration check
    ]);

    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();

    mocks.mock_write(MODE, 0x01, &mut seq);
    mocks.mock_read(MODE, 0x00, &mut seq);
    mocks.mock_read(MODE, 0x00, &mut seq);

    let mut controller = mocks.into_operating(SubModes::default());
    assert_eq!(
        ConfigError::ResetModeTimeout,
        controller.enter_reset_mode(&clock).unwrap_err()
    );
    assert_eq!(Mode::Operating(SubModes::default()), controller.mode());
}

#[test]
fn test_enter_reset_mode_clock_error() {
    let clock = TestClock::new(vec![]);

    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();
    mocks.mock_write(MODE, 0x01, &mut seq);

    let mut controller = mocks.into_controller();
    assert_eq!(ConfigError::ClockError, controller.enter_reset_mode(&clock).unwrap_err());
}

#[test]
fn test_enter_reset_mode_transfer_error() {
    let clock = TestClock::new(vec![100]);

    let mut mocks = Mocks::default();
    mocks.mock_transfer_error();

    let mut controller = mocks.into_controller();
    assert_eq!(
        ConfigError::BusError(BusError::DeviceNotResponding(55)),
        controller.enter_reset_mode(&clock).unwrap_err()
    );
}

#[test]
fn test_configure_correct() {
    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();

    mocks.mock_read(MODE, 0x01, &mut seq);
    // Clock divider, PeliCAN mode & CLKOUT f/2
    mocks.mock_write(CLOCK_DIVIDER, 0x80, &mut seq);
    // All interrupts except wake-up
    mocks.mock_write(INTERRUPT_ENABLE, 0xEF, &mut seq);
    mocks.mock_block_write(ACCEPTANCE_CODE, &[0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF], &mut seq);
    // Reset mode & single filter
    mocks.mock_write(MODE, 0x09, &mut seq);
    mocks.mock_write(BUS_TIMING_0, 0x00, &mut seq);
    mocks.mock_write(BUS_TIMING_1, 0x1C, &mut seq);
    mocks.mock_write(OUTPUT_CONTROL, 0x1A, &mut seq);
    mocks.mock_write(ERROR_WARNING_LIMIT, 96, &mut seq);

    let mut controller = mocks.into_controller();
    controller.configure(&Configuration::default()).unwrap();

    assert!(controller.status().initialized());
    assert_eq!(Mode::Reset, controller.mode());
}

#[test]
fn test_configure_custom() {
    let config = Configuration {
        timing: BitRate::Kbps125.timing(),
        filter: AcceptanceFilter::standard(StandardId::new(0x120).unwrap(), 0x7F0).unwrap(),
        clock_divider: crate::config::ClockDivider {
            clock_output: ClockOutput::Off,
            comparator_bypass: true,
            rx_interrupt_output: false,
        },
        error_warning_limit: 110,
        ..Default::default()
    };

    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();

    mocks.mock_read(MODE, 0x01, &mut seq);
    mocks.mock_write(CLOCK_DIVIDER, 0xC8, &mut seq);
    mocks.mock_write(INTERRUPT_ENABLE, 0xEF, &mut seq);
    mocks.mock_block_write(ACCEPTANCE_CODE, &[0x24, 0x00, 0x00, 0x00, 0x01, 0xFF, 0xFF, 0xFF], &mut seq);
    mocks.mock_write(MODE, 0x09, &mut seq);
    mocks.mock_write(BUS_TIMING_0, 0x03, &mut seq);
    mocks.mock_write(BUS_TIMING_1, 0x1C, &mut seq);
    mocks.mock_write(OUTPUT_CONTROL, 0x1A, &mut seq);
    mocks.mock_write(ERROR_WARNING_LIMIT, 110, &mut seq);

    let mut controller = mocks.into_controller();
    controller.configure(&config).unwrap();
}

#[test]
fn test_configure_dual_filter() {
    let config = Configuration {
        filter: AcceptanceFilter::from_raw(FilterMode::Dual, [0x11, 0x22, 0x33, 0x44], [0x0F; 4]),
        ..Default::default()
    };

    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();
    mocks.mock_configure(&config, &mut seq);

    let mut controller = mocks.into_controller();
    controller.configure(&config).unwrap();
}

#[test]
fn test_configure_not_in_reset_mode() {
    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();
    mocks.mock_read(MODE, 0x08, &mut seq);

    let mut controller = mocks.into_controller();
    assert_eq!(
        ConfigError::NotInResetMode,
        controller.configure(&Configuration::default()).unwrap_err()
    );
    assert!(!controller.status().initialized());
}

#[test]
fn test_configure_transfer_error() {
    let mut mocks = Mocks::default();
    mocks.mock_transfer_error();

    let mut controller = mocks.into_controller();
    assert_eq!(
        ConfigError::BusError(BusError::DeviceNotResponding(55)),
        controller.configure(&Configuration::default()).unwrap_err()
    );
}

#[test]
fn test_configure_cs_error() {
    let mut mocks = Mocks::default();
    mocks.mock_cs_error();

    let mut controller = mocks.into_controller();
    assert_eq!(
        ConfigError::BusError(BusError::CSError(21)),
        controller.configure(&Configuration::default()).unwrap_err()
    );
}

#[test]
fn test_enter_operating_mode_not_configured() {
    let clock = TestClock::new(vec![]);
    let mut controller = Mocks::default().into_controller();

    assert_eq!(
        ConfigError::NotConfigured,
        controller.enter_operating_mode(SubModes::default(), &clock).unwrap_err()
    );
}

#[test]
fn test_enter_operating_mode_correct() {
    let clock = TestClock::new(vec![
        100, // Timer start
        200, // First expiration check
    ]);

    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();
    mocks.mock_configure(&Configuration::default(), &mut seq);

    // Single filter, all mode bits cleared
    mocks.mock_write(MODE, 0x08, &mut seq);
    // Still bus-off
    mocks.mock_read(MODE, 0x08, &mut seq);
    mocks.mock_read(STATUS, 0x8C, &mut seq);
    // Bus-on
    mocks.mock_read(MODE, 0x08, &mut seq);
    mocks.mock_read(STATUS, 0x0C, &mut seq);
    mocks.mock_block_read(RX_ERROR_COUNTER, &[0, 0], &mut seq);

    let mut controller = mocks.into_controller();
    controller.configure(&Configuration::default()).unwrap();
    controller.enter_operating_mode(SubModes::default(), &clock).unwrap();

    assert_eq!(Mode::Operating(SubModes::default()), controller.mode());
    assert_eq!(BusState::ErrorActive, controller.status().bus_state());
    assert!(controller.status().bus_on());
}

#[test]
fn test_enter_operating_mode_sub_modes() {
    let clock = TestClock::new(vec![100]);
    let sub_modes = SubModes {
        listen_only: true,
        self_test: true,
        sleep: false,
    };

    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();
    mocks.mock_configure(&Configuration::default(), &mut seq);
    mocks.mock_bus_on_with_counters(0x0E, 0x4C, [100, 0], &mut seq);

    let mut controller = mocks.into_controller();
    controller.configure(&Configuration::default()).unwrap();
    controller.enter_operating_mode(sub_modes, &clock).unwrap();

    assert_eq!(Mode::Operating(sub_modes), controller.mode());
    assert_eq!(BusState::ErrorWarning, controller.status().bus_state());
}

#[test]
fn test_enter_operating_mode_keeps_error_passive() {
    let clock = TestClock::new(vec![
        100, // Reset mode: Timer start
        200, // Operating mode: Timer start
    ]);

    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();

    // Error passive interrupt
    mocks.mock_read(INTERRUPT, 0x20, &mut seq);
    mocks.mock_read(STATUS, 0x4C, &mut seq);
    mocks.mock_block_read(RX_ERROR_COUNTER, &[0, 130], &mut seq);

    // Re-entering operating mode, e.g. for changing the bit rate
    mocks.mock_write(MODE, 0x01, &mut seq);
    mocks.mock_read(MODE, 0x01, &mut seq);
    // TX error counter is kept in reset mode
    mocks.mock_bus_on_with_counters(0x00, 0x4C, [0, 130], &mut seq);

    let mut controller = mocks.into_operating(SubModes::default());
    controller.handle_interrupt().unwrap();
    assert!(controller.status().error_passive());

    controller.enter_reset_mode(&clock).unwrap();
    assert_eq!(BusState::Offline, controller.status().bus_state());

    controller.enter_operating_mode(SubModes::default(), &clock).unwrap();
    assert_eq!(BusState::ErrorPassive, controller.status().bus_state());
    assert!(controller.status().error_passive());
}

#[test]
fn test_enter_reset_mode_clears_receive_status() {
    let clock = TestClock::new(vec![100]);

    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();

    // Receive & data overrun interrupt
    mocks.mock_read(INTERRUPT, 0x09, &mut seq);
    mocks.mock_write(MODE, 0x01, &mut seq);
    mocks.mock_read(MODE, 0x01, &mut seq);

    let mut controller = mocks.into_operating(SubModes::default());
    controller.handle_interrupt().unwrap();
    assert!(controller.status().message_waiting());
    assert!(controller.status().data_overrun());

    controller.enter_reset_mode(&clock).unwrap();
    assert!(!controller.status().message_waiting());
    assert!(!controller.status().data_overrun());

    assert_eq!(None, controller.try_receive().unwrap());
    assert!(!controller.status().message_waiting());
}

#[test]
fn test_enter_operating_mode_timeout() {
    let clock = TestClock::new(vec![
        100,     // Timer start
        200,     // First expiration check
        600_000, // Second expiration check
    ]);

    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();
    mocks.mock_configure(&Configuration::default(), &mut seq);

    mocks.mock_write(MODE, 0x08, &mut seq);
    // Reset request still set
    mocks.mock_read(MODE, 0x09, &mut seq);
    // Bus-off
    mocks.mock_read(MODE, 0x08, &mut seq);
    mocks.mock_read(STATUS, 0x80, &mut seq);

    let mut controller = mocks.into_controller();
    controller.configure(&Configuration::default()).unwrap();

    assert_eq!(
        ConfigError::ModeTransitionTimeout,
        controller.enter_operating_mode(SubModes::default(), &clock).unwrap_err()
    );
    assert_eq!(Mode::Reset, controller.mode());
}

#[test]
fn test_initialize_correct() {
    let clock = TestClock::new(vec![
        100,   // Reset mode: Timer start
        1_000, // Operating mode: Timer start
    ]);

    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();

    mocks.mock_write(MODE, 0x01, &mut seq);
    mocks.mock_read(MODE, 0x01, &mut seq);
    mocks.mock_configure(&Configuration::default(), &mut seq);
    mocks.mock_bus_on(0x08, 0x0C, &mut seq);

    let mut controller = mocks.into_controller();
    controller
        .initialize(&Configuration::default(), SubModes::default(), &clock)
        .unwrap();

    assert!(controller.status().initialized());
    assert!(controller.status().bus_on());
}

#[test]
fn test_read_mode() {
    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();
    mocks.mock_read(MODE, 0x01, &mut seq);
    mocks.mock_read(MODE, 0x1A, &mut seq);

    let mut controller = mocks.into_controller();
    assert_eq!(Mode::Reset, controller.read_mode().unwrap());
    assert_eq!(
        Mode::Operating(SubModes {
            listen_only: true,
            self_test: false,
            sleep: true,
        }),
        controller.read_mode().unwrap()
    );
}

#[test]
fn test_read_mode_cs_error() {
    let mut mocks = Mocks::default();
    mocks.mock_cs_error();

    let mut controller = mocks.into_controller();
    assert_eq!(BusError::CSError(21), controller.read_mode().unwrap_err());
}

#[test]
fn test_read_status() {
    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();
    mocks.mock_read(STATUS, 0b1100_1101, &mut seq);

    let status = mocks.into_controller().read_status().unwrap();
    assert!(status.bus_off);
    assert!(status.error_status);
    assert!(!status.transmitting);
    assert!(!status.receiving);
    assert!(status.transmission_complete);
    assert!(status.transmit_buffer_released);
    assert!(!status.data_overrun);
    assert!(status.receive_buffer_full);
}

#[test]
fn test_read_status_transfer_error() {
    let mut mocks = Mocks::default();
    mocks.mock_transfer_error();

    let mut controller = mocks.into_controller();
    assert_eq!(BusError::DeviceNotResponding(55), controller.read_status().unwrap_err());
}

#[test]
fn test_read_error_counters() {
    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();
    mocks.mock_block_read(RX_ERROR_COUNTER, &[3, 200], &mut seq);

    let mut controller = mocks.into_controller();
    assert_eq!(
        ErrorCounters {
            receive: 3,
            transmit: 200,
        },
        controller.read_error_counters().unwrap()
    );
}

#[test]
fn test_read_output_control() {
    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();
    mocks.mock_read(OUTPUT_CONTROL, 0b1010_1101, &mut seq);

    let output = mocks.into_controller().read_output_control().unwrap();
    assert_eq!(OutputMode::Test, output.mode);
    assert_eq!(PinConfiguration::PullDown, output.tx0);
    assert!(output.tx0_inverted);
    assert_eq!(PinConfiguration::PullUp, output.tx1);
    assert!(output.tx1_inverted);
}

#[test]
fn test_read_clock_divider() {
    let mut mocks = Mocks::default();
    let mut seq = Sequence::new();
    mocks.mock_read(CLOCK_DIVIDER, 0b1010_0011, &mut seq);

    let divider = mocks.into_controller().read_clock_divider().unwrap();
    assert_eq!(ClockOutput::DivideBy8, divider.clock_output);
    assert!(!divider.comparator_bypass);
    assert!(divider.rx_interrupt_output);
}

#[test]
fn test_hardware_reset() {
    let mut seq = Sequence::new();

    let mut pin_reset = MockPin::new();
    let mut delay = MockDelay::new();
    pin_reset.expect_set_low().times(1).return_const(Ok(())).in_sequence(&mut seq);
    delay.expect_delay_us().with(eq(100)).times(1).return_const(()).in_sequence(&mut seq);
    pin_reset.expect_set_high().times(1).return_const(Ok(())).in_sequence(&mut seq);

    let mut controller = Mocks::default().into_operating(SubModes::default());
    controller.hardware_reset(&mut pin_reset, &mut delay).unwrap();

    assert_eq!(Mode::Reset, controller.mode());
    assert!(!controller.status().initialized());
    assert_eq!(BusState::Offline, controller.status().bus_state());
}

#[test]
fn test_hardware_reset_pin_error() {
    let mut pin_reset = MockPin::new();
    let mut delay = MockDelay::new();
    pin_reset.expect_set_low().times(1).return_const(Err(7));

    let mut controller = Mocks::default().into_operating(SubModes::default());
    assert_eq!(7, controller.hardware_reset(&mut pin_reset, &mut delay).unwrap_err());
    assert!(controller.status().initialized());
}

#[test]
fn test_interrupt_pending() {
    let mut pin_int = MockIntPin::new();
    pin_int.expect_is_low().times(1).return_const(Ok(true));
    pin_int.expect_is_low().times(1).return_const(Ok(false));

    assert!(interrupt_pending(&pin_int).unwrap());
    assert!(!interrupt_pending(&pin_int).unwrap());
}

#[test]
fn test_release() {
    let (mut bus, mut pin_cs) = Mocks::default().into_controller().release();
    bus.checkpoint();
    pin_cs.checkpoint();
}

#[derive(Default)]
pub(crate) struct Mocks {
    pub bus: MockRegisters,
    pub pin_cs: MockPin,
}

impl Mocks {
    pub fn into_controller(self) -> Controller<MockRegisters, MockPin, TestClock> {
        Controller::new(self.bus, self.pin_cs)
    }

    /// Configured controller in operating mode, dual filter mode
    pub fn into_operating(self, sub_modes: SubModes) -> Controller<MockRegisters, MockPin, TestClock> {
        self.into_controller().into_operating(sub_modes)
    }

    /// Simulates a register access fault
    pub fn mock_transfer_error(&mut self) {
        self.pin_cs.expect_set_low().times(1).return_const(Ok(()));
        self.bus.expect_read().times(..=1).return_const(Err(55));
        self.bus.expect_write().times(..=1).return_const(Err(55));
        self.pin_cs.expect_set_high().times(1).return_const(Ok(()));
    }

    /// Simulates a CS pin set error
    pub fn mock_cs_error(&mut self) {
        self.pin_cs.expect_set_low().times(1).return_const(Err(21));
    }

    pub fn mock_select(&mut self, seq: &mut Sequence) {
        self.pin_cs.expect_set_low().times(1).return_const(Ok(())).in_sequence(seq);
    }

    pub fn mock_deselect(&mut self, seq: &mut Sequence) {
        self.pin_cs.expect_set_high().times(1).return_const(Ok(())).in_sequence(seq);
    }

    /// Register read without chip select handling
    pub fn mock_bus_read(&mut self, offset: u8, value: u8, seq: &mut Sequence) {
        self.bus
            .expect_read()
            .with(eq(offset))
            .times(1)
            .return_const(Ok(value))
            .in_sequence(seq);
    }

    /// Register write without chip select handling
    pub fn mock_bus_write(&mut self, offset: u8, value: u8, seq: &mut Sequence) {
        self.bus
            .expect_write()
            .with(eq(offset), eq(value))
            .times(1)
            .return_const(Ok(()))
            .in_sequence(seq);
    }

    /// Mocks the reading of a single register
    pub fn mock_read(&mut self, offset: u8, value: u8, seq: &mut Sequence) {
        self.mock_select(seq);
        self.mock_bus_read(offset, value, seq);
        self.mock_deselect(seq);
    }

    /// Mocks the writing of a single register
    pub fn mock_write(&mut self, offset: u8, value: u8, seq: &mut Sequence) {
        self.mock_select(seq);
        self.mock_bus_write(offset, value, seq);
        self.mock_deselect(seq);
    }

    /// Mocks consecutive reads within one transaction
    pub fn mock_block_read(&mut self, offset: u8, values: &[u8], seq: &mut Sequence) {
        self.mock_select(seq);
        for (register, value) in (offset..).zip(values.iter()) {
            self.mock_bus_read(register, *value, seq);
        }
        self.mock_deselect(seq);
    }

    /// Mocks consecutive writes within one transaction
    pub fn mock_block_write(&mut self, offset: u8, values: &[u8], seq: &mut Sequence) {
        self.mock_select(seq);
        for (register, value) in (offset..).zip(values.iter()) {
            self.mock_bus_write(register, *value, seq);
        }
        self.mock_deselect(seq);
    }

    /// Mocks all register accesses of [Controller::configure]
    pub fn mock_configure(&mut self, config: &Configuration, seq: &mut Sequence) {
        let mut acceptance = config.filter.code().to_vec();
        acceptance.extend_from_slice(&config.filter.mask());

        let mode = match config.filter.mode() {
            FilterMode::Single => 0x09,
            FilterMode::Dual => 0x01,
        };

        self.mock_read(MODE, 0x01, seq);
        self.mock_write(CLOCK_DIVIDER, config.clock_divider.as_register(), seq);
        self.mock_write(INTERRUPT_ENABLE, config.interrupts.as_register(), seq);
        self.mock_block_write(ACCEPTANCE_CODE, &acceptance, seq);
        self.mock_write(MODE, mode, seq);
        self.mock_write(BUS_TIMING_0, config.timing.btr0, seq);
        self.mock_write(BUS_TIMING_1, config.timing.btr1, seq);
        self.mock_write(OUTPUT_CONTROL, config.output.as_register(), seq);
        self.mock_write(ERROR_WARNING_LIMIT, config.error_warning_limit, seq);
    }

    /// Mocks an operating mode request which is confirmed immediately
    pub fn mock_bus_on(&mut self, mode: u8, status: u8, seq: &mut Sequence) {
        self.mock_bus_on_with_counters(mode, status, [0, 0], seq);
    }

    /// Mocks the register accesses of [Controller::enter_operating_mode] incl. the error counters
    pub fn mock_bus_on_with_counters(&mut self, mode: u8, status: u8, counters: [u8; 2], seq: &mut Sequence) {
        self.mock_write(MODE, mode, seq);
        self.mock_read(MODE, mode, seq);
        self.mock_read(STATUS, status, seq);
        self.mock_block_read(RX_ERROR_COUNTER, &counters, seq);
    }
}
