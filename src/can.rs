//!# CAN Controller device
//!
//!```
//!# use sja1000::can::Controller;
//!# use sja1000::config::Configuration;
//!# use sja1000::example::*;
//!# use sja1000::status::{Mode, SubModes};
//!#
//! let clock = ExampleClock::default();
//!
//! // Initialize controller object
//! let mut controller = Controller::new(ExampleRegisters::default(), ExampleCSPin {});
//!
//! // Configuration registers are only writable in reset mode
//! controller.enter_reset_mode(&clock).unwrap();
//! controller.configure(&Configuration::default()).unwrap();
//!
//! // Join the bus
//! controller.enter_operating_mode(SubModes::default(), &clock).unwrap();
//! assert_eq!(Mode::Operating(SubModes::default()), controller.mode());
//! ```

mod interrupt;
mod receive;
mod transmit;

pub use interrupt::{interrupt_pending, EventListener, InterruptEvents, TransmitOutcome};

use crate::bus::{BusError, RegisterBus, RegisterWindow, WindowError};
use crate::config::{ClockDivider, Configuration, OutputControl, TransmissionMode};
use crate::filter::{FilterError, FilterMode};
use crate::frame::CanFrame;
use crate::monitor::StatusMonitor;
use crate::registers::{
    ModeReg, ACCEPTANCE_CODE, BUS_TIMING_0, BUS_TIMING_1, CLOCK_DIVIDER, ERROR_WARNING_LIMIT, INTERRUPT_ENABLE, MODE,
    OUTPUT_CONTROL, RX_ERROR_COUNTER, STATUS,
};
use crate::status::{ArbitrationLost, ControllerStatus, ErrorCode, ErrorCounters, HardwareStatus, Mode, SubModes};
use crate::timing::UnsupportedRate;
use core::marker::PhantomData;
use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::OutputPin;
use embedded_time::duration::Milliseconds;
use embedded_time::Clock;
use log::debug;

/// Max. time for the reset request to be confirmed
const RESET_MODE_TIMEOUT_MS: u32 = 2;

/// Low time of the hardware reset pulse
const RESET_PULSE_US: u16 = 100;

/// Possible errors during configuration and mode transitions
#[derive(Debug, PartialEq)]
pub enum ConfigError<B, CS> {
    /// Bit rate is not part of the timing table
    UnsupportedRate(u32),
    /// Acceptance filter could not be created
    InvalidFilter(FilterError),
    /// Configuration registers are only writable in reset mode
    NotInResetMode,
    /// Operating mode requested before configuration
    NotConfigured,
    /// Reset request was not confirmed within 2 ms
    ResetModeTimeout,
    /// Controller did not reach bus-on within the configured timeout
    ModeTransitionTimeout,
    /// Internal clock error
    ClockError,
    /// Register transaction failed
    BusError(BusError<B, CS>),
}

impl<B, CS> From<BusError<B, CS>> for ConfigError<B, CS> {
    fn from(value: BusError<B, CS>) -> Self {
        Self::BusError(value)
    }
}

impl<B, CS> From<UnsupportedRate> for ConfigError<B, CS> {
    fn from(value: UnsupportedRate) -> Self {
        Self::UnsupportedRate(value.0)
    }
}

impl<B, CS> From<FilterError> for ConfigError<B, CS> {
    fn from(value: FilterError) -> Self {
        Self::InvalidFilter(value)
    }
}

impl<B, CS> From<embedded_time::clock::Error> for ConfigError<B, CS> {
    fn from(_error: embedded_time::clock::Error) -> Self {
        Self::ClockError
    }
}

/// Possible errors when requesting a transmission
#[derive(Debug, PartialEq)]
pub enum TransmitError<B, CS> {
    /// Previous transmission not completed yet, retry later
    TransmitBusy,
    /// Controller is bus-off, reset mode and operating mode need to be entered again
    BusOff,
    /// Controller is in reset mode
    NotOperating,
    /// Transmission is not possible in listen only mode
    ListenOnly,
    /// Register transaction failed
    BusError(BusError<B, CS>),
}

impl<B, CS> From<BusError<B, CS>> for TransmitError<B, CS> {
    fn from(value: BusError<B, CS>) -> Self {
        Self::BusError(value)
    }
}

/// Main SJA1000 CAN controller device
pub struct Controller<B: RegisterBus, CS: OutputPin, CLK: Clock> {
    /// Register window incl. chip select
    registers: RegisterWindow<B, CS>,

    /// Owner of the status flags
    monitor: StatusMonitor,

    /// Last confirmed mode
    mode: Mode,

    /// Acceptance filter mode, kept in mode register writes
    filter_mode: FilterMode,

    transmission: TransmissionMode,

    bus_on_timeout_ms: u32,

    /// System clock
    clock: PhantomData<CLK>,
}

/// Trait for CAN controller
pub trait CanController {
    type BusError;
    type TransmitError;

    /// Requests transmission of the given frame, completion is reported asynchronously
    fn transmit(&mut self, frame: &CanFrame) -> Result<(), Self::TransmitError>;

    /// Requests abortion of a pending transmission
    fn abort(&mut self) -> Result<(), Self::BusError>;

    /// Returns the next received frame, if any. Never blocks.
    fn try_receive(&mut self) -> Result<Option<CanFrame>, Self::BusError>;
}

impl<B, CS, CLK> CanController for Controller<B, CS, CLK>
where
    B: RegisterBus,
    CS: OutputPin,
    CLK: Clock,
{
    type BusError = WindowError<B, CS>;
    type TransmitError = TransmitError<B::Error, CS::Error>;

    fn transmit(&mut self, frame: &CanFrame) -> Result<(), Self::TransmitError> {
        Controller::transmit(self, frame)
    }

    fn abort(&mut self) -> Result<(), Self::BusError> {
        Controller::abort(self)
    }

    fn try_receive(&mut self) -> Result<Option<CanFrame>, Self::BusError> {
        Controller::try_receive(self)
    }
}

impl<B, CS, CLK> Controller<B, CS, CLK>
where
    B: RegisterBus,
    CS: OutputPin,
    CLK: Clock,
{
    /// Creates a new controller. Hardware is expected to be in its reset state.
    pub fn new(bus: B, pin_cs: CS) -> Self {
        Self {
            registers: RegisterWindow::new(bus, pin_cs),
            monitor: StatusMonitor::default(),
            mode: Mode::Reset,
            filter_mode: FilterMode::Dual,
            transmission: TransmissionMode::Normal,
            bus_on_timeout_ms: Configuration::default().bus_on_timeout_ms,
            clock: Default::default(),
        }
    }

    /// Enters reset mode, configures the controller and enters operating mode
    pub fn initialize(
        &mut self,
        config: &Configuration,
        sub_modes: SubModes,
        clock: &CLK,
    ) -> Result<(), ConfigError<B::Error, CS::Error>> {
        self.enter_reset_mode(clock)?;
        self.configure(config)?;
        self.enter_operating_mode(sub_modes, clock)
    }

    /// Requests reset mode and waits max. 2 ms for confirmation.
    /// A pending transmission is aborted by the hardware.
    pub fn enter_reset_mode(&mut self, clock: &CLK) -> Result<(), ConfigError<B::Error, CS::Error>> {
        let request = self.mode_request().with_reset(true);
        self.registers.write(MODE, request.into())?;

        self.poll(clock, RESET_MODE_TIMEOUT_MS, ConfigError::ResetModeTimeout, |registers| {
            let mode = ModeReg::from(registers.read(MODE)?);
            Ok(mode.reset().then_some(()))
        })?;

        self.mode = Mode::Reset;
        self.monitor.on_reset_mode();
        Ok(())
    }

    /// Writes the given configuration. Controller needs to be in reset mode.
    pub fn configure(&mut self, config: &Configuration) -> Result<(), ConfigError<B::Error, CS::Error>> {
        let mode = ModeReg::from(self.registers.read(MODE)?);
        if !mode.reset() {
            return Err(ConfigError::NotInResetMode);
        }

        // Switches register layout to PeliCAN, so needs to be written first
        self.registers.write(CLOCK_DIVIDER, config.clock_divider.as_register())?;
        self.registers.write(INTERRUPT_ENABLE, config.interrupts.as_register())?;

        let mut acceptance = [0u8; 8];
        acceptance[..4].copy_from_slice(&config.filter.code());
        acceptance[4..].copy_from_slice(&config.filter.mask());
        self.registers.write_block(ACCEPTANCE_CODE, &acceptance)?;

        self.filter_mode = config.filter.mode();
        let request = self.mode_request().with_reset(true);
        self.registers.write(MODE, request.into())?;

        self.registers.write(BUS_TIMING_0, config.timing.btr0)?;
        self.registers.write(BUS_TIMING_1, config.timing.btr1)?;
        self.registers.write(OUTPUT_CONTROL, config.output.as_register())?;
        self.registers.write(ERROR_WARNING_LIMIT, config.error_warning_limit)?;

        self.transmission = config.transmission;
        self.bus_on_timeout_ms = config.bus_on_timeout_ms;
        self.monitor.on_configured(config.error_warning_limit);

        Ok(())
    }

    /// Leaves reset mode and waits until the controller is bus-on.
    /// Also used for recovery after bus-off. The bus state is classified by the error counters,
    /// which are kept in reset mode.
    ///
    /// Polling may take up to [Configuration::bus_on_timeout_ms]. When the controller is shared
    /// with an interrupt handler by [crate::shared::Shared], calling this inside
    /// [crate::shared::Shared::access] keeps interrupts masked for the whole time.
    pub fn enter_operating_mode(
        &mut self,
        sub_modes: SubModes,
        clock: &CLK,
    ) -> Result<(), ConfigError<B::Error, CS::Error>> {
        if !self.monitor.status().initialized() {
            return Err(ConfigError::NotConfigured);
        }

        let request = self
            .mode_request()
            .with_listen_only(sub_modes.listen_only)
            .with_self_test(sub_modes.self_test)
            .with_sleep(sub_modes.sleep);
        self.registers.write(MODE, request.into())?;

        self.poll(
            clock,
            self.bus_on_timeout_ms,
            ConfigError::ModeTransitionTimeout,
            |registers| {
                let mode = ModeReg::from(registers.read(MODE)?);
                if mode.reset() {
                    return Ok(None);
                }

                let status = HardwareStatus::from_register(registers.read(STATUS)?);
                Ok((!status.bus_off).then_some(()))
            },
        )?;

        let counters = self.read_error_counters()?;
        self.mode = Mode::Operating(sub_modes);
        self.monitor.on_bus_on(counters);
        Ok(())
    }

    /// Pulses the reset line and restores the state of a freshly created controller
    pub fn hardware_reset<P, D>(&mut self, pin_reset: &mut P, delay: &mut D) -> Result<(), P::Error>
    where
        P: OutputPin,
        D: DelayUs<u16>,
    {
        pin_reset.set_low()?;
        delay.delay_us(RESET_PULSE_US);
        pin_reset.set_high()?;

        self.monitor = StatusMonitor::default();
        self.mode = Mode::Reset;
        self.filter_mode = FilterMode::Dual;
        Ok(())
    }

    /// Returns a snapshot of the status flags
    pub fn status(&self) -> ControllerStatus {
        self.monitor.status()
    }

    /// Returns the last confirmed mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the error code captured by the last bus error interrupt
    pub fn last_error_code(&self) -> Option<ErrorCode> {
        self.monitor.last_error_code()
    }

    /// Returns the bit position captured by the last arbitration lost interrupt
    pub fn last_arbitration_lost(&self) -> Option<ArbitrationLost> {
        self.monitor.last_arbitration_lost()
    }

    /// Acknowledges arbitration lost and bus error flags
    pub fn clear_error_flags(&mut self) {
        self.monitor.clear_error_flags();
    }

    /// Reads and returns the mode register
    pub fn read_mode(&mut self) -> Result<Mode, WindowError<B, CS>> {
        let register = self.registers.read(MODE)?;

        Ok(Mode::from_register(register))
    }

    /// Reads and returns the status register
    pub fn read_status(&mut self) -> Result<HardwareStatus, WindowError<B, CS>> {
        let register = self.registers.read(STATUS)?;

        Ok(HardwareStatus::from_register(register))
    }

    /// Reads receive and transmit error counter
    pub fn read_error_counters(&mut self) -> Result<ErrorCounters, WindowError<B, CS>> {
        let mut counters = [0u8; 2];
        self.registers.read_block(RX_ERROR_COUNTER, &mut counters)?;

        Ok(ErrorCounters {
            receive: counters[0],
            transmit: counters[1],
        })
    }

    /// Reads and returns the current output control configuration
    pub fn read_output_control(&mut self) -> Result<OutputControl, WindowError<B, CS>> {
        let register = self.registers.read(OUTPUT_CONTROL)?;

        Ok(OutputControl::from_register(register))
    }

    /// Reads and returns the current clock divider configuration
    pub fn read_clock_divider(&mut self) -> Result<ClockDivider, WindowError<B, CS>> {
        let register = self.registers.read(CLOCK_DIVIDER)?;

        Ok(ClockDivider::from_register(register))
    }

    /// Returns register bus and chip select pin
    pub fn release(self) -> (B, CS) {
        self.registers.release()
    }

    /// Mode register value keeping the configured filter mode, all other bits cleared
    fn mode_request(&self) -> ModeReg {
        ModeReg::new().with_single_filter(self.filter_mode == FilterMode::Single)
    }

    /// Calls `reached` until it returns a value or the timeout expires
    fn poll<R, F>(
        &mut self,
        clock: &CLK,
        timeout_ms: u32,
        timeout_error: ConfigError<B::Error, CS::Error>,
        mut reached: F,
    ) -> Result<R, ConfigError<B::Error, CS::Error>>
    where
        F: FnMut(&mut RegisterWindow<B, CS>) -> Result<Option<R>, WindowError<B, CS>>,
    {
        let target = clock
            .try_now()?
            .checked_add(Milliseconds::new(timeout_ms))
            .ok_or(ConfigError::ClockError)?;

        loop {
            if let Some(result) = reached(&mut self.registers)? {
                return Ok(result);
            }

            if clock.try_now()? > target {
                debug!("Mode transition not confirmed within {timeout_ms} ms");
                return Err(timeout_error);
            }
        }
    }

    /// Test helper: operating mode without register accesses
    #[cfg(test)]
    pub(crate) fn into_operating(mut self, sub_modes: SubModes) -> Self {
        self.mode = Mode::Operating(sub_modes);
        self.monitor.on_configured(crate::config::DEFAULT_ERROR_WARNING_LIMIT);
        self.monitor.on_bus_on(ErrorCounters::default());
        self
    }
}
