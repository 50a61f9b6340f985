use super::Controller;
use crate::bus::{RegisterBus, WindowError};
use crate::frame::CanFrame;
use crate::registers::{ARBITRATION_LOST_CAPTURE, ERROR_CODE_CAPTURE, INTERRUPT, STATUS};
use crate::status::{ArbitrationLost, BusState, ControllerStatus, ErrorCode, HardwareStatus, Interrupts, Mode};
use embedded_hal::digital::v2::{InputPin, OutputPin};
use embedded_time::Clock;
use log::{debug, info};

/// Max. number of messages fitting into the 64 byte receive FIFO
const MAX_FIFO_MESSAGES: usize = 21;

/// Result of a requested transmission
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransmitOutcome {
    /// Frame was transmitted successfully
    Completed,
    /// Transmission was aborted (abort request, single shot failure or bus-off)
    Aborted,
}

/// Events observed while handling a single interrupt
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InterruptEvents {
    /// Interrupt register value, reading it acknowledged all sources except receive
    pub interrupts: Interrupts,

    /// Set if the transmit interrupt was raised
    pub transmit: Option<TransmitOutcome>,

    /// Captured error code of a bus error interrupt
    pub bus_error: Option<ErrorCode>,

    /// Captured bit position of an arbitration lost interrupt
    pub arbitration_lost: Option<ArbitrationLost>,

    /// New bus state after an error warning or error passive interrupt
    pub bus_state: Option<BusState>,

    /// Status flags were changed
    pub status_changed: bool,
}

/// Receives the events of [Controller::handle_interrupt_with]. All methods default to no-ops.
pub trait EventListener {
    /// Called for every message drained from the receive FIFO
    fn on_frame_received(&mut self, _frame: &CanFrame) {}

    /// Called once the requested transmission completed or was aborted
    fn on_transmit_complete(&mut self, _outcome: TransmitOutcome) {}

    /// Called if the status flags differ after handling the interrupt
    fn on_status_change(&mut self, _status: ControllerStatus) {}
}

/// True if the active low interrupt line is asserted
pub fn interrupt_pending<P: InputPin>(pin_int: &P) -> Result<bool, P::Error> {
    pin_int.is_low()
}

impl<B, CS, CLK> Controller<B, CS, CLK>
where
    B: RegisterBus,
    CS: OutputPin,
    CLK: Clock,
{
    /// Reads the interrupt register once and services all raised sources.
    /// Received messages are not read, they are signaled by the message waiting flag
    /// and fetched by [Controller::try_receive].
    pub fn handle_interrupt(&mut self) -> Result<InterruptEvents, WindowError<B, CS>> {
        let before = self.monitor.status();

        let interrupts = Interrupts::from_register(self.registers.read(INTERRUPT)?);
        let mut events = InterruptEvents {
            interrupts,
            ..Default::default()
        };

        if interrupts.data_overrun {
            self.monitor.on_data_overrun();
        }

        if interrupts.bus_error {
            let code = ErrorCode::from_register(self.registers.read(ERROR_CODE_CAPTURE)?);
            self.monitor.on_bus_error(code);
            events.bus_error = Some(code);
        }

        if interrupts.arbitration_lost {
            let capture = ArbitrationLost::from_register(self.registers.read(ARBITRATION_LOST_CAPTURE)?);
            self.monitor.on_arbitration_lost(capture);
            events.arbitration_lost = Some(capture);
        }

        if interrupts.error_warning || interrupts.error_passive {
            let hardware = HardwareStatus::from_register(self.registers.read(STATUS)?);
            let counters = self.read_error_counters()?;

            let state = self.monitor.on_error_state(hardware, counters);
            if state == BusState::BusOff {
                // controller enters reset mode by itself
                self.mode = Mode::Reset;
                self.monitor.on_reset_mode();
            }

            events.bus_state = Some(state);
        }

        // receive FIFO is cleared in reset mode
        if interrupts.receive && self.mode != Mode::Reset {
            self.monitor.on_message_waiting();
        }

        if interrupts.transmit {
            let hardware = HardwareStatus::from_register(self.registers.read(STATUS)?);
            let outcome = if hardware.transmission_complete {
                TransmitOutcome::Completed
            } else {
                debug!("Transmission aborted");
                TransmitOutcome::Aborted
            };

            self.monitor.on_transmit_finished();
            events.transmit = Some(outcome);
        }

        if interrupts.wake_up {
            info!("Controller woke up");

            if let Mode::Operating(ref mut sub_modes) = self.mode {
                sub_modes.sleep = false;
            }
        }

        events.status_changed = self.monitor.status() != before;
        Ok(events)
    }

    /// Handles the interrupt, drains the receive FIFO and forwards all events to the listener
    pub fn handle_interrupt_with<L: EventListener>(
        &mut self,
        listener: &mut L,
    ) -> Result<InterruptEvents, WindowError<B, CS>> {
        let before = self.monitor.status();
        let events = self.handle_interrupt()?;

        if let Some(outcome) = events.transmit {
            listener.on_transmit_complete(outcome);
        }

        for _ in 0..MAX_FIFO_MESSAGES {
            if !self.monitor.status().message_waiting() {
                break;
            }

            match self.try_receive()? {
                Some(frame) => listener.on_frame_received(&frame),
                None => break,
            }
        }

        let after = self.monitor.status();
        if after != before {
            listener.on_status_change(after);
        }

        Ok(events)
    }
}
