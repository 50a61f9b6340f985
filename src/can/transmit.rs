use super::{Controller, TransmitError};
use crate::bus::{RegisterBus, WindowError};
use crate::config::TransmissionMode;
use crate::frame::CanFrame;
use crate::message::FrameBuffer;
use crate::registers::{CommandReg, COMMAND, FRAME_BUFFER, STATUS, TX_BUFFER_READBACK};
use crate::status::{HardwareStatus, Mode};
use embedded_hal::digital::v2::OutputPin;
use embedded_time::Clock;
use log::debug;

impl<B, CS, CLK> Controller<B, CS, CLK>
where
    B: RegisterBus,
    CS: OutputPin,
    CLK: Clock,
{
    /// Writes the frame to the transmit buffer and requests its transmission.
    /// Completion is signaled by the transmit interrupt, see [Controller::handle_interrupt].
    ///
    /// In self test mode a self reception request is issued instead, so the frame is received as well.
    pub fn transmit(&mut self, frame: &CanFrame) -> Result<(), TransmitError<B::Error, CS::Error>> {
        let status = self.monitor.status();
        if status.bus_off() {
            return Err(TransmitError::BusOff);
        }

        let sub_modes = match self.mode {
            Mode::Reset => return Err(TransmitError::NotOperating),
            Mode::Operating(sub_modes) => sub_modes,
        };

        if sub_modes.listen_only {
            return Err(TransmitError::ListenOnly);
        }

        if status.transmit_busy() {
            return Err(TransmitError::TransmitBusy);
        }

        let hardware = HardwareStatus::from_register(self.registers.read(STATUS)?);
        if !hardware.transmit_buffer_released {
            debug!("Transmit buffer locked by hardware");
            return Err(TransmitError::TransmitBusy);
        }

        let buffer = FrameBuffer::encode(frame);
        self.registers.write_block(FRAME_BUFFER, buffer.as_bytes())?;

        let command = CommandReg::new()
            .with_transmission_request(!sub_modes.self_test)
            .with_self_reception_request(sub_modes.self_test)
            .with_abort_transmission(self.transmission == TransmissionMode::SingleShot);

        self.monitor.on_transmit_requested();
        if let Err(error) = self.registers.write(COMMAND, command.into()) {
            self.monitor.on_transmit_finished();
            return Err(error.into());
        }

        Ok(())
    }

    /// Requests abortion of the pending transmission. A transmission already in
    /// progress is completed, the transmit interrupt reports the outcome.
    pub fn abort(&mut self) -> Result<(), WindowError<B, CS>> {
        let command = CommandReg::new().with_abort_transmission(true);

        self.registers.write(COMMAND, command.into())
    }

    /// Reads back the frame currently stored in the transmit buffer
    pub fn read_transmit_buffer(&mut self) -> Result<CanFrame, WindowError<B, CS>> {
        let buffer = self
            .registers
            .transaction(|bus| FrameBuffer::read_from(bus, TX_BUFFER_READBACK))?;

        Ok(buffer.decode())
    }
}
