use super::Controller;
use crate::bus::{RegisterBus, WindowError};
use crate::frame::CanFrame;
use crate::message::FrameBuffer;
use crate::registers::{CommandReg, COMMAND, FRAME_BUFFER, RX_MESSAGE_COUNTER, STATUS};
use crate::status::{HardwareStatus, Mode};
use embedded_hal::digital::v2::OutputPin;
use embedded_time::Clock;

impl<B, CS, CLK> Controller<B, CS, CLK>
where
    B: RegisterBus,
    CS: OutputPin,
    CLK: Clock,
{
    /// Reads the next message of the receive FIFO and releases the receive buffer.
    /// Returns `None` if no message is available. A pending data overrun is acknowledged
    /// after the buffer was released.
    pub fn try_receive(&mut self) -> Result<Option<CanFrame>, WindowError<B, CS>> {
        if self.mode == Mode::Reset {
            return Ok(None);
        }

        let hardware = HardwareStatus::from_register(self.registers.read(STATUS)?);
        if hardware.data_overrun && !self.monitor.status().data_overrun() {
            self.monitor.on_data_overrun();
        }

        if !hardware.receive_buffer_full {
            self.monitor.on_receive_released(false);
            self.acknowledge_pending_overrun()?;
            return Ok(None);
        }

        let buffer = self
            .registers
            .transaction(|bus| FrameBuffer::read_from(bus, FRAME_BUFFER))?;
        let pending = self.registers.read(RX_MESSAGE_COUNTER)?;

        let command = CommandReg::new().with_release_receive_buffer(true);
        self.registers.write(COMMAND, command.into())?;
        self.monitor.on_receive_released(pending > 1);

        self.acknowledge_pending_overrun()?;
        Ok(Some(buffer.decode()))
    }

    /// Number of messages in the receive FIFO
    pub fn pending_messages(&mut self) -> Result<u8, WindowError<B, CS>> {
        self.registers.read(RX_MESSAGE_COUNTER)
    }

    /// Clears the data overrun status
    pub fn acknowledge_overrun(&mut self) -> Result<(), WindowError<B, CS>> {
        let command = CommandReg::new().with_clear_data_overrun(true);
        self.registers.write(COMMAND, command.into())?;

        self.monitor.on_overrun_acknowledged();
        Ok(())
    }

    fn acknowledge_pending_overrun(&mut self) -> Result<(), WindowError<B, CS>> {
        if self.monitor.status().data_overrun() {
            self.acknowledge_overrun()?;
        }

        Ok(())
    }
}
