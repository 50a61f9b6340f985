//! # Dummy structures for doc examples
//!
//! [ExampleRegisters] emulates the register window of an idle controller on an idle bus:
//! mode requests are confirmed instantly, transmissions complete instantly and nothing is received.
use crate::bus::RegisterBus;
use crate::registers::{COMMAND, FRAME_BUFFER, FRAME_BUFFER_LEN, INTERRUPT, STATUS, TX_BUFFER_READBACK};
use core::cell::Cell;
use core::convert::Infallible;
use embedded_hal::digital::v2::OutputPin;
use embedded_time::clock::Error;
use embedded_time::duration::Duration;
use embedded_time::fixed_point::FixedPoint;
use embedded_time::fraction::Fraction;
use embedded_time::timer::param::{Armed, OneShot};
use embedded_time::{Clock, Instant, Timer};

/// Size of the emulated register window
const WINDOW_SIZE: usize = 128;

#[derive(Debug)]
pub struct ExampleRegisters {
    registers: [u8; WINDOW_SIZE],
}

impl Default for ExampleRegisters {
    fn default() -> Self {
        let mut registers = [0u8; WINDOW_SIZE];
        // reset mode after power-up
        registers[0] = 0x01;

        Self { registers }
    }
}

impl RegisterBus for ExampleRegisters {
    type Error = Infallible;

    fn read(&mut self, offset: u8) -> Result<u8, Self::Error> {
        Ok(match offset {
            // bus-on, transmit buffer released, transmission complete
            STATUS => 0x0C,
            INTERRUPT => 0x00,
            _ => self.registers[offset as usize % WINDOW_SIZE],
        })
    }

    fn write(&mut self, offset: u8, value: u8) -> Result<(), Self::Error> {
        let offset = offset as usize % WINDOW_SIZE;

        match offset {
            offset if offset == COMMAND as usize => {}
            offset if (FRAME_BUFFER as usize..FRAME_BUFFER as usize + FRAME_BUFFER_LEN).contains(&offset) => {
                self.registers[offset] = value;
                self.registers[offset - FRAME_BUFFER as usize + TX_BUFFER_READBACK as usize] = value;
            }
            _ => self.registers[offset] = value,
        }

        Ok(())
    }
}

pub struct ExampleCSPin {}

impl OutputPin for ExampleCSPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Clock advancing by 100 us on every call
#[derive(Debug, Default)]
pub struct ExampleClock {
    ticks: Cell<u64>,
}

impl Clock for ExampleClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, Error> {
        let now = self.ticks.get();
        self.ticks.set(now + 100);

        Ok(Instant::new(now))
    }

    fn new_timer<Dur: Duration + FixedPoint>(&self, duration: Dur) -> Timer<OneShot, Armed, Self, Dur> {
        Timer::new(self, duration)
    }
}
