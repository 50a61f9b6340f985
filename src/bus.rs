//!# Register access
//! The controller is reached through a window of byte wide registers. [RegisterBus] abstracts
//! a single byte access at a window offset, [RegisterWindow] adds the chip select handling
//! around each transaction.
//!
//! For boards which map the controller into the external memory space of the MCU,
//! [MemoryMapped] provides volatile accesses relative to a base address:
//!
//! ```no_run
//!# use sja1000::bus::{MemoryMapped, RegisterWindow};
//!# use sja1000::example::ExampleCSPin;
//!#
//! // SAFETY: the controller is mapped at 0x1100 and this is the only handle to it
//! let bus = unsafe { MemoryMapped::new(0x1100) };
//! let mut window = RegisterWindow::new(bus, ExampleCSPin {});
//!
//! let mode = window.read(0).unwrap();
//! ```
use core::convert::Infallible;
use core::ptr;
use embedded_hal::digital::v2::OutputPin;

/// Byte access to the register window of the controller
pub trait RegisterBus {
    type Error;

    /// Reads the register at the given window offset
    fn read(&mut self, offset: u8) -> Result<u8, Self::Error>;

    /// Writes the register at the given window offset
    fn write(&mut self, offset: u8, value: u8) -> Result<(), Self::Error>;
}

/// Register window mapped into the address space of the MCU
#[derive(Debug)]
pub struct MemoryMapped {
    base: *mut u8,
}

impl MemoryMapped {
    /// Creates a new handle for the register window starting at `base`
    ///
    /// # Safety
    /// `base` must be the start address of the controller register window
    /// (at least 109 bytes, valid for volatile byte accesses) and no other
    /// handle to this window may exist.
    pub unsafe fn new(base: usize) -> Self {
        Self { base: base as *mut u8 }
    }
}

// Exclusive owner of the window, see `MemoryMapped::new`
unsafe impl Send for MemoryMapped {}

impl RegisterBus for MemoryMapped {
    type Error = Infallible;

    fn read(&mut self, offset: u8) -> Result<u8, Self::Error> {
        // SAFETY: window bounds are guaranteed by the caller of `new`
        Ok(unsafe { ptr::read_volatile(self.base.add(offset as usize)) })
    }

    fn write(&mut self, offset: u8, value: u8) -> Result<(), Self::Error> {
        // SAFETY: window bounds are guaranteed by the caller of `new`
        unsafe { ptr::write_volatile(self.base.add(offset as usize), value) };
        Ok(())
    }
}

/// Possible errors during register transactions
#[derive(Debug, PartialEq)]
pub enum BusError<B, CS> {
    /// Register access failed, device is not reachable
    DeviceNotResponding(B),
    /// Chip select pin could not be driven
    CSError(CS),
}

/// Register transaction error of the given bus and chip select pin
pub type WindowError<B, CS> = BusError<<B as RegisterBus>::Error, <CS as OutputPin>::Error>;

/// Register bus with active low chip select
pub struct RegisterWindow<B: RegisterBus, CS: OutputPin> {
    bus: B,
    pin_cs: CS,
}

impl<B: RegisterBus, CS: OutputPin> RegisterWindow<B, CS> {
    pub fn new(bus: B, pin_cs: CS) -> Self {
        Self { bus, pin_cs }
    }

    /// Selects the device, runs the given accesses and deselects the device again.
    /// Chip select is released even if an access failed.
    pub fn transaction<R, F>(&mut self, accesses: F) -> Result<R, WindowError<B, CS>>
    where
        F: FnOnce(&mut B) -> Result<R, B::Error>,
    {
        self.pin_cs.set_low().map_err(BusError::CSError)?;
        let result = accesses(&mut self.bus).map_err(BusError::DeviceNotResponding);
        self.pin_cs.set_high().map_err(BusError::CSError)?;

        result
    }

    /// Reads a single register
    pub fn read(&mut self, offset: u8) -> Result<u8, WindowError<B, CS>> {
        self.transaction(|bus| bus.read(offset))
    }

    /// Writes a single register
    pub fn write(&mut self, offset: u8, value: u8) -> Result<(), WindowError<B, CS>> {
        self.transaction(|bus| bus.write(offset, value))
    }

    /// Reads consecutive registers starting at `offset` within one transaction
    pub fn read_block(&mut self, offset: u8, buffer: &mut [u8]) -> Result<(), WindowError<B, CS>> {
        self.transaction(|bus| {
            for (register, value) in (offset..).zip(buffer.iter_mut()) {
                *value = bus.read(register)?;
            }

            Ok(())
        })
    }

    /// Writes consecutive registers starting at `offset` within one transaction
    pub fn write_block(&mut self, offset: u8, data: &[u8]) -> Result<(), WindowError<B, CS>> {
        self.transaction(|bus| {
            for (register, value) in (offset..).zip(data.iter()) {
                bus.write(register, *value)?;
            }

            Ok(())
        })
    }

    /// Returns bus and chip select pin
    pub fn release(self) -> (B, CS) {
        (self.bus, self.pin_cs)
    }
}
