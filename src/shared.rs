//!# Interrupt safe sharing
//! The controller is usually accessed by the interrupt handler and the main loop.
//! [Shared] guards it with a critical section, so it may be placed in a `static`.
//!
//! ```
//!# use sja1000::can::Controller;
//!# use sja1000::example::*;
//!# use sja1000::shared::Shared;
//!#
//! type ExampleController = Controller<ExampleRegisters, ExampleCSPin, ExampleClock>;
//!
//! static CONTROLLER: Shared<Option<ExampleController>> = Shared::new(None);
//!
//! CONTROLLER.replace(Some(Controller::new(ExampleRegisters::default(), ExampleCSPin {})));
//!
//! let transmit_busy = CONTROLLER.access(|controller| controller.as_ref().map(|c| c.status().transmit_busy()));
//! assert_eq!(Some(false), transmit_busy);
//! ```
//!
//! [Shared::access] masks interrupts until the closure returns. Mode transitions poll the
//! controller for up to [crate::config::Configuration::bus_on_timeout_ms], so they are better
//! done before the controller is shared, or after taking it out again:
//!
//! ```
//!# use sja1000::can::Controller;
//!# use sja1000::config::Configuration;
//!# use sja1000::example::*;
//!# use sja1000::shared::Shared;
//!# use sja1000::status::SubModes;
//!#
//! type ExampleController = Controller<ExampleRegisters, ExampleCSPin, ExampleClock>;
//!
//! static CONTROLLER: Shared<Option<ExampleController>> = Shared::new(None);
//!
//! let clock = ExampleClock::default();
//! let mut controller = Controller::new(ExampleRegisters::default(), ExampleCSPin {});
//! controller
//!     .initialize(&Configuration::default(), SubModes::default(), &clock)
//!     .unwrap();
//!
//! // Short accesses only from here on
//! CONTROLLER.replace(Some(controller));
//! let bus_on = CONTROLLER.access(|controller| controller.as_ref().map(|c| c.status().bus_on()));
//! assert_eq!(Some(true), bus_on);
//!
//! // Bit rate change outside of the critical section
//! if let Some(mut controller) = CONTROLLER.replace(None) {
//!     controller.enter_reset_mode(&clock).unwrap();
//!     assert!(!controller.status().bus_on());
//!     CONTROLLER.replace(Some(controller));
//! }
//! ```
use core::cell::RefCell;
use critical_section::{with, Mutex};

pub struct Shared<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> Shared<T> {
    pub const fn new(inner: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(inner)),
        }
    }

    /// Exclusive mutable access to inner value
    pub fn access<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Replaces the inner value and returns the previous one
    pub fn replace(&self, value: T) -> T {
        with(|cs| self.inner.replace(cs, value))
    }
}

impl<T: Clone> Shared<T> {
    /// Returns a copy of the inner value
    pub fn clone_inner(&self) -> T {
        with(|cs| self.inner.borrow(cs).borrow().clone())
    }
}
