use crate::bus::RegisterBus;
use core::cell::RefCell;
use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::{InputPin, OutputPin};
use embedded_time::clock::Error;
use embedded_time::duration::Duration;
use embedded_time::fixed_point::FixedPoint;
use embedded_time::fraction::Fraction;
use embedded_time::timer::param::{Armed, OneShot};
use embedded_time::{Clock, Instant, Timer};
use mockall::mock;

#[derive(Debug, PartialEq, Eq)]
pub struct TestClock {
    pub next_instants: RefCell<Vec<u64>>,
}

impl TestClock {
    pub fn new(next_instants: Vec<u64>) -> Self {
        Self {
            next_instants: RefCell::new(next_instants),
        }
    }
}

impl Clock for TestClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, Error> {
        if self.next_instants.borrow().len() == 0 {
            return Err(Error::Unspecified);
        }

        Ok(Instant::new(self.next_instants.borrow_mut().remove(0)))
    }

    fn new_timer<Dur>(&self, duration: Dur) -> Timer<OneShot, Armed, Self, Dur>
    where
        Dur: Duration + FixedPoint,
    {
        Timer::new(self, duration)
    }
}

mock! {
    pub Registers {}

    impl RegisterBus for Registers {
        type Error = u32;

        fn read(&mut self, offset: u8) -> Result<u8, u32>;
        fn write(&mut self, offset: u8, value: u8) -> Result<(), u32>;
    }
}

mock! {
    pub Pin {}

    impl OutputPin for Pin {
        type Error = u32;

        fn set_low(&mut self) -> Result<(), u32>;
        fn set_high(&mut self) -> Result<(), u32>;
    }
}

mock! {
    pub IntPin {}

    impl InputPin for IntPin {
        type Error = u32;

        fn is_high(&self) -> Result<bool, u32>;
        fn is_low(&self) -> Result<bool, u32>;
    }
}

mock! {
    pub Delay {}

    impl DelayUs<u16> for Delay {
        fn delay_us(&mut self, us: u16);
    }
}
