#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]
#![allow(dead_code)]
#![allow(clippy::identity_op)]

//! # Library for SJA1000 stand-alone CAN controller
//!
//! Driver for the PeliCAN mode of the SJA1000. Crate currently offer the following features:
//! * CAN 2.0A and 2.0B frames (standard and extended IDs, remote frames)
//! * Fixed bus timing table for 5 kbit/s up to 1 Mbit/s (16 MHz oscillator)
//! * Single or dual acceptance filter
//! * Interrupt driven status tracking incl. error warning, error passive and bus-off
//! * Register access via memory mapped window or custom [bus::RegisterBus] implementations
//! * no_std support
//!
//!## CAN Tx/Rx example
//!
//!```
//!use sja1000::example::{ExampleClock, ExampleCSPin, ExampleRegisters};
//!use sja1000::can::Controller;
//!use sja1000::config::Configuration;
//!use sja1000::filter::AcceptanceFilter;
//!use sja1000::frame::CanFrame;
//!use sja1000::status::SubModes;
//!use sja1000::timing::BitRate;
//!use embedded_can::{Frame, StandardId};
//!
//!let cs_pin = ExampleCSPin{};
//!let registers = ExampleRegisters::default();
//!let clock = ExampleClock::default();
//!
//!let mut controller = Controller::new(registers, cs_pin);
//!
//! // Accept standard IDs 0x120..=0x12F only
//!let filter = AcceptanceFilter::standard(StandardId::new(0x120).unwrap(), 0x7F0).unwrap();
//!
//! // Configure CAN controller and join the bus
//!controller
//!    .initialize(
//!        &Configuration {
//!            timing: BitRate::Kbps125.timing(),
//!            filter,
//!            ..Default::default()
//!        },
//!        SubModes::default(),
//!        &clock,
//!    )
//!    .unwrap();
//!
//! // Create message frame
//!let frame = CanFrame::new(StandardId::new(0x123).unwrap(), &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
//!
//! // Transmit CAN message
//!controller.transmit(&frame).unwrap();
//!assert!(controller.status().transmit_busy());
//!assert_eq!(frame, controller.read_transmit_buffer().unwrap());
//!
//! // Nothing received
//!assert!(controller.try_receive().unwrap().is_none());
//!```

pub mod bus;
pub mod can;
pub mod config;
pub mod status;

pub mod filter;
pub mod frame;
pub mod message;
pub mod shared;
pub mod timing;

pub mod example;
#[cfg(test)]
pub(crate) mod mocks;
mod monitor;
pub mod registers;
#[cfg(test)]
mod tests;
