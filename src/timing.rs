//!# Bus timing
//! Fixed bus timing register pairs for the supported bit rates. The values are calculated
//! for a 16 MHz oscillator and are used as is, they are not derived at runtime.
//!
//! ```
//!# use sja1000::timing::{lookup, BitRate, TimingParameters, UnsupportedRate};
//!#
//! assert_eq!(TimingParameters::new(0x03, 0x1C), lookup(125_000).unwrap());
//! assert_eq!(BitRate::Kbps125.timing(), lookup(125_000).unwrap());
//! assert_eq!(Err(UnsupportedRate(42_000)), lookup(42_000));
//! ```
use crate::registers::{BusTiming0, BusTiming1};
use serde::{Deserialize, Serialize};

/// Oscillator frequency the timing table is calculated for
pub const OSCILLATOR_HZ: u32 = 16_000_000;

/// Requested bit rate is not part of the timing table
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UnsupportedRate(pub u32);

/// Values of the bus timing registers BTR0 and BTR1
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingParameters {
    pub btr0: u8,
    pub btr1: u8,
}

impl TimingParameters {
    pub const fn new(btr0: u8, btr1: u8) -> Self {
        Self { btr0, btr1 }
    }

    /// Resulting bit rate in bit/s for the given oscillator frequency
    pub fn bit_rate(&self, oscillator_hz: u32) -> u32 {
        let btr0 = BusTiming0::from(self.btr0);
        let btr1 = BusTiming1::from(self.btr1);

        let prescaler = 2 * (btr0.brp() as u32 + 1);
        // sync segment + TSEG1 + TSEG2
        let quanta = 1 + (btr1.tseg1() as u32 + 1) + (btr1.tseg2() as u32 + 1);

        oscillator_hz / (prescaler * quanta)
    }

    /// True if the bus is sampled three times per bit
    pub fn triple_sampling(&self) -> bool {
        BusTiming1::from(self.btr1).triple_sample()
    }
}

/// Supported nominal bit rates
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitRate {
    Kbps5,
    Kbps10,
    Kbps20,
    Kbps33,
    Kbps47,
    Kbps50,
    Kbps83,
    Kbps95,
    Kbps100,
    Kbps125,
    Kbps250,
    Kbps500,
    Kbps800,
    Mbps1,
}

impl Default for BitRate {
    fn default() -> Self {
        Self::Kbps500
    }
}

impl BitRate {
    pub const ALL: [BitRate; 14] = [
        Self::Kbps5,
        Self::Kbps10,
        Self::Kbps20,
        Self::Kbps33,
        Self::Kbps47,
        Self::Kbps50,
        Self::Kbps83,
        Self::Kbps95,
        Self::Kbps100,
        Self::Kbps125,
        Self::Kbps250,
        Self::Kbps500,
        Self::Kbps800,
        Self::Mbps1,
    ];

    /// Nominal bit rate in bit/s
    pub const fn bits_per_second(&self) -> u32 {
        match self {
            Self::Kbps5 => 5_000,
            Self::Kbps10 => 10_000,
            Self::Kbps20 => 20_000,
            Self::Kbps33 => 33_333,
            Self::Kbps47 => 47_619,
            Self::Kbps50 => 50_000,
            Self::Kbps83 => 83_333,
            Self::Kbps95 => 95_238,
            Self::Kbps100 => 100_000,
            Self::Kbps125 => 125_000,
            Self::Kbps250 => 250_000,
            Self::Kbps500 => 500_000,
            Self::Kbps800 => 800_000,
            Self::Mbps1 => 1_000_000,
        }
    }

    /// Bus timing register values
    pub const fn timing(&self) -> TimingParameters {
        match self {
            Self::Kbps5 => TimingParameters::new(0x7F, 0x7F),
            Self::Kbps10 => TimingParameters::new(0x67, 0x2F),
            Self::Kbps20 => TimingParameters::new(0x53, 0x2F),
            Self::Kbps33 => TIMING_33K,
            Self::Kbps47 => TimingParameters::new(0x14, 0x14),
            Self::Kbps50 => TimingParameters::new(0x47, 0x2F),
            Self::Kbps83 => TIMING_83K,
            Self::Kbps95 => TimingParameters::new(0xC3, 0x4E),
            Self::Kbps100 => TimingParameters::new(0x43, 0x2F),
            Self::Kbps125 => TimingParameters::new(0x03, 0x1C),
            Self::Kbps250 => TimingParameters::new(0x01, 0x1C),
            Self::Kbps500 => TimingParameters::new(0x00, 0x1C),
            Self::Kbps800 => TimingParameters::new(0x00, 0x16),
            Self::Mbps1 => TimingParameters::new(0x00, 0x14),
        }
    }
}

#[cfg(not(feature = "legacy-timing"))]
const TIMING_33K: TimingParameters = TimingParameters::new(0x8B, 0x2F);
#[cfg(not(feature = "legacy-timing"))]
const TIMING_83K: TimingParameters = TimingParameters::new(0x85, 0x2B);

#[cfg(feature = "legacy-timing")]
const TIMING_33K: TimingParameters = TimingParameters::new(0x1D, 0x14);
#[cfg(feature = "legacy-timing")]
const TIMING_83K: TimingParameters = TimingParameters::new(0x4B, 0x14);

impl From<BitRate> for TimingParameters {
    fn from(rate: BitRate) -> Self {
        rate.timing()
    }
}

impl TryFrom<u32> for BitRate {
    type Error = UnsupportedRate;

    fn try_from(bits_per_second: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .find(|rate| rate.bits_per_second() == bits_per_second)
            .copied()
            .ok_or(UnsupportedRate(bits_per_second))
    }
}

/// Returns the timing register values for the given nominal bit rate in bit/s
pub fn lookup(bits_per_second: u32) -> Result<TimingParameters, UnsupportedRate> {
    BitRate::try_from(bits_per_second).map(|rate| rate.timing())
}
