//!# Acceptance filter
//! The controller compares received identifiers against four acceptance code registers.
//! Acceptance mask bits mark "don't care" positions. The helper constructors take a mask
//! of bits which must match, like a typical identifier filter, and invert it.
//!
//! ```
//!# use sja1000::filter::AcceptanceFilter;
//!# use embedded_can::StandardId;
//!#
//! // Accept standard IDs 0x120..=0x12F
//! let filter = AcceptanceFilter::standard(StandardId::new(0x120).unwrap(), 0x7F0).unwrap();
//!
//! assert_eq!([0x24, 0x00, 0x00, 0x00], filter.code());
//! assert_eq!([0x01, 0xFF, 0xFF, 0xFF], filter.mask());
//! ```
use byteorder::{BigEndian, ByteOrder};
use embedded_can::{ExtendedId, StandardId};
use serde::{Deserialize, Serialize};

/// Acceptance filter mode
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    /// One 32 bit filter
    Single,
    /// Two shorter filters
    Dual,
}

/// Possible errors when creating an [AcceptanceFilter]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FilterError {
    /// Mask exceeds the identifier width
    InvalidMask(u32),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceFilter {
    mode: FilterMode,
    code: [u8; 4],
    mask: [u8; 4],
}

impl Default for AcceptanceFilter {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl AcceptanceFilter {
    /// Filter accepting every frame
    pub const fn accept_all() -> Self {
        Self {
            mode: FilterMode::Single,
            code: [0x0; 4],
            mask: [0xFF; 4],
        }
    }

    /// Filter from raw acceptance code and mask register values (mask bit set => don't care)
    pub const fn from_raw(mode: FilterMode, code: [u8; 4], mask: [u8; 4]) -> Self {
        Self { mode, code, mask }
    }

    /// Single filter for standard frames, set bits of `mask` must match `id`.
    /// RTR bit and data bytes are not compared.
    pub fn standard(id: StandardId, mask: u16) -> Result<Self, FilterError> {
        if mask > StandardId::MAX.as_raw() {
            return Err(FilterError::InvalidMask(mask as u32));
        }

        let mut filter = Self::accept_all();
        BigEndian::write_u16(&mut filter.code[..2], id.as_raw() << 5);
        BigEndian::write_u16(&mut filter.mask[..2], !(mask << 5));

        Ok(filter)
    }

    /// Single filter for extended frames, set bits of `mask` must match `id`.
    /// RTR bit is not compared.
    pub fn extended(id: ExtendedId, mask: u32) -> Result<Self, FilterError> {
        if mask > ExtendedId::MAX.as_raw() {
            return Err(FilterError::InvalidMask(mask));
        }

        let mut filter = Self::accept_all();
        BigEndian::write_u32(&mut filter.code, id.as_raw() << 3);
        BigEndian::write_u32(&mut filter.mask, !(mask << 3));

        Ok(filter)
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Acceptance code register values
    pub fn code(&self) -> [u8; 4] {
        self.code
    }

    /// Acceptance mask register values
    pub fn mask(&self) -> [u8; 4] {
        self.mask
    }
}
