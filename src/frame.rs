//!# CAN frame
//! Classic CAN 2.0 frame with up to 8 data bytes, created via [embedded_can::Frame]:
//!
//! ```
//!# use sja1000::frame::CanFrame;
//!# use embedded_can::{Frame, StandardId};
//!#
//! let id = StandardId::new(0x123).unwrap();
//! let frame = CanFrame::new(id, &[0xAA, 0xBB]).unwrap();
//!
//! assert_eq!(2, frame.dlc());
//! assert_eq!(&[0xAA, 0xBB], frame.data());
//! assert!(CanFrame::new(id, &[0u8; 9]).is_none());
//! ```
use embedded_can::{Frame, Id};

/// Maximum number of data bytes
pub const MAX_PAYLOAD: usize = 8;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CanFrame {
    identifier: Id,
    rtr: bool,
    dlc: usize,
    /// Bytes beyond `dlc` are always zero
    data: [u8; MAX_PAYLOAD],
}

impl CanFrame {
    /// Frame from already validated parts, `data` beyond `dlc` must be zero
    pub(crate) fn from_parts(identifier: Id, rtr: bool, dlc: usize, data: [u8; MAX_PAYLOAD]) -> Self {
        Self {
            identifier,
            rtr,
            dlc: dlc.min(MAX_PAYLOAD),
            data,
        }
    }
}

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > MAX_PAYLOAD {
            return None;
        }

        let mut frame = CanFrame {
            identifier: id.into(),
            rtr: false,
            dlc: data.len(),
            data: [0; MAX_PAYLOAD],
        };
        frame.data[..data.len()].copy_from_slice(data);
        Some(frame)
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > MAX_PAYLOAD {
            return None;
        }

        Some(CanFrame {
            identifier: id.into(),
            rtr: true,
            dlc,
            data: [0; MAX_PAYLOAD],
        })
    }

    fn is_extended(&self) -> bool {
        matches!(self.identifier, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.rtr
    }

    fn id(&self) -> Id {
        self.identifier
    }

    fn dlc(&self) -> usize {
        self.dlc
    }

    /// Empty for remote frames
    fn data(&self) -> &[u8] {
        if self.rtr {
            return &[];
        }

        &self.data[..self.dlc]
    }
}
