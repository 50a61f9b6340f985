//!# Frame buffer layout
//! Receive and transmit buffer share the same 13 byte layout. The first byte holds the
//! frame information (format, RTR, DLC), followed by the identifier bytes and the payload.
//!
//! | Format   | Identifier bytes | Payload start |
//! |----------|------------------|---------------|
//! | Standard | 1..=2            | 3             |
//! | Extended | 1..=4            | 5             |
//!
//! ```
//!# use sja1000::frame::CanFrame;
//!# use sja1000::message::FrameBuffer;
//!# use embedded_can::{Frame, StandardId};
//!#
//! let frame = CanFrame::new(StandardId::new(0x123).unwrap(), &[0xAA, 0xBB]).unwrap();
//! let buffer = FrameBuffer::encode(&frame);
//!
//! assert_eq!(&[0x02, 0x24, 0x60, 0xAA, 0xBB], buffer.as_bytes());
//! assert_eq!(frame, buffer.decode());
//! ```
use crate::bus::RegisterBus;
use crate::frame::{CanFrame, MAX_PAYLOAD};
use crate::registers::{FrameInfo, FRAME_BUFFER_LEN};
use byteorder::{BigEndian, ByteOrder};
use embedded_can::{ExtendedId, Frame, Id, StandardId};

/// Offset of the first data byte for standard frames
pub const STANDARD_DATA_OFFSET: usize = 3;

/// Offset of the first data byte for extended frames
pub const EXTENDED_DATA_OFFSET: usize = 5;

/// Image of the receive/transmit buffer
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameBuffer {
    bytes: [u8; FRAME_BUFFER_LEN],
}

impl FrameBuffer {
    /// Creates buffer from raw register values
    pub fn from_bytes(bytes: [u8; FRAME_BUFFER_LEN]) -> Self {
        Self { bytes }
    }

    /// Encodes the frame into buffer layout
    pub fn encode(frame: &CanFrame) -> Self {
        let mut bytes = [0u8; FRAME_BUFFER_LEN];

        let info = FrameInfo::new()
            .with_extended(frame.is_extended())
            .with_remote(frame.is_remote_frame())
            .with_dlc(frame.dlc() as u8);
        bytes[0] = info.into();

        let data_offset = match frame.id() {
            Id::Standard(sid) => {
                BigEndian::write_u16(&mut bytes[1..3], sid.as_raw() << 5);
                STANDARD_DATA_OFFSET
            }
            Id::Extended(eid) => {
                BigEndian::write_u32(&mut bytes[1..5], eid.as_raw() << 3);
                EXTENDED_DATA_OFFSET
            }
        };

        let data = frame.data();
        bytes[data_offset..data_offset + data.len()].copy_from_slice(data);

        Self { bytes }
    }

    /// Reads a buffer starting at `offset`. Frame info is read first, only the bytes
    /// declared by it are read afterwards.
    pub(crate) fn read_from<B: RegisterBus>(bus: &mut B, offset: u8) -> Result<Self, B::Error> {
        let mut buffer = Self::default();
        buffer.bytes[0] = bus.read(offset)?;

        for index in 1..buffer.len() {
            buffer.bytes[index] = bus.read(offset + index as u8)?;
        }

        Ok(buffer)
    }

    /// Decoded frame information byte
    pub fn frame_info(&self) -> FrameInfo {
        FrameInfo::from(self.bytes[0])
    }

    /// Number of valid bytes including frame info
    pub fn len(&self) -> usize {
        let info = self.frame_info();
        let payload = if info.remote() {
            0
        } else {
            (info.dlc() as usize).min(MAX_PAYLOAD)
        };

        if info.extended() {
            EXTENDED_DATA_OFFSET + payload
        } else {
            STANDARD_DATA_OFFSET + payload
        }
    }

    /// Always false, frame info is part of every buffer
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Valid bytes of the buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    /// Decodes the buffer into a frame
    pub fn decode(&self) -> CanFrame {
        let info = self.frame_info();

        let (identifier, data_offset) = if info.extended() {
            let raw = BigEndian::read_u32(&self.bytes[1..5]) >> 3;
            // SAFETY: 32 bit value shifted by 3 has at most 29 significant bits
            let id = unsafe { ExtendedId::new_unchecked(raw) };
            (Id::Extended(id), EXTENDED_DATA_OFFSET)
        } else {
            let raw = BigEndian::read_u16(&self.bytes[1..3]) >> 5;
            // SAFETY: 16 bit value shifted by 5 has at most 11 significant bits
            let id = unsafe { StandardId::new_unchecked(raw) };
            (Id::Standard(id), STANDARD_DATA_OFFSET)
        };

        let dlc = (info.dlc() as usize).min(MAX_PAYLOAD);
        let mut data = [0u8; MAX_PAYLOAD];

        if !info.remote() {
            data[..dlc].copy_from_slice(&self.bytes[data_offset..data_offset + dlc]);
        }

        CanFrame::from_parts(identifier, info.remote(), dlc, data)
    }
}
