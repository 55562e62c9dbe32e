//! Event record encoding.
//!
//! Turns one [`CanEvent`] into the exact byte sequence staged into the
//! container buffer: [`ObjectHeaderBase`] + [`ObjectHeaderV1`] + a
//! fixed-size message payload, zero-padded to a 4-byte boundary. The three
//! payload layouts (classic, FD, extended error) are selected by
//! [`FrameKind`] priority.

use crate::blf::format::{
    ObjectHeaderBase, ObjectHeaderV1, ObjectType, OBJ_HEADER_BASE_SIZE, OBJ_HEADER_V1_SIZE,
    padding_for,
};
use crate::error::{BlfError, Result};
use crate::event::{CanEvent, FrameKind};

/// Classic CAN message payload size on disk.
pub const CAN_MESSAGE_SIZE: usize = 16;

/// CAN FD message payload size on disk.
pub const CAN_FD_MESSAGE_SIZE: usize = 84;

/// Extended error frame payload size on disk.
pub const CAN_ERROR_EXT_SIZE: usize = 32;

/// Largest record this encoder produces (an FD message).
pub const MAX_RECORD_SIZE: usize =
    OBJ_HEADER_BASE_SIZE + OBJ_HEADER_V1_SIZE + CAN_FD_MESSAGE_SIZE;

/// Payload capacity of classic CAN and error frame layouts.
pub const CLASSIC_PAYLOAD_CAPACITY: usize = 8;

/// Payload capacity of the CAN FD layout.
pub const FD_PAYLOAD_CAPACITY: usize = 64;

/// Message flag bits shared by the classic and FD layouts.
mod msg_flags {
    /// Frame was transmitted by the logging node.
    pub const TX: u8 = 0x01;

    /// Remote transmission request.
    pub const RTR: u8 = 0x80;
}

/// FD flag bits of the CAN FD layout.
mod fd_flags {
    /// Extended data length; set on every FD record.
    pub const EDL: u8 = 0x01;

    /// Bit rate switch.
    pub const BRS: u8 = 0x02;

    /// Error state indicator.
    pub const ESI: u8 = 0x04;
}

/// Extended identifier marker OR-ed into the arbitration id field.
const CAN_MSG_EXT: u32 = 0x8000_0000;

/// Appends the full record for `event` to `out`.
///
/// `timestamp_delta_ns` is the offset from the stream's first event; the
/// caller tracks that state. Classic and FD frames with a DLC above their
/// layout capacity are rejected before anything is written.
pub(crate) fn encode_event(
    event: &CanEvent,
    timestamp_delta_ns: u64,
    out: &mut Vec<u8>,
) -> Result<()> {
    let kind = event.frame_kind();
    let (object_type, payload_size) = match kind {
        FrameKind::ErrorFrame => (ObjectType::CanErrorExt, CAN_ERROR_EXT_SIZE),
        FrameKind::CanFd => (ObjectType::CanFdMessage, CAN_FD_MESSAGE_SIZE),
        FrameKind::Classic => (ObjectType::CanMessage, CAN_MESSAGE_SIZE),
    };
    match kind {
        FrameKind::Classic if event.dlc as usize > CLASSIC_PAYLOAD_CAPACITY => {
            return Err(BlfError::DlcOutOfRange {
                layout: "CAN",
                dlc: event.dlc,
                capacity: CLASSIC_PAYLOAD_CAPACITY,
            });
        }
        FrameKind::CanFd if event.dlc as usize > FD_PAYLOAD_CAPACITY => {
            return Err(BlfError::DlcOutOfRange {
                layout: "CAN FD",
                dlc: event.dlc,
                capacity: FD_PAYLOAD_CAPACITY,
            });
        }
        _ => {}
    }

    let header_size = (OBJ_HEADER_BASE_SIZE + OBJ_HEADER_V1_SIZE) as u16;
    let unpadded = OBJ_HEADER_BASE_SIZE + OBJ_HEADER_V1_SIZE + payload_size;
    let padding = padding_for(unpadded);

    ObjectHeaderBase {
        header_size,
        header_version: 1,
        object_size: (unpadded + padding) as u32,
        object_type,
    }
    .encode_into(out);
    ObjectHeaderV1 { timestamp_ns: timestamp_delta_ns }.encode_into(out);

    match kind {
        FrameKind::ErrorFrame => encode_error_frame(event, out),
        FrameKind::CanFd => encode_fd_message(event, out),
        FrameKind::Classic => encode_classic_message(event, out),
    }

    out.extend_from_slice(&[0u8; 4][..padding]);
    Ok(())
}

/// Message flags byte for the classic and FD layouts. Not used for error
/// frames.
fn message_flags(event: &CanEvent) -> u8 {
    let mut flags = 0;
    if !event.is_rx {
        flags |= msg_flags::TX;
    }
    if event.is_remote_frame {
        flags |= msg_flags::RTR;
    }
    flags
}

fn encoded_arbitration_id(event: &CanEvent) -> u32 {
    if event.is_extended_id {
        event.arbitration_id | CAN_MSG_EXT
    } else {
        event.arbitration_id
    }
}

/// Copies up to `N` payload bytes into a zeroed fixed array, returning the
/// array and the count actually copied.
fn fixed_payload<const N: usize>(event: &CanEvent) -> ([u8; N], usize) {
    let mut data = [0u8; N];
    let count = (event.dlc as usize).min(N).min(event.data.len());
    data[..count].copy_from_slice(&event.data[..count]);
    (data, count)
}

fn encode_classic_message(event: &CanEvent, out: &mut Vec<u8>) {
    let (data, _) = fixed_payload::<CLASSIC_PAYLOAD_CAPACITY>(event);

    out.extend_from_slice(&event.channel.to_le_bytes());
    out.push(message_flags(event));
    out.push(event.dlc);
    out.extend_from_slice(&encoded_arbitration_id(event).to_le_bytes());
    out.extend_from_slice(&data);
}

fn encode_fd_message(event: &CanEvent, out: &mut Vec<u8>) {
    let (data, copied) = fixed_payload::<FD_PAYLOAD_CAPACITY>(event);

    let mut fd = fd_flags::EDL;
    if event.bitrate_switch {
        fd |= fd_flags::BRS;
    }
    if event.error_state_indicator {
        fd |= fd_flags::ESI;
    }

    out.extend_from_slice(&event.channel.to_le_bytes());
    out.push(message_flags(event));
    out.push(event.dlc);
    out.extend_from_slice(&encoded_arbitration_id(event).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // frame length
    out.push(0); // bit count
    out.push(fd);
    out.push(copied as u8); // valid data bytes
    out.extend_from_slice(&[0u8; 5]);
    out.extend_from_slice(&data);
}

fn encode_error_frame(event: &CanEvent, out: &mut Vec<u8>) {
    let (data, _) = fixed_payload::<CLASSIC_PAYLOAD_CAPACITY>(event);

    out.extend_from_slice(&event.channel.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // length
    out.extend_from_slice(&0u32.to_le_bytes()); // flags
    out.push(0); // ecc
    out.push(0); // position
    out.push(event.dlc);
    out.push(0xFF); // reserved marker
    out.extend_from_slice(&1u32.to_le_bytes()); // frame length
    out.extend_from_slice(&event.arbitration_id.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // extended flags
    out.extend_from_slice(&[0u8; 2]);
    out.extend_from_slice(&data);
}
