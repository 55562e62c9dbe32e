//! CAN bus event representation.
//!
//! [`CanEvent`] is the single input type the writer consumes. It carries an
//! already-decoded frame plus logging metadata; no bus transport lives in
//! this crate. Events are transient values, consumed synchronously by the
//! record encoder.
//!
//! The three on-disk record layouts are selected through [`FrameKind`], a
//! tagged dispatch with a fixed priority: an error frame is always logged as
//! an extended error record, even if the FD flag is also set.

/// One decoded CAN bus event with its logging metadata.
///
/// `dlc` is the declared payload length in bytes (0-64). The encoder copies
/// at most the layout capacity; classic and FD frames reject a DLC above
/// their capacity outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanEvent {
    /// Absolute timestamp, nanoseconds since the Unix epoch.
    pub timestamp_ns: u64,
    /// Arbitration identifier, 11-bit or (with `is_extended_id`) 29-bit.
    pub arbitration_id: u32,
    /// Payload bytes.
    pub data: Vec<u8>,
    /// Declared data length code, in bytes.
    pub dlc: u8,
    /// Logger channel the frame was observed on (1-based).
    pub channel: u16,
    /// 29-bit extended identifier format.
    pub is_extended_id: bool,
    /// Remote transmission request.
    pub is_remote_frame: bool,
    /// Error frame, logged as an extended error record.
    pub is_error_frame: bool,
    /// CAN FD frame (up to 64 payload bytes).
    pub is_fd: bool,
    /// Receive direction; transmit when `false`.
    pub is_rx: bool,
    /// CAN FD bit rate switch.
    pub bitrate_switch: bool,
    /// CAN FD error state indicator.
    pub error_state_indicator: bool,
}

impl CanEvent {
    /// Creates a received classic CAN frame on channel 1 with the DLC taken
    /// from the payload length. Set the remaining fields directly for
    /// anything more exotic.
    ///
    /// ```rust
    /// use buslog::CanEvent;
    ///
    /// let event = CanEvent::new(1_721_032_200_000_000_000, 0x123, &[0x12, 0x34, 0x56]);
    /// assert_eq!(event.dlc, 3);
    /// assert_eq!(event.channel, 1);
    /// assert!(event.is_rx);
    /// ```
    pub fn new(timestamp_ns: u64, arbitration_id: u32, data: &[u8]) -> Self {
        Self {
            timestamp_ns,
            arbitration_id,
            dlc: data.len() as u8,
            data: data.to_vec(),
            channel: 1,
            is_extended_id: false,
            is_remote_frame: false,
            is_error_frame: false,
            is_fd: false,
            is_rx: true,
            bitrate_switch: false,
            error_state_indicator: false,
        }
    }

    /// Record layout this event is logged as.
    pub fn frame_kind(&self) -> FrameKind {
        if self.is_error_frame {
            FrameKind::ErrorFrame
        } else if self.is_fd {
            FrameKind::CanFd
        } else {
            FrameKind::Classic
        }
    }
}

/// The three record layouts a [`CanEvent`] can serialize to.
///
/// Dispatch priority is fixed: error frame, then FD, then classic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Extended error frame record, 8-byte payload capacity.
    ErrorFrame,
    /// CAN FD message record, 64-byte payload capacity.
    CanFd,
    /// Classic CAN message record, 8-byte payload capacity.
    Classic,
}
