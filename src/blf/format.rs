//! BLF wire format structures and serialization.
//!
//! Defines the binary structures shared by every record in a BLF file and
//! provides their byte-exact little-endian serialization.
//!
//! ## BLF File Structure
//!
//! A BLF file written by this crate contains:
//!
//! 1. **File Header** (144 bytes) - rewritable summary at offset 0
//! 2. **Log Containers** - `LOBJ` records batching the event records,
//!    optionally deflate-compressed
//! 3. **Event Records** (inside containers) - object header pair followed by
//!    a fixed-size message payload
//!
//! All integers are little-endian and structures are packed; every record is
//! zero-padded to a 4-byte boundary, and the padding is part of the record's
//! declared object size.

use crate::blf::timestamp::SystemTime;

/// Magic signature opening every object record.
pub const OBJECT_SIGNATURE: &[u8; 4] = b"LOBJ";

/// Magic signature opening the file header.
pub const FILE_SIGNATURE: &[u8; 4] = b"LOGG";

/// Size of the rewritable file header at offset 0.
pub const FILE_HEADER_SIZE: usize = 144;

/// Size of [`ObjectHeaderBase`] on disk.
pub const OBJ_HEADER_BASE_SIZE: usize = 16;

/// Size of [`ObjectHeaderV1`] on disk.
pub const OBJ_HEADER_V1_SIZE: usize = 16;

/// Size of the [`LogContainer`] sub-header on disk.
pub const LOG_CONTAINER_SIZE: usize = 16;

/// Application identifier stamped into the file header.
pub const APPLICATION_ID: u8 = 5;

/// Application version bytes (major, minor, build).
pub const APPLICATION_VERSION: [u8; 3] = [0, 0, 0];

/// Binary log format version bytes (major, minor, build, patch).
pub const BIN_LOG_VERSION: [u8; 4] = [2, 5, 8, 1];

// Trailing file-header area for restore points and statistics. Vector
// tooling accepts it zeroed.
const FILE_HEADER_RESERVED: usize = 72;

/// Timestamp flag values for [`ObjectHeaderV1`].
pub mod time_flags {
    /// Timestamp counts ten-microsecond ticks.
    pub const TEN_MICROS: u32 = 0x0000_0001;

    /// Timestamp counts nanoseconds. The only unit this writer emits.
    pub const ONE_NANOSECOND: u32 = 0x0000_0002;
}

/// Compression method tags for [`LogContainer`].
pub mod compression {
    /// Container payload stored verbatim.
    pub const NONE: u16 = 0;

    /// Container payload is a zlib deflate stream.
    pub const ZLIB_DEFLATE: u16 = 2;
}

/// Object type tags understood by Vector tooling.
///
/// This writer emits `CanMessage`, `CanFdMessage`, `CanErrorExt` and
/// `LogContainer`; the remaining tags are part of the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ObjectType {
    CanMessage = 1,
    CanError = 2,
    LogContainer = 10,
    CanErrorExt = 73,
    CanMessage2 = 86,
    GlobalMarker = 96,
    CanFdMessage = 100,
    CanFdMessage64 = 101,
}

/// Zero bytes needed to extend `len` to the next 4-byte boundary.
///
/// Minimal form: already-aligned lengths get no padding.
pub const fn padding_for(len: usize) -> usize {
    (4 - (len % 4)) % 4
}

/// Leading header of every object record (16 bytes).
///
/// `object_size` counts every byte physically written for the record,
/// including the alignment padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHeaderBase {
    pub header_size: u16,
    pub header_version: u16,
    pub object_size: u32,
    pub object_type: ObjectType,
}

impl ObjectHeaderBase {
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(OBJECT_SIGNATURE);
        out.extend_from_slice(&self.header_size.to_le_bytes());
        out.extend_from_slice(&self.header_version.to_le_bytes());
        out.extend_from_slice(&self.object_size.to_le_bytes());
        out.extend_from_slice(&(self.object_type as u32).to_le_bytes());
    }
}

/// Per-event header following the base header (16 bytes).
///
/// The timestamp is the delta in nanoseconds from the stream's first event,
/// not the absolute wall-clock value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHeaderV1 {
    pub timestamp_ns: u64,
}

impl ObjectHeaderV1 {
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&time_flags::ONE_NANOSECOND.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // client index, single producer
        out.extend_from_slice(&0u16.to_le_bytes()); // object version
        out.extend_from_slice(&self.timestamp_ns.to_le_bytes());
    }
}

/// Log container sub-header (16 bytes).
///
/// `size_uncompressed` is always the staged byte count before compression,
/// whatever the compression method; readers use it to pre-size their
/// decompression buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogContainer {
    pub compression_method: u16,
    pub size_uncompressed: u32,
}

impl LogContainer {
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.compression_method.to_le_bytes());
        out.extend_from_slice(&[0u8; 6]);
        out.extend_from_slice(&self.size_uncompressed.to_le_bytes());
        out.extend_from_slice(&[0u8; 4]);
    }
}

/// Rewritable file header (144 bytes at offset 0).
///
/// Written twice per stream: zero-filled at open to reserve the offset, and
/// with final totals at finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub file_size: u64,
    pub uncompressed_size: u64,
    pub object_count: u32,
    pub time_start: SystemTime,
    pub time_stop: SystemTime,
}

impl FileHeader {
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(FILE_SIGNATURE);
        out.extend_from_slice(&(FILE_HEADER_SIZE as u32).to_le_bytes());
        out.push(APPLICATION_ID);
        out.extend_from_slice(&APPLICATION_VERSION);
        out.extend_from_slice(&BIN_LOG_VERSION);
        out.extend_from_slice(&self.file_size.to_le_bytes());
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&self.object_count.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // objects read
        self.time_start.encode_into(out);
        self.time_stop.encode_into(out);
        out.extend_from_slice(&[0u8; FILE_HEADER_RESERVED]);
    }
}
