//! Error types for BLF stream writing.
//!
//! All errors implement the `std::error::Error` trait and carry structured
//! context. They fall into the categories the writer distinguishes at
//! runtime:
//!
//! - **Precondition violations**: a declared DLC above a layout's capacity,
//!   a container capacity below the minimum, a record that can never fit an
//!   empty container, or an out-of-range deflate level. Continuing after one
//!   of these would corrupt the byte layout, so they are never retried.
//! - **Sink failures**: write/seek/sync errors on the underlying byte sink.
//!   Staged container data is preserved, so the operation may be retried
//!   once the sink recovers.
//! - **Compression failures**: reported by the deflate encoder. The writer
//!   falls back to an uncompressed container instead of surfacing these, so
//!   they only appear when constructing one manually.
//!
//! ```rust
//! use buslog::BlfError;
//!
//! let error = BlfError::DlcOutOfRange { layout: "CAN", dlc: 12, capacity: 8 };
//! assert!(!error.is_retryable());
//! ```

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for BLF writing operations.
pub type Result<T, E = BlfError> = std::result::Result<T, E>;

/// Main error type for BLF writing operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BlfError {
    /// The log file itself could not be created or opened.
    #[error("BLF file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The byte sink failed mid-stream. Staged container data is kept, so
    /// previously written records are unaffected.
    #[error("sink I/O failure while {operation}")]
    Sink {
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    /// A declared data length code exceeds the fixed payload capacity of the
    /// record layout it selects.
    #[error("DLC {dlc} exceeds the {capacity}-byte payload capacity of a {layout} record")]
    DlcOutOfRange { layout: &'static str, dlc: u8, capacity: usize },

    /// The requested container capacity is too small to hold any record.
    #[error("container capacity {requested} is below the {minimum}-byte minimum")]
    ContainerCapacity { requested: usize, minimum: usize },

    /// A single encoded record is at least as large as the whole container.
    #[error("{size}-byte record can never fit a {capacity}-byte container")]
    RecordTooLarge { size: usize, capacity: usize },

    /// Deflate levels run 0 (stored) through 9 (best).
    #[error("deflate level {level} is out of range (0-9)")]
    CompressionLevel { level: u32 },

    /// The deflate encoder reported a failure.
    #[error("deflate failed: {details}")]
    Compression { details: String },

    /// The stream was already finalized; no further events are accepted.
    #[error("stream already finalized")]
    Finalized,
}

impl BlfError {
    /// Returns whether the failed operation may succeed on a later attempt.
    ///
    /// Precondition violations are permanent; sink failures depend on the
    /// underlying I/O resource and may clear up.
    pub fn is_retryable(&self) -> bool {
        match self {
            BlfError::File { .. } => false,
            BlfError::Sink { .. } => true,
            BlfError::Compression { .. } => true,
            BlfError::DlcOutOfRange { .. } => false,
            BlfError::ContainerCapacity { .. } => false,
            BlfError::RecordTooLarge { .. } => false,
            BlfError::CompressionLevel { .. } => false,
            BlfError::Finalized => false,
        }
    }

    /// Helper constructor for file open/create errors with path context.
    pub fn file_error(path: PathBuf, source: io::Error) -> Self {
        BlfError::File { path, source }
    }

    /// Helper constructor for sink failures, naming the operation underway.
    pub fn sink(operation: &'static str, source: io::Error) -> Self {
        BlfError::Sink { operation, source }
    }

    /// Helper constructor for compression failures.
    pub fn compression(details: impl Into<String>) -> Self {
        BlfError::Compression { details: details.into() }
    }
}
