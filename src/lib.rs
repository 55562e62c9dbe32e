//! Type-safe Rust library for recording CAN bus traffic to Vector BLF files.
//!
//! Buslog turns a stream of decoded CAN, CAN FD and error-frame events into
//! Vector's Binary Logging Format: byte-exact event records batched into
//! deflate-compressed log containers behind a rewritable file header.
//!
//! # Features
//!
//! - **Byte-exact encoding**: little-endian, packed, 4-byte-aligned records
//!   readable by independent BLF tooling
//! - **Bounded buffering**: records batch into fixed-capacity containers
//!   that drain automatically on overflow
//! - **Two-phase header**: totals and the stream's time span are rewritten
//!   in place at close (or at any [`checkpoint`](BlfWriter::checkpoint))
//! - **Write path only**: reading BLF files back is out of scope
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use buslog::{BlfWriter, CanEvent};
//!
//! fn main() -> buslog::Result<()> {
//!     let mut writer = BlfWriter::create("traffic.blf")?;
//!     writer.write_event(&CanEvent::new(1_721_032_200_000_000_000, 0x123, &[0x12, 0x34, 0x56]))?;
//!     writer.finalize()?;
//!     Ok(())
//! }
//! ```
//!
//! The writer is single-threaded by design: one stream instance, one
//! producer. Feed it from a channel if multiple tasks log to the same file.

// Core types and error handling
mod error;
pub mod event;

// Encoding and stream writing
pub mod blf;

// Core exports
pub use error::{BlfError, Result};
pub use event::{CanEvent, FrameKind};

// Writer exports
pub use blf::{BlfWriter, CompressionMethod, RecordSink, SystemTime, WriterOptions};
