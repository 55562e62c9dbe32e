//! BLF encoding and stream writing.
//!
//! This module owns the write path end to end: the wire format structures,
//! the per-event record encoder, the container staging buffer, and the
//! [`BlfWriter`] that ties them to a byte sink.

pub mod container;
pub mod format;
pub mod record;
pub mod sink;
pub mod timestamp;
pub mod writer;

pub use container::ContainerBuffer;
pub use sink::RecordSink;
pub use timestamp::SystemTime;
pub use writer::{BlfWriter, CompressionMethod, WriterOptions};
