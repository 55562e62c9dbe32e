//! BLF stream writer.
//!
//! [`BlfWriter`] owns the whole write path: it encodes submitted events,
//! stages them in a [`ContainerBuffer`], drains full buffers to the sink as
//! (optionally deflate-compressed) log container records, and maintains the
//! running totals needed to rewrite the 144-byte file header at close.
//!
//! The writer is strictly single-threaded and synchronous: every operation
//! runs to completion on the caller's thread, and the staging buffer and
//! counters are private state of one stream instance. Concurrent producers
//! must be serialized in front of the writer.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use buslog::{BlfWriter, CanEvent};
//!
//! fn record_traffic() -> buslog::Result<()> {
//!     let mut writer = BlfWriter::create("traffic.blf")?;
//!     writer.write_event(&CanEvent::new(1_721_032_200_000_000_000, 0x123, &[0x12, 0x34]))?;
//!     writer.finalize()?;
//!     Ok(())
//! }
//! ```

use crate::blf::container::{ContainerBuffer, DEFAULT_CONTAINER_CAPACITY};
use crate::blf::format::{
    FILE_HEADER_SIZE, FileHeader, LOG_CONTAINER_SIZE, LogContainer, OBJ_HEADER_BASE_SIZE,
    ObjectHeaderBase, ObjectType, compression, padding_for,
};
use crate::blf::record::{self, MAX_RECORD_SIZE};
use crate::blf::sink::RecordSink;
use crate::blf::timestamp::SystemTime;
use crate::error::{BlfError, Result};
use crate::event::CanEvent;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::fs::{File, OpenOptions};
use std::io::{self, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, trace, warn};

/// Container compression, fixed per stream at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Container payloads are copied verbatim.
    None,
    /// Container payloads are zlib deflate streams at the given level (0-9).
    Zlib(u32),
}

impl CompressionMethod {
    /// Default deflate level, balancing ratio against encode time.
    pub const DEFAULT_ZLIB_LEVEL: u32 = 6;

    fn validate(self) -> Result<()> {
        match self {
            CompressionMethod::Zlib(level) if level > 9 => {
                Err(BlfError::CompressionLevel { level })
            }
            _ => Ok(()),
        }
    }
}

impl Default for CompressionMethod {
    fn default() -> Self {
        CompressionMethod::Zlib(Self::DEFAULT_ZLIB_LEVEL)
    }
}

/// Per-stream configuration, validated when the writer is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    pub compression: CompressionMethod,
    /// Staging capacity in bytes; see
    /// [`MIN_CONTAINER_CAPACITY`](crate::blf::container::MIN_CONTAINER_CAPACITY).
    pub container_capacity: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::default(),
            container_capacity: DEFAULT_CONTAINER_CAPACITY,
        }
    }
}

/// Streaming encoder from [`CanEvent`] values to a BLF byte sink.
///
/// Construction reserves the file header region; [`finalize`] rewrites it
/// with the final totals and syncs the sink. A finalized writer refuses
/// further events.
///
/// [`finalize`]: BlfWriter::finalize
pub struct BlfWriter<S: RecordSink> {
    sink: S,
    container: ContainerBuffer,
    compression: CompressionMethod,
    /// Running total of staged (pre-compression) bytes, seeded with the
    /// header's own size.
    uncompressed_size: u64,
    object_count: u32,
    start_timestamp_ns: Option<u64>,
    stop_timestamp_ns: u64,
    scratch: Vec<u8>,
    finalized: bool,
}

impl BlfWriter<File> {
    /// Creates `path` (truncating an existing file) and opens a stream with
    /// default options: deflate level 6, 16 KiB containers.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create_with(path, WriterOptions::default())
    }

    /// Creates `path` with explicit options.
    pub fn create_with<P: AsRef<Path>>(path: P, options: WriterOptions) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| BlfError::file_error(path.as_ref().to_path_buf(), e))?;
        Self::from_sink(file, options)
    }
}

impl<S: RecordSink> BlfWriter<S> {
    /// Opens a stream over an arbitrary sink, reserving the 144-byte header
    /// region at the current position (which must be offset 0).
    pub fn from_sink(mut sink: S, options: WriterOptions) -> Result<Self> {
        options.compression.validate()?;
        let container = ContainerBuffer::with_capacity(options.container_capacity)?;

        sink.write_all(&[0u8; FILE_HEADER_SIZE])
            .map_err(|e| BlfError::sink("reserving the file header", e))?;

        debug!(
            capacity = container.capacity(),
            compression = ?options.compression,
            "opened BLF stream"
        );

        Ok(Self {
            sink,
            container,
            compression: options.compression,
            uncompressed_size: FILE_HEADER_SIZE as u64,
            object_count: 0,
            start_timestamp_ns: None,
            stop_timestamp_ns: 0,
            scratch: Vec::with_capacity(MAX_RECORD_SIZE),
            finalized: false,
        })
    }

    /// Encodes and stages one event, draining the container first if the
    /// record would not fit.
    ///
    /// The first submitted event fixes the stream's time origin; every
    /// record carries its nanosecond offset from that origin.
    pub fn write_event(&mut self, event: &CanEvent) -> Result<()> {
        if self.finalized {
            return Err(BlfError::Finalized);
        }

        let origin = self.start_timestamp_ns.unwrap_or(event.timestamp_ns);
        let delta = event.timestamp_ns.saturating_sub(origin);

        self.scratch.clear();
        record::encode_event(event, delta, &mut self.scratch)?;

        if !self.container.try_append(&self.scratch)? {
            self.flush_container()?;
            let staged = self.container.try_append(&self.scratch)?;
            debug_assert!(staged, "record must fit an empty container");
        }

        self.start_timestamp_ns.get_or_insert(event.timestamp_ns);
        self.stop_timestamp_ns = event.timestamp_ns;
        self.object_count += 1;
        Ok(())
    }

    /// Drains staged records into one log container record. No-op when the
    /// buffer is empty.
    ///
    /// On a deflate failure the container is written uncompressed; on a sink
    /// failure the staged bytes are kept for a retry.
    fn flush_container(&mut self) -> Result<()> {
        if self.container.is_empty() {
            return Ok(());
        }

        let staged = self.container.staged();
        let staged_len = staged.len();

        let compressed = match self.compression {
            CompressionMethod::None => None,
            CompressionMethod::Zlib(level) => match deflate(staged, level) {
                Ok(buf) => Some(buf),
                Err(error) => {
                    warn!(%error, "deflate failed; writing container uncompressed");
                    None
                }
            },
        };
        let (method, payload): (u16, &[u8]) = match &compressed {
            Some(buf) => (compression::ZLIB_DEFLATE, buf),
            None => (compression::NONE, staged),
        };

        let unpadded = OBJ_HEADER_BASE_SIZE + LOG_CONTAINER_SIZE + payload.len();
        let padding = padding_for(unpadded);

        let mut header = Vec::with_capacity(OBJ_HEADER_BASE_SIZE + LOG_CONTAINER_SIZE);
        ObjectHeaderBase {
            header_size: OBJ_HEADER_BASE_SIZE as u16,
            header_version: 1,
            object_size: (unpadded + padding) as u32,
            object_type: ObjectType::LogContainer,
        }
        .encode_into(&mut header);
        LogContainer { compression_method: method, size_uncompressed: staged_len as u32 }
            .encode_into(&mut header);

        self.sink
            .write_all(&header)
            .map_err(|e| BlfError::sink("writing the container header", e))?;
        self.sink
            .write_all(payload)
            .map_err(|e| BlfError::sink("writing the container payload", e))?;
        self.sink
            .write_all(&[0u8; 4][..padding])
            .map_err(|e| BlfError::sink("writing container padding", e))?;

        trace!(staged = staged_len, written = payload.len(), method, "flushed log container");

        self.uncompressed_size += staged_len as u64;
        self.container.clear();
        Ok(())
    }

    /// Rewrites the header region with current totals, then restores the
    /// position to end-of-stream.
    fn rewrite_header(&mut self) -> Result<()> {
        let file_size = self
            .sink
            .seek(SeekFrom::End(0))
            .map_err(|e| BlfError::sink("measuring the stream length", e))?;

        let header = FileHeader {
            file_size,
            uncompressed_size: self.uncompressed_size,
            object_count: self.object_count,
            time_start: SystemTime::from_epoch_ns(self.start_timestamp_ns.unwrap_or(0)),
            time_stop: SystemTime::from_epoch_ns(self.stop_timestamp_ns),
        };
        let mut buf = Vec::with_capacity(FILE_HEADER_SIZE);
        header.encode_into(&mut buf);

        self.sink
            .seek(SeekFrom::Start(0))
            .map_err(|e| BlfError::sink("seeking to the file header", e))?;
        self.sink
            .write_all(&buf)
            .map_err(|e| BlfError::sink("rewriting the file header", e))?;
        self.sink
            .seek(SeekFrom::End(0))
            .map_err(|e| BlfError::sink("returning to end of stream", e))?;
        Ok(())
    }

    /// Flushes the current container and rewrites the header with running
    /// totals, then forces the sink to durable storage.
    ///
    /// Leaves the stream open: readers get a consistent snapshot, and
    /// subsequent events keep appending.
    pub fn checkpoint(&mut self) -> Result<()> {
        if self.finalized {
            return Err(BlfError::Finalized);
        }
        self.flush_container()?;
        self.rewrite_header()?;
        self.sink.sync().map_err(|e| BlfError::sink("syncing the sink", e))
    }

    /// Final flush, header rewrite and durability sync. The writer accepts
    /// no further events afterward.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Err(BlfError::Finalized);
        }
        self.flush_container()?;
        self.rewrite_header()?;
        self.sink.sync().map_err(|e| BlfError::sink("syncing the sink", e))?;
        self.finalized = true;

        debug!(
            objects = self.object_count,
            uncompressed = self.uncompressed_size,
            "finalized BLF stream"
        );
        Ok(())
    }

    /// Number of event records written so far (log containers not counted).
    pub fn object_count(&self) -> u32 {
        self.object_count
    }

    /// Running uncompressed-byte total, including the header's 144 bytes.
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Consumes the writer and hands back the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

fn deflate(data: &[u8], level: u32) -> io::Result<Vec<u8>> {
    let mut encoder =
        ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 64), Compression::new(level));
    encoder.write_all(data)?;
    encoder.finish()
}
