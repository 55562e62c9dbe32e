//! Byte sink abstraction for the writer.
//!
//! The writer appends records at the end of the stream and seeks back to
//! offset 0 exactly when rewriting the file header. Beyond `Write + Seek`
//! it needs one extra capability: an explicit durability flush invoked at
//! checkpoint and close.

use std::fs::File;
use std::io::{self, BufWriter, Cursor, Seek, Write};

/// A seekable byte sink a BLF stream can be written to.
///
/// Implemented for [`File`] (with a real fsync), buffered files, and
/// in-memory cursors (where durability is a no-op).
pub trait RecordSink: Write + Seek {
    /// Forces written bytes down to durable storage.
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl RecordSink for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

impl RecordSink for BufWriter<File> {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.get_ref().sync_all()
    }
}

impl RecordSink for Cursor<Vec<u8>> {}
