//! End-to-end file-shape tests for the BLF writer.
//!
//! These drive the public API against real files and verify the on-disk
//! layout by slicing bytes directly; the crate itself ships no reader.

use anyhow::{Context, Result, ensure};
use buslog::{BlfWriter, CanEvent, CompressionMethod, WriterOptions};
use flate2::read::ZlibDecoder;
use std::io::Read;
use std::path::Path;

const FILE_HEADER_SIZE: usize = 144;
const CLASSIC_RECORD_SIZE: usize = 48;

// 2024-07-15T08:30:00.250Z
const T0: u64 = 1_721_032_200_250_000_000;

fn uncompressed() -> WriterOptions {
    WriterOptions { compression: CompressionMethod::None, ..WriterOptions::default() }
}

/// Containers after the file header as (method, size_uncompressed, payload).
fn walk_containers(bytes: &[u8]) -> Result<Vec<(u16, u32, Vec<u8>)>> {
    let mut containers = Vec::new();
    let mut pos = FILE_HEADER_SIZE;
    while pos < bytes.len() {
        ensure!(&bytes[pos..pos + 4] == b"LOBJ", "container at {pos} lacks the object signature");
        let object_size = u32::from_le_bytes(bytes[pos + 8..pos + 12].try_into()?) as usize;
        ensure!(object_size % 4 == 0, "container at {pos} is not 4-byte aligned");
        let method = u16::from_le_bytes([bytes[pos + 16], bytes[pos + 17]]);
        let size_uncompressed = u32::from_le_bytes(bytes[pos + 24..pos + 28].try_into()?);
        containers.push((method, size_uncompressed, bytes[pos + 32..pos + object_size].to_vec()));
        pos += object_size;
    }
    ensure!(pos == bytes.len(), "trailing bytes after the last container");
    Ok(containers)
}

fn header_totals(bytes: &[u8]) -> Result<(u64, u64, u32)> {
    ensure!(&bytes[0..4] == b"LOGG", "missing file signature");
    let file_size = u64::from_le_bytes(bytes[16..24].try_into()?);
    let uncompressed_size = u64::from_le_bytes(bytes[24..32].try_into()?);
    let object_count = u32::from_le_bytes(bytes[32..36].try_into()?);
    Ok((file_size, uncompressed_size, object_count))
}

fn write_events(
    path: &Path,
    options: WriterOptions,
    events: impl IntoIterator<Item = CanEvent>,
) -> Result<()> {
    let mut writer = BlfWriter::create_with(path, options)
        .with_context(|| format!("creating {}", path.display()))?;
    for event in events {
        writer.write_event(&event).context("writing event")?;
    }
    writer.finalize().context("finalizing stream")?;
    Ok(())
}

#[test]
fn single_event_file_on_disk() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("single.blf");
    write_events(&path, uncompressed(), [CanEvent::new(T0, 0x123, &[0x12, 0x34, 0x56])])?;

    let bytes = std::fs::read(&path)?;
    // 144 header + 32 container headers + one 48-byte record.
    ensure!(bytes.len() == 224, "unexpected file size {}", bytes.len());

    let (file_size, uncompressed_size, object_count) = header_totals(&bytes)?;
    ensure!(file_size == 224);
    ensure!(uncompressed_size == (FILE_HEADER_SIZE + CLASSIC_RECORD_SIZE) as u64);
    ensure!(object_count == 1);

    // Start and stop calendar fields both describe T0.
    ensure!(bytes[40..56] == bytes[56..72], "single event must give equal start/stop");
    let year = u16::from_le_bytes([bytes[40], bytes[41]]);
    let millisecond = u16::from_le_bytes([bytes[54], bytes[55]]);
    ensure!(year == 2024, "start year {year}");
    ensure!(millisecond == 250, "start millisecond {millisecond}");

    let containers = walk_containers(&bytes)?;
    ensure!(containers.len() == 1);
    ensure!(containers[0].0 == 0, "no-compression method tag");
    ensure!(containers[0].1 == CLASSIC_RECORD_SIZE as u32);
    Ok(())
}

#[test]
fn ten_thousand_events_account_exactly() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bulk.blf");
    let options =
        WriterOptions { compression: CompressionMethod::None, container_capacity: 1024 };
    write_events(
        &path,
        options,
        (0..10_000u64).map(|i| CanEvent::new(T0 + i * 100_000, 0x100 + (i % 16) as u32, &[0; 8])),
    )?;

    let bytes = std::fs::read(&path)?;
    let (file_size, uncompressed_size, object_count) = header_totals(&bytes)?;
    ensure!(object_count == 10_000);
    ensure!(file_size == bytes.len() as u64);
    ensure!(
        uncompressed_size == (FILE_HEADER_SIZE + 10_000 * CLASSIC_RECORD_SIZE) as u64,
        "accounting must equal header size plus the sum of staged records"
    );

    let containers = walk_containers(&bytes)?;
    ensure!(containers.len() > 2, "a tight buffer must produce many containers");
    let mut staged_total = 0u64;
    for (method, size_uncompressed, payload) in &containers {
        ensure!(*method == 0);
        ensure!(
            size_uncompressed % CLASSIC_RECORD_SIZE as u32 == 0,
            "no record may straddle a container boundary"
        );
        ensure!(payload.len() == *size_uncompressed as usize);
        staged_total += u64::from(*size_uncompressed);
    }
    ensure!(staged_total == 10_000 * CLASSIC_RECORD_SIZE as u64);
    Ok(())
}

#[test]
fn compressed_containers_inflate_to_whole_records() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("deflate.blf");
    let options = WriterOptions {
        compression: CompressionMethod::Zlib(6),
        container_capacity: 2048,
    };
    write_events(
        &path,
        options,
        (0..500u64).map(|i| {
            let payload = [i as u8; 8];
            CanEvent::new(T0 + i * 1_000_000, 0x200, &payload)
        }),
    )?;

    let bytes = std::fs::read(&path)?;
    let (_, uncompressed_size, object_count) = header_totals(&bytes)?;
    ensure!(object_count == 500);
    ensure!(uncompressed_size == (FILE_HEADER_SIZE + 500 * CLASSIC_RECORD_SIZE) as u64);

    let mut records_seen = 0usize;
    for (method, size_uncompressed, payload) in walk_containers(&bytes)? {
        ensure!(method == 2, "zlib deflate method tag");
        let mut inflated = Vec::new();
        ZlibDecoder::new(payload.as_slice())
            .read_to_end(&mut inflated)
            .context("inflating container payload")?;
        ensure!(
            inflated.len() == size_uncompressed as usize,
            "size_uncompressed must match the inflated byte count"
        );

        // Every record sits whole inside its container.
        let mut pos = 0usize;
        while pos < inflated.len() {
            ensure!(&inflated[pos..pos + 4] == b"LOBJ");
            let object_size = u32::from_le_bytes(inflated[pos + 8..pos + 12].try_into()?) as usize;
            ensure!(pos + object_size <= inflated.len(), "record split across containers");
            records_seen += 1;
            pos += object_size;
        }
    }
    ensure!(records_seen == 500, "expected 500 records, found {records_seen}");
    Ok(())
}

#[test]
fn checkpoint_leaves_a_consistent_file_without_finalize() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("checkpoint.blf");

    let mut writer = BlfWriter::create_with(&path, uncompressed())?;
    for i in 0..10u64 {
        writer.write_event(&CanEvent::new(T0 + i, 0x42, &[1, 2, 3, 4]))?;
    }
    writer.checkpoint().context("checkpointing stream")?;
    drop(writer); // abandoned without finalize

    let bytes = std::fs::read(&path)?;
    let (file_size, uncompressed_size, object_count) = header_totals(&bytes)?;
    ensure!(object_count == 10);
    ensure!(file_size == bytes.len() as u64);
    ensure!(uncompressed_size == (FILE_HEADER_SIZE + 10 * CLASSIC_RECORD_SIZE) as u64);
    ensure!(walk_containers(&bytes)?.len() == 1);
    Ok(())
}

#[test]
fn mixed_traffic_round_trips_through_default_options() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("mixed.blf");

    let mut fd = CanEvent::new(T0 + 1_000, 0x1FF, &[0xAB; 48]);
    fd.is_fd = true;
    fd.bitrate_switch = true;
    let mut error = CanEvent::new(T0 + 2_000, 0x7F0, &[]);
    error.is_error_frame = true;
    let mut extended = CanEvent::new(T0 + 3_000, 0x18DA_F110, &[9, 9]);
    extended.is_extended_id = true;

    let mut writer = BlfWriter::create(&path)?;
    writer.write_event(&CanEvent::new(T0, 0x123, &[0x12, 0x34, 0x56]))?;
    writer.write_event(&fd)?;
    writer.write_event(&error)?;
    writer.write_event(&extended)?;
    writer.finalize()?;

    let bytes = std::fs::read(&path)?;
    let (_, uncompressed_size, object_count) = header_totals(&bytes)?;
    ensure!(object_count == 4);
    // classic 48 + fd 116 + error 64 + classic 48
    ensure!(uncompressed_size == (FILE_HEADER_SIZE + 48 + 116 + 64 + 48) as u64);
    Ok(())
}
