//! Byte-level I/O helpers the wrap engine builds on: full reads/writes that retry on
//! interruption, and a bounds-checked absolute seek.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::platform::Platform;

/// Reads exactly `buf.len()` bytes, retrying on `Interrupted` and treating a short read as an
/// unexpected EOF rather than silently returning less than was asked for.
pub(crate) fn full_read(file: &mut File, buf: &mut [u8]) -> io::Result<()> {
    let mut read = 0;
    while read < buf.len() {
        match file.read(&mut buf[read..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "ring log file ended before the expected byte count was read",
                ));
            },
            Ok(n) => read += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Writes exactly `buf.len()` bytes, retrying on `Interrupted`.
pub(crate) fn full_write(file: &mut File, buf: &[u8]) -> io::Result<()> {
    let mut written = 0;
    while written < buf.len() {
        match file.write(&buf[written..]) {
            Ok(0) => return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0 bytes")),
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Seeks to an absolute ring offset, aborting if it falls outside `[0, capacity)`.
///
/// Every offset the wrap engine seeks to is either derived by wrapping modulo `capacity` (and so
/// always in range) or read back from the on-disk header. An out-of-range offset here means the
/// header was corrupted or the caller passed an offset from a different log's configuration;
/// either way it is a bug, not a condition a caller can recover from.
pub(crate) fn seek_abs(
    file: &mut File,
    capacity: u16,
    off: u16,
    platform: &impl Platform,
) -> io::Result<()> {
    if off >= capacity {
        platform.abort(&format!("ring log: offset {off} is out of range for capacity {capacity}"));
    }
    file.seek(SeekFrom::Start(u64::from(off)))?;
    Ok(())
}

/// Returns the file's current absolute position, which the wrap engine always keeps in
/// `[0, capacity)`.
pub(crate) fn current_offset(file: &mut File) -> io::Result<u16> {
    let pos = file.stream_position()?;
    Ok(u16::try_from(pos).expect("ring log file positions are always within a u16-sized capacity"))
}
