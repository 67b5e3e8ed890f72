//! The wrap-aware stream engine: byte-at-a-time transfers that skip the file header and wrap at
//! `log_capacity`, plus the lazy eviction `write_wrap` performs to make room for an entry-mode
//! write.

use std::io::{self, Seek, SeekFrom};

use super::byte_io::{current_offset, full_read, full_write, seek_abs};
use crate::format::{ENTRY_LEN_SIZE, HEADER_LEN};
use crate::log_state::RingLog;
use crate::platform::Platform;

/// Writes the 4-byte header back to its fixed home at the start of the file, restoring the
/// caller's previous file position afterward.
///
/// Header writes are never wrapped or skipped past: the header lives outside the ring region
/// entirely, at a fixed absolute offset.
pub(crate) fn persist_header(log: &mut RingLog, platform: &impl Platform) -> io::Result<()> {
    let saved = current_offset(&mut log.file)?;
    log.file.seek(SeekFrom::Start(0))?;
    full_write(&mut log.file, &log.header.to_bytes())?;
    seek_abs(&mut log.file, log.capacity, saved, platform)?;
    Ok(())
}

/// Advances one ring offset forward, wrapping `capacity - 1` back to `0`, and seeks the file
/// there.
///
/// Offsets `0..HEADER_LEN` are header bytes, not ring bytes; landing on one is not an error; it
/// is how wrapping naturally steps over the header on its way from the last ring byte back to
/// the first; [`read_wrap`] and [`write_wrap`] skip transferring at such offsets rather than
/// treating them specially here.
fn advance(log: &mut RingLog, off: u16, platform: &impl Platform) -> io::Result<u16> {
    let next = if off + 1 == log.capacity { 0 } else { off + 1 };
    seek_abs(&mut log.file, log.capacity, next, platform)?;
    Ok(next)
}

/// Transfers `len` bytes starting at the file's current position, wrapping at `log.capacity`
/// and skipping over header bytes along the way. When `dst` is `None` the bytes are read and
/// discarded, which is how callers skip over already-consumed entry bytes.
///
/// Returns the ring offset immediately after the last byte transferred (always outside the
/// header region, even if `len` is `0` and the starting offset was inside it).
pub(crate) fn read_wrap(
    log: &mut RingLog,
    platform: &impl Platform,
    mut dst: Option<&mut [u8]>,
    len: usize,
) -> io::Result<u16> {
    let mut off = current_offset(&mut log.file)?;
    let mut transferred = 0usize;
    while transferred < len || usize::from(off) < HEADER_LEN {
        if usize::from(off) >= HEADER_LEN {
            if let Some(buf) = dst.as_deref_mut() {
                full_read(&mut log.file, &mut buf[transferred..=transferred])?;
            } else {
                let mut scratch = [0u8; 1];
                full_read(&mut log.file, &mut scratch)?;
            }
            transferred += 1;
        }
        off = advance(log, off, platform)?;
    }
    Ok(off)
}

/// Transfers `src` starting at the file's current position, wrapping at `log.capacity` and
/// skipping over header bytes along the way.
///
/// When `is_entry` is set (appending user payload, as opposed to rewriting a length prefix at
/// commit time), writing into the oldest unread entry's first byte evicts that entry first:
/// its length prefix is read, its payload skipped, `head` advances past it, and the updated
/// header is persisted immediately so the eviction survives a crash even if the write that
/// provoked it does not complete. Only one entry is evicted per byte; a write spanning many
/// evicted entries evicts them one at a time as it reaches each one.
pub(crate) fn write_wrap(
    log: &mut RingLog,
    platform: &impl Platform,
    is_entry: bool,
    src: &[u8],
) -> io::Result<u16> {
    let mut off = current_offset(&mut log.file)?;
    let mut written = 0usize;
    while written < src.len() {
        if usize::from(off) >= HEADER_LEN {
            if is_entry && off == log.header.head && log.has_unread() {
                evict_oldest(log, platform)?;
                seek_abs(&mut log.file, log.capacity, off, platform)?;
            }
            full_write(&mut log.file, &src[written..=written])?;
            written += 1;
        }
        off = advance(log, off, platform)?;
    }
    Ok(off)
}

/// Discards the oldest unread entry: reads its length prefix, skips its payload, advances
/// `head` past it, and persists the header.
fn evict_oldest(log: &mut RingLog, platform: &impl Platform) -> io::Result<()> {
    let saved = current_offset(&mut log.file)?;
    seek_abs(&mut log.file, log.capacity, log.header.head, platform)?;

    let mut len_buf = [0u8; ENTRY_LEN_SIZE];
    read_wrap(log, platform, Some(&mut len_buf), ENTRY_LEN_SIZE)?;
    let entry_len = u16::from_le_bytes(len_buf);

    let new_head = read_wrap(log, platform, None, usize::from(entry_len))?;

    let evicted_name = log.name.clone();
    log.header.head = new_head;
    persist_header(log, platform)?;
    tracing::debug!(
        target: "ring_log",
        log = %evicted_name,
        evicted_len = entry_len,
        new_head,
        "evicted oldest entry to make room",
    );

    seek_abs(&mut log.file, log.capacity, saved, platform)?;
    Ok(())
}
