//! The log manager: the public contract for opening, reading, and writing ring logs.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use parking_lot::Mutex;

use crate::config::RingLogConfig;
use crate::error::{OpenError, ReadError};
use crate::format::{ENTRY_LEN_SIZE, FileHeader, HEADER_LEN};
use crate::io::{persist_header, read_wrap, seek_abs, write_wrap};
#[cfg(feature = "debug-tools")]
use crate::io::current_offset;
use crate::log_state::{RingLog, TailState};
use crate::platform::{Platform, StdPlatform};

/// Owns every configured log and serializes all access behind a single mutex, matching the
/// original's one-mutex-for-everything concurrency model: there is no separation between
/// readers and writers, and no per-log locking, because logs are small and operations are
/// brief enough that contention was never worth the complexity of finer-grained locking.
#[derive(Debug)]
pub struct LogManager<P: Platform = StdPlatform> {
    platform: P,
    logs: Mutex<Vec<RingLog>>,
}

impl LogManager<StdPlatform> {
    /// Opens every log named in `config`, creating and pre-filling files that do not exist yet.
    pub fn open(config: &RingLogConfig) -> Result<Self, OpenError> {
        Self::open_with_platform(config, StdPlatform)
    }
}

impl<P: Platform> LogManager<P> {
    /// Like [`open`](LogManager::open), but with an explicit [`Platform`] backing instead of
    /// the default [`StdPlatform`].
    pub fn open_with_platform(config: &RingLogConfig, platform: P) -> Result<Self, OpenError> {
        let capacity = config.log_capacity();
        let mut logs = Vec::new();
        for (name, path) in config.logs() {
            let to_open_err = |source: io::Error| OpenError::Io { path: path.to_path_buf(), source };

            let mut file = open_or_create(path, capacity, config.filler_byte()).map_err(to_open_err)?;

            let actual_len = file.metadata().map_err(to_open_err)?.len();
            if actual_len != u64::from(capacity) {
                return Err(OpenError::SizeMismatch {
                    path: path.to_path_buf(),
                    expected: u64::from(capacity),
                    actual: actual_len,
                });
            }

            file.seek(SeekFrom::Start(0)).map_err(to_open_err)?;
            let mut header_buf = [0u8; HEADER_LEN];
            file.read_exact(&mut header_buf).map_err(to_open_err)?;
            let header = FileHeader::from_bytes(header_buf);

            tracing::info!(
                target: "ring_log",
                log = name,
                capacity,
                head = header.head,
                tail = header.tail,
                "opened ring log",
            );

            logs.push(RingLog { name: name.into(), file, capacity, header, tail_state: TailState::Idle });
        }
        Ok(Self { platform, logs: Mutex::new(logs) })
    }

    /// Appends `data` to the log named `name`'s in-progress tail entry, starting a new one if
    /// none is in progress.
    ///
    /// Starting a new entry writes a placeholder zero-length prefix first, so the space it
    /// claims is immediately reflected on disk even before the first byte of payload lands;
    /// [`write_tail_complete`](Self::write_tail_complete) later rewrites that prefix with the
    /// entry's true length. If a write fails partway through, the entry is poisoned: later
    /// calls to `write_tail` for the same name are no-ops until the next
    /// `write_tail_complete`, which discards the poisoned entry without touching the on-disk
    /// tail.
    pub fn write_tail(&self, name: &str, data: &[u8]) {
        let mut logs = self.logs.lock();
        let log = find_log_mut(&mut logs, name, &self.platform);

        if log.tail_state == TailState::Poisoned {
            return;
        }

        let started_fresh = log.tail_state == TailState::Idle;
        if started_fresh {
            if let Err(e) = seek_abs(&mut log.file, log.capacity, log.header.tail, &self.platform) {
                tracing::warn!(target: "ring_log", log = name, error = %e, "seek to tail failed, poisoning entry");
                log.tail_state = TailState::Poisoned;
                return;
            }
            match write_wrap(log, &self.platform, true, &0u16.to_le_bytes()) {
                Ok(end_offset) => log.tail_state = TailState::Building { end_offset, running_len: 0 },
                Err(e) => {
                    tracing::warn!(target: "ring_log", log = name, error = %e, "writing entry placeholder failed");
                    log.tail_state = TailState::Poisoned;
                    return;
                },
            }
        } else if let TailState::Building { end_offset, .. } = log.tail_state {
            if let Err(e) = seek_abs(&mut log.file, log.capacity, end_offset, &self.platform) {
                tracing::warn!(target: "ring_log", log = name, error = %e, "seek to tail-in-progress failed");
                log.tail_state = TailState::Poisoned;
                return;
            }
        }

        match write_wrap(log, &self.platform, true, data) {
            Ok(end_offset) => {
                let TailState::Building { running_len, .. } = log.tail_state else {
                    unreachable!("just ensured tail_state is Building above");
                };
                #[expect(clippy::cast_possible_truncation, reason = "wraps like the on-disk u16 length field")]
                let added = data.len() as u16;
                log.tail_state =
                    TailState::Building { end_offset, running_len: running_len.wrapping_add(added) };
            },
            Err(e) => {
                tracing::warn!(target: "ring_log", log = name, error = %e, "write to tail entry failed");
                log.tail_state = TailState::Poisoned;
            },
        }
    }

    /// Commits the in-progress tail entry for `name`, making it visible to readers.
    ///
    /// A no-op if no entry is in progress. A poisoned entry (see
    /// [`write_tail`](Self::write_tail)) is silently discarded instead of committed.
    pub fn write_tail_complete(&self, name: &str) {
        let mut logs = self.logs.lock();
        let log = find_log_mut(&mut logs, name, &self.platform);

        let (end_offset, running_len) = match log.tail_state {
            TailState::Idle => return,
            TailState::Poisoned => {
                log.tail_state = TailState::Idle;
                return;
            },
            TailState::Building { end_offset, running_len } => (end_offset, running_len),
        };

        fatal_on_err(&self.platform, name, "seek to tail", seek_abs(
            &mut log.file,
            log.capacity,
            log.header.tail,
            &self.platform,
        ));
        fatal_on_err(
            &self.platform,
            name,
            "rewrite entry length prefix",
            write_wrap(log, &self.platform, false, &running_len.to_le_bytes()).map(|_| ()),
        );

        log.header.tail = end_offset;
        fatal_on_err(&self.platform, name, "persist header", persist_header(log, &self.platform));
        log.tail_state = TailState::Idle;

        tracing::debug!(target: "ring_log", log = name, len = running_len, "committed tail entry");
    }

    /// Whether `name` has at least one committed entry the reader has not yet consumed.
    pub fn has_unread(&self, name: &str) -> bool {
        let mut logs = self.logs.lock();
        find_log_mut(&mut logs, name, &self.platform).has_unread()
    }

    /// Reads up to `dst.len()` bytes of the oldest unread entry in `name`, starting at
    /// `*cursor` bytes into the entry and advancing `*cursor` by however many bytes were
    /// copied. Returns the number of bytes copied, which is `0` once the whole entry has been
    /// read.
    ///
    /// Does not consume the entry; call [`read_head_success`](Self::read_head_success) once
    /// the caller is done with it, which discards it regardless of how much of it was read.
    pub fn read_head(&self, name: &str, dst: &mut [u8], cursor: &mut usize) -> Result<usize, ReadError> {
        let mut logs = self.logs.lock();
        let log = find_log_mut(&mut logs, name, &self.platform);

        if !log.has_unread() {
            return Err(ReadError::Empty { name: name.into() });
        }

        fatal_on_err(&self.platform, name, "seek to head", seek_abs(
            &mut log.file,
            log.capacity,
            log.header.head,
            &self.platform,
        ));
        let mut len_buf = [0u8; ENTRY_LEN_SIZE];
        fatal_on_err(
            &self.platform,
            name,
            "read entry length prefix",
            read_wrap(log, &self.platform, Some(&mut len_buf), ENTRY_LEN_SIZE).map(|_| ()),
        );
        let entry_len = usize::from(u16::from_le_bytes(len_buf));

        let remaining = entry_len.saturating_sub(*cursor);
        if remaining == 0 {
            return Ok(0);
        }

        fatal_on_err(
            &self.platform,
            name,
            "skip already-read entry bytes",
            read_wrap(log, &self.platform, None, *cursor).map(|_| ()),
        );
        let to_read = dst.len().min(remaining);
        fatal_on_err(
            &self.platform,
            name,
            "read entry payload",
            read_wrap(log, &self.platform, Some(&mut dst[..to_read]), to_read).map(|_| ()),
        );
        *cursor += to_read;
        Ok(to_read)
    }

    /// Discards the oldest unread entry in `name`, advancing `head` past it regardless of how
    /// much of it callers actually read with [`read_head`](Self::read_head).
    pub fn read_head_success(&self, name: &str) {
        let mut logs = self.logs.lock();
        let log = find_log_mut(&mut logs, name, &self.platform);

        if !log.has_unread() {
            tracing::warn!(target: "ring_log", log = name, "read_head_success called with no unread entry");
            return;
        }

        fatal_on_err(&self.platform, name, "seek to head", seek_abs(
            &mut log.file,
            log.capacity,
            log.header.head,
            &self.platform,
        ));
        let mut len_buf = [0u8; ENTRY_LEN_SIZE];
        fatal_on_err(
            &self.platform,
            name,
            "read entry length prefix",
            read_wrap(log, &self.platform, Some(&mut len_buf), ENTRY_LEN_SIZE).map(|_| ()),
        );
        let entry_len = u16::from_le_bytes(len_buf);

        let next_head = match read_wrap(log, &self.platform, None, usize::from(entry_len)) {
            Ok(off) => off,
            Err(e) => self.platform.abort(&format!("ring log {name:?}: skip entry payload failed: {e}")),
        };
        log.header.head = next_head;
        fatal_on_err(&self.platform, name, "persist header", persist_header(log, &self.platform));
    }

    /// Debug-only consistency check: confirms a log's file is exactly `log_capacity` bytes
    /// long. Intended for tests and diagnostics, matching the original's `DEBUG`-gated
    /// `sanity_check_file_size`.
    #[cfg(feature = "debug-tools")]
    pub fn sanity_check_file_size(&self, name: &str) -> bool {
        let mut logs = self.logs.lock();
        let log = find_log_mut(&mut logs, name, &self.platform);
        let saved = current_offset(&mut log.file).unwrap_or(0);
        let Ok(actual) = log.file.seek(SeekFrom::End(0)) else {
            return false;
        };
        let _ = seek_abs(&mut log.file, log.capacity, saved, &self.platform);
        actual == u64::from(log.capacity)
    }

    /// Debug-only diagnostic: logs a log's capacity, cached header, and tail state at `debug`
    /// level. Matches the original's `DEBUG`-gated `debug_print`.
    #[cfg(feature = "debug-tools")]
    pub fn debug_dump(&self, name: &str) {
        let mut logs = self.logs.lock();
        let log = find_log_mut(&mut logs, name, &self.platform);
        tracing::debug!(
            target: "ring_log",
            log = name,
            capacity = log.capacity,
            head = log.header.head,
            tail = log.header.tail,
            tail_state = ?log.tail_state,
            "ring log state",
        );
    }
}

fn find_log_mut<'a>(logs: &'a mut [RingLog], name: &str, platform: &impl Platform) -> &'a mut RingLog {
    logs.iter_mut()
        .find(|log| &*log.name == name)
        .unwrap_or_else(|| platform.abort(&format!("ring log: no such log {name:?}")))
}

fn fatal_on_err<T>(platform: &impl Platform, name: &str, what: &str, result: io::Result<T>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => platform.abort(&format!("ring log {name:?}: {what} failed: {e}")),
    }
}

/// Opens `path`, creating and pre-filling it with `filler_byte` up to `capacity` bytes if it
/// does not exist yet, and reopening it afterward so the filesystem reports the true size.
fn open_or_create(path: &Path, capacity: u16, filler_byte: u8) -> io::Result<File> {
    match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            {
                let mut file = OpenOptions::new().read(true).write(true).create_new(true).open(path)?;
                file.write_all(&FileHeader::empty().to_bytes())?;
                let filler = vec![filler_byte; usize::from(capacity) - HEADER_LEN];
                file.write_all(&filler)?;
            }
            OpenOptions::new().read(true).write(true).open(path)
        },
        Err(e) => Err(e),
    }
}
