//! Error types returned by fallible, non-fatal operations.
//!
//! Most failure modes in a ring log are not represented as [`Result`]s at all: an out-of-range
//! offset or a lookup of a log that was never configured is a programmer error, and the
//! [`Platform`](crate::platform::Platform) capability surface is expected to abort the process
//! rather than let the caller observe an inconsistent log. The errors below are reserved for the
//! two places a caller can legitimately hit trouble without it being a bug: building a
//! [`RingLogConfig`](crate::config::RingLogConfig) and opening the files it describes.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while validating a [`RingLogConfig`](crate::config::RingLogConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration named no logs at all.
    #[error("a ring log configuration must name at least one log")]
    NoLogs,

    /// The same log name was registered more than once.
    #[error("log name {name:?} was registered more than once")]
    DuplicateName {
        /// The name that collided.
        name: Box<str>,
    },

    /// `logs_partition_size` is so small that dividing it among the configured logs leaves
    /// each one without room for even a zero-byte entry.
    #[error(
        "logs_partition_size {logs_partition_size} split across {n_logs} logs leaves only \
         {log_capacity} bytes per log, below the minimum of {minimum}"
    )]
    CapacityTooSmall {
        /// The partition size the caller supplied.
        logs_partition_size: u32,
        /// The number of logs it was divided among.
        n_logs: usize,
        /// The capacity each log would be left with.
        log_capacity: u32,
        /// The smallest usable capacity, [`MIN_LOG_CAPACITY`](crate::format::MIN_LOG_CAPACITY).
        minimum: u16,
    },

    /// The derived per-log capacity does not fit in the on-disk `u16` offset fields.
    #[error(
        "logs_partition_size {logs_partition_size} split across {n_logs} logs yields a \
         per-log capacity of {log_capacity}, which does not fit in a u16 offset"
    )]
    CapacityTooLarge {
        /// The partition size the caller supplied.
        logs_partition_size: u32,
        /// The number of logs it was divided among.
        n_logs: usize,
        /// The derived, too-large capacity.
        log_capacity: u64,
    },
}

/// Errors that can occur while opening the files a [`RingLogConfig`](crate::config::RingLogConfig)
/// describes.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    /// The configuration itself was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Opening, creating, or pre-filling a log file failed.
    #[error("failed to open ring log file {path:?}: {source}")]
    Io {
        /// The file that could not be opened.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A log file already existed but its size did not match the configured capacity.
    #[error(
        "ring log file {path:?} has size {actual}, but the configured capacity requires {expected}"
    )]
    SizeMismatch {
        /// The file whose size disagreed with the configuration.
        path: PathBuf,
        /// The size the configuration expects.
        expected: u64,
        /// The size actually found on disk.
        actual: u64,
    },
}

/// Errors returned by [`LogManager::read_head`](crate::manager::LogManager::read_head).
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// There is no unread entry to read from.
    #[error("log {name:?} has no unread entry")]
    Empty {
        /// The log that was empty.
        name: Box<str>,
    },
}
