//! Configuration: which logs to open, how large the partition they share is, and what byte to
//! pre-fill new files with.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::format::MIN_LOG_CAPACITY;

/// One log's name and backing file path, prior to capacity derivation.
#[derive(Debug, Clone)]
struct LogSpec {
    name: Box<str>,
    path: PathBuf,
}

/// Builds a [`RingLogConfig`].
///
/// Mirrors the original's `ring_log_config.c`: a fixed list of log names sharing one
/// `logs_partition_size`, and a `filler_byte` used to pre-fill newly created files.
#[derive(Debug, Clone)]
pub struct RingLogConfigBuilder {
    logs: Vec<LogSpec>,
    logs_partition_size: u32,
    filler_byte: u8,
}

impl RingLogConfigBuilder {
    /// Starts a builder for a partition of `logs_partition_size` bytes, shared across whatever
    /// logs are added with [`with_log`](Self::with_log).
    #[must_use]
    pub fn new(logs_partition_size: u32) -> Self {
        Self { logs: Vec::new(), logs_partition_size, filler_byte: 0 }
    }

    /// Registers a log by name and backing file path.
    #[must_use]
    pub fn with_log(mut self, name: impl Into<Box<str>>, path: impl Into<PathBuf>) -> Self {
        self.logs.push(LogSpec { name: name.into(), path: path.into() });
        self
    }

    /// Sets the byte new log files are pre-filled with before the header is written.
    ///
    /// Defaults to `0`, matching the original example configuration.
    #[must_use]
    pub fn filler_byte(mut self, filler_byte: u8) -> Self {
        self.filler_byte = filler_byte;
        self
    }

    /// Validates the configuration and derives each log's shared capacity.
    ///
    /// `log_capacity` is `logs_partition_size * 0.8 / n_logs`, rounded down: the same 80% split
    /// the original example configuration used, leaving headroom in the partition for whatever
    /// else shares the disk.
    pub fn build(self) -> Result<RingLogConfig, ConfigError> {
        let n_logs = self.logs.len();
        if n_logs == 0 {
            return Err(ConfigError::NoLogs);
        }
        for (i, a) in self.logs.iter().enumerate() {
            if self.logs[..i].iter().any(|b| b.name == a.name) {
                return Err(ConfigError::DuplicateName { name: a.name.clone() });
            }
        }

        let log_capacity_u64 = u64::from(self.logs_partition_size) * 4 / 5 / n_logs as u64;
        if log_capacity_u64 > u64::from(u16::MAX) {
            return Err(ConfigError::CapacityTooLarge {
                logs_partition_size: self.logs_partition_size,
                n_logs,
                log_capacity: log_capacity_u64,
            });
        }
        #[expect(clippy::cast_possible_truncation, reason = "just checked it fits above")]
        let log_capacity = log_capacity_u64 as u16;
        if log_capacity < MIN_LOG_CAPACITY {
            return Err(ConfigError::CapacityTooSmall {
                logs_partition_size: self.logs_partition_size,
                n_logs,
                log_capacity: u32::from(log_capacity),
                minimum: MIN_LOG_CAPACITY,
            });
        }

        Ok(RingLogConfig { logs: self.logs, log_capacity, filler_byte: self.filler_byte })
    }
}

/// A validated set of logs, each sharing the same derived capacity.
#[derive(Debug, Clone)]
pub struct RingLogConfig {
    logs: Vec<LogSpec>,
    log_capacity: u16,
    filler_byte: u8,
}

impl RingLogConfig {
    /// Starts building a configuration for a partition of `logs_partition_size` bytes.
    #[must_use]
    pub fn builder(logs_partition_size: u32) -> RingLogConfigBuilder {
        RingLogConfigBuilder::new(logs_partition_size)
    }

    /// The capacity every configured log shares, in bytes, including the 4-byte header.
    #[must_use]
    pub fn log_capacity(&self) -> u16 {
        self.log_capacity
    }

    /// The byte new log files are pre-filled with.
    #[must_use]
    pub fn filler_byte(&self) -> u8 {
        self.filler_byte
    }

    /// Iterates over the configured logs as `(name, path)` pairs.
    pub(crate) fn logs(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.logs.iter().map(|log| (&*log.name, log.path.as_path()))
    }
}
