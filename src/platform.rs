//! The platform capability surface.
//!
//! The original ring log left mutual exclusion and fatal-abort behind a small arch layer so the
//! same core logic could run atop either a POSIX mutex or an RTOS binary semaphore. Mutual
//! exclusion itself is handled here by a `parking_lot::Mutex` held inside
//! [`LogManager`](crate::manager::LogManager): its guard is released on every exit path
//! (including panics) by `Drop`, which is a strictly stronger guarantee than the paired
//! acquire/release calls the original arch layer required callers to balance by hand. What
//! remains a genuine capability to abstract is the "this should never happen, stop the world"
//! primitive, since that differs by target: a hosted process aborts itself, while an embedded
//! task deletes itself and lets its supervisor restart it.
use std::fmt;

/// The fatal-path half of the platform capability surface.
///
/// Implementors must not return from [`abort`](Platform::abort). On a hosted target that means
/// terminating the process; on an embedded target running under a preemptive scheduler it would
/// mean deleting the current task so a supervisor can restart it.
pub trait Platform: fmt::Debug + Send + Sync + 'static {
    /// Logs `msg` and then terminates, never returning.
    fn abort(&self, msg: &str) -> !;
}

/// The host-thread backing: aborts the whole process.
///
/// This is the counterpart of the original's POSIX arch implementation, which called
/// `pthread_mutex` directly and `abort()` on unrecoverable error; the mutex half of that split
/// is now `parking_lot::Mutex`, so this type only needs to carry the abort behavior.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StdPlatform;

impl Platform for StdPlatform {
    fn abort(&self, msg: &str) -> ! {
        tracing::error!(target: "ring_log", "{msg}");
        std::process::abort();
    }
}
