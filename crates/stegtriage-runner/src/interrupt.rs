//! Operator interrupt (Ctrl-C) tracking
//!
//! A single [`InterruptFlag`] is shared between the signal listener and the
//! native runner. While a tool is running the runner holds a [`BusyGuard`];
//! an interrupt arriving then is recorded and the runner kills the child.
//! An interrupt arriving while nothing is running terminates the process with
//! exit code 130.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Exit code used when the operator interrupts an idle process.
pub const INTERRUPT_EXIT_CODE: i32 = 130;

#[derive(Debug, Default)]
pub struct InterruptFlag {
    requested: AtomicBool,
    busy: AtomicUsize,
}

impl InterruptFlag {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Install a Ctrl-C listener on a background thread.
    ///
    /// Returns the shared flag to hand to [`NativeRunner`](crate::NativeRunner).
    pub fn install() -> std::io::Result<Arc<Self>> {
        let flag = Self::new();
        let listener = Arc::clone(&flag);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        std::thread::Builder::new()
            .name("stegtriage-interrupt".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    loop {
                        if tokio::signal::ctrl_c().await.is_err() {
                            return;
                        }
                        if !listener.signal() {
                            tracing::warn!("Interrupted by operator");
                            std::process::exit(INTERRUPT_EXIT_CODE);
                        }
                    }
                });
            })?;

        Ok(flag)
    }

    /// Record an interrupt. Returns `false` when no tool is running, meaning
    /// the caller should terminate the process instead.
    pub fn signal(&self) -> bool {
        if self.busy.load(Ordering::SeqCst) == 0 {
            return false;
        }
        self.requested.store(true, Ordering::SeqCst);
        true
    }

    /// Consume a pending interrupt.
    pub fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }

    /// Mark a tool as running until the guard is dropped.
    ///
    /// A request left over from an earlier busy window is discarded so it
    /// cannot interrupt the next tool.
    #[must_use]
    pub fn enter_busy(self: &Arc<Self>) -> BusyGuard {
        if self.busy.fetch_add(1, Ordering::SeqCst) == 0 {
            self.requested.store(false, Ordering::SeqCst);
        }
        BusyGuard {
            flag: Arc::clone(self),
        }
    }
}

/// Keeps the flag in the busy state while alive.
#[derive(Debug)]
pub struct BusyGuard {
    flag: Arc<InterruptFlag>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if self.flag.busy.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.flag.requested.store(false, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_when_idle_requests_exit() {
        let flag = InterruptFlag::new();
        assert!(!flag.signal());
        assert!(!flag.take());
    }

    #[test]
    fn test_signal_while_busy_is_recorded_once() {
        let flag = InterruptFlag::new();
        let guard = flag.enter_busy();
        assert!(flag.signal());
        assert!(flag.take());
        assert!(!flag.take());
        drop(guard);
        assert!(!flag.signal());
    }

    #[test]
    fn test_late_signal_does_not_reach_next_tool() {
        let flag = InterruptFlag::new();

        // Ctrl-C lands after the child exited but before the guard drops
        let first = flag.enter_busy();
        assert!(flag.signal());
        drop(first);

        let _second = flag.enter_busy();
        assert!(!flag.take());
    }

    #[test]
    fn test_stale_request_cleared_on_entry() {
        let flag = InterruptFlag::new();
        flag.requested.store(true, Ordering::SeqCst);
        let _guard = flag.enter_busy();
        assert!(!flag.take());
    }
}
