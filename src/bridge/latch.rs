use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Install-once latch.
///
/// The first `install` activates; every later call is counted and otherwise
/// ignored, so a remounting host never ends up with two active listeners.
#[derive(Debug, Default)]
pub struct InstallLatch {
    installed: AtomicBool,
    attempts: AtomicUsize,
}

impl InstallLatch {
    /// Returns true only for the call that actually installed.
    pub fn install(&self) -> bool {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        !self.installed.swap(true, Ordering::SeqCst)
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    /// Number of install calls, including ignored repeats.
    pub fn install_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Single-occupancy latch for delegated execution.
///
/// A second entry while one is in flight is refused, not queued.
#[derive(Debug, Default)]
pub struct InFlightLatch {
    busy: AtomicBool,
}

impl InFlightLatch {
    pub fn try_enter(&self) -> Option<InFlightGuard<'_>> {
        if self.busy.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(InFlightGuard { latch: self })
        }
    }
}

/// Releases the latch on drop, including during unwinding.
pub struct InFlightGuard<'a> {
    latch: &'a InFlightLatch,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.latch.busy.store(false, Ordering::SeqCst);
    }
}
