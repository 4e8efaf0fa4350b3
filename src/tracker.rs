use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Accounting sink shared by every page of a heap.
///
/// Pages on different threads report into the same tracker, so implementors
/// own whatever synchronization is needed.
pub trait AllocatedSizeTracker: Send + Sync {
    /// A fixed block page ran out of cells. `bytes` is its whole cell extent.
    fn on_page_overflow(&self, bytes: usize);

    /// A fixed block page finished sweeping with `live_bytes` still in use.
    fn after_sweep(&self, live_bytes: usize);

    fn record_difference(&self, delta: isize, minor: bool);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub allocated_bytes: usize,
    pub page_overflows: usize,
    pub swept_live_bytes: usize,
}

pub struct HeapSizeTracker {
    allocated_bytes: AtomicUsize,
    page_overflows: AtomicUsize,
    swept_live_bytes: AtomicUsize,
    threshold: usize,
    collection_requested: AtomicBool,
}

impl Default for HeapSizeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapSizeTracker {
    pub const fn new() -> Self {
        Self::with_threshold(usize::MAX)
    }

    pub const fn with_threshold(threshold: usize) -> Self {
        Self {
            allocated_bytes: AtomicUsize::new(0),
            page_overflows: AtomicUsize::new(0),
            swept_live_bytes: AtomicUsize::new(0),
            threshold,
            collection_requested: AtomicBool::new(false),
        }
    }

    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            allocated_bytes: self.allocated_bytes(),
            page_overflows: self.page_overflows.load(Ordering::Relaxed),
            swept_live_bytes: self.swept_live_bytes.load(Ordering::Relaxed),
        }
    }

    pub fn take_swept_live_bytes(&self) -> usize {
        self.swept_live_bytes.swap(0, Ordering::Relaxed)
    }

    pub fn take_collection_request(&self) -> bool {
        self.collection_requested.swap(false, Ordering::AcqRel)
    }

    fn add(&self, bytes: usize) -> usize {
        self.allocated_bytes.fetch_add(bytes, Ordering::Relaxed) + bytes
    }

    fn sub(&self, bytes: usize) {
        let _ = self
            .allocated_bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(bytes))
            });
    }

    fn check_threshold(&self, allocated: usize) {
        if allocated >= self.threshold && !self.collection_requested.swap(true, Ordering::AcqRel) {
            log::info!(
                "allocated bytes {} reached threshold {}, requesting collection",
                allocated,
                self.threshold
            );
        }
    }
}

impl AllocatedSizeTracker for HeapSizeTracker {
    fn on_page_overflow(&self, bytes: usize) {
        self.page_overflows.fetch_add(1, Ordering::Relaxed);

        let allocated = self.add(bytes);
        self.check_threshold(allocated);
    }

    fn after_sweep(&self, live_bytes: usize) {
        self.swept_live_bytes.fetch_add(live_bytes, Ordering::Relaxed);
    }

    fn record_difference(&self, delta: isize, minor: bool) {
        if delta >= 0 {
            let allocated = self.add(delta.unsigned_abs());

            if !minor {
                self.check_threshold(allocated);
            }
        } else {
            self.sub(delta.unsigned_abs());
        }
    }
}
