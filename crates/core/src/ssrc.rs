//! Synchronization source (SSRC) assignment for RTP encoders.
//!
//! SSRCs only have to differ between sessions that are live at the same
//! time (RFC 3550 §8.1). [`ProcessSsrc`] hands out values from a single
//! process-wide counter; wrap-around after 2^32 calls is accepted.

use std::sync::atomic::{AtomicU32, Ordering};

/// First counter value. The first SSRC handed out is `SSRC_BASE + 1`.
pub const SSRC_BASE: u32 = 0x1000_0000;

static PROCESS_COUNTER: AtomicU32 = AtomicU32::new(SSRC_BASE);

/// Source of SSRC values.
pub trait SsrcSource: Send + Sync {
    fn next_ssrc(&self) -> u32;
}

/// Process-wide monotonic counter. All instances share one counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessSsrc;

impl SsrcSource for ProcessSsrc {
    fn next_ssrc(&self) -> u32 {
        PROCESS_COUNTER
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1)
    }
}

/// Counter owned by one instance, for deterministic sequences.
#[derive(Debug)]
pub struct CounterSsrc {
    counter: AtomicU32,
}

impl CounterSsrc {
    /// The first value returned is `base + 1`.
    pub const fn new(base: u32) -> Self {
        Self {
            counter: AtomicU32::new(base),
        }
    }
}

impl Default for CounterSsrc {
    fn default() -> Self {
        Self::new(SSRC_BASE)
    }
}

impl SsrcSource for CounterSsrc {
    fn next_ssrc(&self) -> u32 {
        self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }
}

/// Random SSRC per call (RFC 3550 §8.1). Collisions are possible.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSsrc;

impl SsrcSource for RandomSsrc {
    fn next_ssrc(&self) -> u32 {
        rand::random::<u32>()
    }
}
