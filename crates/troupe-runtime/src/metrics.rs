//! Per-frame scheduler metrics.
//!
//! [`FrameMetrics`] captures what one [`Runtime::tick`](crate::Runtime::tick)
//! did, for telemetry and budget tuning. Cumulative loader counters live
//! separately in [`troupe_loader::LoaderStats`].

use troupe_core::FrameId;

/// Counters and gauges for a single frame pass.
///
/// Counter fields reset to zero each tick; the trailing gauges are
/// end-of-frame snapshots. The runtime keeps the most recent value
/// readable via [`last_metrics`](crate::Runtime::last_metrics).
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameMetrics {
    /// The frame this pass produced.
    pub frame: FrameId,
    /// Wall-clock time for the whole tick, in microseconds.
    pub total_us: u64,
    /// Deferred `init` calls run this frame.
    pub inits_run: u32,
    /// `update` calls run this frame.
    pub updates_run: u32,
    /// Actors skipped because their category was frozen.
    pub frozen_skipped: u32,
    /// Actors soft-killed because their module vanished underneath them.
    pub dependency_kills: u32,
    /// `destroy` calls run this frame.
    pub destroys_run: u32,
    /// Actor slots physically reclaimed this frame.
    pub deleted: u32,
    /// Callback-queued spawn requests drained after the pass.
    pub spawn_requests_drained: u32,
    /// Drained spawn requests that failed (cap, memory, resolution).
    pub spawn_failures: u32,
    /// Module source bytes copied by the staged-load poll this frame.
    pub staged_bytes_copied: u32,
    /// Live actors after the frame.
    pub live_actors: u32,
    /// Tracked modules after the frame.
    pub resident_modules: u32,
    /// Arena bytes allocated after the frame.
    pub arena_allocated: u32,
    /// Largest contiguous free arena range after the frame.
    pub arena_max_free_block: u32,
}
