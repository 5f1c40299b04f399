//! Draw statistics for debugging and performance analysis.
//!
//! Enable with the `render-stats` feature:
//! ```bash
//! cargo test --features render-stats
//! ```
//!
//! When enabled, a summary is logged at `debug` level at most once per second
//! from [`end_pass`], covering:
//! - Draw passes
//! - Nodes visited and renderer procedures invoked
//! - Buffered surface re-renders versus cache hits
//! - Swallowed draw errors

/// Snapshot of accumulated draw statistics.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub draw_passes: u64,
    pub nodes_visited: u64,
    pub renderers_invoked: u64,
    pub buffered_rerenders: u64,
    pub buffered_cache_hits: u64,
    pub draw_errors: u64,
}

#[cfg(feature = "render-stats")]
mod inner {
    use std::cell::RefCell;
    use std::time::Instant;

    thread_local! {
        static STATS: RefCell<DrawStats> = RefCell::new(DrawStats::new());
    }

    struct DrawStats {
        counts: super::StatsSnapshot,
        last_print: Instant,
    }

    impl DrawStats {
        fn new() -> Self {
            Self {
                counts: super::StatsSnapshot::default(),
                last_print: Instant::now(),
            }
        }

        fn reset(&mut self) {
            *self = Self::new();
        }
    }

    fn bump(f: impl FnOnce(&mut super::StatsSnapshot)) {
        STATS.with(|s| f(&mut s.borrow_mut().counts));
    }

    #[inline]
    pub fn record_node_visited() {
        bump(|c| c.nodes_visited += 1);
    }

    /// Record one before- or after-children procedure call.
    #[inline]
    pub fn record_renderer_invoked() {
        bump(|c| c.renderers_invoked += 1);
    }

    #[inline]
    pub fn record_buffered_rerender() {
        bump(|c| c.buffered_rerenders += 1);
    }

    /// Record a buffered surface blitted without re-rendering its children.
    #[inline]
    pub fn record_buffered_cache_hit() {
        bump(|c| c.buffered_cache_hits += 1);
    }

    #[inline]
    pub fn record_draw_error() {
        bump(|c| c.draw_errors += 1);
    }

    /// Return a snapshot of the current stats.
    pub fn get_stats() -> super::StatsSnapshot {
        STATS.with(|s| s.borrow().counts.clone())
    }

    /// Reset all stats to zero (for test isolation).
    pub fn reset_stats() {
        STATS.with(|s| s.borrow_mut().reset());
    }

    /// Called at the end of each top-level draw pass.
    pub fn end_pass() {
        STATS.with(|s| {
            let mut stats = s.borrow_mut();
            stats.counts.draw_passes += 1;

            if stats.last_print.elapsed().as_secs() >= 1 {
                let c = &stats.counts;
                let buffered_total = c.buffered_rerenders + c.buffered_cache_hits;
                let hit_rate = if buffered_total > 0 {
                    (c.buffered_cache_hits as f64 / buffered_total as f64) * 100.0
                } else {
                    0.0
                };
                log::debug!(
                    "[draw stats] passes={} nodes={} renderers={} errors={}",
                    c.draw_passes,
                    c.nodes_visited,
                    c.renderers_invoked,
                    c.draw_errors
                );
                log::debug!(
                    "  buffered: rerenders={} cache_hits={} hit_rate={:.1}%",
                    c.buffered_rerenders,
                    c.buffered_cache_hits,
                    hit_rate
                );
                stats.last_print = Instant::now();
            }
        });
    }
}

#[cfg(feature = "render-stats")]
pub use inner::*;

// No-op implementations when feature is disabled - these get completely inlined away

#[cfg(not(feature = "render-stats"))]
#[inline(always)]
pub fn get_stats() -> StatsSnapshot {
    StatsSnapshot::default()
}

#[cfg(not(feature = "render-stats"))]
#[inline(always)]
pub fn reset_stats() {}

#[cfg(not(feature = "render-stats"))]
#[inline(always)]
pub fn record_node_visited() {}

#[cfg(not(feature = "render-stats"))]
#[inline(always)]
pub fn record_renderer_invoked() {}

#[cfg(not(feature = "render-stats"))]
#[inline(always)]
pub fn record_buffered_rerender() {}

#[cfg(not(feature = "render-stats"))]
#[inline(always)]
pub fn record_buffered_cache_hit() {}

#[cfg(not(feature = "render-stats"))]
#[inline(always)]
pub fn record_draw_error() {}

#[cfg(not(feature = "render-stats"))]
#[inline(always)]
pub fn end_pass() {}
