//! Statistics hooks: a no-op sink by default. Gated by the `stats` feature;
//! when disabled every call site compiles away to nothing.

/// One countable event raised by a pass, collapsed to a single enum since
/// this crate has no backend-specific counters to add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatEvent {
    /// A local-optimization rewrite fired (CSE hit, algebraic identity, or
    /// constant fold).
    LocalOptRewrite,
    /// A node was killed.
    NodeKilled,
    /// A jump-threading rewrite fired.
    JumpThreaded,
    /// An SSA-reconstruction Phi was inserted.
    PhiInserted,
    /// A graph was collected as unreachable.
    GraphCollected,
}

/// A sink for [`StatEvent`]s. The default sink drops everything; a caller
/// wanting counters installs their own via [`set_sink`].
pub trait StatsSink: Send + Sync {
    /// Record one occurrence of `event`.
    fn record(&self, event: StatEvent);
}

struct NullSink;
impl StatsSink for NullSink {
    fn record(&self, _event: StatEvent) {}
}

#[cfg(feature = "stats")]
static SINK: std::sync::OnceLock<Box<dyn StatsSink>> = std::sync::OnceLock::new();

/// Install a non-default sink. Only effective with the `stats` feature
/// enabled; otherwise a no-op, since [`record`] itself compiles to nothing.
#[cfg(feature = "stats")]
pub fn set_sink(sink: Box<dyn StatsSink>) {
    let _ = SINK.set(sink);
}

#[cfg(not(feature = "stats"))]
/// Install a non-default sink. Only effective with the `stats` feature
/// enabled; otherwise a no-op, since [`record`] itself compiles to nothing.
pub fn set_sink(_sink: Box<dyn StatsSink>) {}

/// Record one occurrence of `event`. Compiles to nothing unless the
/// `stats` feature is enabled.
#[cfg(feature = "stats")]
pub fn record(event: StatEvent) {
    SINK.get_or_init(|| Box::new(NullSink)).record(event);
}

/// Record one occurrence of `event`. Compiles to nothing unless the
/// `stats` feature is enabled.
#[cfg(not(feature = "stats"))]
pub fn record(_event: StatEvent) {}

#[cfg(all(test, feature = "stats"))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink(AtomicUsize);
    impl StatsSink for CountingSink {
        fn record(&self, _event: StatEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn default_sink_does_not_panic() {
        record(StatEvent::NodeKilled);
    }
}
