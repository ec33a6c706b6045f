//! Fatal-error diagnostics, gated behind an optional `backtrace` feature.

/// Log a fatal condition at error level, capturing a backtrace when the
/// `backtrace` feature is enabled. Called by the [`crate::fatal`] macro;
/// not normally invoked directly.
pub fn report_fatal(message: &str) {
    #[cfg(feature = "backtrace")]
    {
        let bt = backtrace::Backtrace::new();
        tracing::error!(%message, backtrace = ?bt, "fatal IR invariant violation");
    }
    #[cfg(not(feature = "backtrace"))]
    {
        tracing::error!(%message, "fatal IR invariant violation");
    }
}
