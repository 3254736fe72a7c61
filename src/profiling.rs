//! Lightweight CPU profiling scopes.
//!
//! Profiling is an observability concern injected around block and pass
//! execution spans; it is not part of the scheduling contract. Spans are
//! reported through the `log` facade at trace level, so they cost a level
//! check when tracing is disabled.

use std::time::Instant;

/// Log target used for all profiling output.
pub const PROFILING_TARGET: &str = "vantage::profiling";

/// RAII scope that reports its wall-clock duration when dropped.
///
/// ```ignore
/// let _scope = ProfilingScope::new("main_opaque");
/// // ... execute the block ...
/// // duration logged on drop
/// ```
pub struct ProfilingScope {
    label: &'static str,
    start: Option<Instant>,
}

impl ProfilingScope {
    /// Open a new profiling scope.
    pub fn new(label: &'static str) -> Self {
        let start = log::log_enabled!(target: PROFILING_TARGET, log::Level::Trace)
            .then(Instant::now);
        Self { label, start }
    }
}

impl Drop for ProfilingScope {
    fn drop(&mut self) {
        if let Some(start) = self.start {
            log::trace!(
                target: PROFILING_TARGET,
                "{}: {:.1}us",
                self.label,
                start.elapsed().as_secs_f64() * 1e6
            );
        }
    }
}

/// Open a profiling scope for the rest of the current block.
#[macro_export]
macro_rules! profile_scope {
    ($label:literal) => {
        let _profiling_scope = $crate::profiling::ProfilingScope::new($label);
    };
}
