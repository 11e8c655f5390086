//! Task and stage counters.
//!
//! With the `metrics` feature these feed the global `metrics` recorder; without it
//! every call is a no-op.

/// Releases the live-task gauge when a tracked task ends, panics included.
pub(crate) struct LiveTaskGuard {
    _private: (),
}

impl LiveTaskGuard {
    pub(crate) fn enter() -> Self {
        #[cfg(feature = "metrics")]
        {
            ::metrics::counter!("stageweld_tasks_spawned_total").increment(1);
            ::metrics::gauge!("stageweld_tasks_live").increment(1.0);
        }
        Self { _private: () }
    }
}

impl Drop for LiveTaskGuard {
    fn drop(&mut self) {
        #[cfg(feature = "metrics")]
        ::metrics::gauge!("stageweld_tasks_live").decrement(1.0);
    }
}

/// Count one error reported by a stage.
pub(crate) fn record_stage_error(_label: &'static str) {
    #[cfg(feature = "metrics")]
    ::metrics::counter!("stageweld_stage_errors_total", "kind" => _label).increment(1);
}
