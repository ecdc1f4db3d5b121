// ── Engine configuration ──
//
// Built by the embedding application and handed to `LibraryEngine` —
// core never reads config files or touches disk.

use std::time::Duration;

/// Tuning knobs for a [`LibraryEngine`](crate::LibraryEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long first paint may be withheld waiting for the initial
    /// aggregation. The aggregation keeps running after the gate opens.
    pub bootstrap_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bootstrap_timeout: Duration::from_millis(300),
        }
    }
}
