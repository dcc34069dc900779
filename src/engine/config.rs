//! Engine configuration options.

/// Per-contract engine settings. These don't change settlement semantics.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Trace every recorded event at debug level.
    pub verbose: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_events: 10_000,
            verbose: false,
        }
    }
}
