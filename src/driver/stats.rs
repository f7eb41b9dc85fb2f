//! Per-run extraction statistics
//!
//! Tracks outcome counts and human-readable failure descriptions for
//! one driver pass, for CLI summaries and caller-side policy.

/// Simple extraction statistics for one pass over one source
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IngestStats {
    /// Total scan outcomes produced (particles + failures)
    pub outcomes_total: usize,

    /// Number of particles successfully decoded
    pub particles_decoded: usize,

    /// Number of spans lost to corruption or decode failures
    pub failures: usize,

    /// Human-readable failure descriptions for diagnostics
    pub errors: Vec<String>,
}

impl IngestStats {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self {
            outcomes_total: 0,
            particles_decoded: 0,
            failures: 0,
            errors: Vec::new(),
        }
    }

    /// Calculate success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.outcomes_total == 0 {
            0.0
        } else {
            (self.particles_decoded as f64 / self.outcomes_total as f64) * 100.0
        }
    }

    /// True when every scanned span decoded to a particle
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

impl Default for IngestStats {
    fn default() -> Self {
        Self::new()
    }
}
