//! Sync guard.
//!
//! Decides whether a freshly parsed export may replace the live generation.
//! An empty export never replaces data: sheet exports occasionally come back
//! empty while the sheet is being edited. Optionally, a large drop in the
//! record count is refused as well.

/// Guard configuration.
#[derive(Debug, Clone, Default)]
pub struct SyncGuardConfig {
    /// Maximum allowed drop percentage (0-100). `None` disables the check.
    pub max_drop_percent: Option<u8>,
    /// Below this live count the drop check is skipped.
    pub min_baseline: usize,
}

/// Guard for the replace step of a sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncGuard {
    config: SyncGuardConfig,
}

/// Result of a guard check.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    /// Safe to replace
    Proceed {
        current_count: usize,
        previous_count: usize,
    },
    /// Nothing live yet, or below the baseline
    ColdStart { current_count: usize },
    /// Export parsed to zero records; keep the live generation
    EmptyExport { previous_count: usize },
    /// Drop exceeds the configured threshold; keep the live generation
    Dropped {
        current_count: usize,
        previous_count: usize,
        drop_percent: f64,
    },
}

impl GuardDecision {
    pub fn allows_replace(&self) -> bool {
        matches!(
            self,
            GuardDecision::Proceed { .. } | GuardDecision::ColdStart { .. }
        )
    }
}

impl SyncGuard {
    /// Create a guard that only refuses empty exports.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a guard with custom configuration.
    pub fn with_config(config: SyncGuardConfig) -> Self {
        Self { config }
    }

    /// Guard configured with a maximum drop percentage.
    pub fn with_max_drop(max_drop_percent: Option<u8>) -> Self {
        Self::with_config(SyncGuardConfig {
            max_drop_percent,
            min_baseline: 10,
        })
    }

    /// Check whether `current_count` records may replace `previous_count`.
    pub fn check(&self, current_count: usize, previous_count: usize) -> GuardDecision {
        if current_count == 0 {
            return GuardDecision::EmptyExport { previous_count };
        }

        if previous_count == 0 || previous_count < self.config.min_baseline {
            return GuardDecision::ColdStart { current_count };
        }

        if let Some(max_drop) = self.config.max_drop_percent {
            if current_count < previous_count {
                let drop = previous_count - current_count;
                let drop_percent = (drop as f64 / previous_count as f64) * 100.0;
                if drop_percent > f64::from(max_drop) {
                    return GuardDecision::Dropped {
                        current_count,
                        previous_count,
                        drop_percent,
                    };
                }
            }
        }

        GuardDecision::Proceed {
            current_count,
            previous_count,
        }
    }

    /// Check and log the decision.
    pub fn evaluate(&self, current_count: usize, previous_count: usize) -> GuardDecision {
        let decision = self.check(current_count, previous_count);
        match &decision {
            GuardDecision::Proceed {
                current_count,
                previous_count,
            } => log::info!(
                "Sync guard: PROCEED ({} records, was {})",
                current_count,
                previous_count
            ),
            GuardDecision::ColdStart { current_count } => log::info!(
                "Sync guard: COLD START ({} records, nothing live or below baseline)",
                current_count
            ),
            GuardDecision::EmptyExport { previous_count } => log::warn!(
                "Sync guard: EMPTY EXPORT - keeping {} live records",
                previous_count
            ),
            GuardDecision::Dropped {
                current_count,
                previous_count,
                drop_percent,
            } => log::error!(
                "Sync guard: REFUSED {} → {} records ({:.1}% drop > {}% threshold)",
                previous_count,
                current_count,
                drop_percent,
                self.config.max_drop_percent.unwrap_or(100)
            ),
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_export_never_replaces() {
        let guard = SyncGuard::new();
        assert_eq!(
            guard.check(0, 100),
            GuardDecision::EmptyExport { previous_count: 100 }
        );
        assert!(!guard.check(0, 0).allows_replace());
    }

    #[test]
    fn test_cold_start() {
        let guard = SyncGuard::with_max_drop(Some(20));
        assert!(matches!(
            guard.check(50, 0),
            GuardDecision::ColdStart { current_count: 50 }
        ));
        assert!(guard.check(1, 5).allows_replace());
    }

    #[test]
    fn test_default_guard_allows_any_drop() {
        let guard = SyncGuard::new();
        assert!(guard.check(1, 1000).allows_replace());
    }

    #[test]
    fn test_drop_threshold() {
        let guard = SyncGuard::with_max_drop(Some(20));
        assert!(guard.check(85, 100).allows_replace());
        assert!(matches!(
            guard.check(70, 100),
            GuardDecision::Dropped { .. }
        ));
        assert!(guard.check(150, 100).allows_replace());
    }
}
