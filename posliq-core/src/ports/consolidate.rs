use crate::models::Period;

/// Outcome of one consolidation run.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct ConsolidationSummary {
    /// Simcards with raw rows in the period
    pub simcards: usize,
    /// Consolidated rows created
    pub created: usize,
    /// Consolidated rows whose totals were recomputed
    pub updated: usize,
    /// Simcards skipped because their consolidated row is already consumed
    /// by a liquidation
    pub skipped_consumed: usize,
}

/// Repository interface for merging raw operator uploads into the one
/// authoritative commission record per simcard-period.
pub trait ConsolidationRepository: super::Repository {
    /// Consolidate all raw rows of a period.
    ///
    /// Groups non-consolidated rows by simcard, sums the commission and
    /// recharge fields, and creates or updates the single consolidated row
    /// per (simcard, period). Raw rows are left untouched. Re-runnable:
    /// totals are always recomputed from the raw rows, never incrementally
    /// added, so running twice on unchanged data yields identical totals.
    ///
    /// A stale consolidated row whose simcard has no raw rows is left
    /// as-is. A consolidated row already consumed by a liquidation is never
    /// overwritten; it is counted in the summary instead.
    fn consolidate(&self, period: Period) -> Result<ConsolidationSummary, Self::Error>;
}
