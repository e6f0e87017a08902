use crate::models::{BulkOutcome, Period, PeriodGap, PreviewPage, PreviewQuery, StoreId};

/// Repository interface for the crossing view and bulk liquidation.
///
/// The crossing merges, per store, the lines already consumed by closed
/// liquidations (sourced verbatim from their items) with the lines a run
/// would consume now (computed live through the same calculator), so a
/// caller sees total exposure regardless of liquidation status.
pub trait CrossingRepository: super::Repository {
    /// Build one page of the per-store crossing for a period.
    ///
    /// Results for a (user, period) may be served from a bounded-TTL cache;
    /// the cache is invalidated explicitly whenever a liquidation commits
    /// or an import is deleted, never left to expire after a write.
    fn preview_period(
        &self,
        user: &str,
        period: Period,
        query: &PreviewQuery,
    ) -> Result<PreviewPage, Self::Error>;

    /// Liquidate the selected stores for a period, one transaction per
    /// store.
    ///
    /// A store's failure never aborts the batch and never rolls back a
    /// store that already committed; the outcome lists both sides so an
    /// operator can retry exactly the failed stores.
    fn bulk_liquidate(
        &self,
        store_ids: &[StoreId],
        period: Period,
        actor: &str,
    ) -> Result<BulkOutcome, Self::Error>;

    /// Period-level gap between operator-reported commission and what was
    /// actually paid to stores. Informational; a negative difference is an
    /// overpayment alert, not a block.
    fn period_gap(&self, period: Period) -> Result<PeriodGap, Self::Error>;
}
