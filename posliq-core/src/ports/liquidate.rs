use crate::models::{
    GenerateOptions, Liquidation, LiquidationId, LiquidationItem, LiquidationSummary, Period,
    StoreId,
};

/// Why a generation run was rejected or failed for one store.
///
/// These abort only the affected store; in a bulk run other stores proceed
/// independently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum GenerationFailure {
    /// The targeted store does not exist
    #[error("store not found")]
    StoreNotFound,
    /// The store is inactive and cannot receive liquidations
    #[error("store is inactive")]
    StoreInactive,
    /// A closed liquidation already exists for this (store, period) and no
    /// version bump was requested
    #[error("period already liquidated (version {version})")]
    AlreadyLiquidated {
        /// The existing closed version
        version: i64,
    },
    /// No unconsumed consolidated line resolves to this store
    #[error("nothing to liquidate")]
    NothingToLiquidate,
    /// Lost a race for the store-period; safe to retry
    #[error("concurrent generation in progress, retry")]
    Conflict,
    /// The ledger credit could not be appended; the whole generation was
    /// rolled back, since a liquidation without its credit would break the
    /// ledger invariant
    #[error("ledger write failed: {0}")]
    LedgerWriteFailure(String),
    /// The store's transaction failed for a backend reason; everything for
    /// this store was rolled back
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Repository interface for materializing liquidations.
///
/// This port owns the system's core correctness guarantee: one transaction
/// inserts the liquidation and its items, marks every consumed source row,
/// and appends the store's ledger credit. A crash mid-operation leaves
/// either all of that or none of it.
pub trait LiquidationRepository: super::Repository {
    /// Generate the liquidation for one store and period.
    ///
    /// Selects all consolidated, unconsumed operator reports whose sales
    /// condition resolves to this store, prices each with the commission
    /// calculator, and commits atomically. Unpriceable lines are skipped
    /// with structured warnings; they never fail the run.
    ///
    /// # Returns
    ///
    /// - `Ok(Ok(summary))` when the liquidation committed
    /// - `Ok(Err(failure))` when it was rejected or rolled back for a
    ///   domain reason
    /// - `Err(error)` when the backend itself failed
    fn generate_for_store(
        &self,
        store_id: StoreId,
        period: Period,
        actor: &str,
        options: GenerateOptions,
    ) -> Result<Result<LiquidationSummary, GenerationFailure>, Self::Error>;

    /// Fetch a liquidation with its lines.
    fn get_liquidation(
        &self,
        liquidation_id: LiquidationId,
    ) -> Result<Option<(Liquidation, Vec<LiquidationItem>)>, Self::Error>;

    /// List all versions for a store-period, oldest first.
    fn list_liquidations(
        &self,
        store_id: StoreId,
        period: Period,
    ) -> Result<Vec<Liquidation>, Self::Error>;
}
