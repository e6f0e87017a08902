use crate::models::{
    BalanceMovement, MovementId, NewMovement, Redemption, RedemptionStatus, StoreId,
};
use rust_decimal::Decimal;

/// Repository interface for the append-only balance ledger.
///
/// The ledger is the sole source of truth for a store's spendable balance:
/// the balance is exactly the sum of signed amounts of the store's active
/// movements. Nothing here ever updates an amount in place; corrections
/// append an offsetting movement or void an existing one.
pub trait LedgerRepository: super::Repository {
    /// Append a movement. Never updates an existing row.
    fn record_movement(&self, movement: &NewMovement) -> Result<BalanceMovement, Self::Error>;

    /// Current spendable balance of a store.
    ///
    /// Sums the signed amounts of all active movements. For a store with no
    /// ledger rows at all (legacy, pre-ledger data) the balance is derived
    /// directly from closed liquidations minus balance-affecting
    /// redemptions; the fallback produces the same number the ledger would
    /// have held and stops applying the moment the first movement lands.
    fn get_balance(&self, store_id: StoreId) -> Result<Decimal, Self::Error>;

    /// Void a movement, excluding it from the balance while keeping it for
    /// audit. Returns false if the movement does not exist or is already
    /// voided. The effect is visible to any subsequent balance query.
    fn void_movement(&self, movement_id: MovementId, actor: &str) -> Result<bool, Self::Error>;

    /// Movement history for a store, newest first.
    fn list_movements(
        &self,
        store_id: StoreId,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<BalanceMovement>, Self::Error>;

    /// Register a redemption request from the external workflow.
    ///
    /// Only the record is created here; the workflow debits the balance by
    /// appending a redemption movement when it approves or delivers.
    fn create_redemption(
        &self,
        store_id: StoreId,
        total_value: Decimal,
        status: RedemptionStatus,
    ) -> Result<Redemption, Self::Error>;
}
