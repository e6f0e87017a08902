mod conditions;
mod consolidate;
mod identity;
mod imports;
mod ledger;
mod liquidate;
mod preview;
mod stores;

pub use conditions::ConditionRepository;
pub use consolidate::{ConsolidationRepository, ConsolidationSummary};
pub use identity::IdentityRepository;
pub use imports::{ImportDeleteFailure, ImportDeletion, ImportRepository};
pub use ledger::LedgerRepository;
pub use liquidate::{GenerationFailure, LiquidationRepository};
pub use preview::CrossingRepository;
pub use stores::StoreRepository;

/// Base trait for every port: ties the whole surface to one backend error
/// type.
///
/// Domain failures (a period already liquidated, a locked import) are NOT
/// backend errors; ports report them in a nested `Result` so callers can
/// tell "the store said no" apart from "the store broke".
pub trait Repository {
    /// The backend's unified error type
    type Error: std::error::Error + Send + Sync + 'static;
}

/// The marker trait a complete backend implements: the full reconciliation,
/// liquidation and ledger surface.
pub trait PayoutRepository:
    IdentityRepository
    + StoreRepository
    + ImportRepository
    + ConditionRepository
    + ConsolidationRepository
    + LiquidationRepository
    + LedgerRepository
    + CrossingRepository
{
}
