use super::{ConditionId, Period, SimcardId, StoreId};
use rust_decimal::Decimal;

/// The commercial terms agreed for a simcard for one specific period.
///
/// Unique per (simcard, period); one row governs one period only, there is
/// no retroactive cross-period reuse. The condition is what attributes a
/// commission line to a store, so a consolidated report without one is an
/// orphan line.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SalesCondition {
    /// Identifier of this condition
    pub id: ConditionId,
    /// The simcard these terms apply to
    pub simcard_id: SimcardId,
    /// The store that sold the simcard
    pub store_id: StoreId,
    /// The one period governed by this row
    pub period: Period,
    /// Residual/commission percentage agreed with the store.
    ///
    /// Used raw in the multiplier, i.e. `2` means a multiplier numerator of
    /// `2`, not `0.02`.
    pub commission_percentage: Decimal,
    /// Agreed sale price, informational
    pub sale_price: Option<Decimal>,
}

/// Input for creating or replacing a sales condition.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NewSalesCondition {
    /// The simcard these terms apply to
    pub simcard_id: SimcardId,
    /// The store that sold the simcard
    pub store_id: StoreId,
    /// The one period governed by this row
    pub period: Period,
    /// Residual/commission percentage agreed with the store
    pub commission_percentage: Decimal,
    /// Agreed sale price, informational
    pub sale_price: Option<Decimal>,
}
