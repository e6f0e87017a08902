use super::{ImportId, Period, RechargeId, SimcardId};
use rust_decimal::Decimal;

/// A recharge amount attributed to a simcard for a period.
///
/// Multiple recharges per simcard-period may exist; the calculator sums
/// them.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Recharge {
    /// Identifier of this row
    pub id: RechargeId,
    /// The recharged simcard
    pub simcard_id: SimcardId,
    /// The upload that produced this row
    pub import_id: Option<ImportId>,
    /// Billing period
    pub period: Period,
    /// Recharged amount
    pub amount: Decimal,
    /// Free-form period label from the feed
    pub label: Option<String>,
}
