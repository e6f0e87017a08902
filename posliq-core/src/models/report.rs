use super::{ImportId, LiquidationItemId, Period, ReportId, SimcardId};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// One commission event as reported by the operator for a simcard.
///
/// Rows arrive raw from imports (`is_consolidated == false`) and are kept
/// untouched for audit. The period consolidator sums them into a single
/// consolidated row per (simcard, period); only consolidated rows are ever
/// consumed by a liquidation, and consumption (`liquidation_item_id` set)
/// happens at most once.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OperatorReport {
    /// Identifier of this row
    pub id: ReportId,
    /// The simcard this commission belongs to
    pub simcard_id: SimcardId,
    /// The upload that produced this row, if raw
    pub import_id: Option<ImportId>,
    /// Billing period
    pub period: Period,
    /// Operator cutoff date
    pub cutoff_date: Option<NaiveDate>,
    /// Activation date of the simcard
    pub activation_date: Option<NaiveDate>,
    /// First disbursement component
    pub commission_paid_80: Option<Decimal>,
    /// Second disbursement component
    pub commission_paid_20: Option<Decimal>,
    /// Explicit total, used when the split fields are absent
    pub total_commission: Option<Decimal>,
    /// Recharge amount attributed by the operator
    pub recharge_amount: Decimal,
    /// Opaque recharge-period token from the feed
    pub recharge_period: Option<String>,
    /// Payment percentage; feeds supply either `18` or `0.18`
    pub payment_percentage: Decimal,
    /// Whether this is the canonical consolidated row for its period
    pub is_consolidated: bool,
    /// The liquidation line that consumed this row, once liquidated
    pub liquidation_item_id: Option<LiquidationItemId>,
    /// Snapshot of the original upload row, for audit and export
    pub raw_payload: Option<serde_json::Value>,
}
