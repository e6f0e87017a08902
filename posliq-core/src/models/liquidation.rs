use super::{
    ConditionId, Iccid, LiquidationId, LiquidationItemId, Period, ReportId, StoreId,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

/// Status of a liquidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidationStatus {
    /// Working copy, not yet balance-affecting
    Draft,
    /// Closed financial statement; immutable, corrections go through a new
    /// version
    Closed,
}

impl LiquidationStatus {
    /// Stable string form used for storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Closed => "closed",
        }
    }
}

impl std::str::FromStr for LiquidationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(Self::Draft),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown liquidation status: {other}")),
        }
    }
}

/// A financial statement paying one store for one period's commissions.
///
/// At most one closed liquidation exists per (store, period, version).
/// Closed liquidations are immutable; a correction creates a new version
/// and the superseded one remains for audit.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Liquidation {
    /// Identifier of this liquidation
    pub id: LiquidationId,
    /// The paid store
    pub store_id: StoreId,
    /// Billing period being paid
    pub period: Period,
    /// Version, starting at 1; bumped by corrective regeneration
    pub version: i64,
    /// Sum of raw commission figures across the items
    pub gross_amount: Decimal,
    /// Sum of final payable amounts; the store's spendable credit
    pub net_amount: Decimal,
    /// Draft or closed
    pub status: LiquidationStatus,
    /// When the liquidation was materialized
    pub created_at: DateTime<Utc>,
    /// Operator who triggered the generation
    pub created_by: String,
}

/// One simcard-level computed line within a liquidation.
///
/// Carries the full calculation breakdown plus denormalized audit fields so
/// an export never needs to re-derive anything. Created atomically with its
/// parent; never mutated.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LiquidationItem {
    /// Identifier of this line
    pub id: LiquidationItemId,
    /// Parent liquidation
    pub liquidation_id: LiquidationId,
    /// The consolidated operator report this line consumed
    pub report_id: ReportId,
    /// The sales condition that priced this line
    pub condition_id: ConditionId,
    /// Denormalized canonical ICCID
    pub iccid: Iccid,
    /// Denormalized activation date
    pub activation_date: Option<NaiveDate>,
    /// Denormalized operator cutoff date
    pub cutoff_date: Option<NaiveDate>,
    /// Total commission before any discount
    pub raw_commission: Decimal,
    /// Recharge-derived discount
    pub recharge_discount: Decimal,
    /// Commission after discount; may be negative
    pub commission_after_discount: Decimal,
    /// Applied multiplier (store residual rate over payment percentage)
    pub multiplier: Decimal,
    /// Final payable amount, rounded to 2 decimals
    pub final_amount: Decimal,
}

/// Options for a generation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Regenerate a period that already has a closed liquidation: re-opens
    /// the superseded version's source rows, voids its ledger credit and
    /// produces the next version. Without this flag such a run fails with
    /// `AlreadyLiquidated`.
    pub new_version: bool,
}

/// Why a line was skipped or flagged during calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineWarningKind {
    /// Payment percentage was zero or absent; the line cannot be priced
    MissingRateBasis,
    /// Neither the split commission fields nor the explicit total were
    /// present
    MissingCommissionBasis,
    /// The recharge discount exceeded the commission; the negative value
    /// was propagated, not clamped
    NegativeCommission,
}

/// A structured, non-fatal calculation warning attached to a generation
/// result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LineWarning {
    /// The affected simcard
    pub iccid: Iccid,
    /// What happened
    pub kind: LineWarningKind,
}

/// Outcome of a successful generation run for one store.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LiquidationSummary {
    /// The materialized liquidation
    pub liquidation_id: LiquidationId,
    /// The paid store
    pub store_id: StoreId,
    /// Billing period
    pub period: Period,
    /// Version that was produced
    pub version: i64,
    /// Sum of raw commissions
    pub gross_amount: Decimal,
    /// Net payable credited to the store's balance
    pub net_amount: Decimal,
    /// Number of consumed lines
    pub items: usize,
    /// Per-line calculation warnings; the run still succeeded
    pub warnings: Vec<LineWarning>,
}
