use super::{Iccid, LiquidationSummary, Period, StoreId};
use crate::ports::GenerationFailure;
use rust_decimal::Decimal;

/// How a previewed line relates to liquidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    /// Already consumed by a closed liquidation; sourced verbatim from its
    /// liquidation item
    Paid,
    /// Not yet consumed; computed live
    Pending,
}

/// One simcard-level line in the crossing view.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LineView {
    /// The simcard
    pub iccid: Iccid,
    /// Paid (immutable) or pending (live)
    pub status: LineStatus,
    /// Payable amount: actual for paid lines, hypothetical for pending
    pub final_amount: Decimal,
}

/// Per-store summary merging what was paid with what would be paid.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StorePreview {
    /// The store
    pub store_id: StoreId,
    /// Point-of-sale code
    pub idpos: String,
    /// Display name
    pub name: String,
    /// Total already paid by closed liquidations for the period
    pub paid_total: Decimal,
    /// Total a liquidation run would produce now
    pub pending_total: Decimal,
    /// Exposure regardless of liquidation status: paid + pending
    pub total: Decimal,
    /// Line-level drill-down
    pub lines: Vec<LineView>,
    /// Pending lines with negative commission after discount (loss alert)
    pub loss_lines: usize,
}

/// Sort key for the crossing view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewSort {
    /// By store display name
    #[default]
    Name,
    /// By point-of-sale code
    Idpos,
    /// By total exposure
    Total,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

/// Filtering, sorting and pagination for the crossing view.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PreviewQuery {
    /// Substring match against store name or idpos
    #[serde(default)]
    pub search: Option<String>,
    /// Sort key
    #[serde(default)]
    pub sort: PreviewSort,
    /// Sort direction
    #[serde(default)]
    pub direction: SortDirection,
    /// Zero-based page
    #[serde(default)]
    pub page: usize,
    /// Page size
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_per_page() -> usize {
    50
}

impl Default for PreviewQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort: PreviewSort::default(),
            direction: SortDirection::default(),
            page: 0,
            per_page: default_per_page(),
        }
    }
}

/// One page of the crossing view.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PreviewPage {
    /// The requested page of per-store summaries
    pub results: Vec<StorePreview>,
    /// Total matching stores across all pages
    pub total_stores: usize,
    /// Consolidated lines for the period with no sales condition; excluded
    /// from payout, listed for manual attention
    pub orphans: Vec<Iccid>,
    /// Zero-based page echoed back
    pub page: usize,
}

/// Period-level commission/payout gap check.
///
/// A negative difference means the business pays out more than the operator
/// reports. Informational; never blocks liquidation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PeriodGap {
    /// Billing period
    pub period: Period,
    /// Total commission the operator reported (consolidated rows)
    pub operator_reported: Decimal,
    /// Total net amount of closed liquidations
    pub total_paid: Decimal,
    /// `operator_reported - total_paid`
    pub difference: Decimal,
}

/// Aggregate result of liquidating several stores in one operation.
///
/// Stores succeed and fail independently; a failed store never rolls back a
/// committed one.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BulkOutcome {
    /// Stores whose liquidation committed
    pub succeeded: Vec<LiquidationSummary>,
    /// Stores whose liquidation was rejected or failed, with the reason
    pub failed: Vec<(StoreId, GenerationFailure)>,
}
