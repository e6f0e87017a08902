mod iccid;
mod import;
mod liquidation;
mod movement;
mod period;
mod preview;
mod recharge;
mod report;
mod sales_condition;
mod simcard;
mod store;

pub use iccid::{Iccid, InvalidIdentity};
pub use import::{Import, IngestSummary, RechargeRow, RejectedRow, ReportRow};
pub use liquidation::{
    GenerateOptions, Liquidation, LiquidationItem, LiquidationStatus, LiquidationSummary,
    LineWarning, LineWarningKind,
};
pub use movement::{BalanceMovement, MovementStatus, NewMovement, OperationKind};
pub use period::{InvalidPeriod, Period};
pub use preview::{
    BulkOutcome, LineStatus, LineView, PeriodGap, PreviewPage, PreviewQuery, PreviewSort,
    SortDirection, StorePreview,
};
pub use recharge::Recharge;
pub use report::OperatorReport;
pub use sales_condition::{NewSalesCondition, SalesCondition};
pub use simcard::Simcard;
pub use store::Store;

macro_rules! uuid_wrapper {
    ($struct: ident, $doc: literal) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Hash,
            PartialEq,
            Eq,
            Clone,
            Copy,
            serde::Serialize,
            serde::Deserialize,
            PartialOrd,
            Ord,
        )]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $struct(uuid::Uuid);

        impl $struct {
            /// Generate a fresh random id.
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl Default for $struct {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<uuid::Uuid> for $struct {
            fn from(value: uuid::Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$struct> for uuid::Uuid {
            fn from(value: $struct) -> Self {
                value.0
            }
        }

        impl std::str::FromStr for $struct {
            type Err = <uuid::Uuid as std::str::FromStr>::Err;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Ok(Self(value.parse()?))
            }
        }

        impl std::ops::Deref for $struct {
            type Target = uuid::Uuid;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::fmt::Display for $struct {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_wrapper!(SimcardId, "Unique identifier for a simcard");
uuid_wrapper!(StoreId, "Unique identifier for a point-of-sale store");
uuid_wrapper!(ImportId, "Unique identifier for one upload of source rows");
uuid_wrapper!(ReportId, "Unique identifier for an operator-report row");
uuid_wrapper!(RechargeId, "Unique identifier for a recharge row");
uuid_wrapper!(ConditionId, "Unique identifier for a sales condition");
uuid_wrapper!(LiquidationId, "Unique identifier for a liquidation");
uuid_wrapper!(LiquidationItemId, "Unique identifier for a liquidation line");
uuid_wrapper!(MovementId, "Unique identifier for a balance movement");
uuid_wrapper!(RedemptionId, "Unique identifier for a redemption request");

/// A redemption request spending store balance against a catalog item.
///
/// Redemptions are driven by an external workflow; the core only needs them
/// for the legacy balance fallback and as the source reference of redemption
/// movements.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Redemption {
    /// Identifier of this redemption
    pub id: RedemptionId,
    /// The store spending its balance
    pub store_id: StoreId,
    /// Total value of the redeemed items
    pub total_value: rust_decimal::Decimal,
    /// Workflow status
    pub status: RedemptionStatus,
}

/// Workflow status of a redemption, as reported by the external workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    /// Submitted, not yet balance-affecting
    Pending,
    /// Approved by an operator
    Approved,
    /// Confirmed by the store
    Confirmed,
    /// Goods delivered
    Delivered,
    /// Rejected or withdrawn
    Cancelled,
}

impl RedemptionStatus {
    /// Whether this status counts as a debit in the legacy balance fallback.
    pub fn is_balance_affecting(self) -> bool {
        matches!(self, Self::Approved | Self::Confirmed | Self::Delivered)
    }

    /// Stable string form used for storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Confirmed => "confirmed",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for RedemptionStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "confirmed" => Ok(Self::Confirmed),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown redemption status: {other}")),
        }
    }
}
