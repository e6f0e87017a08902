use super::{MovementId, StoreId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// The operation that produced a balance movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Credit from a closed liquidation
    Liquidation,
    /// Debit from an approved/delivered redemption
    Redemption,
    /// Refund of a previous debit
    Refund,
    /// Manual correction
    Adjustment,
}

impl OperationKind {
    /// Stable string form used for storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Liquidation => "liquidation",
            Self::Redemption => "redemption",
            Self::Refund => "refund",
            Self::Adjustment => "adjustment",
        }
    }
}

impl std::str::FromStr for OperationKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "liquidation" => Ok(Self::Liquidation),
            "redemption" => Ok(Self::Redemption),
            "refund" => Ok(Self::Refund),
            "adjustment" => Ok(Self::Adjustment),
            other => Err(format!("unknown operation kind: {other}")),
        }
    }
}

/// Whether a movement still counts towards the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementStatus {
    /// Counts towards the balance
    Active,
    /// Excluded from the balance but kept for audit
    Voided,
}

impl MovementStatus {
    /// Stable string form used for storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Voided => "voided",
        }
    }
}

impl std::str::FromStr for MovementStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "voided" => Ok(Self::Voided),
            other => Err(format!("unknown movement status: {other}")),
        }
    }
}

/// One append-only ledger entry affecting a store's balance.
///
/// The current balance of a store is exactly the sum of signed amounts of
/// its active movements. Movements are never updated in place; corrections
/// add an offsetting movement or flip the status to voided.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BalanceMovement {
    /// Identifier of this movement
    pub id: MovementId,
    /// The affected store
    pub store_id: StoreId,
    /// When the movement took effect
    pub moved_at: DateTime<Utc>,
    /// Signed amount: liquidation credits positive, redemption debits
    /// negative
    pub amount: Decimal,
    /// What produced this movement
    pub operation: OperationKind,
    /// Active or voided
    pub status: MovementStatus,
    /// Human-readable description
    pub description: String,
    /// Reference to the triggering record (liquidation id, redemption id, ...)
    pub source_ref: Option<String>,
    /// Cached running balance after this movement, informational only
    pub balance_after: Option<Decimal>,
    /// Who recorded the movement
    pub created_by: String,
}

/// Input for appending a movement.
#[derive(Debug, Clone)]
pub struct NewMovement {
    /// The affected store
    pub store_id: StoreId,
    /// Signed amount
    pub amount: Decimal,
    /// What produced this movement
    pub operation: OperationKind,
    /// Human-readable description
    pub description: String,
    /// Reference to the triggering record
    pub source_ref: Option<String>,
    /// Who records the movement
    pub created_by: String,
}
