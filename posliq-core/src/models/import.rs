use super::{ImportId, Period};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

/// One upload of already-normalized source rows for a period.
///
/// The core does not parse file formats; an external importer delivers
/// normalized rows tied to an import record so the whole upload can be
/// audited or deleted as a unit (deletion is refused once the period has
/// been liquidated).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Import {
    /// Identifier of this upload
    pub id: ImportId,
    /// The period the rows belong to
    pub period: Period,
    /// Free-form label (file name, batch tag)
    pub label: Option<String>,
    /// When the upload was registered
    pub created_at: DateTime<Utc>,
}

/// A normalized operator-report row as delivered by the importer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReportRow {
    /// Raw ICCID, cleaned by the identity resolver
    pub iccid: String,
    /// Phone number, if the feed carried one
    #[serde(default)]
    pub phone: Option<String>,
    /// First disbursement component
    #[serde(default)]
    pub commission_paid_80: Option<Decimal>,
    /// Second disbursement component
    #[serde(default)]
    pub commission_paid_20: Option<Decimal>,
    /// Explicit total commission
    #[serde(default)]
    pub total_commission: Option<Decimal>,
    /// Recharge amount attributed by the operator
    #[serde(default)]
    pub recharge_amount: Option<Decimal>,
    /// Opaque recharge-period token
    #[serde(default)]
    pub recharge_period: Option<String>,
    /// Payment percentage, `18` or `0.18`
    #[serde(default)]
    pub payment_percentage: Option<Decimal>,
    /// Activation date
    #[serde(default)]
    pub activation_date: Option<NaiveDate>,
    /// Operator cutoff date
    #[serde(default)]
    pub cutoff_date: Option<NaiveDate>,
}

/// A normalized recharge-feed row as delivered by the importer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RechargeRow {
    /// Raw ICCID, cleaned by the identity resolver
    pub iccid: String,
    /// Recharged amount
    pub amount: Decimal,
    /// Free-form period label from the feed
    #[serde(default)]
    pub label: Option<String>,
}

/// A row the ingester refused, with its position in the upload.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RejectedRow {
    /// Zero-based position in the delivered batch
    pub index: usize,
    /// The offending raw ICCID
    pub iccid: String,
    /// Why the row was refused
    pub reason: String,
}

/// Per-batch ingestion outcome: rejected rows never abort the batch.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct IngestSummary {
    /// Rows stored
    pub accepted: usize,
    /// Rows refused, each with a reason
    pub rejected: Vec<RejectedRow>,
}
