use crate::models::{
    Import, ImportId, IngestSummary, Period, RechargeRow, ReportRow,
};

/// Row counts removed by a successful import deletion.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct ImportDeletion {
    /// Raw operator-report rows removed
    pub reports: usize,
    /// Recharge rows removed
    pub recharges: usize,
    /// Stale unconsumed consolidated rows removed alongside
    pub consolidated: usize,
}

/// Why an import deletion was refused. Non-retryable; user-visible.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum ImportDeleteFailure {
    /// No such import
    #[error("import not found")]
    NotFound,
    /// A liquidation already exists for the import's period; deleting the
    /// consumed source data would invalidate it retroactively
    #[error("period {period} already has a liquidation; import is locked")]
    Locked {
        /// The liquidated period protecting the import
        period: Period,
    },
}

/// Repository interface for uploads of normalized source rows.
///
/// The core never parses files; an external importer delivers normalized
/// rows. Each upload is registered as an import so its rows can be audited
/// and, while the period is still open, deleted as a unit.
pub trait ImportRepository: super::Repository {
    /// Register an upload for a period.
    fn create_import(&self, period: Period, label: Option<&str>) -> Result<Import, Self::Error>;

    /// Fetch an import by id.
    fn get_import(&self, import_id: ImportId) -> Result<Option<Import>, Self::Error>;

    /// Store a batch of operator-report rows.
    ///
    /// Each row's ICCID is resolved through the identity resolver; rows
    /// with an unusable ICCID are rejected individually and reported in
    /// the summary while the rest of the batch proceeds. The original row
    /// is snapshotted as the report's raw payload.
    fn ingest_report_rows(
        &self,
        import_id: ImportId,
        rows: &[ReportRow],
    ) -> Result<IngestSummary, Self::Error>;

    /// Store a batch of recharge-feed rows, resolving identities the same
    /// way.
    fn ingest_recharge_rows(
        &self,
        import_id: ImportId,
        rows: &[RechargeRow],
    ) -> Result<IngestSummary, Self::Error>;

    /// Delete an upload and its rows, unless the period has been
    /// liquidated.
    ///
    /// The guard is absolute: any liquidation for the period, closed or
    /// draft, locks every import of that period and the deletion removes
    /// zero rows.
    fn delete_import(
        &self,
        import_id: ImportId,
    ) -> Result<Result<ImportDeletion, ImportDeleteFailure>, Self::Error>;
}
