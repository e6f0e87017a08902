use crate::models::{NewSalesCondition, Period, SalesCondition, SimcardId};

/// Repository interface for the store-specific commission-rate table.
pub trait ConditionRepository: super::Repository {
    /// Create or replace the condition for a (simcard, period).
    ///
    /// Conditions are unique per (simcard, period); a second upsert for the
    /// same key replaces the terms rather than adding a row.
    fn put_sales_condition(
        &self,
        condition: &NewSalesCondition,
    ) -> Result<SalesCondition, Self::Error>;

    /// Fetch the condition governing a (simcard, period), if any.
    fn get_sales_condition(
        &self,
        simcard_id: SimcardId,
        period: Period,
    ) -> Result<Option<SalesCondition>, Self::Error>;
}
