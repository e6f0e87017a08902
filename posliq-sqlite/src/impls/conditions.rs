use crate::types::{opt_text, period, period_params, text};
use crate::{Db, Error};
use posliq_core::models::{
    ConditionId, NewSalesCondition, Period, SalesCondition, SimcardId, StoreId,
};
use posliq_core::ports::ConditionRepository;
use rusqlite::{OptionalExtension as _, Row, params};

pub(crate) fn map_condition(row: &Row<'_>) -> rusqlite::Result<SalesCondition> {
    Ok(SalesCondition {
        id: text::<ConditionId>(row, 0)?,
        simcard_id: text::<SimcardId>(row, 1)?,
        store_id: text::<StoreId>(row, 2)?,
        period: period(row, 3, 4)?,
        commission_percentage: text(row, 5)?,
        sale_price: opt_text(row, 6)?,
    })
}

const SELECT_CONDITION: &str = r#"
    select id, simcard_id, store_id, year, month, commission_percentage, sale_price
    from sales_condition
    where simcard_id = ?1 and year = ?2 and month = ?3
"#;

impl ConditionRepository for Db {
    fn put_sales_condition(
        &self,
        condition: &NewSalesCondition,
    ) -> Result<SalesCondition, Error> {
        let (year, month) = period_params(condition.period);
        let conn = self.writer.get()?;
        conn.execute(
            r#"
            insert into sales_condition (
                id, simcard_id, store_id, year, month, commission_percentage, sale_price
            ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            on conflict (simcard_id, year, month) do update set
                store_id = excluded.store_id,
                commission_percentage = excluded.commission_percentage,
                sale_price = excluded.sale_price
            "#,
            params![
                ConditionId::new().to_string(),
                condition.simcard_id.to_string(),
                condition.store_id.to_string(),
                year,
                month,
                condition.commission_percentage.to_string(),
                condition.sale_price.map(|d| d.to_string()),
            ],
        )?;

        let stored = conn.query_row(
            SELECT_CONDITION,
            params![condition.simcard_id.to_string(), year, month],
            map_condition,
        )?;

        // new terms change what a liquidation run would produce
        self.previews().invalidate_period(condition.period);
        Ok(stored)
    }

    fn get_sales_condition(
        &self,
        simcard_id: SimcardId,
        period: Period,
    ) -> Result<Option<SalesCondition>, Error> {
        let (year, month) = period_params(period);
        let conn = self.reader.get()?;
        Ok(conn
            .query_row(
                SELECT_CONDITION,
                params![simcard_id.to_string(), year, month],
                map_condition,
            )
            .optional()?)
    }
}
