use crate::types::{period, period_params, text};
use crate::{Db, Error};
use chrono::Utc;
use posliq_core::models::{
    Iccid, Import, ImportId, IngestSummary, Period, RechargeId, RechargeRow, RejectedRow,
    ReportId, ReportRow,
};
use posliq_core::ports::{ImportDeleteFailure, ImportDeletion, ImportRepository};
use rusqlite::{Connection, OptionalExtension as _, Row, params};
use rust_decimal::Decimal;

fn map_import(row: &Row<'_>) -> rusqlite::Result<Import> {
    Ok(Import {
        id: text::<ImportId>(row, 0)?,
        period: period(row, 1, 2)?,
        label: row.get(3)?,
        created_at: text(row, 4)?,
    })
}

fn get_on(conn: &Connection, import_id: ImportId) -> rusqlite::Result<Option<Import>> {
    conn.query_row(
        "select id, year, month, label, created_at from import where id = ?1",
        [import_id.to_string()],
        map_import,
    )
    .optional()
}

impl ImportRepository for Db {
    fn create_import(&self, period: Period, label: Option<&str>) -> Result<Import, Error> {
        let import = Import {
            id: ImportId::new(),
            period,
            label: label.map(str::to_owned),
            created_at: Utc::now(),
        };
        let (year, month) = period_params(period);
        let conn = self.writer.get()?;
        conn.execute(
            "insert into import (id, year, month, label, created_at) values (?1, ?2, ?3, ?4, ?5)",
            params![
                import.id.to_string(),
                year,
                month,
                import.label,
                import.created_at.to_rfc3339(),
            ],
        )?;
        Ok(import)
    }

    fn get_import(&self, import_id: ImportId) -> Result<Option<Import>, Error> {
        let conn = self.reader.get()?;
        Ok(get_on(&conn, import_id)?)
    }

    fn ingest_report_rows(
        &self,
        import_id: ImportId,
        rows: &[ReportRow],
    ) -> Result<IngestSummary, Error> {
        let mut conn = self.writer.get()?;
        let tx = conn.transaction()?;

        let import = get_on(&tx, import_id)?
            .ok_or_else(|| Error::Failure(format!("import {import_id} not found")))?;
        let (year, month) = period_params(import.period);

        let mut summary = IngestSummary::default();
        for (index, row) in rows.iter().enumerate() {
            let iccid = match Iccid::parse(&row.iccid) {
                Ok(iccid) => iccid,
                Err(reason) => {
                    summary.rejected.push(RejectedRow {
                        index,
                        iccid: row.iccid.clone(),
                        reason: reason.to_string(),
                    });
                    continue;
                }
            };
            let simcard = super::identity::resolve_on(&tx, &iccid, row.phone.as_deref())?;
            let raw_payload = serde_json::to_string(row)?;

            tx.execute(
                r#"
                insert into operator_report (
                    id, simcard_id, import_id, year, month,
                    cutoff_date, activation_date,
                    commission_paid_80, commission_paid_20, total_commission,
                    recharge_amount, recharge_period, payment_percentage,
                    is_consolidated, liquidation_item_id, raw_payload
                ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 0, null, ?14)
                "#,
                params![
                    ReportId::new().to_string(),
                    simcard.id.to_string(),
                    import_id.to_string(),
                    year,
                    month,
                    row.cutoff_date.map(|d| d.to_string()),
                    row.activation_date.map(|d| d.to_string()),
                    row.commission_paid_80.map(|d| d.to_string()),
                    row.commission_paid_20.map(|d| d.to_string()),
                    row.total_commission.map(|d| d.to_string()),
                    row.recharge_amount.unwrap_or(Decimal::ZERO).to_string(),
                    row.recharge_period,
                    row.payment_percentage.unwrap_or(Decimal::ZERO).to_string(),
                    raw_payload,
                ],
            )?;
            summary.accepted += 1;
        }

        tx.commit()?;
        self.previews().invalidate_period(import.period);
        tracing::info!(
            import = %import_id,
            period = %import.period,
            accepted = summary.accepted,
            rejected = summary.rejected.len(),
            "ingested operator report rows"
        );
        Ok(summary)
    }

    fn ingest_recharge_rows(
        &self,
        import_id: ImportId,
        rows: &[RechargeRow],
    ) -> Result<IngestSummary, Error> {
        let mut conn = self.writer.get()?;
        let tx = conn.transaction()?;

        let import = get_on(&tx, import_id)?
            .ok_or_else(|| Error::Failure(format!("import {import_id} not found")))?;
        let (year, month) = period_params(import.period);

        let mut summary = IngestSummary::default();
        for (index, row) in rows.iter().enumerate() {
            let iccid = match Iccid::parse(&row.iccid) {
                Ok(iccid) => iccid,
                Err(reason) => {
                    summary.rejected.push(RejectedRow {
                        index,
                        iccid: row.iccid.clone(),
                        reason: reason.to_string(),
                    });
                    continue;
                }
            };
            let simcard = super::identity::resolve_on(&tx, &iccid, None)?;

            tx.execute(
                r#"
                insert into recharge (id, simcard_id, import_id, year, month, amount, label)
                values (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    RechargeId::new().to_string(),
                    simcard.id.to_string(),
                    import_id.to_string(),
                    year,
                    month,
                    row.amount.to_string(),
                    row.label,
                ],
            )?;
            summary.accepted += 1;
        }

        tx.commit()?;
        self.previews().invalidate_period(import.period);
        tracing::info!(
            import = %import_id,
            period = %import.period,
            accepted = summary.accepted,
            rejected = summary.rejected.len(),
            "ingested recharge rows"
        );
        Ok(summary)
    }

    fn delete_import(
        &self,
        import_id: ImportId,
    ) -> Result<Result<ImportDeletion, ImportDeleteFailure>, Error> {
        let mut conn = self.writer.get()?;
        let tx = conn.transaction()?;

        let Some(import) = get_on(&tx, import_id)? else {
            return Ok(Err(ImportDeleteFailure::NotFound));
        };
        let (year, month) = period_params(import.period);

        // Deleting consumed source data would invalidate closed
        // liquidations retroactively, so any liquidation for the period
        // locks every import of that period.
        let liquidations: i64 = tx.query_row(
            "select count(*) from liquidation where year = ?1 and month = ?2",
            params![year, month],
            |row| row.get(0),
        )?;
        if liquidations > 0 {
            return Ok(Err(ImportDeleteFailure::Locked {
                period: import.period,
            }));
        }

        let recharges = tx.execute(
            "delete from recharge where import_id = ?1",
            [import_id.to_string()],
        )?;
        let reports = tx.execute(
            "delete from operator_report where import_id = ?1",
            [import_id.to_string()],
        )?;
        // Stale consolidated rows of the period would keep presenting the
        // deleted data; with the guard above none of them can be consumed.
        let consolidated = tx.execute(
            r#"
            delete from operator_report
            where year = ?1 and month = ?2 and is_consolidated = 1
              and liquidation_item_id is null
            "#,
            params![year, month],
        )?;
        tx.execute("delete from import where id = ?1", [import_id.to_string()])?;

        tx.commit()?;
        self.previews().invalidate_period(import.period);
        tracing::info!(
            import = %import_id,
            period = %import.period,
            reports,
            recharges,
            consolidated,
            "deleted import"
        );
        Ok(Ok(ImportDeletion {
            reports,
            recharges,
            consolidated,
        }))
    }
}
