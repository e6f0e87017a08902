use crate::types::{opt_text, period_params, text};
use crate::{Db, Error};
use chrono::NaiveDate;
use posliq_core::calc::normalize_percentage;
use posliq_core::models::{Period, ReportId, SimcardId};
use posliq_core::ports::{ConsolidationRepository, ConsolidationSummary};
use rusqlite::{Connection, OptionalExtension as _, params};
use rust_decimal::Decimal;

struct RawRow {
    simcard_id: SimcardId,
    commission_paid_80: Option<Decimal>,
    commission_paid_20: Option<Decimal>,
    total_commission: Option<Decimal>,
    recharge_amount: Decimal,
    recharge_period: Option<String>,
    payment_percentage: Decimal,
    activation_date: Option<NaiveDate>,
    cutoff_date: Option<NaiveDate>,
}

/// Summed totals for one simcard-period, always recomputed from the raw
/// rows in full. Consolidation never adds deltas to a previous run, which
/// is what makes it re-runnable.
struct Totals {
    commission_paid_80: Option<Decimal>,
    commission_paid_20: Option<Decimal>,
    total_commission: Option<Decimal>,
    recharge_amount: Decimal,
    recharge_period: Option<String>,
    payment_percentage: Decimal,
    activation_date: Option<NaiveDate>,
    cutoff_date: Option<NaiveDate>,
}

fn add_opt(acc: Option<Decimal>, value: Option<Decimal>) -> Option<Decimal> {
    match (acc, value) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or_default() + b.unwrap_or_default()),
    }
}

fn sum_group(simcard_id: SimcardId, rows: &[RawRow]) -> Totals {
    let mut totals = Totals {
        commission_paid_80: None,
        commission_paid_20: None,
        total_commission: None,
        recharge_amount: Decimal::ZERO,
        recharge_period: None,
        payment_percentage: Decimal::ZERO,
        activation_date: None,
        cutoff_date: None,
    };

    for row in rows {
        totals.commission_paid_80 = add_opt(totals.commission_paid_80, row.commission_paid_80);
        totals.commission_paid_20 = add_opt(totals.commission_paid_20, row.commission_paid_20);
        totals.total_commission = add_opt(totals.total_commission, row.total_commission);
        totals.recharge_amount += row.recharge_amount;

        if totals.recharge_period.is_none() {
            totals.recharge_period = row.recharge_period.clone();
        }

        // raw rows of one simcard-period are expected to agree on the
        // percentage; keep the highest and flag disagreement
        let pct = normalize_percentage(row.payment_percentage);
        let current = normalize_percentage(totals.payment_percentage);
        if pct > Decimal::ZERO && current > Decimal::ZERO && pct != current {
            tracing::warn!(
                simcard = %simcard_id,
                "raw rows disagree on payment percentage"
            );
        }
        if pct > current {
            totals.payment_percentage = row.payment_percentage;
        }

        totals.activation_date = match (totals.activation_date, row.activation_date) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        totals.cutoff_date = match (totals.cutoff_date, row.cutoff_date) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    totals
}

fn raw_rows(conn: &Connection, year: i32, month: i64) -> Result<Vec<RawRow>, Error> {
    let mut stmt = conn.prepare(
        r#"
        select simcard_id, commission_paid_80, commission_paid_20, total_commission,
               recharge_amount, recharge_period, payment_percentage,
               activation_date, cutoff_date
        from operator_report
        where year = ?1 and month = ?2 and is_consolidated = 0
        order by simcard_id
        "#,
    )?;
    let rows = stmt
        .query_map(params![year, month], |row| {
            Ok(RawRow {
                simcard_id: text(row, 0)?,
                commission_paid_80: opt_text(row, 1)?,
                commission_paid_20: opt_text(row, 2)?,
                total_commission: opt_text(row, 3)?,
                recharge_amount: text(row, 4)?,
                recharge_period: row.get(5)?,
                payment_percentage: text(row, 6)?,
                activation_date: opt_text(row, 7)?,
                cutoff_date: opt_text(row, 8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

impl ConsolidationRepository for Db {
    fn consolidate(&self, period: Period) -> Result<ConsolidationSummary, Error> {
        let (year, month) = period_params(period);
        let mut conn = self.writer.get()?;
        let tx = conn.transaction()?;

        let rows = raw_rows(&tx, year, month)?;
        let mut summary = ConsolidationSummary::default();

        for group in rows.chunk_by(|a, b| a.simcard_id == b.simcard_id) {
            let simcard_id = group[0].simcard_id;
            summary.simcards += 1;

            let existing: Option<(ReportId, bool)> = tx
                .query_row(
                    r#"
                    select id, liquidation_item_id is not null
                    from operator_report
                    where simcard_id = ?1 and year = ?2 and month = ?3 and is_consolidated = 1
                    "#,
                    params![simcard_id.to_string(), year, month],
                    |row| Ok((text(row, 0)?, row.get(1)?)),
                )
                .optional()?;

            if let Some((_, consumed)) = existing {
                if consumed {
                    // overwriting would retroactively change a closed
                    // liquidation's source data
                    summary.skipped_consumed += 1;
                    continue;
                }
            }

            let totals = sum_group(simcard_id, group);

            match existing {
                Some((id, _)) => {
                    tx.execute(
                        r#"
                        update operator_report set
                            commission_paid_80 = ?2, commission_paid_20 = ?3,
                            total_commission = ?4, recharge_amount = ?5,
                            recharge_period = ?6, payment_percentage = ?7,
                            activation_date = ?8, cutoff_date = ?9
                        where id = ?1
                        "#,
                        params![
                            id.to_string(),
                            totals.commission_paid_80.map(|d| d.to_string()),
                            totals.commission_paid_20.map(|d| d.to_string()),
                            totals.total_commission.map(|d| d.to_string()),
                            totals.recharge_amount.to_string(),
                            totals.recharge_period,
                            totals.payment_percentage.to_string(),
                            totals.activation_date.map(|d| d.to_string()),
                            totals.cutoff_date.map(|d| d.to_string()),
                        ],
                    )?;
                    summary.updated += 1;
                }
                None => {
                    tx.execute(
                        r#"
                        insert into operator_report (
                            id, simcard_id, import_id, year, month,
                            cutoff_date, activation_date,
                            commission_paid_80, commission_paid_20, total_commission,
                            recharge_amount, recharge_period, payment_percentage,
                            is_consolidated, liquidation_item_id, raw_payload
                        ) values (?1, ?2, null, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 1, null, null)
                        "#,
                        params![
                            ReportId::new().to_string(),
                            simcard_id.to_string(),
                            year,
                            month,
                            totals.cutoff_date.map(|d| d.to_string()),
                            totals.activation_date.map(|d| d.to_string()),
                            totals.commission_paid_80.map(|d| d.to_string()),
                            totals.commission_paid_20.map(|d| d.to_string()),
                            totals.total_commission.map(|d| d.to_string()),
                            totals.recharge_amount.to_string(),
                            totals.recharge_period,
                            totals.payment_percentage.to_string(),
                        ],
                    )?;
                    summary.created += 1;
                }
            }
        }

        tx.commit()?;
        self.previews().invalidate_period(period);
        tracing::info!(
            period = %period,
            simcards = summary.simcards,
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped_consumed,
            "consolidated period"
        );
        Ok(summary)
    }
}
