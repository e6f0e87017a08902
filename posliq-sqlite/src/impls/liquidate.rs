use crate::types::{opt_text, period, period_params, text};
use crate::{Db, Error};
use chrono::Utc;
use posliq_core::calc;
use posliq_core::models::{
    ConditionId, GenerateOptions, Iccid, Liquidation, LiquidationId, LiquidationItem,
    LiquidationItemId, LiquidationStatus, LiquidationSummary, LineWarning, LineWarningKind,
    NewMovement, OperationKind, OperatorReport, Period, ReportId, SalesCondition, SimcardId,
    StoreId,
};
use posliq_core::ports::{GenerationFailure, LiquidationRepository};
use rusqlite::{Connection, OptionalExtension as _, Row, TransactionBehavior, params};
use rust_decimal::Decimal;
use std::collections::HashMap;

fn map_liquidation(row: &Row<'_>) -> rusqlite::Result<Liquidation> {
    Ok(Liquidation {
        id: text::<LiquidationId>(row, 0)?,
        store_id: text::<StoreId>(row, 1)?,
        period: period(row, 2, 3)?,
        version: row.get(4)?,
        gross_amount: text(row, 5)?,
        net_amount: text(row, 6)?,
        status: text::<LiquidationStatus>(row, 7)?,
        created_at: text(row, 8)?,
        created_by: row.get(9)?,
    })
}

fn map_item(row: &Row<'_>) -> rusqlite::Result<LiquidationItem> {
    Ok(LiquidationItem {
        id: text::<LiquidationItemId>(row, 0)?,
        liquidation_id: text::<LiquidationId>(row, 1)?,
        report_id: text::<ReportId>(row, 2)?,
        condition_id: text::<ConditionId>(row, 3)?,
        iccid: Iccid::from_canonical(row.get(4)?),
        activation_date: opt_text(row, 5)?,
        cutoff_date: opt_text(row, 6)?,
        raw_commission: text(row, 7)?,
        recharge_discount: text(row, 8)?,
        commission_after_discount: text(row, 9)?,
        multiplier: text(row, 10)?,
        final_amount: text(row, 11)?,
    })
}

const LIQUIDATION_COLUMNS: &str = "id, store_id, year, month, version, gross_amount, \
                                   net_amount, status, created_at, created_by";

const ITEM_COLUMNS: &str = "id, liquidation_id, report_id, condition_id, iccid, \
                            activation_date, cutoff_date, raw_commission, recharge_discount, \
                            commission_after_discount, multiplier, final_amount";

/// An unconsumed consolidated line together with the condition that
/// attributes it to a store.
pub(crate) struct Candidate {
    pub report: OperatorReport,
    pub condition: SalesCondition,
    pub iccid: Iccid,
}

/// All unconsumed consolidated lines of a period that resolve to a store,
/// or to any store when `store_id` is None (the crossing preview).
pub(crate) fn candidates_on(
    conn: &Connection,
    p: Period,
    store_id: Option<StoreId>,
) -> Result<Vec<Candidate>, Error> {
    let (year, month) = period_params(p);
    let mut stmt = conn.prepare(
        r#"
        select r.id, r.simcard_id, r.cutoff_date, r.activation_date,
               r.commission_paid_80, r.commission_paid_20, r.total_commission,
               r.recharge_amount, r.recharge_period, r.payment_percentage,
               c.id, c.store_id, c.commission_percentage, c.sale_price,
               s.iccid
        from operator_report r
        join sales_condition c
          on c.simcard_id = r.simcard_id and c.year = r.year and c.month = r.month
        join simcard s on s.id = r.simcard_id
        where r.year = ?1 and r.month = ?2
          and r.is_consolidated = 1 and r.liquidation_item_id is null
          and (?3 is null or c.store_id = ?3)
        order by s.iccid
        "#,
    )?;
    let rows = stmt
        .query_map(
            params![year, month, store_id.map(|id| id.to_string())],
            |row| {
                let simcard_id: SimcardId = text(row, 1)?;
                Ok(Candidate {
                    report: OperatorReport {
                        id: text(row, 0)?,
                        simcard_id,
                        import_id: None,
                        period: p,
                        cutoff_date: opt_text(row, 2)?,
                        activation_date: opt_text(row, 3)?,
                        commission_paid_80: opt_text(row, 4)?,
                        commission_paid_20: opt_text(row, 5)?,
                        total_commission: opt_text(row, 6)?,
                        recharge_amount: text(row, 7)?,
                        recharge_period: row.get(8)?,
                        payment_percentage: text(row, 9)?,
                        is_consolidated: true,
                        liquidation_item_id: None,
                        raw_payload: None,
                    },
                    condition: SalesCondition {
                        id: text(row, 10)?,
                        simcard_id,
                        store_id: text(row, 11)?,
                        period: p,
                        commission_percentage: text(row, 12)?,
                        sale_price: opt_text(row, 13)?,
                    },
                    iccid: Iccid::from_canonical(row.get(14)?),
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Summed recharge feed per simcard for the period. A simcard absent from
/// the map falls back to the consolidated report's own recharge amount.
pub(crate) fn recharge_totals_on(
    conn: &Connection,
    p: Period,
) -> Result<HashMap<SimcardId, Decimal>, Error> {
    let (year, month) = period_params(p);
    let mut stmt =
        conn.prepare("select simcard_id, amount from recharge where year = ?1 and month = ?2")?;
    let rows = stmt.query_map(params![year, month], |row| {
        Ok((text::<SimcardId>(row, 0)?, text::<Decimal>(row, 1)?))
    })?;

    let mut totals: HashMap<SimcardId, Decimal> = HashMap::new();
    for row in rows {
        let (simcard_id, amount) = row?;
        *totals.entry(simcard_id).or_default() += amount;
    }
    Ok(totals)
}

pub(crate) fn total_recharge_for(
    totals: &HashMap<SimcardId, Decimal>,
    report: &OperatorReport,
) -> Decimal {
    totals
        .get(&report.simcard_id)
        .copied()
        .unwrap_or(report.recharge_amount)
}

/// The consume-and-close step, run entirely inside the caller's
/// transaction: insert the liquidation and its items, mark every consumed
/// source row, append the ledger credit. Either all of it commits or none
/// of it does.
fn generate_on(
    tx: &Connection,
    store_id: StoreId,
    p: Period,
    actor: &str,
    options: GenerateOptions,
) -> Result<Result<LiquidationSummary, GenerationFailure>, Error> {
    let (year, month) = period_params(p);

    let store: Option<(String, bool)> = tx
        .query_row(
            "select idpos, active from store where id = ?1",
            [store_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let Some((idpos, active)) = store else {
        return Ok(Err(GenerationFailure::StoreNotFound));
    };
    if !active {
        return Ok(Err(GenerationFailure::StoreInactive));
    }

    let prior: Option<(LiquidationId, i64)> = tx
        .query_row(
            r#"
            select id, version from liquidation
            where store_id = ?1 and year = ?2 and month = ?3 and status = 'closed'
            order by version desc limit 1
            "#,
            params![store_id.to_string(), year, month],
            |row| Ok((text(row, 0)?, row.get(1)?)),
        )
        .optional()?;

    let version = match prior {
        None => 1,
        Some((_, version)) if !options.new_version => {
            return Ok(Err(GenerationFailure::AlreadyLiquidated { version }));
        }
        Some((prior_id, version)) => {
            // corrective re-opening: free the superseded version's source
            // rows and void its credit, all inside this same transaction
            tx.execute(
                r#"
                update operator_report set liquidation_item_id = null
                where liquidation_item_id in (
                    select id from liquidation_item where liquidation_id = ?1
                )
                "#,
                [prior_id.to_string()],
            )?;
            tx.execute(
                "update liquidation_item set superseded = 1 where liquidation_id = ?1",
                [prior_id.to_string()],
            )?;
            tx.execute(
                r#"
                update balance_movement set status = 'voided'
                where store_id = ?1 and operation = 'liquidation'
                  and source_ref = ?2 and status = 'active'
                "#,
                params![store_id.to_string(), prior_id.to_string()],
            )?;
            tracing::info!(
                store = %idpos,
                period = %p,
                superseded = version,
                "regenerating liquidation as new version"
            );
            version + 1
        }
    };

    let candidates = candidates_on(tx, p, Some(store_id))?;
    if candidates.is_empty() {
        return Ok(Err(GenerationFailure::NothingToLiquidate));
    }
    let recharges = recharge_totals_on(tx, p)?;

    let liquidation_id = LiquidationId::new();
    let mut items: Vec<LiquidationItem> = Vec::with_capacity(candidates.len());
    let mut warnings: Vec<LineWarning> = Vec::new();
    let mut gross = Decimal::ZERO;
    let mut net = Decimal::ZERO;

    for candidate in &candidates {
        let total_recharge = total_recharge_for(&recharges, &candidate.report);
        let draft = match calc::calculate_line(&candidate.report, total_recharge, &candidate.condition)
        {
            Ok(draft) => draft,
            Err(error) => {
                warnings.push(LineWarning {
                    iccid: candidate.iccid.clone(),
                    kind: error.into(),
                });
                continue;
            }
        };
        if draft.is_loss() {
            warnings.push(LineWarning {
                iccid: candidate.iccid.clone(),
                kind: LineWarningKind::NegativeCommission,
            });
        }

        gross += draft.raw_commission;
        net += draft.final_amount;
        items.push(LiquidationItem {
            id: LiquidationItemId::new(),
            liquidation_id,
            report_id: candidate.report.id,
            condition_id: candidate.condition.id,
            iccid: candidate.iccid.clone(),
            activation_date: candidate.report.activation_date,
            cutoff_date: candidate.report.cutoff_date,
            raw_commission: draft.raw_commission,
            recharge_discount: draft.recharge_discount,
            commission_after_discount: draft.commission_after_discount,
            multiplier: draft.multiplier,
            final_amount: draft.final_amount,
        });
    }

    if items.is_empty() {
        return Ok(Err(GenerationFailure::NothingToLiquidate));
    }

    // snapshot the balance before the liquidation row lands, so a store
    // still served by the liquidation-history fallback does not see its
    // own in-flight credit twice
    let prior_balance = super::ledger::balance_on(tx, store_id)?;

    let created_at = Utc::now();
    tx.execute(
        r#"
        insert into liquidation (
            id, store_id, year, month, version,
            gross_amount, net_amount, status, created_at, created_by
        ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'closed', ?8, ?9)
        "#,
        params![
            liquidation_id.to_string(),
            store_id.to_string(),
            year,
            month,
            version,
            gross.to_string(),
            net.to_string(),
            created_at.to_rfc3339(),
            actor,
        ],
    )?;

    for item in &items {
        tx.execute(
            &format!("insert into liquidation_item ({ITEM_COLUMNS}) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"),
            params![
                item.id.to_string(),
                item.liquidation_id.to_string(),
                item.report_id.to_string(),
                item.condition_id.to_string(),
                item.iccid.as_str(),
                item.activation_date.map(|d| d.to_string()),
                item.cutoff_date.map(|d| d.to_string()),
                item.raw_commission.to_string(),
                item.recharge_discount.to_string(),
                item.commission_after_discount.to_string(),
                item.multiplier.to_string(),
                item.final_amount.to_string(),
            ],
        )?;

        // consume the source row; the guard clause makes double consumption
        // impossible even if another writer slipped in
        let consumed = tx.execute(
            r#"
            update operator_report set liquidation_item_id = ?1
            where id = ?2 and liquidation_item_id is null
            "#,
            params![item.id.to_string(), item.report_id.to_string()],
        )?;
        if consumed != 1 {
            return Ok(Err(GenerationFailure::Conflict));
        }
    }

    let credit = NewMovement {
        store_id,
        amount: net,
        operation: OperationKind::Liquidation,
        description: format!("Liquidation {p} v{version} ({idpos})"),
        source_ref: Some(liquidation_id.to_string()),
        created_by: actor.to_owned(),
    };
    if let Err(error) = super::ledger::append_with_prior(tx, &credit, prior_balance) {
        // a liquidation without its credit would break the ledger
        // invariant, so the whole store rolls back
        return Ok(Err(GenerationFailure::LedgerWriteFailure(
            error.to_string(),
        )));
    }

    Ok(Ok(LiquidationSummary {
        liquidation_id,
        store_id,
        period: p,
        version,
        gross_amount: gross,
        net_amount: net,
        items: items.len(),
        warnings,
    }))
}

fn is_busy(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::DatabaseBusy
                || e.code == rusqlite::ErrorCode::DatabaseLocked
    )
}

impl LiquidationRepository for Db {
    fn generate_for_store(
        &self,
        store_id: StoreId,
        period: Period,
        actor: &str,
        options: GenerateOptions,
    ) -> Result<Result<LiquidationSummary, GenerationFailure>, Error> {
        let mut conn = self.writer.get()?;

        let result = (|| -> Result<Result<LiquidationSummary, GenerationFailure>, Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            match generate_on(&tx, store_id, period, actor, options)? {
                Ok(summary) => {
                    tx.commit()?;
                    Ok(Ok(summary))
                }
                // dropping the transaction rolls everything back
                Err(failure) => Ok(Err(failure)),
            }
        })();

        match result {
            Ok(Ok(summary)) => {
                self.previews().invalidate_period(period);
                tracing::info!(
                    liquidation = %summary.liquidation_id,
                    store = %store_id,
                    period = %period,
                    version = summary.version,
                    net = %summary.net_amount,
                    items = summary.items,
                    warnings = summary.warnings.len(),
                    "liquidation closed"
                );
                Ok(Ok(summary))
            }
            Ok(Err(failure)) => Ok(Err(failure)),
            Err(Error::Sql(error)) if is_busy(&error) => {
                Ok(Err(GenerationFailure::Conflict))
            }
            Err(error) => Err(error),
        }
    }

    fn get_liquidation(
        &self,
        liquidation_id: LiquidationId,
    ) -> Result<Option<(Liquidation, Vec<LiquidationItem>)>, Error> {
        let conn = self.reader.get()?;
        let liquidation = conn
            .query_row(
                &format!("select {LIQUIDATION_COLUMNS} from liquidation where id = ?1"),
                [liquidation_id.to_string()],
                map_liquidation,
            )
            .optional()?;
        let Some(liquidation) = liquidation else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(&format!(
            "select {ITEM_COLUMNS} from liquidation_item where liquidation_id = ?1 order by iccid"
        ))?;
        let items = stmt
            .query_map([liquidation_id.to_string()], map_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some((liquidation, items)))
    }

    fn list_liquidations(
        &self,
        store_id: StoreId,
        period: Period,
    ) -> Result<Vec<Liquidation>, Error> {
        let (year, month) = period_params(period);
        let conn = self.reader.get()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            select {LIQUIDATION_COLUMNS} from liquidation
            where store_id = ?1 and year = ?2 and month = ?3
            order by version
            "#
        ))?;
        let liquidations = stmt
            .query_map(params![store_id.to_string(), year, month], map_liquidation)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(liquidations)
    }
}
