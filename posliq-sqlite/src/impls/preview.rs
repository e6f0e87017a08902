use crate::cache::Snapshot;
use crate::types::{period_params, text};
use crate::{Db, Error};
use posliq_core::calc;
use posliq_core::models::{
    BulkOutcome, GenerateOptions, Iccid, LineStatus, LineView, Period, PeriodGap, PreviewPage,
    PreviewQuery, PreviewSort, SortDirection, StoreId, StorePreview,
};
use posliq_core::ports::{CrossingRepository, GenerationFailure, LiquidationRepository as _};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

struct StoreAcc {
    idpos: String,
    name: String,
    paid_total: Decimal,
    pending_total: Decimal,
    lines: Vec<LineView>,
    loss_lines: usize,
}

fn acc_for<'a>(
    stores: &'a mut HashMap<StoreId, StoreAcc>,
    store_id: StoreId,
    idpos: &str,
    name: &str,
) -> &'a mut StoreAcc {
    stores.entry(store_id).or_insert_with(|| StoreAcc {
        idpos: idpos.to_owned(),
        name: name.to_owned(),
        paid_total: Decimal::ZERO,
        pending_total: Decimal::ZERO,
        lines: Vec::new(),
        loss_lines: 0,
    })
}

/// The unfiltered crossing for a period: paid lines come verbatim from
/// closed liquidation items, pending lines are priced live through the same
/// calculator the generator uses.
fn build_snapshot(conn: &Connection, p: Period) -> Result<Snapshot, Error> {
    let (year, month) = period_params(p);
    let mut stores: HashMap<StoreId, StoreAcc> = HashMap::new();

    // paid lines; the report pointer restricts items to the current
    // version, superseded versions have been disconnected from their rows
    let mut stmt = conn.prepare(
        r#"
        select l.store_id, st.idpos, st.name, li.iccid, li.final_amount
        from liquidation_item li
        join liquidation l on l.id = li.liquidation_id
        join store st on st.id = l.store_id
        join operator_report r on r.liquidation_item_id = li.id
        where l.year = ?1 and l.month = ?2 and l.status = 'closed'
        "#,
    )?;
    let paid = stmt
        .query_map(params![year, month], |row| {
            Ok((
                text::<StoreId>(row, 0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                Iccid::from_canonical(row.get(3)?),
                text::<Decimal>(row, 4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (store_id, idpos, name, iccid, final_amount) in paid {
        let acc = acc_for(&mut stores, store_id, &idpos, &name);
        acc.paid_total += final_amount;
        acc.lines.push(LineView {
            iccid,
            status: LineStatus::Paid,
            final_amount,
        });
    }

    // pending lines, across every store at once
    let candidates = super::liquidate::candidates_on(conn, p, None)?;
    let recharges = super::liquidate::recharge_totals_on(conn, p)?;
    let mut names: HashMap<StoreId, (String, String)> = HashMap::new();
    for candidate in &candidates {
        let store_id = candidate.condition.store_id;
        if !names.contains_key(&store_id) {
            let row: (String, String) = conn.query_row(
                "select idpos, name from store where id = ?1",
                [store_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            names.insert(store_id, row);
        }
        let (idpos, name) = &names[&store_id];

        let total_recharge = super::liquidate::total_recharge_for(&recharges, &candidate.report);
        let Ok(draft) = calc::calculate_line(&candidate.report, total_recharge, &candidate.condition)
        else {
            // unpriceable: the generator would skip it with a warning, so
            // the crossing shows no amount for it either
            continue;
        };

        let acc = acc_for(&mut stores, store_id, idpos, name);
        acc.pending_total += draft.final_amount;
        if draft.is_loss() {
            acc.loss_lines += 1;
        }
        acc.lines.push(LineView {
            iccid: candidate.iccid.clone(),
            status: LineStatus::Pending,
            final_amount: draft.final_amount,
        });
    }

    // consolidated lines with no condition at all: excluded from payout,
    // surfaced for manual attention
    let mut stmt = conn.prepare(
        r#"
        select s.iccid
        from operator_report r
        join simcard s on s.id = r.simcard_id
        left join sales_condition c
          on c.simcard_id = r.simcard_id and c.year = r.year and c.month = r.month
        where r.year = ?1 and r.month = ?2
          and r.is_consolidated = 1 and r.liquidation_item_id is null
          and c.id is null
        order by s.iccid
        "#,
    )?;
    let orphans = stmt
        .query_map(params![year, month], |row| {
            Ok(Iccid::from_canonical(row.get(0)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut previews: Vec<StorePreview> = stores
        .into_iter()
        .map(|(store_id, acc)| StorePreview {
            store_id,
            idpos: acc.idpos,
            name: acc.name,
            paid_total: acc.paid_total,
            pending_total: acc.pending_total,
            total: acc.paid_total + acc.pending_total,
            lines: acc.lines,
            loss_lines: acc.loss_lines,
        })
        .collect();
    previews.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Snapshot {
        stores: previews,
        orphans,
    })
}

fn matches(store: &StorePreview, search: &str) -> bool {
    let needle = search.to_lowercase();
    store.name.to_lowercase().contains(&needle) || store.idpos.to_lowercase().contains(&needle)
}

impl CrossingRepository for Db {
    fn preview_period(
        &self,
        user: &str,
        period: Period,
        query: &PreviewQuery,
    ) -> Result<PreviewPage, Error> {
        let snapshot = match self.previews().get(user, period) {
            Some(snapshot) => snapshot,
            None => {
                let conn = self.reader.get()?;
                let snapshot = Arc::new(build_snapshot(&conn, period)?);
                self.previews().put(user, period, Arc::clone(&snapshot));
                snapshot
            }
        };

        let mut results: Vec<StorePreview> = snapshot
            .stores
            .iter()
            .filter(|store| match &query.search {
                Some(search) => matches(store, search),
                None => true,
            })
            .cloned()
            .collect();

        match query.sort {
            PreviewSort::Name => results.sort_by(|a, b| a.name.cmp(&b.name)),
            PreviewSort::Idpos => results.sort_by(|a, b| a.idpos.cmp(&b.idpos)),
            PreviewSort::Total => results.sort_by(|a, b| a.total.cmp(&b.total)),
        }
        if query.direction == SortDirection::Desc {
            results.reverse();
        }

        let total_stores = results.len();
        let per_page = query.per_page.max(1);
        let results = results
            .into_iter()
            .skip(query.page * per_page)
            .take(per_page)
            .collect();

        Ok(PreviewPage {
            results,
            total_stores,
            orphans: snapshot.orphans.clone(),
            page: query.page,
        })
    }

    fn bulk_liquidate(
        &self,
        store_ids: &[StoreId],
        period: Period,
        actor: &str,
    ) -> Result<BulkOutcome, Error> {
        let mut outcome = BulkOutcome::default();
        for &store_id in store_ids {
            match self.generate_for_store(store_id, period, actor, GenerateOptions::default()) {
                Ok(Ok(summary)) => outcome.succeeded.push(summary),
                Ok(Err(failure)) => {
                    tracing::warn!(store = %store_id, period = %period, %failure, "store skipped in bulk liquidation");
                    outcome.failed.push((store_id, failure));
                }
                Err(error) => {
                    tracing::error!(store = %store_id, period = %period, %error, "store failed in bulk liquidation");
                    outcome
                        .failed
                        .push((store_id, GenerationFailure::Backend(error.to_string())));
                }
            }
        }
        tracing::info!(
            period = %period,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "bulk liquidation finished"
        );
        Ok(outcome)
    }

    fn period_gap(&self, period: Period) -> Result<PeriodGap, Error> {
        let (year, month) = period_params(period);
        let conn = self.reader.get()?;

        let mut stmt = conn.prepare(
            r#"
            select commission_paid_80, commission_paid_20, total_commission
            from operator_report
            where year = ?1 and month = ?2 and is_consolidated = 1
            "#,
        )?;
        let reported_rows = stmt
            .query_map(params![year, month], |row| {
                Ok((
                    crate::types::opt_text::<Decimal>(row, 0)?,
                    crate::types::opt_text::<Decimal>(row, 1)?,
                    crate::types::opt_text::<Decimal>(row, 2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let mut operator_reported = Decimal::ZERO;
        for (paid_80, paid_20, total) in reported_rows {
            if let Some(commission) = calc::commission_basis(paid_80, paid_20, total) {
                operator_reported += commission;
            }
        }

        // latest version per store only; superseded versions were replaced,
        // not paid twice
        let mut stmt = conn.prepare(
            r#"
            select net_amount from liquidation l
            where year = ?1 and month = ?2 and status = 'closed'
              and version = (
                  select max(version) from liquidation
                  where store_id = l.store_id and year = ?1 and month = ?2
                    and status = 'closed'
              )
            "#,
        )?;
        let paid_rows = stmt
            .query_map(params![year, month], |row| text::<Decimal>(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        let total_paid: Decimal = paid_rows.into_iter().sum();

        Ok(PeriodGap {
            period,
            operator_reported,
            total_paid,
            difference: operator_reported - total_paid,
        })
    }
}
