use crate::types::{opt_text, text};
use crate::{Db, Error};
use chrono::Utc;
use posliq_core::models::{
    BalanceMovement, MovementId, MovementStatus, NewMovement, Redemption, RedemptionId,
    RedemptionStatus, StoreId,
};
use posliq_core::ports::LedgerRepository;
use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;

fn map_movement(row: &Row<'_>) -> rusqlite::Result<BalanceMovement> {
    Ok(BalanceMovement {
        id: text::<MovementId>(row, 0)?,
        store_id: text::<StoreId>(row, 1)?,
        moved_at: text(row, 2)?,
        amount: text(row, 3)?,
        operation: text(row, 4)?,
        status: text(row, 5)?,
        description: row.get(6)?,
        source_ref: row.get(7)?,
        balance_after: opt_text(row, 8)?,
        created_by: row.get(9)?,
    })
}

const MOVEMENT_COLUMNS: &str = "id, store_id, moved_at, amount, operation, status, \
                                description, source_ref, balance_after, created_by";

/// Sum of signed amounts of the store's active movements.
fn ledger_sum(conn: &Connection, store_id: StoreId) -> Result<Decimal, Error> {
    let mut stmt = conn.prepare(
        "select amount from balance_movement where store_id = ?1 and status = 'active'",
    )?;
    let amounts = stmt.query_map([store_id.to_string()], |row| text::<Decimal>(row, 0))?;
    let mut total = Decimal::ZERO;
    for amount in amounts {
        total += amount?;
    }
    Ok(total)
}

/// Bridging computation for stores whose history predates the ledger:
/// closed-liquidation credits minus balance-affecting redemption debits.
/// Must match what the ledger would have held, so superseded liquidation
/// versions are excluded the same way their credits would have been voided.
fn legacy_balance(conn: &Connection, store_id: StoreId) -> Result<Decimal, Error> {
    let mut stmt = conn.prepare(
        r#"
        select year, month, version, net_amount
        from liquidation
        where store_id = ?1 and status = 'closed'
        order by year, month, version
        "#,
    )?;
    let rows = stmt
        .query_map([store_id.to_string()], |row| {
            let year: i32 = row.get(0)?;
            let month: i64 = row.get(1)?;
            let version: i64 = row.get(2)?;
            let net: Decimal = text(row, 3)?;
            Ok((year, month, version, net))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    // ordered by version, so the last row per period is the current one
    let mut credits: std::collections::BTreeMap<(i32, i64), Decimal> = Default::default();
    for (year, month, _, net) in rows {
        credits.insert((year, month), net);
    }
    let mut balance: Decimal = credits.into_values().sum();

    let mut stmt = conn.prepare(
        "select total_value, status from redemption where store_id = ?1",
    )?;
    let redemptions = stmt.query_map([store_id.to_string()], |row| {
        let value: Decimal = text(row, 0)?;
        let status: RedemptionStatus = text(row, 1)?;
        Ok((value, status))
    })?;
    for redemption in redemptions {
        let (value, status) = redemption?;
        if status.is_balance_affecting() {
            balance -= value;
        }
    }

    Ok(balance)
}

pub(crate) fn balance_on(conn: &Connection, store_id: StoreId) -> Result<Decimal, Error> {
    let movements: i64 = conn.query_row(
        "select count(*) from balance_movement where store_id = ?1",
        [store_id.to_string()],
        |row| row.get(0),
    )?;
    if movements == 0 {
        return legacy_balance(conn, store_id);
    }
    ledger_sum(conn, store_id)
}

pub(crate) fn append_on(
    conn: &Connection,
    movement: &NewMovement,
) -> Result<BalanceMovement, Error> {
    let prior = balance_on(conn, movement.store_id)?;
    append_with_prior(conn, movement, prior)
}

/// Append a movement with a caller-computed prior balance, so the
/// liquidation generator can snapshot it before inserting rows the
/// legacy fallback would otherwise count into `balance_after`.
pub(crate) fn append_with_prior(
    conn: &Connection,
    movement: &NewMovement,
    prior: Decimal,
) -> Result<BalanceMovement, Error> {
    let balance_after = prior + movement.amount;
    let stored = BalanceMovement {
        id: MovementId::new(),
        store_id: movement.store_id,
        moved_at: Utc::now(),
        amount: movement.amount,
        operation: movement.operation,
        status: MovementStatus::Active,
        description: movement.description.clone(),
        source_ref: movement.source_ref.clone(),
        balance_after: Some(balance_after),
        created_by: movement.created_by.clone(),
    };

    conn.execute(
        r#"
        insert into balance_movement (
            id, store_id, moved_at, amount, operation, status,
            description, source_ref, balance_after, created_by
        ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            stored.id.to_string(),
            stored.store_id.to_string(),
            stored.moved_at.to_rfc3339(),
            stored.amount.to_string(),
            stored.operation.as_str(),
            stored.status.as_str(),
            stored.description,
            stored.source_ref,
            balance_after.to_string(),
            stored.created_by,
        ],
    )?;

    Ok(stored)
}

impl LedgerRepository for Db {
    fn record_movement(&self, movement: &NewMovement) -> Result<BalanceMovement, Error> {
        let conn = self.writer.get()?;
        let stored = append_on(&conn, movement)?;
        tracing::info!(
            movement = %stored.id,
            store = %stored.store_id,
            amount = %stored.amount,
            operation = stored.operation.as_str(),
            "recorded balance movement"
        );
        Ok(stored)
    }

    fn get_balance(&self, store_id: StoreId) -> Result<Decimal, Error> {
        let conn = self.reader.get()?;
        balance_on(&conn, store_id)
    }

    fn void_movement(&self, movement_id: MovementId, actor: &str) -> Result<bool, Error> {
        let conn = self.writer.get()?;
        let changed = conn.execute(
            "update balance_movement set status = 'voided' where id = ?1 and status = 'active'",
            [movement_id.to_string()],
        )?;
        if changed > 0 {
            tracing::info!(movement = %movement_id, actor, "voided balance movement");
        }
        Ok(changed > 0)
    }

    fn list_movements(
        &self,
        store_id: StoreId,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<BalanceMovement>, Error> {
        let conn = self.reader.get()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            select {MOVEMENT_COLUMNS}
            from balance_movement
            where store_id = ?1
            order by moved_at desc, id desc
            limit ?2 offset ?3
            "#,
        ))?;
        let movements = stmt
            .query_map(
                params![
                    store_id.to_string(),
                    per_page as i64,
                    (page * per_page) as i64
                ],
                map_movement,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(movements)
    }

    fn create_redemption(
        &self,
        store_id: StoreId,
        total_value: Decimal,
        status: RedemptionStatus,
    ) -> Result<Redemption, Error> {
        let redemption = Redemption {
            id: RedemptionId::new(),
            store_id,
            total_value,
            status,
        };
        let conn = self.writer.get()?;
        conn.execute(
            r#"
            insert into redemption (id, store_id, total_value, status, created_at)
            values (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                redemption.id.to_string(),
                store_id.to_string(),
                total_value.to_string(),
                status.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(redemption)
    }
}
