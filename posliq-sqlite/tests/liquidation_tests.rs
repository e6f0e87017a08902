mod common;

use common::{ICCID_A, ICCID_B, db, ingest_reports, march, report_row, seed_one_line_store};
use posliq_core::models::{GenerateOptions, LineWarningKind, RechargeRow, StoreId};
use posliq_core::ports::{
    ConsolidationRepository, GenerationFailure, ImportRepository, LedgerRepository,
    LiquidationRepository, StoreRepository,
};
use rust_decimal_macros::dec;

#[test]
fn one_line_liquidation_pays_and_credits() -> anyhow::Result<()> {
    let database = db()?;
    let (store, period) = seed_one_line_store(&database)?;

    let summary = database
        .generate_for_store(store.id, period, "ops", GenerateOptions::default())?
        .expect("generation should succeed");

    assert_eq!(summary.version, 1);
    assert_eq!(summary.items, 1);
    assert!(summary.warnings.is_empty());
    assert_eq!(summary.gross_amount, dec!(10000));
    assert_eq!(summary.net_amount, dec!(101111.11));

    let (liquidation, items) = database
        .get_liquidation(summary.liquidation_id)?
        .expect("stored liquidation");
    assert_eq!(liquidation.net_amount, dec!(101111.11));
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].iccid.as_str(), ICCID_A);
    assert_eq!(items[0].recharge_discount, dec!(900));
    assert_eq!(items[0].commission_after_discount, dec!(9100));
    assert_eq!(items[0].final_amount, dec!(101111.11));

    // the ledger credit lands in the same transaction
    assert_eq!(database.get_balance(store.id)?, dec!(101111.11));
    let movements = database.list_movements(store.id, 0, 10)?;
    assert_eq!(movements.len(), 1);
    assert_eq!(
        movements[0].source_ref.as_deref(),
        Some(summary.liquidation_id.to_string().as_str())
    );
    // the running balance on the credit is the net amount, not the net
    // amount counted once through the history fallback and once as the
    // movement itself
    assert_eq!(movements[0].balance_after, Some(dec!(101111.11)));
    Ok(())
}

#[test]
fn second_run_is_rejected_without_version_bump() -> anyhow::Result<()> {
    let database = db()?;
    let (store, period) = seed_one_line_store(&database)?;

    database
        .generate_for_store(store.id, period, "ops", GenerateOptions::default())?
        .expect("first run");

    let failure = database
        .generate_for_store(store.id, period, "ops", GenerateOptions::default())?
        .expect_err("second run must be rejected");
    assert_eq!(failure, GenerationFailure::AlreadyLiquidated { version: 1 });
    Ok(())
}

#[test]
fn consumed_lines_are_never_paid_twice() -> anyhow::Result<()> {
    let database = db()?;
    let (store, period) = seed_one_line_store(&database)?;

    database
        .generate_for_store(store.id, period, "ops", GenerateOptions::default())?
        .expect("first run");

    // re-consolidation must not touch the consumed row
    let summary = database.consolidate(period)?;
    assert_eq!(summary.skipped_consumed, 1);
    assert_eq!(summary.updated, 0);

    // a forced new version re-prices the same line, not a duplicate of it
    let regenerated = database
        .generate_for_store(
            store.id,
            period,
            "ops",
            GenerateOptions { new_version: true },
        )?
        .expect("regeneration");
    assert_eq!(regenerated.version, 2);
    assert_eq!(regenerated.items, 1);
    Ok(())
}

#[test]
fn regeneration_voids_the_superseded_credit() -> anyhow::Result<()> {
    let database = db()?;
    let (store, period) = seed_one_line_store(&database)?;

    database
        .generate_for_store(store.id, period, "ops", GenerateOptions::default())?
        .expect("first run");

    // a late upload changes the totals before the corrective run
    ingest_reports(
        &database,
        period,
        &[report_row(ICCID_B, dec!(2000), dec!(0), dec!(18))],
    )?;
    database.consolidate(period)?;
    common::attach_condition(&database, &store, ICCID_B, period, dec!(2))?;

    let regenerated = database
        .generate_for_store(
            store.id,
            period,
            "ops",
            GenerateOptions { new_version: true },
        )?
        .expect("regeneration");
    assert_eq!(regenerated.version, 2);
    assert_eq!(regenerated.items, 2);

    // only the new credit counts; the superseded one is voided, not deleted
    assert_eq!(database.get_balance(store.id)?, regenerated.net_amount);
    let movements = database.list_movements(store.id, 0, 10)?;
    assert_eq!(movements.len(), 2);

    let versions = database.list_liquidations(store.id, period)?;
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].version, 1);
    assert_eq!(versions[1].version, 2);

    // the superseded version keeps its lines for audit
    let (first, first_items) = database
        .get_liquidation(versions[0].id)?
        .expect("superseded version");
    assert_eq!(first.version, 1);
    assert_eq!(first_items.len(), 1);
    Ok(())
}

#[test]
fn inactive_and_unknown_stores_are_rejected() -> anyhow::Result<()> {
    let database = db()?;
    let (store, period) = seed_one_line_store(&database)?;

    database.set_store_active(store.id, false)?;
    let failure = database
        .generate_for_store(store.id, period, "ops", GenerateOptions::default())?
        .expect_err("inactive store");
    assert_eq!(failure, GenerationFailure::StoreInactive);

    let failure = database
        .generate_for_store(StoreId::new(), period, "ops", GenerateOptions::default())?
        .expect_err("unknown store");
    assert_eq!(failure, GenerationFailure::StoreNotFound);
    Ok(())
}

#[test]
fn store_with_no_attributable_lines_has_nothing_to_liquidate() -> anyhow::Result<()> {
    let database = db()?;
    let period = march();
    let store = database.create_store("POS-002", "Empty Kiosk")?;
    ingest_reports(
        &database,
        period,
        &[report_row(ICCID_A, dec!(10000), dec!(0), dec!(18))],
    )?;
    database.consolidate(period)?;
    // consolidated line exists, but no condition attributes it to the store

    let failure = database
        .generate_for_store(store.id, period, "ops", GenerateOptions::default())?
        .expect_err("no attributable lines");
    assert_eq!(failure, GenerationFailure::NothingToLiquidate);
    Ok(())
}

#[test]
fn unpriceable_lines_warn_and_the_rest_commit() -> anyhow::Result<()> {
    let database = db()?;
    let period = march();
    let store = database.create_store("POS-003", "Mixed Kiosk")?;
    ingest_reports(
        &database,
        period,
        &[
            report_row(ICCID_A, dec!(10000), dec!(5000), dec!(18)),
            // zero percentage: no denominator for the multiplier
            report_row(ICCID_B, dec!(3000), dec!(0), dec!(0)),
        ],
    )?;
    database.consolidate(period)?;
    common::attach_condition(&database, &store, ICCID_A, period, dec!(2))?;
    common::attach_condition(&database, &store, ICCID_B, period, dec!(2))?;

    let summary = database
        .generate_for_store(store.id, period, "ops", GenerateOptions::default())?
        .expect("partial generation");
    assert_eq!(summary.items, 1);
    assert_eq!(summary.warnings.len(), 1);
    assert_eq!(summary.warnings[0].iccid.as_str(), ICCID_B);
    assert_eq!(summary.warnings[0].kind, LineWarningKind::MissingRateBasis);
    assert_eq!(summary.net_amount, dec!(101111.11));
    Ok(())
}

#[test]
fn a_mid_run_failure_rolls_the_whole_store_back() -> anyhow::Result<()> {
    let database = db()?;
    let (store, period) = seed_one_line_store(&database)?;

    // a manually drafted version 1 collides with the row the run inserts,
    // failing it after the source rows were already read
    let conn = database.writer.get()?;
    conn.execute(
        r#"
        insert into liquidation (
            id, store_id, year, month, version,
            gross_amount, net_amount, status, created_at, created_by
        ) values (?1, ?2, 2024, 3, 1, '0', '0', 'draft', ?3, 'ops')
        "#,
        rusqlite::params![
            uuid::Uuid::new_v4().to_string(),
            store.id.to_string(),
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    drop(conn);

    let result = database.generate_for_store(store.id, period, "ops", GenerateOptions::default());
    assert!(result.is_err());

    // nothing of the failed run survives the rollback
    let conn = database.reader.get()?;
    let items: i64 =
        conn.query_row("select count(*) from liquidation_item", (), |row| row.get(0))?;
    assert_eq!(items, 0);
    let consumed: i64 = conn.query_row(
        "select count(*) from operator_report where liquidation_item_id is not null",
        (),
        |row| row.get(0),
    )?;
    assert_eq!(consumed, 0);
    let closed: i64 = conn.query_row(
        "select count(*) from liquidation where status = 'closed'",
        (),
        |row| row.get(0),
    )?;
    assert_eq!(closed, 0);
    drop(conn);

    assert!(database.list_movements(store.id, 0, 10)?.is_empty());
    assert_eq!(database.get_balance(store.id)?, dec!(0));
    Ok(())
}

#[test]
fn concurrent_runs_pay_a_period_exactly_once() -> anyhow::Result<()> {
    let database = db()?;
    let (store, period) = seed_one_line_store(&database)?;

    let outcomes = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let database = database.clone();
                scope.spawn(move || {
                    database.generate_for_store(store.id, period, "ops", GenerateOptions::default())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("generation thread"))
            .collect::<Vec<_>>()
    });

    let mut paid = 0;
    for outcome in outcomes {
        match outcome? {
            Ok(summary) => {
                assert_eq!(summary.version, 1);
                paid += 1;
            }
            Err(GenerationFailure::AlreadyLiquidated { version: 1 })
            | Err(GenerationFailure::Conflict) => {}
            Err(other) => anyhow::bail!("unexpected failure: {other}"),
        }
    }
    assert_eq!(paid, 1);

    // the losing thread left no trace
    assert_eq!(database.get_balance(store.id)?, dec!(101111.11));
    assert_eq!(database.list_liquidations(store.id, period)?.len(), 1);
    assert_eq!(database.list_movements(store.id, 0, 10)?.len(), 1);
    Ok(())
}

#[test]
fn recharge_feed_overrides_the_reported_recharge() -> anyhow::Result<()> {
    let database = db()?;
    let (store, period) = seed_one_line_store(&database)?;

    // two feed rows summing to 5000 must price identically to the
    // reported 5000 they replace
    let import = database.create_import(period, Some("recharges"))?;
    database.ingest_recharge_rows(
        import.id,
        &[
            RechargeRow {
                iccid: ICCID_A.to_owned(),
                amount: dec!(3000),
                label: None,
            },
            RechargeRow {
                iccid: ICCID_A.to_owned(),
                amount: dec!(2000),
                label: None,
            },
        ],
    )?;

    let summary = database
        .generate_for_store(store.id, period, "ops", GenerateOptions::default())?
        .expect("generation");
    assert_eq!(summary.net_amount, dec!(101111.11));
    Ok(())
}
