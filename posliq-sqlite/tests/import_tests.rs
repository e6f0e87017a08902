mod common;

use common::{ICCID_A, ICCID_B, db, march, report_row, seed_one_line_store};
use posliq_core::models::{GenerateOptions, Iccid, RechargeRow};
use posliq_core::ports::{
    ConsolidationRepository, IdentityRepository, ImportDeleteFailure, ImportRepository,
    LiquidationRepository,
};
use rust_decimal_macros::dec;

#[test]
fn unusable_iccids_are_rejected_row_by_row() -> anyhow::Result<()> {
    let database = db()?;
    let period = march();
    let import = database.create_import(period, Some("march upload"))?;

    let summary = database.ingest_report_rows(
        import.id,
        &[
            report_row(ICCID_A, dec!(100), dec!(0), dec!(18)),
            report_row("not-a-sim", dec!(200), dec!(0), dec!(18)),
            report_row(&format!("  {ICCID_B}F "), dec!(300), dec!(0), dec!(18)),
        ],
    )?;

    // the bad row never aborts the batch
    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.rejected.len(), 1);
    assert_eq!(summary.rejected[0].index, 1);
    assert_eq!(summary.rejected[0].iccid, "not-a-sim");

    // the padded, F-suffixed form resolved to the canonical identity
    let simcard = database.find_simcard(&Iccid::parse(ICCID_B)?)?;
    assert!(simcard.is_some());
    Ok(())
}

#[test]
fn identity_resolution_is_shared_across_feeds() -> anyhow::Result<()> {
    let database = db()?;
    let period = march();
    let import = database.create_import(period, None)?;

    database.ingest_report_rows(
        import.id,
        &[report_row(ICCID_A, dec!(100), dec!(0), dec!(18))],
    )?;
    database.ingest_recharge_rows(
        import.id,
        &[RechargeRow {
            iccid: format!("{ICCID_A}F"),
            amount: dec!(500),
            label: None,
        }],
    )?;

    // both feeds funneled into one simcard record
    let conn = database.reader.get()?;
    let simcards: i64 = conn.query_row("select count(*) from simcard", (), |row| row.get(0))?;
    assert_eq!(simcards, 1);
    Ok(())
}

#[test]
fn deleting_an_open_import_removes_its_rows() -> anyhow::Result<()> {
    let database = db()?;
    let period = march();
    let import = database.create_import(period, Some("mistaken upload"))?;
    database.ingest_report_rows(
        import.id,
        &[
            report_row(ICCID_A, dec!(100), dec!(0), dec!(18)),
            report_row(ICCID_B, dec!(200), dec!(0), dec!(18)),
        ],
    )?;
    database.ingest_recharge_rows(
        import.id,
        &[RechargeRow {
            iccid: ICCID_A.to_owned(),
            amount: dec!(500),
            label: None,
        }],
    )?;
    database.consolidate(period)?;

    let deletion = database
        .delete_import(import.id)?
        .expect("open period deletes");
    assert_eq!(deletion.reports, 2);
    assert_eq!(deletion.recharges, 1);
    // the stale consolidated rows went with their source data
    assert_eq!(deletion.consolidated, 2);

    assert!(database.get_import(import.id)?.is_none());
    Ok(())
}

#[test]
fn liquidated_periods_lock_their_imports() -> anyhow::Result<()> {
    let database = db()?;
    let (store, period) = seed_one_line_store(&database)?;
    let import = database.create_import(period, Some("late upload"))?;
    database.ingest_report_rows(
        import.id,
        &[report_row(ICCID_B, dec!(100), dec!(0), dec!(18))],
    )?;

    database
        .generate_for_store(store.id, period, "ops", GenerateOptions::default())?
        .expect("generation");

    let failure = database
        .delete_import(import.id)?
        .expect_err("period is locked");
    assert_eq!(failure, ImportDeleteFailure::Locked { period });

    // nothing was removed
    assert!(database.get_import(import.id)?.is_some());
    let conn = database.reader.get()?;
    let reports: i64 = conn.query_row(
        "select count(*) from operator_report where import_id = ?1",
        [import.id.to_string()],
        |row| row.get(0),
    )?;
    assert_eq!(reports, 1);
    Ok(())
}

#[test]
fn deleting_an_unknown_import_reports_not_found() -> anyhow::Result<()> {
    let database = db()?;
    let failure = database
        .delete_import(posliq_core::models::ImportId::new())?
        .expect_err("unknown import");
    assert_eq!(failure, ImportDeleteFailure::NotFound);
    Ok(())
}
