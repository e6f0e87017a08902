mod common;

use common::{ICCID_A, ICCID_B, db, ingest_reports, march, report_row};
use posliq_core::models::ReportRow;
use posliq_core::ports::ConsolidationRepository;
use rusqlite::params;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn split_row(iccid: &str, paid_80: Decimal, paid_20: Decimal) -> ReportRow {
    ReportRow {
        commission_paid_80: Some(paid_80),
        commission_paid_20: Some(paid_20),
        total_commission: None,
        ..report_row(iccid, dec!(0), dec!(0), dec!(18))
    }
}

fn consolidated_totals(
    database: &posliq_sqlite::Db,
    iccid: &str,
) -> anyhow::Result<(Option<Decimal>, Option<Decimal>, Decimal)> {
    let conn = database.reader.get()?;
    let row = conn.query_row(
        r#"
        select r.commission_paid_80, r.commission_paid_20, r.recharge_amount
        from operator_report r
        join simcard s on s.id = r.simcard_id
        where s.iccid = ?1 and r.is_consolidated = 1
        "#,
        params![iccid],
        |row| {
            let paid_80: Option<String> = row.get(0)?;
            let paid_20: Option<String> = row.get(1)?;
            let recharge: String = row.get(2)?;
            Ok((paid_80, paid_20, recharge))
        },
    )?;
    Ok((
        row.0.map(|v| v.parse()).transpose()?,
        row.1.map(|v| v.parse()).transpose()?,
        row.2.parse()?,
    ))
}

#[test]
fn raw_rows_of_a_simcard_sum_into_one_row() -> anyhow::Result<()> {
    let database = db()?;
    let period = march();
    ingest_reports(
        &database,
        period,
        &[
            ReportRow {
                recharge_amount: Some(dec!(1000)),
                ..split_row(ICCID_A, dec!(80), dec!(20))
            },
            ReportRow {
                recharge_amount: Some(dec!(500)),
                ..split_row(ICCID_A, dec!(40), dec!(10))
            },
            report_row(ICCID_B, dec!(300), dec!(0), dec!(18)),
        ],
    )?;

    let summary = database.consolidate(period)?;
    assert_eq!(summary.simcards, 2);
    assert_eq!(summary.created, 2);
    assert_eq!(summary.updated, 0);

    let (paid_80, paid_20, recharge) = consolidated_totals(&database, ICCID_A)?;
    assert_eq!(paid_80, Some(dec!(120)));
    assert_eq!(paid_20, Some(dec!(30)));
    assert_eq!(recharge, dec!(1500));

    // the raw rows stay behind, untouched
    let conn = database.reader.get()?;
    let raw: i64 = conn.query_row(
        "select count(*) from operator_report where is_consolidated = 0",
        (),
        |row| row.get(0),
    )?;
    assert_eq!(raw, 3);
    Ok(())
}

#[test]
fn reruns_recompute_instead_of_accumulating() -> anyhow::Result<()> {
    let database = db()?;
    let period = march();
    ingest_reports(
        &database,
        period,
        &[report_row(ICCID_A, dec!(100), dec!(250), dec!(18))],
    )?;

    database.consolidate(period)?;
    let first = consolidated_totals(&database, ICCID_A)?;

    let summary = database.consolidate(period)?;
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 1);
    assert_eq!(consolidated_totals(&database, ICCID_A)?, first);
    Ok(())
}

#[test]
fn a_late_upload_folds_into_the_existing_row() -> anyhow::Result<()> {
    let database = db()?;
    let period = march();
    ingest_reports(
        &database,
        period,
        &[report_row(ICCID_A, dec!(100), dec!(250), dec!(18))],
    )?;
    database.consolidate(period)?;

    ingest_reports(
        &database,
        period,
        &[report_row(ICCID_A, dec!(50), dec!(100), dec!(18))],
    )?;
    let summary = database.consolidate(period)?;
    assert_eq!(summary.updated, 1);

    let (_, _, recharge) = consolidated_totals(&database, ICCID_A)?;
    assert_eq!(recharge, dec!(350));
    Ok(())
}

#[test]
fn an_empty_period_consolidates_to_nothing() -> anyhow::Result<()> {
    let database = db()?;
    let summary = database.consolidate(march())?;
    assert_eq!(summary.simcards, 0);
    assert_eq!(summary.created, 0);
    Ok(())
}
