#![allow(dead_code)]

use posliq_core::models::{
    Iccid, Import, NewSalesCondition, Period, ReportRow, SalesCondition, Store,
};
use posliq_core::ports::{
    ConditionRepository, ConsolidationRepository, IdentityRepository, ImportRepository,
    StoreRepository,
};
use posliq_sqlite::Db;
use posliq_sqlite::config::SqliteConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const ICCID_A: &str = "8957000000000000001";
pub const ICCID_B: &str = "8957000000000000002";
pub const ICCID_C: &str = "8957000000000000003";

pub fn db() -> anyhow::Result<Db> {
    Ok(Db::open(&SqliteConfig::default())?)
}

pub fn march() -> Period {
    Period::new(2024, 3).unwrap()
}

pub fn report_row(iccid: &str, total: Decimal, recharge: Decimal, pct: Decimal) -> ReportRow {
    ReportRow {
        iccid: iccid.to_owned(),
        phone: None,
        commission_paid_80: None,
        commission_paid_20: None,
        total_commission: Some(total),
        recharge_amount: Some(recharge),
        recharge_period: None,
        payment_percentage: Some(pct),
        activation_date: None,
        cutoff_date: None,
    }
}

pub fn ingest_reports(
    database: &Db,
    period: Period,
    rows: &[ReportRow],
) -> anyhow::Result<Import> {
    let import = database.create_import(period, Some("test upload"))?;
    let summary = database.ingest_report_rows(import.id, rows)?;
    assert!(summary.rejected.is_empty(), "unexpected rejects in fixture");
    Ok(import)
}

pub fn attach_condition(
    database: &Db,
    store: &Store,
    iccid: &str,
    period: Period,
    percentage: Decimal,
) -> anyhow::Result<SalesCondition> {
    let iccid = Iccid::parse(iccid)?;
    let simcard = database
        .find_simcard(&iccid)?
        .expect("fixture simcard must exist before attaching a condition");
    Ok(database.put_sales_condition(&NewSalesCondition {
        simcard_id: simcard.id,
        store_id: store.id,
        period,
        commission_percentage: percentage,
        sale_price: None,
    })?)
}

/// One store with one consolidated line: total commission 10000, recharge
/// 5000, 18% payment percentage, condition terms of 2. The expected final
/// amount is 101111.11.
pub fn seed_one_line_store(database: &Db) -> anyhow::Result<(Store, Period)> {
    let period = march();
    let store = database.create_store("POS-001", "Central Kiosk")?;
    ingest_reports(
        database,
        period,
        &[report_row(ICCID_A, dec!(10000), dec!(5000), dec!(18))],
    )?;
    database.consolidate(period)?;
    attach_condition(database, &store, ICCID_A, period, dec!(2))?;
    Ok((store, period))
}
