use posliq_core::ports::{LedgerRepository, StoreRepository};
use posliq_sqlite::{Db, config::SqliteConfig};
use rust_decimal_macros::dec;

#[test]
fn a_reopened_database_keeps_its_data() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = SqliteConfig {
        database_path: Some(dir.path().join("posliq.db")),
        ..SqliteConfig::default()
    };

    let store_id = {
        let database = Db::open(&config)?;
        let store = database.create_store("POS-050", "Durable Kiosk")?;
        store.id
    };

    // second open must not re-apply the schema over live data
    let database = Db::open(&config)?;
    let store = database.get_store(store_id)?.expect("persisted store");
    assert_eq!(store.idpos, "POS-050");
    assert_eq!(database.get_balance(store_id)?, dec!(0));
    Ok(())
}

#[test]
fn two_handles_share_one_database_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = SqliteConfig {
        database_path: Some(dir.path().join("posliq.db")),
        ..SqliteConfig::default()
    };

    let writer = Db::open(&config)?;
    let reader = Db::open(&config)?;

    let store = writer.create_store("POS-051", "Shared Kiosk")?;
    assert!(reader.get_store(store.id)?.is_some());
    Ok(())
}
