use crate::types::text;
use crate::{Db, Error};
use posliq_core::models::{Store, StoreId};
use posliq_core::ports::StoreRepository;
use rusqlite::{OptionalExtension as _, Row, params};

pub(crate) fn map_store(row: &Row<'_>) -> rusqlite::Result<Store> {
    Ok(Store {
        id: text::<StoreId>(row, 0)?,
        idpos: row.get(1)?,
        name: row.get(2)?,
        active: row.get(3)?,
    })
}

impl StoreRepository for Db {
    fn create_store(&self, idpos: &str, name: &str) -> Result<Store, Error> {
        let store = Store {
            id: StoreId::new(),
            idpos: idpos.to_owned(),
            name: name.to_owned(),
            active: true,
        };
        let conn = self.writer.get()?;
        conn.execute(
            "insert into store (id, idpos, name, active) values (?1, ?2, ?3, 1)",
            params![store.id.to_string(), store.idpos, store.name],
        )?;
        Ok(store)
    }

    fn get_store(&self, store_id: StoreId) -> Result<Option<Store>, Error> {
        let conn = self.reader.get()?;
        Ok(conn
            .query_row(
                "select id, idpos, name, active from store where id = ?1",
                [store_id.to_string()],
                map_store,
            )
            .optional()?)
    }

    fn find_store_by_idpos(&self, idpos: &str) -> Result<Option<Store>, Error> {
        let conn = self.reader.get()?;
        Ok(conn
            .query_row(
                "select id, idpos, name, active from store where idpos = ?1",
                [idpos],
                map_store,
            )
            .optional()?)
    }

    fn set_store_active(&self, store_id: StoreId, active: bool) -> Result<bool, Error> {
        let conn = self.writer.get()?;
        let changed = conn.execute(
            "update store set active = ?2 where id = ?1",
            params![store_id.to_string(), active],
        )?;
        Ok(changed > 0)
    }
}
