use crate::types::text;
use crate::{Db, Error};
use posliq_core::models::{Iccid, Simcard, SimcardId};
use posliq_core::ports::IdentityRepository;
use rusqlite::{Connection, OptionalExtension as _, Row, params};

pub(crate) fn map_simcard(row: &Row<'_>) -> rusqlite::Result<Simcard> {
    Ok(Simcard {
        id: text::<SimcardId>(row, 0)?,
        iccid: Iccid::from_canonical(row.get(1)?),
        phone: row.get(2)?,
    })
}

/// Find-or-create on an existing connection, so ingestion can resolve
/// identities inside its own transaction.
pub(crate) fn resolve_on(
    conn: &Connection,
    iccid: &Iccid,
    phone: Option<&str>,
) -> rusqlite::Result<Simcard> {
    // A phone number is filled in on first sighting only; it never
    // overwrites one already recorded.
    conn.execute(
        r#"
        insert into simcard (id, iccid, phone)
        values (?1, ?2, ?3)
        on conflict (iccid) do update set phone = coalesce(simcard.phone, excluded.phone)
        "#,
        params![SimcardId::new().to_string(), iccid.as_str(), phone],
    )?;

    conn.query_row(
        "select id, iccid, phone from simcard where iccid = ?1",
        [iccid.as_str()],
        map_simcard,
    )
}

pub(crate) fn find_on(conn: &Connection, iccid: &Iccid) -> rusqlite::Result<Option<Simcard>> {
    conn.query_row(
        "select id, iccid, phone from simcard where iccid = ?1",
        [iccid.as_str()],
        map_simcard,
    )
    .optional()
}

impl IdentityRepository for Db {
    fn resolve_simcard(&self, iccid: &Iccid, phone: Option<&str>) -> Result<Simcard, Error> {
        let conn = self.writer.get()?;
        Ok(resolve_on(&conn, iccid, phone)?)
    }

    fn find_simcard(&self, iccid: &Iccid) -> Result<Option<Simcard>, Error> {
        let conn = self.reader.get()?;
        Ok(find_on(&conn, iccid)?)
    }
}
