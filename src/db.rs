use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OpenFlags, params};
use serde::Serialize;

use crate::model::{CatalogEntry, EntryDetails};
use crate::util::ensure_directory;

pub const DB_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRow {
    pub id: i64,
    pub name: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MirrorCounts {
    pub deleted: usize,
    pub inserted: usize,
}

pub fn open(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        ensure_directory(parent)?;
    }
    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

pub fn open_read_only(db_path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open database read-only: {}", db_path.display()))
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign_keys")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS service_names (
              id INTEGER PRIMARY KEY,
              name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS service_content (
              service_id INTEGER PRIMARY KEY,
              title TEXT NOT NULL,
              description TEXT NOT NULL,
              details TEXT NOT NULL,
              image_path TEXT NOT NULL DEFAULT '',
              FOREIGN KEY(service_id) REFERENCES service_names(id)
            );
            ",
        )
        .context("failed to create catalog schema")?;

    connection
        .execute(
            "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![DB_SCHEMA_VERSION],
        )
        .context("failed to record schema version")?;

    Ok(())
}

pub fn stored_details(details: &EntryDetails) -> EntryDetails {
    EntryDetails {
        cards: details
            .cards
            .iter()
            .filter(|card| !card.is_download())
            .cloned()
            .collect(),
        faqs: details.faqs.clone(),
    }
}

pub fn mirror_catalog(
    connection: &mut Connection,
    entries: &[CatalogEntry],
) -> Result<MirrorCounts> {
    let tx = connection
        .transaction()
        .context("failed to begin mirror transaction")?;

    tx.execute("DELETE FROM service_content", [])
        .context("failed to clear service_content")?;
    let deleted = tx
        .execute("DELETE FROM service_names", [])
        .context("failed to clear service_names")?;

    let mut inserted = 0usize;
    {
        let mut insert_name = tx
            .prepare("INSERT INTO service_names (id, name) VALUES (?1, ?2)")
            .context("failed to prepare service_names insert")?;
        let mut insert_content = tx
            .prepare(
                "INSERT INTO service_content (service_id, title, description, details, image_path)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .context("failed to prepare service_content insert")?;

        for entry in entries {
            let details = serde_json::to_string(&stored_details(&entry.details))
                .with_context(|| format!("failed to serialize details for {}", entry.name))?;

            insert_name
                .execute(params![entry.id, entry.name])
                .with_context(|| format!("failed to insert service name {}", entry.name))?;
            insert_content
                .execute(params![
                    entry.id,
                    entry.title,
                    entry.description,
                    details,
                    entry.image_path
                ])
                .with_context(|| format!("failed to insert service content {}", entry.name))?;
            inserted += 1;
        }
    }

    tx.execute(
        "INSERT INTO metadata(key, value) VALUES('synced_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![Utc::now()],
    )
    .context("failed to record sync time")?;

    tx.commit().context("failed to commit mirror transaction")?;

    Ok(MirrorCounts {
        deleted,
        inserted,
    })
}

pub fn load_services(connection: &Connection) -> Result<Vec<ServiceRow>> {
    let mut statement = connection
        .prepare(
            "
            SELECT sn.id, sn.name, sc.title
            FROM service_names sn
            LEFT JOIN service_content sc ON sn.id = sc.service_id
            ORDER BY sn.id
            ",
        )
        .context("failed to prepare service query")?;

    let rows = statement
        .query_map([], |row| {
            Ok(ServiceRow {
                id: row.get(0)?,
                name: row.get(1)?,
                title: row.get(2)?,
            })
        })
        .context("failed to query services")?
        .collect::<rusqlite::Result<Vec<ServiceRow>>>()
        .context("failed to read service rows")?;

    Ok(rows)
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

pub fn metadata_value(connection: &Connection, key: &str) -> Option<String> {
    connection
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1 LIMIT 1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .ok()
}
