// [libs/infra/db/src/schema.rs]
//! Definiciones DDL (EXTERNAL INTERFACES, Schemas). Todas las sentencias son
//! `CREATE TABLE IF NOT EXISTS` -- idempotentes, como exige el contrato
//! `ensure_schema` de la URL Store.

use crate::errors::DbError;
use libsql::Connection;

const CREATE_FEED_URLS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS urls (
        url TEXT UNIQUE,
        listed_at INTEGER,
        google_flagged_at INTEGER,
        yandex_flagged_at INTEGER,
        hash BLOB
    )
"#;

const CREATE_IPV4_URLS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS urls (
        url TEXT,
        google_flagged_at INTEGER,
        yandex_flagged_at INTEGER,
        hash BLOB
    )
"#;

const CREATE_PREFIX_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS maliciousHashPrefixes (
        prefix BLOB,
        prefix_size INTEGER,
        vendor TEXT
    )
"#;

const CREATE_PREFIX_VENDOR_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_prefix_vendor ON maliciousHashPrefixes(vendor, prefix_size)
"#;

pub async fn ensure_feed_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute(CREATE_FEED_URLS_TABLE, ())
        .await
        .map_err(DbError::Schema)?;
    Ok(())
}

pub async fn ensure_ipv4_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute(CREATE_IPV4_URLS_TABLE, ())
        .await
        .map_err(DbError::Schema)?;
    Ok(())
}

pub async fn ensure_prefix_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute(CREATE_PREFIX_TABLE, ())
        .await
        .map_err(DbError::Schema)?;
    conn.execute(CREATE_PREFIX_VENDOR_INDEX, ())
        .await
        .map_err(DbError::Schema)?;
    Ok(())
}
