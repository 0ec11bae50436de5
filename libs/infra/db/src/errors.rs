// [libs/infra/db/src/errors.rs]
//! Catalogo de errores del estrato de persistencia (ERROR HANDLING DESIGN,
//! kind StoreError): toda operacion de store falla de forma tipada y
//! retryable, nunca entra en panico.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("database connection failed for {path}: {source}")]
    Connection {
        path: String,
        #[source]
        source: libsql::Error,
    },

    #[error("schema bootstrap failed: {0}")]
    Schema(#[source] libsql::Error),

    #[error("query rejected: {0}")]
    Query(#[source] libsql::Error),

    #[error("transaction aborted during {operation} on {feed}: {source}")]
    Transaction {
        feed: String,
        operation: &'static str,
        #[source]
        source: libsql::Error,
    },

    #[error("column mapping failed: {0}")]
    Mapping(String),
}
