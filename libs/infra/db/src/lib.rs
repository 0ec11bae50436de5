// [libs/infra/db/src/lib.rs]
//! Estrato de persistencia: un archivo libSQL fisico por store, WAL +
//! auto-vacuum, y el join de prefijos ejecutado en proceso.

mod client;
mod errors;
mod join_engine;
mod prefix_store;
mod schema;
mod url_store;

pub use client::DbHandle;
pub use errors::DbError;
pub use join_engine::PrefixJoinEngine;
pub use prefix_store::PrefixStore;
pub use url_store::{latest_flagged_urls, StoreKind, UrlStore};
