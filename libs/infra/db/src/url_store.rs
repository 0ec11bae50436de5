// [libs/infra/db/src/url_store.rs]
/*!
 * =================================================================
 * APARATO: URL STORE (C2)
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE REGISTROS URL POR FEED, JOIN CONTRA
 *                  PREFIJOS EN MEMORIA Y MARCADO DE CONFIRMACIONES VENDOR
 * =================================================================
 */

use crate::client::DbHandle;
use crate::errors::DbError;
use crate::schema;
use hashfilter_core_hash::{canonical_url_hash, ipv4_dotted_quad, HASH_SIZE};
use hashfilter_domain_models::{UrlRecord, Vendor};
use libsql::params;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Tamano maximo de cada lote IN-clause para `mark_flagged`, conforme al
/// techo de parametros de la URL Store (§4.2).
const MARK_FLAGGED_CHUNK_SIZE: usize = 30_000;

/// Cantidad total de direcciones IPv4 sintetizables: 2^32.
const IPV4_ADDRESS_SPACE: u64 = 1u64 << 32;

/// Tamano de ráfaga de commit durante la regeneracion del censo IPv4,
/// para acotar la memoria residente independientemente de 2^32.
const IPV4_COMMIT_CHUNK: u64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Store de un feed nominal: `url` es UNIQUE, `listed_at` se rastrea.
    Feed,
    /// Store sintetico IPv4: sin UNIQUE ni `listed_at` (ver DESIGN NOTES,
    /// Open Questions).
    Ipv4,
}

pub struct UrlStore {
    handle: DbHandle,
    name: String,
    kind: StoreKind,
}

impl UrlStore {
    /// Abre el store y aplica el esquema correspondiente a `kind`.
    #[instrument(skip(databases_dir))]
    pub async fn open(
        databases_dir: &std::path::Path,
        name: &str,
        kind: StoreKind,
    ) -> Result<Self, DbError> {
        let handle = DbHandle::open(databases_dir, name).await?;
        let conn = handle.connect()?;
        match kind {
            StoreKind::Feed => schema::ensure_feed_schema(&conn).await?,
            StoreKind::Ipv4 => schema::ensure_ipv4_schema(&conn).await?,
        }
        Ok(Self {
            handle,
            name: name.to_string(),
            kind,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    /// Inserta o actualiza un lote de URLs en una unica transaccion atomica.
    /// En conflicto de `url`, solo `listed_at` se actualiza (Invariante U2);
    /// `hash` nunca cambia tras la primera insercion (Invariante U1).
    #[instrument(skip(self, urls))]
    pub async fn upsert_batch(&self, listed_at: i64, urls: &[String]) -> Result<(), DbError> {
        if urls.is_empty() {
            return Ok(());
        }
        let conn = self.handle.connect()?;
        let tx = conn
            .transaction()
            .await
            .map_err(|source| DbError::Transaction {
                feed: self.name.clone(),
                operation: "upsert_batch",
                source,
            })?;

        for url in urls {
            let hash = canonical_url_hash(url);
            tx.execute(
                "INSERT INTO urls (url, listed_at, hash) VALUES (?1, ?2, ?3)
                 ON CONFLICT(url) DO UPDATE SET listed_at = excluded.listed_at",
                params![url.as_str(), listed_at, hash.to_vec()],
            )
            .await
            .map_err(DbError::Query)?;
        }

        tx.commit().await.map_err(|source| DbError::Transaction {
            feed: self.name.clone(),
            operation: "upsert_batch",
            source,
        })?;

        debug!("upserted {} urls into [{}] at listed_at={}", urls.len(), self.name, listed_at);
        Ok(())
    }

    /// Regenera el censo IPv4 completo si el conteo de filas no es exactamente
    /// 2^32. Solo valido para stores `StoreKind::Ipv4`.
    #[instrument(skip(self))]
    pub async fn bulk_insert_ips(&self) -> Result<(), DbError> {
        self.bulk_insert_ips_up_to(IPV4_ADDRESS_SPACE).await
    }

    /// Variante parametrizada por el tamano objetivo del espacio, para
    /// permitir que las pruebas ejerciten la logica de regeneracion sin
    /// recorrer las 2^32 direcciones reales.
    async fn bulk_insert_ips_up_to(&self, target_count: u64) -> Result<(), DbError> {
        debug_assert_eq!(self.kind, StoreKind::Ipv4);

        let conn = self.handle.connect()?;
        let current_count = self.count_rows(&conn).await?;
        if current_count == target_count {
            info!("ipv4 store [{}] already holds {} rows, skipping regeneration", self.name, target_count);
            return Ok(());
        }

        info!(
            "ipv4 store [{}] holds {} rows, expected {} -- regenerating",
            self.name, current_count, target_count
        );
        conn.execute("DELETE FROM urls", ())
            .await
            .map_err(DbError::Query)?;

        let mut addr: u64 = 0;
        while addr < target_count {
            let chunk_end = (addr + IPV4_COMMIT_CHUNK).min(target_count);
            let tx = conn
                .transaction()
                .await
                .map_err(|source| DbError::Transaction {
                    feed: self.name.clone(),
                    operation: "bulk_insert_ips",
                    source,
                })?;

            for candidate in addr..chunk_end {
                let ip_text = ipv4_dotted_quad(candidate as u32);
                let hash = canonical_url_hash(&ip_text);
                tx.execute(
                    "INSERT INTO urls (url, hash) VALUES (?1, ?2)",
                    params![ip_text, hash.to_vec()],
                )
                .await
                .map_err(DbError::Query)?;
            }

            tx.commit().await.map_err(|source| DbError::Transaction {
                feed: self.name.clone(),
                operation: "bulk_insert_ips",
                source,
            })?;

            addr = chunk_end;
            info!("ipv4 regeneration progress: {}/{}", addr, target_count);
        }

        Ok(())
    }

    /// Devuelve la fila completa de `url` como `UrlRecord`, si existe. El
    /// store IPv4 no tiene columna `listed_at` (Open Question resuelta:
    /// `listed_at` es irrelevante para un censo sintetico), asi que se
    /// reporta como `None` para ese `kind`.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Option<UrlRecord>, DbError> {
        let conn = self.handle.connect()?;
        let sql = match self.kind {
            StoreKind::Feed => "SELECT url, listed_at, google_flagged_at, yandex_flagged_at, hash FROM urls WHERE url = ?1",
            StoreKind::Ipv4 => "SELECT url, google_flagged_at, yandex_flagged_at, hash FROM urls WHERE url = ?1",
        };
        let mut rows = conn.query(sql, params![url]).await.map_err(DbError::Query)?;

        let Some(row) = rows.next().await.map_err(DbError::Query)? else {
            return Ok(None);
        };

        let hash_index = match self.kind {
            StoreKind::Feed => 4,
            StoreKind::Ipv4 => 3,
        };
        let hash_bytes: Vec<u8> = row.get(hash_index).map_err(|e| DbError::Mapping(e.to_string()))?;
        let mut hash = [0u8; HASH_SIZE];
        if hash_bytes.len() != HASH_SIZE {
            return Err(DbError::Mapping(format!("hash column had {} bytes, expected {HASH_SIZE}", hash_bytes.len())));
        }
        hash.copy_from_slice(&hash_bytes);

        let (listed_at, google_flagged_at, yandex_flagged_at) = match self.kind {
            StoreKind::Feed => (
                row.get(1).map_err(|e| DbError::Mapping(e.to_string()))?,
                row.get(2).map_err(|e| DbError::Mapping(e.to_string()))?,
                row.get(3).map_err(|e| DbError::Mapping(e.to_string()))?,
            ),
            StoreKind::Ipv4 => (
                None,
                row.get(1).map_err(|e| DbError::Mapping(e.to_string()))?,
                row.get(2).map_err(|e| DbError::Mapping(e.to_string()))?,
            ),
        };

        Ok(Some(UrlRecord {
            url: row.get(0).map_err(|e| DbError::Mapping(e.to_string()))?,
            listed_at,
            google_flagged_at,
            yandex_flagged_at,
            hash,
        }))
    }

    async fn count_rows(&self, conn: &libsql::Connection) -> Result<u64, DbError> {
        let mut rows = conn
            .query("SELECT COUNT(*) FROM urls", ())
            .await
            .map_err(DbError::Query)?;
        let row = rows
            .next()
            .await
            .map_err(DbError::Query)?
            .ok_or_else(|| DbError::Mapping("COUNT(*) returned no row".to_string()))?;
        let count: i64 = row.get(0).map_err(|e| DbError::Mapping(e.to_string()))?;
        Ok(count as u64)
    }

    /// Devuelve las URLs cuyo hash coincide, en sus primeros `prefix_size`
    /// bytes, con algun prefijo de `prefixes`. El join se ejecuta en
    /// proceso (§9 DESIGN NOTES: variante en memoria) en vez de un ATTACH
    /// SQL cruzado, eliminando la condicion de carrera de adjuntar/desadjuntar
    /// bajo workers concurrentes.
    #[instrument(skip(self, prefixes))]
    pub async fn select_suspects(
        &self,
        prefix_size: usize,
        prefixes: &HashSet<Vec<u8>>,
    ) -> Result<HashSet<String>, DbError> {
        if prefixes.is_empty() {
            return Ok(HashSet::new());
        }

        let conn = self.handle.connect()?;
        let mut rows = conn
            .query("SELECT url, hash FROM urls", ())
            .await
            .map_err(DbError::Query)?;

        let mut suspects = HashSet::new();
        while let Some(row) = rows.next().await.map_err(DbError::Query)? {
            let url: String = row.get(0).map_err(|e| DbError::Mapping(e.to_string()))?;
            let hash: Vec<u8> = row.get(1).map_err(|e| DbError::Mapping(e.to_string()))?;
            if hash.len() >= prefix_size && prefixes.contains(&hash[..prefix_size]) {
                suspects.insert(url);
            }
        }
        Ok(suspects)
    }

    /// Marca `{vendor}_flagged_at = at` para cada URL en `confirmed`,
    /// fragmentando en lotes IN-clause de a lo sumo `MARK_FLAGGED_CHUNK_SIZE`.
    #[instrument(skip(self, confirmed))]
    pub async fn mark_flagged(
        &self,
        vendor: Vendor,
        confirmed: &HashSet<String>,
        at: i64,
    ) -> Result<(), DbError> {
        if confirmed.is_empty() {
            return Ok(());
        }
        let column = match vendor {
            Vendor::Google => "google_flagged_at",
            Vendor::Yandex => "yandex_flagged_at",
        };

        let conn = self.handle.connect()?;
        let urls: Vec<&String> = confirmed.iter().collect();

        for chunk in urls.chunks(MARK_FLAGGED_CHUNK_SIZE) {
            let placeholders: Vec<String> = (0..chunk.len()).map(|i| format!("?{}", i + 2)).collect();
            let sql = format!(
                "UPDATE urls SET {column} = ?1 WHERE url IN ({})",
                placeholders.join(",")
            );

            let mut bound: Vec<libsql::Value> = Vec::with_capacity(chunk.len() + 1);
            bound.push(libsql::Value::Integer(at));
            for url in chunk {
                bound.push(libsql::Value::Text((*url).clone()));
            }

            conn.execute(&sql, bound).await.map_err(DbError::Query)?;
        }

        debug!("marked {} urls as {}={} in [{}]", confirmed.len(), column, at, self.name);
        Ok(())
    }

    /// URLs cuyo `google_flagged_at` o `yandex_flagged_at` iguala el maximo
    /// de su respectiva columna en este store (Property T7).
    #[instrument(skip(self))]
    pub async fn latest_flagged(&self) -> Result<HashSet<String>, DbError> {
        let conn = self.handle.connect()?;

        let max_google = self.column_max(&conn, "google_flagged_at").await?;
        let max_yandex = self.column_max(&conn, "yandex_flagged_at").await?;

        if max_google.is_none() && max_yandex.is_none() {
            return Ok(HashSet::new());
        }

        let mut rows = conn
            .query(
                "SELECT url FROM urls WHERE google_flagged_at = ?1 OR yandex_flagged_at = ?2",
                params![max_google, max_yandex],
            )
            .await
            .map_err(DbError::Query)?;

        let mut urls = HashSet::new();
        while let Some(row) = rows.next().await.map_err(DbError::Query)? {
            urls.insert(row.get(0).map_err(|e| DbError::Mapping(e.to_string()))?);
        }
        Ok(urls)
    }

    async fn column_max(&self, conn: &libsql::Connection, column: &str) -> Result<Option<i64>, DbError> {
        let sql = format!("SELECT MAX({column}) FROM urls");
        let mut rows = conn.query(&sql, ()).await.map_err(DbError::Query)?;
        let row = rows
            .next()
            .await
            .map_err(DbError::Query)?
            .ok_or_else(|| DbError::Mapping(format!("MAX({column}) returned no row")))?;
        row.get(0).map_err(|e| DbError::Mapping(e.to_string()))
    }
}

/// Union de `latest_flagged` a traves de varios stores (contrato
/// `latest_flagged_urls(feed_names)`): "URLs confirmadas maliciosas en la
/// corrida mas reciente", agregadas sobre los feeds seleccionados.
pub async fn latest_flagged_urls(stores: &[&UrlStore]) -> Result<HashSet<String>, DbError> {
    let mut union = HashSet::new();
    for store in stores {
        union.extend(store.latest_flagged().await?);
    }
    Ok(union)
}
