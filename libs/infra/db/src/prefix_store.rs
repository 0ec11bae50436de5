// [libs/infra/db/src/prefix_store.rs]
/*!
 * =================================================================
 * APARATO: PREFIX STORE (C3)
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DEL CONJUNTO DE PREFIJOS MALICIOSOS POR
 *                  VENDOR, REEMPLAZADO ATOMICAMENTE EN CADA ACTUALIZACION
 * =================================================================
 */

use crate::client::DbHandle;
use crate::errors::DbError;
use crate::schema;
use hashfilter_domain_models::{PrefixRecord, Vendor};
use libsql::params;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

pub struct PrefixStore {
    handle: DbHandle,
    name: String,
}

impl PrefixStore {
    #[instrument(skip(databases_dir))]
    pub async fn open(databases_dir: &std::path::Path, name: &str) -> Result<Self, DbError> {
        let handle = DbHandle::open(databases_dir, name).await?;
        let conn = handle.connect()?;
        schema::ensure_prefix_schema(&conn).await?;
        Ok(Self {
            handle,
            name: name.to_string(),
        })
    }

    /// Reemplaza el conjunto completo de prefijos de `vendor` en una unica
    /// transaccion: borra todas las filas existentes de ese vendor e inserta
    /// las nuevas. Un Update fallido que produzca un conjunto vacio
    /// desarma al vendor (Open Question resuelta: comportamiento aceptado,
    /// no se preserva el estado anterior silenciosamente).
    #[instrument(skip(self, records))]
    pub async fn replace_vendor(&self, vendor: Vendor, records: &[PrefixRecord]) -> Result<(), DbError> {
        let conn = self.handle.connect()?;
        let tx = conn
            .transaction()
            .await
            .map_err(|source| DbError::Transaction {
                feed: self.name.clone(),
                operation: "replace_vendor",
                source,
            })?;

        tx.execute(
            "DELETE FROM maliciousHashPrefixes WHERE vendor = ?1",
            params![vendor.as_str()],
        )
        .await
        .map_err(DbError::Query)?;

        for record in records {
            tx.execute(
                "INSERT INTO maliciousHashPrefixes (prefix, prefix_size, vendor) VALUES (?1, ?2, ?3)",
                params![record.prefix.clone(), record.prefix_size() as i64, vendor.as_str()],
            )
            .await
            .map_err(DbError::Query)?;
        }

        tx.commit().await.map_err(|source| DbError::Transaction {
            feed: self.name.clone(),
            operation: "replace_vendor",
            source,
        })?;

        debug!("replaced {} prefixes for vendor {} in [{}]", records.len(), vendor, self.name);
        Ok(())
    }

    /// Tamanos de prefijo distintos presentes para `vendor`.
    #[instrument(skip(self))]
    pub async fn distinct_sizes(&self, vendor: Vendor) -> Result<Vec<usize>, DbError> {
        let conn = self.handle.connect()?;
        let mut rows = conn
            .query(
                "SELECT DISTINCT prefix_size FROM maliciousHashPrefixes WHERE vendor = ?1",
                params![vendor.as_str()],
            )
            .await
            .map_err(DbError::Query)?;

        let mut sizes = Vec::new();
        while let Some(row) = rows.next().await.map_err(DbError::Query)? {
            let size: i64 = row.get(0).map_err(|e| DbError::Mapping(e.to_string()))?;
            sizes.push(size as usize);
        }
        Ok(sizes)
    }

    /// Carga el conjunto completo de prefijos de `vendor`, agrupados por
    /// tamano, para el join en proceso (§9 DESIGN NOTES).
    #[instrument(skip(self))]
    pub async fn load_for_vendor(&self, vendor: Vendor) -> Result<HashMap<usize, HashSet<Vec<u8>>>, DbError> {
        let conn = self.handle.connect()?;
        let mut rows = conn
            .query(
                "SELECT prefix, prefix_size FROM maliciousHashPrefixes WHERE vendor = ?1",
                params![vendor.as_str()],
            )
            .await
            .map_err(DbError::Query)?;

        let mut by_size: HashMap<usize, HashSet<Vec<u8>>> = HashMap::new();
        while let Some(row) = rows.next().await.map_err(DbError::Query)? {
            let prefix: Vec<u8> = row.get(0).map_err(|e| DbError::Mapping(e.to_string()))?;
            let size: i64 = row.get(1).map_err(|e| DbError::Mapping(e.to_string()))?;
            by_size.entry(size as usize).or_default().insert(prefix);
        }
        Ok(by_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(prefix: &[u8], vendor: Vendor) -> PrefixRecord {
        PrefixRecord::new(prefix.to_vec(), vendor)
    }

    #[tokio::test]
    async fn replace_vendor_is_atomic_and_scoped_to_vendor() {
        let dir = tempfile::tempdir().unwrap();
        let store = PrefixStore::open(dir.path(), "prefixes").await.unwrap();

        store
            .replace_vendor(Vendor::Google, &[record(&[0xaa, 0xbb], Vendor::Google)])
            .await
            .unwrap();
        store
            .replace_vendor(Vendor::Yandex, &[record(&[0xcc, 0xdd], Vendor::Yandex)])
            .await
            .unwrap();

        store
            .replace_vendor(Vendor::Google, &[record(&[0x11, 0x22], Vendor::Google)])
            .await
            .unwrap();

        let google = store.load_for_vendor(Vendor::Google).await.unwrap();
        let yandex = store.load_for_vendor(Vendor::Yandex).await.unwrap();

        assert_eq!(google.get(&2).unwrap(), &HashSet::from([vec![0x11, 0x22]]));
        assert_eq!(yandex.get(&2).unwrap(), &HashSet::from([vec![0xcc, 0xdd]]));
    }

    #[tokio::test]
    async fn replace_vendor_with_empty_set_disarms_vendor() {
        let dir = tempfile::tempdir().unwrap();
        let store = PrefixStore::open(dir.path(), "prefixes").await.unwrap();

        store
            .replace_vendor(Vendor::Google, &[record(&[0xaa], Vendor::Google)])
            .await
            .unwrap();
        store.replace_vendor(Vendor::Google, &[]).await.unwrap();

        let google = store.load_for_vendor(Vendor::Google).await.unwrap();
        assert!(google.is_empty());
    }

    #[tokio::test]
    async fn distinct_sizes_reflects_loaded_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        let store = PrefixStore::open(dir.path(), "prefixes").await.unwrap();

        store
            .replace_vendor(
                Vendor::Google,
                &[record(&[0x01, 0x02], Vendor::Google), record(&[0x01, 0x02, 0x03], Vendor::Google)],
            )
            .await
            .unwrap();

        let mut sizes = store.distinct_sizes(Vendor::Google).await.unwrap();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![2, 3]);
    }
}
