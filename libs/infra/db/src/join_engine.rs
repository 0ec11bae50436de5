// [libs/infra/db/src/join_engine.rs]
/*!
 * =================================================================
 * APARATO: PREFIX-JOIN ENGINE (C4)
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CRUCE ENTRE UN URL STORE Y LOS PREFIJOS DE UN VENDOR,
 *                  EJECUTADO EN PROCESO (SIN ATTACH SQL CRUZADO)
 *
 * El cruce de tamanos de prefijo distintos corre concurrentemente: cada
 * `select_suspects` de un tamano dado es una exploracion completa del
 * store, y no hay dependencia entre tamanos.
 * =================================================================
 */

use crate::errors::DbError;
use crate::url_store::UrlStore;
use hashfilter_domain_models::Vendor;
use std::collections::HashSet;
use tracing::instrument;

pub struct PrefixJoinEngine;

impl PrefixJoinEngine {
    /// Union de sospechosos sobre todos los tamanos de prefijo presentes
    /// para `vendor`. Si el vendor no tiene prefijos (feed desarmado), el
    /// resultado es el conjunto vacio, no un error.
    #[instrument(skip(url_store, prefix_store))]
    pub async fn suspects(
        url_store: &UrlStore,
        prefix_store: &crate::prefix_store::PrefixStore,
        vendor: Vendor,
    ) -> Result<HashSet<String>, DbError> {
        let by_size = prefix_store.load_for_vendor(vendor).await?;
        if by_size.is_empty() {
            return Ok(HashSet::new());
        }

        let lookups = by_size
            .into_iter()
            .map(|(size, prefixes)| async move { url_store.select_suspects(size, &prefixes).await });

        let results = futures::future::join_all(lookups).await;

        let mut union = HashSet::new();
        for result in results {
            union.extend(result?);
        }
        Ok(union)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix_store::PrefixStore;
    use crate::url_store::{StoreKind, UrlStore};
    use hashfilter_core_hash::canonical_url_hash;
    use hashfilter_domain_models::PrefixRecord;

    #[tokio::test]
    async fn suspects_unions_across_prefix_sizes() {
        let url_dir = tempfile::tempdir().unwrap();
        let prefix_dir = tempfile::tempdir().unwrap();

        let url_store = UrlStore::open(url_dir.path(), "feed", StoreKind::Feed).await.unwrap();
        let prefix_store = PrefixStore::open(prefix_dir.path(), "prefixes").await.unwrap();

        url_store
            .upsert_batch(1, &["four.test".to_string(), "five.test".to_string(), "clean.test".to_string()])
            .await
            .unwrap();

        let four_hash = canonical_url_hash("four.test");
        let five_hash = canonical_url_hash("five.test");

        prefix_store
            .replace_vendor(
                Vendor::Google,
                &[
                    PrefixRecord::new(four_hash[..4].to_vec(), Vendor::Google),
                    PrefixRecord::new(five_hash[..5].to_vec(), Vendor::Google),
                ],
            )
            .await
            .unwrap();

        let suspects = PrefixJoinEngine::suspects(&url_store, &prefix_store, Vendor::Google)
            .await
            .unwrap();

        assert_eq!(
            suspects,
            HashSet::from(["four.test".to_string(), "five.test".to_string()])
        );
    }

    #[tokio::test]
    async fn suspects_empty_when_vendor_disarmed() {
        let url_dir = tempfile::tempdir().unwrap();
        let prefix_dir = tempfile::tempdir().unwrap();

        let url_store = UrlStore::open(url_dir.path(), "feed", StoreKind::Feed).await.unwrap();
        let prefix_store = PrefixStore::open(prefix_dir.path(), "prefixes").await.unwrap();

        url_store
            .upsert_batch(1, &["whatever.test".to_string()])
            .await
            .unwrap();

        let suspects = PrefixJoinEngine::suspects(&url_store, &prefix_store, Vendor::Google)
            .await
            .unwrap();
        assert!(suspects.is_empty());
    }
}
