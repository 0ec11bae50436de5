// [libs/domain/feeds/src/ipv4.rs]
/*!
 * =================================================================
 * APARATO: SYNTHETIC IPV4 FEED
 * CLASIFICACION: DOMAIN LAYER (ESTRATO L2)
 * RESPONSABILIDAD: ENUMERAR EL ESPACIO IPV4 COMPLETO EN LOTES, SIN
 *                  MATERIALIZAR 2^32 ENTRADAS EN MEMORIA
 * =================================================================
 */

use crate::errors::FeedError;
use crate::feed::{Feed, FeedKind, UrlBatch};
use futures::stream::{self, BoxStream, StreamExt};
use hashfilter_core_hash::ipv4_dotted_quad;

const DEFAULT_BATCH_SIZE: u64 = 65_536;

/// Feed sintetico que enumera `[0, address_space)` como direcciones dotted-quad.
/// El Orchestrator lo reconoce via `kind() == FeedKind::SyntheticIpv4` y, en
/// la practica, delega en `UrlStore::bulk_insert_ips` en vez de consumir este
/// stream lote a lote -- el stream existe para permitir pruebas de
/// enumeracion independientes del store.
pub struct SyntheticIpv4Feed {
    address_space: u64,
    batch_size: u64,
}

impl SyntheticIpv4Feed {
    pub fn new() -> Self {
        Self {
            address_space: 1u64 << 32,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Variante con un espacio de direcciones acotado, para pruebas.
    pub fn bounded(address_space: u64, batch_size: u64) -> Self {
        Self {
            address_space,
            batch_size,
        }
    }
}

impl Default for SyntheticIpv4Feed {
    fn default() -> Self {
        Self::new()
    }
}

impl Feed for SyntheticIpv4Feed {
    fn store_name(&self) -> &str {
        "ipv4"
    }

    fn kind(&self) -> FeedKind {
        FeedKind::SyntheticIpv4
    }

    fn stream(&self) -> BoxStream<'_, Result<UrlBatch, FeedError>> {
        let address_space = self.address_space;
        let batch_size = self.batch_size;

        stream::unfold(0u64, move |next| async move {
            if next >= address_space {
                return None;
            }
            let end = (next + batch_size).min(address_space);
            let batch: UrlBatch = (next..end).map(|addr| ipv4_dotted_quad(addr as u32)).collect();
            Some((Ok(batch), end))
        })
        .boxed()
    }
}
