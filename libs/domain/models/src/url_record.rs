// [libs/domain/models/src/url_record.rs]
//! Registro de URL persistido por feed store (DATA MODEL, URL record).

use crate::vendor::Vendor;

/// Una fila de la tabla `urls` de un feed store.
///
/// Invariante U1: `hash == SHA256(url || "/")` en todo momento.
/// Invariante U2: `listed_at` es monotona no-decreciente por `url`.
/// Invariante U3: un `*_flagged_at` no nulo solo lo escribe el Orquestador
/// tras una confirmacion de Lookup exitosa de ese vendor en la misma corrida.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub url: String,
    pub listed_at: Option<i64>,
    pub google_flagged_at: Option<i64>,
    pub yandex_flagged_at: Option<i64>,
    pub hash: [u8; 32],
}

impl UrlRecord {
    pub fn flagged_at(&self, vendor: Vendor) -> Option<i64> {
        match vendor {
            Vendor::Google => self.google_flagged_at,
            Vendor::Yandex => self.yandex_flagged_at,
        }
    }
}
