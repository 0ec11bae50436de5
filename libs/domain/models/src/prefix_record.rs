// [libs/domain/models/src/prefix_record.rs]
//! Registro de prefijo de hash, persistido en el store global de prefijos
//! (DATA MODEL, Prefix record).

use crate::vendor::Vendor;

/// Una fila de `maliciousHashPrefixes`.
///
/// Invariante P1: `prefix_size == len(prefix)`.
/// Invariante P2: todas las filas de un `vendor` se escriben dentro de una
/// unica transaccion de reemplazo; nunca es visible un estado parcial.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrefixRecord {
    pub prefix: Vec<u8>,
    pub vendor: Vendor,
}

impl PrefixRecord {
    pub fn new(prefix: Vec<u8>, vendor: Vendor) -> Self {
        Self { prefix, vendor }
    }

    pub fn prefix_size(&self) -> usize {
        self.prefix.len()
    }
}
