// [libs/core/hash/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CANONICAL URL HASHING ENGINE
 * CLASIFICACION: CORE (ESTRATO L1)
 * RESPONSABILIDAD: HASHING CRIPTOGRAFICO CONFORME AL CONTRATO SAFE BROWSING
 *
 * El contrato Safe Browsing hashea la forma canonica de una URL, no la
 * URL cruda: minuscula, sin esquema, con una unica barra final. Esta
 * unidad es deliberadamente pura -- no reintenta normalizar nada que el
 * llamador no haya normalizado ya.
 * =================================================================
 */

use sha2::{Digest, Sha256};

/// Tamano del digest SHA-256 en bytes.
pub const HASH_SIZE: usize = 32;

/// Calcula `SHA256(url || "/")`, el contrato de hashing canonico Safe Browsing.
///
/// `url` debe llegar ya canonicalizado por el llamador (minuscula, sin
/// esquema, recortado). Esta funcion no hace ninguna normalizacion
/// adicional -- ver Invariante U1.
#[inline]
pub fn canonical_url_hash(url: &str) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b"/");
    let digest = hasher.finalize();
    let mut output = [0u8; HASH_SIZE];
    output.copy_from_slice(&digest);
    output
}

/// Devuelve los primeros `n` bytes de un hash de 32 bytes.
///
/// `n` mayor que `HASH_SIZE` se trunca silenciosamente al tamano completo;
/// los prefijos Safe Browsing nunca exceden 32 bytes (ver Invariante P1).
#[inline]
pub fn prefix(hash: &[u8; HASH_SIZE], n: usize) -> &[u8] {
    &hash[..n.min(HASH_SIZE)]
}

/// Convierte un entero de 32 bits (host order) en su representacion
/// dotted-quad big-endian, tal como la espera el censo IPv4 sintetico.
#[inline]
pub fn ipv4_dotted_quad(addr: u32) -> String {
    let octets = addr.to_be_bytes();
    format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
}
