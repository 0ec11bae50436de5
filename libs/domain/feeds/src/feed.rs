// [libs/domain/feeds/src/feed.rs]
/*!
 * =================================================================
 * APARATO: FEED CONTRACT
 * CLASIFICACION: DOMAIN LAYER (ESTRATO L2)
 * RESPONSABILIDAD: CAPACIDAD UNICA "EMITIR LOTES DE HOSTNAMES NORMALIZADOS"
 *
 * Los feeds varian solo en como producen lotes; se modelan como una unica
 * capacidad en vez de una jerarquia de herencia (DESIGN NOTES,
 * "Polymorphism over feeds").
 * =================================================================
 */

use crate::errors::FeedError;
use futures::stream::BoxStream;
use std::collections::HashSet;

/// Un lote de expresiones de hostname normalizadas (minusculas, sin esquema).
pub type UrlBatch = HashSet<String>;

/// Variante etiquetada del origen de un feed (DESIGN NOTES, "Polymorphism
/// over feeds"): una capacidad unica con un tag, en vez de una jerarquia.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    LocalFile,
    HttpZip,
    HttpText,
    SyntheticIpv4,
}

/// Fuente de URLs candidatas. Cada feed declara el nombre del store al que
/// sus lotes deben dirigirse (el `feed_name` del contrato de la URL Store).
pub trait Feed: Send + Sync {
    /// Nombre del store destino (p. ej. `"top_domains"`, `"ipv4"`).
    fn store_name(&self) -> &str;

    /// Tag de origen, usado por el Orchestrator para rutear casos especiales
    /// (p. ej. el feed IPv4 sintetico se regenera, no se upsertea).
    fn kind(&self) -> FeedKind;

    /// Emite lotes de hostnames normalizados como un stream asincrono.
    fn stream(&self) -> BoxStream<'_, Result<UrlBatch, FeedError>>;
}
