// [libs/domain/feeds/src/errors.rs]
//! Errores de adquisicion de feeds. Un feed que falla nunca entra en panico;
//! el Orchestrator decide si el resto de la corrida continua (ERROR HANDLING
//! DESIGN, kind StoreError tratado de forma analoga para feeds locales).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("failed to read local feed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
