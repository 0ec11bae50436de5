// [apps/orchestrator/src/errors.rs]
//! Errores fatales del Orquestador. Por ERROR HANDLING DESIGN, el proceso
//! sale con codigo distinto de cero unicamente por `ConfigError`; toda
//! otra falla se registra y degrada dentro de `run`.

use hashfilter_domain_models::ConfigError;
use hashfilter_infra_db::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialize a store: {0}")]
    Store(#[from] DbError),
}
