// [libs/domain/models/src/config.rs]
//! Configuracion de una corrida del Orquestador (EXTERNAL INTERFACES, CLI
//! surface). Construida una sola vez por el llamador y pasada explicitamente
//! a los constructores de cada componente -- nunca leida de variables
//! ambientales dentro de las librerias (ver DESIGN NOTES, "Global
//! configuration").

use crate::vendor::Vendor;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Configuracion recibida por el Orquestador para una corrida completa.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Tags de feed habilitados para la fase de ingesta (p.ej. "top1m", "ipv4").
    pub sources: HashSet<String>,
    /// Si los feeds que soportan obtencion remota deben efectivamente
    /// realizar la llamada HTTP (vs. reusar lo ya persistido).
    pub fetch: bool,
    /// Subconjunto de vendors activos en esta corrida.
    pub vendors: HashSet<Vendor>,
    /// Epoch en segundos usado como "now" para marcar `listed_at` / `*_flagged_at`.
    pub update_time: i64,
    /// Directorio base donde residen los archivos `.db` por feed.
    pub databases_dir: PathBuf,
    /// Claves de API por vendor, requeridas solo para los vendors activos.
    pub api_keys: HashMap<Vendor, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no API key configured for vendor {0}")]
    MissingApiKey(Vendor),
    #[error("unknown vendor requested: {0}")]
    UnknownVendor(String),
}

impl RunConfig {
    /// Valida que cada vendor activo tenga una clave de API configurada.
    /// Unica validacion que el spec marca como fatal-al-inicio (ConfigError).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for vendor in &self.vendors {
            if !self.api_keys.contains_key(vendor) {
                return Err(ConfigError::MissingApiKey(*vendor));
            }
        }
        Ok(())
    }

    pub fn api_key(&self, vendor: Vendor) -> Result<&str, ConfigError> {
        self.api_keys
            .get(&vendor)
            .map(String::as_str)
            .ok_or(ConfigError::MissingApiKey(vendor))
    }
}
