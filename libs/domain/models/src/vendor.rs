// [libs/domain/models/src/vendor.rs]
//! Tag de vendor Safe Browsing. Cada componente del pipeline trata el
//! vendor como una pequena etiqueta opaca (ver DATA MODEL, Prefix record);
//! este enum es la unica fuente de verdad para su representacion textual.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vendor {
    Google,
    Yandex,
}

impl Vendor {
    pub const ALL: [Vendor; 2] = [Vendor::Google, Vendor::Yandex];

    /// Tag textual persistido en las columnas `*_flagged_at` y en la tabla
    /// `maliciousHashPrefixes.vendor`.
    pub fn as_str(self) -> &'static str {
        match self {
            Vendor::Google => "Google",
            Vendor::Yandex => "Yandex",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Vendor {
    type Err = UnknownVendor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Google" => Ok(Vendor::Google),
            "Yandex" => Ok(Vendor::Yandex),
            other => Err(UnknownVendor(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown vendor tag: {0}")]
pub struct UnknownVendor(pub String);
