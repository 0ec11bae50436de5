// [libs/infra/vendor-client/src/errors.rs]
//! Catalogo de fallos del enlace con las APIs Safe Browsing (ERROR HANDLING
//! DESIGN, kinds TransportError/ProtocolError/DecodeError). Ninguna variante
//! de este enum cruza el limite publico de los clientes: internamente se
//! degradan a resultado vacio y se registran con `tracing::warn`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VendorClientError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    #[error("response body did not match the expected shape: {0}")]
    Protocol(String),

    #[error("failed to decode rawHashes: {0}")]
    Decode(String),
}
