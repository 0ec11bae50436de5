// [libs/infra/vendor-client/src/lib.rs]
//! Clientes Safe Browsing: Update API (prefijos) y Lookup API
//! (confirmacion), cada uno degradando fallos a resultado vacio en vez de
//! propagar errores al Orchestrator.

mod endpoints;
mod errors;
mod lookup_client;
mod retry;
mod update_client;

pub use endpoints::VendorEndpoints;
pub use errors::VendorClientError;
pub use lookup_client::LookupApiClient;
pub use update_client::UpdateApiClient;
