// [libs/infra/vendor-client/src/retry.rs]
//! Envoltorio de reintentos con back-off exponencial acotado. Agota los
//! intentos sin propagar el error: el llamador decide el valor por defecto
//! (ERROR HANDLING DESIGN: TransportError "retried with back-off ... on
//! exhaustion, empty response").

use crate::errors::VendorClientError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_DELAY: Duration = Duration::from_millis(250);

pub async fn with_backoff<F, Fut, T>(label: &str, mut op: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, VendorClientError>>,
{
    let mut delay = INITIAL_DELAY;
    for attempt in 1..=MAX_ATTEMPTS {
        match op().await {
            Ok(value) => return Some(value),
            Err(error) => {
                warn!("{label}: attempt {attempt}/{MAX_ATTEMPTS} failed: {error}");
                if attempt == MAX_ATTEMPTS {
                    return None;
                }
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
    None
}
