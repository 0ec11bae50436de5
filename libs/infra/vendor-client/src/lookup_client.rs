// [libs/infra/vendor-client/src/lookup_client.rs]
/*!
 * =================================================================
 * APARATO: LOOKUP-API CLIENT (C6)
 * CLASIFICACION: INFRASTRUCTURE ADAPTER (ESTRATO L4)
 * RESPONSABILIDAD: CONFIRMAR SOSPECHOSOS CONTRA threatMatches:find EN
 *                  LOTES ACOTADOS POR VENDOR, CON THROTTLE ENTRE ENVIOS
 * =================================================================
 */

use crate::endpoints::VendorEndpoints;
use crate::errors::VendorClientError;
use crate::retry::with_backoff;
use hashfilter_domain_models::Vendor;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{instrument, warn};

/// Espera minima entre envios sucesivos en el mismo worker (§4.6,
/// "soft throttle"), calcada del `time.sleep(2)` tras cada POST.
const SUBMISSION_THROTTLE: Duration = Duration::from_secs(2);

#[derive(Serialize, Clone)]
struct ClientIdentity {
    #[serde(rename = "clientId")]
    client_id: String,
    #[serde(rename = "clientVersion")]
    client_version: String,
}

fn client_identity() -> ClientIdentity {
    ClientIdentity {
        client_id: "hashfilter-orchestrator".to_string(),
        client_version: "1.0.0".to_string(),
    }
}

#[derive(Serialize)]
struct ThreatEntry {
    url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThreatInfo {
    threat_types: Vec<&'static str>,
    platform_types: Vec<&'static str>,
    threat_entry_types: Vec<&'static str>,
    threat_entries: Vec<ThreatEntry>,
}

#[derive(Serialize)]
struct ThreatMatchesRequest {
    client: ClientIdentity,
    #[serde(rename = "threatInfo")]
    threat_info: ThreatInfo,
}

fn threat_matches_payload(urls: &[String]) -> ThreatMatchesRequest {
    ThreatMatchesRequest {
        client: client_identity(),
        threat_info: ThreatInfo {
            threat_types: vec![
                "THREAT_TYPE_UNSPECIFIED",
                "MALWARE",
                "SOCIAL_ENGINEERING",
                "UNWANTED_SOFTWARE",
                "POTENTIALLY_HARMFUL_APPLICATION",
            ],
            platform_types: vec![
                "PLATFORM_TYPE_UNSPECIFIED",
                "WINDOWS",
                "LINUX",
                "ANDROID",
                "OSX",
                "IOS",
                "ANY_PLATFORM",
                "ALL_PLATFORMS",
                "CHROME",
            ],
            threat_entry_types: vec!["THREAT_ENTRY_TYPE_UNSPECIFIED", "URL", "EXECUTABLE"],
            threat_entries: urls.iter().map(|u| ThreatEntry { url: format!("http://{u}") }).collect(),
        },
    }
}

#[derive(Deserialize, Default)]
struct ThreatMatchesResponse {
    #[serde(default)]
    matches: Vec<ThreatMatch>,
}

#[derive(Deserialize)]
struct ThreatMatch {
    threat: ThreatUrl,
}

#[derive(Deserialize)]
struct ThreatUrl {
    url: String,
}

fn strip_scheme(url: &str) -> String {
    url.trim_start_matches("https://").trim_start_matches("http://").to_string()
}

#[derive(Clone)]
pub struct LookupApiClient {
    http: Client,
    endpoints: Arc<VendorEndpoints>,
    _vendor: Vendor,
}

impl LookupApiClient {
    pub fn new(vendor: Vendor, api_key: &str) -> Self {
        Self::with_endpoints(vendor, VendorEndpoints::for_vendor(vendor, api_key))
    }

    /// Construye un cliente apuntando a endpoints explicitos, para pruebas
    /// de integracion contra un servidor mock.
    pub fn with_endpoints(vendor: Vendor, endpoints: VendorEndpoints) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("hashfilter-orchestrator/1.0")
            .build()
            .expect("failed to initialize HTTP client");
        Self {
            http,
            endpoints: Arc::new(endpoints),
            _vendor: vendor,
        }
    }

    /// Confirma `suspects` contra la API Lookup, particionando en lotes de
    /// a lo sumo `max_lookup_batch_size`, sometidos en paralelo bajo
    /// `worker_permits` concurrencia con throttle de 2s entre envios.
    #[instrument(skip(self, suspects))]
    pub async fn confirm(&self, suspects: &HashSet<String>, worker_permits: usize) -> HashSet<String> {
        if suspects.is_empty() {
            return HashSet::new();
        }

        let ordered: Vec<String> = suspects.iter().cloned().collect();
        let batches: Vec<Vec<String>> = ordered
            .chunks(self.endpoints.max_lookup_batch_size)
            .map(|chunk| chunk.to_vec())
            .collect();

        let semaphore = Arc::new(Semaphore::new(worker_permits.max(1)));
        let tasks = batches.into_iter().map(|batch| {
            let semaphore = semaphore.clone();
            let client = self.clone();
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closes");
                let confirmed = client.submit_batch(&batch).await;
                tokio::time::sleep(SUBMISSION_THROTTLE).await;
                confirmed
            }
        });

        let results = futures::future::join_all(tasks).await;
        let mut confirmed = HashSet::new();
        for batch_result in results {
            confirmed.extend(batch_result);
        }
        confirmed
    }

    async fn submit_batch(&self, batch: &[String]) -> HashSet<String> {
        match with_backoff("lookup_api.submit_batch", || self.submit_batch_once(batch)).await {
            Some(matches) => matches,
            None => {
                warn!("lookup API batch of {} URLs exhausted retries, yielding no matches", batch.len());
                HashSet::new()
            }
        }
    }

    async fn submit_batch_once(&self, batch: &[String]) -> Result<HashSet<String>, VendorClientError> {
        let payload = threat_matches_payload(batch);
        let response = self
            .http
            .post(&self.endpoints.threat_matches)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VendorClientError::UnexpectedStatus {
                status: response.status().as_u16(),
                endpoint: self.endpoints.threat_matches.clone(),
            });
        }

        let parsed: ThreatMatchesResponse = response.json().await.unwrap_or_default();
        Ok(parsed.matches.into_iter().map(|m| strip_scheme(&m.threat.url)).collect())
    }
}
