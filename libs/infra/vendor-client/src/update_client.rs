// [libs/infra/vendor-client/src/update_client.rs]
/*!
 * =================================================================
 * APARATO: UPDATE-API CLIENT (C5)
 * CLASIFICACION: INFRASTRUCTURE ADAPTER (ESTRATO L4)
 * RESPONSABILIDAD: HABLAR EL PROTOCOLO threatListUpdates Y DEVOLVER LA
 *                  UNION DE PREFIJOS RECIEN LISTADOS
 *
 * Estados: Idle -> ListingThreatLists -> FetchingUpdates -> Parsing ->
 * Done | Failed. Cualquier fallo se degrada a conjunto vacio: el
 * Orchestrator nunca ve un error de esta API, solo "cero prefijos nuevos".
 * =================================================================
 */

use crate::endpoints::VendorEndpoints;
use crate::errors::VendorClientError;
use crate::retry::with_backoff;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hashfilter_domain_models::{PrefixRecord, Vendor};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, instrument, warn};

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

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreatListsResponse {
    #[serde(default)]
    threat_lists: Vec<ThreatListEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreatListEntry {
    threat_type: String,
    platform_type: String,
    threat_entry_type: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Combination {
    threat_type: String,
    platform_type: String,
    threat_entry_type: String,
    state: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListUpdateRequestBody {
    client: ClientIdentity,
    list_update_requests: Vec<Combination>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListUpdateResponsesEnvelope {
    list_update_responses: Option<Vec<ListUpdateResponse>>,
    minimum_wait_duration: Option<String>,
}

#[derive(Deserialize)]
struct ListUpdateResponse {
    #[serde(default)]
    additions: Vec<Addition>,
}

#[derive(Deserialize)]
struct Addition {
    #[serde(rename = "rawHashes")]
    raw_hashes: RawHashes,
}

#[derive(Deserialize)]
struct RawHashes {
    #[serde(rename = "prefixSize")]
    prefix_size: u32,
    #[serde(rename = "rawHashes")]
    raw_hashes_b64: String,
}

fn yandex_fixed_combinations() -> Vec<Combination> {
    vec![
        Combination {
            threat_type: "ANY".to_string(),
            platform_type: "ANY_PLATFORM".to_string(),
            threat_entry_type: "URL".to_string(),
            state: String::new(),
        },
        Combination {
            threat_type: "UNWANTED_SOFTWARE".to_string(),
            platform_type: "PLATFORM_TYPE_UNSPECIFIED".to_string(),
            threat_entry_type: "URL".to_string(),
            state: String::new(),
        },
        Combination {
            threat_type: "MALWARE".to_string(),
            platform_type: "PLATFORM_TYPE_UNSPECIFIED".to_string(),
            threat_entry_type: "URL".to_string(),
            state: String::new(),
        },
        Combination {
            threat_type: "SOCIAL_ENGINEERING".to_string(),
            platform_type: "PLATFORM_TYPE_UNSPECIFIED".to_string(),
            threat_entry_type: "URL".to_string(),
            state: String::new(),
        },
    ]
}

fn decode_raw_hashes(raw: &RawHashes) -> Result<Vec<Vec<u8>>, VendorClientError> {
    let prefix_size = raw.prefix_size as usize;
    if prefix_size == 0 {
        return Err(VendorClientError::Decode("prefixSize is zero".to_string()));
    }
    let bytes = STANDARD
        .decode(&raw.raw_hashes_b64)
        .map_err(|e| VendorClientError::Decode(e.to_string()))?;
    if bytes.len() % prefix_size != 0 {
        return Err(VendorClientError::Decode(format!(
            "rawHashes length {} not divisible by prefixSize {}",
            bytes.len(),
            prefix_size
        )));
    }
    let mut chunks: Vec<Vec<u8>> = bytes.chunks(prefix_size).map(|c| c.to_vec()).collect();
    chunks.sort();
    Ok(chunks)
}

pub struct UpdateApiClient {
    http: Client,
    vendor: Vendor,
    endpoints: VendorEndpoints,
}

impl UpdateApiClient {
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
        Self { http, vendor, endpoints }
    }

    /// Devuelve la union de prefijos recien listados, o el conjunto vacio
    /// si cualquier etapa del protocolo falla tras agotar reintentos.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> HashSet<PrefixRecord> {
        match with_backoff("update_api.fetch", || self.fetch_once()).await {
            Some(prefixes) => prefixes,
            None => {
                warn!("update API fetch exhausted retries for vendor {}, yielding empty prefix set", self.vendor);
                HashSet::new()
            }
        }
    }

    async fn fetch_once(&self) -> Result<HashSet<PrefixRecord>, VendorClientError> {
        let combinations = self.list_combinations().await?;

        let body = ListUpdateRequestBody {
            client: client_identity(),
            list_update_requests: combinations,
        };

        let response = self
            .http
            .post(&self.endpoints.threat_list_updates)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VendorClientError::UnexpectedStatus {
                status: response.status().as_u16(),
                endpoint: self.endpoints.threat_list_updates.clone(),
            });
        }

        let envelope: ListUpdateResponsesEnvelope = response.json().await?;
        let list_update_responses = envelope
            .list_update_responses
            .ok_or_else(|| VendorClientError::Protocol("missing listUpdateResponses".to_string()))?;

        if let Some(wait) = envelope.minimum_wait_duration {
            info!("vendor {} requested minimumWaitDuration={}", self.vendor, wait);
        }

        let mut prefixes = HashSet::new();
        for list_update in list_update_responses {
            for addition in list_update.additions {
                match decode_raw_hashes(&addition.raw_hashes) {
                    Ok(chunks) => prefixes.extend(chunks.into_iter().map(|chunk| PrefixRecord::new(chunk, self.vendor))),
                    Err(error) => warn!("skipping malformed addition for vendor {}: {}", self.vendor, error),
                }
            }
        }
        Ok(prefixes)
    }

    async fn list_combinations(&self) -> Result<Vec<Combination>, VendorClientError> {
        match self.vendor {
            Vendor::Yandex => Ok(yandex_fixed_combinations()),
            Vendor::Google => {
                let response = self.http.get(&self.endpoints.threat_lists).send().await?;
                if !response.status().is_success() {
                    return Err(VendorClientError::UnexpectedStatus {
                        status: response.status().as_u16(),
                        endpoint: self.endpoints.threat_lists.clone(),
                    });
                }
                let parsed: ThreatListsResponse = response.json().await?;
                Ok(parsed
                    .threat_lists
                    .into_iter()
                    .filter(|entry| matches!(entry.threat_entry_type.as_deref(), Some("URL") | Some("IP_RANGE")))
                    .map(|entry| Combination {
                        threat_type: entry.threat_type,
                        platform_type: entry.platform_type,
                        threat_entry_type: entry.threat_entry_type.unwrap_or_default(),
                        state: String::new(),
                    })
                    .collect())
            }
        }
    }
}
