// [apps/orchestrator/src/lib.rs]
/*!
 * =================================================================
 * APARATO: ORCHESTRATOR (C7)
 * CLASIFICACION: APPLICATION LAYER (ESTRATO L6)
 * RESPONSABILIDAD: CABLEAR FEEDS -> STORE -> PREFIX-JOIN -> LOOKUP -> STORE
 *                  EN SIETE FASES ESTRICTAMENTE ORDENADAS
 *
 * Las fases son barreras: la fase n+1 comienza solo cuando todos los
 * workers de la fase n terminan. Dentro de una fase el trabajo se
 * distribuye a un pool acotado por el paralelismo disponible.
 * =================================================================
 */

pub mod errors;

pub use errors::OrchestratorError;

use futures::StreamExt;
use hashfilter_domain_feeds::{Feed, FeedKind};
use hashfilter_domain_models::{PrefixRecord, RunConfig, Vendor};
use hashfilter_infra_db::{latest_flagged_urls, PrefixJoinEngine, PrefixStore, StoreKind, UrlStore};
use hashfilter_infra_vendor_client::{LookupApiClient, UpdateApiClient, VendorEndpoints};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{info, instrument, warn};

const PREFIX_STORE_NAME: &str = "malicious";

/// Endpoints explicitos para un vendor, usados en lugar de los endpoints
/// reales cuando estan presentes (inyeccion para pruebas de integracion
/// contra un servidor mock).
struct VendorEndpointOverride {
    update: VendorEndpoints,
    lookup: VendorEndpoints,
}

pub struct Orchestrator {
    config: RunConfig,
    feeds: Vec<Box<dyn Feed>>,
    endpoint_overrides: HashMap<Vendor, VendorEndpointOverride>,
}

impl Orchestrator {
    pub fn new(config: RunConfig, feeds: Vec<Box<dyn Feed>>) -> Result<Self, OrchestratorError> {
        config.validate()?;
        Ok(Self {
            config,
            feeds,
            endpoint_overrides: HashMap::new(),
        })
    }

    /// Variante que apunta los clientes de vendor a endpoints explicitos en
    /// vez de los endpoints reales de Safe Browsing -- usada para ejercer
    /// el pipeline completo contra un servidor HTTP mock en pruebas.
    pub fn with_vendor_endpoints(
        config: RunConfig,
        feeds: Vec<Box<dyn Feed>>,
        overrides: HashMap<Vendor, (VendorEndpoints, VendorEndpoints)>,
    ) -> Result<Self, OrchestratorError> {
        config.validate()?;
        let endpoint_overrides = overrides
            .into_iter()
            .map(|(vendor, (update, lookup))| (vendor, VendorEndpointOverride { update, lookup }))
            .collect();
        Ok(Self {
            config,
            feeds,
            endpoint_overrides,
        })
    }

    fn update_client(&self, vendor: Vendor, api_key: &str) -> UpdateApiClient {
        match self.endpoint_overrides.get(&vendor) {
            Some(over) => UpdateApiClient::with_endpoints(vendor, over.update.clone()),
            None => UpdateApiClient::new(vendor, api_key),
        }
    }

    fn lookup_client(&self, vendor: Vendor, api_key: &str) -> LookupApiClient {
        match self.endpoint_overrides.get(&vendor) {
            Some(over) => LookupApiClient::with_endpoints(vendor, over.lookup.clone()),
            None => LookupApiClient::new(vendor, api_key),
        }
    }

    /// Ejecuta las siete fases y devuelve las URLs confirmadas maliciosas en
    /// la corrida mas reciente, segun `latest_flagged_urls` (Export, §4.7.7).
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<HashSet<String>, OrchestratorError> {
        let worker_permits = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        let started = Instant::now();

        // --- Fase 1: Init ---
        let mut url_stores: HashMap<String, UrlStore> = HashMap::new();
        for feed in self.active_feeds() {
            let kind = match feed.kind() {
                FeedKind::SyntheticIpv4 => StoreKind::Ipv4,
                _ => StoreKind::Feed,
            };
            let store = UrlStore::open(&self.config.databases_dir, feed.store_name(), kind).await?;
            url_stores.insert(feed.store_name().to_string(), store);
        }
        let prefix_store = PrefixStore::open(&self.config.databases_dir, PREFIX_STORE_NAME).await?;
        info!("init complete: {} stores opened", url_stores.len());

        // --- Fase 2: Ingest ---
        let ingest_tasks = self
            .active_feeds()
            .filter_map(|feed| url_stores.get(feed.store_name()).map(|store| self.ingest_feed(feed.as_ref(), store)));
        futures::future::join_all(ingest_tasks).await;
        info!("ingest complete in {:?}", started.elapsed());

        // --- Fase 3: Prefix refresh ---
        // Independiente de `config.fetch`, que solo gobierna la obtencion HTTP
        // de los feeds que la soportan (§6 EXTERNAL INTERFACES) -- el refresco
        // de prefijos via Update API corre siempre que haya vendors activos.
        let refresh_tasks = self.config.vendors.iter().map(|vendor| self.refresh_vendor(*vendor, &prefix_store));
        futures::future::join_all(refresh_tasks).await;

        // --- Fase 4: Pre-filter ---
        let mut suspects_by_vendor: HashMap<Vendor, HashSet<String>> = HashMap::new();
        for vendor in &self.config.vendors {
            let mut union = HashSet::new();
            for (store_name, store) in &url_stores {
                match PrefixJoinEngine::suspects(store, &prefix_store, *vendor).await {
                    Ok(found) => union.extend(found),
                    Err(error) => warn!("pre-filter join failed for store [{store_name}] vendor {vendor}: {error}"),
                }
            }
            info!("pre-filter: {} suspects for vendor {}", union.len(), vendor);
            suspects_by_vendor.insert(*vendor, union);
        }

        // --- Fase 5: Confirm ---
        let mut confirmed_by_vendor: HashMap<Vendor, HashSet<String>> = HashMap::new();
        for vendor in &self.config.vendors {
            let suspects = suspects_by_vendor.remove(vendor).unwrap_or_default();
            let api_key = self.config.api_key(*vendor)?.to_string();
            let client = self.lookup_client(*vendor, &api_key);
            let confirmed = client.confirm(&suspects, worker_permits).await;
            info!("confirm: {} urls confirmed malicious by vendor {}", confirmed.len(), vendor);
            confirmed_by_vendor.insert(*vendor, confirmed);
        }

        // --- Fase 6: Persist ---
        for (store_name, store) in &url_stores {
            for (vendor, confirmed) in &confirmed_by_vendor {
                if let Err(error) = store.mark_flagged(*vendor, confirmed, self.config.update_time).await {
                    warn!("failed to persist confirmations for store [{store_name}] vendor {vendor}: {error}");
                }
            }
        }

        // --- Fase 7: Export ---
        let selected: Vec<&UrlStore> = url_stores.values().collect();
        let exported = match latest_flagged_urls(&selected).await {
            Ok(urls) => urls,
            Err(error) => {
                warn!("export phase failed: {error}");
                HashSet::new()
            }
        };

        info!("run complete in {:?}, {} urls exported", started.elapsed(), exported.len());
        Ok(exported)
    }

    fn active_feeds(&self) -> impl Iterator<Item = &Box<dyn Feed>> {
        self.feeds.iter().filter(move |feed| self.config.sources.contains(feed.store_name()))
    }

    async fn ingest_feed(&self, feed: &dyn Feed, store: &UrlStore) {
        if feed.kind() == FeedKind::SyntheticIpv4 {
            if let Err(error) = store.bulk_insert_ips().await {
                warn!("ipv4 regeneration failed: {error}");
            }
            return;
        }

        let mut batches = feed.stream();
        while let Some(batch) = batches.next().await {
            match batch {
                Ok(urls) => {
                    let urls: Vec<String> = urls.into_iter().collect();
                    if let Err(error) = store.upsert_batch(self.config.update_time, &urls).await {
                        warn!("upsert batch failed for feed [{}]: {error}", feed.store_name());
                    }
                }
                Err(error) => warn!("feed [{}] batch read failed: {error}", feed.store_name()),
            }
        }
    }

    async fn refresh_vendor(&self, vendor: Vendor, prefix_store: &PrefixStore) {
        let api_key = match self.config.api_key(vendor) {
            Ok(key) => key.to_string(),
            Err(error) => {
                warn!("skipping prefix refresh for vendor {vendor}: {error}");
                return;
            }
        };
        let client = self.update_client(vendor, &api_key);
        let prefixes: Vec<PrefixRecord> = client.fetch().await.into_iter().collect();
        info!("prefix refresh: {} prefixes fetched for vendor {}", prefixes.len(), vendor);
        if let Err(error) = prefix_store.replace_vendor(vendor, &prefixes).await {
            warn!("failed to replace prefixes for vendor {vendor}: {error}");
        }
    }
}
