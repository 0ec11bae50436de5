// [apps/orchestrator/tests/end_to_end.rs]
//! Pruebas de extremo a extremo del pipeline de siete fases, contra un
//! servidor HTTP mock en lugar de los Safe Browsing reales.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hashfilter_core_hash::canonical_url_hash;
use hashfilter_domain_feeds::{Feed, LocalFileFeed};
use hashfilter_domain_models::{PrefixRecord, RunConfig, Vendor};
use hashfilter_infra_db::PrefixStore;
use hashfilter_infra_vendor_client::VendorEndpoints;
use hashfilter_orchestrator::Orchestrator;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_endpoints(mock: &MockServer) -> VendorEndpoints {
    VendorEndpoints {
        threat_lists: format!("{}/threatLists", mock.uri()),
        threat_list_updates: format!("{}/threatListUpdates:fetch", mock.uri()),
        threat_matches: format!("{}/threatMatches:find", mock.uri()),
        max_lookup_batch_size: 500,
    }
}

fn base_config(databases_dir: &Path, sources: &[&str], vendors: &[Vendor]) -> RunConfig {
    config_with_fetch(databases_dir, sources, vendors, false)
}

fn config_with_fetch(databases_dir: &Path, sources: &[&str], vendors: &[Vendor], fetch: bool) -> RunConfig {
    let api_keys = vendors.iter().map(|v| (*v, "test-key".to_string())).collect();
    RunConfig {
        sources: sources.iter().map(|s| s.to_string()).collect(),
        fetch,
        vendors: vendors.iter().copied().collect(),
        update_time: 1_000,
        databases_dir: databases_dir.to_path_buf(),
        api_keys,
    }
}

fn no_match_threat_matches_mock() -> (String, ResponseTemplate) {
    (
        "/threatMatches:find".to_string(),
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"matches": []})),
    )
}

#[tokio::test]
async fn empty_feed_yields_no_rows_no_suspects_no_confirmations() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threatMatches:find"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"matches": []})))
        .mount(&mock)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let local_file = tempfile::NamedTempFile::new().unwrap();

    let feeds: Vec<Box<dyn Feed>> = vec![Box::new(LocalFileFeed::new("local", local_file.path()))];
    let config = base_config(dir.path(), &["local"], &[Vendor::Google]);
    let overrides = HashMap::from([(Vendor::Google, (mock_endpoints(&mock), mock_endpoints(&mock)))]);

    let orchestrator = Orchestrator::with_vendor_endpoints(config, feeds, overrides).unwrap();
    let exported = orchestrator.run().await.unwrap();

    assert!(exported.is_empty());
    assert_eq!(mock.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn single_known_bad_url_is_confirmed_by_one_vendor_only() {
    let google_mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threatMatches:find"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "matches": [{"threat": {"url": "http://malware.test"}}]
        })))
        .mount(&google_mock)
        .await;

    let yandex_mock = MockServer::start().await;
    let (route, template) = no_match_threat_matches_mock();
    Mock::given(method("POST")).and(path(route)).respond_with(template).mount(&yandex_mock).await;

    let dir = tempfile::tempdir().unwrap();
    let mut local_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(local_file, "malware.test").unwrap();
    writeln!(local_file, "safe.test").unwrap();

    let feeds: Vec<Box<dyn Feed>> = vec![Box::new(LocalFileFeed::new("local", local_file.path()))];
    let config = base_config(dir.path(), &["local"], &[Vendor::Google, Vendor::Yandex]);

    // Pre-populate the shared prefix store so the pre-filter surfaces both hosts as
    // suspects via the Google 4-byte entry -- the Update API is never invoked
    // here (fetch=false), so prefixes come solely from this seed.
    let prefix_store = PrefixStore::open(dir.path(), "malicious").await.unwrap();
    let bad_hash = canonical_url_hash("malware.test");
    let safe_hash = canonical_url_hash("safe.test");
    prefix_store
        .replace_vendor(
            Vendor::Google,
            &[
                PrefixRecord::new(bad_hash[..4].to_vec(), Vendor::Google),
                PrefixRecord::new(safe_hash[..4].to_vec(), Vendor::Google),
            ],
        )
        .await
        .unwrap();
    prefix_store
        .replace_vendor(
            Vendor::Yandex,
            &[
                PrefixRecord::new(bad_hash[..4].to_vec(), Vendor::Yandex),
                PrefixRecord::new(safe_hash[..4].to_vec(), Vendor::Yandex),
            ],
        )
        .await
        .unwrap();

    let overrides = HashMap::from([
        (Vendor::Google, (mock_endpoints(&google_mock), mock_endpoints(&google_mock))),
        (Vendor::Yandex, (mock_endpoints(&yandex_mock), mock_endpoints(&yandex_mock))),
    ]);

    let orchestrator = Orchestrator::with_vendor_endpoints(config, feeds, overrides).unwrap();
    let exported = orchestrator.run().await.unwrap();

    assert_eq!(exported, HashSet::from(["malware.test".to_string()]));
}

#[tokio::test]
async fn suspect_matched_only_via_longer_prefix_appears_exactly_once() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threatMatches:find"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "matches": [{"threat": {"url": "http://malware.test"}}]
        })))
        .mount(&mock)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut local_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(local_file, "malware.test").unwrap();

    let feeds: Vec<Box<dyn Feed>> = vec![Box::new(LocalFileFeed::new("local", local_file.path()))];
    let config = base_config(dir.path(), &["local"], &[Vendor::Google]);

    let prefix_store = PrefixStore::open(dir.path(), "malicious").await.unwrap();
    let hash = canonical_url_hash("malware.test");
    // A mismatched 4-byte prefix plus a genuine 8-byte prefix: only the
    // longer one should surface the suspect, and only once.
    prefix_store
        .replace_vendor(
            Vendor::Google,
            &[
                PrefixRecord::new(vec![0x00, 0x00, 0x00, 0x00], Vendor::Google),
                PrefixRecord::new(hash[..8].to_vec(), Vendor::Google),
            ],
        )
        .await
        .unwrap();

    let overrides = HashMap::from([(Vendor::Google, (mock_endpoints(&mock), mock_endpoints(&mock)))]);
    let orchestrator = Orchestrator::with_vendor_endpoints(config, feeds, overrides).unwrap();
    let exported = orchestrator.run().await.unwrap();

    assert_eq!(exported, HashSet::from(["malware.test".to_string()]));
    // Exactly one threatMatches submission, confirming select_suspects did not
    // duplicate the url across the two prefix sizes.
    assert_eq!(mock.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn lookup_confirmations_split_into_capped_batches() {
    let mock = MockServer::start().await;
    let (route, template) = no_match_threat_matches_mock();
    Mock::given(method("POST")).and(path(route)).respond_with(template).mount(&mock).await;

    let dir = tempfile::tempdir().unwrap();
    let mut local_file = tempfile::NamedTempFile::new().unwrap();
    let hosts: Vec<String> = (0..1200).map(|i| format!("host-{i}.test")).collect();
    for host in &hosts {
        writeln!(local_file, "{host}").unwrap();
    }

    let feeds: Vec<Box<dyn Feed>> = vec![Box::new(LocalFileFeed::new("local", local_file.path()))];
    let config = base_config(dir.path(), &["local"], &[Vendor::Google]);

    let prefix_store = PrefixStore::open(dir.path(), "malicious").await.unwrap();
    let records: Vec<PrefixRecord> = hosts
        .iter()
        .map(|host| PrefixRecord::new(canonical_url_hash(host)[..4].to_vec(), Vendor::Google))
        .collect();
    prefix_store.replace_vendor(Vendor::Google, &records).await.unwrap();

    let overrides = HashMap::from([(Vendor::Google, (mock_endpoints(&mock), mock_endpoints(&mock)))]);
    let orchestrator = Orchestrator::with_vendor_endpoints(config, feeds, overrides).unwrap();
    let exported = orchestrator.run().await.unwrap();

    assert!(exported.is_empty());
    // 1200 suspects / 500-per-batch cap for Google = 3 POSTs.
    assert_eq!(mock.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn persistent_transport_failure_completes_run_with_no_flags() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threatMatches:find"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut local_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(local_file, "malware.test").unwrap();

    let feeds: Vec<Box<dyn Feed>> = vec![Box::new(LocalFileFeed::new("local", local_file.path()))];
    let config = base_config(dir.path(), &["local"], &[Vendor::Google]);

    let prefix_store = PrefixStore::open(dir.path(), "malicious").await.unwrap();
    let hash = canonical_url_hash("malware.test");
    prefix_store
        .replace_vendor(Vendor::Google, &[PrefixRecord::new(hash[..4].to_vec(), Vendor::Google)])
        .await
        .unwrap();

    let overrides = HashMap::from([(Vendor::Google, (mock_endpoints(&mock), mock_endpoints(&mock)))]);
    let orchestrator = Orchestrator::with_vendor_endpoints(config, feeds, overrides).unwrap();
    let exported = orchestrator.run().await.unwrap();

    assert!(exported.is_empty());
}

#[tokio::test]
async fn update_api_refresh_populates_prefix_store_and_drives_confirmation() {
    let mock = MockServer::start().await;

    let bad_hash = canonical_url_hash("malware.test");
    let raw = STANDARD.encode(&bad_hash[..4]);
    Mock::given(method("POST"))
        .and(path("/threatListUpdates:fetch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "listUpdateResponses": [{
                "additions": [{"rawHashes": {"prefixSize": 4, "rawHashes": raw}}]
            }]
        })))
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/threatMatches:find"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "matches": [{"threat": {"url": "http://malware.test"}}]
        })))
        .mount(&mock)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut local_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(local_file, "malware.test").unwrap();
    writeln!(local_file, "safe.test").unwrap();

    let feeds: Vec<Box<dyn Feed>> = vec![Box::new(LocalFileFeed::new("local", local_file.path()))];
    // fetch=false here would previously (wrongly) skip prefix refresh too --
    // this sets it true to also cover the flag's intended, narrower scope.
    let config = config_with_fetch(dir.path(), &["local"], &[Vendor::Yandex], true);

    let overrides = HashMap::from([(Vendor::Yandex, (mock_endpoints(&mock), mock_endpoints(&mock)))]);
    let orchestrator = Orchestrator::with_vendor_endpoints(config, feeds, overrides).unwrap();
    let exported = orchestrator.run().await.unwrap();

    assert_eq!(exported, HashSet::from(["malware.test".to_string()]));

    let requests = mock.received_requests().await.unwrap();
    assert!(requests.iter().any(|r| r.url.path() == "/threatListUpdates:fetch"));
    assert!(requests.iter().any(|r| r.url.path() == "/threatMatches:find"));
}

#[tokio::test]
async fn prefix_refresh_runs_even_when_fetch_flag_is_false() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threatListUpdates:fetch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "listUpdateResponses": [{"additions": []}]
        })))
        .mount(&mock)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let local_file = tempfile::NamedTempFile::new().unwrap();

    let feeds: Vec<Box<dyn Feed>> = vec![Box::new(LocalFileFeed::new("local", local_file.path()))];
    // fetch=false must still drive the Update-API refresh (phase 3 is
    // unconditional on vendors being active); only feed-level HTTP fetch is
    // gated by this flag.
    let config = config_with_fetch(dir.path(), &["local"], &[Vendor::Yandex], false);

    let overrides = HashMap::from([(Vendor::Yandex, (mock_endpoints(&mock), mock_endpoints(&mock)))]);
    let orchestrator = Orchestrator::with_vendor_endpoints(config, feeds, overrides).unwrap();
    orchestrator.run().await.unwrap();

    let requests = mock.received_requests().await.unwrap();
    assert!(requests.iter().any(|r| r.url.path() == "/threatListUpdates:fetch"));
}

// IPv4 census regeneration to the full 2^32 address space (Property T6) is
// exercised at the unit level in `hashfilter_infra_db::url_store` via the
// internal `bulk_insert_ips_up_to` seam, not here: the orchestrator's ingest
// phase special-cases `FeedKind::SyntheticIpv4` to call `UrlStore::bulk_insert_ips`,
// which always targets the real 2^32 space regardless of any bounded feed
// passed in, so there is no way to exercise that codepath end-to-end without
// actually enumerating four billion rows.
