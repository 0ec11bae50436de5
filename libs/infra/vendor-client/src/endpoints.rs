// [libs/infra/vendor-client/src/endpoints.rs]
//! Tabla de endpoints y limites por vendor (§4.5-4.6 EXTERNAL INTERFACES).

use hashfilter_domain_models::Vendor;

#[derive(Clone)]
pub struct VendorEndpoints {
    pub threat_lists: String,
    pub threat_list_updates: String,
    pub threat_matches: String,
    pub max_lookup_batch_size: usize,
}

impl VendorEndpoints {
    pub fn for_vendor(vendor: Vendor, api_key: &str) -> Self {
        let (base, max_lookup_batch_size) = match vendor {
            Vendor::Google => ("https://safebrowsing.googleapis.com/v4", 500),
            Vendor::Yandex => ("https://sba.yandex.net/v4", 200),
        };
        Self {
            threat_lists: format!("{base}/threatLists?key={api_key}"),
            threat_list_updates: format!("{base}/threatListUpdates:fetch?key={api_key}"),
            threat_matches: format!("{base}/threatMatches:find?key={api_key}"),
            max_lookup_batch_size,
        }
    }
}
