use anyhow::{Context, Result};
use tracing::{debug, warn};

use recomp_core::models::FoodRecord;
use recomp_core::service::FoodLookupProvider;
use recomp_core::usda::{FoodDetails, SearchResponse, details_to_record, search_to_records};

const BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";

/// USDA `FoodData` Central client.
///
/// Owns a single-threaded runtime so it can serve the synchronous
/// [`FoodLookupProvider`] interface.
pub struct UsdaClient {
    client: reqwest::Client,
    rt: tokio::runtime::Runtime,
    api_key: String,
    page_size: u32,
}

pub(crate) fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!(
            "recomp-cli/{} (body-recomposition tracker)",
            env!("CARGO_PKG_VERSION")
        ))
        .timeout(std::time::Duration::from_secs(10))
        .connect_timeout(std::time::Duration::from_secs(5))
        .build()
        .context("Failed to build HTTP client")
}

/// `{BASE_URL}/food/{fdc_id}` with the id percent-encoded as one path segment.
fn details_url(fdc_id: &str) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(BASE_URL).context("Invalid USDA URL")?;
    url.path_segments_mut()
        .map_err(|()| anyhow::anyhow!("Invalid USDA URL"))?
        .pop_if_empty()
        .extend(["food", fdc_id.trim()]);
    Ok(url)
}

pub(crate) fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

impl UsdaClient {
    pub fn new(api_key: &str, page_size: u32) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            rt: build_runtime()?,
            api_key: api_key.to_string(),
            page_size,
        })
    }

    pub async fn search_async(&self, query: &str) -> Result<Vec<FoodRecord>> {
        let page_size = self.page_size.to_string();
        let resp = self
            .client
            .get(format!("{BASE_URL}/foods/search"))
            .query(&[
                ("query", query),
                ("pageSize", page_size.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach USDA FoodData Central")?
            .error_for_status()
            .context("USDA FoodData Central returned an error")?;

        let data: SearchResponse = resp
            .json()
            .await
            .context("Failed to parse USDA search response")?;

        let records = search_to_records(data);
        debug!(query, results = records.len(), "usda search");
        Ok(records)
    }

    pub async fn details_async(&self, fdc_id: &str) -> Result<FoodRecord> {
        let resp = self
            .client
            .get(details_url(fdc_id)?)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .context("Failed to reach USDA FoodData Central")?
            .error_for_status()
            .context("USDA FoodData Central returned an error")?;

        let data: FoodDetails = resp
            .json()
            .await
            .context("Failed to parse USDA food details")?;
        Ok(details_to_record(data))
    }
}

impl FoodLookupProvider for UsdaClient {
    fn search_foods(&self, query: &str) -> Vec<FoodRecord> {
        match self.rt.block_on(self.search_async(query)) {
            Ok(records) => records,
            Err(e) => {
                warn!(query, error = %format!("{e:#}"), "food search failed");
                Vec::new()
            }
        }
    }

    fn food_details(&self, source_id: &str) -> Option<FoodRecord> {
        match self.rt.block_on(self.details_async(source_id)) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(source_id, error = %format!("{e:#}"), "food details lookup failed");
                None
            }
        }
    }
}
