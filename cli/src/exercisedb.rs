use anyhow::{Context, Result};
use tracing::{debug, warn};

use recomp_core::exercisedb::{BASE_URL, ExerciseData, HOST, to_records};
use recomp_core::models::{ExerciseRecord, ExerciseSearchMode};
use recomp_core::service::ExerciseLookupProvider;

use crate::usda::{build_http_client, build_runtime};

/// `ExerciseDB` client via `RapidAPI`. Without a key every search is empty.
pub struct ExerciseDbClient {
    client: reqwest::Client,
    rt: tokio::runtime::Runtime,
    api_key: Option<String>,
}

impl ExerciseDbClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            rt: build_runtime()?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub async fn search_async(
        &self,
        api_key: &str,
        query: &str,
        mode: ExerciseSearchMode,
    ) -> Result<Vec<ExerciseRecord>> {
        let query = query.to_lowercase();
        let mut url = reqwest::Url::parse(BASE_URL).context("Invalid ExerciseDB URL")?;
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("Invalid ExerciseDB URL"))?
            .pop_if_empty()
            .extend(["exercises", mode.path_segment(), query.as_str()]);

        let resp = self
            .client
            .get(url)
            .header("X-RapidAPI-Key", api_key)
            .header("X-RapidAPI-Host", HOST)
            .send()
            .await
            .context("Failed to reach ExerciseDB")?
            .error_for_status()
            .context("ExerciseDB returned an error")?;

        let data: Vec<ExerciseData> = resp
            .json()
            .await
            .context("Failed to parse ExerciseDB response")?;

        let records = to_records(data);
        debug!(query = %query, ?mode, results = records.len(), "exercisedb search");
        Ok(records)
    }
}

impl ExerciseLookupProvider for ExerciseDbClient {
    fn search_exercises(&self, query: &str, mode: ExerciseSearchMode) -> Vec<ExerciseRecord> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("RAPIDAPI_KEY is not set; exercise search is unavailable");
            return Vec::new();
        };
        match self.rt.block_on(self.search_async(api_key, query, mode)) {
            Ok(records) => records,
            Err(e) => {
                warn!(query, error = %format!("{e:#}"), "exercise search failed");
                Vec::new()
            }
        }
    }
}
