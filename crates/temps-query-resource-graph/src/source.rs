use crate::cloud::{resolve_cloud, CloudEndpoints, AZURE_PUBLIC};
use crate::query::{build_queries, parse_queries, InterpolatedQuery};
use crate::request::{create_request, request_body, resources_url, DEFAULT_API_VERSION};
use crate::response::{add_config_links, portal_deep_link, table_to_result, unmarshal_response};
use crate::transport::Transport;
use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use temps_query::{
    BatchQueryable, Capability, DataError, DataQuery, DataResponse, DataSource, NormalizedResult,
    Result, TimeRange,
};
use tracing::{debug, warn};

fn default_cloud() -> String {
    AZURE_PUBLIC.to_string()
}

fn default_user_agent() -> String {
    format!("Temps/{}", env!("CARGO_PKG_VERSION"))
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

/// Datasource settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGraphSettings {
    /// Cloud identifier, e.g. `AzureCloud`
    #[serde(default = "default_cloud")]
    pub cloud: String,
    /// Overrides the cloud's API base URL
    #[serde(default)]
    pub base_url: Option<String>,
    /// Subscriptions for queries that do not name their own
    #[serde(default)]
    pub subscriptions: Vec<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for ResourceGraphSettings {
    fn default() -> Self {
        Self {
            cloud: default_cloud(),
            base_url: None,
            subscriptions: Vec::new(),
            user_agent: default_user_agent(),
            api_version: default_api_version(),
        }
    }
}

/// Azure Resource Graph data source
pub struct ResourceGraphSource {
    settings: ResourceGraphSettings,
    endpoints: &'static CloudEndpoints,
    resources_url: String,
    transport: Arc<dyn Transport>,
}

impl ResourceGraphSource {
    /// Create a source for `settings`. Fails on an unsupported cloud.
    pub fn new(settings: ResourceGraphSettings, transport: Arc<dyn Transport>) -> Result<Self> {
        let endpoints = resolve_cloud(&settings.cloud)?;

        if settings.user_agent.trim().is_empty() {
            return Err(DataError::invalid_configuration("user agent must not be empty"));
        }

        let api_base = settings.base_url.as_deref().unwrap_or(endpoints.api_url);
        let resources_url = resources_url(api_base, &settings.api_version);

        debug!(
            "Resource Graph source for cloud {} at {}",
            endpoints.cloud, resources_url
        );

        Ok(Self {
            settings,
            endpoints,
            resources_url,
            transport,
        })
    }

    pub fn settings(&self) -> &ResourceGraphSettings {
        &self.settings
    }

    pub fn endpoints(&self) -> &'static CloudEndpoints {
        self.endpoints
    }

    /// Parse and interpolate a batch without sending anything
    pub fn build_queries(
        &self,
        queries: &[DataQuery],
        time_range: &TimeRange,
    ) -> Result<Vec<InterpolatedQuery>> {
        let raw = parse_queries(queries)?;
        build_queries(&raw, time_range, Some(&self.resources_url))
    }

    /// Request body `query` is sent with
    pub fn request_body(&self, query: &InterpolatedQuery) -> Result<Vec<u8>> {
        request_body(query, &self.settings.subscriptions)
    }

    async fn execute_query(&self, query: &InterpolatedQuery) -> Result<NormalizedResult> {
        let url = query.url.as_deref().unwrap_or(&self.resources_url);
        let body = self.request_body(query)?;
        let request = create_request(url, body, &self.settings.user_agent)?;

        let started = Instant::now();
        let response = self.transport.send(request).await?;
        let execution_ms = started.elapsed().as_millis() as u64;

        let decoded = match unmarshal_response(response.status, &response.body) {
            Ok(decoded) => decoded,
            Err(DataError::Remote { status, message }) => {
                warn!("Resource Graph query {} failed with {}", query.ref_id, status);
                return Ok(NormalizedResult::Error { status, message });
            }
            Err(e) => return Err(e),
        };

        let link = portal_deep_link(self.endpoints.portal_url, &query.interpolated_query);
        let result = table_to_result(&query.ref_id, decoded.data, execution_ms)?
            .with_executed_query(query.interpolated_query.clone())
            .with_result_format(query.result_format);

        debug!(
            "Resource Graph query {} returned {} rows in {}ms",
            query.ref_id, result.stats.row_count, execution_ms
        );

        Ok(NormalizedResult::Data(add_config_links(result, &link)))
    }
}

impl DataSource for ResourceGraphSource {
    fn source_type(&self) -> &'static str {
        "azure-resource-graph"
    }

    fn capabilities(&self) -> Vec<Capability> {
        vec![Capability::Table, Capability::Macros, Capability::DeepLinks]
    }
}

#[async_trait]
impl BatchQueryable for ResourceGraphSource {
    async fn query_data(
        &self,
        queries: &[DataQuery],
        time_range: &TimeRange,
    ) -> Result<Vec<DataResponse>> {
        let built = self.build_queries(queries, time_range)?;

        let results = try_join_all(built.iter().map(|query| self.execute_query(query))).await?;

        Ok(built
            .into_iter()
            .zip(results)
            .map(|(query, result)| DataResponse {
                ref_id: query.ref_id,
                result,
            })
            .collect())
    }
}
