use crate::error::Result;
use crate::types::*;
use async_trait::async_trait;

/// Core trait that all data sources must implement
pub trait DataSource: Send + Sync {
    /// Get the type name of this data source
    fn source_type(&self) -> &'static str;

    /// Get all capabilities supported by this source
    fn capabilities(&self) -> Vec<Capability>;

    /// Check if a specific capability is supported
    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Sources that run a batch of raw queries against one time range
#[async_trait]
pub trait BatchQueryable: DataSource {
    /// Run every query in `queries` against `time_range`.
    ///
    /// Responses come back in input order, one per query. Remote failures are
    /// reported per query inside the response; configuration, validation and
    /// transport failures abort the whole batch.
    async fn query_data(
        &self,
        queries: &[DataQuery],
        time_range: &TimeRange,
    ) -> Result<Vec<DataResponse>>;
}
