//! Query model parsing and batch building

use crate::macros::{interpolate, MacroContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use temps_query::{DataError, DataQuery, ResultFormat, Result, TimeRange};
use tracing::debug;

/// Query type the frontend tags Resource Graph queries with
pub const QUERY_TYPE: &str = "Azure Resource Graph";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryModel {
    #[serde(default)]
    query_type: Option<String>,
    #[serde(default)]
    subscriptions: Vec<String>,
    azure_resource_graph: Option<ResourceGraphTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceGraphTarget {
    query: Option<String>,
    #[serde(default)]
    result_format: Option<String>,
}

/// A query definition after parsing, before any substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuery {
    pub ref_id: String,
    pub result_format: ResultFormat,
    pub query: String,
    /// Subscriptions named by the query itself; empty means use the defaults
    pub subscriptions: Vec<String>,
    pub interval: Option<Duration>,
    pub variables: BTreeMap<String, String>,
    /// The JSON the query was parsed from, verbatim
    pub json: String,
}

impl RawQuery {
    pub fn parse(query: &DataQuery) -> Result<Self> {
        let model: QueryModel = serde_json::from_str(&query.json)
            .map_err(|e| DataError::invalid_query(&query.ref_id, format!("malformed JSON: {}", e)))?;

        if let Some(query_type) = model.query_type.as_deref() {
            if query_type != QUERY_TYPE {
                debug!(
                    "Query {} has query type '{}', treating it as Resource Graph",
                    query.ref_id, query_type
                );
            }
        }

        let target = model.azure_resource_graph.ok_or_else(|| {
            DataError::invalid_query(&query.ref_id, "missing azureResourceGraph")
        })?;

        let text = target
            .query
            .ok_or_else(|| DataError::invalid_query(&query.ref_id, "missing query text"))?;

        let hint = target.result_format.unwrap_or_default();
        let result_format = ResultFormat::parse(&hint).ok_or_else(|| {
            DataError::invalid_query(&query.ref_id, format!("unknown result format '{}'", hint))
        })?;

        Ok(Self {
            ref_id: query.ref_id.clone(),
            result_format,
            query: text,
            subscriptions: model.subscriptions,
            interval: query.interval,
            variables: query.variables.clone(),
            json: query.json.clone(),
        })
    }
}

/// A query ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolatedQuery {
    pub ref_id: String,
    pub result_format: ResultFormat,
    /// Where the query is sent, when already resolved
    pub url: Option<String>,
    pub subscriptions: Vec<String>,
    pub interpolated_query: String,
    #[serde(skip)]
    pub json: String,
}

/// Parse every query of a batch. The first invalid query fails the batch.
pub fn parse_queries(queries: &[DataQuery]) -> Result<Vec<RawQuery>> {
    queries.iter().map(RawQuery::parse).collect()
}

/// Interpolate every query against the shared time range, keeping input order
pub fn build_queries(
    queries: &[RawQuery],
    time_range: &TimeRange,
    url: Option<&str>,
) -> Result<Vec<InterpolatedQuery>> {
    let built = queries
        .iter()
        .map(|raw| {
            let ctx = MacroContext {
                time_range,
                interval: raw.interval,
                variables: &raw.variables,
            };
            let interpolated_query = interpolate(&raw.query, &ctx);
            debug!("Interpolated query {}: {}", raw.ref_id, interpolated_query);

            InterpolatedQuery {
                ref_id: raw.ref_id.clone(),
                result_format: raw.result_format,
                url: url.map(str::to_string),
                subscriptions: raw.subscriptions.clone(),
                interpolated_query,
                json: raw.json.clone(),
            }
        })
        .collect();

    Ok(built)
}
