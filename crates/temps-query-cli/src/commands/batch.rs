use anyhow::Context;
use chrono::{DateTime, FixedOffset};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use temps_query::{BatchQueryable, DataQuery, NormalizedResult, TimeRange};
use temps_query_resource_graph::{
    ReqwestTransport, ResourceGraphSettings, ResourceGraphSource, Transport,
};
use tracing::info;

/// Arguments shared by `build` and `run`
#[derive(Args)]
pub struct BatchArgs {
    /// JSON file holding an array of query models, each with a `refId`
    #[arg(long)]
    queries: PathBuf,

    /// Start of the time range (RFC 3339)
    #[arg(long)]
    from: DateTime<FixedOffset>,

    /// End of the time range (RFC 3339)
    #[arg(long)]
    to: DateTime<FixedOffset>,

    /// Template variable as NAME=VALUE, usable as ${NAME} in queries
    #[arg(long = "var", value_parser = parse_variable)]
    variables: Vec<(String, String)>,

    /// Azure cloud (AzureCloud, AzureChinaCloud, AzureUSGovernment, AzureGermanCloud)
    #[arg(long, env = "AZURE_CLOUD", default_value = "AzureCloud")]
    cloud: String,

    /// Override the cloud's management API URL
    #[arg(long, env = "AZURE_RESOURCE_GRAPH_URL")]
    base_url: Option<String>,

    /// Default subscriptions, comma separated
    #[arg(long = "subscription", env = "AZURE_SUBSCRIPTIONS", value_delimiter = ',')]
    subscriptions: Vec<String>,
}

fn parse_variable(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    if name.is_empty() {
        return Err(format!("variable name missing in '{}'", raw));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Read the batch file. Each entry keeps its own JSON as the query model.
fn load_queries(path: &Path, variables: &[(String, String)]) -> anyhow::Result<Vec<DataQuery>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let entries: Vec<Value> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of queries", path.display()))?;

    entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            let ref_id = entry
                .get("refId")
                .and_then(Value::as_str)
                .map(str::to_string)
                .with_context(|| format!("query #{} has no refId", idx))?;

            let mut query = DataQuery::new(ref_id, entry.to_string());
            if let Some(ms) = entry.get("intervalMs").and_then(Value::as_u64) {
                query = query.with_interval(Duration::from_millis(ms));
            }
            for (name, value) in variables {
                query = query.with_variable(name.clone(), value.clone());
            }
            Ok(query)
        })
        .collect()
}

impl BatchArgs {
    fn settings(&self) -> ResourceGraphSettings {
        ResourceGraphSettings {
            cloud: self.cloud.clone(),
            base_url: self.base_url.clone(),
            subscriptions: self.subscriptions.clone(),
            ..Default::default()
        }
    }

    fn time_range(&self) -> anyhow::Result<TimeRange> {
        Ok(TimeRange::new(self.from, self.to)?)
    }

    fn source(&self, transport: Arc<dyn Transport>) -> anyhow::Result<ResourceGraphSource> {
        Ok(ResourceGraphSource::new(self.settings(), transport)?)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestPreview {
    ref_id: String,
    result_format: String,
    url: Option<String>,
    interpolated_query: String,
    body: Value,
}

#[derive(Args)]
pub struct BuildCommand {
    #[command(flatten)]
    batch: BatchArgs,
}

impl BuildCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let queries = load_queries(&self.batch.queries, &self.batch.variables)?;
        let time_range = self.batch.time_range()?;
        let source = self.batch.source(Arc::new(ReqwestTransport::new(None)?))?;

        let previews = source
            .build_queries(&queries, &time_range)?
            .into_iter()
            .map(|query| -> anyhow::Result<RequestPreview> {
                let body = serde_json::from_slice(&source.request_body(&query)?)?;
                Ok(RequestPreview {
                    ref_id: query.ref_id,
                    result_format: query.result_format.to_string(),
                    url: query.url,
                    interpolated_query: query.interpolated_query,
                    body,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        info!("Built {} queries", previews.len());
        println!("{}", serde_json::to_string_pretty(&previews)?);
        Ok(())
    }
}

#[derive(Args)]
pub struct RunCommand {
    #[command(flatten)]
    batch: BatchArgs,

    /// Bearer token for the management API
    #[arg(long, env = "AZURE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,
}

impl RunCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let queries = load_queries(&self.batch.queries, &self.batch.variables)?;
        let time_range = self.batch.time_range()?;
        let transport = Arc::new(ReqwestTransport::new(Some(self.access_token.clone()))?);
        let source = self.batch.source(transport)?;

        info!(
            "Running {} queries against {}",
            queries.len(),
            source.endpoints().cloud
        );

        let rt = tokio::runtime::Runtime::new()?;
        let responses = rt.block_on(source.query_data(&queries, &time_range))?;

        for response in &responses {
            if let NormalizedResult::Error { message, .. } = &response.result {
                eprintln!("{} {}", format!("[{}]", response.ref_id).red().bold(), message);
            }
        }

        println!("{}", serde_json::to_string_pretty(&responses)?);

        if responses.iter().any(|r| r.result.is_error()) {
            anyhow::bail!("one or more queries failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_variable() {
        assert_eq!(
            parse_variable("kind=vm=large").unwrap(),
            ("kind".to_string(), "vm=large".to_string())
        );
        assert!(parse_variable("novalue").is_err());
        assert!(parse_variable("=x").is_err());
    }

    #[test]
    fn test_load_queries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"refId": "A", "intervalMs": 60000, "azureResourceGraph": {{"query": "resources"}}}},
                {{"refId": "B", "azureResourceGraph": {{"query": "resourcecontainers"}}}}
            ]"#
        )
        .unwrap();

        let variables = vec![("env".to_string(), "prod".to_string())];
        let queries = load_queries(file.path(), &variables).unwrap();

        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].ref_id, "A");
        assert_eq!(queries[0].interval, Some(Duration::from_secs(60)));
        assert_eq!(queries[1].interval, None);
        assert_eq!(queries[1].variables["env"], "prod");
        let model: Value = serde_json::from_str(&queries[1].json).unwrap();
        assert_eq!(model["azureResourceGraph"]["query"], "resourcecontainers");
    }

    #[test]
    fn test_load_queries_requires_ref_id() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"azureResourceGraph": {{"query": "resources"}}}}]"#).unwrap();

        let err = load_queries(file.path(), &[]).unwrap_err();
        assert!(err.to_string().contains("no refId"));
    }
}
