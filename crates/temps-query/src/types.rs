use crate::error::{DataError, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

/// Capabilities supported by a data source
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Capability {
    /// Tabular results
    Table,
    /// Time-series results
    TimeSeries,
    /// Query text macros ($__timeFilter, $__contains, ...)
    Macros,
    /// Result fields link back to a web console
    DeepLinks,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Table => write!(f, "table"),
            Capability::TimeSeries => write!(f, "time-series"),
            Capability::Macros => write!(f, "macros"),
            Capability::DeepLinks => write!(f, "deep-links"),
        }
    }
}

/// Field data types supported by query results
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Boolean true/false
    Boolean,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point
    Float64,
    /// UTF-8 string
    String,
    /// ISO 8601 timestamp
    Timestamp,
    /// JSON object
    Json,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Int32 => write!(f, "int32"),
            FieldType::Int64 => write!(f, "int64"),
            FieldType::Float64 => write!(f, "float64"),
            FieldType::String => write!(f, "string"),
            FieldType::Timestamp => write!(f, "timestamp"),
            FieldType::Json => write!(f, "json"),
        }
    }
}

/// Shape the caller wants the result rendered as
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultFormat {
    #[default]
    Table,
    TimeSeries,
}

impl ResultFormat {
    /// Parse a result format hint. An empty hint means table.
    pub fn parse(hint: &str) -> Option<Self> {
        match hint {
            "" | "table" => Some(ResultFormat::Table),
            "time_series" => Some(ResultFormat::TimeSeries),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultFormat::Table => "table",
            ResultFormat::TimeSeries => "time_series",
        }
    }
}

impl fmt::Display for ResultFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Absolute time window a batch of queries runs against.
///
/// Both ends are stored in UTC and `to` is always strictly after `from`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct TimeRange {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new<Tz: TimeZone>(from: DateTime<Tz>, to: DateTime<Tz>) -> Result<Self> {
        let from = from.with_timezone(&Utc);
        let to = to.with_timezone(&Utc);

        if to <= from {
            return Err(DataError::InvalidTimeRange(format!(
                "end {} is not after start {}",
                to.to_rfc3339(),
                from.to_rfc3339()
            )));
        }

        Ok(Self { from, to })
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }
}

/// A query as handed over by the request layer: the caller's ref id plus the
/// raw JSON model, untouched.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DataQuery {
    pub ref_id: String,
    pub json: String,
    /// Suggested bucket width, used by `$__interval`
    pub interval: Option<Duration>,
    /// Named parameters available to `${name}` substitution
    pub variables: BTreeMap<String, String>,
}

impl DataQuery {
    pub fn new(ref_id: impl Into<String>, json: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            json: json.into(),
            interval: None,
            variables: BTreeMap::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

/// Link rendered next to a field value
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataLink {
    pub title: String,
    pub url: String,
    pub target_blank: bool,
}

/// Display metadata attached to a field
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub links: Vec<DataLink>,
}

/// Definition of a single field in a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: FieldType,
    /// Whether any value of the field is null
    pub nullable: bool,
    /// Links and other display metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<FieldConfig>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
            config: None,
        }
    }
}

/// Schema of a result set, fields in column order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetSchema {
    pub fields: Vec<FieldDef>,
}

/// A row of data as key-value pairs
pub type DataRow = HashMap<String, serde_json::Value>;

/// Statistics about query execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryStats {
    /// Number of rows returned
    pub row_count: usize,
    /// Query execution time in milliseconds
    pub execution_ms: u64,
}

/// Result of executing a single query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Ref id of the query that produced this result
    pub ref_id: String,
    /// Schema of returned data
    pub schema: DatasetSchema,
    /// Rows of data
    pub rows: Vec<DataRow>,
    /// Execution statistics
    pub stats: QueryStats,
    /// Query text as it was sent, after interpolation
    pub executed_query: Option<String>,
    /// Format the caller asked for
    pub result_format: ResultFormat,
}

impl QueryResult {
    /// Create a new query result
    pub fn new(
        ref_id: impl Into<String>,
        schema: DatasetSchema,
        rows: Vec<DataRow>,
        execution_ms: u64,
    ) -> Self {
        let row_count = rows.len();

        Self {
            ref_id: ref_id.into(),
            schema,
            rows,
            stats: QueryStats {
                row_count,
                execution_ms,
            },
            executed_query: None,
            result_format: ResultFormat::Table,
        }
    }

    pub fn with_executed_query(mut self, query: impl Into<String>) -> Self {
        self.executed_query = Some(query.into());
        self
    }

    pub fn with_result_format(mut self, format: ResultFormat) -> Self {
        self.result_format = format;
        self
    }

    /// Append `link` to the config of every field
    pub fn with_field_link(mut self, link: DataLink) -> Self {
        for field in &mut self.schema.fields {
            field
                .config
                .get_or_insert_with(FieldConfig::default)
                .links
                .push(link.clone());
        }
        self
    }
}

/// Outcome of one query: a table, or the diagnostic the remote service
/// answered with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedResult {
    Data(QueryResult),
    Error { status: u16, message: String },
}

impl NormalizedResult {
    pub fn is_error(&self) -> bool {
        matches!(self, NormalizedResult::Error { .. })
    }
}

/// Response for one query of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataResponse {
    pub ref_id: String,
    pub result: NormalizedResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_time_range_normalizes_to_utc() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let from = offset.with_ymd_and_hms(2018, 3, 15, 15, 0, 0).unwrap();
        let to = offset.with_ymd_and_hms(2018, 3, 15, 15, 34, 0).unwrap();

        let range = TimeRange::new(from, to).unwrap();
        assert_eq!(range.from(), Utc.with_ymd_and_hms(2018, 3, 15, 13, 0, 0).unwrap());
        assert_eq!(range.to(), Utc.with_ymd_and_hms(2018, 3, 15, 13, 34, 0).unwrap());
    }

    #[test]
    fn test_time_range_rejects_empty_and_reversed() {
        let at = Utc.with_ymd_and_hms(2018, 3, 15, 13, 0, 0).unwrap();
        assert!(matches!(
            TimeRange::new(at, at),
            Err(DataError::InvalidTimeRange(_))
        ));
        assert!(TimeRange::new(at, at - chrono::Duration::minutes(1)).is_err());
    }

    #[test]
    fn test_result_format_parse() {
        assert_eq!(ResultFormat::parse(""), Some(ResultFormat::Table));
        assert_eq!(ResultFormat::parse("table"), Some(ResultFormat::Table));
        assert_eq!(
            ResultFormat::parse("time_series"),
            Some(ResultFormat::TimeSeries)
        );
        assert_eq!(ResultFormat::parse("graph"), None);
    }

    #[test]
    fn test_field_link_is_appended_to_every_field() {
        let schema = DatasetSchema {
            fields: vec![
                FieldDef::new("name", FieldType::String),
                FieldDef {
                    config: Some(FieldConfig {
                        links: vec![DataLink {
                            title: "existing".to_string(),
                            url: "http://other".to_string(),
                            target_blank: false,
                        }],
                    }),
                    ..FieldDef::new("count", FieldType::Int64)
                },
            ],
        };
        let link = DataLink {
            title: "View in Azure Portal".to_string(),
            url: "http://ds".to_string(),
            target_blank: true,
        };

        let result = QueryResult::new("A", schema, vec![], 0).with_field_link(link.clone());

        let first = result.schema.fields[0].config.as_ref().unwrap();
        assert_eq!(first.links, vec![link.clone()]);
        let second = result.schema.fields[1].config.as_ref().unwrap();
        assert_eq!(second.links.len(), 2);
        assert_eq!(second.links[1], link);
    }

    #[test]
    fn test_normalized_result_serializes_tagged() {
        let err = NormalizedResult::Error {
            status: 400,
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["status"], 400);
        assert!(err.is_error());
    }
}
