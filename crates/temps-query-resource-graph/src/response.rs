//! Response normalization
//!
//! Successful answers carry a column/row table under `data`. Failed answers
//! are turned into a [`DataError::Remote`] whose message is the rendered
//! envelope, see [`crate::envelope`].

use crate::envelope::format_error;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use temps_query::{
    DataError, DataLink, DataRow, DatasetSchema, FieldDef, FieldType, QueryResult, Result,
};

pub const PORTAL_LINK_TITLE: &str = "View in Azure Portal";

/// Body of a successful resource query
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceGraphResponse {
    pub data: ResponseTable,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseTable {
    pub columns: Vec<ResponseColumn>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

/// Decode a response body. Non-2xx statuses become [`DataError::Remote`].
pub fn unmarshal_response(status: StatusCode, body: &[u8]) -> Result<ResourceGraphResponse> {
    if !status.is_success() {
        let body = String::from_utf8_lossy(body);
        return Err(DataError::Remote {
            status: status.as_u16(),
            message: format_error(&status.to_string(), &body),
        });
    }

    serde_json::from_slice(body).map_err(|e| {
        DataError::SerializationError(format!("failed to decode Resource Graph response: {}", e))
    })
}

fn field_type(column: &ResponseColumn) -> Result<FieldType> {
    match column.column_type.as_str() {
        "string" | "guid" | "timespan" => Ok(FieldType::String),
        "datetime" => Ok(FieldType::Timestamp),
        "bool" | "boolean" => Ok(FieldType::Boolean),
        "int" => Ok(FieldType::Int32),
        "long" | "integer" => Ok(FieldType::Int64),
        "real" | "decimal" | "number" => Ok(FieldType::Float64),
        "dynamic" | "object" => Ok(FieldType::Json),
        other => Err(DataError::SchemaError(format!(
            "unsupported column type '{}' for column '{}'",
            other, column.name
        ))),
    }
}

fn convert_cell(value: Value, field: &FieldDef) -> Result<Value> {
    let mismatch = |value: &Value| {
        DataError::SchemaError(format!(
            "value {} in column '{}' is not a {}",
            value, field.name, field.field_type
        ))
    };

    match (field.field_type, value) {
        (_, Value::Null) => Ok(Value::Null),
        (FieldType::Boolean, v @ Value::Bool(_)) => Ok(v),
        (FieldType::Int32, Value::Number(n))
            if n.as_i64().is_some_and(|v| i32::try_from(v).is_ok()) =>
        {
            Ok(Value::Number(n))
        }
        (FieldType::Int64, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(Value::Number(n)),
        (FieldType::Float64, v @ Value::Number(_)) => Ok(v),
        (FieldType::String, v @ Value::String(_)) => Ok(v),
        (FieldType::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|t| {
                Value::String(
                    t.with_timezone(&Utc)
                        .to_rfc3339_opts(SecondsFormat::AutoSi, true),
                )
            })
            .map_err(|_| mismatch(&Value::String(s))),
        (FieldType::Json, v) => Ok(v),
        (_, v) => Err(mismatch(&v)),
    }
}

/// Reshape the provider table into a [`QueryResult`]
pub fn table_to_result(
    ref_id: &str,
    table: ResponseTable,
    execution_ms: u64,
) -> Result<QueryResult> {
    let mut fields = table
        .columns
        .iter()
        .map(|column| Ok(FieldDef::new(&column.name, field_type(column)?)))
        .collect::<Result<Vec<_>>>()?;

    let rows = table
        .rows
        .into_iter()
        .enumerate()
        .map(|(idx, row)| {
            if row.len() != fields.len() {
                return Err(DataError::SchemaError(format!(
                    "row {} has {} values, expected {}",
                    idx,
                    row.len(),
                    fields.len()
                )));
            }

            fields
                .iter()
                .zip(row)
                .map(|(field, value)| Ok((field.name.clone(), convert_cell(value, field)?)))
                .collect::<Result<DataRow>>()
        })
        .collect::<Result<Vec<_>>>()?;

    for field in &mut fields {
        field.nullable = rows.iter().any(|row| row[&field.name].is_null());
    }

    Ok(QueryResult::new(
        ref_id,
        DatasetSchema { fields },
        rows,
        execution_ms,
    ))
}

/// Link opening `query` in the Resource Graph explorer of the portal
pub fn portal_deep_link(portal_url: &str, query: &str) -> String {
    format!(
        "{}/#blade/HubsExtension/ArgQueryBlade/query/{}",
        portal_url.trim_end_matches('/'),
        urlencoding::encode(query)
    )
}

/// Attach a "View in Azure Portal" link pointing at `url` to every field
pub fn add_config_links(result: QueryResult, url: &str) -> QueryResult {
    result.with_field_link(DataLink {
        title: PORTAL_LINK_TITLE.to_string(),
        url: url.to_string(),
        target_blank: true,
    })
}
