//! # temps-query
//!
//! Core abstractions for querying remote data sources in Temps.
//!
//! Backends receive a batch of [`DataQuery`] values (a ref id plus the raw JSON
//! model the frontend sent) together with one [`TimeRange`], and answer with
//! one [`DataResponse`] per query. A response holds either a tabular
//! [`QueryResult`] or the remote service's diagnostic, see [`NormalizedResult`].
//!
//! ## Architecture
//!
//! - **DataSource**: Core trait that all backends must implement
//! - **BatchQueryable**: Batch execution against a shared time range
//!
//! ## Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use temps_query::{DataQuery, TimeRange};
//!
//! # fn example() -> temps_query::Result<()> {
//! let range = TimeRange::new(
//!     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap(),
//! )?;
//! let query = DataQuery::new("A", r#"{"azureResourceGraph": {"query": "resources"}}"#);
//! // let responses = source.query_data(&[query], &range).await?;
//! # let _ = (range, query);
//! # Ok(())
//! # }
//! ```
//!
//! Backend crates:
//! - `temps-query-resource-graph` - Azure Resource Graph

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items
pub use error::{DataError, Result};
pub use traits::{BatchQueryable, DataSource};
pub use types::{
    Capability, DataLink, DataQuery, DataResponse, DataRow, DatasetSchema, FieldConfig, FieldDef,
    FieldType, NormalizedResult, QueryResult, QueryStats, ResultFormat, TimeRange,
};
