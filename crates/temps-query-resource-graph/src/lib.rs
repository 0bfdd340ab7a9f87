//! Azure Resource Graph backend for temps-query
//!
//! Turns raw Resource Graph query models into requests against the Resource
//! Graph REST API and normalizes the answers.
//!
//! ## Pipeline
//!
//! 1. [`query`] parses each query model and runs the [`macros`] over its text
//! 2. [`request`] builds the POST for the cloud resolved by [`cloud`]
//! 3. a [`transport::Transport`] sends it
//! 4. [`response`] reshapes the table and adds a portal link, or
//!    [`envelope`] renders the error the service answered with
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::{TimeZone, Utc};
//! use temps_query::{BatchQueryable, DataQuery, TimeRange};
//! use temps_query_resource_graph::{ReqwestTransport, ResourceGraphSettings, ResourceGraphSource};
//!
//! # async fn example() -> temps_query::Result<()> {
//! let transport = Arc::new(ReqwestTransport::new(Some("token".to_string()))?);
//! let source = ResourceGraphSource::new(ResourceGraphSettings::default(), transport)?;
//!
//! let range = TimeRange::new(
//!     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
//! )?;
//! let query = DataQuery::new(
//!     "A",
//!     r#"{"azureResourceGraph": {"query": "resources | where $__contains(name, 'vm1', 'vm2')"}}"#,
//! );
//!
//! let responses = source.query_data(&[query], &range).await?;
//! # let _ = responses;
//! # Ok(())
//! # }
//! ```

pub mod cloud;
pub mod envelope;
pub mod macros;
pub mod query;
pub mod request;
pub mod response;
pub mod source;
pub mod transport;

pub use cloud::{portal_url, resolve_cloud, CloudEndpoints, CLOUDS};
pub use envelope::{format_error, DecodedError, ErrorDetail, ErrorEnvelope};
pub use macros::{interpolate, MacroContext};
pub use query::{build_queries, parse_queries, InterpolatedQuery, RawQuery};
pub use request::create_request;
pub use response::{add_config_links, unmarshal_response};
pub use source::{ResourceGraphSettings, ResourceGraphSource};
pub use transport::{ReqwestTransport, Transport, TransportResponse};
