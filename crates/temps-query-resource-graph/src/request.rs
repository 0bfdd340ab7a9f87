//! Request construction for the Resource Graph API

use crate::query::InterpolatedQuery;
use reqwest::header::{HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Body, Method, Request, Url};
use serde::Serialize;
use temps_query::{DataError, Result};

pub const DEFAULT_API_VERSION: &str = "2021-06-01-preview";
pub const RESOURCES_PATH: &str = "providers/Microsoft.ResourceGraph/resources";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestBody<'a> {
    subscriptions: &'a [String],
    query: &'a str,
    options: RequestOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestOptions {
    result_format: &'static str,
}

/// Resource query endpoint under `api_base`
pub fn resources_url(api_base: &str, api_version: &str) -> String {
    format!(
        "{}/{}?api-version={}",
        api_base.trim_end_matches('/'),
        RESOURCES_PATH,
        api_version
    )
}

/// Serialize the body for `query`.
///
/// Subscriptions named on the query win over `default_subscriptions`. The
/// service always answers in table form; the caller's format hint is applied
/// after the response comes back.
pub fn request_body(query: &InterpolatedQuery, default_subscriptions: &[String]) -> Result<Vec<u8>> {
    let subscriptions: &[String] = if query.subscriptions.is_empty() {
        default_subscriptions
    } else {
        &query.subscriptions
    };

    let body = RequestBody {
        subscriptions,
        query: &query.interpolated_query,
        options: RequestOptions {
            result_format: "table",
        },
    };

    Ok(serde_json::to_vec(&body)?)
}

/// Build a POST of `body` to `url`. No I/O happens here.
pub fn create_request(url: &str, body: Vec<u8>, user_agent: &str) -> Result<Request> {
    let url = Url::parse(url)
        .map_err(|e| DataError::invalid_configuration(format!("invalid URL '{}': {}", url, e)))?;

    if user_agent.trim().is_empty() {
        return Err(DataError::invalid_configuration("user agent must not be empty"));
    }
    let user_agent = HeaderValue::from_str(user_agent).map_err(|e| {
        DataError::invalid_configuration(format!("invalid user agent '{}': {}", user_agent, e))
    })?;

    let mut request = Request::new(Method::POST, url);
    let headers = request.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, user_agent);
    *request.body_mut() = Some(Body::from(body));

    Ok(request)
}
