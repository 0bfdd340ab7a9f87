//! Azure cloud endpoints
//!
//! Resource Graph runs separately in each sovereign cloud. Only the four
//! identifiers below resolve; anything else is `DataError::UnsupportedCloud`,
//! there is no fallback to the public cloud.

use serde::Serialize;
use temps_query::{DataError, Result};

pub const AZURE_PUBLIC: &str = "AzureCloud";
pub const AZURE_CHINA: &str = "AzureChinaCloud";
pub const AZURE_US_GOVERNMENT: &str = "AzureUSGovernment";
pub const AZURE_GERMANY: &str = "AzureGermanCloud";

/// API and portal endpoints of one Azure cloud
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloudEndpoints {
    pub cloud: &'static str,
    /// Azure Resource Manager base URL
    pub api_url: &'static str,
    /// Azure portal base URL, used for deep links
    pub portal_url: &'static str,
}

pub static CLOUDS: [CloudEndpoints; 4] = [
    CloudEndpoints {
        cloud: AZURE_PUBLIC,
        api_url: "https://management.azure.com",
        portal_url: "https://portal.azure.com",
    },
    CloudEndpoints {
        cloud: AZURE_CHINA,
        api_url: "https://management.chinacloudapi.cn",
        portal_url: "https://portal.azure.cn",
    },
    CloudEndpoints {
        cloud: AZURE_US_GOVERNMENT,
        api_url: "https://management.usgovcloudapi.net",
        portal_url: "https://portal.azure.us",
    },
    CloudEndpoints {
        cloud: AZURE_GERMANY,
        api_url: "https://management.microsoftazure.de",
        portal_url: "https://portal.microsoftazure.de",
    },
];

/// Look up the endpoints of `cloud`
pub fn resolve_cloud(cloud: &str) -> Result<&'static CloudEndpoints> {
    CLOUDS
        .iter()
        .find(|endpoints| endpoints.cloud == cloud)
        .ok_or_else(|| DataError::UnsupportedCloud(cloud.to_string()))
}

/// Portal URL of `cloud`
pub fn portal_url(cloud: &str) -> Result<&'static str> {
    resolve_cloud(cloud).map(|endpoints| endpoints.portal_url)
}
