//! Provisioning request and deployment-fixed topology.

use std::fmt;

use serde::Deserialize;

use crate::error::{BootstrapError, Result};

/// CIDR block of the virtual network.
pub const VCN_CIDR: &str = "10.0.0.0/16";
/// DNS label assigned to a newly created virtual network.
pub const VCN_DNS_LABEL: &str = "testvcn";
/// CIDR block of the regional subnet.
pub const SUBNET_CIDR: &str = "10.0.1.0/24";
/// Display name of a newly created internet gateway.
pub const GATEWAY_NAME: &str = "ig";
/// Destination of the default route bound to the gateway.
pub const DEFAULT_ROUTE_DESTINATION: &str = "0.0.0.0/0";
/// Registry host every repository lives under.
pub const REGISTRY_HOST: &str = "iad.ocir.io";
/// Path of the repository API on the registry host.
pub const REGISTRY_API_PATH: &str = "20180419/docker/repos";
/// Functions API endpoint; `{region}` is replaced with the request region.
pub const FUNCTIONS_API_URL: &str = "https://functions.{region}.oraclecloud.com";
/// Placeholder application name reported back to the caller.
pub const TEST_APP: &str = "test-app";
/// Placeholder function name reported back to the caller.
pub const TEST_FUNC: &str = "test-func";

/// Input for a single bootstrap run.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProvisioningRequest {
    pub user_id: String,
    pub tenant_id: String,
    pub region: String,
    pub fingerprint: String,
    /// Base64 encoded PEM private key.
    pub private_key: String,
    pub tenant_name: String,
    pub compartment_id: String,
    pub vcn_name: String,
    #[serde(rename = "regional_subnet")]
    pub subnet_name: String,
    #[serde(rename = "repo_name")]
    pub repository_name: String,
}

impl ProvisioningRequest {
    /// Parse a request from its JSON representation.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Check that every field the sequence depends on is present.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("region", &self.region),
            ("private_key", &self.private_key),
            ("tenant_name", &self.tenant_name),
            ("compartment_id", &self.compartment_id),
            ("vcn_name", &self.vcn_name),
            ("regional_subnet", &self.subnet_name),
            ("repo_name", &self.repository_name),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(BootstrapError::Config(format!(
                    "missing required field: {name}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ProvisioningRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningRequest")
            .field("user_id", &self.user_id)
            .field("tenant_id", &self.tenant_id)
            .field("region", &self.region)
            .field("fingerprint", &self.fingerprint)
            .field("private_key", &"<redacted>")
            .field("tenant_name", &self.tenant_name)
            .field("compartment_id", &self.compartment_id)
            .field("vcn_name", &self.vcn_name)
            .field("subnet_name", &self.subnet_name)
            .field("repository_name", &self.repository_name)
            .finish()
    }
}

/// Fixed shape of the provisioned environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub vcn_cidr: String,
    pub vcn_dns_label: String,
    pub subnet_cidr: String,
    pub gateway_name: String,
    pub default_route_destination: String,
    pub registry_host: String,
    pub registry_api_path: String,
    pub functions_api_url: String,
    pub test_app: String,
    pub test_func: String,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            vcn_cidr: VCN_CIDR.to_string(),
            vcn_dns_label: VCN_DNS_LABEL.to_string(),
            subnet_cidr: SUBNET_CIDR.to_string(),
            gateway_name: GATEWAY_NAME.to_string(),
            default_route_destination: DEFAULT_ROUTE_DESTINATION.to_string(),
            registry_host: REGISTRY_HOST.to_string(),
            registry_api_path: REGISTRY_API_PATH.to_string(),
            functions_api_url: FUNCTIONS_API_URL.to_string(),
            test_app: TEST_APP.to_string(),
            test_func: TEST_FUNC.to_string(),
        }
    }
}

impl Topology {
    /// Functions API endpoint for a region.
    pub fn api_url(&self, region: &str) -> String {
        self.functions_api_url.replace("{region}", region)
    }

    /// Base URL of the repository API.
    pub fn registry_api_base(&self) -> String {
        format!(
            "https://{}/{}",
            self.registry_host,
            self.registry_api_path.trim_start_matches('/')
        )
    }

    /// Address images are pushed to.
    pub fn registry_address(&self, tenant_name: &str, repository_name: &str) -> String {
        format!("{}/{tenant_name}/{repository_name}", self.registry_host)
    }
}
