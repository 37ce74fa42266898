//! Result assembly.

use serde::{Deserialize, Serialize};

use crate::config::{ProvisioningRequest, Topology};

pub const PROVIDER: &str = "oracle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BootstrapStatus {
    Succeeded,
}

/// Identifiers resolved by the network stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIds {
    pub vcn_id: String,
    pub subnet_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OciState {
    pub vcn_id: String,
    pub subnet_id: String,
    pub test_app: String,
    pub test_func: String,
}

/// Connection context for the functions CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FdkContext {
    pub provider: String,
    pub registry: String,
    #[serde(rename = "api-url")]
    pub api_url: String,
    #[serde(rename = "call-url", default)]
    pub call_url: String,
    #[serde(rename = "oracle.user-id")]
    pub user_id: String,
    #[serde(rename = "oracle.tenancy-id")]
    pub tenancy_id: String,
    #[serde(rename = "oracle.fingerprint")]
    pub fingerprint: String,
    /// Always blank; the key stays with the caller.
    #[serde(rename = "oracle.key-file", default)]
    pub key_file: String,
    #[serde(rename = "disable-certs")]
    pub disable_certs: bool,
    #[serde(rename = "oracle.compartment-id")]
    pub compartment_id: String,
}

/// Response of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningResult {
    #[serde(rename = "bootstrap_status")]
    pub status: BootstrapStatus,
    pub oci_state: OciState,
    pub fdk_context: FdkContext,
}

/// Compose the response from the resolved ids and the original request.
pub fn assemble(
    request: &ProvisioningRequest,
    topology: &Topology,
    ids: ResolvedIds,
) -> ProvisioningResult {
    ProvisioningResult {
        status: BootstrapStatus::Succeeded,
        oci_state: OciState {
            vcn_id: ids.vcn_id,
            subnet_id: ids.subnet_id,
            test_app: topology.test_app.clone(),
            test_func: topology.test_func.clone(),
        },
        fdk_context: FdkContext {
            provider: PROVIDER.to_string(),
            registry: topology.registry_address(&request.tenant_name, &request.repository_name),
            api_url: topology.api_url(&request.region),
            call_url: String::new(),
            user_id: request.user_id.clone(),
            tenancy_id: request.tenant_id.clone(),
            fingerprint: request.fingerprint.clone(),
            key_file: String::new(),
            disable_certs: true,
            compartment_id: request.compartment_id.clone(),
        },
    }
}
