//! Wire types for the network and registry APIs.
//!
//! One explicit request/response struct per remote call, serialized in the
//! camelCase form the services expect.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Route rule destination type for CIDR destinations.
pub const DESTINATION_TYPE_CIDR_BLOCK: &str = "CIDR_BLOCK";

// =============================================================================
// Virtual networks
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vcn {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compartment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr_block: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVcnDetails {
    pub compartment_id: String,
    pub display_name: String,
    pub cidr_block: String,
    pub dns_label: String,
}

// =============================================================================
// Subnets
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    pub vcn_id: String,
    /// Route table created alongside the subnet.
    pub route_table_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr_block: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubnetDetails {
    pub compartment_id: String,
    pub vcn_id: String,
    pub display_name: String,
    pub cidr_block: String,
}

// =============================================================================
// Internet gateways
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternetGateway {
    pub id: String,
    pub vcn_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInternetGatewayDetails {
    pub compartment_id: String,
    pub vcn_id: String,
    pub display_name: String,
    pub is_enabled: bool,
}

// =============================================================================
// Route tables
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRule {
    pub network_entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_type: Option<String>,
    /// Deprecated destination field, still set on older rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cidr_block: Option<String>,
    /// Fields not modelled here (`description`, `routeType`, ...). An update
    /// replaces the whole rule list, so they are sent back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RouteRule {
    /// CIDR rule forwarding `destination` to `network_entity_id`.
    pub fn cidr(destination: &str, network_entity_id: &str) -> Self {
        Self {
            network_entity_id: network_entity_id.to_string(),
            destination: Some(destination.to_string()),
            destination_type: Some(DESTINATION_TYPE_CIDR_BLOCK.to_string()),
            cidr_block: None,
            extra: Map::new(),
        }
    }

    /// Destination of the rule, falling back to the deprecated `cidrBlock`.
    pub fn effective_destination(&self) -> Option<&str> {
        self.destination.as_deref().or(self.cidr_block.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTable {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcn_id: Option<String>,
    #[serde(default)]
    pub route_rules: Vec<RouteRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRouteTableDetails {
    /// Complete rule list; the service replaces the table's rules with it.
    pub route_rules: Vec<RouteRule>,
}

// =============================================================================
// Registry
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepositoryDetails {
    pub is_public: bool,
}

/// Repository identified by tenant and repository name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub tenant_name: String,
    pub name: String,
}

/// Service error body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
