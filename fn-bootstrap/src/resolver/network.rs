//! Virtual network, subnet and internet gateway resolvers.

use tracing::info;

use super::{ResourceKind, Resolved, find_or_create};
use crate::clients::{
    CreateInternetGatewayDetails, CreateSubnetDetails, CreateVcnDetails, InternetGateway,
    NetworkApi, Subnet, Vcn,
};
use crate::config::Topology;
use crate::error::{Result, Stage};

const VCN: ResourceKind = ResourceKind {
    stage: Stage::Network,
    list_action: "failed to list vcns",
    create_action: "failed to create vcn",
};

const SUBNET: ResourceKind = ResourceKind {
    stage: Stage::Subnet,
    list_action: "failed to list subnets",
    create_action: "failed to create subnet",
};

const GATEWAY: ResourceKind = ResourceKind {
    stage: Stage::Gateway,
    list_action: "failed to list internet gateways",
    create_action: "failed to create internet gateway",
};

/// Find the compartment's network named `name`, or create it.
pub async fn ensure_vcn<A: NetworkApi + ?Sized>(
    api: &A,
    topology: &Topology,
    compartment_id: &str,
    name: &str,
) -> Result<Resolved<Vcn>> {
    let details = CreateVcnDetails {
        compartment_id: compartment_id.to_string(),
        display_name: name.to_string(),
        cidr_block: topology.vcn_cidr.clone(),
        dns_label: topology.vcn_dns_label.clone(),
    };

    let resolved = find_or_create(
        VCN,
        api.list_vcns(compartment_id),
        |vcn: &Vcn| vcn.display_name == name,
        || api.create_vcn(&details),
    )
    .await?;

    if resolved.created() {
        info!(vcn_id = %resolved.get().id, name, "Created vcn");
    }
    Ok(resolved)
}

/// Find the network's subnet named `name`, or create it.
///
/// The subnet carries the id of the route table the service created with it.
pub async fn ensure_subnet<A: NetworkApi + ?Sized>(
    api: &A,
    topology: &Topology,
    compartment_id: &str,
    vcn_id: &str,
    name: &str,
) -> Result<Resolved<Subnet>> {
    let details = CreateSubnetDetails {
        compartment_id: compartment_id.to_string(),
        vcn_id: vcn_id.to_string(),
        display_name: name.to_string(),
        cidr_block: topology.subnet_cidr.clone(),
    };

    let resolved = find_or_create(
        SUBNET,
        api.list_subnets(compartment_id, vcn_id),
        |subnet: &Subnet| subnet.display_name == name,
        || api.create_subnet(&details),
    )
    .await?;

    if resolved.created() {
        info!(subnet_id = %resolved.get().id, vcn_id, name, "Created subnet");
    }
    Ok(resolved)
}

/// Reuse the network's first internet gateway, or create one.
///
/// Any existing gateway is taken regardless of its name or purpose.
pub async fn ensure_gateway<A: NetworkApi + ?Sized>(
    api: &A,
    topology: &Topology,
    compartment_id: &str,
    vcn_id: &str,
) -> Result<Resolved<InternetGateway>> {
    let details = CreateInternetGatewayDetails {
        compartment_id: compartment_id.to_string(),
        vcn_id: vcn_id.to_string(),
        display_name: topology.gateway_name.clone(),
        is_enabled: true,
    };

    let resolved = find_or_create(
        GATEWAY,
        api.list_internet_gateways(compartment_id, vcn_id),
        |_: &InternetGateway| true,
        || api.create_internet_gateway(&details),
    )
    .await?;

    if resolved.created() {
        info!(gateway_id = %resolved.get().id, vcn_id, "Created internet gateway");
    }
    Ok(resolved)
}
