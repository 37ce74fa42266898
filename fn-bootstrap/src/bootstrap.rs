//! The provisioning sequence.
//!
//! Stages run strictly in order:
//! session -> network -> subnet -> gateway -> route -> repository -> result.
//! The first failing stage aborts the run. Nothing is rolled back; resources
//! created before the failure are found and reused by the next run.

use tracing::{debug, info};

use crate::clients::Connector;
use crate::config::{ProvisioningRequest, Topology};
use crate::error::Result;
use crate::resolver::{
    bind_default_route, ensure_gateway, ensure_repository, ensure_subnet, ensure_vcn,
};
use crate::result::{ProvisioningResult, ResolvedIds, assemble};
use crate::session::Session;

/// Runs the bootstrap sequence against the clients produced by `C`.
pub struct Bootstrapper<C> {
    connector: C,
    topology: Topology,
}

impl<C: Connector> Bootstrapper<C> {
    pub fn new(connector: C, topology: Topology) -> Self {
        Self {
            connector,
            topology,
        }
    }

    /// Provision everything `request` needs and describe the result.
    pub async fn run(&self, request: &ProvisioningRequest) -> Result<ProvisioningResult> {
        let session = Session::new(request)?;
        let client = self.connector.connect(&session)?;
        debug!(key_id = %session.key_id(), region = %session.region(), "Session ready");

        let compartment_id = request.compartment_id.as_str();
        let topology = &self.topology;

        let vcn = ensure_vcn(&client, topology, compartment_id, &request.vcn_name).await?;
        info!(vcn_id = %vcn.get().id, created = vcn.created(), "Network ready");
        let vcn = vcn.into_inner();

        let subnet =
            ensure_subnet(&client, topology, compartment_id, &vcn.id, &request.subnet_name)
                .await?;
        info!(subnet_id = %subnet.get().id, created = subnet.created(), "Subnet ready");
        let subnet = subnet.into_inner();

        let gateway = ensure_gateway(&client, topology, compartment_id, &vcn.id).await?;
        info!(gateway_id = %gateway.get().id, created = gateway.created(), "Gateway ready");
        let gateway = gateway.into_inner();

        let binding = bind_default_route(
            &client,
            &subnet.route_table_id,
            &gateway.id,
            &topology.default_route_destination,
        )
        .await?;
        info!(route_table_id = %subnet.route_table_id, ?binding, "Route bound");

        let repository =
            ensure_repository(&client, &request.tenant_name, &request.repository_name).await?;
        info!(
            tenant = %request.tenant_name,
            repository = %request.repository_name,
            created = repository.created(),
            "Repository ready"
        );

        Ok(assemble(
            request,
            topology,
            ResolvedIds {
                vcn_id: vcn.id,
                subnet_id: subnet.id,
            },
        ))
    }
}
