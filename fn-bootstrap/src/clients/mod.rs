//! Clients for the remote cloud APIs.
//!
//! The bootstrap sequence only talks to the cloud through these traits:
//! - [`NetworkApi`]: virtual networks, subnets, internet gateways, route tables
//! - [`RegistryApi`]: container repositories
//!
//! A [`Connector`] turns a [`Session`] into a client implementing both.

pub mod oci;
pub mod types;

use async_trait::async_trait;

use crate::error::{ApiResult, Result};
use crate::session::Session;

pub use oci::{Endpoints, HttpConnector, OciClient};
pub use types::*;

/// Virtual network API, scoped by compartment and parent network.
#[async_trait]
pub trait NetworkApi: Send + Sync {
    async fn list_vcns(&self, compartment_id: &str) -> ApiResult<Vec<Vcn>>;

    async fn create_vcn(&self, details: &CreateVcnDetails) -> ApiResult<Vcn>;

    async fn list_subnets(&self, compartment_id: &str, vcn_id: &str) -> ApiResult<Vec<Subnet>>;

    async fn create_subnet(&self, details: &CreateSubnetDetails) -> ApiResult<Subnet>;

    async fn list_internet_gateways(
        &self,
        compartment_id: &str,
        vcn_id: &str,
    ) -> ApiResult<Vec<InternetGateway>>;

    async fn create_internet_gateway(
        &self,
        details: &CreateInternetGatewayDetails,
    ) -> ApiResult<InternetGateway>;

    async fn get_route_table(&self, route_table_id: &str) -> ApiResult<RouteTable>;

    async fn update_route_table(
        &self,
        route_table_id: &str,
        details: &UpdateRouteTableDetails,
    ) -> ApiResult<RouteTable>;
}

/// Container registry API, keyed by tenant and repository name.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Existence probe; a missing repository is a 404 service error.
    async fn get_repository(&self, tenant_name: &str, repository_name: &str) -> ApiResult<()>;

    async fn create_repository(
        &self,
        tenant_name: &str,
        repository_name: &str,
        details: &CreateRepositoryDetails,
    ) -> ApiResult<()>;
}

/// Client exposing every API the bootstrap sequence needs.
pub trait CloudClient: NetworkApi + RegistryApi {}

impl<T: NetworkApi + RegistryApi> CloudClient for T {}

/// Builds an authenticated client for a session.
pub trait Connector: Send + Sync {
    type Client: CloudClient;

    fn connect(&self, session: &Session) -> Result<Self::Client>;
}
