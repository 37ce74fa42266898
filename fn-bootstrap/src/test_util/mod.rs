//! Test utilities for fn-bootstrap.
//!
//! [`FakeCloud`] is an in-memory backend that persists what it creates,
//! counts every call and can be told to fail specific operations. It acts as
//! its own [`Connector`], so a `Bootstrapper` can run against it end to end.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::clients::*;
use crate::error::{ApiError, ApiResult, Result};
use crate::session::Session;

/// Remote operations recorded by [`FakeCloud`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListVcns,
    CreateVcn,
    ListSubnets,
    CreateSubnet,
    ListInternetGateways,
    CreateInternetGateway,
    GetRouteTable,
    UpdateRouteTable,
    GetRepository,
    CreateRepository,
}

impl Op {
    pub fn is_create(&self) -> bool {
        matches!(
            self,
            Op::CreateVcn | Op::CreateSubnet | Op::CreateInternetGateway | Op::CreateRepository
        )
    }
}

#[derive(Default)]
struct State {
    vcns: Vec<(String, Vcn)>,
    subnets: Vec<(String, Subnet)>,
    gateways: Vec<(String, InternetGateway)>,
    route_tables: Vec<RouteTable>,
    repositories: Vec<(String, String, bool)>,
    calls: HashMap<Op, usize>,
    failures: HashMap<Op, ApiError>,
    connects: usize,
}

/// In-memory cloud backend. Clones share state.
#[derive(Clone, Default)]
pub struct FakeCloud {
    state: Arc<Mutex<State>>,
}

fn ocid(kind: &str) -> String {
    format!("ocid1.{kind}.oc1..{}", Uuid::new_v4().simple())
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("fake cloud state poisoned")
    }

    /// Count a call and return the injected failure for it, if any.
    fn record(&self, op: Op) -> ApiResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        *state.calls.entry(op).or_default() += 1;
        if let Some(err) = state.failures.get(&op).cloned() {
            return Err(err);
        }
        Ok(state)
    }

    /// Make every subsequent `op` call fail with `err`.
    pub fn fail(&self, op: Op, err: ApiError) {
        self.lock().failures.insert(op, err);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    pub fn calls(&self, op: Op) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    pub fn create_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|(op, _)| op.is_create())
            .map(|(_, n)| n)
            .sum()
    }

    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of sessions connected through this backend.
    pub fn connects(&self) -> usize {
        self.lock().connects
    }

    pub fn seed_vcn(&self, compartment_id: &str, name: &str) -> Vcn {
        let vcn = Vcn {
            id: ocid("vcn"),
            display_name: name.to_string(),
            compartment_id: Some(compartment_id.to_string()),
            cidr_block: Some("172.16.0.0/16".to_string()),
        };
        self.lock()
            .vcns
            .push((compartment_id.to_string(), vcn.clone()));
        vcn
    }

    pub fn seed_subnet(&self, compartment_id: &str, vcn_id: &str, name: &str) -> Subnet {
        let route_table_id = self.seed_route_table(Vec::new());
        let subnet = Subnet {
            id: ocid("subnet"),
            display_name: name.to_string(),
            vcn_id: vcn_id.to_string(),
            route_table_id,
            cidr_block: Some("172.16.1.0/24".to_string()),
        };
        self.lock()
            .subnets
            .push((compartment_id.to_string(), subnet.clone()));
        subnet
    }

    pub fn seed_gateway(&self, compartment_id: &str, vcn_id: &str, name: &str) -> InternetGateway {
        let gateway = InternetGateway {
            id: ocid("internetgateway"),
            vcn_id: vcn_id.to_string(),
            display_name: Some(name.to_string()),
            is_enabled: Some(true),
        };
        self.lock()
            .gateways
            .push((compartment_id.to_string(), gateway.clone()));
        gateway
    }

    /// Add a route table and return its id.
    pub fn seed_route_table(&self, route_rules: Vec<RouteRule>) -> String {
        let table = RouteTable {
            id: ocid("routetable"),
            vcn_id: None,
            route_rules,
        };
        let id = table.id.clone();
        self.lock().route_tables.push(table);
        id
    }

    pub fn seed_repository(&self, tenant_name: &str, repository_name: &str) {
        self.lock().repositories.push((
            tenant_name.to_string(),
            repository_name.to_string(),
            false,
        ));
    }

    pub fn route_table(&self, id: &str) -> Option<RouteTable> {
        self.lock().route_tables.iter().find(|t| t.id == id).cloned()
    }

    /// Visibility of a repository, if it exists.
    pub fn repository_visibility(&self, tenant_name: &str, repository_name: &str) -> Option<bool> {
        self.lock()
            .repositories
            .iter()
            .find(|(t, r, _)| t == tenant_name && r == repository_name)
            .map(|(_, _, public)| *public)
    }

    pub fn vcn_count(&self) -> usize {
        self.lock().vcns.len()
    }

    pub fn subnet_count(&self) -> usize {
        self.lock().subnets.len()
    }

    pub fn gateway_count(&self) -> usize {
        self.lock().gateways.len()
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::service(404, "NotAuthorizedOrNotFound", format!("{what} not found"))
}

#[async_trait]
impl NetworkApi for FakeCloud {
    async fn list_vcns(&self, compartment_id: &str) -> ApiResult<Vec<Vcn>> {
        let state = self.record(Op::ListVcns)?;
        Ok(state
            .vcns
            .iter()
            .filter(|(c, _)| c == compartment_id)
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn create_vcn(&self, details: &CreateVcnDetails) -> ApiResult<Vcn> {
        let mut state = self.record(Op::CreateVcn)?;
        let vcn = Vcn {
            id: ocid("vcn"),
            display_name: details.display_name.clone(),
            compartment_id: Some(details.compartment_id.clone()),
            cidr_block: Some(details.cidr_block.clone()),
        };
        state
            .vcns
            .push((details.compartment_id.clone(), vcn.clone()));
        Ok(vcn)
    }

    async fn list_subnets(&self, compartment_id: &str, vcn_id: &str) -> ApiResult<Vec<Subnet>> {
        let state = self.record(Op::ListSubnets)?;
        Ok(state
            .subnets
            .iter()
            .filter(|(c, s)| c == compartment_id && s.vcn_id == vcn_id)
            .map(|(_, s)| s.clone())
            .collect())
    }

    async fn create_subnet(&self, details: &CreateSubnetDetails) -> ApiResult<Subnet> {
        let mut state = self.record(Op::CreateSubnet)?;
        let table = RouteTable {
            id: ocid("routetable"),
            vcn_id: Some(details.vcn_id.clone()),
            route_rules: Vec::new(),
        };
        let subnet = Subnet {
            id: ocid("subnet"),
            display_name: details.display_name.clone(),
            vcn_id: details.vcn_id.clone(),
            route_table_id: table.id.clone(),
            cidr_block: Some(details.cidr_block.clone()),
        };
        state.route_tables.push(table);
        state
            .subnets
            .push((details.compartment_id.clone(), subnet.clone()));
        Ok(subnet)
    }

    async fn list_internet_gateways(
        &self,
        compartment_id: &str,
        vcn_id: &str,
    ) -> ApiResult<Vec<InternetGateway>> {
        let state = self.record(Op::ListInternetGateways)?;
        Ok(state
            .gateways
            .iter()
            .filter(|(c, g)| c == compartment_id && g.vcn_id == vcn_id)
            .map(|(_, g)| g.clone())
            .collect())
    }

    async fn create_internet_gateway(
        &self,
        details: &CreateInternetGatewayDetails,
    ) -> ApiResult<InternetGateway> {
        let mut state = self.record(Op::CreateInternetGateway)?;
        let gateway = InternetGateway {
            id: ocid("internetgateway"),
            vcn_id: details.vcn_id.clone(),
            display_name: Some(details.display_name.clone()),
            is_enabled: Some(details.is_enabled),
        };
        state
            .gateways
            .push((details.compartment_id.clone(), gateway.clone()));
        Ok(gateway)
    }

    async fn get_route_table(&self, route_table_id: &str) -> ApiResult<RouteTable> {
        let state = self.record(Op::GetRouteTable)?;
        state
            .route_tables
            .iter()
            .find(|t| t.id == route_table_id)
            .cloned()
            .ok_or_else(|| not_found("route table"))
    }

    async fn update_route_table(
        &self,
        route_table_id: &str,
        details: &UpdateRouteTableDetails,
    ) -> ApiResult<RouteTable> {
        let mut state = self.record(Op::UpdateRouteTable)?;
        let table = state
            .route_tables
            .iter_mut()
            .find(|t| t.id == route_table_id)
            .ok_or_else(|| not_found("route table"))?;
        table.route_rules = details.route_rules.clone();
        Ok(table.clone())
    }
}

#[async_trait]
impl RegistryApi for FakeCloud {
    async fn get_repository(&self, tenant_name: &str, repository_name: &str) -> ApiResult<()> {
        let state = self.record(Op::GetRepository)?;
        if state
            .repositories
            .iter()
            .any(|(t, r, _)| t == tenant_name && r == repository_name)
        {
            Ok(())
        } else {
            Err(not_found("repository"))
        }
    }

    async fn create_repository(
        &self,
        tenant_name: &str,
        repository_name: &str,
        details: &CreateRepositoryDetails,
    ) -> ApiResult<()> {
        let mut state = self.record(Op::CreateRepository)?;
        if state
            .repositories
            .iter()
            .any(|(t, r, _)| t == tenant_name && r == repository_name)
        {
            return Err(ApiError::service(409, "Conflict", "repository already exists"));
        }
        state.repositories.push((
            tenant_name.to_string(),
            repository_name.to_string(),
            details.is_public,
        ));
        Ok(())
    }
}

impl Connector for FakeCloud {
    type Client = FakeCloud;

    fn connect(&self, _session: &Session) -> Result<FakeCloud> {
        self.lock().connects += 1;
        Ok(self.clone())
    }
}
