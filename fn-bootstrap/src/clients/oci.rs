//! HTTP client for the network and registry services.

use async_trait::async_trait;
use reqwest::{Method, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::*;
use super::{Connector, NetworkApi, RegistryApi};
use crate::config::Topology;
use crate::error::{ApiError, ApiResult, BootstrapError, Result};
use crate::session::Session;
use crate::signer::RequestSigner;

const CORE_API_PATH: &str = "20160918";
const NEXT_PAGE_HEADER: &str = "opc-next-page";
const REQUEST_ID_HEADER: &str = "opc-request-id";

/// Base URLs of the core (networking) and registry services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub core: Url,
    pub registry: Url,
}

impl Endpoints {
    pub fn new(core: Url, registry: Url) -> Self {
        Self { core, registry }
    }

    /// Public core endpoint for a region, next to the given registry API base.
    pub fn for_region(region: &str, registry_base: &str) -> Result<Self> {
        let core = format!("https://iaas.{region}.oraclecloud.com/{CORE_API_PATH}");
        Ok(Self {
            core: Url::parse(&core)
                .map_err(|e| BootstrapError::Session(format!("invalid region {region:?}: {e}")))?,
            registry: Url::parse(registry_base).map_err(|e| {
                BootstrapError::Session(format!("invalid registry url {registry_base:?}: {e}"))
            })?,
        })
    }
}

/// Signed HTTP client for both services.
pub struct OciClient {
    http: reqwest::Client,
    signer: RequestSigner,
    endpoints: Endpoints,
}

impl OciClient {
    pub fn new(http: reqwest::Client, signer: RequestSigner, endpoints: Endpoints) -> Self {
        Self {
            http,
            signer,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> ApiResult<Response> {
        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| ApiError::Decode(format!("failed to encode request body: {e}")))?;

        let headers = self.signer.sign(&method, &url, payload.as_deref());
        debug!(%method, %url, "Calling cloud API");

        let mut request = self.http.request(method, url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if let Some(payload) = payload {
            request = request.body(payload);
        }

        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(service_error(response).await)
        }
    }

    async fn call<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> ApiResult<T> {
        Ok(self.send(method, url, body).await?.json().await?)
    }

    /// GET every page of a list call, in the order the service returns them.
    async fn list_all<T: DeserializeOwned>(&self, url: Url) -> ApiResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page: Option<String> = None;

        loop {
            let mut page_url = url.clone();
            if let Some(token) = &page {
                page_url.query_pairs_mut().append_pair("page", token);
            }

            let response = self.send::<()>(Method::GET, page_url, None).await?;
            let next = response
                .headers()
                .get(NEXT_PAGE_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string);
            let batch: Vec<T> = response.json().await?;
            items.extend(batch);

            match next {
                Some(token) => page = Some(token),
                None => return Ok(items),
            }
        }
    }
}

#[async_trait]
impl NetworkApi for OciClient {
    async fn list_vcns(&self, compartment_id: &str) -> ApiResult<Vec<Vcn>> {
        let url = endpoint(
            &self.endpoints.core,
            &["vcns"],
            &[("compartmentId", compartment_id)],
        )?;
        self.list_all(url).await
    }

    async fn create_vcn(&self, details: &CreateVcnDetails) -> ApiResult<Vcn> {
        let url = endpoint(&self.endpoints.core, &["vcns"], &[])?;
        self.call(Method::POST, url, Some(details)).await
    }

    async fn list_subnets(&self, compartment_id: &str, vcn_id: &str) -> ApiResult<Vec<Subnet>> {
        let url = endpoint(
            &self.endpoints.core,
            &["subnets"],
            &[("compartmentId", compartment_id), ("vcnId", vcn_id)],
        )?;
        self.list_all(url).await
    }

    async fn create_subnet(&self, details: &CreateSubnetDetails) -> ApiResult<Subnet> {
        let url = endpoint(&self.endpoints.core, &["subnets"], &[])?;
        self.call(Method::POST, url, Some(details)).await
    }

    async fn list_internet_gateways(
        &self,
        compartment_id: &str,
        vcn_id: &str,
    ) -> ApiResult<Vec<InternetGateway>> {
        let url = endpoint(
            &self.endpoints.core,
            &["internetGateways"],
            &[("compartmentId", compartment_id), ("vcnId", vcn_id)],
        )?;
        self.list_all(url).await
    }

    async fn create_internet_gateway(
        &self,
        details: &CreateInternetGatewayDetails,
    ) -> ApiResult<InternetGateway> {
        let url = endpoint(&self.endpoints.core, &["internetGateways"], &[])?;
        self.call(Method::POST, url, Some(details)).await
    }

    async fn get_route_table(&self, route_table_id: &str) -> ApiResult<RouteTable> {
        let url = endpoint(&self.endpoints.core, &["routeTables", route_table_id], &[])?;
        self.call::<_, ()>(Method::GET, url, None).await
    }

    async fn update_route_table(
        &self,
        route_table_id: &str,
        details: &UpdateRouteTableDetails,
    ) -> ApiResult<RouteTable> {
        let url = endpoint(&self.endpoints.core, &["routeTables", route_table_id], &[])?;
        self.call(Method::PUT, url, Some(details)).await
    }
}

#[async_trait]
impl RegistryApi for OciClient {
    async fn get_repository(&self, tenant_name: &str, repository_name: &str) -> ApiResult<()> {
        let url = endpoint(
            &self.endpoints.registry,
            &[tenant_name, repository_name],
            &[],
        )?;
        self.send::<()>(Method::GET, url, None).await?;
        Ok(())
    }

    async fn create_repository(
        &self,
        tenant_name: &str,
        repository_name: &str,
        details: &CreateRepositoryDetails,
    ) -> ApiResult<()> {
        let url = endpoint(
            &self.endpoints.registry,
            &[tenant_name, repository_name],
            &[],
        )?;
        self.send(Method::POST, url, Some(details)).await?;
        Ok(())
    }
}

/// Append escaped path segments and query pairs to a base URL.
fn endpoint(base: &Url, segments: &[&str], query: &[(&str, &str)]) -> ApiResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::Transport(format!("invalid base url: {base}")))?
        .pop_if_empty()
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

async fn service_error(response: Response) -> ApiError {
    let status = response.status();
    let request_id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: ErrorBody = response.json().await.unwrap_or_default();
    let code = if body.code.is_empty() {
        status.canonical_reason().unwrap_or("Unknown").to_string()
    } else {
        body.code
    };

    ApiError::Service {
        status: status.as_u16(),
        code,
        message: body.message,
        request_id,
    }
}

/// Connects sessions to the public service endpoints.
pub struct HttpConnector {
    http: reqwest::Client,
    registry_base: String,
    endpoints: Option<Endpoints>,
}

impl HttpConnector {
    pub fn new(topology: &Topology) -> Self {
        Self {
            http: reqwest::Client::new(),
            registry_base: topology.registry_api_base(),
            endpoints: None,
        }
    }

    /// Use fixed endpoints instead of deriving them from the session region.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }
}

impl Connector for HttpConnector {
    type Client = OciClient;

    fn connect(&self, session: &Session) -> Result<OciClient> {
        let signer = session.signer()?;
        let endpoints = match &self.endpoints {
            Some(endpoints) => endpoints.clone(),
            None => Endpoints::for_region(session.region(), &self.registry_base)?,
        };
        debug!(key_id = %signer.key_id(), core = %endpoints.core, "Connected session");
        Ok(OciClient::new(self.http.clone(), signer, endpoints))
    }
}
