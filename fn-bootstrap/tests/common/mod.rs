//! Shared test utilities: a mock cloud HTTP server and throwaway keys.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fn_bootstrap::clients::Endpoints;
use reqwest::Url;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Generate an RSA key and return it base64 encoded PEM, as a request carries it.
pub fn encoded_private_key() -> String {
    let key = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("Failed to generate key");
    let pem = key
        .to_pkcs8_pem(LineEnding::LF)
        .expect("Failed to encode key");
    STANDARD.encode(pem.as_bytes())
}

/// A request as the mock server received it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Default)]
struct MockState {
    requests: Vec<Recorded>,
    vcns: Vec<Value>,
    subnets: Vec<Value>,
    gateways: Vec<Value>,
    route_tables: HashMap<String, Vec<Value>>,
    repositories: Vec<(String, String)>,
    next_id: usize,
}

impl MockState {
    fn id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("{kind}-{}", self.next_id)
    }
}

/// Mock core and registry API, one item per list page.
pub struct MockCloud {
    pub addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl MockCloud {
    pub async fn spawn() -> Self {
        let state = Arc::new(Mutex::new(MockState::default()));
        let router = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        Self {
            addr,
            state,
            shutdown_tx,
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(
            Url::parse(&format!("http://{}/20160918", self.addr)).unwrap(),
            Url::parse(&format!("http://{}/20180419/docker/repos", self.addr)).unwrap(),
        )
    }

    pub fn seed_vcn(&self, compartment_id: &str, name: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.id("vcn");
        state.vcns.push(json!({
            "id": id,
            "displayName": name,
            "compartmentId": compartment_id,
            "cidrBlock": "10.0.0.0/16",
            "lifecycleState": "AVAILABLE"
        }));
        id
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn route_rules(&self, route_table_id: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .route_tables
            .get(route_table_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_repository(&self, tenant: &str, name: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .repositories
            .iter()
            .any(|(t, n)| t == tenant && n == name)
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

fn parse_query(uri: &Uri) -> HashMap<String, String> {
    uri.query()
        .unwrap_or_default()
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [("opc-request-id", "req-404")],
        axum::Json(json!({"code": "NotAuthorizedOrNotFound", "message": "not found"})),
    )
        .into_response()
}

/// Serve one page of `items`, with the index of the next page in `opc-next-page`.
fn page(items: Vec<Value>, query: &HashMap<String, String>) -> Response {
    let index: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
    let body: Vec<Value> = items.iter().skip(index).take(1).cloned().collect();
    if index + 1 < items.len() {
        (
            [("opc-next-page", (index + 1).to_string())],
            axum::Json(body),
        )
            .into_response()
    } else {
        axum::Json(body).into_response()
    }
}

async fn handle(
    State(state): State<Arc<Mutex<MockState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let query = parse_query(&uri);
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let mut state = state.lock().unwrap();
    state.requests.push(Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        query: query.clone(),
        headers,
        body: body.clone(),
    });

    let segments: Vec<&str> = uri.path().trim_start_matches('/').split('/').collect();
    let filter = |item: &&Value, keys: &[(&str, &str)]| {
        keys.iter()
            .all(|(field, param)| query.get(*param).map(String::as_str) == item[*field].as_str())
    };

    match (method, segments.as_slice()) {
        (Method::GET, ["20160918", "vcns"]) => {
            let items = state
                .vcns
                .iter()
                .filter(|v| filter(v, &[("compartmentId", "compartmentId")]))
                .cloned()
                .collect();
            page(items, &query)
        }
        (Method::POST, ["20160918", "vcns"]) => {
            let id = state.id("vcn");
            let mut vcn = body;
            vcn["id"] = json!(id);
            state.vcns.push(vcn.clone());
            axum::Json(vcn).into_response()
        }
        (Method::GET, ["20160918", "subnets"]) => {
            let items = state
                .subnets
                .iter()
                .filter(|s| filter(s, &[("compartmentId", "compartmentId"), ("vcnId", "vcnId")]))
                .cloned()
                .collect();
            page(items, &query)
        }
        (Method::POST, ["20160918", "subnets"]) => {
            let id = state.id("subnet");
            let rt = state.id("rt");
            state.route_tables.insert(rt.clone(), Vec::new());
            let mut subnet = body;
            subnet["id"] = json!(id);
            subnet["routeTableId"] = json!(rt);
            state.subnets.push(subnet.clone());
            axum::Json(subnet).into_response()
        }
        (Method::GET, ["20160918", "internetGateways"]) => {
            let items = state
                .gateways
                .iter()
                .filter(|g| filter(g, &[("compartmentId", "compartmentId"), ("vcnId", "vcnId")]))
                .cloned()
                .collect();
            page(items, &query)
        }
        (Method::POST, ["20160918", "internetGateways"]) => {
            let id = state.id("ig");
            let mut gateway = body;
            gateway["id"] = json!(id);
            state.gateways.push(gateway.clone());
            axum::Json(gateway).into_response()
        }
        (Method::GET, ["20160918", "routeTables", id]) => match state.route_tables.get(*id) {
            Some(rules) => axum::Json(json!({"id": id, "routeRules": rules})).into_response(),
            None => not_found(),
        },
        (Method::PUT, ["20160918", "routeTables", id]) => {
            let id = id.to_string();
            if !state.route_tables.contains_key(&id) {
                return not_found();
            }
            let rules = body["routeRules"].as_array().cloned().unwrap_or_default();
            state.route_tables.insert(id.clone(), rules.clone());
            axum::Json(json!({"id": id, "routeRules": rules})).into_response()
        }
        (Method::GET, ["20180419", "docker", "repos", tenant, repo]) => {
            if state
                .repositories
                .iter()
                .any(|(t, r)| t.as_str() == *tenant && r.as_str() == *repo)
            {
                axum::Json(json!({"repository": repo})).into_response()
            } else {
                not_found()
            }
        }
        (Method::POST, ["20180419", "docker", "repos", tenant, repo]) => {
            let entry = (tenant.to_string(), repo.to_string());
            state.repositories.push(entry);
            axum::Json(json!({"repository": repo, "isPublic": body["isPublic"]})).into_response()
        }
        _ => not_found(),
    }
}
