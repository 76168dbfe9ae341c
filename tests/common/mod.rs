#![allow(dead_code)]

use allocation_tracker::domain::allocation::{
    AllocationProduct, AllocationRecord, CatalogGroup, Location, ProductAllocation, Supplier,
};
use allocation_tracker::domain::catalog::Credentials;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use tokio::net::TcpListener;

pub fn credentials() -> Credentials {
    Credentials::new("wsk-1", "api-1", "alice")
}

pub fn record(seller: &str, terminal_group: Option<i64>, family: Option<i64>) -> AllocationRecord {
    AllocationRecord {
        supplier: Supplier {
            seller_num: seller.to_string(),
            ..Default::default()
        },
        location: Location {
            terminal_group: terminal_group.map(CatalogGroup::with_id),
            ..Default::default()
        },
        product_allocation_list: vec![ProductAllocation {
            allocation_product: AllocationProduct {
                product_family: family.map(CatalogGroup::with_id),
                ..Default::default()
            },
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// Allocation JSON as the catalog returns it.
pub fn allocation_json(seller: &str, terminal_group: i64) -> Value {
    json!({
        "supplier": { "sellerNum": seller, "name": "Acme Fuels" },
        "location": { "terminalGroup": { "id": terminal_group, "name": "North" } },
        "productAllocationList": [],
        "allocationPeriod": "daily"
    })
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub target: String,
    pub headers: HashMap<String, String>,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

#[derive(Clone)]
struct StubState {
    routes: Arc<HashMap<String, (StatusCode, Value)>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Catalog stub: an axum router on its own runtime thread, so both blocking
/// and async tests can use it.
///
/// Routes match on the path (query ignored); anything else answers 404.
pub struct StubCatalog {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubCatalog {
    pub fn start(routes: Vec<(&str, u16, Value)>) -> Self {
        let state = StubState {
            routes: Arc::new(
                routes
                    .into_iter()
                    .map(|(path, status, body)| {
                        (path.to_string(), (StatusCode::from_u16(status).unwrap(), body))
                    })
                    .collect(),
            ),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let requests = state.requests.clone();
        let app = Router::new().fallback(record_and_reply).with_state(state);

        let (addr_tx, addr_rx) = mpsc::channel();
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
                addr_tx.send(listener.local_addr().unwrap()).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });

        Self {
            addr: addr_rx.recv().unwrap(),
            requests,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/fuelsuite/", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path() == path).count()
    }
}

async fn record_and_reply(State(state): State<StubState>, request: Request) -> Response {
    let uri = request.uri();
    let target = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string());
    let headers = request
        .headers()
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    let recorded = RecordedRequest { target, headers };

    let (status, body) = state
        .routes
        .get(recorded.path())
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, json!({})));
    state.requests.lock().unwrap().push(recorded);
    (status, Json(body)).into_response()
}
