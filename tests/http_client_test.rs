mod common;

use allocation_tracker::application::engine::AllocationEngine;
use allocation_tracker::config::{DEFAULT_ACCEPT, EngineConfig, HttpConfig, RetryPolicy};
use allocation_tracker::domain::catalog::AllocationFilters;
use allocation_tracker::domain::ports::CatalogClient;
use allocation_tracker::domain::reference::GroupKind;
use allocation_tracker::error::CatalogError;
use allocation_tracker::infrastructure::http::HttpCatalogClient;
use allocation_tracker::infrastructure::moka_cache::MokaGroupCache;
use allocation_tracker::infrastructure::retry::RetryingCatalogClient;
use common::{StubCatalog, allocation_json, credentials};
use serde_json::json;
use std::time::Duration;

const ALLOCATIONS: &str = "/fuelsuite/allocation-tracker/allocations";
const TERMINAL_GROUP_7: &str = "/fuelsuite/allocation-tracker/suppliers/100/terminal-groups/7/terminals";

fn client(stub: &StubCatalog) -> HttpCatalogClient {
    HttpCatalogClient::new(HttpConfig {
        base_url: stub.base_url(),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_requests_carry_accept_and_credential_headers() {
    let stub = StubCatalog::start(vec![(ALLOCATIONS, 200, json!({ "data": [] }))]);

    let filters = AllocationFilters {
        at_seller_num: vec!["100".to_string(), "200".to_string()],
        ..Default::default()
    };
    let records = client(&stub)
        .fetch_allocations(&filters, &credentials())
        .await
        .unwrap();

    assert!(records.is_empty());
    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.path(), ALLOCATIONS);
    assert!(request.target.contains("atSellerNum=100&atSellerNum=200"));
    assert_eq!(request.header("accept"), Some(DEFAULT_ACCEPT));
    assert_eq!(request.header("webservicekey"), Some("wsk-1"));
    assert_eq!(request.header("apikey"), Some("api-1"));
    assert_eq!(request.header("username"), Some("alice"));
}

#[tokio::test]
async fn test_unknown_fields_survive_decoding() {
    let stub = StubCatalog::start(vec![(
        ALLOCATIONS,
        200,
        json!({ "data": [allocation_json("100", 7)] }),
    )]);

    let records = client(&stub)
        .fetch_allocations(&AllocationFilters::default(), &credentials())
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].supplier.seller_num, "100");
    assert_eq!(records[0].location.terminal_group_id(), Some(7));
    assert_eq!(records[0].extra["allocationPeriod"], "daily");
    assert_eq!(records[0].supplier.extra["name"], "Acme Fuels");
}

#[tokio::test]
async fn test_group_terminals_keep_string_ids() {
    let stub = StubCatalog::start(vec![(
        TERMINAL_GROUP_7,
        200,
        json!({ "data": [{ "id": "5", "name": "T5" }, { "id": "x", "name": "Bad" }] }),
    )]);

    let members = client(&stub)
        .fetch_terminal_group("100", 7, &credentials())
        .await
        .unwrap();

    assert_eq!(members[0].id.as_deref(), Some("5"));
    assert_eq!(members[1].id.as_deref(), Some("x"));
}

#[tokio::test]
async fn test_error_status_and_bad_body() {
    let stub = StubCatalog::start(vec![
        ("/fuelsuite/allocation-tracker/suppliers", 503, json!({})),
        (
            "/fuelsuite/allocation-tracker/suppliers/100/locations",
            200,
            json!("not an envelope"),
        ),
    ]);
    let client = client(&stub);

    let status = client.fetch_suppliers(&credentials()).await;
    assert!(matches!(status, Err(CatalogError::Status { status: 503, .. })));

    let decode = client.fetch_locations("100", &credentials()).await;
    assert!(matches!(decode, Err(CatalogError::Decode(_))));

    let missing = client
        .fetch_product_group("100", 3, GroupKind::ProductFamily, &credentials())
        .await;
    assert!(matches!(missing, Err(CatalogError::Status { status: 404, .. })));
}

#[tokio::test]
async fn test_retry_wrapper_repeats_transient_statuses() {
    let stub = StubCatalog::start(vec![(
        "/fuelsuite/allocation-tracker/suppliers",
        500,
        json!({}),
    )]);
    let client = RetryingCatalogClient::new(
        client(&stub),
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        },
    );

    let result = client.fetch_suppliers(&credentials()).await;

    assert!(result.is_err());
    assert_eq!(stub.hits("/fuelsuite/allocation-tracker/suppliers"), 3);
}

#[tokio::test]
async fn test_engine_over_http_makes_one_group_call() {
    let stub = StubCatalog::start(vec![
        (
            ALLOCATIONS,
            200,
            json!({ "data": [allocation_json("100", 7), allocation_json("100", 7)] }),
        ),
        (
            TERMINAL_GROUP_7,
            200,
            json!({ "data": [{ "id": "5", "name": "T5" }] }),
        ),
    ]);
    let engine = AllocationEngine::new(
        Box::new(client(&stub)),
        Box::new(MokaGroupCache::default()),
        EngineConfig::default(),
    );

    let result = engine
        .allocations(&AllocationFilters::default(), &credentials())
        .await
        .unwrap();

    assert!(result.is_complete());
    for r in &result.records {
        let terminals = r.location.all_terminals();
        assert_eq!(terminals.len(), 1);
        assert_eq!(terminals[0].id, 5);
        assert_eq!(terminals[0].name.as_deref(), Some("T5"));
    }
    assert_eq!(stub.hits(TERMINAL_GROUP_7), 1);
}
