//! `POST /allocations`: the allocation query over HTTP.
//!
//! The caller sends catalog credentials (and optionally filters) in the body
//! and gets back the same document the CLI writes to disk.

use crate::application::engine::AllocationEngine;
use crate::domain::catalog::{AllocationFilters, Credentials};
use crate::error::CatalogError;
use crate::interfaces::json::allocation_writer::AllocationWriter;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationsRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default)]
    pub filters: AllocationFilters,
}

pub fn router(engine: Arc<AllocationEngine>) -> Router {
    Router::new()
        .route("/allocations", post(allocations_handler))
        .with_state(engine)
}

async fn allocations_handler(
    State(engine): State<Arc<AllocationEngine>>,
    Json(request): Json<AllocationsRequest>,
) -> Response {
    match allocations_document(&engine, &request).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(username = %request.credentials.username, error = %e, "allocation query failed");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

async fn allocations_document(
    engine: &AllocationEngine,
    request: &AllocationsRequest,
) -> Result<Vec<u8>, CatalogError> {
    let enrichment = engine
        .allocations(&request.filters, &request.credentials)
        .await?;
    info!(
        username = %request.credentials.username,
        records = enrichment.records.len(),
        failures = enrichment.failures.len(),
        "allocations served"
    );
    let mut writer = AllocationWriter::new(Vec::new());
    writer.write_enrichment(&enrichment)?;
    Ok(writer.into_inner())
}
