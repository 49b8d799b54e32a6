// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use finapi::application::LedgerService;
use finapi::domain::TaxId;
use finapi::http::{router, AppState, TAX_ID_HEADER};
use finapi::storage::CustomerHandle;
use serde_json::Value;
use tower::ServiceExt;

/// Helper to create a service with one open account
pub fn service_with_customer(tax_id: TaxId, name: &str) -> Result<(LedgerService, CustomerHandle)> {
    let service = LedgerService::new();
    service.open(tax_id, name.to_string())?;
    let handle = service.lookup(tax_id)?;
    Ok((service, handle))
}

/// Router over a fresh, empty ledger
pub fn test_app() -> Router {
    router(AppState::new(LedgerService::new()))
}

/// Send one request through the router.
/// `cpf` sets the tax id header; `body` is sent as JSON when present.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cpf: Option<&str>,
    body: Option<Value>,
) -> Result<Response<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cpf) = cpf {
        builder = builder.header(TAX_ID_HEADER, cpf);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    };
    Ok(app.clone().oneshot(request).await?)
}

/// Send a raw body with no content-type header
pub async fn send_raw(app: &Router, uri: &str, cpf: &str, body: &str) -> Result<Response<Body>> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(TAX_ID_HEADER, cpf)
        .body(Body::from(body.to_string()))?;
    Ok(app.clone().oneshot(request).await?)
}

/// Decode a response body as JSON
pub async fn json_body(response: Response<Body>) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Open an account over HTTP and assert it succeeded
pub async fn open_account(app: &Router, cpf: TaxId, name: &str) -> Result<()> {
    let response = send(
        app,
        Method::POST,
        "/account",
        None,
        Some(serde_json::json!({ "cpf": cpf, "name": name })),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    Ok(())
}
