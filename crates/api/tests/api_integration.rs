//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::ProductId;
use inventory::InMemoryStockLedger;
use invoice_store::InMemoryInvoiceStore;
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, InMemoryStockLedger) {
    let ledger = InMemoryStockLedger::new();
    let state = api::create_default_state(
        Arc::new(InMemoryInvoiceStore::new()),
        Arc::new(ledger.clone()),
    );
    (api::create_app(state, get_metrics_handle()), ledger)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn create_invoice(app: &axum::Router, lines: &[(ProductId, i64)]) -> (StatusCode, Value) {
    let items: Vec<Value> = lines
        .iter()
        .map(|(id, quantity)| json!({ "productId": id.to_string(), "quantity": quantity }))
        .collect();
    send(app, post_json("/invoices", json!({ "items": items }))).await
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();

    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_invoice() {
    let (app, ledger) = setup();
    let a = ledger.add_product("Keyboard", dec!(49.90), 5).await;

    let (status, json) = create_invoice(&app, &[(a, 2)]).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "Open");
    assert!(json["number"].as_i64().is_some());
    assert!(json["issuedAt"].as_str().is_some());
    assert_eq!(json["items"][0]["productId"], a.to_string());
    assert_eq!(json["items"][0]["quantity"], 2);
    assert_eq!(json["items"][0]["unitPrice"], "49.90");
    assert_eq!(json["totalAmount"], "99.80");
}

#[tokio::test]
async fn test_create_invoice_errors() {
    let (app, ledger) = setup();
    let a = ledger.add_product("A", dec!(1), 2).await;

    let (status, json) = send(&app, post_json("/invoices", json!({ "items": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some());

    let (status, _) = send(
        &app,
        post_json(
            "/invoices",
            json!({ "items": [{ "productId": "not-a-uuid", "quantity": 1 }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = create_invoice(&app, &[(ProductId::new(), 1)]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = create_invoice(&app, &[(a, 0)]).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = create_invoice(&app, &[(a, 3)]).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains(&a.to_string()));

    ledger.set_unavailable(true).await;
    let (status, _) = create_invoice(&app, &[(a, 1)]).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_get_invoice() {
    let (app, ledger) = setup();
    let a = ledger.add_product("A", dec!(1), 2).await;
    let (_, created) = create_invoice(&app, &[(a, 1)]).await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = send(&app, get(&format!("/invoices/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], id);
    assert_eq!(json["number"], created["number"]);

    let (status, _) = send(&app, get(&format!("/invoices/{}", uuid::Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/invoices/garbage")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_print_closes_invoice() {
    let (app, ledger) = setup();
    let a = ledger.add_product("Keyboard", dec!(10), 5).await;
    let b = ledger.add_product("Mouse", dec!(5), 4).await;
    let (_, created) = create_invoice(&app, &[(a, 2), (b, 1)]).await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = send(&app, post_empty(&format!("/invoices/{id}/print"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "Closed");
    assert_eq!(json["items"][0]["productName"], "Keyboard");
    assert_eq!(json["items"][1]["productName"], "Mouse");
    assert_eq!(json["items"][1]["unitPrice"], "5");
    assert_eq!(ledger.balance(a).await, Some(3));
    assert_eq!(ledger.balance(b).await, Some(3));

    let (status, json) = send(&app, post_empty(&format!("/invoices/{id}/print"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_print_failure_cancels_invoice() {
    let (app, ledger) = setup();
    let a = ledger.add_product("A", dec!(1), 5).await;
    let b = ledger.add_product("B", dec!(1), 10).await;
    let (_, created) = create_invoice(&app, &[(a, 3), (b, 10)]).await;
    let id = created["id"].as_str().unwrap();
    ledger.set_balance(b, 2).await;

    let (status, json) = send(&app, post_empty(&format!("/invoices/{id}/print"))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains(&b.to_string()));
    assert_eq!(ledger.balance(a).await, Some(5));

    let (_, json) = send(&app, get(&format!("/invoices/{id}"))).await;
    assert_eq!(json["status"], "Cancelled");
}

#[tokio::test]
async fn test_print_with_deleted_product_is_conflict() {
    let (app, ledger) = setup();
    let a = ledger.add_product("A", dec!(1), 5).await;
    let (_, created) = create_invoice(&app, &[(a, 1)]).await;
    let id = created["id"].as_str().unwrap();
    ledger.remove_product(a).await;

    let (status, _) = send(&app, post_empty(&format!("/invoices/{id}/print"))).await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_print_transport_failure_is_unavailable() {
    let (app, ledger) = setup();
    let a = ledger.add_product("A", dec!(1), 5).await;
    let (_, created) = create_invoice(&app, &[(a, 1)]).await;
    let id = created["id"].as_str().unwrap();
    ledger.set_unavailable(true).await;

    let (status, json) = send(&app, post_empty(&format!("/invoices/{id}/print"))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["error"].as_str().is_some());

    ledger.set_unavailable(false).await;
    let (_, json) = send(&app, get(&format!("/invoices/{id}"))).await;
    assert_eq!(json["status"], "Cancelled");
}

#[tokio::test]
async fn test_print_unknown_invoice() {
    let (app, _) = setup();

    let (status, _) = send(
        &app,
        post_empty(&format!("/invoices/{}/print", uuid::Uuid::new_v4())),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_invoices_by_status() {
    let (app, ledger) = setup();
    let a = ledger.add_product("A", dec!(1), 10).await;
    let (_, first) = create_invoice(&app, &[(a, 1)]).await;
    let (_, second) = create_invoice(&app, &[(a, 1)]).await;
    let first_id = first["id"].as_str().unwrap();
    send(&app, post_empty(&format!("/invoices/{first_id}/print"))).await;

    let (status, all) = send(&app, get("/invoices")).await;
    assert_eq!(status, StatusCode::OK);
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["id"], first["id"]);

    let (_, open) = send(&app, get("/invoices?status=Open")).await;
    let open = open.as_array().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0]["id"], second["id"]);

    let (_, closed) = send(&app, get("/invoices?status=closed")).await;
    assert_eq!(closed.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, get("/invoices?status=Shipped")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, ledger) = setup();
    let a = ledger.add_product("A", dec!(1), 10).await;
    let (_, created) = create_invoice(&app, &[(a, 1)]).await;
    let id = created["id"].as_str().unwrap();
    send(&app, post_empty(&format!("/invoices/{id}/print"))).await;

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("invoice_print_total"));
    assert!(text.contains("invoices_issued_total"));
}
