//! HTTP API tests against the in-memory store

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use purchasing_backend::{create_app, store::MemoryStore, AppState, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    create_app(AppState::new(MemoryStore::new("PO"), Config::in_memory()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_item(app: &Router, code: &str, quantity: i64) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/items",
        Some(json!({
            "code": code,
            "name": format!("Barang {}", code),
            "category": "Umum",
            "quantity": quantity
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "connected");
    assert_eq!(body["environment"], "test");
}

#[tokio::test]
async fn test_catalog_listing_and_search() {
    let app = app();
    create_item(&app, "B002", 0).await;
    create_item(&app, "A001", 0).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/items", None).await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["A001", "B002"]);

    let (_, body) = send(&app, Method::GET, "/api/v1/items?search=b00", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_item_code_conflicts() {
    let app = app();
    create_item(&app, "A001", 0).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/items",
        Some(json!({ "code": "A001", "name": "Lagi", "category": "Umum" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_ENTRY");
}

#[tokio::test]
async fn test_full_receiving_flow() {
    let app = app();
    let item_id = create_item(&app, "A001", 10).await;

    let (status, order) = send(
        &app,
        Method::POST,
        "/api/v1/purchase-orders",
        Some(json!({
            "supplier": "PT Sumber Makmur",
            "order_date": "2024-12-01",
            "items": [{ "item_id": item_id, "quantity": 5 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", order);
    assert_eq!(order["completed"], false);
    assert_eq!(order["items"][0]["status"], "not_received");
    let order_id = order["id"].as_str().unwrap().to_string();
    let line = format!("/api/v1/purchase-orders/{}/items/{}", order_id, item_id);

    // Completing before anything arrived is refused
    let (status, body) = send(&app, Method::POST, &format!("{}/complete", line), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["message_id"],
        "Jumlah diterima dan tanggal kedatangan harus diisi"
    );

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("{}/received-quantity", line),
        Some(json!({ "received_quantity": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["status"], "partially_received");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("{}/arrival-date", line),
        Some(json!({ "date": "2024-12-05" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["status"], "ready_to_complete");
    assert_eq!(body["items"][0]["status_label"], "Siap Diselesaikan");

    let (status, body) = send(&app, Method::POST, &format!("{}/complete", line), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["item"]["quantity"], 15);
    assert_eq!(body["order"]["completed"], true);
    assert_eq!(body["order"]["items"][0]["status"], "completed");

    // Terminal from here on
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("{}/received-quantity", line),
        Some(json!({ "received_quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_STATE_TRANSITION");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/purchase-orders/{}", order_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_order_rejects_empty_supplier() {
    let app = app();
    let a = create_item(&app, "A001", 0).await;
    let b = create_item(&app, "B002", 0).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/purchase-orders",
        Some(json!({
            "supplier": "",
            "items": [
                { "item_id": a, "quantity": 1 },
                { "item_id": b, "quantity": 2 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "supplier");
    assert_eq!(body["error"]["message_id"], "Masukkan nama supplier");

    let (_, orders) = send(&app, Method::GET, "/api/v1/purchase-orders", None).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/purchase-orders/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

async fn create_order(app: &Router, item_id: &str) -> Value {
    let (status, order) = send(
        app,
        Method::POST,
        "/api/v1/purchase-orders",
        Some(json!({
            "supplier": "PT Sumber Makmur",
            "order_date": "2024-12-01",
            "items": [{ "item_id": item_id, "quantity": 5 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", order);
    order
}

#[tokio::test]
async fn test_malformed_input_uses_error_body() {
    let app = app();
    let item_id = create_item(&app, "A001", 0).await;
    let order = create_order(&app, &item_id).await;
    let line = format!(
        "/api/v1/purchase-orders/{}/items/{}",
        order["id"].as_str().unwrap(),
        item_id
    );

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("{}/received-quantity", line),
        Some(json!({ "received_quantity": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message_id"].is_string());

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("{}/arrival-date", line),
        Some(json!({ "date": "05/12/2024" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = send(&app, Method::GET, "/api/v1/purchase-orders/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_delete_order_with_stale_version_conflicts() {
    let app = app();
    let item_id = create_item(&app, "A001", 0).await;
    let order = create_order(&app, &item_id).await;
    let order_id = order["id"].as_str().unwrap();
    let stale = order["version"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/purchase-orders/{}/items/{}/received-quantity", order_id, item_id),
        Some(json!({ "received_quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/v1/purchase-orders/{}", order_id);
    let (status, body) = send(&app, Method::DELETE, &format!("{}?version={}", uri, stale), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("{}?version={}", uri, stale + 1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
