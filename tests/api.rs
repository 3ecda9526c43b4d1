//! End-to-end tests for the HTTP surface: an in-memory store behind the
//! real router, with the natural-language parser stubbed out.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use nonna::backend::{app, AppState};
use nonna::database::db::{migrate, queries};
use nonna::database::models::TransactionType;
use nonna::parser::{ParseError, ParsedTransaction, TransactionParser};

enum StubReply {
    Parsed(ParsedTransaction),
    Malformed,
}

struct StubParser(StubReply);

#[async_trait::async_trait]
impl TransactionParser for StubParser {
    async fn parse(
        &self,
        _text: &str,
        _categories: &[String],
    ) -> Result<ParsedTransaction, ParseError> {
        match &self.0 {
            StubReply::Parsed(p) => Ok(p.clone()),
            StubReply::Malformed => Err(ParseError::Malformed("not json".into())),
        }
    }
}

async fn test_app(parser: StubParser) -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate::run_migrations(&pool).await.unwrap();
    queries::seed_default_categories(&pool).await.unwrap();
    app(AppState { db: pool, parser: Arc::new(parser) })
}

fn stub_food_parser() -> StubParser {
    StubParser(StubReply::Parsed(ParsedTransaction {
        amount: Decimal::from_str_exact("8.45").unwrap(),
        description: "Starbucks".into(),
        category: "Food & Drink".into(),
        transaction_type: TransactionType::Expense,
    }))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(v) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&v).unwrap()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn category_id(app: &Router, name: &str) -> i64 {
    let (status, body) = send(app, Method::GET, "/api/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    body.as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == name)
        .unwrap()["id"]
        .as_i64()
        .unwrap()
}

fn starbucks(category_id: i64) -> Value {
    json!({
        "amount": 8.45,
        "description": "Starbucks",
        "transaction_type": "expense",
        "category_id": category_id,
        "date": "2024-01-01",
    })
}

#[tokio::test]
async fn health_endpoint_answers() {
    let app = test_app(stub_food_parser()).await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_then_get_returns_the_same_record() {
    let app = test_app(stub_food_parser()).await;
    let food = category_id(&app, "Food & Drink").await;

    let (status, created) =
        send(&app, Method::POST, "/api/transactions", Some(starbucks(food))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["amount"], json!(8.45));
    assert_eq!(created["description"], "Starbucks");
    assert_eq!(created["transaction_type"], "expense");
    assert_eq!(created["date"], "2024-01-01");
    assert_eq!(created["category"]["name"], "Food & Drink");
    assert!(created["created_at"].is_string());

    let id = created["id"].as_i64().unwrap();
    let (status, fetched) =
        send(&app, Method::GET, &format!("/api/transactions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn invalid_creates_are_rejected() {
    let app = test_app(stub_food_parser()).await;
    let food = category_id(&app, "Food & Drink").await;

    let mut zero_amount = starbucks(food);
    zero_amount["amount"] = json!(0);
    let (status, body) = send(&app, Method::POST, "/api/transactions", Some(zero_amount)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("amount"));

    let unknown_category = starbucks(9999);
    let (status, _) = send(&app, Method::POST, "/api/transactions", Some(unknown_category)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad_type = starbucks(food);
    bad_type["transaction_type"] = json!("transfer");
    let (status, _) = send(&app, Method::POST, "/api/transactions", Some(bad_type)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn missing_transaction_is_404_and_double_delete_fails() {
    let app = test_app(stub_food_parser()).await;
    let food = category_id(&app, "Food & Drink").await;

    let (status, _) = send(&app, Method::GET, "/api/transactions/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, created) = send(&app, Method::POST, "/api/transactions", Some(starbucks(food))).await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) =
        send(&app, Method::DELETE, &format!("/api/transactions/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) =
        send(&app, Method::DELETE, &format!("/api/transactions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_applies_a_partial_update() {
    let app = test_app(stub_food_parser()).await;
    let food = category_id(&app, "Food & Drink").await;
    let (_, created) = send(&app, Method::POST, "/api/transactions", Some(starbucks(food))).await;
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/transactions/{id}"),
        Some(json!({ "amount": 12.00 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["amount"], json!(12.0));
    assert_eq!(updated["description"], "Starbucks");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/transactions/9999",
        Some(json!({ "amount": 1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_embeds_categories_and_honors_filters() {
    let app = test_app(stub_food_parser()).await;
    let food = category_id(&app, "Food & Drink").await;
    let health = category_id(&app, "Health").await;

    send(&app, Method::POST, "/api/transactions", Some(starbucks(food))).await;
    let mut other = starbucks(health);
    other["description"] = json!("Pharmacy");
    other["date"] = json!("2024-02-01");
    send(&app, Method::POST, "/api/transactions", Some(other)).await;

    let (status, all) = send(&app, Method::GET, "/api/transactions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);
    // Newest date first.
    assert_eq!(all[0]["description"], "Pharmacy");

    let (_, filtered) = send(
        &app,
        Method::GET,
        &format!("/api/transactions?category_id={food}"),
        None,
    )
    .await;
    let filtered = filtered.as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["category"]["id"].as_i64().unwrap(), food);
}

#[tokio::test]
async fn analytics_summary_matches_the_store() {
    let app = test_app(stub_food_parser()).await;
    let food = category_id(&app, "Food & Drink").await;
    let income = category_id(&app, "Income").await;

    send(&app, Method::POST, "/api/transactions", Some(starbucks(food))).await;
    send(
        &app,
        Method::POST,
        "/api/transactions",
        Some(json!({
            "amount": 2500.0,
            "description": "Paycheck",
            "transaction_type": "income",
            "category_id": income,
            "date": "2024-01-02",
        })),
    )
    .await;

    let (status, summary) = send(&app, Method::GET, "/api/analytics/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_income"], json!(2500.0));
    assert_eq!(summary["total_expenses"], json!(8.45));
    assert_eq!(summary["net_balance"], json!(2491.55));

    let by_category = summary["by_category"].as_array().unwrap();
    assert_eq!(by_category.len(), 1);
    assert_eq!(by_category[0]["category_name"], "Food & Drink");
    assert_eq!(by_category[0]["total"], json!(8.45));
    assert_eq!(by_category[0]["percentage"], json!(100.0));
}

#[tokio::test]
async fn parse_endpoint_returns_the_structured_draft() {
    let app = test_app(stub_food_parser()).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/parse",
        Some(json!({ "text": "Starbucks $8.45" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["amount"], json!(8.45));
    assert_eq!(body["data"]["description"], "Starbucks");
    assert_eq!(body["data"]["category"], "Food & Drink");
    assert_eq!(body["data"]["transaction_type"], "expense");
}

#[tokio::test]
async fn parse_failure_is_a_structured_response_not_an_http_error() {
    let app = test_app(StubParser(StubReply::Malformed)).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/parse",
        Some(json!({ "text": "gibberish not a transaction" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].is_string());
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn referenced_category_cannot_be_deleted() {
    let app = test_app(stub_food_parser()).await;
    let food = category_id(&app, "Food & Drink").await;
    let health = category_id(&app, "Health").await;

    send(&app, Method::POST, "/api/transactions", Some(starbucks(food))).await;

    let (status, _) =
        send(&app, Method::DELETE, &format!("/api/categories/{food}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) =
        send(&app, Method::DELETE, &format!("/api/categories/{health}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn category_creation_enforces_unique_names() {
    let app = test_app(stub_food_parser()).await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/categories",
        Some(json!({ "name": "Travel", "color": "#0EA5E9" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Travel");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/categories",
        Some(json!({ "name": "Travel" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
