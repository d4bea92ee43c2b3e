//! HTTP-level tests for the `/customers` endpoints.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_customer, customer_json, get, manager_token, post_json, put_json, tech_token,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_and_fetch_customer(pool: PgPool) {
    let app = common::build_test_app(pool);
    let id = create_customer(&app, "Jane", "Doe", "jane@x.com").await;

    let response = get(&app, &format!("/api/v1/customers/{id}"), &tech_token()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["firstName"], "Jane");
    assert_eq!(json["data"]["active"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_customer_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(&app, "/api/v1/customers/999999", &tech_token()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_customer_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let mut body = customer_json("Jane", "Doe", "not-an-email");
    body["state"] = serde_json::json!("Illinois");

    let response = post_json(&app, "/api/v1/customers", &tech_token(), body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("email"));
    assert!(message.contains("state"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_email_returns_409(pool: PgPool) {
    let app = common::build_test_app(pool);
    create_customer(&app, "Jane", "Doe", "jane@x.com").await;

    let response = post_json(
        &app,
        "/api/v1/customers",
        &manager_token(),
        customer_json("Janet", "Doe", "jane@x.com"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn technicians_can_edit_but_not_deactivate(pool: PgPool) {
    let app = common::build_test_app(pool);
    let id = create_customer(&app, "Jane", "Doe", "jane@x.com").await;
    let uri = format!("/api/v1/customers/{id}");

    let edited = put_json(&app, &uri, &tech_token(), serde_json::json!({ "city": "Shelbyville" })).await;
    assert_eq!(edited.status(), StatusCode::OK);
    assert_eq!(body_json(edited).await["data"]["city"], "Shelbyville");

    let refused = put_json(&app, &uri, &tech_token(), serde_json::json!({ "active": false })).await;
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);

    let deactivated =
        put_json(&app, &uri, &manager_token(), serde_json::json!({ "active": false })).await;
    assert_eq!(deactivated.status(), StatusCode::OK);
    assert_eq!(body_json(deactivated).await["data"]["active"], false);
}

// ---------------------------------------------------------------------------
// URL-driven listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_pages_with_url_state(pool: PgPool) {
    let app = common::build_test_app(pool);
    for (i, first) in ["Eve", "Cat", "Ann", "Dan", "Bob"].iter().enumerate() {
        create_customer(&app, first, "Lee", &format!("lee{i}@x.com")).await;
    }

    let response = get(&app, "/api/v1/customers?pageSize=2&page=3", &tech_token()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["totalCount"], 5);
    assert_eq!(json["data"]["totalPages"], 3);
    assert_eq!(json["data"]["data"][0]["firstName"], "Eve");

    let sorted = body_json(
        get(&app, "/api/v1/customers?sortBy=firstName&sortOrder=desc&pageSize=2", &tech_token()).await,
    )
    .await;
    assert_eq!(sorted["data"]["data"][0]["firstName"], "Eve");
    assert_eq!(sorted["data"]["data"][1]["firstName"], "Dan");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_by_search_and_active(pool: PgPool) {
    let app = common::build_test_app(pool);
    create_customer(&app, "Jane", "Doe", "jane@x.com").await;
    let john = create_customer(&app, "John", "Smith", "jsmith@y.com").await;
    put_json(
        &app,
        &format!("/api/v1/customers/{john}"),
        &manager_token(),
        serde_json::json!({ "active": false }),
    )
    .await;

    let active = body_json(get(&app, "/api/v1/customers?active=true", &tech_token()).await).await;
    assert_eq!(active["data"]["totalCount"], 1);
    assert_eq!(active["data"]["data"][0]["firstName"], "Jane");

    let searched = body_json(get(&app, "/api/v1/customers?search=smith", &tech_token()).await).await;
    assert_eq!(searched["data"]["totalCount"], 1);
    assert_eq!(searched["data"]["data"][0]["id"], john);

    let bad = get(&app, "/api/v1/customers?active=sometimes", &tech_token()).await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_is_refreshed_after_writes(pool: PgPool) {
    let app = common::build_test_app(pool);
    create_customer(&app, "Jane", "Doe", "jane@x.com").await;

    let before = body_json(get(&app, "/api/v1/customers", &tech_token()).await).await;
    assert_eq!(before["data"]["totalCount"], 1);

    create_customer(&app, "John", "Smith", "jsmith@y.com").await;

    let after = body_json(get(&app, "/api/v1/customers", &tech_token()).await).await;
    assert_eq!(after["data"]["totalCount"], 2);
}
