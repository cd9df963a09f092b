//! Product catalog scenarios driven through the full router.

use std::sync::{Arc, Mutex};

use gatehouse::{GatewayEvent, Route, Router};
use gatehouse_config::RouterConfig;
use gatehouse_middleware::{from_fn, handler_fn, ValidationConfig};
use gatehouse_products::{app, app_with_config, handlers, product, MemoryStore, Product, SharedStore};
use gatehouse_test::{TestClient, TestResponse};
use http::StatusCode;
use serde_json::{json, Value};

fn client() -> TestClient {
    TestClient::new(app(MemoryStore::shared()).unwrap())
}

async fn create(client: &TestClient, name: &str, price: f64, category: &str) -> Product {
    let response = client
        .post("/products")
        .json(&json!({ "name": name, "price": price, "category": category }))
        .send()
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json().unwrap()
}

fn ids(response: &TestResponse) -> Vec<String> {
    response
        .json::<Vec<Product>>()
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect()
}

#[tokio::test]
async fn test_negative_price_is_rejected() {
    let response = client()
        .post("/products")
        .json(&json!({"name": "Test Product", "price": -10, "category": "Test"}))
        .send()
        .await;

    response
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_error_kind("RequestValidationError");
    assert!(response.issue_paths().unwrap().contains(&json!(["price"])));
}

#[tokio::test]
async fn test_created_products_are_listed() {
    let client = client();
    let created = vec![
        create(&client, "Desk", 120.0, "Furniture").await,
        create(&client, "Lamp", 35.5, "Lighting").await,
        create(&client, "Monitor", 199.99, "Electronics").await,
    ];

    let response = client.get("/products").send().await;
    response.assert_status(StatusCode::OK);
    let listed: Vec<Product> = response.json().unwrap();

    for product in &created {
        assert!(!product.id.is_empty());
        let found = listed
            .iter()
            .find(|p| p.id == product.id)
            .unwrap_or_else(|| panic!("{} missing from list", product.name));
        assert_eq!(found.name, product.name);
        assert_eq!(found.price, product.price);
        assert_eq!(found.category, product.category);
    }
}

#[tokio::test]
async fn test_list_filters_by_category() {
    let client = client();
    let phone = create(&client, "Phone", 699.0, "Electronics").await;
    let laptop = create(&client, "Laptop", 1299.0, "Electronics").await;
    let chair = create(&client, "Chair", 89.0, "Furniture").await;

    let response = client
        .get("/products")
        .query("category", "Electronics")
        .send()
        .await;
    response.assert_status(StatusCode::OK);

    let listed = ids(&response);
    assert!(listed.contains(&phone.id));
    assert!(listed.contains(&laptop.id));
    assert!(!listed.contains(&chair.id));
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn test_protected_route_requires_api_key() {
    let client = client();

    let missing = client.get("/protected").send().await;
    missing
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_error_kind("RequestValidationError");
    assert_eq!(missing.issue_paths().unwrap(), vec![json!(["x-api-key"])]);

    let granted = client
        .get("/protected")
        .header("X-Api-Key", "s3cret")
        .send()
        .await;
    granted
        .assert_status(StatusCode::OK)
        .assert_json_field("apiKey", &json!("s3cret"));
}

#[tokio::test]
async fn test_middleware_sees_validated_response() {
    let store: SharedStore = MemoryStore::shared();
    let seeded = Product::create(gatehouse_products::ProductInput {
        name: "Desk".to_string(),
        price: 120.0,
        category: "Furniture".to_string(),
        description: None,
    });
    let mut item = seeded.to_item().unwrap();
    item.insert("internal_note".to_string(), json!("do not leak"));
    store.put(item).await.unwrap();

    let seen: Arc<Mutex<Option<Value>>> = Arc::default();
    let observer = {
        let seen = Arc::clone(&seen);
        from_fn("observer", move |ctx, next| {
            let seen = Arc::clone(&seen);
            Box::pin(async move {
                next.run(ctx).await?;
                *seen.lock().unwrap() = ctx.valid_response().map(|v| v.body().clone());
                Ok(())
            })
        })
    };

    let s = Arc::clone(&store);
    let router = Router::new()
        .route(
            Route::get(
                "/products/:id",
                handler_fn(move |ctx| Box::pin(handlers::get_product(Arc::clone(&s), ctx))),
            )
            .middleware(observer)
            .validate(
                ValidationConfig::new()
                    .path(product::id_path_schema())
                    .response_body(product::product_schema()),
            ),
        )
        .unwrap();

    let response = TestClient::new(router)
        .get(format!("/products/{}", seeded.id))
        .send()
        .await;
    response.assert_status(StatusCode::OK);

    let observed = seen.lock().unwrap().clone().unwrap();
    assert_eq!(observed, serde_json::to_value(&seeded).unwrap());
    assert_eq!(response.json::<Product>().unwrap(), seeded);
}

#[tokio::test]
async fn test_product_lifecycle() {
    let client = client();
    let desk = create(&client, "Desk", 120.0, "Furniture").await;
    let path = format!("/products/{}", desk.id);

    client
        .get(&path)
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_field("name", &json!("Desk"));

    let updated = client
        .put(&path)
        .json(&json!({"name": "Standing Desk", "price": 350.0, "category": "Furniture"}))
        .send()
        .await;
    updated
        .assert_status(StatusCode::OK)
        .assert_json_field("id", &json!(desk.id))
        .assert_json_field("name", &json!("Standing Desk"));

    let deleted = client.delete(&path).send().await;
    deleted.assert_status(StatusCode::NO_CONTENT);
    assert!(deleted.is_empty());

    client
        .get(&path)
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_json_eq(&json!({"error": "NotFoundError", "details": {"message": "Product not found"}}));
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let client = client();
    for response in [
        client.get("/products/nope").send().await,
        client.delete("/products/nope").send().await,
        client
            .put("/products/nope")
            .json(&json!({"name": "X", "price": 1, "category": "Y"}))
            .send()
            .await,
    ] {
        response
            .assert_status(StatusCode::NOT_FOUND)
            .assert_error_kind("NotFoundError");
    }
}

#[tokio::test]
async fn test_update_validates_body() {
    let client = client();
    let desk = create(&client, "Desk", 120.0, "Furniture").await;

    let response = client
        .put(format!("/products/{}", desk.id))
        .json(&json!({"name": "", "price": "free"}))
        .send()
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.issue_paths().unwrap(),
        vec![json!(["name"]), json!(["price"]), json!(["category"])]
    );
}

#[tokio::test]
async fn test_malformed_json_body() {
    let response = client().post("/products").body("{\"name\":").send().await;
    response
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_error_kind("RequestValidationError");
    assert_eq!(response.issue_paths().unwrap(), vec![json!([])]);
}

#[tokio::test]
async fn test_unknown_route() {
    let response = client().patch("/products/1").send().await;
    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_json_eq(&json!({"error": "NotFoundError"}));
}

#[tokio::test]
async fn test_gateway_round_trip() {
    let client = TestClient::new(
        app_with_config(MemoryStore::shared(), &RouterConfig::default()).unwrap(),
    );

    let event: GatewayEvent = serde_json::from_value(json!({
        "httpMethod": "POST",
        "path": "/products",
        "headers": {"Content-Type": "application/json"},
        "body": "{\"name\":\"Desk\",\"price\":120,\"category\":\"Furniture\"}",
        "isBase64Encoded": false
    }))
    .unwrap();

    let response = client.dispatch_gateway(event).await;
    assert_eq!(response.status_code, 201);
    assert_eq!(
        response.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
    let body: Value = serde_json::from_str(response.body.as_deref().unwrap()).unwrap();
    assert_eq!(body["name"], "Desk");
}
