//! # Gatehouse Products
//!
//! A product catalog served through a Gatehouse [`Router`]. Products live in
//! a [`KeyValueStore`] under the composite key
//! `{pk: "PRODUCT#<id>", sk: "PRODUCT"}`; listing goes through the inverted
//! `GSI1` index.
//!
//! | Route | Validation | Success |
//! |---|---|---|
//! | `POST /products` | body, response | `201` product |
//! | `GET /products` | query `category?`, response list | `200` products |
//! | `GET /products/:id` | path, response | `200` product |
//! | `PUT /products/:id` | path, body, response | `200` product |
//! | `DELETE /products/:id` | path | `204` |
//! | `GET /protected` | header `x-api-key` | `200` |
//!
//! ```
//! use gatehouse_products::{app, MemoryStore};
//! use gatehouse_core::Event;
//! use http::{Method, StatusCode};
//! use serde_json::json;
//!
//! let router = app(MemoryStore::shared()).unwrap();
//! # tokio_test::block_on(async {
//! let created = router
//!     .dispatch(Event::new(Method::POST, "/products").with_json(json!({
//!         "name": "Desk", "price": 120.0, "category": "Furniture"
//!     })))
//!     .await;
//! assert_eq!(created.status(), StatusCode::CREATED);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/gatehouse-products/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod access_log;
pub mod handlers;
pub mod product;
pub mod store;

use std::sync::Arc;

use gatehouse::{Route, Router};
use gatehouse_config::RouterConfig;
use gatehouse_core::{ObjectSchema, ValueSchema};
use gatehouse_middleware::{handler_fn, BoxedMiddleware, ValidationConfig};
use gatehouse_router::PatternError;

pub use access_log::AccessLog;
pub use product::{Product, ProductInput};
pub use store::{Key, KeyValueStore, MemoryStore, SharedStore, StoreError};

/// Builds the product router with default settings.
pub fn app(store: SharedStore) -> Result<Router, PatternError> {
    app_with_config(store, &RouterConfig::default())
}

/// Builds the product router with the given router settings.
pub fn app_with_config(store: SharedStore, config: &RouterConfig) -> Result<Router, PatternError> {
    let access_log: BoxedMiddleware = Arc::new(AccessLog);
    let mut router = Router::from_config(config);

    let s = Arc::clone(&store);
    router.register(
        Route::post(
            "/products",
            handler_fn(move |ctx| Box::pin(handlers::create_product(Arc::clone(&s), ctx))),
        )
        .boxed_middleware(Arc::clone(&access_log))
        .validate(
            ValidationConfig::new()
                .body(product::input_schema())
                .response_body(product::product_schema()),
        ),
    )?;

    let s = Arc::clone(&store);
    router.register(
        Route::get(
            "/products",
            handler_fn(move |ctx| Box::pin(handlers::list_products(Arc::clone(&s), ctx))),
        )
        .boxed_middleware(Arc::clone(&access_log))
        .validate(
            ValidationConfig::new()
                .query(product::list_query_schema())
                .response_body(product::product_list_schema()),
        ),
    )?;

    let s = Arc::clone(&store);
    router.register(
        Route::get(
            "/products/:id",
            handler_fn(move |ctx| Box::pin(handlers::get_product(Arc::clone(&s), ctx))),
        )
        .boxed_middleware(Arc::clone(&access_log))
        .validate(
            ValidationConfig::new()
                .path(product::id_path_schema())
                .response_body(product::product_schema()),
        ),
    )?;

    let s = Arc::clone(&store);
    router.register(
        Route::put(
            "/products/:id",
            handler_fn(move |ctx| Box::pin(handlers::update_product(Arc::clone(&s), ctx))),
        )
        .boxed_middleware(Arc::clone(&access_log))
        .validate(
            ValidationConfig::new()
                .path(product::id_path_schema())
                .body(product::input_schema())
                .response_body(product::product_schema()),
        ),
    )?;

    let s = Arc::clone(&store);
    router.register(
        Route::delete(
            "/products/:id",
            handler_fn(move |ctx| Box::pin(handlers::delete_product(Arc::clone(&s), ctx))),
        )
        .boxed_middleware(Arc::clone(&access_log))
        .validate(ValidationConfig::new().path(product::id_path_schema())),
    )?;

    router.register(
        Route::get(
            "/protected",
            handler_fn(|ctx| Box::pin(handlers::protected(ctx))),
        )
        .boxed_middleware(access_log)
        .validate(ValidationConfig::new().headers(
            ObjectSchema::new().field("x-api-key", ValueSchema::string().min_length(1)),
        )),
    )?;

    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_route_table() {
        let router = app(MemoryStore::shared()).unwrap();
        let routes: Vec<(Method, String)> = router
            .routes()
            .map(|(m, p)| (m.clone(), p.to_string()))
            .collect();

        assert_eq!(
            routes,
            vec![
                (Method::POST, "/products".to_string()),
                (Method::GET, "/products".to_string()),
                (Method::GET, "/products/:id".to_string()),
                (Method::PUT, "/products/:id".to_string()),
                (Method::DELETE, "/products/:id".to_string()),
                (Method::GET, "/protected".to_string()),
            ]
        );
    }
}
