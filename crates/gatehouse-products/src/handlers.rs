//! Product route handlers.

use gatehouse_core::{RequestContext, RouteError, RouteResult, ValidRequest};
use gatehouse_middleware::Reply;
use serde_json::json;
use tracing::{debug, info};

use crate::product::{Product, ProductError, ProductInput, PRODUCT_TYPE};
use crate::store::{SharedStore, GSI1, SORT_KEY};

impl From<ProductError> for RouteError {
    fn from(error: ProductError) -> Self {
        RouteError::internal_with_source("product storage failed", error)
    }
}

fn valid(ctx: &RequestContext) -> RouteResult<&ValidRequest> {
    ctx.valid_request()
        .ok_or_else(|| RouteError::internal("route is missing request validation"))
}

fn product_id(ctx: &RequestContext) -> RouteResult<String> {
    valid(ctx)?
        .path_str("id")
        .map(str::to_string)
        .ok_or_else(|| RouteError::internal("validated path has no 'id'"))
}

async fn load(store: &SharedStore, id: &str) -> Result<Option<Product>, ProductError> {
    match store.get(&Product::key(id)).await? {
        Some(item) => Ok(Some(Product::from_item(item)?)),
        None => Ok(None),
    }
}

async fn save(store: &SharedStore, product: &Product) -> Result<(), ProductError> {
    store.put(product.to_item()?).await?;
    Ok(())
}

/// `POST /products`
pub async fn create_product(store: SharedStore, ctx: &mut RequestContext) -> RouteResult<Reply> {
    let input: ProductInput = valid(ctx)?.body_as()?;
    let product = Product::create(input);
    save(&store, &product).await?;

    info!(product_id = %product.id, category = %product.category, "product created");
    Reply::created(&product)
}

/// `GET /products`, optionally filtered by `?category=`.
pub async fn list_products(store: SharedStore, ctx: &mut RequestContext) -> RouteResult<Reply> {
    let category = valid(ctx)?
        .query_value("category")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let items = store
        .query_by_index(GSI1, SORT_KEY, PRODUCT_TYPE)
        .await
        .map_err(ProductError::from)?;

    let mut products = Vec::with_capacity(items.len());
    for item in items {
        let product = Product::from_item(item).map_err(ProductError::from)?;
        if category.as_deref().map_or(true, |c| c == product.category) {
            products.push(product);
        }
    }

    debug!(count = products.len(), category = ?category, "products listed");
    Reply::json(&products)
}

/// `GET /products/:id`
pub async fn get_product(store: SharedStore, ctx: &mut RequestContext) -> RouteResult<Reply> {
    let id = product_id(ctx)?;
    match load(&store, &id).await? {
        Some(product) => Reply::json(&product),
        None => Err(RouteError::not_found("Product not found")),
    }
}

/// `PUT /products/:id`, replacing every field except the id.
///
/// The product must already exist; a product deleted concurrently stays
/// deleted and the update answers 404.
pub async fn update_product(store: SharedStore, ctx: &mut RequestContext) -> RouteResult<Reply> {
    let id = product_id(ctx)?;
    let input: ProductInput = valid(ctx)?.body_as()?;

    let product = Product::with_id(id, input);
    let replaced = store
        .replace(product.to_item().map_err(ProductError::from)?)
        .await
        .map_err(ProductError::from)?;
    if !replaced {
        return Err(RouteError::not_found("Product not found"));
    }

    info!(product_id = %product.id, "product updated");
    Reply::json(&product)
}

/// `DELETE /products/:id`
pub async fn delete_product(store: SharedStore, ctx: &mut RequestContext) -> RouteResult<Reply> {
    let id = product_id(ctx)?;
    let removed = store
        .delete(&Product::key(&id))
        .await
        .map_err(ProductError::from)?;

    match removed {
        Some(_) => {
            info!(product_id = %id, "product deleted");
            Ok(Reply::no_content())
        }
        None => Err(RouteError::not_found("Product not found")),
    }
}

/// `GET /protected`; the `x-api-key` header is required by validation.
pub async fn protected(ctx: &mut RequestContext) -> RouteResult<Reply> {
    let api_key = valid(ctx)?
        .header_str("x-api-key")
        .ok_or_else(|| RouteError::internal("validated headers have no 'x-api-key'"))?;

    Reply::json(&json!({
        "message": "Access granted",
        "apiKey": api_key,
    }))
}
