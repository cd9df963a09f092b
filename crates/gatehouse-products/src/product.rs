//! Product model, storage mapping and schemas.

use gatehouse_core::{ObjectSchema, ValueSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::store::{Item, Key, StoreError, PARTITION_KEY, SORT_KEY};

/// Sort key shared by every product item.
pub const PRODUCT_TYPE: &str = "PRODUCT";

/// Client-supplied product fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    /// Display name.
    pub name: String,
    /// Unit price; always positive.
    pub price: f64,
    /// Catalog category.
    pub category: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A stored product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Generated identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: f64,
    /// Catalog category.
    pub category: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Product {
    /// Creates a product with a fresh time-ordered id.
    pub fn create(input: ProductInput) -> Self {
        Self::with_id(Uuid::now_v7().to_string(), input)
    }

    /// Creates a product with an existing id.
    pub fn with_id(id: String, input: ProductInput) -> Self {
        Self {
            id,
            name: input.name,
            price: input.price,
            category: input.category,
            description: input.description,
        }
    }

    /// The storage key for product `id`.
    pub fn key(id: &str) -> Key {
        Key::new(format!("{PRODUCT_TYPE}#{id}"), PRODUCT_TYPE)
    }

    /// Converts into a storage item with key attributes.
    pub fn to_item(&self) -> Result<Item, serde_json::Error> {
        let mut item = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            other => {
                return Err(serde::ser::Error::custom(format!(
                    "product serialized to {other}, expected an object"
                )))
            }
        };
        let key = Self::key(&self.id);
        item.insert(PARTITION_KEY.to_string(), Value::String(key.pk));
        item.insert(SORT_KEY.to_string(), Value::String(key.sk));
        Ok(item)
    }

    /// Reads a product back from a storage item; key attributes are ignored.
    pub fn from_item(mut item: Item) -> Result<Self, serde_json::Error> {
        item.remove(PARTITION_KEY);
        item.remove(SORT_KEY);
        serde_json::from_value(Value::Object(item))
    }
}

/// Error mapping an item that is not a product.
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    /// Storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The stored item is malformed.
    #[error("malformed product item: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Body schema for create and replace.
pub fn input_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field("name", ValueSchema::string().min_length(1).max_length(200))
        .field("price", ValueSchema::number().positive())
        .field("category", ValueSchema::string().min_length(1))
        .optional("description", ValueSchema::string().max_length(2000))
}

/// Response schema for one product.
pub fn product_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field("id", ValueSchema::string().min_length(1))
        .field("name", ValueSchema::string())
        .field("price", ValueSchema::number())
        .field("category", ValueSchema::string())
        .optional("description", ValueSchema::string())
}

/// Response schema for a product list.
pub fn product_list_schema() -> ValueSchema {
    ValueSchema::array(ValueSchema::object(product_schema()))
}

/// Path schema for `/products/:id`.
pub fn id_path_schema() -> ObjectSchema {
    ObjectSchema::new().field("id", ValueSchema::string().min_length(1))
}

/// Query schema for listing.
pub fn list_query_schema() -> ObjectSchema {
    ObjectSchema::new().optional("category", ValueSchema::string().min_length(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::validate;
    use serde_json::json;

    fn input() -> ProductInput {
        ProductInput {
            name: "Desk".to_string(),
            price: 120.0,
            category: "Furniture".to_string(),
            description: None,
        }
    }

    #[test]
    fn test_key_layout() {
        let key = Product::key("42");
        assert_eq!(key.pk, "PRODUCT#42");
        assert_eq!(key.sk, "PRODUCT");
    }

    #[test]
    fn test_item_mapping() {
        let product = Product::create(input());
        let item = product.to_item().unwrap();
        assert_eq!(item["pk"], format!("PRODUCT#{}", product.id));
        assert_eq!(item["sk"], "PRODUCT");
        assert!(!item.contains_key("description"));

        assert_eq!(Product::from_item(item).unwrap(), product);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Product::create(input());
        let b = Product::create(input());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_input_schema_reports_every_field() {
        let err = validate(&input_schema(), &json!({"price": 0})).unwrap_err();
        let paths: Vec<String> = err.issues().iter().map(|i| i.path_string()).collect();
        assert_eq!(paths, vec!["name", "price", "category"]);
    }

    #[test]
    fn test_product_schema_strips_storage_keys() {
        let parsed = validate(
            &product_schema(),
            &json!({"id": "1", "name": "Desk", "price": 1.5, "category": "F", "pk": "PRODUCT#1"}),
        )
        .unwrap();
        assert!(parsed.get("pk").is_none());
    }
}
