//! Priced catalog entries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use wardmap_core::serde::deserialize_optional_i32;
use wardmap_core::{PaginationParams, SortOrder};

use crate::common::envelopes;
use crate::ids::{DepartmentId, ItemId};

/// `NUMERIC(12,2)` upper bound.
const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: ItemId,
    pub description: String,
    #[schema(value_type = String, example = "1250.00")]
    pub price: Decimal,
    pub department_id: Option<DepartmentId>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("price").with_message("price must not be negative".into()));
    }
    if price.scale() > 2 {
        return Err(
            ValidationError::new("price").with_message("price allows at most 2 decimals".into()),
        );
    }
    if *price > MAX_PRICE {
        return Err(ValidationError::new("price").with_message("price is too large".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateItemDto {
    #[validate(length(min = 1, max = 500), custom(function = "crate::common::not_blank"))]
    pub description: String,
    #[schema(value_type = String, example = "1250.00")]
    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
    pub department_id: Option<DepartmentId>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateItemDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 500), custom(function = "crate::common::not_blank"))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemSortBy {
    #[default]
    Id,
    Description,
    Price,
    CreatedAt,
}

impl ItemSortBy {
    pub fn column(self) -> &'static str {
        match self {
            ItemSortBy::Id => "id",
            ItemSortBy::Description => "description",
            ItemSortBy::Price => "price",
            ItemSortBy::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemFilterParams {
    /// Matches the description, case-insensitively
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i32")]
    pub department_id: Option<i32>,
    pub sort_by: Option<ItemSortBy>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

envelopes!(Item => ItemResponse, ItemListResponse);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dto(price: &str) -> CreateItemDto {
        CreateItemDto {
            description: "Chest X-ray".to_string(),
            price: Decimal::from_str(price).unwrap(),
            department_id: None,
        }
    }

    #[test]
    fn test_max_price() {
        assert_eq!(MAX_PRICE.to_string(), "9999999999.99");
    }

    #[test]
    fn test_price_rules() {
        assert!(dto("1250.00").validate().is_ok());
        assert!(dto("0").validate().is_ok());
        assert!(dto("-1").validate().is_err());
        assert!(dto("1.005").validate().is_err());
        assert!(dto("10000000000").validate().is_err());
    }

    #[test]
    fn test_price_deserializes_from_string_and_number() {
        let a: CreateItemDto =
            serde_json::from_str(r#"{"description":"Gauze","price":"12.50"}"#).unwrap();
        let b: CreateItemDto =
            serde_json::from_str(r#"{"description":"Gauze","price":12.5}"#).unwrap();
        assert_eq!(a.price, b.price);
    }
}
