//! Public catalog handlers: product listing with filters, search,
//! product detail, categories. Everything here is read-only and only
//! ever shows active records.

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::json;

use kirana_core::validation;
use kirana_db::{ProductFilter, ProductSort};

use crate::error::ApiError;
use crate::response::{ok, Reply};
use crate::AppState;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    /// Price band bounds, in cents.
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    /// `price_low` | `price_high` | `rating` | anything else = newest.
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProductListQuery {
    fn into_filter(self) -> (ProductFilter, ProductSort, u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let sort = ProductSort::from_key(self.sort.as_deref());

        let filter = ProductFilter {
            category_id: self.category,
            subcategory: self.subcategory,
            brand: self.brand,
            min_price_cents: self.min_price,
            max_price_cents: self.max_price,
            featured_only: self.featured.unwrap_or(false),
            search: self.search.filter(|s| !s.trim().is_empty()),
        };

        (filter, sort, page, limit)
    }
}

/// `GET /api/products`
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Reply, ApiError> {
    let (filter, sort, page, limit) = query.into_filter();

    let result = state.db.products().list(&filter, sort, page, limit).await?;
    let total_pages = (result.total as u32).div_ceil(limit);

    Ok(ok(json!({
        "products": result.products,
        "pagination": {
            "total": result.total,
            "page": page,
            "limit": limit,
            "totalPages": total_pages,
        },
    })))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// `GET /api/products/search?q=` - 400 when the query is missing.
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Reply, ApiError> {
    let Some(q) = query.q else {
        return Err(ApiError::validation("Search query is required"));
    };
    let q = validation::validate_search_query(&q)?;

    let list_query = ProductListQuery {
        search: Some(q),
        page: query.page,
        limit: query.limit,
        ..Default::default()
    };
    list_products(State(state), Query(list_query)).await
}

/// `GET /api/products/:id` - soft-deleted products read as absent.
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Reply, ApiError> {
    let product = state
        .db
        .products()
        .get_active(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;

    Ok(ok(json!({ "product": product })))
}

/// `GET /api/categories`
pub async fn list_categories(State(state): State<AppState>) -> Result<Reply, ApiError> {
    let categories = state.db.categories().list().await?;
    Ok(ok(json!({ "categories": categories })))
}

/// `GET /api/categories/:id`
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Reply, ApiError> {
    let category = state
        .db
        .categories()
        .get(&id)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| ApiError::not_found("Category"))?;

    Ok(ok(json!({ "category": category })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{seed_category, seed_product, test_state};

    #[tokio::test]
    async fn test_list_products_pagination() {
        let state = test_state().await;
        let category = seed_category(&state).await;
        for _ in 0..3 {
            seed_product(&state, &category.id, 10_000, 5).await;
        }

        let query = ProductListQuery {
            limit: Some(2),
            ..Default::default()
        };
        let (_, body) = list_products(State(state), Query(query)).await.unwrap();
        let data = body.0.data.unwrap();

        assert_eq!(data["products"].as_array().unwrap().len(), 2);
        assert_eq!(data["pagination"]["total"], 3);
        assert_eq!(data["pagination"]["totalPages"], 2);
    }

    #[tokio::test]
    async fn test_price_band_filter() {
        let state = test_state().await;
        let category = seed_category(&state).await;
        seed_product(&state, &category.id, 5_000, 5).await;
        seed_product(&state, &category.id, 50_000, 5).await;

        let query = ProductListQuery {
            min_price: Some(10_000),
            ..Default::default()
        };
        let (_, body) = list_products(State(state), Query(query)).await.unwrap();
        let data = body.0.data.unwrap();

        assert_eq!(data["pagination"]["total"], 1);
        assert_eq!(data["products"][0]["priceCents"], 50_000);
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let state = test_state().await;

        let err = search_products(
            State(state),
            Query(SearchQuery {
                q: None,
                page: None,
                limit: None,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_get_product_hides_soft_deleted() {
        let state = test_state().await;
        let category = seed_category(&state).await;
        let product = seed_product(&state, &category.id, 10_000, 5).await;

        assert!(get_product(State(state.clone()), Path(product.id.clone()))
            .await
            .is_ok());

        state.db.products().soft_delete(&product.id).await.unwrap();

        let err = get_product(State(state), Path(product.id)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
