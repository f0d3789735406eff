//! Catalog browsing.

use crate::error::ApiResult;
use crate::state::AppState;
use atelier_core::{CatalogQuery, Currency, Product, ProductCatalog, RateTable, StoreError, StoreResult};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

/// `?currency=USD`
#[derive(Debug, Default, Deserialize)]
pub struct CurrencyQuery {
    #[serde(default)]
    pub currency: Option<Currency>,
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
    /// Currency the prices are shown in
    pub currency: Currency,
}

/// Show prices in `currency`. Filtering and sorting stay on the base price.
pub(crate) fn localize(products: &mut [Product], rates: &RateTable, currency: Option<Currency>) -> StoreResult<()> {
    let Some(currency) = currency else {
        return Ok(());
    };
    for product in products {
        product.price = rates.convert(&product.price, currency)?;
    }
    Ok(())
}

/// Active product by id or slug
pub(crate) fn find_active<'a>(catalog: &'a ProductCatalog, id_or_slug: &str) -> StoreResult<&'a Product> {
    catalog
        .get(id_or_slug)
        .or_else(|| catalog.get_by_slug(id_or_slug))
        .filter(|p| p.active)
        .ok_or_else(|| StoreError::ProductNotFound {
            product_id: id_or_slug.to_string(),
        })
}

/// List active products with filters, sorting and pagination
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<ProductList>> {
    let catalog = state.catalog().await?;
    let mut page = catalog.search(&query);

    let rates = state.rate_table().await;
    localize(&mut page.products, &rates, query.currency)?;

    Ok(Json(ProductList {
        products: page.products,
        total: page.total,
        page: page.page,
        per_page: page.per_page,
        currency: query.currency.unwrap_or(rates.base),
    }))
}

/// Get a product by id or slug
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Query(query): Query<CurrencyQuery>,
) -> ApiResult<Json<Product>> {
    let catalog = state.catalog().await?;
    let mut product = find_active(&catalog, &product_id)?.clone();

    let rates = state.rate_table().await;
    localize(std::slice::from_mut(&mut product), &rates, query.currency)?;

    Ok(Json(product))
}
