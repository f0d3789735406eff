//! # Cart
//!
//! Shopping cart held per customer. The frontend keeps a copy in local
//! storage; the server copy is the one checkout prices from.

use crate::error::{StoreError, StoreResult};
use crate::product::{Currency, Price, ProductCatalog};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Most units of one product/variant a single cart line may hold
pub const MAX_LINE_QUANTITY: u32 = 10;

/// A line in the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    /// Ring size, chain length, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            variant: None,
            quantity,
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    fn same_line(&self, product_id: &str, variant: Option<&str>) -> bool {
        self.product_id == product_id && self.variant.as_deref() == variant
    }
}

/// A customer's cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub customer_id: String,
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            items: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Add an item, merging with an existing line for the same product and variant
    pub fn add(&mut self, item: CartItem) -> StoreResult<()> {
        if item.quantity == 0 {
            return Err(StoreError::InvalidRequest("quantity must be at least 1".to_string()));
        }

        let existing = self
            .items
            .iter_mut()
            .find(|i| i.same_line(&item.product_id, item.variant.as_deref()));

        match existing {
            Some(line) => {
                let quantity = line.quantity + item.quantity;
                check_line_quantity(quantity)?;
                line.quantity = quantity;
            }
            None => {
                check_line_quantity(item.quantity)?;
                self.items.push(item);
            }
        }
        self.touch();
        Ok(())
    }

    /// Set a line's quantity; zero removes the line
    pub fn set_quantity(&mut self, product_id: &str, variant: Option<&str>, quantity: u32) -> StoreResult<()> {
        if quantity == 0 {
            return self.remove(product_id, variant);
        }
        check_line_quantity(quantity)?;

        let line = self
            .items
            .iter_mut()
            .find(|i| i.same_line(product_id, variant))
            .ok_or_else(|| StoreError::ProductNotFound {
                product_id: product_id.to_string(),
            })?;
        line.quantity = quantity;
        self.touch();
        Ok(())
    }

    /// Remove a line
    pub fn remove(&mut self, product_id: &str, variant: Option<&str>) -> StoreResult<()> {
        let before = self.items.len();
        self.items.retain(|i| !i.same_line(product_id, variant));
        if self.items.len() == before {
            return Err(StoreError::ProductNotFound {
                product_id: product_id.to_string(),
            });
        }
        self.touch();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    /// Replace all lines (client sync). Lines are merged and validated like `add`.
    pub fn replace_items(&mut self, items: Vec<CartItem>) -> StoreResult<()> {
        let mut next = Cart::new(self.customer_id.clone());
        for item in items {
            next.add(item)?;
        }
        self.items = next.items;
        self.touch();
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Price every line from the catalog.
    ///
    /// Client-side prices are never trusted; this is what checkout charges.
    pub fn price(&self, catalog: &ProductCatalog) -> StoreResult<PricedCart> {
        price_items(&self.items, catalog)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn check_line_quantity(quantity: u32) -> StoreResult<()> {
    if quantity > MAX_LINE_QUANTITY {
        return Err(StoreError::InvalidRequest(format!(
            "at most {} of one item per order",
            MAX_LINE_QUANTITY
        )));
    }
    Ok(())
}

/// A cart line with its catalog price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Cart priced from the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub subtotal: Price,
}

/// Price a list of items against the catalog.
///
/// Stock is checked against the units of a product across all its lines,
/// so two ring sizes cannot together exceed what is in stock.
pub fn price_items(items: &[CartItem], catalog: &ProductCatalog) -> StoreResult<PricedCart> {
    let mut lines = Vec::with_capacity(items.len());
    let mut currency: Option<Currency> = None;

    let mut units: HashMap<&str, u32> = HashMap::new();
    for item in items {
        let total = units.entry(item.product_id.as_str()).or_default();
        *total = total.saturating_add(item.quantity);
    }

    for item in items {
        let product = catalog
            .get(&item.product_id)
            .ok_or_else(|| StoreError::ProductNotFound {
                product_id: item.product_id.clone(),
            })?;

        if !product.active {
            return Err(StoreError::InvalidRequest(format!(
                "Product is not available: {}",
                item.product_id
            )));
        }
        if units.get(item.product_id.as_str()).copied().unwrap_or(item.quantity) > product.stock {
            return Err(StoreError::OutOfStock {
                product_id: product.id.clone(),
                available: product.stock,
            });
        }

        match currency {
            None => currency = Some(product.price.currency),
            Some(c) if c != product.price.currency => {
                return Err(StoreError::InvalidPrice {
                    message: "cart mixes currencies".to_string(),
                });
            }
            Some(_) => {}
        }

        lines.push(PricedLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            variant: item.variant.clone(),
            quantity: item.quantity,
            unit_price: product.price.clone(),
            line_total: product.price.checked_times(item.quantity)?,
            image_url: product.images.first().cloned(),
        });
    }

    let currency = currency.unwrap_or_default();
    let subtotal = lines
        .iter()
        .try_fold(0_i64, |sum, line| sum.checked_add(line.line_total.amount))
        .ok_or_else(|| StoreError::InvalidPrice {
            message: "cart total is out of range".to_string(),
        })?;
    let subtotal = Price::from_minor(subtotal, currency);

    Ok(PricedCart { lines, subtotal })
}
