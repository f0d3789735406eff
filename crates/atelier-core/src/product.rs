//! # Product Types
//!
//! Currency, price and catalog types for the Atelier storefront.
//! The seed catalog is loaded from `config/products.toml`; uploaded products
//! go through `NewProduct::validate`.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Supported currencies (ISO 4217). LKR is the store's base currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[serde(alias = "lkr")]
    LKR,
    #[serde(alias = "usd")]
    USD,
    #[serde(alias = "eur")]
    EUR,
    #[serde(alias = "gbp")]
    GBP,
    #[serde(alias = "aud")]
    AUD,
    #[serde(alias = "cad")]
    CAD,
    #[serde(alias = "inr")]
    INR,
    #[serde(alias = "sgd")]
    SGD,
    #[serde(alias = "aed")]
    AED,
    #[serde(alias = "jpy")]
    JPY,
}

impl Currency {
    /// Every currency the storefront can display prices in
    pub const ALL: [Currency; 10] = [
        Currency::LKR,
        Currency::USD,
        Currency::EUR,
        Currency::GBP,
        Currency::AUD,
        Currency::CAD,
        Currency::INR,
        Currency::SGD,
        Currency::AED,
        Currency::JPY,
    ];

    /// Returns the ISO 4217 currency code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::LKR => "LKR",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::AUD => "AUD",
            Currency::CAD => "CAD",
            Currency::INR => "INR",
            Currency::SGD => "SGD",
            Currency::AED => "AED",
            Currency::JPY => "JPY",
        }
    }

    /// Returns the number of decimal places for this currency
    /// (JPY has 0 decimals, the others have 2)
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Convert a decimal amount to the smallest currency unit (cents, etc.)
    pub fn to_smallest_unit(&self, amount: f64) -> i64 {
        let multiplier = 10_f64.powi(self.decimal_places() as i32);
        (amount * multiplier).round() as i64
    }

    /// Convert from smallest unit back to decimal
    pub fn from_smallest_unit(&self, amount: i64) -> f64 {
        let divisor = 10_f64.powi(self.decimal_places() as i32);
        amount as f64 / divisor
    }

    fn symbol(&self) -> &'static str {
        match self {
            Currency::LKR => "Rs ",
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::AUD => "A$",
            Currency::CAD => "C$",
            Currency::INR => "₹",
            Currency::SGD => "S$",
            Currency::AED => "AED ",
            Currency::JPY => "¥",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::LKR
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or(StoreError::UnsupportedCurrency {
                currency: s.to_string(),
            })
    }
}

/// Price with amount in smallest currency unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in smallest currency unit (cents for LKR/USD)
    pub amount: i64,
    /// Currency
    pub currency: Currency,
}

impl Price {
    /// Create a new price from decimal amount
    pub fn new(amount: f64, currency: Currency) -> Self {
        Self {
            amount: currency.to_smallest_unit(amount),
            currency,
        }
    }

    /// Create a price from smallest unit (cents)
    pub fn from_minor(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Zero in the given currency
    pub fn zero(currency: Currency) -> Self {
        Self::from_minor(0, currency)
    }

    /// Get the decimal amount
    pub fn as_decimal(&self) -> f64 {
        self.currency.from_smallest_unit(self.amount)
    }

    /// Multiply by a quantity, saturating at the `i64` bounds
    pub fn times(&self, quantity: u32) -> Self {
        Self::from_minor(self.amount.saturating_mul(i64::from(quantity)), self.currency)
    }

    /// Multiply by a quantity, failing on overflow
    pub fn checked_times(&self, quantity: u32) -> StoreResult<Self> {
        self.amount
            .checked_mul(i64::from(quantity))
            .map(|amount| Self::from_minor(amount, self.currency))
            .ok_or_else(|| StoreError::InvalidPrice {
                message: format!("{} x {} is out of range", self.display(), quantity),
            })
    }

    /// Plain decimal string with exactly the currency's decimal places
    /// (e.g. "1250.00"). Gateways sign this exact string, so it is built
    /// with integer arithmetic.
    pub fn format_amount(&self) -> String {
        let places = u32::from(self.currency.decimal_places());
        if places == 0 {
            return self.amount.to_string();
        }
        let divisor = 10_u64.pow(places);
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        format!(
            "{}{}.{:0width$}",
            sign,
            abs / divisor,
            abs % divisor,
            width = places as usize
        )
    }

    /// Parse a gateway amount string ("1250.00", "80", "-2.5") without
    /// going through floating point.
    pub fn parse_decimal(value: &str, currency: Currency) -> StoreResult<Self> {
        let invalid = || StoreError::InvalidPrice {
            message: format!("not an amount: {:?}", value),
        };
        let value = value.trim();
        let (negative, digits) = match value.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, value),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        let places = usize::from(currency.decimal_places());

        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) || fraction.len() > places {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let fraction: i64 = if places == 0 {
            0
        } else {
            format!("{:0<width$}", fraction, width = places)
                .parse()
                .map_err(|_| invalid())?
        };
        let amount = whole
            .checked_mul(10_i64.pow(places as u32))
            .and_then(|w| w.checked_add(fraction))
            .ok_or_else(invalid)?;

        Ok(Self::from_minor(if negative { -amount } else { amount }, currency))
    }

    /// Format for display (e.g., "Rs 12500.00")
    pub fn display(&self) -> String {
        format!("{}{}", self.currency.symbol(), self.format_amount())
    }
}

/// A product in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier
    pub id: String,

    /// URL slug (e.g., "emerald-halo-ring")
    pub slug: String,

    /// Display name
    pub name: String,

    /// Long description
    #[serde(default)]
    pub description: String,

    /// Category (rings, necklaces, earrings, ...)
    pub category: String,

    /// Metal or main material (gold-22k, silver, platinum, ...)
    #[serde(default)]
    pub material: Option<String>,

    /// Price in the store's base currency
    pub price: Price,

    /// Image URLs (Uploadcare CDN)
    #[serde(default)]
    pub images: Vec<String>,

    /// Units available for sale
    #[serde(default)]
    pub stock: u32,

    /// Whether this product is active and available for purchase
    #[serde(default = "default_true")]
    pub active: bool,

    /// Shown on the landing page
    #[serde(default)]
    pub featured: bool,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Optional metadata (stone, carat, hallmark, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// Create a new active product with one unit in stock
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: Price,
    ) -> Self {
        let id = id.into();
        Self {
            slug: id.clone(),
            id,
            name: name.into(),
            description: String::new(),
            category: category.into(),
            material: None,
            price,
            images: Vec::new(),
            stock: 1,
            active: true,
            featured: false,
            created_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Builder: set material
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// Builder: add an image URL
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.images.push(url.into());
        self
    }

    /// Builder: set stock level
    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    /// Builder: mark as featured
    pub fn featured(mut self) -> Self {
        self.featured = true;
        self
    }

    /// Builder: add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self.category.to_lowercase().contains(&needle)
    }
}

/// Sort order for catalog listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

pub const DEFAULT_PAGE_SIZE: u32 = 24;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Catalog listing filters (deserialized straight from the query string)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    /// Minimum price in minor units of the base currency
    #[serde(default)]
    pub min_price: Option<i64>,
    /// Maximum price in minor units of the base currency
    #[serde(default)]
    pub max_price: Option<i64>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub sort: CatalogSort,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    /// Display currency; prices in the response are converted to it
    #[serde(default)]
    pub currency: Option<Currency>,
}

impl CatalogQuery {
    fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    fn accepts(&self, product: &Product) -> bool {
        if !product.active {
            return false;
        }
        if let Some(q) = self.q.as_deref().filter(|q| !q.trim().is_empty()) {
            if !product.matches_text(q.trim()) {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if !product.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(ref material) = self.material {
            let same = product
                .material
                .as_deref()
                .is_some_and(|m| m.eq_ignore_ascii_case(material));
            if !same {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| product.price.amount < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price.amount > max) {
            return false;
        }
        if self.featured.is_some_and(|f| product.featured != f) {
            return false;
        }
        true
    }
}

/// One page of catalog results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogPage {
    pub products: Vec<Product>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
}

/// Product catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCatalog {
    #[serde(default)]
    pub products: Vec<Product>,
}

impl ProductCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            products: Vec::new(),
        }
    }

    /// Build a catalog from a list of products
    pub fn from_products(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Add a product to the catalog
    pub fn add(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Find a product by ID
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Find a product by slug
    pub fn get_by_slug(&self, slug: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.slug == slug)
    }

    /// Get all active products
    pub fn active_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.active)
    }

    /// Filter, sort and paginate active products
    pub fn search(&self, query: &CatalogQuery) -> CatalogPage {
        let mut matches: Vec<&Product> = self.products.iter().filter(|p| query.accepts(p)).collect();

        match query.sort {
            CatalogSort::Newest => matches.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            CatalogSort::PriceAsc => matches.sort_by_key(|p| p.price.amount),
            CatalogSort::PriceDesc => matches.sort_by_key(|p| std::cmp::Reverse(p.price.amount)),
            CatalogSort::Name => matches.sort_by_key(|p| p.name.to_lowercase()),
        }

        let page = query.page();
        let per_page = query.per_page();
        let total = matches.len();
        let start = ((page - 1) as usize).saturating_mul(per_page as usize);

        let products = matches
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect();

        CatalogPage {
            products,
            total,
            page,
            per_page,
        }
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

/// Highest price an uploaded product may carry, in minor units
pub const MAX_PRICE_MINOR: i64 = 1_000_000_000_000;

/// Admin product upload payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub material: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl NewProduct {
    pub fn validate(&self) -> StoreResult<()> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > 200 {
            return Err(StoreError::InvalidRequest(
                "name must be 1-200 characters".to_string(),
            ));
        }
        let slug_ok = !self.slug.is_empty()
            && self
                .slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !slug_ok {
            return Err(StoreError::InvalidRequest(
                "slug may only contain a-z, 0-9 and '-'".to_string(),
            ));
        }
        if self.category.trim().is_empty() {
            return Err(StoreError::InvalidRequest("category is required".to_string()));
        }
        if self.price.amount <= 0 {
            return Err(StoreError::InvalidPrice {
                message: "price must be positive".to_string(),
            });
        }
        if self.price.amount > MAX_PRICE_MINOR {
            return Err(StoreError::InvalidPrice {
                message: format!(
                    "price above {}",
                    Price::from_minor(MAX_PRICE_MINOR, self.price.currency).display()
                ),
            });
        }
        if self.images.is_empty() {
            return Err(StoreError::InvalidRequest(
                "at least one image is required".to_string(),
            ));
        }
        if let Some(bad) = self.images.iter().find(|url| !url.starts_with("https://")) {
            return Err(StoreError::InvalidRequest(format!(
                "image URL must use https: {}",
                bad
            )));
        }
        Ok(())
    }

    /// Turn a validated upload into a catalog product
    pub fn into_product(self) -> Product {
        Product {
            id: Uuid::new_v4().to_string(),
            slug: self.slug,
            name: self.name.trim().to_string(),
            description: self.description,
            category: self.category.trim().to_lowercase(),
            material: self.material,
            price: self.price,
            images: self.images,
            stock: self.stock,
            active: true,
            featured: self.featured,
            created_at: Utc::now(),
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn lkr(amount: f64) -> Price {
        Price::new(amount, Currency::LKR)
    }

    fn sample_catalog() -> ProductCatalog {
        let now = Utc::now();
        let mut ring = Product::new("ring-1", "Emerald Halo Ring", "rings", lkr(185_000.0))
            .with_material("gold-22k")
            .with_description("Colombian emerald in a diamond halo")
            .featured();
        ring.created_at = now - Duration::days(3);

        let mut pendant = Product::new("pendant-1", "Blue Sapphire Pendant", "necklaces", lkr(95_000.0))
            .with_material("silver");
        pendant.created_at = now - Duration::days(1);

        let mut band = Product::new("band-1", "Classic Wedding Band", "rings", lkr(60_000.0))
            .with_material("gold-22k");
        band.created_at = now;

        let mut retired = Product::new("old-1", "Retired Ring", "rings", lkr(10_000.0));
        retired.active = false;

        ProductCatalog::from_products(vec![ring, pendant, band, retired])
    }

    #[test]
    fn test_currency_conversion() {
        let lkr = Currency::LKR;
        assert_eq!(lkr.to_smallest_unit(10.99), 1099);
        assert_eq!(lkr.from_smallest_unit(1099), 10.99);

        let jpy = Currency::JPY;
        assert_eq!(jpy.to_smallest_unit(1000.0), 1000);
        assert_eq!(jpy.from_smallest_unit(1000), 1000.0);
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
        assert_eq!(" LKR ".parse::<Currency>().unwrap(), Currency::LKR);
        assert!("XYZ".parse::<Currency>().is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(Price::from_minor(125_000, Currency::LKR).format_amount(), "1250.00");
        assert_eq!(Price::from_minor(5, Currency::USD).format_amount(), "0.05");
        assert_eq!(Price::from_minor(-250, Currency::USD).format_amount(), "-2.50");
        assert_eq!(Price::from_minor(1500, Currency::JPY).format_amount(), "1500");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Price::parse_decimal("1250.00", Currency::LKR).unwrap().amount, 125_000);
        assert_eq!(Price::parse_decimal("80", Currency::USD).unwrap().amount, 8000);
        assert_eq!(Price::parse_decimal("2.5", Currency::USD).unwrap().amount, 250);
        assert_eq!(Price::parse_decimal("-0.05", Currency::USD).unwrap().amount, -5);
        assert_eq!(Price::parse_decimal("1500", Currency::JPY).unwrap().amount, 1500);

        assert!(Price::parse_decimal("1.234", Currency::USD).is_err());
        assert!(Price::parse_decimal("12.5", Currency::JPY).is_err());
        assert!(Price::parse_decimal("abc", Currency::USD).is_err());
        assert!(Price::parse_decimal(".50", Currency::USD).is_err());
    }

    #[test]
    fn test_price_display() {
        assert_eq!(lkr(12_500.0).display(), "Rs 12500.00");
        assert_eq!(Price::new(19.99, Currency::EUR).display(), "€19.99");
    }

    #[test]
    fn test_search_filters_inactive_and_category() {
        let catalog = sample_catalog();
        let page = catalog.search(&CatalogQuery {
            category: Some("Rings".into()),
            ..Default::default()
        });

        assert_eq!(page.total, 2);
        assert!(page.products.iter().all(|p| p.category == "rings"));
        assert!(page.products.iter().all(|p| p.active));
    }

    #[test]
    fn test_search_text_and_price_range() {
        let catalog = sample_catalog();
        let page = catalog.search(&CatalogQuery {
            q: Some("sapphire".into()),
            ..Default::default()
        });
        assert_eq!(page.total, 1);
        assert_eq!(page.products[0].id, "pendant-1");

        let page = catalog.search(&CatalogQuery {
            min_price: Some(lkr(70_000.0).amount),
            max_price: Some(lkr(100_000.0).amount),
            ..Default::default()
        });
        assert_eq!(page.total, 1);
        assert_eq!(page.products[0].id, "pendant-1");
    }

    #[test]
    fn test_search_sorting() {
        let catalog = sample_catalog();

        let newest = catalog.search(&CatalogQuery::default());
        assert_eq!(newest.products[0].id, "band-1");

        let cheapest = catalog.search(&CatalogQuery {
            sort: CatalogSort::PriceAsc,
            ..Default::default()
        });
        assert_eq!(cheapest.products[0].id, "band-1");

        let dearest = catalog.search(&CatalogQuery {
            sort: CatalogSort::PriceDesc,
            ..Default::default()
        });
        assert_eq!(dearest.products[0].id, "ring-1");
    }

    #[test]
    fn test_search_pagination() {
        let catalog = sample_catalog();
        let page = catalog.search(&CatalogQuery {
            sort: CatalogSort::Name,
            page: Some(2),
            per_page: Some(2),
            ..Default::default()
        });

        assert_eq!(page.total, 3);
        assert_eq!(page.products.len(), 1);
        assert_eq!(page.products[0].name, "Emerald Halo Ring");
    }

    #[test]
    fn test_catalog_from_toml() {
        let catalog = ProductCatalog::from_toml(
            r#"
            [[products]]
            id = "ring-1"
            slug = "emerald-halo-ring"
            name = "Emerald Halo Ring"
            category = "rings"
            stock = 2
            price = { amount = 18500000, currency = "LKR" }
            "#,
        )
        .unwrap();

        let ring = catalog.get_by_slug("emerald-halo-ring").unwrap();
        assert_eq!(ring.price.currency, Currency::LKR);
        assert!(ring.active);
        assert_eq!(ring.stock, 2);
    }

    fn upload() -> NewProduct {
        NewProduct {
            name: "Pearl Drop Earrings".into(),
            slug: "pearl-drop-earrings".into(),
            description: String::new(),
            category: "Earrings".into(),
            material: Some("silver".into()),
            price: lkr(42_000.0),
            images: vec!["https://ucarecdn.com/abc/".into()],
            stock: 3,
            featured: false,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn test_new_product_validation() {
        assert!(upload().validate().is_ok());

        let mut bad_slug = upload();
        bad_slug.slug = "Pearl Drop".into();
        assert!(bad_slug.validate().is_err());

        let mut no_images = upload();
        no_images.images.clear();
        assert!(no_images.validate().is_err());

        let mut http_image = upload();
        http_image.images = vec!["http://example.com/a.jpg".into()];
        assert!(http_image.validate().is_err());

        let mut free = upload();
        free.price = Price::zero(Currency::LKR);
        assert!(matches!(free.validate(), Err(StoreError::InvalidPrice { .. })));

        let mut priceless = upload();
        priceless.price = Price::from_minor(i64::MAX / 2, Currency::LKR);
        assert!(matches!(priceless.validate(), Err(StoreError::InvalidPrice { .. })));

        let mut top = upload();
        top.price = Price::from_minor(MAX_PRICE_MINOR, Currency::LKR);
        assert!(top.validate().is_ok());
    }

    #[test]
    fn test_times_does_not_overflow() {
        let huge = Price::from_minor(i64::MAX / 2, Currency::LKR);

        assert!(matches!(huge.checked_times(3), Err(StoreError::InvalidPrice { .. })));
        assert_eq!(huge.times(3).amount, i64::MAX);
        assert_eq!(lkr(100.0).checked_times(3).unwrap(), lkr(300.0));
    }

    #[test]
    fn test_currency_codes_accept_either_case() {
        let upper: Price = toml::from_str("amount = 100\ncurrency = \"USD\"").unwrap();
        let lower: Price = toml::from_str("amount = 100\ncurrency = \"usd\"").unwrap();
        assert_eq!(upper, lower);
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
    }

    #[test]
    fn test_new_product_into_product() {
        let product = upload().into_product();
        assert_eq!(product.category, "earrings");
        assert!(product.active);
        assert!(!product.id.is_empty());
    }
}
