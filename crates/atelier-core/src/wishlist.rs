//! Customer wishlist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Saved products, in the order they were added
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wishlist {
    pub customer_id: String,
    #[serde(default)]
    pub product_ids: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl Wishlist {
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            product_ids: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.product_ids.iter().any(|p| p == product_id)
    }

    /// Add a product; returns false if it was already saved
    pub fn add(&mut self, product_id: impl Into<String>) -> bool {
        let product_id = product_id.into();
        if self.contains(&product_id) {
            return false;
        }
        self.product_ids.push(product_id);
        self.updated_at = Utc::now();
        true
    }

    /// Remove a product; returns false if it was not saved
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.product_ids.len();
        self.product_ids.retain(|p| p != product_id);
        let removed = self.product_ids.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Flip membership; returns whether the product is now saved
    pub fn toggle(&mut self, product_id: &str) -> bool {
        if self.remove(product_id) {
            false
        } else {
            self.add(product_id)
        }
    }

    pub fn len(&self) -> usize {
        self.product_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut wishlist = Wishlist::new("cust");
        assert!(wishlist.add("ring"));
        assert!(!wishlist.add("ring"));
        assert!(wishlist.add("chain"));
        assert_eq!(wishlist.product_ids, vec!["ring", "chain"]);
    }

    #[test]
    fn test_toggle() {
        let mut wishlist = Wishlist::new("cust");
        assert!(wishlist.toggle("ring"));
        assert!(wishlist.contains("ring"));
        assert!(!wishlist.toggle("ring"));
        assert!(wishlist.is_empty());
    }

    #[test]
    fn test_remove_missing() {
        let mut wishlist = Wishlist::new("cust");
        assert!(!wishlist.remove("ring"));
    }
}
