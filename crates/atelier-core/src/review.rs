//! Product review models.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A published review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub customer_id: String,
    pub author: String,
    pub rating: u8,
    #[serde(default)]
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub verified_purchase: bool,
    pub created_at: DateTime<Utc>,
}

/// Review submission
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub author: String,
    pub rating: u8,
    #[serde(default)]
    pub title: String,
    pub body: String,
}

impl NewReview {
    pub fn validate(&self) -> StoreResult<()> {
        if !(1..=5).contains(&self.rating) {
            return Err(StoreError::InvalidRequest("rating must be between 1 and 5".to_string()));
        }
        if self.author.trim().is_empty() {
            return Err(StoreError::InvalidRequest("author is required".to_string()));
        }
        if self.title.chars().count() > 120 {
            return Err(StoreError::InvalidRequest("title is limited to 120 characters".to_string()));
        }
        let body_len = self.body.trim().chars().count();
        if !(10..=2000).contains(&body_len) {
            return Err(StoreError::InvalidRequest(
                "review must be 10-2000 characters".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_review(
        self,
        product_id: impl Into<String>,
        customer_id: impl Into<String>,
        verified_purchase: bool,
    ) -> Review {
        Review {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.into(),
            customer_id: customer_id.into(),
            author: self.author.trim().to_string(),
            rating: self.rating,
            title: self.title.trim().to_string(),
            body: self.body.trim().to_string(),
            verified_purchase,
            created_at: Utc::now(),
        }
    }
}

/// Distribution of ratings (1-5 stars).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingDistribution {
    pub five_star: u32,
    pub four_star: u32,
    pub three_star: u32,
    pub two_star: u32,
    pub one_star: u32,
}

impl RatingDistribution {
    fn record(&mut self, stars: u8) {
        match stars {
            5 => self.five_star += 1,
            4 => self.four_star += 1,
            3 => self.three_star += 1,
            2 => self.two_star += 1,
            1 => self.one_star += 1,
            _ => {}
        }
    }

    /// Get percentage for a rating level.
    pub fn percentage(&self, stars: u8, total: u32) -> f32 {
        if total == 0 {
            return 0.0;
        }
        let count = match stars {
            5 => self.five_star,
            4 => self.four_star,
            3 => self.three_star,
            2 => self.two_star,
            1 => self.one_star,
            _ => 0,
        };
        (count as f32 / total as f32) * 100.0
    }
}

/// Product reviews summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub product_id: String,
    pub average_rating: f32,
    pub total_reviews: u32,
    pub rating_distribution: RatingDistribution,
}

impl ReviewSummary {
    pub fn from_reviews(product_id: impl Into<String>, reviews: &[Review]) -> Self {
        let mut distribution = RatingDistribution::default();
        let mut sum = 0u32;
        for review in reviews {
            distribution.record(review.rating);
            sum += u32::from(review.rating);
        }
        let total = reviews.len() as u32;
        let average = if total == 0 {
            0.0
        } else {
            ((sum as f32 / total as f32) * 10.0).round() / 10.0
        };

        Self {
            product_id: product_id.into(),
            average_rating: average,
            total_reviews: total,
            rating_distribution: distribution,
        }
    }
}
