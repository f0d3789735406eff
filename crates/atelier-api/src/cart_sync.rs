//! Debounced cart persistence.
//!
//! The storefront saves the cart on every change. `CartSync` keeps the most
//! recent cart per customer in memory and writes it to the store once no
//! further change has arrived for the debounce window. Reads see the pending
//! cart before the stored one.

use crate::store::SharedStore;
use atelier_core::{Cart, StoreResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1500);

struct Pending {
    cart: Cart,
    generation: u64,
}

#[derive(Clone)]
pub struct CartSync {
    store: SharedStore,
    debounce: Duration,
    pending: Arc<Mutex<HashMap<String, Pending>>>,
    generation: Arc<AtomicU64>,
    flushes: Arc<AtomicU64>,
}

impl CartSync {
    pub fn new(store: SharedStore, debounce: Duration) -> Self {
        Self {
            store,
            debounce,
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
            flushes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current cart: pending write first, then the store
    pub async fn get(&self, customer_id: &str) -> StoreResult<Option<Cart>> {
        if let Some(p) = self.pending.lock().await.get(customer_id) {
            return Ok(Some(p.cart.clone()));
        }
        self.store.get_cart(customer_id).await
    }

    /// Queue a cart write; an empty cart deletes the stored row
    pub async fn save(&self, cart: Cart) {
        let customer_id = cart.customer_id.clone();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.pending
            .lock()
            .await
            .insert(customer_id.clone(), Pending { cart, generation });

        let sync = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(sync.debounce).await;
            sync.flush_if_current(&customer_id, generation).await;
        });
    }

    /// Write a customer's pending cart now
    pub async fn flush(&self, customer_id: &str) -> StoreResult<()> {
        let pending = self.pending.lock().await.remove(customer_id);
        match pending {
            Some(p) => self.write(p.cart).await,
            None => Ok(()),
        }
    }

    /// Write every pending cart (shutdown)
    pub async fn flush_all(&self) {
        let drained: Vec<Pending> = self.pending.lock().await.drain().map(|(_, p)| p).collect();
        for p in drained {
            let customer_id = p.cart.customer_id.clone();
            if let Err(e) = self.write(p.cart).await {
                warn!("Failed to save cart for {}: {}", customer_id, e);
            }
        }
    }

    /// Number of carts written to the store so far
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::SeqCst)
    }

    async fn flush_if_current(&self, customer_id: &str, generation: u64) {
        let pending = {
            let mut map = self.pending.lock().await;
            match map.get(customer_id) {
                Some(p) if p.generation == generation => map.remove(customer_id),
                // superseded by a later save
                _ => None,
            }
        };

        if let Some(p) = pending {
            if let Err(e) = self.write(p.cart).await {
                warn!("Failed to save cart for {}: {}", customer_id, e);
            }
        }
    }

    async fn write(&self, cart: Cart) -> StoreResult<()> {
        if cart.is_empty() {
            self.store.delete_cart(&cart.customer_id).await?;
        } else {
            self.store.put_cart(&cart).await?;
        }
        self.flushes.fetch_add(1, Ordering::SeqCst);
        debug!("Saved cart for {} ({} items)", cart.customer_id, cart.item_count());
        Ok(())
    }
}
