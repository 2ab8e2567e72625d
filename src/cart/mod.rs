//! The current order: products with quantities.
//!
//! Each line holds a snapshot of the product at the time it was added. The
//! cart is persisted under its own key after every change.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::product::Product;
use crate::core::types::ProductId;
use crate::storage::{KeyValueStore, Mirror, PersistenceError, CART_KEY};

#[derive(Error, Debug)]
pub enum CartError {
    #[error("Product '{0}' is not in the catalog")]
    UnknownProduct(ProductId),

    #[error("Product '{0}' is not in the cart")]
    NotInCart(ProductId),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// One product and how many of it were ordered (always at least 1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "producto")]
    pub product: Product,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
}

impl CartLine {
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

pub struct Cart {
    lines: Vec<CartLine>,
    mirror: Mirror,
}

impl Cart {
    /// Open the cart with its persisted lines. Unreadable state yields an
    /// empty cart.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let mirror = Mirror::new(storage, CART_KEY);
        let lines = match mirror.load() {
            Ok(Some(text)) => match serde_json::from_str::<Vec<CartLine>>(&text) {
                Ok(lines) => lines.into_iter().filter(|l| l.quantity > 0).collect(),
                Err(e) => {
                    warn!("Ignoring unreadable cart: {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read cart: {e}");
                Vec::new()
            }
        };
        Self { lines, mirror }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of items across all lines
    pub fn total_quantity(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |total, l| total.saturating_add(l.quantity))
    }

    pub fn total_price(&self) -> f64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    pub fn quantity_of(&self, id: &ProductId) -> u32 {
        self.position(id).map_or(0, |i| self.lines[i].quantity)
    }

    /// Add one unit of `product`, starting a new line if needed
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persistence` if the cart cannot be saved.
    pub fn add(&mut self, product: &Product) -> Result<(), CartError> {
        match self.position(&product.id) {
            Some(index) => {
                let line = &mut self.lines[index];
                line.quantity = line.quantity.saturating_add(1);
            }
            None => self.lines.push(CartLine {
                product: product.clone(),
                quantity: 1,
            }),
        }
        self.persist()
    }

    /// Change a line's quantity by `delta`, never going below 1
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` if no line holds `id`.
    pub fn update_quantity(&mut self, id: &ProductId, delta: i64) -> Result<u32, CartError> {
        let index = self
            .position(id)
            .ok_or_else(|| CartError::NotInCart(id.clone()))?;
        let line = &mut self.lines[index];
        let updated = i64::from(line.quantity)
            .saturating_add(delta)
            .clamp(1, i64::from(u32::MAX));
        line.quantity = u32::try_from(updated).unwrap_or(u32::MAX);
        let quantity = line.quantity;
        self.persist()?;
        Ok(quantity)
    }

    /// Remove a line. Removing a product that is not in the cart is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persistence` if the cart cannot be saved.
    pub fn remove(&mut self, id: &ProductId) -> Result<bool, CartError> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        self.lines.remove(index);
        self.persist()?;
        Ok(true)
    }

    /// Drop every line whose product id is in `ids`, e.g. after a replace
    /// import removed them from the catalog
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persistence` if the cart cannot be saved.
    pub fn prune(&mut self, ids: &[ProductId]) -> Result<usize, CartError> {
        let ids: HashSet<&ProductId> = ids.iter().collect();
        let before = self.lines.len();
        self.lines.retain(|line| !ids.contains(&line.product.id));
        let pruned = before - self.lines.len();
        if pruned > 0 {
            debug!("Pruned {pruned} cart lines for removed products");
            self.persist()?;
        }
        Ok(pruned)
    }

    /// # Errors
    ///
    /// Returns `CartError::Persistence` if the cart cannot be saved.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.lines.clear();
        self.persist()
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.lines.iter().position(|l| &l.product.id == id)
    }

    fn persist(&mut self) -> Result<(), CartError> {
        Ok(self.mirror.write_json(&self.lines)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Category;
    use crate::storage::MemoryStore;

    fn latte() -> Product {
        Product::new("1", "Latte", 3.5, Category::Coffee)
    }

    fn croissant() -> Product {
        Product::new("4", "Croissant", 2.75, Category::Bakery)
    }

    #[test]
    fn test_add_aggregates_quantity() {
        let mut cart = Cart::open(Arc::new(MemoryStore::new()));
        cart.add(&latte()).unwrap();
        cart.add(&latte()).unwrap();
        cart.add(&croissant()).unwrap();

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.quantity_of(&ProductId::new("1")), 2);
        assert_eq!(cart.total_quantity(), 3);
        assert!((cart.total_price() - 9.75).abs() < 1e-9);
    }

    #[test]
    fn test_quantity_never_below_one() {
        let mut cart = Cart::open(Arc::new(MemoryStore::new()));
        cart.add(&latte()).unwrap();

        assert_eq!(cart.update_quantity(&ProductId::new("1"), -5).unwrap(), 1);
        assert_eq!(cart.update_quantity(&ProductId::new("1"), 3).unwrap(), 4);
        assert!(matches!(
            cart.update_quantity(&ProductId::new("zzz"), 1),
            Err(CartError::NotInCart(_))
        ));
    }

    #[test]
    fn test_prune_removed_ids() {
        let mut cart = Cart::open(Arc::new(MemoryStore::new()));
        cart.add(&latte()).unwrap();
        cart.add(&croissant()).unwrap();

        let pruned = cart.prune(&[ProductId::new("1"), ProductId::new("99")]).unwrap();
        assert_eq!(pruned, 1);
        assert_eq!(cart.lines()[0].product.name, "Croissant");
    }

    #[test]
    fn test_cart_persists_between_sessions() {
        let storage = Arc::new(MemoryStore::new());
        {
            let mut cart = Cart::open(storage.clone());
            cart.add(&latte()).unwrap();
            cart.add(&latte()).unwrap();
        }

        let text = storage.load(CART_KEY).unwrap().unwrap();
        assert!(text.contains("\"cantidad\":2"));

        let reopened = Cart::open(storage);
        assert_eq!(reopened.total_quantity(), 2);
    }

    #[test]
    fn test_add_saturates_at_max_quantity() {
        let full = vec![
            CartLine {
                product: latte(),
                quantity: u32::MAX,
            },
            CartLine {
                product: croissant(),
                quantity: 2,
            },
        ];
        let storage = Arc::new(
            MemoryStore::new().with_entry(CART_KEY, serde_json::to_string(&full).unwrap()),
        );

        let mut cart = Cart::open(storage);
        cart.add(&latte()).unwrap();

        assert_eq!(cart.quantity_of(&ProductId::new("1")), u32::MAX);
        assert_eq!(cart.total_quantity(), u32::MAX);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::open(Arc::new(MemoryStore::new()));
        cart.add(&latte()).unwrap();
        cart.add(&croissant()).unwrap();

        assert!(cart.remove(&ProductId::new("1")).unwrap());
        assert!(!cart.remove(&ProductId::new("1")).unwrap());
        cart.clear().unwrap();
        assert!(cart.is_empty());
    }
}
