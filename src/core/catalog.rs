use std::collections::HashMap;

use tracing::warn;

use crate::core::product::Product;
use crate::core::types::ProductId;

/// Outcome of inserting a product by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// An ordered product list with unique ids
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,

    /// Index: product ID -> position in products vec
    id_to_index: HashMap<ProductId, usize>,
}

impl Catalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from an ordered sequence.
    ///
    /// A repeated id keeps the position of its first occurrence and the value
    /// of its last one.
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        let mut catalog = Self::new();
        for product in products {
            if catalog.upsert(product.clone()) == Upsert::Updated {
                warn!("Duplicate product id '{}' in catalog, keeping last", product.id);
            }
        }
        catalog
    }

    /// Insert or update by id. Updates keep their position, inserts append.
    pub fn upsert(&mut self, product: Product) -> Upsert {
        if let Some(&index) = self.id_to_index.get(&product.id) {
            self.products[index] = product;
            Upsert::Updated
        } else {
            self.id_to_index
                .insert(product.id.clone(), self.products.len());
            self.products.push(product);
            Upsert::Inserted
        }
    }

    /// Remove a product by id, returning it if it was present
    pub fn remove(&mut self, id: &ProductId) -> Option<Product> {
        let index = self.id_to_index.remove(id)?;
        let removed = self.products.remove(index);
        for position in self.id_to_index.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        Some(removed)
    }

    /// Get a product by ID
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.id_to_index.get(id).map(|&idx| &self.products[idx])
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.id_to_index.contains_key(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.products.iter()
    }

    /// Product ids in catalog order
    pub fn ids(&self) -> impl Iterator<Item = &ProductId> {
        self.products.iter().map(|p| &p.id)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn into_products(self) -> Vec<Product> {
        self.products
    }

    /// Number of products in catalog
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl PartialEq for Catalog {
    fn eq(&self, other: &Self) -> bool {
        self.products == other.products
    }
}

impl FromIterator<Product> for Catalog {
    fn from_iter<T: IntoIterator<Item = Product>>(iter: T) -> Self {
        Self::from_products(iter)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Product;
    type IntoIter = std::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Category;

    fn product(id: &str, name: &str) -> Product {
        Product::new(id, name, 1.0, Category::Coffee)
    }

    #[test]
    fn test_upsert_preserves_position_on_update() {
        let mut catalog = Catalog::from_products(vec![product("1", "A"), product("2", "B")]);

        assert_eq!(catalog.upsert(product("1", "A2")), Upsert::Updated);
        assert_eq!(catalog.upsert(product("3", "C")), Upsert::Inserted);

        let names: Vec<_> = catalog.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A2", "B", "C"]);
    }

    #[test]
    fn test_remove_reindexes() {
        let mut catalog =
            Catalog::from_products(vec![product("1", "A"), product("2", "B"), product("3", "C")]);

        let removed = catalog.remove(&ProductId::new("1")).unwrap();
        assert_eq!(removed.name, "A");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(&ProductId::new("3")).unwrap().name, "C");
        assert!(catalog.remove(&ProductId::new("1")).is_none());
    }

    #[test]
    fn test_duplicate_ids_keep_first_position_last_value() {
        let catalog = Catalog::from_products(vec![
            product("1", "A"),
            product("2", "B"),
            product("1", "A-late"),
        ]);

        let ids: Vec<_> = catalog.ids().map(ProductId::as_str).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(catalog.get(&ProductId::new("1")).unwrap().name, "A-late");
    }
}
