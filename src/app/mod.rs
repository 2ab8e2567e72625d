//! The point-of-sale session.
//!
//! [`PointOfSale`] owns the catalog store, the cart and the snapshot source,
//! all backed by one key/value storage. Front ends go through it for every
//! operation so that catalog and cart stay consistent (deleting or
//! replacing products also drops them from the cart).
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cafe_gestor::app::{ImportFile, ImportOutcome, PointOfSale};
//! use cafe_gestor::catalog::import::{ImportDecision, ImportSummary};
//! use cafe_gestor::catalog::snapshot::SnapshotSource;
//! use cafe_gestor::storage::MemoryStore;
//!
//! let mut pos = PointOfSale::open(Arc::new(MemoryStore::new()), SnapshotSource::Embedded);
//!
//! let csv = "id,nombre,precio,codigo,categoria,descripcion\nx1,Mocha,4.25,,Café,\n";
//! let file = ImportFile::new("menu.csv", csv);
//! let outcome = pos
//!     .import(&file, &mut |_: &ImportSummary| ImportDecision::Merge)
//!     .unwrap();
//! assert!(matches!(outcome, ImportOutcome::Applied { .. }));
//! assert_eq!(pos.catalog().len(), 1);
//! ```

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::cart::{Cart, CartError};
use crate::catalog::import::{ImportDecider, ImportSummary};
use crate::catalog::snapshot::SnapshotSource;
use crate::catalog::store::{CatalogStore, ReconcileOutcome};
use crate::codec::{FormatError, TransferFormat};
use crate::core::catalog::Catalog;
use crate::core::product::{InvalidProduct, Product, ProductDraft};
use crate::core::types::ProductId;
use crate::storage::{KeyValueStore, PersistenceError};

pub mod transfer;

pub use transfer::{decode_import, ExportArtifact, ImportError, ImportFile, ImportOutcome};

#[derive(Error, Debug)]
pub enum ProductError {
    #[error("Product '{0}' not found")]
    NotFound(ProductId),

    #[error("Invalid product: {0}")]
    Invalid(#[from] InvalidProduct),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<CartError> for ProductError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::UnknownProduct(id) | CartError::NotInCart(id) => Self::NotFound(id),
            CartError::Persistence(e) => Self::Persistence(e),
        }
    }
}

pub struct PointOfSale {
    store: CatalogStore,
    cart: Cart,
    source: SnapshotSource,
}

impl PointOfSale {
    /// Open a session over `storage`. The locally persisted catalog and cart
    /// are available immediately; call [`PointOfSale::sync`] to reconcile
    /// with the authoritative snapshot.
    pub fn open(storage: Arc<dyn KeyValueStore>, source: SnapshotSource) -> Self {
        Self {
            store: CatalogStore::open(storage.clone()),
            cart: Cart::open(storage),
            source,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.store.get()
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    pub fn source(&self) -> &SnapshotSource {
        &self.source
    }

    /// Fetch the authoritative snapshot and reconcile the catalog with it.
    /// Never fails; see [`ReconcileOutcome`].
    pub async fn sync(&mut self) -> ReconcileOutcome {
        let snapshot = self.source.fetch().await;
        let outcome = self.store.reconcile(snapshot);
        self.prune_cart();
        outcome
    }

    /// Create a product from a draft with a freshly generated id
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Invalid` if the draft is incomplete and
    /// `ProductError::Persistence` if the catalog cannot be saved.
    pub fn create_product(&mut self, draft: ProductDraft) -> Result<Product, ProductError> {
        let product = draft.build(None)?;
        self.store.upsert(product.clone())?;
        info!("Created product '{}' ({})", product.name, product.id);
        Ok(product)
    }

    /// Replace an existing product's fields, keeping its id and position
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` for unknown ids, otherwise as
    /// [`PointOfSale::create_product`].
    pub fn update_product(
        &mut self,
        id: &ProductId,
        draft: ProductDraft,
    ) -> Result<Product, ProductError> {
        if !self.store.get().contains(id) {
            return Err(ProductError::NotFound(id.clone()));
        }
        let product = draft.build(Some(id.clone()))?;
        self.store.upsert(product.clone())?;
        info!("Updated product '{}' ({id})", product.name);
        Ok(product)
    }

    /// Permanently delete a product and drop it from the cart. Deleting an
    /// unknown id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Persistence` if the catalog or the cart cannot
    /// be saved. Both are updated in memory regardless.
    pub fn delete_product(&mut self, id: &ProductId) -> Result<Option<Product>, ProductError> {
        let removed = self.store.remove(id);
        let uncarted = self.cart.remove(id);
        let removed = removed?;
        uncarted?;
        if let Some(product) = &removed {
            info!("Deleted product '{}' ({id})", product.name);
        }
        Ok(removed)
    }

    /// Add one unit of a catalog product to the cart
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownProduct` if `id` is not in the catalog.
    pub fn add_to_cart(&mut self, id: &ProductId) -> Result<(), CartError> {
        let product = self
            .store
            .product(id)
            .ok_or_else(|| CartError::UnknownProduct(id.clone()))?;
        self.cart.add(product)
    }

    /// Decode `file`, ask `decider` how to combine it with the current
    /// catalog, and commit the answer.
    ///
    /// Files without products are not offered to the decider. Cancelling
    /// commits nothing. Products removed by a replace are pruned from the
    /// cart.
    ///
    /// # Errors
    ///
    /// Returns `ImportError` if the file is rejected (see
    /// [`decode_import`]) or the new catalog cannot be saved. In the latter
    /// case the import is still applied in memory.
    pub fn import<D>(
        &mut self,
        file: &ImportFile,
        decider: &mut D,
    ) -> Result<ImportOutcome, ImportError>
    where
        D: ImportDecider + ?Sized,
    {
        let decoded = decode_import(file)?;
        if decoded.catalog.is_empty() {
            info!("{} holds no products; nothing imported", decoded.file_name);
            return Ok(ImportOutcome::Empty {
                issues: decoded.issues,
            });
        }

        let summary = ImportSummary::new(
            decoded.file_name,
            decoded.format,
            self.store.get(),
            &decoded.catalog,
        );
        let Some(strategy) = decider.decide(&summary).strategy() else {
            info!("Import of {} cancelled", summary.file_name);
            return Ok(ImportOutcome::Cancelled { summary });
        };

        let applied = self.store.apply_import(strategy, &decoded.catalog);
        self.prune_cart();
        let result = applied?;

        Ok(ImportOutcome::Applied {
            summary,
            result,
            issues: decoded.issues,
        })
    }

    /// Encode the current catalog for download
    ///
    /// # Errors
    ///
    /// Returns `FormatError` if the catalog cannot be serialized.
    pub fn export(&self, format: TransferFormat) -> Result<ExportArtifact, FormatError> {
        ExportArtifact::encode(self.store.get(), format)
    }

    /// Drop cart lines whose product is no longer in the catalog
    fn prune_cart(&mut self) {
        let gone: Vec<ProductId> = self
            .cart
            .lines()
            .iter()
            .map(|line| line.product.id.clone())
            .filter(|id| !self.store.get().contains(id))
            .collect();
        if gone.is_empty() {
            return;
        }
        if let Err(e) = self.cart.prune(&gone) {
            warn!("Could not save cart after pruning removed products: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::import::{ImportDecision, ImportStrategy};
    use crate::core::types::Category;
    use crate::storage::{MemoryStore, CATALOG_KEY};

    const CURRENT: &str = r#"[
        {"id":"1","nombre":"One","precio":1,"categoria":"Otro"},
        {"id":"2","nombre":"Two","precio":2,"categoria":"Otro"}
    ]"#;
    const IMPORTED: &str = r#"[
        {"id":"2","nombre":"Two (new)","precio":2.5,"categoria":"Otro"},
        {"id":"3","nombre":"Three","precio":3,"categoria":"Otro"}
    ]"#;

    fn session() -> PointOfSale {
        let storage = Arc::new(MemoryStore::new().with_entry(CATALOG_KEY, CURRENT));
        PointOfSale::open(storage, SnapshotSource::Embedded)
    }

    fn ids(pos: &PointOfSale) -> Vec<&str> {
        pos.catalog().ids().map(ProductId::as_str).collect()
    }

    #[test]
    fn test_merge_import_scenario() {
        let mut pos = session();
        let file = ImportFile::new("import.json", IMPORTED);

        let mut seen = None;
        let outcome = pos
            .import(&file, &mut |summary: &ImportSummary| {
                seen = Some(summary.clone());
                ImportDecision::Merge
            })
            .unwrap();

        let summary = seen.unwrap();
        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.new_count, 1);
        assert_eq!(summary.overlapping_count, 1);

        assert!(matches!(outcome, ImportOutcome::Applied { .. }));
        assert_eq!(ids(&pos), vec!["1", "2", "3"]);
        assert_eq!(
            pos.catalog().get(&ProductId::new("2")).unwrap().name,
            "Two (new)"
        );
    }

    #[test]
    fn test_replace_import_prunes_cart() {
        let mut pos = session();
        pos.add_to_cart(&ProductId::new("1")).unwrap();
        pos.add_to_cart(&ProductId::new("2")).unwrap();

        let file = ImportFile::new("import.json", IMPORTED);
        let outcome = pos
            .import(&file, &mut |_: &ImportSummary| {
                ImportDecision::from(ImportStrategy::Replace)
            })
            .unwrap();

        match outcome {
            ImportOutcome::Applied { result, .. } => {
                assert_eq!(result.removed, vec![ProductId::new("1")]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(ids(&pos), vec!["2", "3"]);
        assert_eq!(pos.cart().quantity_of(&ProductId::new("1")), 0);
        assert_eq!(pos.cart().quantity_of(&ProductId::new("2")), 1);
    }

    #[test]
    fn test_cancel_and_empty_commit_nothing() {
        let mut pos = session();
        let before = pos.catalog().clone();

        let file = ImportFile::new("import.json", IMPORTED);
        let outcome = pos
            .import(&file, &mut |_: &ImportSummary| ImportDecision::Cancel)
            .unwrap();
        assert!(matches!(outcome, ImportOutcome::Cancelled { .. }));

        let mut asked = false;
        let empty = ImportFile::new("vacio.csv", "id,nombre,precio,codigo,categoria,descripcion\n");
        let outcome = pos
            .import(&empty, &mut |_: &ImportSummary| {
                asked = true;
                ImportDecision::Replace
            })
            .unwrap();
        assert!(matches!(outcome, ImportOutcome::Empty { .. }));
        assert!(!asked);

        assert_eq!(pos.catalog(), &before);
    }

    #[test]
    fn test_unsupported_import_changes_nothing() {
        let mut pos = session();
        let before = pos.catalog().clone();
        let file = ImportFile::new("menu.txt", IMPORTED);

        let result = pos.import(&file, &mut |_: &ImportSummary| ImportDecision::Replace);
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
        assert_eq!(pos.catalog(), &before);
    }

    #[test]
    fn test_product_lifecycle() {
        let mut pos = session();

        let mut draft = ProductDraft::new("  Mocha ");
        draft.price = Some(4.25);
        draft.category = Category::Coffee;
        let mocha = pos.create_product(draft).unwrap();
        assert_eq!(mocha.name, "Mocha");
        assert_eq!(ids(&pos).last(), Some(&mocha.id.as_str()));

        let mut edit = ProductDraft::from_product(&mocha);
        edit.price = Some(4.5);
        let edited = pos.update_product(&mocha.id, edit).unwrap();
        assert_eq!(edited.id, mocha.id);

        pos.add_to_cart(&mocha.id).unwrap();
        assert!(pos.delete_product(&mocha.id).unwrap().is_some());
        assert!(pos.cart().is_empty());
        assert!(pos.delete_product(&mocha.id).unwrap().is_none());

        assert!(matches!(
            pos.update_product(&mocha.id, ProductDraft::new("Ghost")),
            Err(ProductError::NotFound(_))
        ));
        assert!(matches!(
            pos.add_to_cart(&mocha.id),
            Err(CartError::UnknownProduct(_))
        ));
    }

    #[test]
    fn test_create_requires_price() {
        let mut pos = session();
        assert!(matches!(
            pos.create_product(ProductDraft::new("Mocha")),
            Err(ProductError::Invalid(InvalidProduct::MissingPrice))
        ));
    }

    #[tokio::test]
    async fn test_sync_keeps_local_only_products() {
        let mut pos = session();
        let outcome = pos.sync().await;

        assert!(matches!(outcome, ReconcileOutcome::Applied { .. }));
        // Bundled ids 1 and 2 replace the local ones; nothing local-only remains
        assert_eq!(pos.catalog().get(&ProductId::new("1")).unwrap().name, "Espresso");

        let mut draft = ProductDraft::new("House Brew");
        draft.price = Some(1.0);
        let brew = pos.create_product(draft).unwrap();
        pos.sync().await;
        assert_eq!(pos.catalog().products().last().unwrap().id, brew.id);
    }

    #[test]
    fn test_export_current_catalog() {
        let pos = session();
        let artifact = pos.export(TransferFormat::Delimited).unwrap();
        assert!(artifact.contents.contains("\n1,One,1,,Otro,\n"));
    }
}
