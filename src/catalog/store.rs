use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::import::{self, ImportResult, ImportStrategy};
use crate::catalog::reconcile::{self, SnapshotError};
use crate::catalog::snapshot::FetchError;
use crate::core::catalog::{Catalog, Upsert};
use crate::core::product::Product;
use crate::core::types::ProductId;
use crate::storage::{KeyValueStore, Mirror, PersistenceError, CATALOG_KEY};

/// What a startup reconciliation did
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// The snapshot was unusable; the current catalog was left untouched
    Skipped { reason: SnapshotError },

    /// The catalog was replaced by the merged result
    Applied {
        authoritative: usize,
        local_only: usize,
        /// Set when the merged catalog could not be persisted. The in-memory
        /// catalog is still the merged one.
        persistence_error: Option<PersistenceError>,
    },
}

/// Single owner of the live catalog.
///
/// Every mutation is written through to storage before it returns. The
/// in-memory change is kept even when the write fails.
pub struct CatalogStore {
    catalog: Catalog,
    mirror: Mirror,
}

impl CatalogStore {
    /// Open the store with the locally persisted catalog, so products are
    /// available before the authoritative snapshot arrives. Missing or
    /// unreadable local state yields an empty catalog.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let mirror = Mirror::new(storage, CATALOG_KEY);
        let catalog = match mirror.load() {
            Ok(text) => reconcile::decode_local(text.as_deref()).unwrap_or_default(),
            Err(e) => {
                warn!("Could not read local catalog: {e}");
                Catalog::new()
            }
        };
        debug!("Opened catalog store with {} products", catalog.len());
        Self { catalog, mirror }
    }

    pub fn get(&self) -> &Catalog {
        &self.catalog
    }

    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.catalog.get(id)
    }

    /// Replace the whole catalog
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the write fails (surfaced once per run
    /// of failures).
    pub fn set(&mut self, catalog: Catalog) -> Result<(), PersistenceError> {
        self.catalog = catalog;
        self.persist()
    }

    /// Insert a new product at the end or update an existing one in place
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the write fails.
    pub fn upsert(&mut self, product: Product) -> Result<Upsert, PersistenceError> {
        let outcome = self.catalog.upsert(product);
        self.persist()?;
        Ok(outcome)
    }

    /// Remove a product. Removing an unknown id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the write fails.
    pub fn remove(&mut self, id: &ProductId) -> Result<Option<Product>, PersistenceError> {
        let Some(removed) = self.catalog.remove(id) else {
            debug!("Remove of unknown product '{id}' ignored");
            return Ok(None);
        };
        self.persist()?;
        Ok(Some(removed))
    }

    /// Recompute the catalog from the authoritative snapshot and the
    /// persisted local snapshot, then persist the result.
    ///
    /// Never fails: an unusable snapshot leaves the catalog untouched and a
    /// failed write is reported in the outcome.
    pub fn reconcile(&mut self, snapshot: Result<String, FetchError>) -> ReconcileOutcome {
        let authoritative = match reconcile::decode_snapshot(snapshot) {
            Ok(catalog) => catalog,
            Err(reason) => {
                warn!("Keeping current catalog: {reason}");
                return ReconcileOutcome::Skipped { reason };
            }
        };

        let local_text = self.mirror.load().unwrap_or_else(|e| {
            warn!("Could not read local catalog: {e}");
            None
        });
        let local = reconcile::decode_local(local_text.as_deref());

        let result = reconcile::reconcile(authoritative, local.as_ref());
        let authoritative = result.authoritative;
        let local_only = result.local_only.len();

        let persistence_error = self.set(result.catalog).err();
        info!(
            "Reconciled catalog: {} products ({} local-only)",
            self.catalog.len(),
            local_only
        );

        ReconcileOutcome::Applied {
            authoritative,
            local_only,
            persistence_error,
        }
    }

    /// Combine an imported catalog with the current one and persist it
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the write fails. The import is still
    /// applied in memory.
    pub fn apply_import(
        &mut self,
        strategy: ImportStrategy,
        imported: &Catalog,
    ) -> Result<ImportResult, PersistenceError> {
        let result = import::apply(strategy, &self.catalog, imported);
        info!(
            "Import ({strategy}): {} added, {} updated, {} removed",
            result.added.len(),
            result.updated.len(),
            result.removed.len()
        );
        self.set(result.catalog.clone())?;
        Ok(result)
    }

    fn persist(&mut self) -> Result<(), PersistenceError> {
        self.mirror.write_json(self.catalog.products())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::structured::decode_structured;
    use crate::core::types::Category;
    use crate::storage::testing::FlakyStore;
    use crate::storage::MemoryStore;

    const AUTHORITATIVE: &str =
        r#"[{"id":"1","nombre":"Latte","precio":3.5,"categoria":"Café"}]"#;
    const LOCAL: &str = r#"[
        {"id":"1","nombre":"Latte OLD","precio":2,"categoria":"Café"},
        {"id":"local-9","nombre":"House Brew","precio":1,"categoria":"Café"}
    ]"#;

    fn persisted(storage: &dyn KeyValueStore) -> Catalog {
        decode_structured(&storage.load(CATALOG_KEY).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn test_open_loads_local_state() {
        let storage = Arc::new(MemoryStore::new().with_entry(CATALOG_KEY, LOCAL));
        let store = CatalogStore::open(storage);
        assert_eq!(store.get().len(), 2);
    }

    #[test]
    fn test_open_with_corrupt_state_is_empty() {
        let storage = Arc::new(MemoryStore::new().with_entry(CATALOG_KEY, "{oops"));
        let store = CatalogStore::open(storage);
        assert!(store.get().is_empty());
    }

    #[test]
    fn test_reconcile_scenario_and_persist() {
        let storage = Arc::new(MemoryStore::new().with_entry(CATALOG_KEY, LOCAL));
        let mut store = CatalogStore::open(storage.clone());

        let outcome = store.reconcile(Ok(AUTHORITATIVE.to_string()));
        assert!(matches!(
            outcome,
            ReconcileOutcome::Applied {
                authoritative: 1,
                local_only: 1,
                persistence_error: None
            }
        ));

        let latte = store.product(&ProductId::new("1")).unwrap();
        assert_eq!(latte.name, "Latte");
        assert!((latte.price - 3.5).abs() < f64::EPSILON);
        assert_eq!(store.get(), &persisted(&*storage));

        // A second run yields the same catalog
        let before = store.get().clone();
        store.reconcile(Ok(AUTHORITATIVE.to_string()));
        assert_eq!(store.get(), &before);
    }

    #[test]
    fn test_reconcile_keeps_state_when_snapshot_fails() {
        let storage = Arc::new(MemoryStore::new().with_entry(CATALOG_KEY, LOCAL));
        let mut store = CatalogStore::open(storage);
        let before = store.get().clone();

        let failed = Err(FetchError::Status {
            url: "http://localhost/productos.json".to_string(),
            status: 503,
        });
        assert!(matches!(
            store.reconcile(failed),
            ReconcileOutcome::Skipped { .. }
        ));
        assert!(matches!(
            store.reconcile(Ok("<html>".to_string())),
            ReconcileOutcome::Skipped {
                reason: SnapshotError::Format(_)
            }
        ));
        assert_eq!(store.get(), &before);
    }

    #[test]
    fn test_reconcile_survives_persistence_failure() {
        let storage = Arc::new(FlakyStore::default());
        storage.set_rejecting(true);
        let mut store = CatalogStore::open(storage);

        let outcome = store.reconcile(Ok(AUTHORITATIVE.to_string()));
        assert!(matches!(
            outcome,
            ReconcileOutcome::Applied {
                persistence_error: Some(_),
                ..
            }
        ));
        assert_eq!(store.get().len(), 1);
    }

    #[test]
    fn test_upsert_and_remove_write_through() {
        let storage = Arc::new(MemoryStore::new());
        let mut store = CatalogStore::open(storage.clone());

        let mocha = Product::new("m", "Mocha", 4.0, Category::Coffee);
        assert_eq!(store.upsert(mocha.clone()).unwrap(), Upsert::Inserted);
        assert_eq!(persisted(&*storage).len(), 1);

        let renamed = Product {
            name: "Mocha Blanco".to_string(),
            ..mocha
        };
        assert_eq!(store.upsert(renamed).unwrap(), Upsert::Updated);
        assert_eq!(
            persisted(&*storage)
                .get(&ProductId::new("m"))
                .unwrap()
                .name,
            "Mocha Blanco"
        );

        assert!(store.remove(&ProductId::new("m")).unwrap().is_some());
        assert!(store.remove(&ProductId::new("m")).unwrap().is_none());
        assert!(persisted(&*storage).is_empty());
    }

    #[test]
    fn test_persistence_error_surfaces_once_memory_kept() {
        let storage = Arc::new(FlakyStore::default());
        let mut store = CatalogStore::open(storage.clone());
        storage.set_rejecting(true);

        let first = store.upsert(Product::new("a", "A", 1.0, Category::Other));
        let second = store.upsert(Product::new("b", "B", 1.0, Category::Other));
        assert!(first.is_err());
        assert!(second.is_ok());
        assert_eq!(store.get().len(), 2);
    }

    #[test]
    fn test_apply_import_persists() {
        let storage = Arc::new(MemoryStore::new());
        let mut store = CatalogStore::open(storage.clone());
        store
            .set(Catalog::from_products(vec![Product::new(
                "1",
                "One",
                1.0,
                Category::Other,
            )]))
            .unwrap();

        let imported =
            Catalog::from_products(vec![Product::new("2", "Two", 2.0, Category::Other)]);
        let result = store
            .apply_import(ImportStrategy::Replace, &imported)
            .unwrap();

        assert_eq!(result.removed, vec![ProductId::new("1")]);
        assert_eq!(store.get(), &imported);
        assert_eq!(persisted(&*storage), imported);
    }
}
