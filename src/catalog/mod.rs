//! The live product catalog and the operations that reshape it.
//!
//! At startup the authoritative snapshot (bundled, a file or a URL) is
//! reconciled with the locally persisted catalog: upstream products win on
//! id collision and products only known locally are appended. Afterwards the
//! [`store::CatalogStore`] is the single owner of the catalog and writes every
//! change through to storage.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cafe_gestor::catalog::snapshot::EMBEDDED_SNAPSHOT;
//! use cafe_gestor::catalog::store::{CatalogStore, ReconcileOutcome};
//! use cafe_gestor::storage::MemoryStore;
//!
//! let mut store = CatalogStore::open(Arc::new(MemoryStore::new()));
//! let outcome = store.reconcile(Ok(EMBEDDED_SNAPSHOT.to_string()));
//! assert!(matches!(outcome, ReconcileOutcome::Applied { .. }));
//! assert!(!store.get().is_empty());
//! ```
//!
//! ## Modules
//!
//! - [`snapshot`]: where the authoritative catalog comes from
//! - [`reconcile`]: startup merge of authoritative and local catalogs
//! - [`import`]: merge and replace strategies for imported files
//! - [`filter`]: text and category search
//! - [`store`]: owner of the live catalog

pub mod filter;
pub mod import;
pub mod reconcile;
pub mod snapshot;
pub mod store;
