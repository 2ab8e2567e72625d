//! # cafe-gestor
//!
//! A point-of-sale catalog manager for a small café: a product inventory, a
//! shopping cart, and import/export of the inventory as JSON or CSV.
//!
//! The inventory is kept on the operator's machine and survives restarts.
//! Every session starts by reconciling it with an authoritative catalog
//! (bundled with the binary, or read from a file or URL): upstream products
//! win, and products that only exist locally are kept.
//!
//! ## Features
//!
//! - **Reconciliation**: upstream catalog plus local-only products, idempotent
//! - **Import**: JSON (strict) or CSV (permissive, with a per-row report),
//!   merged into or replacing the current catalog
//! - **Export**: JSON or CSV (`inventario_cafeteria.<ext>`, CSV with a BOM)
//! - **Cart**: quantity aggregation and totals, pruned when products go away
//! - **Suggestions**: optional price/code/description prefill for new products
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cafe_gestor::{PointOfSale, ProductDraft, SnapshotSource, TransferFormat};
//! use cafe_gestor::storage::MemoryStore;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let mut pos = PointOfSale::open(Arc::new(MemoryStore::new()), SnapshotSource::Embedded);
//! rt.block_on(pos.sync());
//!
//! let mut draft = ProductDraft::new("Mocha");
//! draft.price = Some(4.25);
//! let mocha = pos.create_product(draft).unwrap();
//! pos.add_to_cart(&mocha.id).unwrap();
//!
//! let csv = pos.export(TransferFormat::Delimited).unwrap();
//! assert!(csv.contents.contains("Mocha"));
//! ```
//!
//! ## Modules
//!
//! - [`core`]: products, categories and the catalog collection
//! - [`codec`]: JSON and CSV interchange formats
//! - [`catalog`]: snapshot sources, reconciliation, import strategies and the store
//! - [`storage`]: key/value persistence
//! - [`cart`]: the current order
//! - [`suggest`]: product data suggestions
//! - [`app`]: the point-of-sale session tying it together
//! - [`cli`]: command-line interface implementation

pub mod app;
pub mod cart;
pub mod catalog;
pub mod cli;
pub mod codec;
pub mod core;
pub mod storage;
pub mod suggest;
pub mod utils;

// Re-export commonly used types for convenience
pub use app::{ExportArtifact, ImportError, ImportFile, ImportOutcome, PointOfSale};
pub use catalog::import::{ImportDecision, ImportStrategy, ImportSummary};
pub use catalog::snapshot::SnapshotSource;
pub use catalog::store::CatalogStore;
pub use codec::TransferFormat;
pub use core::catalog::Catalog;
pub use core::product::{Product, ProductDraft};
pub use core::types::*;
