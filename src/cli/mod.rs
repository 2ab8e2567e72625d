//! Command-line interface for cafe-gestor.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **sync**: Reconcile the local inventory with the authoritative catalog
//! - **catalog**: List, show, add, edit or remove products
//! - **import**: Merge or replace the inventory from a JSON or CSV file
//! - **export**: Write the inventory as JSON or CSV
//! - **cart**: Manage the current order
//! - **suggest**: Suggest price, code and description for a new product
//!
//! Every command starts by reconciling the local inventory with the
//! authoritative catalog, so the inventory is always current.
//!
//! ## Usage
//!
//! ```text
//! # List coffee products
//! cafe-gestor catalog list --category cafe
//!
//! # Add a product, prefilled by the suggestion service
//! cafe-gestor catalog add --name "Vanilla Latte" --suggest
//!
//! # Merge a spreadsheet export into the inventory
//! cafe-gestor import inventario.csv --strategy merge --yes
//!
//! # Export for a spreadsheet
//! cafe-gestor export csv --output inventario_cafeteria.csv
//!
//! # Use a catalog served over HTTP
//! cafe-gestor --snapshot https://example.com/productos.json sync
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::app::PointOfSale;
use crate::catalog::snapshot::SnapshotSource;
use crate::catalog::store::ReconcileOutcome;
use crate::core::types::Category;
use crate::storage::DirectoryStore;

pub mod cart;
pub mod catalog;
pub mod suggest;
pub mod sync;
pub mod transfer;

#[derive(Parser)]
#[command(name = "cafe-gestor")]
#[command(version)]
#[command(about = "Manage a café's product inventory and orders")]
#[command(
    long_about = "cafe-gestor keeps a café's product inventory on this machine.\n\nOn every run the local inventory is reconciled with the authoritative catalog:\n- Products from the authoritative catalog always win\n- Products that only exist locally are kept\n\nThe inventory can be imported from and exported to JSON or CSV files."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Directory holding the local inventory and cart
    #[arg(long, global = true, env = "CAFE_GESTOR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Authoritative catalog: "embedded", a JSON file or an http(s) URL
    #[arg(
        long,
        global = true,
        env = "CAFE_GESTOR_SNAPSHOT",
        default_value = "embedded"
    )]
    pub snapshot: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile the local inventory with the authoritative catalog
    Sync,

    /// Browse and edit the inventory
    Catalog(catalog::CatalogArgs),

    /// Import products from a JSON or CSV file
    Import(transfer::ImportArgs),

    /// Export the inventory to a JSON or CSV file
    Export(transfer::ExportArgs),

    /// Manage the current order
    Cart(cart::CartArgs),

    /// Suggest data for a new product
    Suggest(suggest::SuggestArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl GlobalArgs {
    /// Open the session described by the global options and reconcile it
    /// with the authoritative catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory can be determined or the async
    /// runtime cannot be created. An unavailable catalog is not an error.
    pub fn open_session(&self) -> anyhow::Result<(PointOfSale, ReconcileOutcome)> {
        let runtime = tokio::runtime::Runtime::new()?;
        self.open_session_with(&runtime)
    }

    /// Like [`GlobalArgs::open_session`], on a runtime the caller keeps using
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory can be determined.
    pub fn open_session_with(
        &self,
        runtime: &tokio::runtime::Runtime,
    ) -> anyhow::Result<(PointOfSale, ReconcileOutcome)> {
        let data_dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => DirectoryStore::default_dir()
                .context("No data directory available; pass --data-dir")?,
        };
        debug!("Using data directory {}", data_dir.display());

        let source = SnapshotSource::parse(&self.snapshot);
        let mut pos = PointOfSale::open(Arc::new(DirectoryStore::new(data_dir)), source);

        let outcome = runtime.block_on(pos.sync());
        if self.verbose {
            eprintln!("{}", sync::describe(&outcome, pos.source()));
        }
        Ok((pos, outcome))
    }
}

/// Parse a category from the command line (Spanish or English, accents
/// optional)
pub(crate) fn parse_category(s: &str) -> Result<Category, String> {
    Category::parse(s).ok_or_else(|| {
        let labels: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
        format!("unknown category '{s}' (expected one of: {})", labels.join(", "))
    })
}

/// Truncate to at most `max_len` characters, marking the cut with "..."
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_session_shares_callers_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nuevos.csv");
        std::fs::write(
            &file,
            "id,nombre,precio,codigo,categoria,descripcion\nx-1,Mocha,4,,Café,\n",
        )
        .unwrap();
        let global = GlobalArgs {
            data_dir: Some(dir.path().join("data")),
            snapshot: "embedded".to_string(),
            verbose: false,
            format: OutputFormat::Text,
        };

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (pos, outcome) = global.open_session_with(&runtime).unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Applied { .. }));
        assert!(!pos.catalog().is_empty());

        let import = runtime.block_on(crate::app::ImportFile::read(&file)).unwrap();
        assert_eq!(import.name, "nuevos.csv");
    }

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category("panaderia"), Ok(Category::Bakery));
        assert!(parse_category("sushi").unwrap_err().contains("Café"));
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("Café", 10), "Café");
        assert_eq!(truncate("Sándwich de Pavo", 8), "Sándw...");
    }
}
