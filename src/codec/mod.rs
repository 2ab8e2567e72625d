//! Interchange formats for the product catalog.
//!
//! Two formats are supported:
//!
//! - **Structured** (`.json`): a JSON array of product records. This is also
//!   the format of the bundled catalog and of persisted local state.
//! - **Delimited** (`.csv`): a comma-separated table with a fixed header row,
//!   meant for spreadsheet tools.
//!
//! Decoding structured text is strict: a malformed document or a record
//! missing a required field fails the whole decode. Decoding delimited text
//! never fails; bad fields fall back to defaults and are reported per row.
//!
//! ## Example
//!
//! ```rust
//! use cafe_gestor::codec::delimited::{decode_delimited, encode_delimited};
//!
//! let csv = "id,nombre,precio,codigo,categoria,descripcion\n\
//!            1,\"Vanilla, Latte\",4.50,VL-01,Café,Rich\n";
//! let catalog = decode_delimited(csv);
//! assert_eq!(catalog.len(), 1);
//!
//! let exported = encode_delimited(&catalog).unwrap();
//! assert!(exported.starts_with('\u{feff}'));
//! ```

use std::path::Path;

use thiserror::Error;

use crate::core::product::InvalidProduct;

pub mod delimited;
pub mod structured;

/// Base name of exported inventory files
pub const EXPORT_BASE_NAME: &str = "inventario_cafeteria";

/// Errors raised while encoding or strictly decoding a catalog
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid product record at index {index}: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: InvalidProduct,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to produce output: {0}")]
    Output(String),
}

/// Interchange format of an import or export file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferFormat {
    /// JSON array of product records
    Structured,
    /// Comma-separated table
    Delimited,
}

impl TransferFormat {
    /// Infer the format from a file name's extension (`.json` or `.csv`,
    /// case-insensitive). Returns `None` for anything else.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Structured),
            "csv" => Some(Self::Delimited),
            _ => None,
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Structured => "json",
            Self::Delimited => "csv",
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Structured => "application/json",
            Self::Delimited => "text/csv;charset=utf-8",
        }
    }

    /// File name for an exported inventory in this format
    #[must_use]
    pub fn export_file_name(self) -> String {
        format!("{EXPORT_BASE_NAME}.{}", self.extension())
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Structured => "JSON",
            Self::Delimited => "CSV",
        }
    }
}
