//! Import and export file interface.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::catalog::import::{ImportResult, ImportSummary};
use crate::codec::delimited::{decode_delimited_with_report, encode_delimited, RowError};
use crate::codec::structured::{decode_structured, encode_structured};
use crate::codec::{FormatError, TransferFormat};
use crate::core::catalog::Catalog;
use crate::storage::PersistenceError;
use crate::utils::validation::{
    check_import_size, check_product_limit, validate_filename, ValidationError,
};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unsupported file '{0}': expected a .json or .csv file")]
    UnsupportedFormat(String),

    #[error("Invalid file name: {0}")]
    InvalidFileName(#[source] ValidationError),

    #[error("Import file too large: {0}")]
    TooLarge(#[source] ValidationError),

    #[error("Too many products: {0}")]
    TooManyProducts(#[source] ValidationError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read the imported file: {0}")]
    Format(#[from] FormatError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// A file picked for import: its name (used for format detection) and raw
/// contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImportFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read an import file from disk, refusing files over the size limit
    /// before loading them.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Read` if the file cannot be read,
    /// `ImportError::TooLarge` if it exceeds the size limit, and
    /// `ImportError::InvalidFileName` if the path has no file name.
    pub async fn read(path: &Path) -> Result<Self, ImportError> {
        let read_error = |source| ImportError::Read {
            path: path.to_path_buf(),
            source,
        };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(ImportError::InvalidFileName(ValidationError::EmptyFilename))?
            .to_string();

        let metadata = tokio::fs::metadata(path).await.map_err(read_error)?;
        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        check_import_size(size).map_err(ImportError::TooLarge)?;

        let bytes = tokio::fs::read(path).await.map_err(read_error)?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(Self { name, bytes })
    }
}

/// A validated and decoded import, ready to be presented to the operator
#[derive(Debug)]
pub struct DecodedImport {
    pub file_name: String,
    pub format: TransferFormat,
    pub catalog: Catalog,
    /// Recovered fields (delimited imports only)
    pub issues: Vec<RowError>,
}

/// Validate an import file and decode it according to its extension.
///
/// Nothing is committed here. Structured files are decoded strictly;
/// delimited files never fail to decode.
///
/// # Errors
///
/// Returns `ImportError` if the name is invalid or unsupported, the file is
/// too large or holds too many products, or a structured file is malformed.
pub fn decode_import(file: &ImportFile) -> Result<DecodedImport, ImportError> {
    let file_name = validate_filename(&file.name).map_err(ImportError::InvalidFileName)?;
    let format = TransferFormat::from_file_name(&file_name)
        .ok_or_else(|| ImportError::UnsupportedFormat(file.name.clone()))?;
    check_import_size(file.bytes.len()).map_err(ImportError::TooLarge)?;

    let text = String::from_utf8_lossy(&file.bytes);
    let (catalog, issues) = match format {
        TransferFormat::Structured => (decode_structured(&text)?, Vec::new()),
        TransferFormat::Delimited => {
            let decoded = decode_delimited_with_report(&text);
            (decoded.catalog, decoded.issues)
        }
    };
    check_product_limit(catalog.len()).map_err(ImportError::TooManyProducts)?;

    debug!(
        "Decoded {} products from {file_name} ({})",
        catalog.len(),
        format.display_name()
    );

    Ok(DecodedImport {
        file_name,
        format,
        catalog,
        issues,
    })
}

/// What an import ended up doing
#[derive(Debug)]
pub enum ImportOutcome {
    /// The file held no products; nothing was committed
    Empty { issues: Vec<RowError> },

    /// The operator declined; nothing was committed
    Cancelled { summary: ImportSummary },

    Applied {
        summary: ImportSummary,
        result: ImportResult,
        issues: Vec<RowError>,
    },
}

/// An exported inventory file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub contents: String,
}

impl ExportArtifact {
    /// Encode the catalog in `format`.
    ///
    /// # Errors
    ///
    /// Returns `FormatError` if the catalog cannot be serialized.
    pub fn encode(catalog: &Catalog, format: TransferFormat) -> Result<Self, FormatError> {
        let contents = match format {
            TransferFormat::Structured => encode_structured(catalog)?,
            TransferFormat::Delimited => encode_delimited(catalog)?,
        };
        Ok(Self {
            file_name: format.export_file_name(),
            mime_type: format.mime_type(),
            contents,
        })
    }
}
