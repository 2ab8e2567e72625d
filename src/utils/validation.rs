//! Centralized validation for import files.

use thiserror::Error;

/// Maximum number of products accepted from a single import (DOS protection)
pub const MAX_PRODUCTS: usize = 50_000;

/// Maximum size of an import file in bytes
pub const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;

/// Security-related constants for input validation
pub const MAX_FILENAME_LENGTH: usize = 255;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Filename is empty")]
    EmptyFilename,

    #[error("Filename is longer than {MAX_FILENAME_LENGTH} characters")]
    FilenameTooLong,

    #[error("Filename contains invalid characters or path components")]
    InvalidFilename,

    #[error("File is {size} bytes; the limit is {MAX_IMPORT_BYTES}")]
    TooLarge { size: usize },

    #[error("File holds {count} products; the limit is {MAX_PRODUCTS}")]
    TooManyProducts { count: usize },
}

/// Check if a product count is within the import limit.
///
/// # Errors
///
/// Returns `ValidationError::TooManyProducts` if `count` exceeds
/// [`MAX_PRODUCTS`].
pub fn check_product_limit(count: usize) -> Result<(), ValidationError> {
    if count > MAX_PRODUCTS {
        Err(ValidationError::TooManyProducts { count })
    } else {
        Ok(())
    }
}

/// Check if an import file is small enough to be read.
///
/// # Errors
///
/// Returns `ValidationError::TooLarge` if `size` exceeds [`MAX_IMPORT_BYTES`].
pub fn check_import_size(size: usize) -> Result<(), ValidationError> {
    if size > MAX_IMPORT_BYTES {
        Err(ValidationError::TooLarge { size })
    } else {
        Ok(())
    }
}

/// Validate and sanitize the name of an import file.
///
/// Only the name is inspected, never opened. Names with path separators,
/// traversal sequences or control characters are rejected; anything else
/// is reduced to letters, digits, spaces and `.-_`.
///
/// # Examples
///
/// ```
/// use cafe_gestor::utils::validation::validate_filename;
///
/// assert_eq!(validate_filename("inventario (1).csv").unwrap(), "inventario 1.csv");
/// assert!(validate_filename("../productos.json").is_err());
/// ```
///
/// # Errors
///
/// Returns `ValidationError::EmptyFilename` for blank names,
/// `ValidationError::FilenameTooLong` for names over
/// [`MAX_FILENAME_LENGTH`] and `ValidationError::InvalidFilename` for
/// unsafe names.
pub fn validate_filename(filename: &str) -> Result<String, ValidationError> {
    if filename.trim().is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(ValidationError::FilenameTooLong);
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ValidationError::InvalidFilename);
    }

    if filename.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFilename);
    }

    let sanitized: String = filename
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
        .collect();

    if sanitized.trim().is_empty() {
        return Err(ValidationError::InvalidFilename);
    }

    // Hidden files only pass when they still carry an import extension
    if sanitized.starts_with('.') && !has_import_extension(&sanitized) {
        return Err(ValidationError::InvalidFilename);
    }

    Ok(sanitized)
}

fn has_import_extension(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    [".json", ".csv"]
        .iter()
        .any(|ext| lower.len() > ext.len() && lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filename_safe() {
        assert!(validate_filename("productos.json").is_ok());
        assert!(validate_filename("inventario-2024.csv").is_ok());
        assert!(validate_filename("mi_inventario.csv").is_ok());
        assert!(validate_filename("Menú Café.json").is_ok());
    }

    #[test]
    fn test_validate_filename_dangerous() {
        assert!(validate_filename("../etc/passwd").is_err());
        assert!(validate_filename("..\\windows\\system32").is_err());
        assert!(validate_filename("data/../../secret.csv").is_err());

        assert!(validate_filename("test\0.csv").is_err());
        assert!(validate_filename("test\x01.csv").is_err());

        assert_eq!(
            validate_filename(&"a".repeat(300)),
            Err(ValidationError::FilenameTooLong)
        );

        assert_eq!(validate_filename(""), Err(ValidationError::EmptyFilename));
        assert_eq!(validate_filename("   "), Err(ValidationError::EmptyFilename));

        assert!(validate_filename(".hidden").is_err());
        assert!(validate_filename(".csv").is_err());
        assert!(validate_filename(".backup.json").is_ok());
    }

    #[test]
    fn test_validate_filename_sanitization() {
        assert_eq!(
            validate_filename("inventario@#$%final.csv").unwrap(),
            "inventariofinal.csv"
        );
        assert_eq!(
            validate_filename("my-file_123.json").unwrap(),
            "my-file_123.json"
        );
        assert_eq!(
            validate_filename("@#$%"),
            Err(ValidationError::InvalidFilename)
        );
    }

    #[test]
    fn test_limits() {
        assert!(check_product_limit(MAX_PRODUCTS).is_ok());
        assert_eq!(
            check_product_limit(MAX_PRODUCTS + 1),
            Err(ValidationError::TooManyProducts {
                count: MAX_PRODUCTS + 1
            })
        );
        assert!(check_import_size(MAX_IMPORT_BYTES).is_ok());
        assert!(check_import_size(MAX_IMPORT_BYTES + 1).is_err());
    }
}
