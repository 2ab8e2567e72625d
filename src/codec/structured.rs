use crate::codec::FormatError;
use crate::core::catalog::Catalog;
use crate::core::product::Product;

/// Serialize the catalog as a pretty-printed JSON array in catalog order.
/// Absent optional fields are omitted.
///
/// # Errors
///
/// Returns `FormatError::Json` if serialization fails.
pub fn encode_structured(catalog: &Catalog) -> Result<String, FormatError> {
    Ok(serde_json::to_string_pretty(catalog.products())?)
}

/// Parse a JSON array of product records.
///
/// A leading byte-order marker is tolerated.
///
/// # Errors
///
/// Returns `FormatError::Json` if the text is not a JSON array of records or
/// a record lacks `id`, `nombre`, `precio` or `categoria` (or carries an
/// unknown category), and `FormatError::InvalidRecord` if a record has a
/// blank id or name or a negative price.
pub fn decode_structured(text: &str) -> Result<Catalog, FormatError> {
    let text = text.trim_start_matches('\u{feff}');
    let products: Vec<Product> = serde_json::from_str(text)?;

    for (index, product) in products.iter().enumerate() {
        product
            .validate()
            .map_err(|source| FormatError::InvalidRecord { index, source })?;
    }

    Ok(Catalog::from_products(products))
}
