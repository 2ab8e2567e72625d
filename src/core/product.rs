use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{Category, ProductId};

/// Label shown when a product carries no code (absent or empty)
pub const UNKNOWN_CODE_LABEL: &str = "DESCONOCIDO";

/// Reasons a product record is rejected by a validating parse
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidProduct {
    #[error("product id is blank")]
    BlankId,

    #[error("product '{0}' has a blank name")]
    BlankName(ProductId),

    #[error("product '{id}' has an invalid price: {price}")]
    InvalidPrice { id: ProductId, price: f64 },

    #[error("a price is required")]
    MissingPrice,
}

/// A single product in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Stable identifier, unique within a catalog
    pub id: ProductId,

    #[serde(rename = "nombre", alias = "name")]
    pub name: String,

    /// Non-negative price in the shop's currency
    #[serde(rename = "precio", alias = "price")]
    pub price: f64,

    /// Short inventory code, e.g. `CAF-01`. Absent and empty are kept distinct.
    #[serde(
        rename = "codigo",
        alias = "code",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,

    #[serde(rename = "categoria", alias = "category")]
    pub category: Category,

    #[serde(
        rename = "descripcion",
        alias = "description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        category: Category,
    ) -> Self {
        Self {
            id: ProductId::new(id),
            name: name.into(),
            price,
            code: None,
            category,
            description: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Code for display; absent and empty codes both render as unknown
    #[must_use]
    pub fn display_code(&self) -> &str {
        match self.code.as_deref() {
            Some(code) if !code.trim().is_empty() => code,
            _ => UNKNOWN_CODE_LABEL,
        }
    }

    /// Check the invariants every catalog entry must hold.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProduct` for a blank id or name, or a negative or
    /// non-finite price.
    pub fn validate(&self) -> Result<(), InvalidProduct> {
        if self.id.is_blank() {
            return Err(InvalidProduct::BlankId);
        }
        if self.name.trim().is_empty() {
            return Err(InvalidProduct::BlankName(self.id.clone()));
        }
        if !is_valid_price(self.price) {
            return Err(InvalidProduct::InvalidPrice {
                id: self.id.clone(),
                price: self.price,
            });
        }
        Ok(())
    }

    /// True when the name or code contains `needle` (case-insensitive)
    #[must_use]
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self
                .code
                .as_ref()
                .is_some_and(|code| code.to_lowercase().contains(&needle))
    }
}

#[must_use]
pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}

/// Format a price with two decimals for display
#[must_use]
pub fn format_price(price: f64) -> String {
    format!("{price:.2}")
}

/// A product being created or edited, before it has been committed.
///
/// Fields mirror `Product` but the price may still be missing and the id is
/// only assigned when the draft is built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductDraft {
    pub name: String,
    pub price: Option<f64>,
    pub code: Option<String>,
    pub category: Category,
    pub description: Option<String>,
}

impl ProductDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Start an edit from an existing product
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: Some(product.price),
            code: product.code.clone(),
            category: product.category,
            description: product.description.clone(),
        }
    }

    /// Turn the draft into a product. A new id is generated unless one is
    /// supplied (editing keeps the existing id).
    ///
    /// # Errors
    ///
    /// Returns `InvalidProduct::MissingPrice` when no price was entered, or
    /// any error from [`Product::validate`].
    pub fn build(self, id: Option<ProductId>) -> Result<Product, InvalidProduct> {
        let price = self.price.ok_or(InvalidProduct::MissingPrice)?;
        let product = Product {
            id: id.unwrap_or_else(ProductId::generate),
            name: self.name.trim().to_string(),
            price,
            code: non_blank(self.code),
            category: self.category,
            description: non_blank(self.description),
        };
        product.validate()?;
        Ok(product)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_code_unknown_for_absent_and_empty() {
        let absent = Product::new("1", "Latte", 3.5, Category::Coffee);
        assert_eq!(absent.display_code(), UNKNOWN_CODE_LABEL);

        let empty = absent.clone().with_code("");
        assert_eq!(empty.display_code(), UNKNOWN_CODE_LABEL);
        assert_ne!(absent, empty);

        let coded = absent.with_code("CAF-02");
        assert_eq!(coded.display_code(), "CAF-02");
    }

    #[test]
    fn test_validate_rejects_bad_products() {
        assert_eq!(
            Product::new("", "Latte", 1.0, Category::Coffee).validate(),
            Err(InvalidProduct::BlankId)
        );
        assert!(matches!(
            Product::new("1", "  ", 1.0, Category::Coffee).validate(),
            Err(InvalidProduct::BlankName(_))
        ));
        assert!(matches!(
            Product::new("1", "Latte", -0.5, Category::Coffee).validate(),
            Err(InvalidProduct::InvalidPrice { .. })
        ));
        assert!(matches!(
            Product::new("1", "Latte", f64::NAN, Category::Coffee).validate(),
            Err(InvalidProduct::InvalidPrice { .. })
        ));
        assert!(Product::new("1", "Latte", 0.0, Category::Coffee)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_serialization_omits_absent_fields() {
        let product = Product::new("1", "Latte", 3.5, Category::Coffee);
        let json = serde_json::to_string(&product).unwrap();
        assert_eq!(
            json,
            r#"{"id":"1","nombre":"Latte","precio":3.5,"categoria":"Café"}"#
        );
    }

    #[test]
    fn test_draft_build_generates_id_and_trims() {
        let mut draft = ProductDraft::new(" Mocha ");
        draft.price = Some(4.0);
        draft.code = Some("  ".to_string());
        let product = draft.build(None).unwrap();

        assert_eq!(product.name, "Mocha");
        assert!(!product.id.is_blank());
        assert_eq!(product.code, None);
        assert_eq!(product.category, Category::Other);
    }

    #[test]
    fn test_draft_requires_price() {
        let draft = ProductDraft::new("Mocha");
        assert_eq!(draft.build(None), Err(InvalidProduct::MissingPrice));
    }

    #[test]
    fn test_draft_edit_keeps_id() {
        let original = Product::new("7", "Cold Brew", 4.0, Category::ColdDrink);
        let mut draft = ProductDraft::from_product(&original);
        draft.price = Some(4.25);
        let edited = draft.build(Some(original.id.clone())).unwrap();

        assert_eq!(edited.id, original.id);
        assert!((edited.price - 4.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_matches_text_on_name_or_code() {
        let product = Product::new("1", "Vanilla Latte", 4.5, Category::Coffee).with_code("VL-01");
        assert!(product.matches_text("latte"));
        assert!(product.matches_text("vl-"));
        assert!(!product.matches_text("mocha"));
    }
}
