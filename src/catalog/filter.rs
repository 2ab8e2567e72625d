use crate::core::catalog::Catalog;
use crate::core::product::Product;
use crate::core::types::Category;

/// Narrows the catalog by free text (name or code) and category
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    text: Option<String>,
    category: Option<Category>,
}

impl ProductFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Match products whose name or code contains `text`, ignoring case.
    /// Blank text matches everything.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text = if text.trim().is_empty() {
            None
        } else {
            Some(text)
        };
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category {
            if product.category != category {
                return false;
            }
        }
        match &self.text {
            Some(text) => product.matches_text(text),
            None => true,
        }
    }

    /// Matching products in catalog order
    pub fn apply<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Product> {
        catalog.iter().filter(|p| self.matches(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_products(vec![
            Product::new("1", "Latte", 3.5, Category::Coffee).with_code("CAF-02"),
            Product::new("2", "Iced Latte", 4.0, Category::ColdDrink),
            Product::new("3", "Croissant", 2.75, Category::Bakery).with_code("PAN-01"),
        ])
    }

    #[test]
    fn test_no_filter_matches_all() {
        let catalog = catalog();
        assert_eq!(ProductFilter::new().apply(&catalog).len(), 3);
        assert_eq!(ProductFilter::new().with_text("  ").apply(&catalog).len(), 3);
    }

    #[test]
    fn test_text_and_category_combine() {
        let catalog = catalog();

        let lattes = ProductFilter::new().with_text("LATTE").apply(&catalog);
        assert_eq!(lattes.len(), 2);

        let cold = ProductFilter::new()
            .with_text("latte")
            .with_category(Category::ColdDrink)
            .apply(&catalog);
        assert_eq!(cold.len(), 1);
        assert_eq!(cold[0].name, "Iced Latte");

        let by_code = ProductFilter::new().with_text("pan-").apply(&catalog);
        assert_eq!(by_code[0].name, "Croissant");
    }
}
