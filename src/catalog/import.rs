use std::collections::HashSet;

use crate::codec::TransferFormat;
use crate::core::catalog::{Catalog, Upsert};
use crate::core::types::ProductId;

/// How an imported catalog is combined with the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStrategy {
    /// Overlay imported products onto the current catalog by id
    Merge,
    /// Discard the current catalog in favour of the imported one
    Replace,
}

impl std::fmt::Display for ImportStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merge => write!(f, "merge"),
            Self::Replace => write!(f, "replace"),
        }
    }
}

/// The combined catalog and how it differs from the one it replaces
#[derive(Debug, Clone, PartialEq)]
pub struct ImportResult {
    pub strategy: ImportStrategy,
    pub catalog: Catalog,
    /// Imported ids that were not in the current catalog
    pub added: Vec<ProductId>,
    /// Imported ids that overwrote a current product
    pub updated: Vec<ProductId>,
    /// Current ids absent from the result (only ever non-empty for replace).
    /// Cart lines for these ids must be pruned.
    pub removed: Vec<ProductId>,
}

/// Overlay `imported` onto `current`. Imported products win on id collision;
/// current order is kept and new ids follow in imported order.
#[must_use]
pub fn merge(current: &Catalog, imported: &Catalog) -> ImportResult {
    let mut catalog = current.clone();
    let mut added = Vec::new();
    let mut updated = Vec::new();

    for product in imported {
        let id = product.id.clone();
        match catalog.upsert(product.clone()) {
            Upsert::Inserted => added.push(id),
            Upsert::Updated => updated.push(id),
        }
    }

    ImportResult {
        strategy: ImportStrategy::Merge,
        catalog,
        added,
        updated,
        removed: Vec::new(),
    }
}

/// The result is exactly `imported`.
#[must_use]
pub fn replace(current: &Catalog, imported: &Catalog) -> ImportResult {
    let (updated, added): (Vec<ProductId>, Vec<ProductId>) = imported
        .ids()
        .cloned()
        .partition(|id| current.contains(id));

    let removed = current
        .ids()
        .filter(|id| !imported.contains(id))
        .cloned()
        .collect();

    ImportResult {
        strategy: ImportStrategy::Replace,
        catalog: imported.clone(),
        added,
        updated,
        removed,
    }
}

#[must_use]
pub fn apply(strategy: ImportStrategy, current: &Catalog, imported: &Catalog) -> ImportResult {
    match strategy {
        ImportStrategy::Merge => merge(current, imported),
        ImportStrategy::Replace => replace(current, imported),
    }
}

/// What the operator is shown before choosing a strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub file_name: String,
    pub format: TransferFormat,
    /// Products read from the file
    pub record_count: usize,
    /// Imported ids not in the current catalog
    pub new_count: usize,
    /// Imported ids that already exist and would be overwritten by a merge
    pub overlapping_count: usize,
    /// Products in the current catalog
    pub current_count: usize,
}

impl ImportSummary {
    pub fn new(
        file_name: impl Into<String>,
        format: TransferFormat,
        current: &Catalog,
        imported: &Catalog,
    ) -> Self {
        let current_ids: HashSet<&ProductId> = current.ids().collect();
        let overlapping_count = imported
            .ids()
            .filter(|id| current_ids.contains(id))
            .count();

        Self {
            file_name: file_name.into(),
            format,
            record_count: imported.len(),
            new_count: imported.len() - overlapping_count,
            overlapping_count,
            current_count: current.len(),
        }
    }
}

/// The operator's answer to an import summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportDecision {
    Merge,
    Replace,
    Cancel,
}

impl ImportDecision {
    #[must_use]
    pub fn strategy(self) -> Option<ImportStrategy> {
        match self {
            Self::Merge => Some(ImportStrategy::Merge),
            Self::Replace => Some(ImportStrategy::Replace),
            Self::Cancel => None,
        }
    }
}

impl From<ImportStrategy> for ImportDecision {
    fn from(strategy: ImportStrategy) -> Self {
        match strategy {
            ImportStrategy::Merge => Self::Merge,
            ImportStrategy::Replace => Self::Replace,
        }
    }
}

/// Asked once per import, after decoding and before anything is committed
pub trait ImportDecider {
    fn decide(&mut self, summary: &ImportSummary) -> ImportDecision;
}

impl<F> ImportDecider for F
where
    F: FnMut(&ImportSummary) -> ImportDecision,
{
    fn decide(&mut self, summary: &ImportSummary) -> ImportDecision {
        self(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::product::Product;
    use crate::core::types::Category;

    fn product(id: &str, name: &str) -> Product {
        Product::new(id, name, 2.0, Category::Bakery)
    }

    fn ids(catalog: &Catalog) -> Vec<&str> {
        catalog.ids().map(ProductId::as_str).collect()
    }

    #[test]
    fn test_merge_orders_and_overwrites() {
        let current = Catalog::from_products(vec![product("1", "One"), product("2", "Two")]);
        let imported =
            Catalog::from_products(vec![product("2", "Two (imported)"), product("3", "Three")]);

        let result = merge(&current, &imported);

        assert_eq!(ids(&result.catalog), vec!["1", "2", "3"]);
        assert_eq!(
            result.catalog.get(&ProductId::new("2")).unwrap().name,
            "Two (imported)"
        );
        assert_eq!(result.added, vec![ProductId::new("3")]);
        assert_eq!(result.updated, vec![ProductId::new("2")]);
        assert!(result.removed.is_empty());
    }

    #[test]
    fn test_merge_imported_version_always_wins() {
        let current = Catalog::from_products(vec![product("1", "Old"), product("2", "Old")]);
        let imported = Catalog::from_products(vec![product("2", "New"), product("1", "New")]);

        let result = merge(&current, &imported);
        assert_eq!(ids(&result.catalog), vec!["1", "2"]);
        assert!(result.catalog.iter().all(|p| p.name == "New"));
    }

    #[test]
    fn test_replace_is_exactly_imported() {
        let current = Catalog::from_products(vec![product("1", "One"), product("2", "Two")]);
        let imported = Catalog::from_products(vec![product("3", "Three"), product("2", "Two'")]);

        let result = replace(&current, &imported);

        assert_eq!(result.catalog, imported);
        assert_eq!(result.removed, vec![ProductId::new("1")]);
        assert_eq!(result.added, vec![ProductId::new("3")]);
        assert_eq!(result.updated, vec![ProductId::new("2")]);
    }

    #[test]
    fn test_replace_with_empty_current() {
        let imported = Catalog::from_products(vec![product("9", "Nine")]);
        let result = apply(ImportStrategy::Replace, &Catalog::new(), &imported);
        assert_eq!(result.catalog, imported);
        assert!(result.removed.is_empty());
    }

    #[test]
    fn test_summary_counts() {
        let current = Catalog::from_products(vec![product("1", "One"), product("2", "Two")]);
        let imported = Catalog::from_products(vec![product("2", "Two"), product("3", "Three")]);

        let summary = ImportSummary::new("menu.csv", TransferFormat::Delimited, &current, &imported);
        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.new_count, 1);
        assert_eq!(summary.overlapping_count, 1);
        assert_eq!(summary.current_count, 2);
    }

    #[test]
    fn test_closure_decider() {
        let summary = ImportSummary::new(
            "menu.json",
            TransferFormat::Structured,
            &Catalog::new(),
            &Catalog::new(),
        );
        let mut asked = 0;
        let mut decider = |_: &ImportSummary| {
            asked += 1;
            ImportDecision::Cancel
        };
        assert_eq!(decider.decide(&summary), ImportDecision::Cancel);
        assert_eq!(asked, 1);
        assert_eq!(ImportDecision::Cancel.strategy(), None);
    }
}
