use serde::{Deserialize, Serialize};

/// Unique identifier for a product in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Generate a fresh random identifier (v4 UUID)
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id is empty or whitespace only
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Product category. The set is closed; the wire labels are the ones the
/// bundled catalog and exported files carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    #[serde(rename = "Café", alias = "Coffee")]
    Coffee,
    #[serde(rename = "Panadería", alias = "Bakery")]
    Bakery,
    #[serde(rename = "Pastelería", alias = "Pastry")]
    Pastry,
    #[serde(rename = "Bebida Fría", alias = "Cold Drink")]
    ColdDrink,
    #[serde(rename = "Sándwich", alias = "Sandwich")]
    Sandwich,
    #[serde(rename = "Otro", alias = "Other")]
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Coffee,
        Category::Bakery,
        Category::Pastry,
        Category::ColdDrink,
        Category::Sandwich,
        Category::Other,
    ];

    /// Label used in exported files and persisted state
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Coffee => "Café",
            Self::Bakery => "Panadería",
            Self::Pastry => "Pastelería",
            Self::ColdDrink => "Bebida Fría",
            Self::Sandwich => "Sándwich",
            Self::Other => "Otro",
        }
    }

    /// Parse a category from a wire label or its English name.
    ///
    /// Matching is case-insensitive and accepts unaccented spellings, so
    /// spreadsheet round-trips that lose accents still land in the right
    /// category. Returns `None` for anything outside the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "café" | "cafe" | "coffee" => Some(Self::Coffee),
            "panadería" | "panaderia" | "bakery" => Some(Self::Bakery),
            "pastelería" | "pasteleria" | "pastry" => Some(Self::Pastry),
            "bebida fría" | "bebida fria" | "cold drink" | "cold_drink" => Some(Self::ColdDrink),
            "sándwich" | "sandwich" => Some(Self::Sandwich),
            "otro" | "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
