use std::collections::HashSet;
use std::path::Path;

const CATEGORY_LABELS: [&str; 6] = [
    "Café",
    "Panadería",
    "Pastelería",
    "Bebida Fría",
    "Sándwich",
    "Otro",
];

fn main() {
    let catalog_path = Path::new("catalogs/productos.json");
    validate_catalog_file(catalog_path);
    set_build_dependencies();
}

fn validate_catalog_file(catalog_path: &Path) {
    // Ensure catalog exists at build time
    assert!(
        catalog_path.exists(),
        "\n\nCATALOG BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the bundled product catalog before building.\n",
        catalog_path.display()
    );

    let catalog_contents = std::fs::read_to_string(catalog_path).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            catalog_path.display()
        );
    });

    let catalog: serde_json::Value = serde_json::from_str(&catalog_contents).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            catalog_path.display()
        );
    });

    let products = catalog.as_array().unwrap_or_else(|| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Root must be a JSON array of products\n\
             Got: {catalog}\n"
        );
    });

    validate_products(products);

    println!(
        "cargo:warning=Validated bundled catalog: {} products",
        products.len()
    );
}

fn validate_products(products: &[serde_json::Value]) {
    let mut seen_ids = HashSet::new();

    for (index, product) in products.iter().enumerate() {
        let id = product
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| {
                panic!("\n\nCATALOG BUILD ERROR: Product at index {index} missing string 'id'\n")
            });

        assert!(
            seen_ids.insert(id.to_string()),
            "\n\nCATALOG BUILD ERROR: Duplicate product id '{id}' (index {index})\n"
        );

        let name = product.get("nombre").and_then(|v| v.as_str());
        assert!(
            name.is_some_and(|n| !n.trim().is_empty()),
            "\n\nCATALOG BUILD ERROR: Product '{id}' (index {index}) missing 'nombre'\n"
        );

        validate_price(product, id, index);
        validate_category(product, id, index);
    }
}

fn validate_price(product: &serde_json::Value, id: &str, index: usize) {
    let price = product.get("precio").and_then(serde_json::Value::as_f64);
    assert!(
        price.is_some(),
        "\n\nCATALOG BUILD ERROR: Product '{id}' (index {index}) missing numeric 'precio'\n"
    );

    if let Some(price) = price {
        assert!(
            price.is_finite() && price >= 0.0,
            "\n\nCATALOG BUILD ERROR: Product '{id}' has invalid price {price}\n\
             Prices must be non-negative.\n"
        );
    }
}

fn validate_category(product: &serde_json::Value, id: &str, index: usize) {
    let category = product
        .get("categoria")
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| {
            panic!(
                "\n\nCATALOG BUILD ERROR: Product '{id}' (index {index}) missing 'categoria'\n"
            )
        });

    assert!(
        CATEGORY_LABELS.contains(&category),
        "\n\nCATALOG BUILD ERROR: Product '{id}' has unknown category '{category}'\n\
         Expected one of: {}\n",
        CATEGORY_LABELS.join(", ")
    );
}

fn set_build_dependencies() {
    // Tell cargo to rerun if catalog changes
    println!("cargo:rerun-if-changed=catalogs/productos.json");

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
