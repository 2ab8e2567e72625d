use clap::{Args, Subcommand};

use crate::app::PointOfSale;
use crate::catalog::filter::ProductFilter;
use crate::cli::{parse_category, truncate, GlobalArgs, OutputFormat};
use crate::codec::delimited::encode_delimited;
use crate::core::catalog::Catalog;
use crate::core::product::{format_price, Product, ProductDraft};
use crate::core::types::{Category, ProductId};
use crate::suggest;

#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommands,
}

/// Product fields accepted by `add` and `edit`
#[derive(Args, Debug, Default)]
pub struct ProductFields {
    /// Price in the shop's currency
    #[arg(long)]
    pub price: Option<f64>,

    /// Short inventory code (e.g. "CAF-01")
    #[arg(long)]
    pub code: Option<String>,

    /// Category (Café, Panadería, Pastelería, Bebida Fría, Sándwich, Otro)
    #[arg(long, value_parser = parse_category)]
    pub category: Option<Category>,

    /// Free-text description
    #[arg(long)]
    pub description: Option<String>,
}

impl ProductFields {
    fn apply(self, draft: &mut ProductDraft) {
        if let Some(price) = self.price {
            draft.price = Some(price);
        }
        if let Some(code) = self.code {
            draft.code = Some(code);
        }
        if let Some(category) = self.category {
            draft.category = category;
        }
        if let Some(description) = self.description {
            draft.description = Some(description);
        }
    }
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List products in the inventory
    List {
        /// Only products whose name or code contains this text
        #[arg(long)]
        search: Option<String>,

        /// Only products in this category
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
    },

    /// Show details of a product
    Show {
        /// Product ID
        #[arg(required = true)]
        id: String,
    },

    /// Add a new product
    Add {
        /// Product name
        #[arg(long, required = true)]
        name: String,

        #[command(flatten)]
        fields: ProductFields,

        /// Prefill missing fields from the suggestion service
        #[arg(long)]
        suggest: bool,
    },

    /// Edit an existing product
    Edit {
        /// Product ID
        #[arg(required = true)]
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        fields: ProductFields,
    },

    /// Permanently remove a product (also from the cart)
    Remove {
        /// Product ID
        #[arg(required = true)]
        id: String,
    },
}

pub fn run(args: CatalogArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let (mut pos, _) = global.open_session_with(&runtime)?;
    let format = global.format;

    match args.command {
        CatalogCommands::List { search, category } => {
            run_list(&pos, search, category, format, global.verbose)
        }
        CatalogCommands::Show { id } => run_show(&pos, &ProductId::new(id), format),
        CatalogCommands::Add {
            name,
            fields,
            suggest,
        } => run_add(&mut pos, &runtime, name, fields, suggest, format),
        CatalogCommands::Edit { id, name, fields } => {
            run_edit(&mut pos, &ProductId::new(id), name, fields, format)
        }
        CatalogCommands::Remove { id } => run_remove(&mut pos, &ProductId::new(id)),
    }
}

fn run_list(
    pos: &PointOfSale,
    search: Option<String>,
    category: Option<Category>,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let mut filter = ProductFilter::new();
    if let Some(text) = search {
        filter = filter.with_text(text);
    }
    if let Some(category) = category {
        filter = filter.with_category(category);
    }
    let filtered = filter.apply(pos.catalog());

    if verbose {
        eprintln!(
            "{} of {} products match",
            filtered.len(),
            pos.catalog().len()
        );
    }

    match format {
        OutputFormat::Text => print_table(&filtered, verbose),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&filtered)?);
        }
        OutputFormat::Csv => {
            let subset: Catalog = filtered.into_iter().cloned().collect();
            print!("{}", encode_delimited(&subset)?);
        }
    }

    Ok(())
}

fn print_table(products: &[&Product], verbose: bool) {
    let id_width = products
        .iter()
        .map(|p| p.id.as_str().chars().count().min(36))
        .max()
        .unwrap_or(2)
        .max(2);
    let name_width = products
        .iter()
        .map(|p| p.name.chars().count().min(30))
        .max()
        .unwrap_or(4)
        .max(4);
    let code_width = products
        .iter()
        .map(|p| p.display_code().chars().count())
        .max()
        .unwrap_or(4)
        .max(4);
    let category_width = 11;

    let total_width = id_width + name_width + code_width + category_width + 10 + 4;

    println!("Inventory ({} products)\n", products.len());
    println!(
        "{:<id_w$} {:<name_w$} {:<code_w$} {:<cat_w$} {:>10}",
        "ID",
        "Name",
        "Code",
        "Category",
        "Price",
        id_w = id_width,
        name_w = name_width,
        code_w = code_width,
        cat_w = category_width
    );
    println!("{}", "-".repeat(total_width));

    for p in products {
        println!(
            "{:<id_w$} {:<name_w$} {:<code_w$} {:<cat_w$} {:>10}",
            truncate(p.id.as_str(), id_width),
            truncate(&p.name, name_width),
            p.display_code(),
            p.category.label(),
            format_price(p.price),
            id_w = id_width,
            name_w = name_width,
            code_w = code_width,
            cat_w = category_width
        );
        if verbose {
            if let Some(description) = &p.description {
                println!("  └─ {description}");
            }
        }
    }
}

fn run_show(pos: &PointOfSale, id: &ProductId, format: OutputFormat) -> anyhow::Result<()> {
    let product = pos
        .catalog()
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("Product '{}' not found", id))?;
    print_product(product, format)
}

fn print_product(product: &Product, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Product: {}\n", product.name);
            println!("ID:       {}", product.id);
            println!("Code:     {}", product.display_code());
            println!("Category: {}", product.category);
            println!("Price:    {}", format_price(product.price));

            if let Some(desc) = &product.description {
                println!("\nDescription: {desc}");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(product)?);
        }
        OutputFormat::Csv => {
            let single = Catalog::from_products(vec![product.clone()]);
            print!("{}", encode_delimited(&single)?);
        }
    }
    Ok(())
}

fn run_add(
    pos: &mut PointOfSale,
    runtime: &tokio::runtime::Runtime,
    name: String,
    fields: ProductFields,
    use_suggestions: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut draft = if use_suggestions {
        match suggest::GeminiSuggester::from_env() {
            Some(suggester) => runtime.block_on(suggest::suggest_draft(&suggester, &name)),
            None => ProductDraft::new(name.trim()),
        }
    } else {
        ProductDraft::new(name.trim())
    };
    fields.apply(&mut draft);

    let product = pos.create_product(draft)?;
    if format == OutputFormat::Text {
        println!("Added '{}' with ID {}", product.name, product.id);
        Ok(())
    } else {
        print_product(&product, format)
    }
}

fn run_edit(
    pos: &mut PointOfSale,
    id: &ProductId,
    name: Option<String>,
    fields: ProductFields,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let current = pos
        .catalog()
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("Product '{}' not found", id))?;

    let mut draft = ProductDraft::from_product(current);
    if let Some(name) = name {
        draft.name = name;
    }
    fields.apply(&mut draft);

    let product = pos.update_product(id, draft)?;
    if format == OutputFormat::Text {
        println!("Updated '{}' ({})", product.name, product.id);
        Ok(())
    } else {
        print_product(&product, format)
    }
}

fn run_remove(pos: &mut PointOfSale, id: &ProductId) -> anyhow::Result<()> {
    match pos.delete_product(id)? {
        Some(product) => println!("Removed '{}' ({})", product.name, product.id),
        None => println!("No product with ID {id}; nothing removed"),
    }
    Ok(())
}
