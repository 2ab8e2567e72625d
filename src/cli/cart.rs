use clap::{Args, Subcommand};

use crate::app::PointOfSale;
use crate::cli::{truncate, GlobalArgs, OutputFormat};
use crate::core::product::format_price;
use crate::core::types::ProductId;

#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: CartCommands,
}

#[derive(Subcommand)]
pub enum CartCommands {
    /// Show the current order
    Show,

    /// Add one unit of a product
    Add {
        /// Product ID
        #[arg(required = true)]
        id: String,
    },

    /// Remove a product from the order
    Remove {
        /// Product ID
        #[arg(required = true)]
        id: String,
    },

    /// Set the quantity of a product already in the order
    Set {
        /// Product ID
        #[arg(required = true)]
        id: String,

        /// New quantity (at least 1)
        #[arg(required = true, value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },

    /// Empty the order
    Clear,
}

pub fn run(args: CartArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let (mut pos, _) = global.open_session()?;

    match args.command {
        CartCommands::Show => {}
        CartCommands::Add { id } => {
            let id = ProductId::new(id);
            pos.add_to_cart(&id)?;
            if global.verbose {
                eprintln!("Added one '{id}'");
            }
        }
        CartCommands::Remove { id } => {
            let id = ProductId::new(id);
            if !pos.cart_mut().remove(&id)? {
                eprintln!("Product '{id}' is not in the cart");
            }
        }
        CartCommands::Set { id, quantity } => {
            let id = ProductId::new(id);
            let current = pos.cart().quantity_of(&id);
            let delta = i64::from(quantity) - i64::from(current);
            pos.cart_mut().update_quantity(&id, delta)?;
        }
        CartCommands::Clear => pos.cart_mut().clear()?,
    }

    print_cart(&pos, global.format)
}

fn print_cart(pos: &PointOfSale, format: OutputFormat) -> anyhow::Result<()> {
    let cart = pos.cart();

    match format {
        OutputFormat::Text => {
            if cart.is_empty() {
                println!("The cart is empty");
                return Ok(());
            }

            println!("Cart ({} items)\n", cart.total_quantity());
            println!(
                "{:<30} {:<12} {:>5} {:>10} {:>10}",
                "Product", "Code", "Qty", "Price", "Subtotal"
            );
            println!("{}", "-".repeat(71));
            for line in cart.lines() {
                println!(
                    "{:<30} {:<12} {:>5} {:>10} {:>10}",
                    truncate(&line.product.name, 30),
                    truncate(line.product.display_code(), 12),
                    line.quantity,
                    format_price(line.product.price),
                    format_price(line.subtotal())
                );
            }
            println!("{}", "-".repeat(71));
            println!("{:<60} {:>10}", "Total", format_price(cart.total_price()));
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "lines": cart.lines(),
                "total_quantity": cart.total_quantity(),
                "total_price": cart.total_price(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(["id", "nombre", "cantidad", "precio", "subtotal"])?;
            for line in cart.lines() {
                let quantity = line.quantity.to_string();
                let price = line.product.price.to_string();
                let subtotal = format_price(line.subtotal());
                writer.write_record([
                    line.product.id.as_str(),
                    line.product.name.as_str(),
                    quantity.as_str(),
                    price.as_str(),
                    subtotal.as_str(),
                ])?;
            }
            writer.flush()?;
        }
    }

    Ok(())
}
