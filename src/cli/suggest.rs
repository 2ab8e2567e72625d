use clap::Args;

use crate::cli::{GlobalArgs, OutputFormat};
use crate::core::product::format_price;
use crate::suggest::{suggest_draft, DisabledSuggester, GeminiSuggester, Suggester, DEFAULT_MODEL};

#[derive(Args)]
pub struct SuggestArgs {
    /// Name of the new product
    #[arg(required = true)]
    pub name: String,

    /// Model used by the suggestion service
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,
}

pub fn run(args: SuggestArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let suggester: Box<dyn Suggester> = match GeminiSuggester::from_env() {
        Some(suggester) => Box::new(suggester.with_model(args.model)),
        None => Box::new(DisabledSuggester),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let draft = runtime.block_on(suggest_draft(suggester.as_ref(), &args.name));

    match global.format {
        OutputFormat::Text | OutputFormat::Csv => {
            let Some(price) = draft.price else {
                println!("No suggestion available for '{}'", draft.name);
                return Ok(());
            };
            println!("Suggestion for '{}'\n", draft.name);
            println!("Price:       {}", format_price(price));
            println!("Code:        {}", draft.code.as_deref().unwrap_or("-"));
            println!("Category:    {}", draft.category);
            println!("Description: {}", draft.description.as_deref().unwrap_or("-"));
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "nombre": draft.name,
                "precio": draft.price,
                "codigo": draft.code,
                "categoria": draft.category,
                "descripcion": draft.description,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}
