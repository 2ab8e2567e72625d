use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Args;

use crate::app::{ImportFile, ImportOutcome};
use crate::catalog::import::{ImportDecider, ImportDecision, ImportStrategy, ImportSummary};
use crate::cli::{GlobalArgs, OutputFormat};
use crate::codec::TransferFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyArg {
    /// Overlay the file onto the inventory; file products win on same ID
    Merge,
    /// Discard the inventory and keep only the file's products
    Replace,
}

impl From<StrategyArg> for ImportStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Merge => Self::Merge,
            StrategyArg::Replace => Self::Replace,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl From<ExportFormat> for TransferFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Structured,
            ExportFormat::Csv => Self::Delimited,
        }
    }
}

#[derive(Args)]
pub struct ImportArgs {
    /// File to import (.json or .csv)
    #[arg(required = true)]
    pub file: PathBuf,

    /// How to combine the file with the inventory (asked interactively if
    /// omitted)
    #[arg(long)]
    pub strategy: Option<StrategyArg>,

    /// Apply the strategy without asking for confirmation
    #[arg(short, long, requires = "strategy")]
    pub yes: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// File format
    #[arg(required = true, value_name = "FORMAT")]
    pub file_format: ExportFormat,

    /// Output file or directory ("-" for stdout). Defaults to
    /// inventario_cafeteria.<ext> in the current directory.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Asks the operator on the terminal, unless the answer was given up front
struct PromptDecider<R> {
    strategy: Option<ImportStrategy>,
    assume_yes: bool,
    input: R,
}

impl<R: BufRead> PromptDecider<R> {
    fn read_answer(&mut self) -> String {
        let mut answer = String::new();
        // EOF or unreadable input counts as no answer
        if self.input.read_line(&mut answer).is_err() {
            answer.clear();
        }
        answer.trim().to_lowercase()
    }
}

impl<R: BufRead> ImportDecider for PromptDecider<R> {
    fn decide(&mut self, summary: &ImportSummary) -> ImportDecision {
        eprintln!(
            "{} ({}): {} products, {} new, {} already in the inventory of {}",
            summary.file_name,
            summary.format.display_name(),
            summary.record_count,
            summary.new_count,
            summary.overlapping_count,
            summary.current_count
        );

        match (self.strategy, self.assume_yes) {
            (Some(strategy), true) => strategy.into(),
            (Some(strategy), false) => {
                eprint!("Apply {strategy}? [y/N] ");
                std::io::stderr().flush().ok();
                match self.read_answer().as_str() {
                    "y" | "yes" | "s" | "si" | "sí" => strategy.into(),
                    _ => ImportDecision::Cancel,
                }
            }
            (None, _) => {
                eprintln!("  merge:   update matching products and add new ones");
                eprintln!("  replace: delete the current inventory and keep only this file");
                eprint!("[m]erge, [r]eplace or [c]ancel? ");
                std::io::stderr().flush().ok();
                match self.read_answer().as_str() {
                    "m" | "merge" => ImportDecision::Merge,
                    "r" | "replace" => ImportDecision::Replace,
                    _ => ImportDecision::Cancel,
                }
            }
        }
    }
}

pub fn run_import(args: ImportArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let (mut pos, _) = global.open_session_with(&runtime)?;

    let file = runtime.block_on(ImportFile::read(&args.file))?;

    let mut decider = PromptDecider {
        strategy: args.strategy.map(ImportStrategy::from),
        assume_yes: args.yes,
        input: std::io::stdin().lock(),
    };
    let outcome = pos.import(&file, &mut decider)?;

    match global.format {
        OutputFormat::Text | OutputFormat::Csv => print_outcome(&outcome, pos.catalog().len()),
        OutputFormat::Json => {
            let json = match &outcome {
                ImportOutcome::Empty { issues } => serde_json::json!({
                    "status": "empty",
                    "issues": issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
                }),
                ImportOutcome::Cancelled { summary } => serde_json::json!({
                    "status": "cancelled",
                    "file": summary.file_name,
                }),
                ImportOutcome::Applied {
                    summary,
                    result,
                    issues,
                } => serde_json::json!({
                    "status": "applied",
                    "file": summary.file_name,
                    "strategy": result.strategy.to_string(),
                    "added": result.added,
                    "updated": result.updated,
                    "removed": result.removed,
                    "product_count": result.catalog.len(),
                    "issues": issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

fn print_outcome(outcome: &ImportOutcome, product_count: usize) {
    match outcome {
        ImportOutcome::Empty { .. } => {
            println!("The file holds no products; nothing was imported");
        }
        ImportOutcome::Cancelled { .. } => println!("Import cancelled; nothing changed"),
        ImportOutcome::Applied {
            summary,
            result,
            issues,
        } => {
            println!(
                "Imported {} ({}): {} added, {} updated, {} removed",
                summary.file_name,
                result.strategy,
                result.added.len(),
                result.updated.len(),
                result.removed.len()
            );
            if !issues.is_empty() {
                println!("\n{} fields were corrected while reading:", issues.len());
                for issue in issues {
                    println!("  {issue}");
                }
            }
            println!("\nInventory: {product_count} products");
        }
    }
}

pub fn run_export(args: ExportArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let (pos, _) = global.open_session()?;
    let artifact = pos.export(args.file_format.into())?;

    if args.output.as_deref() == Some(Path::new("-")) {
        print!("{}", artifact.contents);
        return Ok(());
    }

    let output = match args.output {
        Some(path) if path.is_dir() => path.join(&artifact.file_name),
        Some(path) => path,
        None => PathBuf::from(&artifact.file_name),
    };
    std::fs::write(&output, &artifact.contents)?;

    println!(
        "Exported {} products to {}",
        pos.catalog().len(),
        output.display()
    );

    Ok(())
}
