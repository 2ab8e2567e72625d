use cafe_gestor::cli;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.global.verbose {
        EnvFilter::new("cafe_gestor=debug,info")
    } else {
        EnvFilter::new("cafe_gestor=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Sync => {
            cli::sync::run(&cli.global)?;
        }
        cli::Commands::Catalog(args) => {
            cli::catalog::run(args, &cli.global)?;
        }
        cli::Commands::Import(args) => {
            cli::transfer::run_import(args, &cli.global)?;
        }
        cli::Commands::Export(args) => {
            cli::transfer::run_export(args, &cli.global)?;
        }
        cli::Commands::Cart(args) => {
            cli::cart::run(args, &cli.global)?;
        }
        cli::Commands::Suggest(args) => {
            cli::suggest::run(args, &cli.global)?;
        }
    }

    Ok(())
}
