use clap::Parser;
use contactlink::cli::{run_clear, run_identify, run_serve, run_show, Cli, Commands};
use contactlink::config::Config;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("contactlink=info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.db, cli.validation)?;

    match cli.command {
        Commands::Serve(args) => run_serve(&config, &args)?,
        Commands::Identify(args) => run_identify(&config, args)?,
        Commands::Show(args) => run_show(&config, args)?,
        Commands::Clear => run_clear(&config)?,
    }

    Ok(())
}
