use clap::Parser;
use toastd_server::config::loader::{DEFAULT_CONFIG_PATH, load_config};
use toastd_server::host::Host;
use toastd_server::observability;
use tokio::io::BufReader;

/// Desktop notification service speaking line-delimited JSON on stdin/stdout.
#[derive(Debug, Parser)]
#[command(name = "toastd", version, about)]
struct Args {
    /// Configuration file
    #[arg(long, env = "TOASTD_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv()
        && !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }

    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(Some(args.config.as_str()))
        .map_err(|e| anyhow::anyhow!("Configuration error: {e}"))?;
    observability::init_tracing(&config.logging.level);

    if args.print_config {
        let rendered = config.to_toml().map_err(anyhow::Error::msg)?;
        print!("{rendered}");
        return Ok(());
    }

    tracing::info!(path = %args.config, "Configuration loaded");

    let host = Host::start(config).await?;
    host.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    tracing::info!("Input closed, shutting down");
    Ok(())
}
