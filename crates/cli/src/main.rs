use anyhow::Context;
use clap::{Parser, Subcommand};
use library_kernel::settings::Settings;

/// Local Library command-line entrypoint
#[derive(Debug, Parser)]
#[command(name = "library-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the catalog application
    Serve,
    /// Run the standalone hello-world listener
    Hello {
        /// Listen address; defaults to `demo.host`
        #[arg(long)]
        host: Option<String>,
        /// Listen port; defaults to `demo.port`
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().context("failed to load library settings")?;
    library_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => {
            tracing::info!(env = ?settings.environment, "starting catalog server");
            library_app::run(settings).await
        }
        Command::Hello { host, port } => {
            let host = host.unwrap_or_else(|| settings.demo.host.clone());
            let port = port.unwrap_or(settings.demo.port);
            library_http::demo::serve_hello(&host, port).await
        }
    }
}
