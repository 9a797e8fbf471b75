use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nestegg::api::{ProjectArgs, render_project_output, run_http_server};

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Semi-annual compounding projection of monthly savings and investments"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the projection form and JSON API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Print the year-by-year projection.
    Project(ProjectArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().command {
        Command::Serve { port } => {
            if let Err(e) = run_http_server(port).await {
                tracing::error!(error = %e, "server error");
                std::process::exit(1);
            }
        }
        Command::Project(args) => match render_project_output(&args) {
            Ok(out) => print!("{out}"),
            Err(e) => {
                tracing::error!(error = %e, "failed to render projection");
                std::process::exit(1);
            }
        },
    }
}
