mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

use cli::{Cli, Commands, LogFormat};
use commands::{WatchList, EXIT_NOT_COMPLETED};

/// Initialize tracing on stderr so stdout only carries result lines.
fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "fireplan=info".into()));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => install(
            registry.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        ),
        LogFormat::Json => install(
            registry.with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            ),
        ),
    }
}

fn install<S>(subscriber: S)
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install tracing subscriber: {}", e);
        return;
    }
    // Forward `log` records from the library and this binary.
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to bridge log records: {}", e);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let watch = WatchList::default();
    let interrupted = watch.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        interrupted.report_interrupted();
        std::process::exit(i32::from(EXIT_NOT_COMPLETED));
    }) {
        tracing::warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Run(args) => commands::run(args, config, &watch).await,
        Commands::Monitor(args) => commands::monitor(args, config, &watch).await,
        Commands::Deliverables => commands::list_deliverables(),
        Commands::Presets => commands::list_presets(config),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
