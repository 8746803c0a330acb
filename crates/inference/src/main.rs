use clap::Parser;
use inference::{InferenceConfig, logging::setup_logging};
use serde_json::json;

/// Load the inference server settings, set up logging and report the result.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Print the resolved settings and logging layout as JSON
    #[arg(long)]
    print: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = InferenceConfig::from_env()?;
    let log_config = setup_logging(&config)?;

    let workers = config.resolved_worker_count();

    tracing::info!(
        config = ?config,
        "Loaded configuration"
    );
    tracing::info!(
        target: "docling",
        workers = ?workers,
        port = config.port,
        ocr_languages = ?config.ocr_language_list(),
        "Resolved server settings"
    );

    if args.print {
        let report = json!({
            "settings": config,
            "resolved_workers": workers,
            "logging": log_config,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
