use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vocal_archiver::{utils, Cli, Config, JobRequest, Outcome, Pipeline};

fn init_tracing(cli: &Cli) {
    let default_filter = if cli.verbose {
        "vocal_archiver=debug"
    } else {
        "vocal_archiver=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);

    if cli.show_config {
        config.display();
        return Ok(());
    }

    config.validate()?;

    let url = cli
        .youtube_url
        .clone()
        .context("A YouTube URL is required")?;

    // Check for required external dependencies (non-fatal)
    let missing_deps = utils::check_dependencies(&config.app.tools, !cli.no_vocals).await;
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }

    let request = JobRequest {
        url,
        upload_folder: cli.upload_folder.clone(),
        separate_vocals: !cli.no_vocals,
        device: cli.device,
    };

    let pipeline = Pipeline::from_config(&config, !cli.quiet).await;
    let outcome = pipeline
        .run(&request)
        .await
        .with_context(|| format!("Failed to archive {}", request.url))?;

    match outcome {
        Outcome::AlreadyProcessed { identity } => {
            println!(
                "{} Video {} already exists in {}/{}. Skipping download and upload.",
                style("=").yellow().bold(),
                identity,
                config.storage.bucket,
                request.upload_folder
            );
        }
        Outcome::Published {
            identity,
            keys,
            started_at,
            elapsed,
        } => {
            println!(
                "{} Archived {} in {} (started {})",
                style("✔").green().bold(),
                identity,
                utils::format_duration(elapsed.num_milliseconds() as f64 / 1000.0),
                started_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            for key in keys {
                println!("   {}/{}", config.storage.bucket, style(key).cyan());
            }
        }
    }

    Ok(())
}
