use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use video_timestamper::cli::{Cli, USAGE};
use video_timestamper::output::{self, format_output, persist, print_to_console, save_batch};
use video_timestamper::plan::plan;
use video_timestamper::utils::{default_output_path, normalize_youtube_url, parse_url_list};
use video_timestamper::{Config, GeminiClient, Timestamper, TimestamperError};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => return report_failure(invalid_arguments(&err).into()),
    };

    // Initialize tracing
    let default_filter = if cli.verbose {
        "video_timestamper=debug"
    } else {
        "video_timestamper=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_failure(err),
    }
}

/// Clap's first error line, without its `error: ` prefix
fn invalid_arguments(err: &clap::Error) -> TimestamperError {
    let rendered = err.to_string();
    let message = rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string();
    TimestamperError::InvalidArgument(message)
}

fn report_failure(err: anyhow::Error) -> ExitCode {
    if matches!(
        err.downcast_ref::<TimestamperError>(),
        Some(TimestamperError::InvalidArgument(_))
    ) {
        eprintln!("{} {:#}", style("❌").red(), err);
        eprintln!("{}", USAGE);
    } else {
        eprintln!("{} Error: {:#}", style("❌").red(), err);
    }
    ExitCode::from(1)
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    config.validate()?;

    if cli.show_config {
        config.display();
        return Ok(());
    }

    if cli.url.is_none() && cli.batch.is_none() {
        return Err(TimestamperError::InvalidArgument("missing YouTube URL".to_string()).into());
    }

    let interval = match &cli.batch {
        Some(_) => cli.batch_interval()?,
        None => cli.interval,
    }
    .unwrap_or(config.app.interval_minutes);

    // Fail fast on a bad interval before touching credentials or the network
    plan(interval)?;

    config.require_api_key()?;
    let client = GeminiClient::new(&config.gemini)?;
    let timestamper = Timestamper::new(client).with_focus(cli.focus.clone());

    match &cli.batch {
        Some(batch_file) => run_batch(&timestamper, &cli, &config, batch_file, interval).await,
        None => {
            let url = cli.url.as_deref().unwrap_or_default();
            run_single(&timestamper, &cli, &config, url, interval).await
        }
    }
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(key) = &cli.api_key {
        config.gemini.api_key = Some(key.clone());
    }
    if let Some(model) = &cli.model {
        config.gemini.model = model.clone();
    }
    if let Some(temperature) = cli.temperature {
        config.gemini.temperature = temperature;
    }
    if cli.no_save {
        config.app.save_output = false;
    }
}

async fn run_single(
    timestamper: &Timestamper<GeminiClient>,
    cli: &Cli,
    config: &Config,
    raw_url: &str,
    interval: i64,
) -> Result<()> {
    let url = normalize_youtube_url(raw_url);
    tracing::info!("Normalized URL: {}", url);

    println!("🎥 Analyzing video at {}-minute intervals...", interval);
    println!("This might take a moment while Gemini watches your video...\n");

    let progress = spinner(cli.quiet, "Waiting for Gemini...");
    let analysis = timestamper.generate_timestamps(&url, interval).await?;
    progress.finish_and_clear();

    if let Some(err) = analysis.failure() {
        eprintln!("{} Failed to generate timestamps: {}", style("❌").red(), err);
        return Ok(());
    }

    let entries = analysis.into_entries();
    if entries.is_empty() {
        eprintln!("{} Failed to generate timestamps: model returned no entries", style("❌").red());
        return Ok(());
    }

    let formatted = format_output(&entries)?;

    if config.app.save_output {
        let base = output_base(cli.output.as_deref(), config, || default_output_path(&url));
        let paths = persist(&formatted, &base)?;
        println!(
            "{} Saved to {} and {}",
            style("✅").green(),
            paths.text.display(),
            paths.json.display()
        );
    }

    print_to_console(&formatted);
    Ok(())
}

async fn run_batch(
    timestamper: &Timestamper<GeminiClient>,
    cli: &Cli,
    config: &Config,
    batch_file: &Path,
    interval: i64,
) -> Result<()> {
    let content = fs_err::read_to_string(batch_file).context("Failed to read batch file")?;
    let urls = parse_url_list(&content);
    if urls.is_empty() {
        anyhow::bail!("No URLs found in {}", batch_file.display());
    }

    println!("🎥 Processing {} videos at {}-minute intervals...\n", urls.len(), interval);

    let progress = spinner(cli.quiet, "Waiting for Gemini...");
    let items = timestamper.generate_batch(&urls, interval).await?;
    progress.finish_and_clear();

    for item in &items {
        match item.analysis.failure() {
            None => println!(
                "{} {}: generated {} timestamps",
                style("✓").green(),
                item.video_id,
                item.analysis.entries().len()
            ),
            Some(err) => println!("{} {}: {}", style("✗").red(), item.video_id, err),
        }
    }

    if config.app.save_output {
        let path = output_base(cli.output.as_deref(), config, || {
            PathBuf::from("batch_timestamps.json")
        });
        save_batch(&items, &path)?;
        println!("{} Batch results saved to {}", style("✅").green(), path.display());
    }

    for item in &items {
        if item.analysis.is_complete() && !item.analysis.entries().is_empty() {
            println!("\n{}", item.url);
            println!("{}", output::format_report(item.analysis.entries()));
        }
    }

    Ok(())
}

/// Explicit `--output` wins; otherwise the default name goes under the configured directory
fn output_base(explicit: Option<&Path>, config: &Config, default: impl FnOnce() -> PathBuf) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => match &config.app.output_dir {
            Some(dir) => dir.join(default()),
            None => default(),
        },
    }
}

fn spinner(quiet: bool, message: &'static str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    if let Ok(progress_style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        progress.set_style(progress_style);
    }
    progress.set_message(message);
    progress.enable_steady_tick(Duration::from_millis(120));
    progress
}
