use analyzer::{dedup_exact, deduplicate, parse_candidates};
use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::{DedupMetric, TagScope, init_tracing, load_config};
use engine::{SyncMode, Workbench};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// The main entry point for the alphascope application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials live in .env; a missing file is fine if the variables are set.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let _guard = init_tracing(&config.logging)?;

    match cli.command {
        Commands::Sync(args) => handle_sync(args, config).await,
        Commands::SelfCorr(args) => handle_self_corr(args, config).await,
        Commands::Dedup(args) => handle_dedup(args, config),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Correlation-aware deduplication and self-correlation for submitted alphas.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download new alphas and their PnL into the local cache.
    Sync(SyncArgs),
    /// Compute the self-correlation of one or more alphas against the cache.
    SelfCorr(SelfCorrArgs),
    /// Keep the best candidate per `target_data` expression.
    Dedup(DedupArgs),
}

#[derive(Parser)]
struct SyncArgs {
    /// Re-list the whole universe instead of only the newest page.
    #[arg(long)]
    full: bool,
}

#[derive(Parser)]
struct SelfCorrArgs {
    /// Alpha ids to score.
    #[arg(required = true)]
    ids: Vec<String>,

    /// Which cached peers to compare against (defaults to the configured scope).
    #[arg(long, value_enum)]
    scope: Option<TagScope>,
}

#[derive(Parser)]
struct DedupArgs {
    /// JSON file holding an array of `{id, expression, sharpe, fitness}`.
    #[arg(long)]
    input: PathBuf,

    /// Metric that picks the survivor (defaults to the configured metric).
    #[arg(long, value_enum)]
    metric: Option<DedupMetric>,

    /// Also drop candidates whose expression text is repeated verbatim.
    #[arg(long)]
    exact: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_sync(args: SyncArgs, config: configuration::Config) -> anyhow::Result<()> {
    let mode = if args.full {
        SyncMode::Full
    } else {
        SyncMode::Incremental
    };
    let workbench = Workbench::connect(config).await?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.set_message(format!("Syncing alphas ({:?})...", mode));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = workbench.sync(mode).await;
    spinner.finish_and_clear();
    let summary = result?;

    println!(
        "Fetched {} new alphas; {} cached in total.",
        summary.new_alphas, summary.total_alphas
    );
    for (alpha_id, error) in &summary.failed {
        eprintln!("  skipped {}: {}", alpha_id, error);
    }
    Ok(())
}

async fn handle_self_corr(args: SelfCorrArgs, config: configuration::Config) -> anyhow::Result<()> {
    let scope = args.scope.unwrap_or(config.correlation.default_scope);
    let workbench = Workbench::connect(config).await?;

    let batch = workbench.self_correlation_batch(&args.ids, scope).await;

    let mut table = Table::new();
    table.set_header(vec!["Alpha", "Self-correlation"]);
    for (alpha_id, score) in &batch.scores {
        table.add_row(vec![alpha_id.clone(), format!("{:.4}", score)]);
    }
    println!("{table}");
    println!("Last report written to {}", workbench.report_path().display());
    for (alpha_id, error) in &batch.failed {
        eprintln!("  could not score {}: {}", alpha_id, error);
    }
    if batch.scores.is_empty() && !batch.failed.is_empty() {
        anyhow::bail!("none of the {} alphas could be scored", batch.failed.len());
    }
    Ok(())
}

fn handle_dedup(args: DedupArgs, config: configuration::Config) -> anyhow::Result<()> {
    let metric = args.metric.unwrap_or(config.dedup.metric);
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let mut candidates = parse_candidates(&text)?;
    if args.exact {
        candidates = dedup_exact(candidates);
    }
    let kept = deduplicate(candidates, metric)?;

    println!("{}", serde_json::to_string_pretty(&kept)?);
    Ok(())
}
