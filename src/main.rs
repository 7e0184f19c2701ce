//! # NewsClaw — scheduled newsletter generation & delivery.
//!
//! For each configured theme, searches the web for fresh material,
//! synthesizes a newsletter, and emails it to the theme's subscribers in
//! rate-limited batches, on the theme's own cadence.
//!
//! Usage:
//!   newsclaw run                          # deliver everything due today
//!   newsclaw run --date 2024-12-16       # pretend today is another date
//!   newsclaw run --dry-run               # generate only, send nothing
//!   newsclaw schedule                    # show cadences and next dates

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use newsclaw_core::NewsClawConfig;
use newsclaw_core::traits::{EmailTransport, ThemeStore};
use newsclaw_core::types::RunReport;
use newsclaw_delivery::{BatchDispatcher, ResendTransport, SmtpTransport};
use newsclaw_engine::{NewsletterGenerator, RunCoordinator};
use newsclaw_providers::{DuckDuckGoSearch, TemplateRenderer};
use newsclaw_schedule::{next_delivery_date, should_deliver_on};
use newsclaw_store::JsonThemeStore;

#[derive(Parser)]
#[command(
    name = "newsclaw",
    version,
    about = "📰 NewsClaw — scheduled newsletter generation & delivery"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the config file (default: ~/.newsclaw/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Generate and deliver all newsletters due on the target date
    Run {
        /// Target date (default: today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Generate content but skip dispatch and delivery stamping
        #[arg(long)]
        dry_run: bool,
    },
    /// Show each theme's cadence, eligibility, and next delivery date
    Schedule {
        /// Evaluate against this date instead of today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => {
            let mut c = NewsClawConfig::load_from(path)?;
            c.apply_env();
            c
        }
        None => NewsClawConfig::load()?,
    };
    let store_path = PathBuf::from(shellexpand::tilde(&config.store.path).to_string());

    match cli.command {
        Command::Run { date, dry_run } => run_command(&config, &store_path, date, dry_run).await,
        Command::Schedule { date } => schedule_command(&store_path, date).await,
    }
}

async fn run_command(
    config: &NewsClawConfig,
    store_path: &Path,
    date: Option<NaiveDate>,
    dry_run: bool,
) -> Result<()> {
    // A dry run touches neither the transport nor its credentials
    if !dry_run {
        config.validate()?;
    }

    let store = Arc::new(JsonThemeStore::new(store_path)?);
    let search = Arc::new(DuckDuckGoSearch::new(&config.search)?);
    let renderer = Arc::new(TemplateRenderer::new());
    let transport: Arc<dyn EmailTransport> = match config.transport.as_str() {
        "smtp" => Arc::new(SmtpTransport::new(&config.smtp)?),
        _ => Arc::new(ResendTransport::new(&config.resend_api_key)?),
    };

    let coordinator = RunCoordinator::new(
        store,
        NewsletterGenerator::new(search, renderer, &config.search),
        BatchDispatcher::new(transport, &config.from_email, &config.delivery),
    );

    let now = Utc::now();
    let target = date.unwrap_or_else(|| now.date_naive());
    tracing::info!("📰 Starting newsletter run for {target}");

    let report = coordinator.run(target, now, dry_run).await?;
    print_summary(&report);

    if report.summary.failure_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}

async fn schedule_command(store_path: &Path, date: Option<NaiveDate>) -> Result<()> {
    let store = JsonThemeStore::new(store_path)?;
    let themes = store.list_themes().await?;
    let today = date.unwrap_or_else(|| Utc::now().date_naive());

    println!("Found {} theme(s):\n", themes.len());
    for theme in &themes {
        println!("ID: {}", theme.id);
        println!("  Title: {}", theme.title);
        match &theme.schedule {
            Some(s) => println!("  Schedule: {s}"),
            None => println!("  Schedule: (no schedule - delivers daily)"),
        }
        match theme.last_delivered_at {
            Some(at) => println!("  Last delivered: {}", at.to_rfc3339()),
            None => println!("  Last delivered: (never)"),
        }
        let due = should_deliver_on(theme.schedule.as_deref(), today, theme.last_delivered_at);
        println!("  Due on {today}: {}", if due { "yes" } else { "no" });
        match next_delivery_date(theme.schedule.as_deref(), today, theme.last_delivered_at) {
            Some(next) => println!("  Next delivery: {next}"),
            None => println!("  Next delivery: (none within 62 days, check the schedule string)"),
        }
        println!();
    }

    println!("Today is: {} ({})", today.format("%A"), today);
    Ok(())
}

fn print_summary(report: &RunReport) {
    let line = "=".repeat(60);
    println!("\n{line}");
    println!("EXECUTION SUMMARY");
    println!("{line}");
    println!("Total themes processed: {}", report.summary.total_themes);
    println!("Successful generations: {}", report.summary.success_count);
    println!(
        "Successful email sends: {}",
        report.sends.iter().filter(|s| s.success_count > 0).count()
    );

    if !report.summary.failed_theme_ids.is_empty() {
        println!("\nFailed themes: {}", report.summary.failed_theme_ids.join(", "));
    }

    if !report.errors.is_empty() {
        println!("\nErrors:");
        for (index, error) in report.errors.iter().enumerate() {
            println!("  {}. {error}", index + 1);
        }
    }

    println!("\nTotal emails sent: {}", report.total_emails_sent());
    println!("{line}\n");
}
