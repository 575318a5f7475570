//! CLI definition, config merging, tracing setup, and the run command.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use indexnow_core::{ProgressReporter, RunConfig, RunSummary};
use indexnow_shared::{
    AppConfig, ClientConfig, DispatchPolicy, IndexNowError, SubmissionReport, load_config,
    load_config_from, select_providers,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// IndexNow — submit every URL in your sitemap to IndexNow search engines.
#[derive(Parser)]
#[command(
    name = "indexnow",
    version,
    about = "Submit every URL in a sitemap to IndexNow-compatible search engines.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// IndexNow key. The file https://<domain>/<key>.txt must contain it.
    #[arg(short = 'k', long = "key", env = "INDEXNOW_KEY")]
    pub key: String,

    /// Root sitemap or sitemap index. Referenced sitemaps are followed.
    #[arg(short = 's', long = "sitemap", env = "INDEXNOW_SITEMAP")]
    pub sitemap: String,

    /// Only submit to this provider (repeatable). Defaults to all.
    #[arg(long = "provider", value_name = "NAME")]
    pub providers: Vec<String>,

    /// Keep submitting to other providers when one is unreachable.
    #[arg(long)]
    pub keep_going: bool,

    /// Resolve and print the URL list without submitting it.
    #[arg(long)]
    pub dry_run: bool,

    /// Config file (defaults to ~/.indexnow/indexnow.toml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "indexnow=info",
        1 => "indexnow=debug",
        _ => "indexnow=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Config merging
// ---------------------------------------------------------------------------

/// Merge CLI flags over the config file into a runtime [`RunConfig`].
fn build_run_config(cli: &Cli, app: &AppConfig) -> indexnow_shared::Result<RunConfig> {
    let sitemap_url = parse_sitemap_url(&cli.sitemap)?;

    let names = if cli.providers.is_empty() {
        &app.submission.providers
    } else {
        &cli.providers
    };

    let policy = if cli.keep_going || app.submission.keep_going {
        DispatchPolicy::Continue
    } else {
        DispatchPolicy::FailFast
    };

    Ok(RunConfig {
        sitemap_url,
        key: cli.key.trim().to_string(),
        providers: select_providers(names)?,
        policy,
        dry_run: cli.dry_run,
        client: ClientConfig::from(app),
    })
}

fn parse_sitemap_url(raw: &str) -> indexnow_shared::Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| IndexNowError::config(format!("invalid sitemap URL '{raw}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(IndexNowError::config(format!(
            "sitemap URL '{raw}' must be an absolute http(s) URL"
        )));
    }

    Ok(url)
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let app = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let config = build_run_config(&cli, &app)?;

    info!(
        sitemap = %config.sitemap_url,
        providers = config.providers.len(),
        dry_run = config.dry_run,
        "starting IndexNow submission"
    );

    let reporter = CliProgress::new(matches!(cli.log_format, LogFormat::Text));
    let summary = indexnow_core::run(&config, &reporter).await?;

    println!();
    println!("  Host:     {}", summary.host);
    println!("  Sitemaps: {}", summary.sitemaps_fetched);
    println!("  URLs:     {}", summary.urls.len());
    if config.dry_run {
        println!();
        for url in &summary.urls {
            println!("  {url}");
        }
    }
    for line in summary.reports.iter().filter_map(describe_report) {
        println!("  {line}");
    }
    println!("  Time:     {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

/// One-line, human-readable summary of a provider submission.
///
/// Statuses outside the protocol's set are not reported.
fn describe_report(report: &SubmissionReport) -> Option<String> {
    match (&report.result, report.outcome()) {
        (Ok(_), Some(outcome)) if outcome.is_success() => {
            Some(format!("✅ {}: {outcome}", report.provider))
        }
        (Ok(status), Some(outcome)) => Some(format!(
            "❗ {}: {outcome} (HTTP {status})",
            report.provider
        )),
        (Ok(_), None) => None,
        (Err(e), _) => Some(format!("❌ {}: unreachable ({e})", report.provider)),
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new(visible: bool) -> Self {
        if !visible {
            return Self {
                spinner: ProgressBar::hidden(),
            };
        }

        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

// Clears the spinner when a run fails before `done`.
impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn sitemap_fetched(&self, url: &str, count: usize) {
        self.spinner
            .set_message(format!("Reading sitemaps [{count}] {url}"));
    }

    fn submitted(&self, report: &SubmissionReport) {
        self.spinner
            .set_message(format!("Submitted to {}", report.provider));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}
