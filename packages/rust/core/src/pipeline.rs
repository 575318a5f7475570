//! End-to-end run: key check → sitemap aggregation → provider submission.

use std::cell::Cell;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};
use url::Url;

use indexnow_discovery::{HttpFetcher, SitemapFetcher, aggregate, build_client};
use indexnow_shared::{
    ClientConfig, DispatchPolicy, IndexNowError, IndexNowRequest, Provider, Result,
    SubmissionReport, site_host,
};

use crate::dispatch::dispatch_all;
use crate::key::{validate_key_format, verify_key};

/// Configuration for one [`run`].
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root sitemap or sitemap index.
    pub sitemap_url: Url,
    /// IndexNow key, published at `/<key>.txt` on the sitemap's host.
    pub key: String,
    /// Providers to submit to, in order.
    pub providers: Vec<Provider>,
    /// What to do when a provider is unreachable.
    pub policy: DispatchPolicy,
    /// Stop after aggregation without submitting.
    pub dry_run: bool,
    /// HTTP client settings.
    pub client: ClientConfig,
}

/// Result of a completed [`run`].
#[derive(Debug)]
pub struct RunSummary {
    /// `host` value sent to providers.
    pub host: String,
    /// Aggregated page URLs, in pre-order.
    pub urls: Vec<String>,
    /// Number of sitemap documents fetched.
    pub sitemaps_fetched: usize,
    /// One report per contacted provider. Empty when nothing was submitted.
    pub reports: Vec<SubmissionReport>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting run status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each sitemap document is fetched.
    fn sitemap_fetched(&self, url: &str, count: usize);
    /// Called after each provider submission.
    fn submitted(&self, report: &SubmissionReport);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn sitemap_fetched(&self, _url: &str, _count: usize) {}
    fn submitted(&self, _report: &SubmissionReport) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Fetcher adapter that forwards each completed fetch to a reporter.
struct ReportingFetcher<'a, F> {
    inner: F,
    progress: &'a dyn ProgressReporter,
    count: Cell<usize>,
}

impl<F: SitemapFetcher> SitemapFetcher for ReportingFetcher<'_, F> {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let data = self.inner.fetch(url).await?;
        self.count.set(self.count.get() + 1);
        self.progress.sitemap_fetched(url, self.count.get());
        Ok(data)
    }
}

/// Run the full submission pipeline.
///
/// 1. Validate the key format
/// 2. Verify the key file on the sitemap's host
/// 3. Aggregate every page URL from the sitemap tree
/// 4. Submit the URL list to each provider (skipped on dry run or no URLs)
///
/// Any failure before step 4 aborts the run without contacting a provider.
#[instrument(skip_all, fields(sitemap = %config.sitemap_url))]
pub async fn run(config: &RunConfig, progress: &dyn ProgressReporter) -> Result<RunSummary> {
    let start = Instant::now();

    validate_key_format(&config.key)?;
    let host = site_host(&config.sitemap_url)?;
    if config.providers.is_empty() && !config.dry_run {
        return Err(IndexNowError::config("no providers selected"));
    }

    let client = build_client(&config.client)?;

    // --- Phase 1: Key file ---
    progress.phase("Checking key file");
    verify_key(&client, &config.key, &config.sitemap_url).await?;

    // --- Phase 2: Sitemaps ---
    progress.phase("Reading sitemaps");
    let fetcher = ReportingFetcher {
        inner: HttpFetcher::new(client.clone()),
        progress,
        count: Cell::new(0),
    };
    let aggregation = aggregate(&fetcher, &config.sitemap_url).await?;

    let mut summary = RunSummary {
        host,
        urls: aggregation.urls,
        sitemaps_fetched: aggregation.sitemaps_fetched,
        reports: Vec::new(),
        elapsed: Duration::ZERO,
    };

    // --- Phase 3: Submission ---
    if config.dry_run {
        info!(urls = summary.urls.len(), "dry run, skipping submission");
    } else if summary.urls.is_empty() {
        warn!("sitemaps contained no URLs, nothing to submit");
    } else {
        progress.phase("Submitting to providers");
        let request = IndexNowRequest::new(&summary.host, &config.key, summary.urls.clone());
        summary.reports =
            dispatch_all(&client, &config.providers, &request, config.policy, progress).await?;
    }

    summary.elapsed = start.elapsed();
    progress.done(&summary);

    info!(
        urls = summary.urls.len(),
        providers = summary.reports.len(),
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "run complete"
    );

    Ok(summary)
}
