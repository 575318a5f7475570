//! Submission of the URL list to IndexNow providers.

use indexnow_shared::{
    DispatchPolicy, IndexNowError, IndexNowRequest, Provider, Result, SubmissionOutcome,
    SubmissionReport,
};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, instrument, warn};

use crate::pipeline::ProgressReporter;

/// Content type every provider expects.
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// POST `request` to one provider and return the HTTP status code.
///
/// Only transport failures are errors; every status code is returned as-is.
#[instrument(skip_all, fields(provider = %provider.name))]
pub async fn submit(client: &Client, provider: &Provider, request: &IndexNowRequest) -> Result<u16> {
    let body = serde_json::to_vec(request).map_err(|e| {
        IndexNowError::submission(
            provider.name.as_ref(),
            format!("unable to encode request body: {e}"),
        )
    })?;

    debug!(endpoint = %provider.endpoint, bytes = body.len(), "posting submission");

    let response = client
        .post(provider.endpoint.as_ref())
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(body)
        .send()
        .await
        .map_err(|e| IndexNowError::submission(provider.name.as_ref(), e.to_string()))?;

    Ok(response.status().as_u16())
}

/// Submit to every provider in order, one at a time.
///
/// Under [`DispatchPolicy::FailFast`] the first transport error is returned
/// and later providers are not contacted. Under [`DispatchPolicy::Continue`]
/// the error is recorded in that provider's report instead.
pub async fn dispatch_all(
    client: &Client,
    providers: &[Provider],
    request: &IndexNowRequest,
    policy: DispatchPolicy,
    progress: &dyn ProgressReporter,
) -> Result<Vec<SubmissionReport>> {
    let mut reports = Vec::with_capacity(providers.len());

    for provider in providers {
        let result = match submit(client, provider, request).await {
            Ok(status) => Ok(status),
            Err(e) if policy == DispatchPolicy::Continue => {
                warn!(provider = %provider.name, error = %e, "provider unreachable, continuing");
                Err(e.to_string())
            }
            Err(e) => return Err(e),
        };

        let report = SubmissionReport {
            provider: provider.name.to_string(),
            endpoint: provider.endpoint.to_string(),
            result,
        };
        log_report(&report);
        progress.submitted(&report);
        reports.push(report);
    }

    Ok(reports)
}

fn log_report(report: &SubmissionReport) {
    let Ok(&status) = report.result.as_ref() else {
        return;
    };

    match SubmissionOutcome::from_status(status) {
        Some(outcome) if outcome.is_success() => {
            info!(provider = %report.provider, status, "{outcome}");
        }
        Some(outcome) => {
            warn!(provider = %report.provider, status, "{outcome}");
        }
        None => {
            debug!(provider = %report.provider, status, "unrecognized response status");
        }
    }
}
