//! Key file integrity check.
//!
//! IndexNow proves site ownership with a plain-text file at
//! `<scheme>://<host>/<key>.txt` whose only content is the key itself.

use indexnow_shared::{IndexNowError, Result, site_host};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Shortest key the protocol recommends.
const MIN_KEY_LEN: usize = 8;

/// Longest key the protocol recommends.
const MAX_KEY_LEN: usize = 128;

/// Check the key can name a file at the site root.
///
/// Empty keys and keys with whitespace or path/URL syntax are rejected.
/// Keys outside the protocol's 8-128 `[A-Za-z0-9-]` shape are only warned
/// about; the key file check decides whether they are usable.
pub fn validate_key_format(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(IndexNowError::config("key must not be empty"));
    }

    if let Some(bad) = key
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '/' | '\\' | '.' | '?' | '#' | '%'))
    {
        return Err(IndexNowError::config(format!(
            "key cannot be used as a file name, found {bad:?}"
        )));
    }

    let protocol_shape = (MIN_KEY_LEN..=MAX_KEY_LEN).contains(&key.len())
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !protocol_shape {
        warn!(
            len = key.len(),
            "key is not {MIN_KEY_LEN}-{MAX_KEY_LEN} characters of letters, digits and '-'; \
             some providers may reject it"
        );
    }

    Ok(())
}

/// Location of the key file for the site `site` belongs to.
pub fn key_file_url(key: &str, site: &Url) -> Result<String> {
    Ok(format!("{}://{}/{key}.txt", site.scheme(), site_host(site)?))
}

/// Fetch the key file and confirm its trimmed body equals `key`.
#[instrument(skip_all, fields(site = %site))]
pub async fn verify_key(client: &Client, key: &str, site: &Url) -> Result<()> {
    let url = key_file_url(key, site)?;
    debug!(%url, "fetching key file");

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| IndexNowError::integrity(format!("unable to reach {url}: {e}")))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(IndexNowError::integrity(format!(
            "unable to reach {url}: HTTP {status}"
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| IndexNowError::integrity(format!("unable to read {url}: {e}")))?;

    if body.trim() != key {
        return Err(IndexNowError::integrity(format!(
            "{url} does not contain the expected key"
        )));
    }

    info!(%url, "key file integrity check passed");
    Ok(())
}
