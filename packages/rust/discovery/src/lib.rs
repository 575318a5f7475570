//! Sitemap discovery: resolve a root sitemap into the flat list of page URLs.
//!
//! Starting from one sitemap URL, every sitemap index is expanded depth-first
//! in document order and the `<loc>` entries of each URL set are collected.
//! Each sitemap URL is fetched at most once per run, so cyclic and repeated
//! references terminate. Any fetch or parse failure aborts the whole run;
//! partial URL lists are never returned.

mod fetch;
mod parser;

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use indexnow_shared::{IndexNowError, Result};
use tracing::{debug, info, instrument};
use url::Url;

pub use fetch::{HttpFetcher, MAX_SITEMAP_SIZE, SitemapFetcher, build_client};
pub use parser::{ParseFailure, SitemapDocument, classify};

// ---------------------------------------------------------------------------
// Traversal state
// ---------------------------------------------------------------------------

/// Mutable state of one aggregation run.
#[derive(Debug, Default)]
pub struct Traversal {
    visited: HashSet<String>,
    urls: Vec<String>,
}

impl Traversal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sitemap URLs fetched (or attempted) so far.
    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    /// Page URLs collected so far, in pre-order.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Record a sitemap visit. Returns `false` if it was already visited.
    fn mark_visited(&mut self, sitemap_url: &str) -> bool {
        self.visited.insert(sitemap_url.to_string())
    }
}

/// Outcome of a successful aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    /// Page URLs from every URL set, in pre-order. Not deduplicated.
    pub urls: Vec<String>,
    /// Number of distinct sitemap documents fetched.
    pub sitemaps_fetched: usize,
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Resolve `root` into every page URL reachable through sitemap indexes.
#[instrument(skip_all, fields(root = %root))]
pub async fn aggregate<F: SitemapFetcher>(fetcher: &F, root: &Url) -> Result<Aggregation> {
    let mut traversal = Traversal::new();
    expand(fetcher, root.as_str(), &mut traversal).await?;

    let aggregation = Aggregation {
        sitemaps_fetched: traversal.visited.len(),
        urls: traversal.urls,
    };

    info!(
        sitemaps = aggregation.sitemaps_fetched,
        urls = aggregation.urls.len(),
        "sitemap aggregation complete"
    );

    Ok(aggregation)
}

/// Expand one sitemap into `traversal`, recursing into index children.
///
/// Already-visited URLs are a no-op. Children are expanded in the order they
/// are listed, and the first failing child aborts the expansion.
pub fn expand<'a, F: SitemapFetcher>(
    fetcher: &'a F,
    sitemap_url: &'a str,
    traversal: &'a mut Traversal,
) -> Pin<Box<dyn Future<Output = Result<()>> + 'a>> {
    Box::pin(async move {
        if !traversal.mark_visited(sitemap_url) {
            debug!(url = sitemap_url, "sitemap already visited, skipping");
            return Ok(());
        }

        let data = fetcher.fetch(sitemap_url).await?;

        let document =
            classify(&data).map_err(|e| IndexNowError::parse(sitemap_url, e.to_string()))?;

        match document {
            SitemapDocument::Index(children) => {
                debug!(url = sitemap_url, children = children.len(), "expanding sitemap index");
                for child in &children {
                    expand(fetcher, child, traversal).await?;
                }
            }
            SitemapDocument::UrlSet(locs) => {
                debug!(url = sitemap_url, urls = locs.len(), "collected URL set");
                traversal.urls.extend(locs);
            }
        }

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    // -----------------------------------------------------------------------
    // In-memory fetcher
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct MemoryFetcher {
        docs: HashMap<String, String>,
        calls: RefCell<Vec<String>>,
    }

    impl MemoryFetcher {
        fn with(mut self, url: &str, body: impl Into<String>) -> Self {
            self.docs.insert(url.to_string(), body.into());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl SitemapFetcher for MemoryFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.borrow_mut().push(url.to_string());
            self.docs
                .get(url)
                .map(|body| body.clone().into_bytes())
                .ok_or_else(|| IndexNowError::fetch(url, "HTTP 404 Not Found"))
        }
    }

    fn index(children: &[&str]) -> String {
        let entries: String = children
            .iter()
            .map(|c| format!("<sitemap><loc>{c}</loc></sitemap>"))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</sitemapindex>"#
        )
    }

    fn urlset(pages: &[&str]) -> String {
        let entries: String = pages
            .iter()
            .map(|p| format!("<url><loc>{p}</loc></url>"))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</urlset>"#
        )
    }

    fn root(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    // -----------------------------------------------------------------------
    // Aggregation properties
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn index_with_two_children_yields_preorder_union() {
        let fetcher = MemoryFetcher::default()
            .with(
                "https://example.com/sitemap.xml",
                index(&["https://example.com/a.xml", "https://example.com/b.xml"]),
            )
            .with(
                "https://example.com/a.xml",
                urlset(&[
                    "https://example.com/1",
                    "https://example.com/2",
                    "https://example.com/3",
                ]),
            )
            .with(
                "https://example.com/b.xml",
                urlset(&["https://example.com/4", "https://example.com/5"]),
            );

        let result = aggregate(&fetcher, &root("https://example.com/sitemap.xml"))
            .await
            .unwrap();

        assert_eq!(
            result.urls,
            [
                "https://example.com/1",
                "https://example.com/2",
                "https://example.com/3",
                "https://example.com/4",
                "https://example.com/5",
            ]
        );
        assert_eq!(result.sitemaps_fetched, 3);
    }

    #[tokio::test]
    async fn plain_urlset_root() {
        let fetcher = MemoryFetcher::default().with(
            "https://example.com/sitemap.xml",
            urlset(&["https://example.com/only"]),
        );

        let result = aggregate(&fetcher, &root("https://example.com/sitemap.xml"))
            .await
            .unwrap();
        assert_eq!(result.urls, ["https://example.com/only"]);
        assert_eq!(result.sitemaps_fetched, 1);
    }

    #[tokio::test]
    async fn nested_indexes_are_expanded_depth_first() {
        let fetcher = MemoryFetcher::default()
            .with(
                "https://example.com/root.xml",
                index(&["https://example.com/mid.xml", "https://example.com/c.xml"]),
            )
            .with(
                "https://example.com/mid.xml",
                index(&["https://example.com/a.xml", "https://example.com/b.xml"]),
            )
            .with("https://example.com/a.xml", urlset(&["https://example.com/a"]))
            .with("https://example.com/b.xml", urlset(&["https://example.com/b"]))
            .with("https://example.com/c.xml", urlset(&["https://example.com/c"]));

        let result = aggregate(&fetcher, &root("https://example.com/root.xml"))
            .await
            .unwrap();

        assert_eq!(
            result.urls,
            ["https://example.com/a", "https://example.com/b", "https://example.com/c"]
        );
        assert_eq!(
            fetcher.calls(),
            [
                "https://example.com/root.xml",
                "https://example.com/mid.xml",
                "https://example.com/a.xml",
                "https://example.com/b.xml",
                "https://example.com/c.xml",
            ]
        );
    }

    #[tokio::test]
    async fn cycle_terminates() {
        let fetcher = MemoryFetcher::default()
            .with(
                "https://example.com/a.xml",
                index(&["https://example.com/b.xml", "https://example.com/leaf.xml"]),
            )
            .with(
                "https://example.com/b.xml",
                index(&["https://example.com/a.xml"]),
            )
            .with("https://example.com/leaf.xml", urlset(&["https://example.com/page"]));

        let result = aggregate(&fetcher, &root("https://example.com/a.xml"))
            .await
            .unwrap();

        assert_eq!(result.urls, ["https://example.com/page"]);
        assert_eq!(fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn self_reference_terminates() {
        let fetcher = MemoryFetcher::default().with(
            "https://example.com/sitemap.xml",
            index(&["https://example.com/sitemap.xml"]),
        );

        let result = aggregate(&fetcher, &root("https://example.com/sitemap.xml"))
            .await
            .unwrap();
        assert!(result.urls.is_empty());
        assert_eq!(fetcher.calls(), ["https://example.com/sitemap.xml"]);
    }

    #[tokio::test]
    async fn diamond_child_fetched_once() {
        let fetcher = MemoryFetcher::default()
            .with(
                "https://example.com/root.xml",
                index(&["https://example.com/left.xml", "https://example.com/right.xml"]),
            )
            .with(
                "https://example.com/left.xml",
                index(&["https://example.com/shared.xml"]),
            )
            .with(
                "https://example.com/right.xml",
                index(&["https://example.com/shared.xml"]),
            )
            .with(
                "https://example.com/shared.xml",
                urlset(&["https://example.com/s1", "https://example.com/s2"]),
            );

        let result = aggregate(&fetcher, &root("https://example.com/root.xml"))
            .await
            .unwrap();

        assert_eq!(result.urls, ["https://example.com/s1", "https://example.com/s2"]);
        let shared_fetches = fetcher
            .calls()
            .iter()
            .filter(|u| u.as_str() == "https://example.com/shared.xml")
            .count();
        assert_eq!(shared_fetches, 1);
        assert_eq!(result.sitemaps_fetched, 4);
    }

    #[tokio::test]
    async fn duplicate_pages_across_leaves_are_kept() {
        let fetcher = MemoryFetcher::default()
            .with(
                "https://example.com/root.xml",
                index(&["https://example.com/a.xml", "https://example.com/b.xml"]),
            )
            .with("https://example.com/a.xml", urlset(&["https://example.com/dup"]))
            .with("https://example.com/b.xml", urlset(&["https://example.com/dup"]));

        let result = aggregate(&fetcher, &root("https://example.com/root.xml"))
            .await
            .unwrap();
        assert_eq!(result.urls, ["https://example.com/dup", "https://example.com/dup"]);
    }

    #[tokio::test]
    async fn index_urls_never_reach_the_result() {
        let mixed = r#"<root>
  <sitemap><loc>https://example.com/leaf.xml</loc></sitemap>
  <url><loc>https://example.com/ignored</loc></url>
</root>"#;
        let fetcher = MemoryFetcher::default()
            .with("https://example.com/root.xml", mixed)
            .with("https://example.com/leaf.xml", urlset(&["https://example.com/kept"]));

        let result = aggregate(&fetcher, &root("https://example.com/root.xml"))
            .await
            .unwrap();
        assert_eq!(result.urls, ["https://example.com/kept"]);
    }

    // -----------------------------------------------------------------------
    // Failure policy
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn unparsable_child_fails_naming_its_url() {
        let fetcher = MemoryFetcher::default()
            .with(
                "https://example.com/root.xml",
                index(&["https://example.com/good.xml", "https://example.com/bad.xml"]),
            )
            .with("https://example.com/good.xml", urlset(&["https://example.com/1"]))
            .with("https://example.com/bad.xml", "<urlset><url><loc>broken</url>");

        let err = aggregate(&fetcher, &root("https://example.com/root.xml"))
            .await
            .unwrap_err();

        match err {
            IndexNowError::Parse { url, .. } => assert_eq!(url, "https://example.com/bad.xml"),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_failure_stops_remaining_siblings() {
        let fetcher = MemoryFetcher::default()
            .with(
                "https://example.com/root.xml",
                index(&[
                    "https://example.com/missing.xml",
                    "https://example.com/later.xml",
                ]),
            )
            .with("https://example.com/later.xml", urlset(&["https://example.com/1"]));

        let err = aggregate(&fetcher, &root("https://example.com/root.xml"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IndexNowError::Fetch { ref url, .. } if url == "https://example.com/missing.xml"
        ));
        assert!(!fetcher.calls().contains(&"https://example.com/later.xml".to_string()));
    }

    #[tokio::test]
    async fn expand_reuses_traversal_state() {
        let fetcher = MemoryFetcher::default()
            .with("https://example.com/a.xml", urlset(&["https://example.com/1"]));

        let mut traversal = Traversal::new();
        expand(&fetcher, "https://example.com/a.xml", &mut traversal)
            .await
            .unwrap();
        expand(&fetcher, "https://example.com/a.xml", &mut traversal)
            .await
            .unwrap();

        assert_eq!(traversal.urls(), ["https://example.com/1"]);
        assert!(traversal.visited().contains("https://example.com/a.xml"));
        assert_eq!(fetcher.calls().len(), 1);
    }

    // -----------------------------------------------------------------------
    // Over HTTP
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn aggregate_with_mock_server() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let base = server.uri();
        let posts = format!("{base}/posts.xml");
        let pages = format!("{base}/pages.xml");
        let post_1 = format!("{base}/post-1");
        let post_2 = format!("{base}/post-2");
        let about = format!("{base}/about");

        Mock::given(method("GET"))
            .and(path("/sitemap_index.xml"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(index(&[posts.as_str(), pages.as_str()])),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/posts.xml"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(urlset(&[post_1.as_str(), post_2.as_str()])),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/pages.xml"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(urlset(&[about.as_str()])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(build_client(&Default::default()).unwrap());
        let result = aggregate(&fetcher, &root(&format!("{base}/sitemap_index.xml")))
            .await
            .unwrap();

        assert_eq!(result.urls, [post_1, post_2, about]);
    }
}
