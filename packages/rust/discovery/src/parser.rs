//! Sitemap document classifier.
//!
//! A fetched document is one of two shapes defined by the sitemaps.org schema:
//! - Sitemap index: `<sitemapindex>` with `<sitemap><loc>` children
//! - URL set: `<urlset>` with `<url><loc>` children
//!
//! Element matching uses local names only, so prefixed or namespaced tags
//! are accepted. Only `<loc>` elements directly inside a root-level entry
//! count; extension elements like `<image:loc>` sit deeper and are ignored.

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::warn;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Parsed form of one fetched sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// Child sitemap locations, in document order. Never empty.
    Index(Vec<String>),
    /// Page locations, in document order. May be empty.
    UrlSet(Vec<String>),
}

/// Why a document could not be read as either sitemap shape.
#[derive(Debug, thiserror::Error)]
pub enum ParseFailure {
    /// The underlying XML was malformed.
    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    /// The input contained no element at all.
    #[error("document has no root element")]
    NoRootElement,

    /// Input ended before the root element was closed.
    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(String),
}

/// The two kinds of root-level entry we collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Sitemap,
    Url,
}

impl EntryKind {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"sitemap" => Some(Self::Sitemap),
            b"url" => Some(Self::Url),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Classify raw sitemap bytes as an index or a URL set.
///
/// A document with at least one `<sitemap><loc>` entry is an index, even if
/// it also carries `<url>` entries. Anything else that is well-formed XML is
/// a URL set. Content after the root element closes is not read.
pub fn classify(data: &[u8]) -> Result<SitemapDocument, ParseFailure> {
    let mut reader = Reader::from_reader(data);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut sitemaps = Vec::new();
    let mut urls = Vec::new();

    // Depth 1 is the root, 2 an entry, 3 the entry's children.
    let mut depth = 0usize;
    let mut root_name = String::new();
    let mut entry: Option<EntryKind> = None;
    let mut loc: Option<String> = None;
    let mut in_loc = false;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                let name = e.local_name();
                match depth {
                    1 => root_name = String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    2 => {
                        entry = EntryKind::from_local_name(name.as_ref());
                        loc = None;
                    }
                    3 if entry.is_some() && name.as_ref() == b"loc" => {
                        in_loc = true;
                        text.clear();
                    }
                    _ => {}
                }
            }
            // A self-closing root is an empty document.
            Event::Empty(_) if depth == 0 => return Ok(SitemapDocument::UrlSet(Vec::new())),
            Event::Text(e) if in_loc => text.push_str(&e.unescape()?),
            Event::CData(e) if in_loc => text.push_str(&String::from_utf8_lossy(&e)),
            Event::End(_) => {
                match depth {
                    3 if in_loc => {
                        loc = Some(text.trim().to_string());
                        in_loc = false;
                    }
                    2 => match entry.take() {
                        Some(EntryKind::Sitemap) => push_loc(&mut sitemaps, loc.take(), "sitemap"),
                        Some(EntryKind::Url) => push_loc(&mut urls, loc.take(), "url"),
                        None => {}
                    },
                    _ => {}
                }
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            Event::Eof if depth == 0 => return Err(ParseFailure::NoRootElement),
            Event::Eof => return Err(ParseFailure::UnexpectedEof(root_name)),
            _ => {}
        }
        buf.clear();
    }

    if sitemaps.is_empty() {
        Ok(SitemapDocument::UrlSet(urls))
    } else {
        Ok(SitemapDocument::Index(sitemaps))
    }
}

fn push_loc(out: &mut Vec<String>, loc: Option<String>, element: &str) {
    match loc {
        Some(loc) if !loc.is_empty() => out.push(loc),
        _ => warn!(element, "skipping sitemap entry without a <loc>"),
    }
}
