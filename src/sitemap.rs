use crate::error::SitemapError;
use crate::network::get_url_content;
use quick_xml::NsReader;
use quick_xml::Reader;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use reqwest::Client;
use std::fmt;

/// Namespace every `<loc>` must live in to be picked up.
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

// region: Structs & Enums
#[derive(Debug, PartialEq)]
pub enum SitemapType {
    SitemapIndex,
    UrlSet,
    Unknown,
}

impl fmt::Display for SitemapType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
// endregion

// region: Functions
/// Fetches a sitemap and returns every URL it lists, in document order.
///
/// A sitemap index is followed one level deep. Transport failures are logged
/// and yield an empty list (or skip the affected child sitemap); parse
/// failures are returned to the caller.
///
/// # Arguments
///
/// * `sitemap_url` - The URL of the sitemap or sitemap index to read.
/// * `client` - The `reqwest::Client` used for every download, including child sitemaps.
///
/// # Returns
///
/// The `<loc>` values of the sitemap, or of every reachable child sitemap when
/// `sitemap_url` points at an index. An unreachable sitemap yields an empty list.
///
/// # Errors
///
/// Returns [`SitemapError::Xml`] or [`SitemapError::Malformed`] when the sitemap
/// or one of its children is not well-formed XML.
pub async fn fetch(sitemap_url: &str, client: &Client) -> Result<Vec<String>, SitemapError> {
    let content = match get_url_content(sitemap_url, client).await {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(url = sitemap_url, error = %SitemapError::Fetch(e), "Failed to fetch sitemap");
            return Ok(Vec::new());
        }
    };

    let sitemap_type = identify_sitemap_type(&content);
    tracing::debug!(url = sitemap_url, %sitemap_type, "Fetched sitemap");

    if sitemap_type != SitemapType::SitemapIndex {
        return extract_sitemap_urls(&content);
    }

    let mut urls = Vec::new();
    for child_url in extract_sitemap_urls(&content)? {
        match get_url_content(&child_url, client).await {
            Ok(child) => urls.extend(extract_sitemap_urls(&child)?),
            Err(e) => {
                tracing::error!(url = %child_url, error = %e, "The referenced sitemap is missing");
            }
        }
    }
    Ok(urls)
}

/// Looks at the root element only; anything unreadable is `Unknown`.
pub fn identify_sitemap_type(xml: &str) -> SitemapType {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                return match e.local_name().as_ref() {
                    b"sitemapindex" => SitemapType::SitemapIndex,
                    b"urlset" => SitemapType::UrlSet,
                    _ => SitemapType::Unknown,
                };
            }
            Ok(Event::Eof) | Err(_) => return SitemapType::Unknown,
            _ => {}
        }
    }
}

fn is_sitemap_loc(ns: &ResolveResult, local_name: &[u8]) -> bool {
    local_name == b"loc"
        && matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == SITEMAP_NAMESPACE.as_bytes())
}

/// Extracts the text of every `<loc>` element in the sitemap namespace.
///
/// Empty locations, written as `<loc></loc>` or `<loc/>`, are skipped with a
/// warning.
///
/// # Errors
///
/// Returns [`SitemapError::Xml`] when the reader rejects the document and
/// [`SitemapError::Malformed`] when it has no root element or ends before
/// every element is closed.
pub fn extract_sitemap_urls(xml: &str) -> Result<Vec<String>, SitemapError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut urls = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut current: Option<String> = None;

    loop {
        match reader.read_resolved_event()? {
            (ns, Event::Start(e)) => {
                if depth == 0 && seen_root {
                    return Err(SitemapError::Malformed(
                        "more than one root element".to_string(),
                    ));
                }
                seen_root = true;
                depth += 1;
                if is_sitemap_loc(&ns, e.local_name().as_ref()) {
                    current = Some(String::new());
                }
            }
            (ns, Event::End(e)) => {
                depth = depth.saturating_sub(1);
                if is_sitemap_loc(&ns, e.local_name().as_ref()) {
                    if let Some(url) = current.take() {
                        let url = url.trim();
                        if url.is_empty() {
                            tracing::warn!("Skipping empty <loc> element");
                        } else {
                            urls.push(url.to_string());
                        }
                    }
                }
            }
            (ns, Event::Empty(e)) => {
                if is_sitemap_loc(&ns, e.local_name().as_ref()) {
                    tracing::warn!("Skipping empty <loc> element");
                }
                if depth == 0 {
                    if seen_root {
                        return Err(SitemapError::Malformed(
                            "more than one root element".to_string(),
                        ));
                    }
                    seen_root = true;
                }
            }
            (_, Event::Text(text)) => {
                let text = text
                    .unescape()
                    .map_err(|e| SitemapError::Malformed(e.to_string()))?;
                if depth == 0 {
                    return Err(SitemapError::Malformed(format!(
                        "unexpected text outside the root element: {}",
                        crate::utils::truncate_message(&text, 40)
                    )));
                }
                if let Some(url) = current.as_mut() {
                    url.push_str(&text);
                }
            }
            (_, Event::CData(data)) => {
                if let Some(url) = current.as_mut() {
                    url.push_str(&String::from_utf8_lossy(&data));
                }
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(SitemapError::Malformed("document has no root element".to_string()));
    }
    if depth != 0 {
        return Err(SitemapError::Malformed(
            "document ended before all elements were closed".to_string(),
        ));
    }

    Ok(urls)
}
// endregion
