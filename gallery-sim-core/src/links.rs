//! Image link extraction from gallery pages

use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Page body is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),

    #[error("Invalid link pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Finds the images a browser would fetch after loading a page
pub trait ImageLinkExtractor: Send + Sync {
    /// Absolute, same-origin image addresses referenced by `body`, in
    /// document order without duplicates
    fn extract(&self, body: &[u8], base: &Url) -> Result<Vec<Url>, LinkError>;
}

/// Extracts `src` attributes of `<img>` tags with regular expressions.
///
/// Good enough for server-rendered gallery markup; it does not build a DOM.
#[derive(Debug, Clone)]
pub struct RegexLinkExtractor {
    img_tag: Regex,
    src_attr: Regex,
}

impl RegexLinkExtractor {
    pub fn new() -> Result<Self, LinkError> {
        Ok(Self {
            img_tag: Regex::new(r"(?is)<img\b[^>]*>")?,
            src_attr: Regex::new(r#"(?is)\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)?,
        })
    }
}

impl ImageLinkExtractor for RegexLinkExtractor {
    fn extract(&self, body: &[u8], base: &Url) -> Result<Vec<Url>, LinkError> {
        let html = std::str::from_utf8(body)?;
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for tag in self.img_tag.find_iter(html) {
            let Some(captures) = self.src_attr.captures(tag.as_str()) else {
                continue;
            };
            let Some(src) = captures
                .get(1)
                .or_else(|| captures.get(2))
                .or_else(|| captures.get(3))
                .map(|m| m.as_str().trim())
                .filter(|src| !src.is_empty())
            else {
                continue;
            };

            let Ok(url) = base.join(src) else {
                continue;
            };
            // Skip CDN assets and anything else the service did not serve
            if url.origin() != base.origin() {
                continue;
            }
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }

        Ok(links)
    }
}
