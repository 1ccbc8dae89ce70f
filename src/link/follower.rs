//! RFC 5988 `Link` header following

use super::types::LinkFollower;
use crate::http::url::{join_link, split_query};
use crate::http::{Request, Response};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// One link-value: `<target>` followed by its parameters up to the next `<`
static LINK_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([^>]*)>([^<]*)").expect("valid link-value pattern"));

/// The `rel` parameter, quoted or bare
static REL_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*rel\s*=\s*(?:"([^"]*)"|([^\s;,"]+))"#)
        .expect("valid rel pattern")
});

/// Parse a `Link` header into `(relation, url)` pairs, in header order.
///
/// A link-value with several space-separated relations (`rel="next last"`)
/// yields one pair per relation. Values without a `rel` are skipped.
pub fn parse_link_header(header: &str) -> Vec<(String, String)> {
    let mut links = Vec::new();

    for value in LINK_VALUE.captures_iter(header) {
        let url = value[1].trim();
        let params = &value[2];
        let Some(rel) = REL_PARAM.captures(params) else {
            continue;
        };
        let rels = rel.get(1).or_else(|| rel.get(2)).map_or("", |m| m.as_str());
        for rel in rels.split_whitespace() {
            links.push((rel.to_ascii_lowercase(), url.to_string()));
        }
    }

    links
}

/// Follows `rel="next"` and reads the page count from `rel="last"`
#[derive(Debug, Clone)]
pub struct Rfc5988Follower {
    /// Relation that points at the next page
    pub next_rel: String,
    /// Relation that points at the last page
    pub last_rel: String,
    /// Query parameter carrying the page number
    pub page_param: String,
}

impl Default for Rfc5988Follower {
    fn default() -> Self {
        Self {
            next_rel: "next".to_string(),
            last_rel: "last".to_string(),
            page_param: "page".to_string(),
        }
    }
}

impl Rfc5988Follower {
    /// Create a follower with the conventional relation names
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different page number parameter
    #[must_use]
    pub fn with_page_param(mut self, param: impl Into<String>) -> Self {
        self.page_param = param.into();
        self
    }

    /// Use different relation names
    #[must_use]
    pub fn with_relations(mut self, next: impl Into<String>, last: impl Into<String>) -> Self {
        self.next_rel = next.into();
        self.last_rel = last.into();
        self
    }

    fn relation(&self, response: &Response, rel: &str) -> Option<String> {
        response.links().remove(&rel.to_ascii_lowercase())
    }
}

impl LinkFollower for Rfc5988Follower {
    fn next_page(&self, response: &Response) -> Option<String> {
        self.relation(response, &self.next_rel)
            .filter(|url| !url.is_empty())
    }

    fn total_pages(&self, response: &Response) -> Option<u32> {
        let last = self.relation(response, &self.last_rel)?;

        // Relative targets resolve against the URL the response came from
        let page = join_link(&response.url, &last)
            .and_then(|url| split_query(&url))
            .ok()
            .and_then(|(_, query)| query.get(&self.page_param).cloned());

        match page.as_deref().map(str::parse::<u32>) {
            Some(Ok(total)) if total > 0 => Some(total),
            _ => {
                warn!(
                    "Ignoring unusable '{}' link {:?}: no positive '{}' parameter",
                    self.last_rel, last, self.page_param
                );
                None
            }
        }
    }

    fn start_index(&self, first: &Request) -> u32 {
        first
            .query
            .get(&self.page_param)
            .and_then(|page| page.trim().parse().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1)
    }

    fn page_request(&self, first: &Request, index: u32) -> Option<Request> {
        Some(
            first
                .clone()
                .with_query(self.page_param.clone(), index.to_string()),
        )
    }
}
