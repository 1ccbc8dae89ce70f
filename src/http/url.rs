//! URL preparation
//!
//! Resolves caller-supplied paths against a base URL and moves query strings
//! into the request's parameter map, so that a request's identity never
//! depends on how its parameters were spelled.

use crate::error::Result;
use crate::types::QueryMap;
use url::Url;

/// Split an absolute URL into its query-less form and its parameters
pub fn split_query(raw: &str) -> Result<(String, QueryMap)> {
    let mut url = Url::parse(raw)?;
    let query: QueryMap = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.set_query(None);
    url.set_fragment(None);
    Ok((url.to_string(), query))
}

/// Resolve a link target against the URL it was served from.
///
/// RFC 5988 allows relative targets (`</items?page=2>`). Without a usable
/// base only absolute targets resolve.
pub fn join_link(base: &str, link: &str) -> Result<String> {
    match Url::parse(base) {
        Ok(base) => Ok(base.join(link.trim())?.to_string()),
        Err(_) => Ok(Url::parse(link.trim())?.to_string()),
    }
}

/// Whether `raw` carries a scheme and can be used without a base URL
pub fn is_absolute(raw: &str) -> bool {
    Url::parse(raw).is_ok()
}

/// Resolve `path` against `base`.
///
/// Absolute URLs are returned unchanged. Relative paths lose their leading
/// slash (so they extend the base path instead of replacing it) and gain a
/// trailing slash when `trailing_slash` is set.
pub fn resolve(base: Option<&str>, path: &str, trailing_slash: bool) -> Result<String> {
    if is_absolute(path) {
        return Ok(path.to_string());
    }

    let (path, query) = match path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path, None),
    };
    let mut path = path.trim_start_matches('/').to_string();
    if trailing_slash && !path.ends_with('/') {
        path.push('/');
    }
    if let Some(query) = query {
        path.push('?');
        path.push_str(query);
    }

    match base {
        Some(base) => {
            let mut base = Url::parse(base)?;
            // Joining replaces the last segment unless the base ends with '/'
            if !base.path().ends_with('/') {
                let with_slash = format!("{}/", base.path());
                base.set_path(&with_slash);
            }
            Ok(base.join(&path)?.to_string())
        }
        None => Ok(Url::parse(&path)?.to_string()),
    }
}
