//! URL classification: normalization, domain extraction, and
//! homepage/category detection.
//!
//! Homepage URLs carry no checkable content and pollute citations, so the
//! merger drops them before reranking. Classification is rule-based and
//! deliberately conservative: an unparseable URL is treated as a regular
//! article rather than silently discarded.

use std::collections::HashSet;

use lazy_static::lazy_static;
use ::url::Url;

lazy_static! {
    /// Single path segments that indicate a section front rather than an
    /// article ("example.com/news", "example.com/politics", ...).
    static ref SECTION_SEGMENTS: HashSet<&'static str> = [
        "home", "index", "main", "default", "welcome",
        "news", "about", "contact", "search", "sitemap",
        "fact-check", "factcheck", "technology", "tech", "politics",
        "sports", "entertainment", "business", "world", "national",
        "local", "opinion", "lifestyle", "health", "science",
        "athletic", "sport", "athletics",
    ]
    .into_iter()
    .collect();

    /// Generic second segments that mark a two-level category listing.
    static ref GENERIC_LISTING_SEGMENTS: HashSet<&'static str> =
        ["news", "articles", "stories", "posts"].into_iter().collect();
}

/// Classifies URLs for the merge step.
///
/// The pipeline consumes this as a seam so deployments can swap in a
/// smarter classifier; [`RuleBasedUrlClassifier`] is the default.
pub trait UrlClassifier: Send + Sync {
    /// True when the URL points at a homepage or category listing rather
    /// than a specific article.
    fn is_homepage(&self, url: &str) -> bool;
}

/// Default classifier backed by the rule set in this module.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedUrlClassifier;

impl UrlClassifier for RuleBasedUrlClassifier {
    fn is_homepage(&self, url: &str) -> bool {
        is_homepage(url)
    }
}

/// Canonical form of a URL, used as the dedupe key during merge.
///
/// Lowercases scheme and host, drops the fragment, and trims the
/// trailing slash from the path so `/story` and `/story/` collapse.
/// Unparseable input is returned trimmed but otherwise untouched.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut parsed) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };
    parsed.set_fragment(None);
    let bare = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&bare);
    parsed.to_string()
}

/// Registrable-ish domain for grouping: host with any `www.` prefix
/// stripped. `None` when the URL has no parseable host.
pub fn domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// True when a URL is likely a homepage or category front, not an article.
pub fn is_homepage(url: &str) -> bool {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return true;
    }
    let Ok(parsed) = Url::parse(trimmed) else {
        return false;
    };

    let path = parsed.path();
    if path.is_empty() || path == "/" {
        return true;
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [single] => SECTION_SEGMENTS.contains(single.to_lowercase().as_str()),
        // Two-level paths with a trailing slash are usually category
        // listings unless the second segment reads like an article ID.
        [_, second] if path.ends_with('/') => !looks_like_article_id(second),
        _ => false,
    }
}

/// Article-quality term for reranking: 1.0 for article-specific URLs,
/// `ambiguous_quality` for shallow or unparseable ones.
pub fn article_quality(url: &str, ambiguous_quality: f32) -> f32 {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return ambiguous_quality;
    };
    let segments: Vec<&str> = parsed.path().split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [] => ambiguous_quality,
        [single] if looks_like_slug(single) => 1.0,
        [_] => ambiguous_quality,
        _ => 1.0,
    }
}

/// Article IDs are longer alphanumeric tokens (hyphens/underscores
/// allowed) that are not generic listing words.
fn looks_like_article_id(segment: &str) -> bool {
    let cleaned: String = segment.chars().filter(|c| *c != '-' && *c != '_').collect();
    !cleaned.is_empty()
        && cleaned.chars().all(char::is_alphanumeric)
        && segment.chars().count() > 5
        && !GENERIC_LISTING_SEGMENTS.contains(segment.to_lowercase().as_str())
}

/// Slugs carry word separators or digits; bare words like "news" do not.
fn looks_like_slug(segment: &str) -> bool {
    segment.contains('-')
        || segment.contains('_')
        || segment.chars().any(|c| c.is_ascii_digit())
        || segment.chars().count() > 20
}
