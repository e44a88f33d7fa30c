//! Tag code extraction from scanned QR payloads
//!
//! Payloads come in three shapes: a donation URL with the code in the
//! query string, a donation URL with the code in the path, or the bare
//! code (optionally prefixed `TAG:`). Extractors are tried in that order
//! and the first hit wins.

/// Query parameters that may carry the tag code, in priority order
const QUERY_KEYS: [&str; 3] = ["tag", "tagCode", "code"];

/// Path segments that precede the tag code
const PATH_MARKERS: [&str; 3] = ["tag", "t", "donate"];

const RAW_PREFIX: &str = "TAG:";

const MIN_CODE_LEN: usize = 3;
const MAX_CODE_LEN: usize = 32;

/// One extraction strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagExtractor {
    QueryParam,
    PathSegment,
    RawPattern,
}

impl TagExtractor {
    /// Strategies in priority order
    pub const ORDER: [TagExtractor; 3] = [
        TagExtractor::QueryParam,
        TagExtractor::PathSegment,
        TagExtractor::RawPattern,
    ];

    pub fn extract(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        let code = match self {
            TagExtractor::QueryParam => from_query(raw),
            TagExtractor::PathSegment => from_path(raw),
            TagExtractor::RawPattern => from_raw(raw),
        }?;
        is_tag_code(code).then(|| code.to_string())
    }
}

/// Extract a tag code from scanned text
pub fn extract_tag_code(raw: &str) -> Option<String> {
    TagExtractor::ORDER.iter().find_map(|extractor| {
        let code = extractor.extract(raw)?;
        tracing::debug!(extractor = ?extractor, code = %code, "Tag code extracted");
        Some(code)
    })
}

/// 3 to 32 characters of `[A-Za-z0-9_-]`
pub fn is_tag_code(candidate: &str) -> bool {
    (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&candidate.len())
        && candidate.chars().all(is_code_char)
}

fn is_code_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn from_query(raw: &str) -> Option<&str> {
    let (_, query) = raw.split_once('?')?;
    let query = query.split('#').next().unwrap_or_default();

    let params: Vec<(&str, &str)> = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .collect();

    QUERY_KEYS.iter().find_map(|key| {
        params
            .iter()
            .find(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim())
    })
}

fn from_path(raw: &str) -> Option<&str> {
    // Drop scheme and host, then query and fragment
    let path = match raw.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path)?,
        None => raw,
    };
    let path = path.split(['?', '#']).next().unwrap_or_default();

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    segments.windows(2).find_map(|pair| {
        PATH_MARKERS
            .iter()
            .any(|marker| pair[0].eq_ignore_ascii_case(marker))
            .then_some(pair[1])
    })
}

fn from_raw(raw: &str) -> Option<&str> {
    if is_tag_code(raw) {
        return Some(raw);
    }

    let upper = raw.to_ascii_uppercase();
    let start = upper.find(RAW_PREFIX)? + RAW_PREFIX.len();
    let rest = raw[start..].trim_start();
    let end = rest.find(|c: char| !is_code_char(c)).unwrap_or(rest.len());
    Some(&rest[..end])
}
