//! Text and URL normalization used to build comparison keys.

use url::{ParseError, Url};

/// Collapses every run of whitespace into a single space and trims the ends.
pub fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Comparison key for a title. Never used for display.
pub fn normalize_title(value: &str) -> String {
    normalize_text(value).to_lowercase()
}

/// Canonical form of an article URL.
///
/// Missing schemes default to `https` and `http` is upgraded to `https`. The
/// host is lower-cased and loses a leading `www.` label, an empty path
/// becomes `/`, the query string is kept and the fragment is dropped.
///
/// Input that still does not parse falls back to its whitespace-normalized
/// form, so two identical unparsable strings still compare equal.
pub fn canonicalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut parsed = match parse_with_default_scheme(trimmed) {
        Some(parsed) => parsed,
        None => return normalize_text(trimmed),
    };

    if parsed.scheme() == "http" {
        // Both are special schemes, so this cannot fail.
        let _ = parsed.set_scheme("https");
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        if let Some(stripped) = host.strip_prefix("www.") {
            if !stripped.is_empty() && parsed.set_host(Some(stripped)).is_err() {
                return normalize_text(trimmed);
            }
        }
    }

    if parsed.path().is_empty() {
        parsed.set_path("/");
    }
    parsed.set_fragment(None);

    parsed.to_string()
}

fn parse_with_default_scheme(raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(parsed) if parsed.has_host() => Some(parsed),
        Ok(_) => None,
        Err(ParseError::RelativeUrlWithoutBase) => {
            let with_scheme = if raw.starts_with("//") {
                format!("https:{}", raw)
            } else {
                format!("https://{}", raw)
            };
            Url::parse(&with_scheme).ok().filter(Url::has_host)
        }
        Err(_) => None,
    }
}
