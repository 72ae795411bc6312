//! Media URL boundary.
//!
//! Image paths are persisted relative to the configured media base URL. The
//! base is stripped from incoming URLs before a write and prepended again when
//! a path leaves the core. Nothing else in the crate looks at URL prefixes.

/// Prefixes a stored path with `base`. Values already carrying a scheme are
/// returned unchanged.
pub fn absolutize(base: &str, path: &str) -> String {
    if base.is_empty() || path.is_empty() || has_scheme(path) {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub fn absolutize_opt(base: &str, path: Option<&str>) -> Option<String> {
    path.map(|p| absolutize(base, p))
}

/// Removes a leading `base` from an incoming URL before persisting it.
///
/// The base only matches on a path boundary, so `https://cdn.test.evil.com`
/// is not under `https://cdn.test`. The stored path keeps exactly one
/// leading slash; a `//` prefix would read back as a protocol-relative host.
pub fn strip_base(base: &str, url: &str) -> String {
    let url = url.trim();
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return url.to_string();
    }
    match url.strip_prefix(base) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            format!("/{}", rest.trim_start_matches('/'))
        }
        _ => url.to_string(),
    }
}

fn has_scheme(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//")
}
