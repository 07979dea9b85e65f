//! Helpers for sanitizing values before they reach log lines.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Masks the password in a database URL.
///
/// - `postgresql://admin:secret@db:5432/entrepot` → `postgresql://admin:****@db:5432/entrepot`
/// - `postgresql://db/entrepot` → unchanged
/// - `sqlite::memory:` → unchanged
pub fn redact_database_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let scheme = &url[..scheme_end + 3];
    let rest = &url[scheme_end + 3..];

    let authority_end = rest.find('/').unwrap_or(rest.len());
    let Some(at_pos) = rest[..authority_end].rfind('@') else {
        return url.to_string();
    };

    let userinfo = &rest[..at_pos];
    let after_at = &rest[at_pos + 1..];
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{}{}:****@{}", scheme, user, after_at),
        None => url.to_string(),
    }
}
