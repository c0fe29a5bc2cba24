//! Canonical target identifiers.
//!
//! A target is one reachable `host:port` instance of a monitored service.
//! Its canonical id flattens every `.` and `:` in the host to `_` and keeps
//! `:{port}` as the suffix, so the id is safe to use as a document key while
//! the port stays readable: `127.0.0.1:27017` → `127_0_0_1:27017`.

use anyhow::{Context, bail};

/// Build the canonical target id for a `host:port` pair.
///
/// Deterministic: the same inputs always produce the same id.
pub fn canonical_target_id(host: &str, port: u16) -> String {
    let flat: String = host
        .chars()
        .map(|c| if c == '.' || c == ':' { '_' } else { c })
        .collect();
    format!("{flat}:{port}")
}

/// Split a `host:port` string at the last `:`.
///
/// The host part may itself contain `:` (IPv6), so only the rightmost
/// separator counts.
pub fn parse_target(s: &str) -> anyhow::Result<(String, u16)> {
    let Some((host, port)) = s.rsplit_once(':') else {
        bail!("target {s:?} is missing a :port suffix");
    };
    if host.is_empty() {
        bail!("target {s:?} has an empty host");
    }
    let port: u16 = port
        .parse()
        .with_context(|| format!("target {s:?} has an invalid port"))?;
    Ok((host.to_string(), port))
}
