//! # Configuration
//!
//! Environment-driven configuration for the controller and its HTTP server.

mod controller;
mod server;

pub use controller::{token_expiration_secs, ControllerConfig, GcpEndpoints};
pub use server::ServerConfig;

/// Parsed value or `default`
fn lookup_or_default<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Boolean flag: true, 1, yes, on (case-insensitive)
fn lookup_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| {
            let v_lower = v.trim().to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

fn lookup_str<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup_nonempty(lookup, key).unwrap_or_else(|| default.to_string())
}

/// Trimmed value, `None` when unset or blank
fn lookup_nonempty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
