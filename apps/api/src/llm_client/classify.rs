//! Error Classifier — turns a raw provider failure into a message a user can act on.
//!
//! Providers disagree on error envelopes (`{"error":{"message":..}}`, `{"error":"..."}`,
//! `{"message":..}`, `{"detail":..}`), so the deep message is found best-effort and
//! matched on keywords in addition to the HTTP status.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Deep messages at least this long are not echoed back verbatim.
const MAX_ECHOED_MESSAGE_CHARS: usize = 200;

static RATE_LIMIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"rate.?limit|quota|resource.?exhausted|too many requests").expect("valid regex")
});
static MODEL_NOT_FOUND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"model.{0,40}not found|does not exist").expect("valid regex"));
static TOO_LARGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"too large|max.?tokens").expect("valid regex"));
static RETRY_IN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"retry in\s*(\d+(?:\.\d+)?)\s*s").expect("valid regex"));

/// Maps an upstream HTTP status and body to a provider-attributed message.
/// Pure and total: always returns a message, never panics.
pub fn classify(status: u16, raw_body: &str, provider: &str) -> String {
    let deep = extract_deep_message(raw_body);
    let lowered = deep.as_deref().unwrap_or_default().to_lowercase();

    if status == 429 || RATE_LIMIT_RE.is_match(&lowered) {
        let hint = match retry_delay_secs(&lowered) {
            Some(secs) => format!(" Please retry in {secs} seconds."),
            None => " Please wait a moment and try again.".to_string(),
        };
        return format!("Rate limit exceeded for {provider}.{hint}");
    }

    if status == 401 || status == 403 {
        return format!("Authentication failed for {provider}. Check your API key.");
    }

    if status == 404 || MODEL_NOT_FOUND_RE.is_match(&lowered) {
        return format!("Model not found on {provider}. Verify the model name.");
    }

    if status == 413 || TOO_LARGE_RE.is_match(&lowered) {
        return format!("Request too large for {provider}. Try a shorter input.");
    }

    if status >= 500 {
        return format!(
            "{provider} server error ({status}). The provider may be experiencing issues."
        );
    }

    match deep {
        Some(message) if message.chars().count() < MAX_ECHOED_MESSAGE_CHARS => {
            format!("{provider}: {message}")
        }
        _ => format!("{provider} request failed ({status})."),
    }
}

/// Best-effort search for the human-readable message inside a provider error body.
fn extract_deep_message(raw_body: &str) -> Option<String> {
    let parsed: Value = match serde_json::from_str(raw_body) {
        Ok(v) => v,
        Err(_) => {
            let trimmed = raw_body.trim();
            return (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
    };

    // Some gateways wrap the envelope in a one-element array.
    let root = match &parsed {
        Value::Array(items) => items.first().unwrap_or(&parsed),
        _ => &parsed,
    };

    let candidates = [
        root.pointer("/error/message"),
        root.pointer("/error/error/message"),
        root.pointer("/error/error"),
        root.get("error"),
        root.get("message"),
        root.get("detail"),
    ];

    let found = candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from);
    found
}

/// Reads hints like "Please retry in 12.4s" and rounds up to whole seconds.
fn retry_delay_secs(lowered_message: &str) -> Option<u64> {
    let captures = RETRY_IN_RE.captures(lowered_message)?;
    let secs: f64 = captures.get(1)?.as_str().parse().ok()?;
    Some(secs.ceil() as u64)
}
