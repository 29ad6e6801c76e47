//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Decides whether two dancer references denote the same person. Dancers may carry a structured
// profile or only a free-text name; a free-text name is matched through the public handle it
// mentions, if any.
//
// | Function         | Description                                               |
// |------------------|-----------------------------------------------------------|
// | extract_handle   | First `@handle` found in a free-text string               |
// | is_same          | Identity comparison across profile and free-text forms    |
//--------------------------------------------------------------------------------------------------

use regex::Regex;
use std::sync::LazyLock;

use crate::domain::models::Dancer;

/// Handle rules: 5 to 32 characters after `@`, starting with a letter, ending with a letter or
/// digit, underscores allowed in between.
static HANDLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\b|\s)@([a-zA-Z][a-zA-Z0-9_]{3,30}[a-zA-Z0-9])(?:\b|$)")
        .expect("valid handle regex")
});

/// Extracts the first handle mentioned in `text`, without the `@`.
pub fn extract_handle(text: &str) -> Option<&str> {
    HANDLE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Returns true if both dancers denote the same person.
///
/// Two profiles are compared by id. A profile with a handle matches free text mentioning that
/// handle. Two free-text names match when they mention the same handle. Anything else never
/// matches.
pub fn is_same(a: &Dancer, b: &Dancer) -> bool {
    match (&a.profile, &b.profile) {
        (Some(pa), Some(pb)) => pa.id == pb.id,
        (Some(p), None) => profile_mentioned(p.handle(), &b.full_name),
        (None, Some(p)) => profile_mentioned(p.handle(), &a.full_name),
        (None, None) => match (extract_handle(&a.full_name), extract_handle(&b.full_name)) {
            (Some(ha), Some(hb)) => ha == hb,
            _ => false,
        },
    }
}

fn profile_mentioned(handle: Option<&str>, text: &str) -> bool {
    match (handle, extract_handle(text)) {
        (Some(h), Some(mentioned)) => h == mentioned,
        _ => false,
    }
}
