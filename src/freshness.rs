//! Staleness heuristic: decides whether a model reply should be discarded in
//! favor of a live search result.
//!
//! This is a deliberately blunt classifier. It matches a fixed phrase list
//! against both the model's reply and the user's own question, so a
//! time-sensitive question forces a fallback even when the model answered it.
//! Over-triggering is the intended policy: freshness wins over precision.

/// Phrases that mark a reply (or question) as needing live data. Matched
/// case-insensitively as substrings.
const FALLBACK_TRIGGERS: &[&str] = &[
    "don't have access to real-time",
    "can't provide real-time",
    "check the latest",
    "after october 2023",
    "do not have browsing capabilities",
    "cannot access current events",
    "currently unavailable",
    "latest news",
    "who won",
    "today",
    "yesterday",
];

/// Returns true when either the reply or the latest user message contains a
/// trigger phrase. Pure function so the policy can be swapped without
/// touching the coordinator.
pub fn needs_live_data(reply: &str, last_user_message: &str) -> bool {
    let reply = reply.to_lowercase();
    let question = last_user_message.to_lowercase();
    FALLBACK_TRIGGERS
        .iter()
        .any(|trigger| reply.contains(trigger) || question.contains(trigger))
}
