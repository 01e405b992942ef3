use super::{DisplayTokenResolver, PollSummary, ResultGroup, resolve_tokens};
use crate::models::Poll;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

/// Line shown for a section nobody has picked yet.
pub const NO_VOTES: &str = "Sin votos";
/// Marker for options that do not start with an emoji.
pub const DEFAULT_MARKER: &str = "•";

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

lazy_static! {
    static ref LEADING_MARKER: Regex =
        Regex::new(r"^(<a?:[a-zA-Z0-9_]+:\d+>|[\x{1F300}-\x{1FAFF}]|[\x{2600}-\x{27BF}])").unwrap();
}

pub fn calculate_results(poll: &Poll, now: DateTime<Utc>, resolver: &dyn DisplayTokenResolver) -> PollSummary {
    let expired = poll.is_expired(now);
    let days_remaining = match poll.expires_at {
        Some(expires_at) if !expired => Some(days_until(expires_at, now)),
        _ => None,
    };

    let groups = if poll.sections.is_empty() {
        option_groups(poll, resolver)
    } else {
        section_groups(poll, resolver)
    };

    PollSummary {
        expired,
        days_remaining,
        groups,
        total_participants: poll.total_votes(),
    }
}

// Remaining time in whole days, rounded up, never negative.
fn days_until(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (expires_at - now).num_milliseconds().max(0);
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

fn marker_of(option_display: &str) -> &str {
    LEADING_MARKER
        .find(option_display)
        .map(|m| m.as_str())
        .unwrap_or(DEFAULT_MARKER)
}

// One group per section; voters are listed under their option's marker,
// markers in order of first appearance.
fn section_groups(poll: &Poll, resolver: &dyn DisplayTokenResolver) -> Vec<ResultGroup> {
    let entries = poll.section_options();

    poll.sections
        .keys()
        .map(|section| {
            let mut by_marker: Vec<(String, Vec<&str>)> = Vec::new();
            let mut count = 0;

            for entry in entries.iter().filter(|e| e.section == section) {
                let Some(key) = entry.key else { continue };
                let voters = poll.voters_for(key);
                if voters.is_empty() {
                    continue;
                }
                let display = resolve_tokens(entry.text, resolver);
                let marker = marker_of(&display).to_string();
                let slot = match by_marker.iter().position(|(m, _)| *m == marker) {
                    Some(idx) => idx,
                    None => {
                        by_marker.push((marker, Vec::new()));
                        by_marker.len() - 1
                    }
                };
                by_marker[slot].1.extend(voters.iter().map(|v| v.shown_name()));
                count += voters.len();
            }

            let lines = if count == 0 {
                vec![NO_VOTES.to_string()]
            } else {
                by_marker
                    .iter()
                    .flat_map(|(marker, names)| names.iter().map(move |name| format!("{} {}", marker, name)))
                    .collect()
            };

            ResultGroup {
                name: resolve_tokens(section, resolver).trim().to_string(),
                count,
                lines,
            }
        })
        .collect()
}

// Section-less polls: one group per option that has votes, voters numbered.
fn option_groups(poll: &Poll, resolver: &dyn DisplayTokenResolver) -> Vec<ResultGroup> {
    poll.options
        .iter()
        .filter_map(|(key, text)| {
            let voters = poll.voters_for(key);
            if voters.is_empty() {
                return None;
            }
            Some(ResultGroup {
                name: resolve_tokens(text, resolver),
                count: voters.len(),
                lines: voters
                    .iter()
                    .enumerate()
                    .map(|(i, v)| format!("{}. {}", i + 1, v.shown_name()))
                    .collect(),
            })
        })
        .collect()
}
