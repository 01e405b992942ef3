use super::strip_tokens;
use crate::models::Poll;
use chrono::{DateTime, Utc};

/// Header row plus data rows, rendered as CSV with every field quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DelimitedTable {
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in std::iter::once(&self.headers).chain(self.rows.iter()) {
            let line: Vec<String> = row.iter().map(|field| quote(field)).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Build the export table for a poll.
///
/// With sections: one column per section and one row per distinct voter
/// (by username, in order of first appearance); each cell holds the option
/// the voter picked in that section. Without sections: one `Option`/`Voter`
/// row per vote.
pub fn export_table(poll: &Poll) -> DelimitedTable {
    if poll.sections.is_empty() {
        return flat_table(poll);
    }

    let entries = poll.section_options();
    let section_names: Vec<&str> = poll.sections.keys().collect();

    let mut voters: Vec<&str> = Vec::new();
    for entry in &entries {
        if let Some(key) = entry.key {
            for voter in poll.voters_for(key) {
                if !voters.contains(&voter.username.as_str()) {
                    voters.push(&voter.username);
                }
            }
        }
    }

    let rows = voters
        .iter()
        .map(|username| {
            section_names
                .iter()
                .map(|section| {
                    entries
                        .iter()
                        .filter(|e| e.section == *section)
                        .filter(|e| {
                            e.key
                                .is_some_and(|key| poll.voters_for(key).iter().any(|v| v.username == *username))
                        })
                        .last()
                        .map(|e| strip_tokens(e.text))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    DelimitedTable {
        headers: section_names.iter().map(|name| strip_tokens(name)).collect(),
        rows,
    }
}

fn flat_table(poll: &Poll) -> DelimitedTable {
    let rows = poll
        .options
        .iter()
        .flat_map(|(key, text)| {
            let option = strip_tokens(text);
            poll.voters_for(key)
                .iter()
                .map(move |voter| vec![option.clone(), voter.username.clone()])
        })
        .collect();

    DelimitedTable {
        headers: vec!["Option".to_string(), "Voter".to_string()],
        rows,
    }
}

/// `encuesta_<last 8 chars of the id>_<YYYY-MM-DD>.csv`
pub fn export_file_name(poll_id: &str, now: DateTime<Utc>) -> String {
    let tail_start = poll_id
        .char_indices()
        .rev()
        .nth(7)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    format!("encuesta_{}_{}.csv", &poll_id[tail_start..], now.format("%Y-%m-%d"))
}
