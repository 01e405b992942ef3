mod ordered;

pub use ordered::OrderedMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard cap on options across all sections of a poll.
pub const MAX_OPTIONS: usize = 50;
/// Options a single select menu can carry.
pub const MAX_SELECT_OPTIONS: usize = 25;

/// Identity snapshot of a user, taken when they created a poll or voted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
}

pub type Voter = UserSnapshot;

impl UserSnapshot {
    pub fn new(id: impl Into<String>, username: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            display_name,
        }
    }

    /// Display name, falling back to the username.
    pub fn shown_name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.username,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Section name -> option texts, in display order.
    #[serde(default)]
    pub sections: OrderedMap<Vec<String>>,
    pub author: UserSnapshot,
    /// Option key (`option<N>`) -> option text.
    pub options: OrderedMap<String>,
    /// Option key -> voters in the order they voted.
    #[serde(default)]
    pub votes: OrderedMap<Vec<Voter>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_limit_days: Option<u32>,
    pub channel_id: String,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub custom_voting_roles: Vec<String>,
}

/// One option as seen from its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionOption<'a> {
    pub section: &'a str,
    pub text: &'a str,
    /// `None` when the option fell past the option cap and never got a key.
    pub key: Option<&'a str>,
}

impl Poll {
    pub fn option_key(index: usize) -> String {
        format!("option{}", index)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    pub fn total_votes(&self) -> usize {
        self.votes.values().map(Vec::len).sum()
    }

    pub fn voters_for(&self, option_key: &str) -> &[Voter] {
        self.votes.get(option_key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Walks every section option in display order, pairing each with the key
    /// it was assigned at creation. Keys are positional over the flattened
    /// section order. Records keyed in another order fall back to the first
    /// unused key with the same text; options past the cap yield `None`.
    pub fn section_options(&self) -> Vec<SectionOption<'_>> {
        let mut out = Vec::new();
        let mut used: Vec<&str> = Vec::new();
        let mut index = 0;
        for (section, texts) in self.sections.iter() {
            for text in texts {
                let positional = Self::option_key(index);
                index += 1;
                let key = self
                    .options
                    .iter()
                    .find(|(k, v)| *k == positional.as_str() && *v == text && !used.contains(k))
                    .or_else(|| {
                        self.options
                            .iter()
                            .find(|(k, v)| *v == text && !used.contains(k))
                    })
                    .map(|(k, _)| k);
                if let Some(key) = key {
                    used.push(key);
                }
                out.push(SectionOption { section, text, key });
            }
        }
        out
    }

    /// Restores the votes/options invariant on records read from disk:
    /// every option gets a voter list and orphaned vote keys are dropped.
    /// Returns the orphaned keys.
    pub fn normalize_votes(&mut self) -> Vec<String> {
        let mut orphaned = Vec::new();
        let options = &self.options;
        self.votes.retain(|key, _| {
            let known = options.contains_key(key);
            if !known {
                orphaned.push(key.to_string());
            }
            known
        });
        for key in self.options.keys() {
            self.votes.entry_or_default(key);
        }
        orphaned
    }
}

/// Global role allow-lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub create_poll: Vec<String>,
    pub vote: Vec<String>,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            create_poll: vec!["oficial".into(), "admin".into()],
            vote: vec![
                "miembro".into(),
                "raider".into(),
                "trial".into(),
                "oficial".into(),
                "admin".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    Create,
    Vote,
}

impl Permissions {
    pub fn roles(&self, kind: PermissionKind) -> &[String] {
        match kind {
            PermissionKind::Create => &self.create_poll,
            PermissionKind::Vote => &self.vote,
        }
    }

    pub fn set_roles(&mut self, kind: PermissionKind, roles: Vec<String>) {
        match kind {
            PermissionKind::Create => self.create_poll = roles,
            PermissionKind::Vote => self.vote = roles,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn user(id: &str, username: &str) -> UserSnapshot {
        UserSnapshot::new(id, username, None)
    }

    /// A poll with the given sections (options comma-separated); keys assigned
    /// positionally like the parser does.
    pub fn poll_with_sections(sections: &[(&str, &str)]) -> Poll {
        let mut section_map = OrderedMap::new();
        let mut options = OrderedMap::new();
        let mut votes = OrderedMap::new();
        let mut index = 0;
        for (name, texts) in sections {
            let texts: Vec<String> = texts.split(',').map(str::to_string).collect();
            section_map.insert(*name, texts.clone());
            for text in texts {
                options.insert(Poll::option_key(index), text);
                votes.insert(Poll::option_key(index), Vec::new());
                index += 1;
            }
        }
        Poll {
            id: "poll_1_1700000000000".into(),
            question: "Roles?".into(),
            description: None,
            sections: section_map,
            author: user("1", "author"),
            options,
            votes,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
            expires_at: None,
            time_limit_days: None,
            channel_id: "42".into(),
            message_id: None,
            custom_voting_roles: Vec::new(),
        }
    }
}
