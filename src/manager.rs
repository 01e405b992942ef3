use crate::db::{PermissionStore, PollStore};
use crate::error::{PersistenceError, PollError, PollResult, ValidationError};
use crate::models::{PermissionKind, Permissions, Poll, UserSnapshot, Voter};
use crate::voting::export::{DelimitedTable, export_table};
use crate::voting::ledger::{self, VoteOutcome};
use crate::voting::{parser, permissions};
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use std::path::Path;

pub const POLLS_FILE: &str = "polls.json";
pub const PERMISSIONS_FILE: &str = "permissions.json";

// Largest age `chrono::Duration` can hold, in hours.
const MAX_AGE_HOURS: i64 = i64::MAX / 3_600_000;

/// Raw form input for a new poll.
#[derive(Debug, Clone)]
pub struct NewPoll {
    pub sections_text: String,
    pub question: String,
    pub description: Option<String>,
    pub duration_days: Option<String>,
    pub voting_roles: Option<String>,
    pub author: UserSnapshot,
    pub channel_id: String,
}

/// Poll lifecycle operations over the two stores.
pub struct PollManager {
    polls: PollStore,
    permissions: PermissionStore,
}

impl PollManager {
    pub fn new(polls: PollStore, permissions: PermissionStore) -> Self {
        Self { polls, permissions }
    }

    /// Open both stores under `data_dir`.
    pub async fn open(data_dir: &Path) -> Result<Self, PersistenceError> {
        let polls = PollStore::open(data_dir.join(POLLS_FILE)).await?;
        let permissions = PermissionStore::open(data_dir.join(PERMISSIONS_FILE)).await?;
        Ok(Self::new(polls, permissions))
    }

    pub fn polls(&self) -> &PollStore {
        &self.polls
    }

    pub async fn create_poll(&self, request: NewPoll) -> PollResult<Poll> {
        let poll = build_poll(request, Utc::now())?;
        let poll = self.polls.save_poll(poll).await?;
        info!(
            "Poll created: {} with {} options by {}",
            poll.id,
            poll.options.len(),
            poll.author.username
        );
        Ok(poll)
    }

    /// Record a vote. An unknown `option_key` still clears the voter's earlier choice.
    pub async fn cast_vote(&self, poll_id: &str, option_key: &str, voter: Voter) -> PollResult<Poll> {
        let username = voter.username.clone();
        let now = Utc::now();
        let (poll, outcome) = self
            .polls
            .update(poll_id, |poll| ledger::cast_vote(poll, option_key, voter, now))
            .await?;

        match outcome {
            VoteOutcome::Recorded => info!("Vote recorded: {} voted {} on poll {}", username, option_key, poll_id),
            VoteOutcome::Cleared => warn!(
                "Vote for unknown option {} on poll {} cleared {}'s previous choice",
                option_key, poll_id, username
            ),
        }
        Ok(poll)
    }

    pub async fn get_poll(&self, poll_id: &str) -> Option<Poll> {
        self.polls.load_poll(poll_id).await
    }

    pub async fn export_poll(&self, poll_id: &str) -> PollResult<DelimitedTable> {
        let poll = self
            .polls
            .load_poll(poll_id)
            .await
            .ok_or_else(|| PollError::NotFound(poll_id.to_string()))?;
        Ok(export_table(&poll))
    }

    pub async fn set_message_id(&self, poll_id: &str, message_id: &str) -> PollResult<Poll> {
        let (poll, ()) = self
            .polls
            .update(poll_id, |poll| {
                poll.message_id = Some(message_id.to_string());
                Ok(())
            })
            .await?;
        Ok(poll)
    }

    pub async fn set_permissions(&self, kind: PermissionKind, roles: Vec<String>) -> PollResult<Permissions> {
        self.permissions.set(kind, roles).await
    }

    pub async fn get_permissions(&self) -> Permissions {
        self.permissions.get().await
    }

    pub async fn authorize_create<R: AsRef<str>>(&self, user_roles: &[R]) -> PollResult<()> {
        let global = self.permissions.get().await;
        permissions::authorize_create(user_roles, &global)
    }

    pub async fn authorize_vote<R: AsRef<str>>(&self, poll: &Poll, user_roles: &[R]) -> PollResult<()> {
        let global = self.permissions.get().await;
        permissions::authorize_vote(user_roles, poll, &global)
    }

    /// Remove polls created more than `max_age_hours` ago, regardless of expiry.
    pub async fn cleanup(&self, max_age_hours: u64) -> PollResult<usize> {
        let hours = i64::try_from(max_age_hours).unwrap_or(i64::MAX).min(MAX_AGE_HOURS);
        let max_age = Duration::hours(hours);
        let cutoff = Utc::now()
            .checked_sub_signed(max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let removed = self.polls.remove_created_before(cutoff).await?;
        if removed > 0 {
            info!("Cleaned up {} old polls", removed);
        }
        Ok(removed)
    }
}

/// Turn form input into a poll record. Nothing is stored.
pub fn build_poll(request: NewPoll, now: DateTime<Utc>) -> PollResult<Poll> {
    let question = request.question.trim().to_string();
    if question.is_empty() {
        return Err(ValidationError::EmptyQuestion.into());
    }

    let parsed = parser::parse_sections(&request.sections_text)?;
    let days = parser::parse_duration_days(request.duration_days.as_deref())?;
    let custom_voting_roles = request
        .voting_roles
        .as_deref()
        .map(parser::parse_role_list)
        .unwrap_or_default();
    let description = request
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let votes = parsed.options.keys().map(|key| (key, Vec::new())).collect();

    Ok(Poll {
        id: format!("poll_{}_{}", request.author.id, now.timestamp_millis()),
        question,
        description,
        sections: parsed.sections,
        author: request.author,
        options: parsed.options,
        votes,
        created_at: now,
        expires_at: Some(now + Duration::days(i64::from(days))),
        time_limit_days: Some(days),
        channel_id: request.channel_id,
        message_id: None,
        custom_voting_roles,
    })
}
