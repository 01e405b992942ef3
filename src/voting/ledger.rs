use crate::error::{PollError, PollResult};
use crate::models::{Poll, Voter};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The voter now appears under the chosen option only.
    Recorded,
    /// The key was unknown: any earlier vote was removed and nothing was recorded.
    Cleared,
}

/// Record `voter`'s single choice in `poll`.
///
/// The voter is first removed from every option, then appended to
/// `option_key`. An unknown key still removes the earlier vote; callers that
/// want to keep it must check the key against `poll.options` first.
/// Expired polls are rejected before anything is touched.
pub fn cast_vote(poll: &mut Poll, option_key: &str, voter: Voter, now: DateTime<Utc>) -> PollResult<VoteOutcome> {
    if poll.is_expired(now) {
        return Err(PollError::Expired(poll.id.clone()));
    }

    for voters in poll.votes.values_mut() {
        voters.retain(|existing| existing.id != voter.id);
    }

    if !poll.options.contains_key(option_key) {
        return Ok(VoteOutcome::Cleared);
    }
    poll.votes.entry_or_default(option_key).push(voter);
    Ok(VoteOutcome::Recorded)
}
