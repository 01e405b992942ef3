use crate::error::{PollError, PollResult};
use crate::models::{Permissions, Poll};

/// True iff any of `user_roles` is in `allowed`, ignoring case.
pub fn can_perform<U, A>(user_roles: &[U], allowed: &[A]) -> bool
where
    U: AsRef<str>,
    A: AsRef<str>,
{
    user_roles.iter().any(|role| {
        let role = role.as_ref().to_lowercase();
        allowed.iter().any(|permitted| permitted.as_ref().to_lowercase() == role)
    })
}

/// The poll's own role list when it has one, otherwise the global vote list.
pub fn voting_roles<'a>(poll: &'a Poll, global: &'a Permissions) -> &'a [String] {
    if poll.custom_voting_roles.is_empty() {
        &global.vote
    } else {
        &poll.custom_voting_roles
    }
}

pub fn authorize<U: AsRef<str>>(user_roles: &[U], allowed: &[String]) -> PollResult<()> {
    if can_perform(user_roles, allowed) {
        Ok(())
    } else {
        Err(PollError::Permission {
            allowed: allowed.to_vec(),
        })
    }
}

pub fn authorize_create<U: AsRef<str>>(user_roles: &[U], global: &Permissions) -> PollResult<()> {
    authorize(user_roles, &global.create_poll)
}

pub fn authorize_vote<U: AsRef<str>>(user_roles: &[U], poll: &Poll, global: &Permissions) -> PollResult<()> {
    authorize(user_roles, voting_roles(poll, global))
}
