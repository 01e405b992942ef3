pub mod export;
pub mod ledger;
pub mod parser;
pub mod permissions;
pub mod results;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    // `:name:` custom emoji shorthand as typed by users.
    static ref EMOJI_TOKEN: Regex = Regex::new(r":([a-zA-Z0-9_]+):").unwrap();
}

/// Display-ready results for one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSummary {
    pub expired: bool,
    /// Whole days left, rounded up. `None` when expired or open-ended.
    pub days_remaining: Option<i64>,
    pub groups: Vec<ResultGroup>,
    pub total_participants: usize,
}

/// One block of results: a section, or a single option for section-less polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultGroup {
    pub name: String,
    pub count: usize,
    pub lines: Vec<String>,
}

impl ResultGroup {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Platform lookup for shorthand tokens such as custom emoji names.
pub trait DisplayTokenResolver {
    /// The rendered form of `token` (without the surrounding colons), if known.
    fn resolve_display_token(&self, token: &str) -> Option<String>;
}

/// Replace each `:name:` with its resolved form; unknown tokens stay as typed.
pub fn resolve_tokens(text: &str, resolver: &dyn DisplayTokenResolver) -> String {
    EMOJI_TOKEN
        .replace_all(text, |caps: &Captures| {
            resolver
                .resolve_display_token(&caps[1])
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Drop `:name:` tokens and surrounding whitespace, for plain-text targets.
pub fn strip_tokens(text: &str) -> String {
    EMOJI_TOKEN.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::DisplayTokenResolver;
    use std::collections::HashMap;

    /// Leaves every token as typed.
    pub struct Unresolved;

    impl DisplayTokenResolver for Unresolved {
        fn resolve_display_token(&self, _token: &str) -> Option<String> {
            None
        }
    }

    pub struct EmojiTable(pub HashMap<&'static str, &'static str>);

    impl DisplayTokenResolver for EmojiTable {
        fn resolve_display_token(&self, token: &str) -> Option<String> {
            self.0.get(token).map(|s| s.to_string())
        }
    }
}
