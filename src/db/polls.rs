use crate::error::{PersistenceError, PollError, PollResult};
use crate::models::Poll;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// All polls, kept in memory and mirrored to a single JSON array on disk.
///
/// Every mutation rewrites the whole file while the lock is held, so a
/// load-mutate-persist sequence is atomic with respect to other tasks in
/// this process. A failed write leaves the in-memory set untouched.
///
/// Records that do not parse as a poll are skipped on load but written back
/// verbatim, so an older record format is never lost.
pub struct PollStore {
    path: PathBuf,
    polls: Mutex<HashMap<String, Poll>>,
    unparsed: Vec<Value>,
}

impl PollStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let mut unparsed = Vec::new();
        let polls = match super::read_json::<Vec<Value>>(&path).await {
            Ok(Some(records)) => {
                let mut polls = HashMap::with_capacity(records.len());
                for record in records {
                    let mut poll = match serde_json::from_value::<Poll>(record.clone()) {
                        Ok(poll) => poll,
                        Err(e) => {
                            let id = record.get("id").and_then(Value::as_str).unwrap_or("<no id>");
                            warn!("Skipping unreadable poll record {}: {}", id, e);
                            unparsed.push(record);
                            continue;
                        }
                    };
                    let orphaned = poll.normalize_votes();
                    if !orphaned.is_empty() {
                        warn!("Dropped votes for unknown options {:?} in poll {}", orphaned, poll.id);
                    }
                    polls.insert(poll.id.clone(), poll);
                }
                polls
            }
            Ok(None) => {
                info!("No poll file at {}, starting empty", path.display());
                let empty = HashMap::new();
                write_all(&path, &empty, &unparsed).await?;
                empty
            }
            Err(e) => {
                error!("Failed to load polls, starting empty: {}", e);
                let empty = HashMap::new();
                write_all(&path, &empty, &unparsed).await?;
                empty
            }
        };

        info!("Poll store ready with {} polls", polls.len());
        if !unparsed.is_empty() {
            warn!("{} unreadable poll record(s) kept as-is in {}", unparsed.len(), path.display());
        }
        Ok(Self {
            path,
            polls: Mutex::new(polls),
            unparsed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.polls.lock().await.len()
    }

    /// Insert or replace a poll and persist the whole set.
    pub async fn save_poll(&self, poll: Poll) -> PollResult<Poll> {
        let mut polls = self.polls.lock().await;
        let previous = polls.insert(poll.id.clone(), poll.clone());
        if let Err(e) = self.persist(&polls).await {
            match previous {
                Some(previous) => polls.insert(poll.id.clone(), previous),
                None => polls.remove(&poll.id),
            };
            return Err(e.into());
        }
        Ok(poll)
    }

    pub async fn load_poll(&self, poll_id: &str) -> Option<Poll> {
        self.polls.lock().await.get(poll_id).cloned()
    }

    /// Apply `mutate` to a copy of the poll, persist, then commit the copy.
    /// If `mutate` fails or the write fails, the stored poll is unchanged.
    pub async fn update<T>(
        &self,
        poll_id: &str,
        mutate: impl FnOnce(&mut Poll) -> PollResult<T>,
    ) -> PollResult<(Poll, T)> {
        let mut polls = self.polls.lock().await;
        let current = polls
            .get(poll_id)
            .ok_or_else(|| PollError::NotFound(poll_id.to_string()))?;

        let mut updated = current.clone();
        let outcome = mutate(&mut updated)?;

        let previous = polls.insert(poll_id.to_string(), updated.clone());
        if let Err(e) = self.persist(&polls).await {
            if let Some(previous) = previous {
                polls.insert(poll_id.to_string(), previous);
            }
            return Err(e.into());
        }
        Ok((updated, outcome))
    }

    pub async fn delete_poll(&self, poll_id: &str) -> PollResult<bool> {
        let mut polls = self.polls.lock().await;
        let Some(removed) = polls.remove(poll_id) else {
            return Ok(false);
        };
        if let Err(e) = self.persist(&polls).await {
            polls.insert(poll_id.to_string(), removed);
            return Err(e.into());
        }
        Ok(true)
    }

    pub async fn polls_by_author(&self, author_id: &str) -> Vec<Poll> {
        self.filtered(|poll| poll.author.id == author_id).await
    }

    pub async fn polls_by_channel(&self, channel_id: &str) -> Vec<Poll> {
        self.filtered(|poll| poll.channel_id == channel_id).await
    }

    pub async fn all_polls(&self) -> Vec<Poll> {
        self.filtered(|_| true).await
    }

    /// Remove every poll created at or before `cutoff`. Nothing is written when
    /// nothing matched.
    pub async fn remove_created_before(&self, cutoff: DateTime<Utc>) -> PollResult<usize> {
        let mut polls = self.polls.lock().await;
        let stale: Vec<String> = polls
            .values()
            .filter(|poll| poll.created_at <= cutoff)
            .map(|poll| poll.id.clone())
            .collect();
        if stale.is_empty() {
            return Ok(0);
        }

        let removed: Vec<Poll> = stale.iter().filter_map(|id| polls.remove(id)).collect();
        if let Err(e) = self.persist(&polls).await {
            for poll in removed {
                polls.insert(poll.id.clone(), poll);
            }
            return Err(e.into());
        }
        Ok(removed.len())
    }

    async fn persist(&self, polls: &HashMap<String, Poll>) -> Result<(), PersistenceError> {
        write_all(&self.path, polls, &self.unparsed).await
    }

    async fn filtered(&self, keep: impl Fn(&Poll) -> bool) -> Vec<Poll> {
        let polls = self.polls.lock().await;
        let mut out: Vec<Poll> = polls.values().filter(|poll| keep(poll)).cloned().collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Record<'a> {
    Poll(&'a Poll),
    Raw(&'a Value),
}

// Polls are written oldest first so the file reads in creation order;
// unreadable records follow unchanged.
async fn write_all(path: &Path, polls: &HashMap<String, Poll>, unparsed: &[Value]) -> Result<(), PersistenceError> {
    let mut list: Vec<&Poll> = polls.values().collect();
    list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    let records: Vec<Record<'_>> = list
        .into_iter()
        .map(Record::Poll)
        .chain(unparsed.iter().map(Record::Raw))
        .collect();
    super::write_json(path, &records).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{poll_with_sections, user};
    use chrono::Duration;
    use tempfile::TempDir;

    fn poll(id: &str, created_at: DateTime<Utc>) -> Poll {
        let mut poll = poll_with_sections(&[("A", "x,y")]);
        poll.id = id.to_string();
        poll.created_at = created_at;
        poll
    }

    #[tokio::test]
    async fn missing_file_is_created_as_empty_array() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data").join("polls.json");

        let store = PollStore::open(&path).await.unwrap();
        assert_eq!(store.len().await, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "[]");
    }

    #[tokio::test]
    async fn saved_poll_loads_back_equal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("polls.json");
        let store = PollStore::open(&path).await.unwrap();

        let mut original = poll_with_sections(&[("A", "x,y"), ("B", "z")]);
        original.description = Some("desc".into());
        original.expires_at = Some(original.created_at + Duration::days(2));
        original.votes.get_mut("option1").unwrap().push(user("7", "bob"));
        store.save_poll(original.clone()).await.unwrap();

        assert_eq!(store.load_poll(&original.id).await, Some(original.clone()));

        let reopened = PollStore::open(&path).await.unwrap();
        assert_eq!(reopened.load_poll(&original.id).await, Some(original));
    }

    #[tokio::test]
    async fn corrupt_file_falls_back_to_empty_and_is_rewritten() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("polls.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = PollStore::open(&path).await.unwrap();
        assert_eq!(store.len().await, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "[]");
    }

    #[tokio::test]
    async fn failed_mutation_leaves_poll_untouched() {
        let temp = TempDir::new().unwrap();
        let store = PollStore::open(temp.path().join("polls.json")).await.unwrap();
        let original = poll("p1", Utc::now());
        store.save_poll(original.clone()).await.unwrap();

        let result = store
            .update("p1", |poll| -> PollResult<()> {
                poll.question = "changed".into();
                Err(PollError::Expired(poll.id.clone()))
            })
            .await;
        assert!(matches!(result, Err(PollError::Expired(_))));
        assert_eq!(store.load_poll("p1").await, Some(original));
    }

    #[tokio::test]
    async fn update_of_unknown_poll_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = PollStore::open(temp.path().join("polls.json")).await.unwrap();
        let result = store.update("nope", |_| Ok(())).await;
        assert!(matches!(result, Err(PollError::NotFound(id)) if id == "nope"));
    }

    #[tokio::test]
    async fn remove_created_before_respects_cutoff() {
        let temp = TempDir::new().unwrap();
        let store = PollStore::open(temp.path().join("polls.json")).await.unwrap();
        let now = Utc::now();
        store.save_poll(poll("old", now - Duration::days(10))).await.unwrap();
        store.save_poll(poll("new", now - Duration::hours(1))).await.unwrap();

        assert_eq!(store.remove_created_before(now - Duration::days(30)).await.unwrap(), 0);
        assert_eq!(store.remove_created_before(now - Duration::days(7)).await.unwrap(), 1);
        assert!(store.load_poll("old").await.is_none());
        assert!(store.load_poll("new").await.is_some());
    }

    #[tokio::test]
    async fn queries_filter_by_author_and_channel() {
        let temp = TempDir::new().unwrap();
        let store = PollStore::open(temp.path().join("polls.json")).await.unwrap();
        let now = Utc::now();
        let mut first = poll("p1", now - Duration::minutes(2));
        first.channel_id = "c1".into();
        let mut second = poll("p2", now - Duration::minutes(1));
        second.author = user("99", "other");
        second.channel_id = "c2".into();
        store.save_poll(first).await.unwrap();
        store.save_poll(second).await.unwrap();

        let ids = |polls: Vec<Poll>| polls.into_iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(ids(store.polls_by_author("1").await), vec!["p1"]);
        assert_eq!(ids(store.polls_by_channel("c2").await), vec!["p2"]);
        assert_eq!(ids(store.all_polls().await), vec!["p1", "p2"]);

        assert!(store.delete_poll("p1").await.unwrap());
        assert!(!store.delete_poll("p1").await.unwrap());
        assert_eq!(ids(store.all_polls().await), vec!["p2"]);
    }

    #[tokio::test]
    async fn unreadable_record_is_skipped_and_kept_on_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("polls.json");
        let valid = poll("p1", Utc::now());
        let legacy = serde_json::json!({
            "id": "poll_legacy",
            "question": "¿Vienes?",
            "votes": { "si": [], "no": [], "tal_vez": [] }
        });
        let document = serde_json::json!([serde_json::to_value(&valid).unwrap(), legacy.clone()]);
        std::fs::write(&path, serde_json::to_string(&document).unwrap()).unwrap();

        let store = PollStore::open(&path).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.load_poll("p1").await, Some(valid));

        store.save_poll(poll("p2", Utc::now())).await.unwrap();
        let on_disk: Vec<Value> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 3);
        assert_eq!(on_disk.last(), Some(&legacy));
    }

    // A directory where the temp file should go makes every write fail.
    fn block_writes(path: &Path) {
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();
    }

    #[tokio::test]
    async fn failed_write_keeps_memory_as_before() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("polls.json");
        let store = PollStore::open(&path).await.unwrap();
        let now = Utc::now();
        let original = poll("p1", now - Duration::days(10));
        store.save_poll(original.clone()).await.unwrap();
        block_writes(&path);

        let saved = store.save_poll(poll("p2", now)).await;
        assert!(matches!(saved, Err(PollError::Persistence(_))));
        assert!(store.load_poll("p2").await.is_none());

        let mut replacement = original.clone();
        replacement.question = "replaced".into();
        let replaced = store.save_poll(replacement).await;
        assert!(matches!(replaced, Err(PollError::Persistence(_))));

        let updated = store
            .update("p1", |poll| -> PollResult<()> {
                poll.votes.get_mut("option0").unwrap().push(user("7", "bob"));
                Ok(())
            })
            .await;
        assert!(matches!(updated, Err(PollError::Persistence(_))));

        let removed = store.remove_created_before(now).await;
        assert!(matches!(removed, Err(PollError::Persistence(_))));

        let deleted = store.delete_poll("p1").await;
        assert!(matches!(deleted, Err(PollError::Persistence(_))));

        assert_eq!(store.len().await, 1);
        assert_eq!(store.load_poll("p1").await, Some(original));
    }
}
