use crate::error::{PersistenceError, PollResult};
use crate::models::{PermissionKind, Permissions};
use log::{info, warn};
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Global allow-lists backed by a small JSON object on disk.
///
/// A missing file means the built-in defaults; nothing is written until an
/// administrator changes a list.
pub struct PermissionStore {
    path: PathBuf,
    current: RwLock<Permissions>,
}

impl PermissionStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let current = match super::read_json::<Permissions>(&path).await {
            Ok(Some(permissions)) => permissions,
            Ok(None) => Permissions::default(),
            Err(e) => {
                warn!("Failed to load permissions, using defaults: {}", e);
                let defaults = Permissions::default();
                super::write_json(&path, &defaults).await?;
                defaults
            }
        };

        Ok(Self {
            path,
            current: RwLock::new(current),
        })
    }

    pub async fn get(&self) -> Permissions {
        self.current.read().await.clone()
    }

    /// Replace one allow-list. Role names are trimmed and lower-cased; blanks are dropped.
    pub async fn set(&self, kind: PermissionKind, roles: Vec<String>) -> PollResult<Permissions> {
        let roles: Vec<String> = roles
            .iter()
            .map(|role| role.trim().to_lowercase())
            .filter(|role| !role.is_empty())
            .collect();

        let mut current = self.current.write().await;
        let mut updated = current.clone();
        updated.set_roles(kind, roles);
        super::write_json(&self.path, &updated).await?;
        *current = updated.clone();

        info!("Permissions for {:?} set to {:?}", kind, updated.roles(kind));
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn defaults_without_writing_a_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("permissions.json");

        let store = PermissionStore::open(&path).await.unwrap();
        let permissions = store.get().await;
        assert_eq!(permissions.create_poll, vec!["oficial", "admin"]);
        assert_eq!(permissions.vote, vec!["miembro", "raider", "trial", "oficial", "admin"]);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn set_normalizes_and_persists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data").join("permissions.json");
        let store = PermissionStore::open(&path).await.unwrap();

        store
            .set(PermissionKind::Vote, vec![" Raider ".into(), "".into(), "TRIAL".into()])
            .await
            .unwrap();

        let reopened = PermissionStore::open(&path).await.unwrap();
        let permissions = reopened.get().await;
        assert_eq!(permissions.vote, vec!["raider", "trial"]);
        assert_eq!(permissions.create_poll, vec!["oficial", "admin"]);

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["createPoll"][0], "oficial");
    }
}
