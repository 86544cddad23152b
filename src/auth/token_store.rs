use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

/// Key the bearer token is stored under.
pub const TOKEN_KEY: &str = "auth-token";

const STORE_FILE: &str = "secure-store.json";

/// Small key/value secret store backed by a single owner-only file.
///
/// Reads go to memory; every write rewrites the file through a temporary
/// sibling and a rename so a crash never leaves a half-written token behind.
#[derive(Clone)]
pub struct TokenStore {
    inner: Arc<TokenStoreInner>,
}

struct TokenStoreInner {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl TokenStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read secure store {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Secure store {} is unreadable, starting empty: {err}", path.display());
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            inner: Arc::new(TokenStoreInner {
                path,
                entries: Mutex::new(entries),
            }),
        })
    }

    pub fn in_dir(data_dir: &Path) -> Result<Self> {
        Self::open(data_dir.join(STORE_FILE))
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    /// Memory only changes once the file write went through.
    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries();
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value.to_string());
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }

    pub fn delete_item(&self, key: &str) -> Result<()> {
        let mut entries = self.entries();
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut updated = entries.clone();
        updated.remove(key);
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.get_item(TOKEN_KEY).filter(|token| !token.is_empty())
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.set_item(TOKEN_KEY, token)
    }

    pub fn clear_token(&self) -> Result<()> {
        self.delete_item(TOKEN_KEY)
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let path = &self.inner.path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let staging = path.with_extension("json.tmp");
        let serialized = serde_json::to_vec_pretty(entries)?;
        fs::write(&staging, serialized)
            .with_context(|| format!("Failed to write {}", staging.display()))?;
        restrict_to_owner(&staging)?;
        fs::rename(&staging, path)
            .with_context(|| format!("Failed to replace secure store {}", path.display()))
    }
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path()).unwrap();
        assert!(store.token().is_none());

        store.set_token("abc123").unwrap();
        let reopened = TokenStore::in_dir(dir.path()).unwrap();
        assert_eq!(reopened.token().as_deref(), Some("abc123"));

        reopened.clear_token().unwrap();
        assert!(TokenStore::in_dir(dir.path()).unwrap().token().is_none());
    }

    #[test]
    fn empty_token_counts_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path()).unwrap();
        store.set_token("").unwrap();
        assert!(store.token().is_none());
    }

    #[test]
    fn clones_share_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path()).unwrap();
        let other = store.clone();
        store.set_item("k", "v").unwrap();
        assert_eq!(other.get_item("k").as_deref(), Some("v"));
    }

    #[test]
    fn failed_write_leaves_token_unset() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();

        let store = TokenStore::in_dir(&blocker).unwrap();
        assert!(store.set_token("tok-1").is_err());
        assert!(store.token().is_none());
    }

    #[test]
    fn failed_delete_keeps_token() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let store = TokenStore::in_dir(&data_dir).unwrap();
        store.set_token("tok-1").unwrap();

        fs::remove_dir_all(&data_dir).unwrap();
        fs::write(&data_dir, b"").unwrap();

        assert!(store.clear_token().is_err());
        assert_eq!(store.token().as_deref(), Some("tok-1"));
    }

    #[cfg(unix)]
    #[test]
    fn store_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::in_dir(dir.path()).unwrap();
        store.set_token("secret").unwrap();
        let mode = fs::metadata(dir.path().join(STORE_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
