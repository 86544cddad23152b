use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

pub const BASE_URL_ENV: &str = "PLANTCARE_BASE_URL";
pub const DATA_DIR_ENV: &str = "PLANTCARE_DATA_DIR";
pub const DEBUG_ENV: &str = "PLANTCARE_DEBUG";

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureSettings {
    /// Frames wider than this are downsampled before upload.
    pub max_width: u32,
    /// JPEG quality in `0.0..=1.0`.
    pub jpeg_quality: f32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            max_width: 800,
            jpeg_quality: 0.5,
        }
    }
}

impl CaptureSettings {
    /// Quality on the encoder's 1..=100 scale.
    pub fn encoder_quality(&self) -> u8 {
        let scaled = (self.jpeg_quality.clamp(0.0, 1.0) * 100.0).round() as u8;
        scaled.max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientSettings {
    pub base_url: Option<String>,
    /// `None` leaves the HTTP client's own default in place.
    pub request_timeout_secs: Option<u64>,
    pub capture: CaptureSettings,
    pub loading_message_interval_ms: u64,
    pub query_stale_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: None,
            capture: CaptureSettings::default(),
            loading_message_interval_ms: 1500,
            query_stale_secs: 5 * 60,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn loading_message_interval(&self) -> Duration {
        Duration::from_millis(self.loading_message_interval_ms.max(1))
    }

    pub fn query_stale_after(&self) -> Duration {
        Duration::from_secs(self.query_stale_secs)
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<ClientSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring unreadable settings at {}: {err}",
                    path.display()
                );
                ClientSettings::default()
            })
        } else {
            ClientSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn in_dir(data_dir: &Path) -> Result<Self> {
        Self::new(data_dir.join(SETTINGS_FILE))
    }

    pub fn get(&self) -> ClientSettings {
        self.read().clone()
    }

    pub fn update<F>(&self, change: F) -> Result<ClientSettings>
    where
        F: FnOnce(&mut ClientSettings),
    {
        let mut guard = self.write();
        change(&mut *guard);
        self.persist(&*guard)?;
        Ok(guard.clone())
    }

    /// Base URL of the backend: environment first, then the stored value.
    pub fn base_url(&self) -> Result<String> {
        resolve_base_url(std::env::var(BASE_URL_ENV).ok(), self.read().base_url.clone())
    }

    fn persist(&self, data: &ClientSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, ClientSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ClientSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn resolve_base_url(from_env: Option<String>, stored: Option<String>) -> Result<String> {
    from_env
        .into_iter()
        .chain(stored)
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .find(|url| !url.is_empty())
        .ok_or_else(|| {
            anyhow!("no backend configured; set {BASE_URL_ENV} or pass --base-url")
        })
}

/// Directory holding the token store, settings and captured photos.
pub fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join("plantcare"))
        .ok_or_else(|| anyhow!("could not determine a data directory; set {DATA_DIR_ENV}"))
}

pub fn debug_mode() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::in_dir(dir.path()).unwrap();
        let settings = store.get();
        assert_eq!(settings.capture.max_width, 800);
        assert_eq!(settings.capture.encoder_quality(), 50);
        assert!(settings.request_timeout().is_none());
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::in_dir(dir.path()).unwrap();
        store
            .update(|s| s.base_url = Some("https://plants.example".into()))
            .unwrap();

        let reloaded = SettingsStore::in_dir(dir.path()).unwrap();
        assert_eq!(
            reloaded.get().base_url.as_deref(),
            Some("https://plants.example")
        );
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "{not json").unwrap();
        let store = SettingsStore::in_dir(dir.path()).unwrap();
        assert_eq!(store.get(), ClientSettings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"capture": {"max_width": 640}}"#,
        )
        .unwrap();
        let settings = SettingsStore::in_dir(dir.path()).unwrap().get();
        assert_eq!(settings.capture.max_width, 640);
        assert_eq!(settings.capture.jpeg_quality, 0.5);
        assert_eq!(settings.query_stale_secs, 300);
    }

    #[test]
    fn base_url_prefers_environment_and_trims_slash() {
        let url = resolve_base_url(
            Some("https://env.example/".into()),
            Some("https://stored.example".into()),
        )
        .unwrap();
        assert_eq!(url, "https://env.example");

        let url = resolve_base_url(Some("  ".into()), Some("https://stored.example".into())).unwrap();
        assert_eq!(url, "https://stored.example");

        assert!(resolve_base_url(None, None).is_err());
    }

    #[test]
    fn quality_is_clamped() {
        let capture = CaptureSettings {
            max_width: 800,
            jpeg_quality: 3.0,
        };
        assert_eq!(capture.encoder_quality(), 100);
        let capture = CaptureSettings {
            max_width: 800,
            jpeg_quality: 0.0,
        };
        assert_eq!(capture.encoder_quality(), 1);
    }
}
