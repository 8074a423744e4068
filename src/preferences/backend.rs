//! 偏好设置的持久化后端

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{PreferenceError, Preferences};

/// 持久化接口
pub trait PreferenceBackend: Send + Sync {
    /// 尚未保存过时返回 `Ok(None)`
    fn load(&self) -> Result<Option<Preferences>, PreferenceError>;

    fn save(&self, preferences: &Preferences) -> Result<(), PreferenceError>;
}

/// 内存后端，主要用于测试和无持久化的场景
#[derive(Debug, Default)]
pub struct MemoryBackend {
    stored: Mutex<Option<Preferences>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(preferences: Preferences) -> Self {
        Self {
            stored: Mutex::new(Some(preferences)),
        }
    }

    pub fn stored(&self) -> Option<Preferences> {
        self.stored.lock().ok().and_then(|stored| stored.clone())
    }
}

impl PreferenceBackend for MemoryBackend {
    fn load(&self) -> Result<Option<Preferences>, PreferenceError> {
        Ok(self.stored())
    }

    fn save(&self, preferences: &Preferences) -> Result<(), PreferenceError> {
        let mut stored = self
            .stored
            .lock()
            .map_err(|_| PreferenceError::Io("memory backend poisoned".to_string()))?;
        *stored = Some(preferences.clone());
        Ok(())
    }
}

/// JSON 文件后端
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let expanded = shellexpand::tilde(&path.as_ref().to_string_lossy()).into_owned();
        Self {
            path: PathBuf::from(expanded),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<Preferences>, PreferenceError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let preferences = serde_json::from_str(&content)?;
        tracing::debug!("从 {} 加载偏好设置", self.path.display());

        Ok(Some(preferences))
    }

    fn save(&self, preferences: &Preferences) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(preferences)?;
        fs::write(&self.path, content)?;

        Ok(())
    }
}
