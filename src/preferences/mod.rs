//! 偏好设置
//!
//! 进程内唯一的 `{ 源语言, 目标语言, 开关 }`。写入后同步通知所有监听者，
//! 每个监听者都收到完整的新值。

pub mod backend;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use backend::{JsonFileBackend, MemoryBackend, PreferenceBackend};

/// 偏好设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    #[serde(rename = "sourceLang")]
    pub source_lang: String,
    #[serde(rename = "targetLang")]
    pub target_lang: String,
    #[serde(rename = "isEnabled")]
    pub enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            source_lang: "auto".to_string(),
            target_lang: "ja".to_string(),
            enabled: true,
        }
    }
}

/// 部分更新，未设置的字段保持原值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferencesUpdate {
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub enabled: Option<bool>,
}

impl PreferencesUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_lang(mut self, lang: impl Into<String>) -> Self {
        self.source_lang = Some(lang.into());
        self
    }

    pub fn target_lang(mut self, lang: impl Into<String>) -> Self {
        self.target_lang = Some(lang.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    fn apply(self, preferences: &mut Preferences) {
        if let Some(lang) = self.source_lang {
            preferences.source_lang = lang;
        }
        if let Some(lang) = self.target_lang {
            preferences.target_lang = lang;
        }
        if let Some(enabled) = self.enabled {
            preferences.enabled = enabled;
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreferenceError {
    #[error("偏好设置读写失败: {0}")]
    Io(String),

    #[error("偏好设置格式错误: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for PreferenceError {
    fn from(error: std::io::Error) -> Self {
        PreferenceError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for PreferenceError {
    fn from(error: serde_json::Error) -> Self {
        PreferenceError::Serialization(error.to_string())
    }
}

/// 监听者句柄，用于取消订阅
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&Preferences) + Send + Sync>;

/// 待分发的通知；同一时刻只有一个线程负责分发
#[derive(Default)]
struct Dispatch {
    pending: VecDeque<Preferences>,
    draining: bool,
}

/// 偏好设置存储
///
/// 写入在 `commit` 锁内完成应用、持久化和入队，通知按提交顺序分发。
/// 调用监听者时不持有任何锁，监听者可以再次调用 `set`、`on_change`
/// 或 `remove_listener`。
pub struct PreferenceStore {
    current: RwLock<Preferences>,
    commit: Mutex<()>,
    dispatch: Mutex<Dispatch>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
    backend: Box<dyn PreferenceBackend>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 监听者 panic 时释放分发权，后续通知仍能送达
struct DrainGuard<'a>(&'a Mutex<Dispatch>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            lock(self.0).draining = false;
        }
    }
}

impl PreferenceStore {
    /// 以给定值初始化，不做持久化
    pub fn new(initial: Preferences) -> Self {
        Self::with_backend(initial, Box::new(MemoryBackend::new()))
    }

    fn with_backend(initial: Preferences, backend: Box<dyn PreferenceBackend>) -> Self {
        Self {
            current: RwLock::new(initial),
            commit: Mutex::new(()),
            dispatch: Mutex::new(Dispatch::default()),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
            backend,
        }
    }

    /// 从后端加载；后端为空时写入默认值
    pub fn load(backend: Box<dyn PreferenceBackend>) -> Result<Self, PreferenceError> {
        let preferences = match backend.load()? {
            Some(stored) => stored,
            None => {
                let defaults = Preferences::default();
                backend.save(&defaults)?;
                tracing::info!("偏好设置已初始化为默认值");
                defaults
            }
        };

        Ok(Self::with_backend(preferences, backend))
    }

    pub fn get(&self) -> Preferences {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 写入、持久化并通知监听者，返回新值
    ///
    /// 另一个线程正在分发通知时，本次通知由它按顺序送达，`set` 直接返回。
    pub fn set(&self, update: PreferencesUpdate) -> Preferences {
        let updated = {
            let _commit = lock(&self.commit);

            let updated = {
                let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
                update.apply(&mut current);
                current.clone()
            };

            if let Err(e) = self.backend.save(&updated) {
                tracing::warn!("偏好设置持久化失败: {}", e);
            }

            lock(&self.dispatch).pending.push_back(updated.clone());
            updated
        };

        tracing::debug!(
            source_lang = %updated.source_lang,
            target_lang = %updated.target_lang,
            enabled = updated.enabled,
            "偏好设置已更新"
        );

        self.drain();
        updated
    }

    fn drain(&self) {
        {
            let mut dispatch = lock(&self.dispatch);
            if dispatch.draining {
                return;
            }
            dispatch.draining = true;
        }

        let _guard = DrainGuard(&self.dispatch);
        loop {
            let next = {
                let mut dispatch = lock(&self.dispatch);
                match dispatch.pending.pop_front() {
                    Some(next) => next,
                    None => {
                        dispatch.draining = false;
                        return;
                    }
                }
            };

            let listeners: Vec<Listener> = lock(&self.listeners)
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect();

            for listener in listeners {
                listener(&next);
            }
        }
    }

    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Preferences) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((id, Arc::new(listener)));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new(Preferences::default())
    }
}
