//! 会话存储 - 基础设施层
//!
//! 唯一持有"跨重启保留"的本地状态：令牌、考试时长、剩余时间、品牌信息。
//! 每次写入都会立即落盘（先写临时文件再 rename），
//! 保证重启后读到的剩余时间不会比最后一次 tick 更旧。

use crate::error::StoreError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// 存储键
pub mod keys {
    pub const AUTH_TOKEN: &str = "authToken";
    pub const EXAM_DURATION: &str = "exam_duration";
    pub const REMAINING_TIME: &str = "remaining_time";
    pub const LOGO_URL: &str = "logoUrl";
    pub const APP_NAME: &str = "appName";
}

/// 会话过期时需要清除的键（品牌信息保留）
const SESSION_KEYS: [&str; 3] = [keys::AUTH_TOKEN, keys::EXAM_DURATION, keys::REMAINING_TIME];

/// 持久化键值存储
///
/// 进程内共享（`Arc<SessionStore>`），所有视图读写同一份状态。
#[derive(Debug)]
pub struct SessionStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl SessionStore {
    /// 纯内存存储（测试或一次性会话）
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// 打开文件存储；文件不存在时从空状态开始
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content =
                std::fs::read_to_string(&path).map_err(|source| StoreError::ReadFailed {
                    path: path.display().to_string(),
                    source,
                })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|source| StoreError::Corrupted {
                    path: path.display().to_string(),
                    source,
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!("会话存储已打开: {} ({} 个键)", path.display(), entries.len());

        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl ToString) -> Result<(), StoreError> {
        let mut entries = self.lock();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.remove_many(&[key])
    }

    /// 一次性删除多个键，只落盘一次
    pub fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut entries = self.lock();
        let mut changed = false;
        for key in keys {
            changed |= entries.remove(*key).is_some();
        }
        if changed {
            self.persist(&entries)?;
        }
        Ok(())
    }

    // ========== 类型化访问 ==========

    pub fn auth_token(&self) -> Option<String> {
        self.get(keys::AUTH_TOKEN).filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token().is_some()
    }

    pub fn set_auth_token(&self, token: &str) -> Result<(), StoreError> {
        self.set(keys::AUTH_TOKEN, token)
    }

    /// 登出：只清除令牌
    pub fn clear_auth_token(&self) -> Result<(), StoreError> {
        self.remove(keys::AUTH_TOKEN)
    }

    /// 会话过期：清除令牌和考试进度
    pub fn clear_session_state(&self) -> Result<(), StoreError> {
        self.remove_many(&SESSION_KEYS)
    }

    /// 考试时长（分钟）
    pub fn exam_duration(&self) -> Option<u64> {
        self.get_number(keys::EXAM_DURATION)
    }

    pub fn set_exam_duration(&self, minutes: u64) -> Result<(), StoreError> {
        self.set(keys::EXAM_DURATION, minutes)
    }

    /// 剩余秒数
    pub fn remaining_time(&self) -> Option<u64> {
        self.get_number(keys::REMAINING_TIME)
    }

    pub fn set_remaining_time(&self, seconds: u64) -> Result<(), StoreError> {
        self.set(keys::REMAINING_TIME, seconds)
    }

    pub fn clear_remaining_time(&self) -> Result<(), StoreError> {
        self.remove(keys::REMAINING_TIME)
    }

    pub fn logo_url(&self) -> Option<String> {
        self.get(keys::LOGO_URL)
    }

    pub fn app_name(&self) -> Option<String> {
        self.get(keys::APP_NAME)
    }

    fn get_number(&self, key: &str) -> Option<u64> {
        let raw = self.get(key)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("存储键 {} 的值无法解析为数字: {:?}", key, raw);
                None
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 在持有锁的情况下写盘：临时文件 + rename
    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let write_failed = |source| StoreError::WriteFailed {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_failed)?;
        }

        let content = serde_json::to_string_pretty(entries).map_err(|e| StoreError::WriteFailed {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content).map_err(write_failed)?;
        std::fs::rename(&tmp_path, path).map_err(write_failed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("exam_portal_store_{}", uuid::Uuid::new_v4()))
            .join("session.json")
    }

    #[test]
    fn test_values_survive_reopen() {
        let path = temp_store_path();

        let store = SessionStore::open(&path).unwrap();
        store.set_auth_token("token-123").unwrap();
        store.set_exam_duration(10).unwrap();
        store.set_remaining_time(45).unwrap();
        drop(store);

        let reopened = SessionStore::open(&path).unwrap();
        assert_eq!(reopened.auth_token().as_deref(), Some("token-123"));
        assert_eq!(reopened.exam_duration(), Some(10));
        assert_eq!(reopened.remaining_time(), Some(45));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_logout_clears_only_token() {
        let store = SessionStore::in_memory();
        store.set_auth_token("t").unwrap();
        store.set_remaining_time(30).unwrap();
        store.set(keys::LOGO_URL, "http://x/logo.png").unwrap();

        store.clear_auth_token().unwrap();

        assert!(!store.is_authenticated());
        assert_eq!(store.remaining_time(), Some(30));
        assert!(store.logo_url().is_some());
    }

    #[test]
    fn test_session_expiry_keeps_branding() {
        let store = SessionStore::in_memory();
        store.set_auth_token("t").unwrap();
        store.set_exam_duration(10).unwrap();
        store.set_remaining_time(30).unwrap();
        store.set(keys::APP_NAME, "Genesis").unwrap();

        store.clear_session_state().unwrap();

        assert_eq!(store.auth_token(), None);
        assert_eq!(store.exam_duration(), None);
        assert_eq!(store.remaining_time(), None);
        assert_eq!(store.app_name().as_deref(), Some("Genesis"));
    }

    #[test]
    fn test_garbage_numbers_read_as_missing() {
        let store = SessionStore::in_memory();
        store.set(keys::REMAINING_TIME, "NaN").unwrap();
        assert_eq!(store.remaining_time(), None);
    }

    #[test]
    fn test_empty_token_is_unauthenticated() {
        let store = SessionStore::in_memory();
        store.set_auth_token("").unwrap();
        assert!(!store.is_authenticated());
    }
}
