//! 上次公共发言时间的本地存储
//!
//! 冷却状态只保存在客户端：内存版本用于测试与单进程运行，
//! 文件版本把时间戳写入一个 JSON 文件，重启后冷却依然生效。

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use application::SendStampStore;
use async_trait::async_trait;
use domain::{RepositoryError, Timestamp, UserId};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemorySendStampStore {
    stamps: Arc<RwLock<HashMap<UserId, Timestamp>>>,
}

impl InMemorySendStampStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SendStampStore for InMemorySendStampStore {
    async fn last_public_send(&self, user_id: UserId) -> Result<Option<Timestamp>, RepositoryError> {
        let stamps = self
            .stamps
            .read()
            .map_err(|_| RepositoryError::storage("send stamp lock poisoned"))?;
        Ok(stamps.get(&user_id).copied())
    }

    async fn record_public_send(
        &self,
        user_id: UserId,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut stamps = self
            .stamps
            .write()
            .map_err(|_| RepositoryError::storage("send stamp lock poisoned"))?;
        stamps.insert(user_id, at);
        Ok(())
    }
}

type StampFile = BTreeMap<Uuid, Timestamp>;

/// JSON 文件存储，写入时先写临时文件再重命名
pub struct JsonFileSendStampStore {
    path: PathBuf,
    // 串行化读-改-写
    guard: Mutex<()>,
}

impl JsonFileSendStampStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<StampFile, RepositoryError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(StampFile::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
                RepositoryError::storage(format!("corrupt stamp file {}: {err}", self.path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(StampFile::new()),
            Err(err) => Err(RepositoryError::storage(err.to_string())),
        }
    }

    async fn persist(&self, stamps: &StampFile) -> Result<(), RepositoryError> {
        let bytes = serde_json::to_vec_pretty(stamps)
            .map_err(|err| RepositoryError::storage(err.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| RepositoryError::storage(err.to_string()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|err| RepositoryError::storage(err.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|err| RepositoryError::storage(err.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SendStampStore for JsonFileSendStampStore {
    async fn last_public_send(&self, user_id: UserId) -> Result<Option<Timestamp>, RepositoryError> {
        let _guard = self.guard.lock().await;
        let stamps = self.load().await?;
        Ok(stamps.get(&Uuid::from(user_id)).copied())
    }

    async fn record_public_send(
        &self,
        user_id: UserId,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let _guard = self.guard.lock().await;
        let mut stamps = self.load().await?;
        stamps.insert(Uuid::from(user_id), at);
        self.persist(&stamps).await?;
        tracing::trace!(user_id = %user_id, path = %self.path.display(), "发送时间已写入");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("edu-chat-stamps-{}", Uuid::new_v4()))
            .join("stamps.json")
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let path = scratch_path();
        let user = UserId::from(Uuid::new_v4());
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();

        let store = JsonFileSendStampStore::new(&path);
        assert_eq!(store.last_public_send(user).await.unwrap(), None);
        store.record_public_send(user, at).await.unwrap();

        let reopened = JsonFileSendStampStore::new(&path);
        assert_eq!(reopened.last_public_send(user).await.unwrap(), Some(at));

        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let path = scratch_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"not json").await.unwrap();

        let store = JsonFileSendStampStore::new(&path);
        let err = store
            .last_public_send(UserId::from(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Storage { .. }));

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn memory_store_overwrites_stamp() {
        let store = InMemorySendStampStore::new();
        let user = UserId::from(Uuid::new_v4());
        let first = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 5, 1, 9, 1, 0).unwrap();
        store.record_public_send(user, first).await.unwrap();
        store.record_public_send(user, second).await.unwrap();
        assert_eq!(store.last_public_send(user).await.unwrap(), Some(second));
    }
}
