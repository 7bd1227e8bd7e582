use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use application::UserStore;
use async_trait::async_trait;
use domain::{RepositoryError, User, UserId};

/// 内存用户存储。积分调整在一次加锁内完成检查与写入，作为单次原子更新。
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users.into_iter().map(|user| (user.id, user)).collect();
        Self {
            users: Arc::new(Mutex::new(users)),
        }
    }

    fn lock_poisoned() -> RepositoryError {
        RepositoryError::storage("user store lock poisoned")
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().map_err(|_| Self::lock_poisoned())?;
        Ok(users.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().map_err(|_| Self::lock_poisoned())?;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_credits(&self, id: UserId, delta: i64) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().map_err(|_| Self::lock_poisoned())?;
        let user = users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        let balance = user.apply_credit_delta(delta)?;
        tracing::debug!(user_id = %id, delta, balance, "积分已调整");
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn concurrent_debits_never_overdraw() {
        let user = User::student(UserId::from(Uuid::new_v4()), "arjun").with_credits(5);
        let id = user.id;
        let store = InMemoryUserStore::with_users([user]);

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.update_credits(id, -1).await })
            })
            .collect();

        let mut succeeded = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(err) => assert!(matches!(err, RepositoryError::InsufficientFunds { .. })),
            }
        }
        assert_eq!(succeeded, 5);
        assert_eq!(store.find_by_id(id).await.unwrap().unwrap().credits, 0);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = InMemoryUserStore::new();
        let err = store
            .update_credits(UserId::from(Uuid::new_v4()), 1)
            .await
            .unwrap_err();
        assert_eq!(err, RepositoryError::NotFound);
    }
}
