//! In-memory backends. Each instance owns its own maps; there is no shared global state.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, StoreError, TaskStore};
use crate::models::{NewUser, Task, TaskFilter, User};

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".into())
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|users| users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert(&self, user: NewUser) -> Result<Uuid, StoreError> {
        // Check and insert under one write guard, like a unique index would.
        let mut users = self.users.write().map_err(poisoned)?;
        if users.contains_key(&user.username) {
            return Err(StoreError::UniqueViolation("users_username_key".into()));
        }
        let id = user.id;
        users.insert(user.username.clone(), user.into());
        Ok(id)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(username).cloned())
    }
}

#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.read().map(|tasks| tasks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert(&self, task: Task) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        if tasks.contains_key(&task.id) {
            return Err(StoreError::UniqueViolation("tasks_pkey".into()));
        }
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_many(
        &self,
        owner_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        let mut found: Vec<Task> = tasks
            .values()
            .filter(|task| task.owner_id == owner_id && filter.matches(task))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn find_one(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Task>, StoreError> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        Ok(tasks
            .get(&id)
            .filter(|task| task.owner_id == owner_id)
            .cloned())
    }

    async fn update(&self, task: Task) -> Result<Option<Task>, StoreError> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        match tasks.get_mut(&task.id) {
            Some(existing) if existing.owner_id == task.owner_id => {
                *existing = task.clone();
                Ok(Some(task))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<u64, StoreError> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        let owned = tasks
            .get(&id)
            .map(|task| task.owner_id == owner_id)
            .unwrap_or(false);
        if owned {
            tasks.remove(&id);
            Ok(1)
        } else {
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateTaskInput, TaskStatus};

    fn task_for(owner_id: Uuid, title: &str) -> Task {
        Task::new(
            CreateTaskInput {
                title: title.to_string(),
                description: "desc".to_string(),
            },
            owner_id,
        )
    }

    #[actix_rt::test]
    async fn test_duplicate_username_is_rejected() {
        let store = MemoryCredentialStore::new();
        store
            .insert(NewUser::new("alice", "h1".into(), "s1".into()))
            .await
            .unwrap();

        let err = store
            .insert(NewUser::new("alice", "h2".into(), "s2".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
        assert_eq!(store.len(), 1);

        let stored = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "h1");
    }

    #[actix_rt::test]
    async fn test_usernames_are_case_sensitive() {
        let store = MemoryCredentialStore::new();
        store
            .insert(NewUser::new("alice", "h".into(), "s".into()))
            .await
            .unwrap();
        store
            .insert(NewUser::new("Alice", "h".into(), "s".into()))
            .await
            .unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.find_by_username("ALICE").await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_task_rows_are_owner_scoped() {
        let store = MemoryTaskStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let task = store.insert(task_for(alice, "alice's")).await.unwrap();

        assert!(store.find_one(task.id, alice).await.unwrap().is_some());
        assert!(store.find_one(task.id, bob).await.unwrap().is_none());
        assert!(store
            .find_many(bob, &TaskFilter::default())
            .await
            .unwrap()
            .is_empty());

        let mut hijacked = task.clone();
        hijacked.owner_id = bob;
        hijacked.status = TaskStatus::Done;
        assert!(store.update(hijacked).await.unwrap().is_none());

        assert_eq!(store.delete(task.id, bob).await.unwrap(), 0);
        assert_eq!(store.len(), 1);
        assert_eq!(store.delete(task.id, alice).await.unwrap(), 1);
        assert!(store.is_empty());
    }

    #[actix_rt::test]
    async fn test_find_many_is_newest_first() {
        let store = MemoryTaskStore::new();
        let owner = Uuid::new_v4();
        let mut first = task_for(owner, "first");
        first.created_at = first.created_at - chrono::Duration::seconds(10);
        store.insert(first).await.unwrap();
        store.insert(task_for(owner, "second")).await.unwrap();

        let titles: Vec<String> = store
            .find_many(owner, &TaskFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
    }
}
