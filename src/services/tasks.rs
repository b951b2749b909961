use chrono::Utc;
use log::{debug, error};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{CreateTaskInput, Task, TaskFilter, TaskStatus},
    store::{StoreError, TaskStore},
};

/// Task operations on behalf of one authenticated owner.
///
/// Every call takes the owner's id and every store call carries it, so a task
/// belonging to someone else is never read, changed, or removed. Such a task is
/// reported exactly like a missing one.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Task with ID \"{}\" not found", id))
}

fn storage(op: &str, e: StoreError) -> AppError {
    error!("task {} failed: {}", op, e);
    AppError::from(e)
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Owner's tasks, narrowed by status and then by a search term in title or description.
    pub async fn list(
        &self,
        filter: &TaskFilter,
        owner_id: Uuid,
    ) -> Result<Vec<Task>, AppError> {
        self.store
            .find_many(owner_id, filter)
            .await
            .map_err(|e| storage("list", e))
    }

    pub async fn get_by_id(&self, id: Uuid, owner_id: Uuid) -> Result<Task, AppError> {
        match self.store.find_one(id, owner_id).await {
            Ok(Some(task)) => Ok(task),
            Ok(None) => {
                debug!("task {} not visible to {}", id, owner_id);
                Err(not_found(id))
            }
            Err(e) => Err(storage("lookup", e)),
        }
    }

    /// Input must already have passed validation.
    pub async fn create(
        &self,
        input: CreateTaskInput,
        owner_id: Uuid,
    ) -> Result<Task, AppError> {
        self.store
            .insert(Task::new(input, owner_id))
            .await
            .map_err(|e| storage("create", e))
    }

    /// Sets any status from any status; no transition order is enforced.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: TaskStatus,
        owner_id: Uuid,
    ) -> Result<Task, AppError> {
        let mut task = self.get_by_id(id, owner_id).await?;
        task.status = status;
        task.updated_at = Utc::now();

        match self.store.update(task).await {
            Ok(Some(updated)) => Ok(updated),
            // Deleted between the read and the write.
            Ok(None) => Err(not_found(id)),
            Err(e) => Err(storage("update", e)),
        }
    }

    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<(), AppError> {
        let affected = self
            .store
            .delete(id, owner_id)
            .await
            .map_err(|e| storage("delete", e))?;

        if affected == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTaskStore;
    use pretty_assertions::assert_eq;

    fn service() -> (TaskService, Arc<MemoryTaskStore>) {
        let store = Arc::new(MemoryTaskStore::new());
        (TaskService::new(store.clone()), store)
    }

    fn input(title: &str, description: &str) -> CreateTaskInput {
        CreateTaskInput {
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_create_sets_open_and_owner() {
        let (tasks, _) = service();
        let alice = Uuid::new_v4();

        let task = tasks.create(input("buy milk", "2%"), alice).await.unwrap();
        assert_eq!(task.status, TaskStatus::Open);
        assert_eq!(task.owner_id, alice);
        assert_eq!(tasks.get_by_id(task.id, alice).await.unwrap(), task);
    }

    #[actix_rt::test]
    async fn test_foreign_task_is_not_found() {
        let (tasks, _) = service();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let task = tasks.create(input("alice only", "private"), alice).await.unwrap();

        let err = tasks.get_by_id(task.id, bob).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = tasks
            .update_status(task.id, TaskStatus::Done, bob)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(
            tasks.get_by_id(task.id, alice).await.unwrap().status,
            TaskStatus::Open
        );
    }

    #[actix_rt::test]
    async fn test_missing_and_foreign_look_identical() {
        let (tasks, _) = service();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let task = tasks.create(input("t", "d"), alice).await.unwrap();

        let foreign = tasks.get_by_id(task.id, bob).await.unwrap_err();
        let missing_id = Uuid::new_v4();
        let missing = tasks.get_by_id(missing_id, bob).await.unwrap_err();

        assert_eq!(
            foreign.to_string().replace(&task.id.to_string(), "<id>"),
            missing.to_string().replace(&missing_id.to_string(), "<id>")
        );
    }

    #[actix_rt::test]
    async fn test_update_status_allows_any_transition() {
        let (tasks, _) = service();
        let owner = Uuid::new_v4();
        let task = tasks.create(input("t", "d"), owner).await.unwrap();

        let done = tasks
            .update_status(task.id, TaskStatus::Done, owner)
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Done);

        let reopened = tasks
            .update_status(task.id, TaskStatus::Open, owner)
            .await
            .unwrap();
        assert_eq!(reopened.status, TaskStatus::Open);
        assert!(reopened.updated_at >= task.updated_at);
    }

    #[actix_rt::test]
    async fn test_delete_is_scoped_and_physical() {
        let (tasks, store) = service();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let task = tasks.create(input("t", "d"), alice).await.unwrap();

        let err = tasks.delete(task.id, bob).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.len(), 1);

        let err = tasks.delete(Uuid::new_v4(), alice).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.len(), 1);

        tasks.delete(task.id, alice).await.unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            tasks.get_by_id(task.id, alice).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            tasks.delete(task.id, alice).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[actix_rt::test]
    async fn test_list_filters() {
        let (tasks, _) = service();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let milk = tasks.create(input("buy milk", "2%"), alice).await.unwrap();
        let bread = tasks
            .create(input("bakery", "bread and milk rolls"), alice)
            .await
            .unwrap();
        tasks.create(input("buy milk", "bob's"), bob).await.unwrap();
        tasks
            .update_status(milk.id, TaskStatus::Done, alice)
            .await
            .unwrap();

        let all = tasks.list(&TaskFilter::default(), alice).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|t| t.owner_id == alice));

        let done = TaskFilter {
            status: Some(TaskStatus::Done),
            search: None,
        };
        let ids: Vec<Uuid> = tasks
            .list(&done, alice)
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![milk.id]);

        let milk_anywhere = TaskFilter {
            status: None,
            search: Some("milk".into()),
        };
        assert_eq!(tasks.list(&milk_anywhere, alice).await.unwrap().len(), 2);

        let open_milk = TaskFilter {
            status: Some(TaskStatus::Open),
            search: Some("milk".into()),
        };
        let ids: Vec<Uuid> = tasks
            .list(&open_milk, alice)
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![bread.id]);

        let nothing = TaskFilter {
            status: Some(TaskStatus::InProgress),
            search: None,
        };
        assert!(tasks.list(&nothing, alice).await.unwrap().is_empty());
    }
}
