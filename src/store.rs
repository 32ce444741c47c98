//! The slice of the data API the board controller depends on.

use std::future::Future;

use tracing::debug;

use crate::error::ClientError;
use crate::models::{List, Task};

/// Backend operations used by [`crate::board::BoardController`].
///
/// [`crate::client::RestClient`] implements this over HTTP; tests use
/// in-memory recorders.
pub trait TaskStore {
    /// Lists of a board, ordered by position.
    fn fetch_lists(&self, board_id: i64) -> impl Future<Output = Result<Vec<List>, ClientError>> + Send;

    /// Tasks of a list, ordered by position.
    fn fetch_tasks(&self, list_id: i64) -> impl Future<Output = Result<Vec<Task>, ClientError>> + Send;

    fn update_task_position(
        &self,
        task_id: i64,
        position: i64,
        list_id: i64,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn delete_task(&self, task_id: i64) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Appends a task to the list; the creator is the authenticated user.
    fn create_task(
        &self,
        list_id: i64,
        title: &str,
        description: &str,
    ) -> impl Future<Output = Result<Task, ClientError>> + Send;
}

/// Rewrites the stored position of every task in `task_ids` to its index and
/// its list reference to `list_id`.
///
/// Updates go out one at a time in index order. The first failure is returned
/// as is; updates already applied stay applied.
pub async fn persist_order<S: TaskStore>(
    store: &S,
    task_ids: &[i64],
    list_id: i64,
) -> Result<(), ClientError> {
    for (position, &task_id) in task_ids.iter().enumerate() {
        store
            .update_task_position(task_id, position as i64, list_id)
            .await?;
    }
    debug!(list_id, count = task_ids.len(), "Persisted task order");
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        FetchLists(i64),
        FetchTasks(i64),
        UpdatePosition(i64, i64, i64),
        Delete(i64),
        Create(i64, String),
    }

    /// Records every call and can be told to fail position updates or deletes.
    #[derive(Default)]
    pub struct RecordingStore {
        pub calls: Mutex<Vec<Call>>,
        pub lists: Vec<List>,
        pub tasks: Vec<Task>,
        /// Position updates for this task id fail.
        pub fail_update_for: Option<i64>,
        pub fail_delete: bool,
        pub fail_fetch: bool,
    }

    impl RecordingStore {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn position_updates(&self) -> Vec<(i64, i64, i64)> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::UpdatePosition(t, p, l) => Some((t, p, l)),
                    _ => None,
                })
                .collect()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    pub fn backend_error() -> ClientError {
        ClientError::Api {
            status: 500,
            message: "backend unavailable".to_string(),
        }
    }

    pub fn task(id: i64, list_id: i64, position: i64) -> Task {
        Task {
            id,
            list_id,
            title: format!("task {id}"),
            description: String::new(),
            position,
            completed: false,
            created_by: 1,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn list(id: i64, board_id: i64, position: i64) -> List {
        List {
            id,
            title: format!("list {id}"),
            color: "#f59e0b".to_string(),
            board_id,
            position,
            created_at: 0,
        }
    }

    impl TaskStore for RecordingStore {
        async fn fetch_lists(&self, board_id: i64) -> Result<Vec<List>, ClientError> {
            self.record(Call::FetchLists(board_id));
            if self.fail_fetch {
                return Err(backend_error());
            }
            Ok(self
                .lists
                .iter()
                .filter(|l| l.board_id == board_id)
                .cloned()
                .collect())
        }

        async fn fetch_tasks(&self, list_id: i64) -> Result<Vec<Task>, ClientError> {
            self.record(Call::FetchTasks(list_id));
            let mut tasks: Vec<Task> = self
                .tasks
                .iter()
                .filter(|t| t.list_id == list_id)
                .cloned()
                .collect();
            tasks.sort_by_key(|t| t.position);
            Ok(tasks)
        }

        async fn update_task_position(
            &self,
            task_id: i64,
            position: i64,
            list_id: i64,
        ) -> Result<(), ClientError> {
            self.record(Call::UpdatePosition(task_id, position, list_id));
            if self.fail_update_for == Some(task_id) {
                return Err(backend_error());
            }
            Ok(())
        }

        async fn delete_task(&self, task_id: i64) -> Result<(), ClientError> {
            self.record(Call::Delete(task_id));
            if self.fail_delete {
                return Err(backend_error());
            }
            Ok(())
        }

        async fn create_task(
            &self,
            list_id: i64,
            title: &str,
            description: &str,
        ) -> Result<Task, ClientError> {
            self.record(Call::Create(list_id, title.to_string()));
            Ok(Task {
                title: title.to_string(),
                description: description.to_string(),
                ..task(100, list_id, 0)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingStore};
    use super::*;

    #[tokio::test]
    async fn persist_order_updates_each_task_in_sequence() {
        let store = RecordingStore::default();
        persist_order(&store, &[11, 12, 13], 7).await.unwrap();

        assert_eq!(
            store.calls(),
            vec![
                Call::UpdatePosition(11, 0, 7),
                Call::UpdatePosition(12, 1, 7),
                Call::UpdatePosition(13, 2, 7),
            ]
        );
    }

    #[tokio::test]
    async fn persist_order_stops_at_first_failure() {
        let store = RecordingStore {
            fail_update_for: Some(12),
            ..Default::default()
        };
        let err = persist_order(&store, &[11, 12, 13], 7).await.unwrap_err();

        assert_eq!(err.to_string(), "backend unavailable");
        // 11 stays updated, 13 is never attempted.
        assert_eq!(store.position_updates(), vec![(11, 0, 7), (12, 1, 7)]);
    }

    #[tokio::test]
    async fn persist_order_of_empty_list_is_a_no_op() {
        let store = RecordingStore::default();
        persist_order(&store, &[], 7).await.unwrap();
        assert!(store.calls().is_empty());
    }
}
