//! In-memory state of an open board and the drag-and-drop controller.
//!
//! Reorders are applied to local state first and persisted afterwards. A
//! failed reorder is logged and reported through [`BoardController::banner`]
//! but not rolled back; a failed delete is.

use tracing::{error, info, warn};

use crate::drag::{compute_drop_target, Bounds, DragOrigin, DragState, DropTarget};
use crate::error::{user_message, ClientError};
use crate::models::{List, Task};
use crate::store::{persist_order, TaskStore};

/// A list together with its tasks in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardList {
    pub list: List,
    pub tasks: Vec<Task>,
}

impl BoardList {
    pub fn task_ids(&self) -> Vec<i64> {
        self.tasks.iter().map(|t| t.id).collect()
    }

    /// Makes every task's position and list reference match the local order.
    fn renumber(&mut self) -> ListOrder {
        for (index, task) in self.tasks.iter_mut().enumerate() {
            task.position = index as i64;
            task.list_id = self.list.id;
        }
        ListOrder {
            list_id: self.list.id,
            task_ids: self.task_ids(),
        }
    }
}

/// The new task order of one list after a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOrder {
    pub list_id: i64,
    pub task_ids: Vec<i64>,
}

/// Moves the task at `source_index` of one list to `target_index` of another
/// (or the same) list.
///
/// For a same-list move the target index refers to the sequence before the
/// removal, so targets after the source shift down by one. Targets past the
/// end append. Returns the changed lists, source first, or `None` when a list
/// or the source task does not exist.
pub fn move_task(
    lists: &mut [BoardList],
    source_list_id: i64,
    source_index: usize,
    target_list_id: i64,
    target_index: usize,
) -> Option<Vec<ListOrder>> {
    let source_pos = lists.iter().position(|l| l.list.id == source_list_id)?;
    let target_pos = lists.iter().position(|l| l.list.id == target_list_id)?;
    if source_index >= lists[source_pos].tasks.len() {
        return None;
    }

    let task = lists[source_pos].tasks.remove(source_index);

    if source_pos == target_pos {
        let tasks = &mut lists[source_pos].tasks;
        let adjusted = if target_index > source_index {
            target_index - 1
        } else {
            target_index
        };
        tasks.insert(adjusted.min(tasks.len()), task);

        return Some(vec![lists[source_pos].renumber()]);
    }

    let tasks = &mut lists[target_pos].tasks;
    tasks.insert(target_index.min(tasks.len()), task);

    Some(vec![
        lists[source_pos].renumber(),
        lists[target_pos].renumber(),
    ])
}

/// Owns the open board's state and the backend it talks to.
pub struct BoardController<S> {
    store: S,
    board_id: i64,
    lists: Vec<BoardList>,
    drag: DragState,
    banner: Option<String>,
}

impl<S: TaskStore> BoardController<S> {
    pub fn new(store: S, board_id: i64) -> Self {
        BoardController {
            store,
            board_id,
            lists: Vec::new(),
            drag: DragState::Idle,
            banner: None,
        }
    }

    pub fn board_id(&self) -> i64 {
        self.board_id
    }

    pub fn lists(&self) -> &[BoardList] {
        &self.lists
    }

    pub fn list(&self, list_id: i64) -> Option<&BoardList> {
        self.lists.iter().find(|l| l.list.id == list_id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    /// The last user-facing error, if any.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    /// Fetches the board's lists and each list's tasks, replacing local state.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        match self.fetch_board().await {
            Ok(lists) => {
                info!(board_id = self.board_id, lists = lists.len(), "Loaded board");
                self.lists = lists;
                Ok(())
            }
            Err(err) => {
                error!(board_id = self.board_id, error = %err, "Error loading board data");
                self.banner = Some(user_message(&err));
                Err(err)
            }
        }
    }

    async fn fetch_board(&self) -> Result<Vec<BoardList>, ClientError> {
        let lists = self.store.fetch_lists(self.board_id).await?;
        let mut loaded = Vec::with_capacity(lists.len());
        for list in lists {
            let tasks = self.store.fetch_tasks(list.id).await?;
            loaded.push(BoardList { list, tasks });
        }
        Ok(loaded)
    }

    pub fn begin_drag(&mut self, task_id: i64, source_list_id: i64, source_index: usize) {
        self.drag.begin(DragOrigin {
            task_id,
            list_id: source_list_id,
            index: source_index,
        });
    }

    /// Pointer moved over a list while dragging: recompute and remember the
    /// drop target for that list.
    pub fn drag_over(
        &mut self,
        list_id: i64,
        pointer_y: f64,
        list_bounds: Bounds,
        task_bounds: &[Bounds],
    ) -> Option<DropTarget> {
        if !self.drag.is_dragging() {
            return None;
        }
        let target = compute_drop_target(pointer_y, list_bounds, task_bounds);
        self.drag.hover(list_id, target);
        target
    }

    pub fn drag_leave(&mut self, list_id: i64) {
        self.drag.leave(list_id);
    }

    pub fn cancel_drag(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Drops the dragged task onto `list_id` at the last target computed for
    /// that list. An empty list accepts the drop at index 0; anything else
    /// without a target is ignored.
    pub async fn drop_on(&mut self, list_id: i64) -> Result<(), ClientError> {
        let Some((origin, hover)) = self.drag.finish() else {
            return Ok(());
        };
        let target = hover.filter(|h| h.list_id == list_id).and_then(|h| h.target);

        let index = match target {
            Some(target) => target.insertion_index(),
            None if self.list(list_id).is_some_and(|l| l.tasks.is_empty()) => 0,
            None => return Ok(()),
        };

        // The list may have changed since the drag started.
        let dragged = self
            .list(origin.list_id)
            .and_then(|l| l.tasks.get(origin.index))
            .map(|t| t.id);
        if dragged != Some(origin.task_id) {
            warn!(task_id = origin.task_id, list_id = origin.list_id, "Ignoring drop of a stale drag");
            return Ok(());
        }

        self.commit_drop(origin.list_id, origin.index, list_id, index)
            .await
    }

    /// Applies the move locally, then persists the order of every list it
    /// changed. Every list is attempted even if an earlier one fails; the
    /// first error is reported but the local move stands.
    pub async fn commit_drop(
        &mut self,
        source_list_id: i64,
        source_index: usize,
        target_list_id: i64,
        target_index: usize,
    ) -> Result<(), ClientError> {
        let Some(orders) = move_task(
            &mut self.lists,
            source_list_id,
            source_index,
            target_list_id,
            target_index,
        ) else {
            warn!(source_list_id, source_index, target_list_id, "Ignoring drop without a valid origin");
            return Ok(());
        };

        let mut first_error = None;
        for order in &orders {
            if let Err(err) = persist_order(&self.store, &order.task_ids, order.list_id).await {
                error!(list_id = order.list_id, error = %err, "Error updating task positions");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => {
                self.banner = Some(user_message(&err));
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Creates a task through the backend and appends it to its list.
    pub async fn create_task(
        &mut self,
        list_id: i64,
        title: &str,
        description: &str,
    ) -> Result<Task, ClientError> {
        let task = match self.store.create_task(list_id, title, description).await {
            Ok(task) => task,
            Err(err) => {
                error!(list_id, error = %err, "Failed to create task");
                self.banner = Some(user_message(&err));
                return Err(err);
            }
        };

        if let Some(list) = self.lists.iter_mut().find(|l| l.list.id == list_id) {
            list.tasks.push(task.clone());
        }
        Ok(task)
    }

    /// Removes the task locally, then deletes it in the backend. On failure
    /// the list's previous order is restored.
    pub async fn delete_task(&mut self, task_id: i64) -> Result<(), ClientError> {
        let Some(list_pos) = self
            .lists
            .iter()
            .position(|l| l.tasks.iter().any(|t| t.id == task_id))
        else {
            return Ok(());
        };

        let snapshot = self.lists[list_pos].tasks.clone();
        self.lists[list_pos].tasks.retain(|t| t.id != task_id);

        if let Err(err) = self.store.delete_task(task_id).await {
            error!(task_id, error = %err, "Failed to delete task");
            self.lists[list_pos].tasks = snapshot;
            self.banner = Some(user_message(&err));
            return Err(err);
        }
        Ok(())
    }
}
