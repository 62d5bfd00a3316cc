//! To-do list use-cases.

use crate::derive::progress::completion_rate;
use crate::model::todo::{Todo, TodoDraft, TodoPatch};
use crate::service::facade::{EntityFacade, FilterCriteria};
use crate::service::{require_text, ServiceError, ServiceResult};
use crate::store::backend::DocumentBackend;
use crate::store::client::DocumentStore;
use chrono::NaiveDate;
use log::info;

/// Counts shown above the to-do list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoSummary {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Pending items whose due date is before the reference day.
    pub overdue: usize,
    pub completion_rate: u32,
}

pub struct TodoService<'s, B: DocumentBackend> {
    todos: EntityFacade<'s, B, Todo>,
}

impl<'s, B: DocumentBackend> TodoService<'s, B> {
    pub fn new(store: &'s DocumentStore<B>, owner: impl Into<String>) -> Self {
        Self {
            todos: EntityFacade::new(store, owner),
        }
    }

    pub fn add(&self, draft: &TodoDraft) -> ServiceResult<Todo> {
        require_text("todo title", &draft.title)?;
        Ok(self.todos.create(draft)?)
    }

    /// Flips the completed flag.
    pub fn toggle(&self, id: &str) -> ServiceResult<Todo> {
        let todo = self
            .todos
            .get(id)?
            .ok_or_else(|| ServiceError::not_found("todo", id))?;
        let updated = self.todos.update(id, &TodoPatch::completed(!todo.completed))?;
        if updated.completed == todo.completed {
            return Err(ServiceError::InconsistentState(
                "toggled todo read-back kept its old state",
            ));
        }
        Ok(updated)
    }

    pub fn pending(&self) -> ServiceResult<Vec<Todo>> {
        Ok(self
            .todos
            .filter(&FilterCriteria::new().eq("completed", false))?)
    }

    pub fn completed(&self) -> ServiceResult<Vec<Todo>> {
        Ok(self
            .todos
            .filter(&FilterCriteria::new().eq("completed", true))?)
    }

    /// Deletes every completed item and returns how many were removed.
    pub fn clear_completed(&self) -> ServiceResult<usize> {
        let done = self.completed()?;
        for todo in &done {
            self.todos.delete(&todo.id)?;
        }
        info!(
            "event=todo_clear module=service status=ok owner={} removed={}",
            self.todos.owner(),
            done.len()
        );
        Ok(done.len())
    }

    pub fn summary(&self, today: NaiveDate) -> ServiceResult<TodoSummary> {
        let todos = self.todos.list()?;
        let completed = todos.iter().filter(|todo| todo.completed).count();
        let overdue = todos
            .iter()
            .filter(|todo| !todo.completed && todo.due_date.is_some_and(|due| due < today))
            .count();
        Ok(TodoSummary {
            total: todos.len(),
            completed,
            pending: todos.len() - completed,
            overdue,
            completion_rate: completion_rate(completed, todos.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::TodoService;
    use crate::model::todo::TodoDraft;
    use crate::service::ServiceError;
    use crate::store::client::DocumentStore;
    use crate::store::memory::MemoryDocumentBackend;
    use chrono::NaiveDate;

    #[test]
    fn blank_title_is_rejected_before_writing() {
        let store = DocumentStore::new(MemoryDocumentBackend::new());
        let todos = TodoService::new(&store, "u1");
        let err = todos.add(&TodoDraft::new("   ")).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(store.backend().is_empty());
    }

    #[test]
    fn toggling_unknown_todo_is_not_found() {
        let store = DocumentStore::new(MemoryDocumentBackend::new());
        let err = TodoService::new(&store, "u1").toggle("nope").unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[test]
    fn summary_counts_overdue_pending_items() {
        let store = DocumentStore::new(MemoryDocumentBackend::new());
        let todos = TodoService::new(&store, "u1");
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

        let mut late = TodoDraft::new("Pay rent");
        late.due_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        todos.add(&late).unwrap();
        let done = todos.add(&TodoDraft::new("Call mom")).unwrap();
        todos.toggle(&done.id).unwrap();
        todos.add(&TodoDraft::new("Stretch")).unwrap();

        let summary = todos.summary(today).unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.overdue, 1);
        assert_eq!(summary.completion_rate, 33);

        assert_eq!(todos.clear_completed().unwrap(), 1);
        assert_eq!(todos.summary(today).unwrap().total, 2);
    }
}
