//! Pure document mutations.
//!
//! Every helper takes the current document by reference and returns a new
//! value reflecting exactly one logical change plus timestamp/order
//! bookkeeping. No I/O, no shared state; persistence is the caller's job.

use chrono::Utc;
use uuid::Uuid;

use lockboard_core::{BoardDocument, Project, Task, TaskPriority, TaskStatus};

/// Fields for a task to be created.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
}

/// Partial update for an existing task. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

/// Append a new task.
///
/// The display rank is the count of tasks already in the target status —
/// count-based, not gap-filling, so ranks freed by deletion are never
/// reassigned.
pub fn add_task(doc: &BoardDocument, new: NewTask) -> BoardDocument {
    let now = Utc::now();
    let order = doc.tasks.iter().filter(|t| t.status == new.status).count() as u32;

    let mut next = doc.clone();
    next.tasks.push(Task {
        id: Uuid::new_v4().to_string(),
        project_id: new.project_id,
        title: new.title,
        description: new.description,
        status: new.status,
        priority: new.priority,
        order,
        created_at: now,
        updated_at: now,
    });
    next
}

/// Merge a partial update into a task and refresh its `updated_at`.
/// Unknown task ids leave the document unchanged.
pub fn update_task(doc: &BoardDocument, task_id: &str, patch: TaskPatch) -> BoardDocument {
    let mut next = doc.clone();
    if let Some(task) = next.tasks.iter_mut().find(|t| t.id == task_id) {
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        task.updated_at = Utc::now();
    }
    next
}

/// Move a task to another column.
pub fn move_task(doc: &BoardDocument, task_id: &str, status: TaskStatus) -> BoardDocument {
    update_task(
        doc,
        task_id,
        TaskPatch {
            status: Some(status),
            ..TaskPatch::default()
        },
    )
}

/// Remove a task. Ranks of the remaining tasks are not renumbered.
pub fn remove_task(doc: &BoardDocument, task_id: &str) -> BoardDocument {
    let mut next = doc.clone();
    next.tasks.retain(|t| t.id != task_id);
    next
}

/// Append a new project.
pub fn add_project(doc: &BoardDocument, name: String, description: Option<String>) -> BoardDocument {
    let mut next = doc.clone();
    next.projects.push(Project {
        id: Uuid::new_v4().to_string(),
        name,
        description,
        created_at: Utc::now(),
    });
    next
}

/// Remove a project and cascade-remove every task referencing it.
pub fn remove_project(doc: &BoardDocument, project_id: &str) -> BoardDocument {
    let mut next = doc.clone();
    next.projects.retain(|p| p.id != project_id);
    next.tasks.retain(|t| t.project_id != project_id);
    next
}
