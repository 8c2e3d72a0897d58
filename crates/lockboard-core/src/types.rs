//! Board document model.
//!
//! Wire format is JSON with camelCase field names. There is no schema
//! version field; new fields must be optional and defaulted on read so old
//! documents keep parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kanban column a task lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Backlog,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    /// Board columns in display order.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Backlog,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    /// Human-readable column label.
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Backlog => "Backlog",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Review => "Review",
            TaskStatus::Done => "Done",
        }
    }

    /// Wire name (`backlog`, `in-progress`, `review`, `done`).
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(TaskStatus::Backlog),
            "in-progress" => Ok(TaskStatus::InProgress),
            "review" => Ok(TaskStatus::Review),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!(
                "unknown status {other:?} (expected backlog, in-progress, review, or done)"
            )),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl std::str::FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(format!(
                "unknown priority {other:?} (expected low, medium, or high)"
            )),
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        };
        f.write_str(s)
    }
}

/// A project grouping tasks on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Client-generated UUID.
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A single card on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Client-generated UUID.
    pub id: String,
    /// References `Project::id`. Soft invariant: not enforced on load, only
    /// via cascade delete when a project is removed.
    pub project_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Per-status display rank. Assigned as the count of tasks already in
    /// the target status; never renumbered on deletion, so gaps are normal.
    pub order: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The entire board state. This is the plaintext that gets serialized,
/// encrypted, and stored as one remote file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardDocument {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl BoardDocument {
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks in a given column, sorted by display rank.
    pub fn tasks_in(&self, status: TaskStatus) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.iter().filter(|t| t.status == status).collect();
        tasks.sort_by_key(|t| t.order);
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"backlog\"").unwrap(),
            TaskStatus::Backlog
        );
        assert_eq!("done".parse::<TaskStatus>().unwrap(), TaskStatus::Done);
        assert!("urgent".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn document_json_shape_matches_wire_schema() {
        let json = r#"{
            "projects": [
                {"id": "p1", "name": "Web", "createdAt": "2024-01-01T00:00:00.000Z"}
            ],
            "tasks": [
                {
                    "id": "t1",
                    "projectId": "p1",
                    "title": "Buy milk",
                    "description": "",
                    "status": "backlog",
                    "priority": "low",
                    "order": 0,
                    "createdAt": "2024-01-01T00:00:00.000Z",
                    "updatedAt": "2024-01-01T00:00:00.000Z"
                }
            ]
        }"#;
        let doc: BoardDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.projects.len(), 1);
        assert_eq!(doc.tasks[0].project_id, "p1");
        assert_eq!(doc.tasks[0].status, TaskStatus::Backlog);
        assert_eq!(doc.tasks[0].priority, TaskPriority::Low);

        let out = serde_json::to_value(&doc).unwrap();
        assert!(out["tasks"][0].get("projectId").is_some());
        assert!(out["tasks"][0].get("project_id").is_none());
    }

    #[test]
    fn empty_document_parses_with_defaults() {
        let doc: BoardDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.projects.is_empty());
        assert!(doc.tasks.is_empty());
    }

    #[test]
    fn tasks_in_sorts_by_order() {
        let mut doc = BoardDocument::default();
        for (id, order) in [("a", 2u32), ("b", 0), ("c", 1)] {
            doc.tasks.push(Task {
                id: id.into(),
                project_id: "p".into(),
                title: id.into(),
                description: None,
                status: TaskStatus::Backlog,
                priority: TaskPriority::Medium,
                order,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
        }
        let ids: Vec<&str> = doc
            .tasks_in(TaskStatus::Backlog)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }
}
