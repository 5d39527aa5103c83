//! Task model consumed by the productivity-intelligence core.
//!
//! Tasks are owned by the host application; this crate only reads them for
//! pattern analysis and duration prediction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    /// Needs attention now; schedulers shave the estimate to get it moving.
    Urgent = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

/// Core task type.
///
/// Note: we keep this small + serializable. Storage lives behind the repository
/// traits in the service layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,

    /// Owning user; `assignee_id` covers delegated work.
    pub user_id: String,
    pub assignee_id: Option<String>,

    pub title: String,
    pub description: Option<String>,

    /// Free-form category label ("coding", "writing", ...).
    pub category: Option<String>,

    pub status: TaskStatus,
    pub priority: Priority,

    /// Minutes.
    pub estimated_minutes: Option<i32>,

    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            assignee_id: None,
            title: title.into(),
            description: None,
            category: None,
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            estimated_minutes: None,
            created_at,
            completed_at: None,
            due_date: None,
        }
    }

    pub fn with_assignee(mut self, assignee_id: impl Into<String>) -> Self {
        self.assignee_id = Some(assignee_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_estimated_minutes(mut self, minutes: i32) -> Self {
        self.estimated_minutes = Some(minutes);
        self
    }

    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(at);
        self
    }

    /// Todo or InProgress; completed and cancelled tasks drop out of every count.
    pub fn is_open(&self) -> bool {
        matches!(self.status, TaskStatus::Todo | TaskStatus::InProgress)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => self.is_open() && due < now,
            None => false,
        }
    }

    /// Belongs to `user_id` either as owner or assignee.
    pub fn involves(&self, user_id: &str) -> bool {
        self.user_id == user_id || self.assignee_id.as_deref() == Some(user_id)
    }
}
