//! Storage ports consumed by the service, plus an in-memory store for
//! tests and hosts that do not persist anything.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use cadence_core::profile::ProductivityProfile;
use cadence_core::session::WorkSession;
use cadence_core::task::{Priority, Task, TaskStatus};
use chrono::{DateTime, Utc};

use crate::error::Result;

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<ProductivityProfile>>;
    /// Returns the stored profile, creating a fresh one at `now` if absent.
    async fn find_or_create(&self, user_id: &str, now: DateTime<Utc>) -> Result<ProductivityProfile>;
    async fn update(&self, profile: &ProductivityProfile) -> Result<()>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_user_and_range(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<WorkSession>>;
    /// The currently running session, if one exists.
    async fn find_active(&self, user_id: &str) -> Result<Option<WorkSession>>;
    async fn insert(&self, session: &WorkSession) -> Result<()>;
}

/// Read-only task counts. Every count is scoped to tasks the user owns or
/// is assigned to.
#[async_trait]
pub trait TaskQueries: Send + Sync {
    async fn count_urgent_open(&self, user_id: &str) -> Result<u32>;
    async fn count_overdue_open(&self, user_id: &str, now: DateTime<Utc>) -> Result<u32>;
    /// Tasks created in `[from, to)`.
    async fn count_created_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u32>;
    /// Tasks completed in `[from, to)`.
    async fn count_completed_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u32>;
    /// `(completed, total)` over all non-cancelled tasks, for the
    /// completion-rate blend.
    async fn completion_totals(&self, user_id: &str) -> Result<(u32, u32)>;
}

/// Everything in one process. Locks are held only for the map operation,
/// never across await points.
#[derive(Default)]
pub struct MemoryStore {
    profiles: Mutex<HashMap<String, ProductivityProfile>>,
    sessions: Mutex<Vec<WorkSession>>,
    tasks: Mutex<Vec<Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_task(&self, task: Task) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.push(task);
    }

    pub fn add_session(&self, session: WorkSession) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.push(session);
    }

    fn count_tasks(&self, user_id: &str, predicate: impl Fn(&Task) -> bool) -> u32 {
        let tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.iter().filter(|t| t.involves(user_id)).filter(|t| predicate(t)).count() as u32
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<ProductivityProfile>> {
        let profiles = self.profiles.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(profiles.get(user_id).cloned())
    }

    async fn find_or_create(&self, user_id: &str, now: DateTime<Utc>) -> Result<ProductivityProfile> {
        let mut profiles = self.profiles.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(profiles
            .entry(user_id.to_string())
            .or_insert_with(|| ProductivityProfile::new(user_id, now))
            .clone())
    }

    async fn update(&self, profile: &ProductivityProfile) -> Result<()> {
        let mut profiles = self.profiles.lock().unwrap_or_else(PoisonError::into_inner);
        profiles.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn find_by_user_and_range(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<WorkSession>> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter(|s| s.started_at >= from && s.started_at <= to)
            .cloned()
            .collect())
    }

    async fn find_active(&self, user_id: &str) -> Result<Option<WorkSession>> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.ended_at.is_none())
            .max_by_key(|s| s.started_at)
            .cloned())
    }

    async fn insert(&self, session: &WorkSession) -> Result<()> {
        self.add_session(session.clone());
        Ok(())
    }
}

#[async_trait]
impl TaskQueries for MemoryStore {
    async fn count_urgent_open(&self, user_id: &str) -> Result<u32> {
        Ok(self.count_tasks(user_id, |t| t.is_open() && t.priority == Priority::Urgent))
    }

    async fn count_overdue_open(&self, user_id: &str, now: DateTime<Utc>) -> Result<u32> {
        Ok(self.count_tasks(user_id, |t| t.is_overdue(now)))
    }

    async fn count_created_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u32> {
        Ok(self.count_tasks(user_id, |t| t.created_at >= from && t.created_at < to))
    }

    async fn count_completed_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u32> {
        Ok(self.count_tasks(user_id, |t| {
            t.completed_at.is_some_and(|at| at >= from && at < to)
        }))
    }

    async fn completion_totals(&self, user_id: &str) -> Result<(u32, u32)> {
        let completed = self.count_tasks(user_id, |t| t.status == TaskStatus::Completed);
        let total = self.count_tasks(user_id, |t| t.status != TaskStatus::Cancelled);
        Ok((completed, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::session::SessionKind;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_profile_find_or_create_persists() {
        let store = MemoryStore::new();
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();

        assert!(store.find_by_user_id("ada").await.unwrap().is_none());
        let created = store.find_or_create("ada", now).await.unwrap();
        assert_eq!(created.user_id, "ada");

        let found = store.find_by_user_id("ada").await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_task_counts_scope_to_involvement() {
        let store = MemoryStore::new();
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();

        store.add_task(
            Task::new("t1", "ada", "Fix build", now).with_priority(Priority::Urgent),
        );
        store.add_task(
            Task::new("t2", "grace", "Plan sprint", now)
                .with_priority(Priority::Urgent)
                .with_assignee("ada"),
        );
        store.add_task(Task::new("t3", "grace", "Unrelated", now).with_priority(Priority::Urgent));

        assert_eq!(store.count_urgent_open("ada").await.unwrap(), 2);
        assert_eq!(store.count_urgent_open("grace").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_created_range_is_half_open() {
        let store = MemoryStore::new();
        let from = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap();

        store.add_task(Task::new("t1", "ada", "At start", from));
        store.add_task(Task::new("t2", "ada", "At end", to));

        assert_eq!(store.count_created_between("ada", from, to).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_latest_open_session_is_active() {
        let store = MemoryStore::new();
        let early = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 3, 10, 14, 0, 0).unwrap();

        store.add_session(WorkSession::new("s1", "ada", SessionKind::Work, early));
        store.add_session(WorkSession::new("s2", "ada", SessionKind::Work, later));
        store.add_session(
            WorkSession::new("s3", "ada", SessionKind::Work, later).finished(later),
        );

        let active = store.find_active("ada").await.unwrap();
        assert_eq!(active.map(|s| s.id), Some("s2".to_string()));
    }
}
