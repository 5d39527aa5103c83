//! JSON file persistence under ~/.cadence: one file per user and concern,
//! read and rewritten whole. Plenty for a single-machine CLI.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cadence_core::{ProductivityProfile, Task, WorkSession};
use cadence_insight::{
    InsightError, ProfileRepository, Result, SessionRepository, TaskQueries,
};
use chrono::{DateTime, Utc};

pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn profile_path(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("profile-{user_id}.json"))
    }

    fn sessions_path(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("sessions-{user_id}.json"))
    }

    fn tasks_path(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("tasks-{user_id}.json"))
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(path)
            .map_err(|e| InsightError::Storage(format!("read {}: {e}", path.display())))?;
        let value = serde_json::from_str(&text)
            .map_err(|e| InsightError::Storage(format!("parse {}: {e}", path.display())))?;
        Ok(Some(value))
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| InsightError::Storage(e.to_string()))?;
        fs::write(path, json)
            .map_err(|e| InsightError::Storage(format!("write {}: {e}", path.display())))?;
        Ok(())
    }

    fn load_sessions(&self, user_id: &str) -> Result<Vec<WorkSession>> {
        Ok(Self::read_json(&self.sessions_path(user_id))?.unwrap_or_default())
    }

    /// Task files are written by whatever task tool the user runs; this
    /// store only reads them.
    fn load_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        Ok(Self::read_json(&self.tasks_path(user_id))?.unwrap_or_default())
    }

    fn count_tasks(&self, user_id: &str, predicate: impl Fn(&Task) -> bool) -> Result<u32> {
        let tasks = self.load_tasks(user_id)?;
        Ok(tasks.iter().filter(|t| t.involves(user_id)).filter(|t| predicate(t)).count() as u32)
    }
}

#[async_trait]
impl ProfileRepository for JsonStore {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<ProductivityProfile>> {
        Self::read_json(&self.profile_path(user_id))
    }

    async fn find_or_create(&self, user_id: &str, now: DateTime<Utc>) -> Result<ProductivityProfile> {
        match Self::read_json(&self.profile_path(user_id))? {
            Some(profile) => Ok(profile),
            None => {
                let profile = ProductivityProfile::new(user_id, now);
                Self::write_json(&self.profile_path(user_id), &profile)?;
                Ok(profile)
            }
        }
    }

    async fn update(&self, profile: &ProductivityProfile) -> Result<()> {
        Self::write_json(&self.profile_path(&profile.user_id), profile)
    }
}

#[async_trait]
impl SessionRepository for JsonStore {
    async fn find_by_user_and_range(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<WorkSession>> {
        let sessions = self.load_sessions(user_id)?;
        Ok(sessions
            .into_iter()
            .filter(|s| s.started_at >= from && s.started_at <= to)
            .collect())
    }

    async fn find_active(&self, user_id: &str) -> Result<Option<WorkSession>> {
        let sessions = self.load_sessions(user_id)?;
        Ok(sessions
            .into_iter()
            .filter(|s| s.ended_at.is_none())
            .max_by_key(|s| s.started_at))
    }

    async fn insert(&self, session: &WorkSession) -> Result<()> {
        let mut sessions = self.load_sessions(&session.user_id)?;
        sessions.push(session.clone());
        Self::write_json(&self.sessions_path(&session.user_id), &sessions)
    }
}

#[async_trait]
impl TaskQueries for JsonStore {
    async fn count_urgent_open(&self, user_id: &str) -> Result<u32> {
        self.count_tasks(user_id, |t| {
            t.is_open() && t.priority == cadence_core::Priority::Urgent
        })
    }

    async fn count_overdue_open(&self, user_id: &str, now: DateTime<Utc>) -> Result<u32> {
        self.count_tasks(user_id, |t| t.is_overdue(now))
    }

    async fn count_created_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u32> {
        self.count_tasks(user_id, |t| t.created_at >= from && t.created_at < to)
    }

    async fn count_completed_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u32> {
        self.count_tasks(user_id, |t| {
            t.completed_at.is_some_and(|at| at >= from && at < to)
        })
    }

    async fn completion_totals(&self, user_id: &str) -> Result<(u32, u32)> {
        let completed =
            self.count_tasks(user_id, |t| t.status == cadence_core::TaskStatus::Completed)?;
        let total =
            self.count_tasks(user_id, |t| t.status != cadence_core::TaskStatus::Cancelled)?;
        Ok((completed, total))
    }
}
