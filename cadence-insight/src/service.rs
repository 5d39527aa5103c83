//! The insight service: every produced operation behind one struct, wired
//! to the storage ports, the resilience manager, and (optionally) the AI
//! port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use cadence_core::burnout::{AI_INSIGHT_MIN_SCORE, BurnoutAnalysis};
use cadence_core::learning::{LearnError, learn_from_session, productivity_sample};
use cadence_core::patterns::{
    DEFAULT_PATTERN_WINDOW_DAYS,
    TaskActivity,
    WorkPatternSnapshot,
    analyze_patterns,
};
use cadence_core::profile::{ProductivityProfile, SmoothingConfig};
use cadence_core::rest::{
    Intervention, RestContext, RestRecommendation, decide_intervention, recommend_rest,
};
use cadence_core::schedule::{OptimalSchedule, TaskOutline, build_optimal_schedule};
use cadence_core::session::WorkSession;
use cadence_core::time::{local_date, parse_timezone};
use cadence_core::wellbeing::{WeeklySummary, summarize_week};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::ai::GenerativePort;
use crate::config::{InsightConfig, ops};
use crate::error::{InsightError, Result};
use crate::parse::{TaskDraft, parse_task as parse_task_text};
use crate::predict::{DurationPrediction, predict_duration};
use crate::repos::{ProfileRepository, SessionRepository, TaskQueries};
use crate::resilience::ResilienceManager;

const DEFAULT_TOP_N: usize = 3;
/// How many learned categories to hand the task parser as hints.
const DEFAULT_KNOWN_CATEGORIES: usize = 5;

/// One service per process. Cheap to share behind an `Arc`; all state
/// lives in the repositories and the resilience manager.
pub struct InsightService {
    profiles: Arc<dyn ProfileRepository>,
    sessions: Arc<dyn SessionRepository>,
    tasks: Arc<dyn TaskQueries>,
    port: Option<Arc<dyn GenerativePort>>,
    manager: Arc<ResilienceManager>,
    config: InsightConfig,
    smoothing: SmoothingConfig,
    /// Serializes the profile read-modify-write per user.
    user_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl InsightService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        sessions: Arc<dyn SessionRepository>,
        tasks: Arc<dyn TaskQueries>,
        config: InsightConfig,
    ) -> Self {
        let manager = Arc::new(ResilienceManager::new(&config));
        Self {
            profiles,
            sessions,
            tasks,
            port: None,
            manager,
            config,
            smoothing: SmoothingConfig::default(),
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_port(mut self, port: Arc<dyn GenerativePort>) -> Self {
        self.port = Some(port);
        self
    }

    /// Swap in a shared resilience manager (hosts running several services
    /// against one circuit registry, tests injecting tight tunables).
    pub fn with_manager(mut self, manager: Arc<ResilienceManager>) -> Self {
        self.manager = manager;
        self
    }

    pub fn with_smoothing(mut self, smoothing: SmoothingConfig) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<ProductivityProfile>> {
        self.profiles.find_by_user_id(user_id).await
    }

    pub async fn get_optimal_schedule(
        &self,
        user_id: &str,
        top_n: Option<usize>,
    ) -> Result<OptimalSchedule> {
        let profile = self.profiles.find_by_user_id(user_id).await?;
        Ok(build_optimal_schedule(profile.as_ref(), top_n.unwrap_or(DEFAULT_TOP_N)))
    }

    pub async fn predict_task_duration(
        &self,
        user_id: &str,
        outline: &TaskOutline,
    ) -> Result<DurationPrediction> {
        let profile = self.profiles.find_by_user_id(user_id).await?;
        Ok(predict_duration(profile.as_ref(), outline, self.port.as_deref(), &self.manager).await)
    }

    /// Store a session and, when it carries learnable signal, fold it into
    /// the user's profile. The read-modify-write runs under a per-user lock
    /// so concurrent learning events cannot drop each other's update.
    pub async fn record_session(
        &self,
        user_id: &str,
        session: &WorkSession,
        category: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ProductivityProfile> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        self.sessions.insert(session).await?;

        let profile = self.profiles.find_or_create(user_id, now).await?;
        let mut updated =
            match learn_from_session(&profile, session, &self.smoothing, self.tz(), now) {
                Ok(updated) => updated,
                Err(LearnError::Validation(err)) => return Err(err.into()),
                Err(reason) => {
                    debug!(%reason, "session stored without learning");
                    return Ok(profile);
                }
            };

        if let Some(category) = category {
            let sample = productivity_sample(session);
            updated = updated.update_category_preference(category, sample, &self.smoothing, now)?;
        }

        let (completed, total) = self.tasks.completion_totals(user_id).await?;
        updated = updated.update_completion_rate(completed, total, &self.smoothing, now)?;

        self.profiles.update(&updated).await?;
        Ok(updated)
    }

    /// Local analysis always succeeds; the AI insight is attached only when
    /// the score warrants it and the guarded call came back, and its absence
    /// is never an error.
    pub async fn analyze_burnout_risk(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<BurnoutAnalysis> {
        let snapshot = self.pattern_snapshot(user_id, now).await?;
        let mut analysis = BurnoutAnalysis::local(snapshot);

        if analysis.risk_score >= AI_INSIGHT_MIN_SCORE
            && let Some(port) = self.port.as_deref()
        {
            let prompt = insight_prompt(&analysis);
            let outcome = self
                .manager
                .guard(ops::WELLBEING, || async {
                    port.generate(INSIGHT_CONTEXT, &prompt).await
                })
                .await;
            match outcome {
                Ok(text) => analysis.ai_insight = Some(text),
                Err(err) => {
                    warn!(error = %err, "burnout insight unavailable, returning local analysis");
                }
            }
        }

        Ok(analysis)
    }

    pub async fn get_rest_recommendations(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<RestRecommendation>> {
        let tz = self.tz();

        let active = self.sessions.find_active(user_id).await?;
        let active_session_minutes = active.map(|s| s.elapsed_minutes(now));

        let today = local_date(now, tz);
        let recent = self
            .sessions
            .find_by_user_and_range(user_id, now - Duration::days(2), now)
            .await?;
        let minutes_today: i64 = recent
            .iter()
            .filter(|s| s.kind.is_learnable())
            .filter(|s| local_date(s.started_at, tz) == today)
            .filter_map(|s| s.duration_minutes)
            .map(i64::from)
            .sum();

        let ctx = RestContext {
            active_session_minutes,
            hours_today: minutes_today as f64 / 60.0,
            urgent_count: self.tasks.count_urgent_open(user_id).await?,
            overdue_count: self.tasks.count_overdue_open(user_id, now).await?,
        };
        Ok(recommend_rest(&ctx, tz, now))
    }

    pub async fn check_for_intervention(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Intervention>> {
        let snapshot = self.pattern_snapshot(user_id, now).await?;
        let analysis = BurnoutAnalysis::local(snapshot);
        Ok(decide_intervention(&analysis))
    }

    /// Pure over its inputs: identical stored data gives an identical
    /// summary. The risk score inside is the local burnout score.
    pub async fn generate_weekly_wellbeing_summary(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<WeeklySummary> {
        let week_ago = now - Duration::days(7);
        let sessions = self.sessions.find_by_user_and_range(user_id, week_ago, now).await?;
        let completed = self.tasks.count_completed_between(user_id, week_ago, now).await?;

        let snapshot = self.pattern_snapshot(user_id, now).await?;
        let analysis = BurnoutAnalysis::local(snapshot);

        Ok(summarize_week(user_id, &sessions, completed, &analysis, self.tz(), now))
    }

    /// Guarded free-form chat. Circuit-open is surfaced as the typed
    /// [`InsightError::CircuitOpen`]; every other AI failure degrades to a
    /// deterministic local reply.
    pub async fn chat(&self, user_id: &str, message: &str) -> Result<String> {
        let profile = self.profiles.find_by_user_id(user_id).await?;
        let Some(port) = self.port.as_deref() else {
            debug!("no AI port configured, answering chat locally");
            return Ok(local_chat_reply(profile.as_ref()));
        };

        let context = chat_context(profile.as_ref());
        let outcome = self
            .manager
            .guard(ops::CHAT, || async { port.generate(&context, message).await })
            .await;

        match outcome {
            Ok(reply) => Ok(reply),
            Err(err @ InsightError::CircuitOpen { .. }) => Err(err),
            Err(err) => {
                warn!(error = %err, "chat fell back to the local reply");
                Ok(local_chat_reply(profile.as_ref()))
            }
        }
    }

    /// Natural-language task capture; total, never errors. The user's
    /// learned categories steer the AI draft toward their taxonomy.
    pub async fn parse_task(&self, user_id: &str, text: &str) -> TaskDraft {
        let known = match self.profiles.find_by_user_id(user_id).await {
            Ok(Some(profile)) => profile
                .top_categories(DEFAULT_KNOWN_CATEGORIES)
                .into_iter()
                .map(|(name, _)| name)
                .collect(),
            Ok(None) => Vec::new(),
            Err(err) => {
                debug!(error = %err, "parsing without category hints");
                Vec::new()
            }
        };
        parse_task_text(text, &known, self.port.as_deref(), &self.manager).await
    }

    /// Circuit state for an operation key, for status surfaces.
    pub fn circuit_state(&self, operation: &str) -> cadence_core::circuit::CircuitState {
        self.manager.circuit_state(operation)
    }

    fn tz(&self) -> Tz {
        parse_timezone(&self.config.timezone).unwrap_or(chrono_tz::UTC)
    }

    fn user_lock(&self, user_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.user_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(user_id.to_string()).or_default())
    }

    async fn task_activity(&self, user_id: &str, now: DateTime<Utc>) -> Result<TaskActivity> {
        let week_ago = now - Duration::days(7);
        let two_weeks_ago = now - Duration::days(14);

        Ok(TaskActivity {
            urgent_open: self.tasks.count_urgent_open(user_id).await?,
            overdue_open: self.tasks.count_overdue_open(user_id, now).await?,
            created_last_week: self.tasks.count_created_between(user_id, week_ago, now).await?,
            created_prior_week: self
                .tasks
                .count_created_between(user_id, two_weeks_ago, week_ago)
                .await?,
            completed_last_week: self
                .tasks
                .count_completed_between(user_id, week_ago, now)
                .await?,
            completed_prior_week: self
                .tasks
                .count_completed_between(user_id, two_weeks_ago, week_ago)
                .await?,
        })
    }

    async fn pattern_snapshot(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<WorkPatternSnapshot> {
        let window_start = now - Duration::days(DEFAULT_PATTERN_WINDOW_DAYS);
        let sessions = self.sessions.find_by_user_and_range(user_id, window_start, now).await?;
        let activity = self.task_activity(user_id, now).await?;
        Ok(analyze_patterns(&sessions, &activity, DEFAULT_PATTERN_WINDOW_DAYS, self.tz(), now))
    }
}

const INSIGHT_CONTEXT: &str =
    "You are a short, direct wellbeing coach inside a productivity tool. \
     Two or three sentences, no lists.";

fn insight_prompt(analysis: &BurnoutAnalysis) -> String {
    let snapshot = &analysis.snapshot;
    let mut lines = vec![
        format!("Burnout risk score {:.0} ({:?}).", analysis.risk_score, analysis.risk_level),
        format!(
            "Late-night work {:.0}%, weekend work {:.0}%, {:.1} hours per day on average.",
            snapshot.late_night_percentage, snapshot.weekend_percentage, snapshot.avg_daily_hours
        ),
    ];
    for warning in &analysis.warnings {
        lines.push(warning.message.clone());
    }
    lines.push("Say what this user should change this week.".to_string());
    lines.join("\n")
}

fn chat_context(profile: Option<&ProductivityProfile>) -> String {
    let mut context =
        String::from("You are Cadence, a focused productivity assistant. Be brief and concrete.");
    if let Some(profile) = profile {
        let schedule = build_optimal_schedule(Some(profile), DEFAULT_TOP_N);
        context.push_str("\nWhat you know about this user: ");
        context.push_str(&schedule.recommendation);
    }
    context
}

fn local_chat_reply(profile: Option<&ProductivityProfile>) -> String {
    let schedule = build_optimal_schedule(profile, DEFAULT_TOP_N);
    format!(
        "The assistant is unreachable right now, so here is the local view. {}",
        schedule.recommendation
    )
}
