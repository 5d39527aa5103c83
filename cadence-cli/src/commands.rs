//! One function per subcommand: build the service over the JSON store,
//! call one operation, print something a human wants to read.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use cadence_core::{Priority, SessionKind, TaskOutline, WorkSession, day_name, parse_local_to_utc};
use cadence_insight::InsightService;
use chrono::{Duration, Utc};

use crate::config::{self, Config};
use crate::llm::HttpAssistant;
use crate::store::JsonStore;

pub fn build_service(cfg: &Config) -> Result<InsightService> {
    let dir = config::ensure_cadence_home()?;
    let store = Arc::new(JsonStore::new(dir));

    let mut service = InsightService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        cfg.insight_config(),
    );
    if let Some(assistant) = HttpAssistant::from_config(&cfg.llm) {
        service = service.with_port(Arc::new(assistant));
    }
    Ok(service)
}

pub struct RecordArgs {
    pub start: Option<String>,
    pub minutes: i32,
    pub pauses: i32,
    pub kind: SessionKind,
    pub abandoned: bool,
    pub category: Option<String>,
}

pub async fn record(
    service: &InsightService,
    user: &str,
    args: RecordArgs,
    timezone: &str,
) -> Result<()> {
    let RecordArgs { start, minutes, pauses, kind, abandoned, category } = args;
    if minutes <= 0 {
        bail!("--minutes must be positive");
    }

    let now = Utc::now();
    let started_at = match start {
        Some(text) => parse_local_to_utc(&text, timezone)
            .with_context(|| format!("parse --start '{text}' (expected YYYY-MM-DD HH:MM)"))?,
        None => now - Duration::minutes(minutes as i64),
    };

    let mut session = WorkSession::new(
        format!("s-{}", now.timestamp_millis()),
        user,
        kind,
        started_at,
    )
    .with_duration(minutes)
    .with_pauses(pauses);
    if !abandoned {
        session = session.finished(started_at + Duration::minutes(minutes as i64));
    }

    let learns = session.completed && kind.is_learnable();
    let profile = service.record_session(user, &session, category.as_deref(), now).await?;

    println!("Recorded {minutes} minutes ({kind:?}).");
    if learns {
        println!(
            "Profile updated: avg duration {:.0} min, completion rate {:.0}%.",
            profile.avg_task_duration,
            profile.completion_rate * 100.0
        );
    } else {
        println!("Stored without learning (breaks and abandoned sessions do not count).");
    }
    Ok(())
}

pub async fn profile(service: &InsightService, user: &str) -> Result<()> {
    let Some(profile) = service.get_profile(user).await? else {
        println!("No profile for '{user}' yet. Record a session first: cadence record --minutes 30");
        return Ok(());
    };

    println!("Profile for {user}");
    println!("  Avg task duration: {:.0} min", profile.avg_task_duration);
    println!("  Completion rate:   {:.0}%", profile.completion_rate * 100.0);

    let hours = profile.top_peak_hours(3);
    if !hours.is_empty() {
        println!("  Peak hours:");
        for (hour, score) in hours {
            println!("    {hour:02}:00      {:>3.0}%", score * 100.0);
        }
    }

    let days = profile.top_peak_days(3);
    if !days.is_empty() {
        println!("  Peak days:");
        for (day, score) in days {
            println!("    {:9}  {:>3.0}%", day_name(day), score * 100.0);
        }
    }

    let categories = profile.top_categories(5);
    if !categories.is_empty() {
        println!("  Categories:");
        for (category, score) in categories {
            println!("    {category:12}{:>3.0}%", score * 100.0);
        }
    }
    Ok(())
}

pub async fn schedule(service: &InsightService, user: &str, top: usize) -> Result<()> {
    let schedule = service.get_optimal_schedule(user, Some(top)).await?;

    println!("{}", schedule.recommendation);
    if !schedule.peak_hours.is_empty() {
        println!();
        for (hour, score) in &schedule.peak_hours {
            println!("  {hour:02}:00  {:>3.0}%", score * 100.0);
        }
    }
    println!("\nSuggested block length: {} min", schedule.suggested_session_minutes);
    Ok(())
}

pub async fn predict(
    service: &InsightService,
    user: &str,
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    priority: Option<Priority>,
) -> Result<()> {
    let outline = TaskOutline { title, description, category, priority };
    let prediction = service.predict_task_duration(user, &outline).await?;

    println!(
        "Estimated duration: {} min ({:?} confidence, {} estimate)",
        prediction.minutes, prediction.confidence, prediction.source
    );
    Ok(())
}

pub async fn burnout(service: &InsightService, user: &str) -> Result<()> {
    let analysis = service.analyze_burnout_risk(user, Utc::now()).await?;

    println!("Burnout risk: {:.0}/100 ({:?})", analysis.risk_score, analysis.risk_level);
    if analysis.warnings.is_empty() {
        println!("No warning signs in the last two weeks.");
    }
    for warning in &analysis.warnings {
        println!("\n[{:?}] {}", warning.severity, warning.message);
        println!("  -> {}", warning.recommendation);
    }
    if let Some(insight) = &analysis.ai_insight {
        println!("\n{insight}");
    }
    Ok(())
}

pub async fn rest(service: &InsightService, user: &str) -> Result<()> {
    let now = Utc::now();

    let recommendations = service.get_rest_recommendations(user, now).await?;
    if recommendations.is_empty() {
        println!("No rest needed right now. Keep going.");
    }
    for rec in &recommendations {
        println!("[{:?}] {}", rec.priority, rec.message);
    }

    if let Some(intervention) = service.check_for_intervention(user, now).await? {
        println!("\n{}", intervention.message);
    }
    Ok(())
}

pub async fn summary(service: &InsightService, user: &str) -> Result<()> {
    let summary = service.generate_weekly_wellbeing_summary(user, Utc::now()).await?;

    println!(
        "Week {} to {}  (score {:.0}/100)",
        summary.week_start.format("%Y-%m-%d"),
        summary.week_end.format("%Y-%m-%d"),
        summary.overall_score
    );
    println!(
        "{:.1} h across {} sessions (avg {:.0} min), {} tasks completed, {} breaks taken",
        summary.total_hours,
        summary.session_count,
        summary.avg_session_minutes,
        summary.completed_tasks,
        summary.breaks_taken
    );
    if let Some(hour) = summary.latest_work_hour {
        println!("Latest work start: {hour:02}:00");
    }

    print_section("Highlights", &summary.highlights);
    print_section("Concerns", &summary.concerns);
    print_section("Recommendations", &summary.recommendations);
    Ok(())
}

fn print_section(heading: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    println!("\n{heading}:");
    for line in lines {
        println!("  - {line}");
    }
}

pub async fn chat(service: &InsightService, user: &str, message: &str) -> Result<()> {
    let reply = service.chat(user, message).await?;
    println!("{reply}");
    Ok(())
}

pub async fn parse(service: &InsightService, user: &str, text: &str) -> Result<()> {
    let draft = service.parse_task(user, text).await;

    println!("Title:    {}", draft.title);
    if let Some(description) = &draft.description {
        println!("Details:  {description}");
    }
    if let Some(category) = &draft.category {
        println!("Category: {category}");
    }
    if let Some(priority) = draft.priority {
        println!("Priority: {priority:?}");
    }
    if let Some(minutes) = draft.estimated_minutes {
        println!("Estimate: {minutes} min");
    }
    if let Some(due) = draft.due {
        println!("Due:      {due}");
    }
    println!("Source:   {}", draft.source);
    Ok(())
}
