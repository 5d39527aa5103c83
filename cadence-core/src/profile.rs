//! Per-user productivity profile, learned online via exponential smoothing.
//!
//! Updates are immutable: every operation validates its inputs and returns a
//! new profile, so concurrent readers never observe a half-applied change.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Score read for hours/days/categories nobody has learned about yet.
pub const NEUTRAL_SCORE: f64 = 0.5;
/// Scores above this mark an hour/day as a genuine peak.
pub const PEAK_SCORE_THRESHOLD: f64 = 0.7;
/// Starting average before any duration has been observed. Minutes.
pub const DEFAULT_AVG_DURATION: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("hour out of range: {0} (expected 0-23)")]
    HourOutOfRange(u32),
    #[error("day out of range: {0} (expected 0-6, 0=Sunday)")]
    DayOutOfRange(u32),
    #[error("score out of range: {0} (expected 0.0-1.0)")]
    ScoreOutOfRange(f64),
    #[error("negative duration in batch: {0}")]
    NegativeDuration(i32),
    #[error("completed count {completed} exceeds total {total}")]
    CompletedExceedsTotal { completed: u32, total: u32 },
}

/// Decay constants for the three smoothing families. Alpha is the weight of
/// the prior: `new = old*alpha + sample*(1-alpha)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Peak hour/day/category updates.
    pub peak_alpha: f64,
    /// Average-duration batch blending.
    pub duration_alpha: f64,
    /// Completion-rate blending.
    pub completion_alpha: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            peak_alpha: 0.7,
            duration_alpha: 0.6,
            completion_alpha: 0.8,
        }
    }
}

fn ema(old: f64, sample: f64, alpha: f64) -> f64 {
    (old * alpha + sample * (1.0 - alpha)).clamp(0.0, 1.0)
}

fn validate_score(score: f64) -> Result<(), ValidationError> {
    // NaN fails the range check too.
    if !(0.0..=1.0).contains(&score) {
        return Err(ValidationError::ScoreOutOfRange(score));
    }
    Ok(())
}

/// Learned statistics for one user.
///
/// Maps are sparse: an absent hour/day/category reads as [`NEUTRAL_SCORE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivityProfile {
    pub user_id: String,
    /// Hour of day (0-23) -> productivity score [0,1].
    pub peak_hours: BTreeMap<u32, f64>,
    /// Weekday (0=Sunday .. 6=Saturday) -> productivity score [0,1].
    pub peak_days: BTreeMap<u32, f64>,
    /// Minutes; stays positive under smoothing.
    pub avg_task_duration: f64,
    /// Fraction of tasks completed, [0,1].
    pub completion_rate: f64,
    /// Lowercased category label -> efficiency score [0,1].
    pub category_preferences: BTreeMap<String, f64>,
    pub updated_at: DateTime<Utc>,
}

impl ProductivityProfile {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            peak_hours: BTreeMap::new(),
            peak_days: BTreeMap::new(),
            avg_task_duration: DEFAULT_AVG_DURATION,
            completion_rate: NEUTRAL_SCORE,
            category_preferences: BTreeMap::new(),
            updated_at: now,
        }
    }

    /// Blend a productivity sample into one hour's score.
    pub fn update_peak_hour(
        &self,
        hour: u32,
        score: f64,
        smoothing: &SmoothingConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if hour > 23 {
            return Err(ValidationError::HourOutOfRange(hour));
        }
        validate_score(score)?;

        let prior = self.peak_hour_score(hour);
        let mut next = self.clone();
        next.peak_hours.insert(hour, ema(prior, score, smoothing.peak_alpha));
        next.updated_at = now;
        Ok(next)
    }

    /// Blend a productivity sample into one weekday's score.
    pub fn update_peak_day(
        &self,
        day: u32,
        score: f64,
        smoothing: &SmoothingConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if day > 6 {
            return Err(ValidationError::DayOutOfRange(day));
        }
        validate_score(score)?;

        let prior = self.peak_day_score(day);
        let mut next = self.clone();
        next.peak_days.insert(day, ema(prior, score, smoothing.peak_alpha));
        next.updated_at = now;
        Ok(next)
    }

    /// Blend an efficiency sample into one category's score.
    pub fn update_category_preference(
        &self,
        category: &str,
        score: f64,
        smoothing: &SmoothingConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        validate_score(score)?;

        let key = category.trim().to_lowercase();
        let prior = self.category_score(&key);
        let mut next = self.clone();
        next.category_preferences.insert(key, ema(prior, score, smoothing.peak_alpha));
        next.updated_at = now;
        Ok(next)
    }

    /// Average a batch of observed durations and blend against the prior
    /// average. An empty batch is a no-op.
    pub fn recalculate_avg_duration(
        &self,
        recent_minutes: &[i32],
        smoothing: &SmoothingConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if recent_minutes.is_empty() {
            return Ok(self.clone());
        }
        if let Some(neg) = recent_minutes.iter().find(|m| **m < 0) {
            return Err(ValidationError::NegativeDuration(*neg));
        }

        let batch_avg =
            recent_minutes.iter().map(|m| *m as f64).sum::<f64>() / recent_minutes.len() as f64;

        let mut next = self.clone();
        next.avg_task_duration = self.avg_task_duration * smoothing.duration_alpha
            + batch_avg * (1.0 - smoothing.duration_alpha);
        next.updated_at = now;
        Ok(next)
    }

    /// Blend a completed/total ratio into the completion rate. Zero total is
    /// a no-op.
    pub fn update_completion_rate(
        &self,
        completed: u32,
        total: u32,
        smoothing: &SmoothingConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if completed > total {
            return Err(ValidationError::CompletedExceedsTotal { completed, total });
        }
        if total == 0 {
            return Ok(self.clone());
        }

        let rate = completed as f64 / total as f64;
        let mut next = self.clone();
        next.completion_rate = ema(self.completion_rate, rate, smoothing.completion_alpha);
        next.updated_at = now;
        Ok(next)
    }

    pub fn peak_hour_score(&self, hour: u32) -> f64 {
        self.peak_hours.get(&hour).copied().unwrap_or(NEUTRAL_SCORE)
    }

    pub fn peak_day_score(&self, day: u32) -> f64 {
        self.peak_days.get(&day).copied().unwrap_or(NEUTRAL_SCORE)
    }

    pub fn category_score(&self, category: &str) -> f64 {
        self.category_preferences
            .get(&category.trim().to_lowercase())
            .copied()
            .unwrap_or(NEUTRAL_SCORE)
    }

    pub fn is_peak_hour(&self, hour: u32) -> bool {
        self.peak_hour_score(hour) > PEAK_SCORE_THRESHOLD
    }

    pub fn is_peak_day(&self, day: u32) -> bool {
        self.peak_day_score(day) > PEAK_SCORE_THRESHOLD
    }

    /// Hours ranked by score descending; ties break on the earlier hour.
    pub fn top_peak_hours(&self, n: usize) -> Vec<(u32, f64)> {
        let mut entries: Vec<(u32, f64)> = self.peak_hours.iter().map(|(h, s)| (*h, *s)).collect();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        entries.truncate(n);
        entries
    }

    /// Weekdays ranked by score descending; ties break on the earlier day.
    pub fn top_peak_days(&self, n: usize) -> Vec<(u32, f64)> {
        let mut entries: Vec<(u32, f64)> = self.peak_days.iter().map(|(d, s)| (*d, *s)).collect();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        entries.truncate(n);
        entries
    }

    /// Categories ranked by score descending; ties break alphabetically.
    pub fn top_categories(&self, n: usize) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self
            .category_preferences
            .iter()
            .map(|(c, s)| (c.clone(), *s))
            .collect();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        entries.truncate(n);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn profile() -> ProductivityProfile {
        ProductivityProfile::new("u1", now())
    }

    #[test]
    fn test_peak_hour_blend_weights_prior() {
        let p = profile()
            .update_peak_hour(9, 1.0, &SmoothingConfig::default(), now())
            .unwrap();
        // 0.5*0.7 + 1.0*0.3 = 0.65
        assert!((p.peak_hour_score(9) - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_ema_fixed_point() {
        let smoothing = SmoothingConfig::default();
        let p = profile().update_peak_hour(9, 0.5, &smoothing, now()).unwrap();
        assert!((p.peak_hour_score(9) - 0.5).abs() < 1e-9);

        let p = p.update_completion_rate(1, 2, &smoothing, now()).unwrap();
        assert!((p.completion_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ema_stays_in_bounds() {
        let smoothing = SmoothingConfig::default();
        let mut p = profile();
        for _ in 0..50 {
            p = p.update_peak_hour(9, 1.0, &smoothing, now()).unwrap();
            p = p.update_peak_day(2, 0.0, &smoothing, now()).unwrap();
        }
        assert!(p.peak_hour_score(9) <= 1.0);
        assert!(p.peak_day_score(2) >= 0.0);
    }

    #[test]
    fn test_out_of_range_inputs_rejected() {
        let smoothing = SmoothingConfig::default();
        let p = profile();

        assert_eq!(
            p.update_peak_hour(24, 0.5, &smoothing, now()),
            Err(ValidationError::HourOutOfRange(24))
        );
        assert_eq!(
            p.update_peak_day(7, 0.5, &smoothing, now()),
            Err(ValidationError::DayOutOfRange(7))
        );
        assert_eq!(
            p.update_peak_hour(9, 1.5, &smoothing, now()),
            Err(ValidationError::ScoreOutOfRange(1.5))
        );
        assert_eq!(
            p.update_completion_rate(5, 3, &smoothing, now()),
            Err(ValidationError::CompletedExceedsTotal { completed: 5, total: 3 })
        );
    }

    #[test]
    fn test_avg_duration_blend() {
        let smoothing = SmoothingConfig::default();
        let p = profile()
            .recalculate_avg_duration(&[40, 50], &smoothing, now())
            .unwrap();
        // batch avg 45: 30*0.6 + 45*0.4 = 36
        assert!((p.avg_task_duration - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_avg_duration_empty_batch_is_noop() {
        let smoothing = SmoothingConfig::default();
        let p = profile();
        let next = p.recalculate_avg_duration(&[], &smoothing, now()).unwrap();
        assert_eq!(next, p);
    }

    #[test]
    fn test_completion_rate_blend_and_zero_total() {
        let smoothing = SmoothingConfig::default();
        let p = profile().update_completion_rate(8, 10, &smoothing, now()).unwrap();
        // 0.5*0.8 + 0.8*0.2 = 0.56
        assert!((p.completion_rate - 0.56).abs() < 1e-9);

        let same = p.update_completion_rate(0, 0, &smoothing, now()).unwrap();
        assert_eq!(same.completion_rate, p.completion_rate);
    }

    #[test]
    fn test_absent_entries_read_neutral() {
        let p = profile();
        assert_eq!(p.peak_hour_score(3), NEUTRAL_SCORE);
        assert_eq!(p.peak_day_score(4), NEUTRAL_SCORE);
        assert_eq!(p.category_score("coding"), NEUTRAL_SCORE);
        assert!(!p.is_peak_hour(3));
    }

    #[test]
    fn test_top_peak_hours_ordering() {
        let smoothing = SmoothingConfig::default();
        let mut p = profile();
        // Push hour 9 high and hour 14 low.
        for _ in 0..10 {
            p = p.update_peak_hour(9, 1.0, &smoothing, now()).unwrap();
            p = p.update_peak_hour(14, 0.0, &smoothing, now()).unwrap();
        }
        p = p.update_peak_hour(11, 0.8, &smoothing, now()).unwrap();

        let top = p.top_peak_hours(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, 9);
        assert_eq!(top[1].0, 11);
    }

    #[test]
    fn test_category_keys_normalized() {
        let smoothing = SmoothingConfig::default();
        let p = profile()
            .update_category_preference("  Coding ", 1.0, &smoothing, now())
            .unwrap();
        assert!(p.category_score("coding") > NEUTRAL_SCORE);
        assert!(p.category_score("CODING") > NEUTRAL_SCORE);
    }

    #[test]
    fn test_updates_do_not_mutate_original() {
        let smoothing = SmoothingConfig::default();
        let p = profile();
        let _next = p.update_peak_hour(9, 1.0, &smoothing, now()).unwrap();
        assert_eq!(p.peak_hour_score(9), NEUTRAL_SCORE);
    }

    #[test]
    fn test_stored_json_shape_stays_readable() {
        // Hosts persist profiles as JSON; map keys land as strings there.
        let text = r#"{
            "user_id": "u1",
            "peak_hours": {"9": 0.8},
            "peak_days": {"2": 0.7},
            "avg_task_duration": 42.0,
            "completion_rate": 0.75,
            "category_preferences": {"coding": 0.9},
            "updated_at": "2026-03-10T12:00:00Z"
        }"#;

        let p: ProductivityProfile = serde_json::from_str(text).unwrap();
        assert_eq!(p.peak_hour_score(9), 0.8);
        assert_eq!(p.peak_day_score(2), 0.7);
        assert_eq!(p.category_score("coding"), 0.9);

        let round: ProductivityProfile =
            serde_json::from_str(&serde_json::to_string(&p).unwrap()).unwrap();
        assert_eq!(round, p);
    }
}
