use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use cadence_insight::InsightConfig;
use serde::{Deserialize, Serialize};

pub fn cadence_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".cadence"))
}

pub fn ensure_cadence_home() -> Result<PathBuf> {
    let dir = cadence_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmSection,
    pub insight: InsightSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSection {
    /// "anthropic" or "openai"; anything else runs local-only.
    pub provider: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightSection {
    /// IANA timezone for local-hour and weekday logic.
    pub timezone: String,
    /// Deadline for each guarded AI call.
    pub ai_timeout_secs: u64,
    /// Per-operation circuit overrides; operations not listed keep their
    /// built-in tunables.
    #[serde(default)]
    pub circuits: Vec<CircuitOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitOverride {
    pub operation: String,
    pub failure_threshold: u32,
    pub reset_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmSection {
                provider: "anthropic".to_string(),
                model: "claude-3-5-sonnet-latest".to_string(),
                api_key_env: "ANTHROPIC_API_KEY".to_string(),
            },
            insight: InsightSection {
                timezone: "UTC".to_string(),
                ai_timeout_secs: 15,
                circuits: Vec::new(),
            },
        }
    }
}

impl Config {
    /// Lower this file onto the library-level tunables.
    pub fn insight_config(&self) -> InsightConfig {
        let mut config = InsightConfig::default();
        config.timezone = self.insight.timezone.clone();
        config.ai_timeout = Duration::from_secs(self.insight.ai_timeout_secs);
        for over in &self.insight.circuits {
            let entry = config.circuits.entry(over.operation.clone()).or_default();
            entry.failure_threshold = over.failure_threshold;
            entry.reset_timeout = Duration::from_secs(over.reset_timeout_secs);
        }
        config
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_cadence_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    Ok(toml::from_str(&s).context("parse config.toml")?)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let cfg = Config::default();
    save_config(&cfg)?;
    println!("Wrote {}", p.display());
    Ok(())
}
