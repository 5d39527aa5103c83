use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod llm;
mod store;

#[derive(Parser, Debug)]
#[command(
    name = "cadence",
    version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("CADENCE_BUILD_SHA")),
    about = "Productivity intelligence over your tracked work sessions"
)]
struct Cli {
    /// User the command operates on
    #[arg(long, global = true, default_value = "default")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config file to ~/.cadence/config.toml
    Init,

    /// Record a work session and fold it into your profile
    Record {
        /// Session start, "YYYY-MM-DD HH:MM" in your configured timezone
        /// (default: now minus the duration)
        #[arg(long)]
        start: Option<String>,

        /// Session length in minutes
        #[arg(long)]
        minutes: i32,

        /// Times the session was paused
        #[arg(long, default_value_t = 0)]
        pauses: i32,

        /// Session kind
        #[arg(long, value_enum, default_value_t = KindArg::Work)]
        kind: KindArg,

        /// Mark the session abandoned instead of completed
        #[arg(long)]
        abandoned: bool,

        /// Category worked on (feeds category preferences)
        #[arg(long)]
        category: Option<String>,
    },

    /// Show the learned productivity profile
    Profile,

    /// Suggest when to work and for how long
    Schedule {
        /// How many peak hours to list
        #[arg(long, default_value_t = 3)]
        top: usize,
    },

    /// Predict how long a task will take
    Predict {
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
    },

    /// Analyze burnout risk over the last two weeks
    Burnout,

    /// Rest recommendations for right now
    Rest,

    /// Weekly wellbeing summary
    Summary,

    /// One-shot chat with the assistant
    Chat {
        /// What to ask
        message: String,
    },

    /// Turn a natural-language line into a task draft
    Parse {
        /// e.g. "Fix the login bug !high #coding ~45m tomorrow"
        text: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Work,
    Continuous,
    ShortBreak,
    LongBreak,
}

impl From<KindArg> for cadence_core::SessionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Work => Self::Work,
            KindArg::Continuous => Self::Continuous,
            KindArg::ShortBreak => Self::ShortBreak,
            KindArg::LongBreak => Self::LongBreak,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PriorityArg {
    Urgent,
    High,
    Medium,
    Low,
}

impl From<PriorityArg> for cadence_core::Priority {
    fn from(priority: PriorityArg) -> Self {
        match priority {
            PriorityArg::Urgent => Self::Urgent,
            PriorityArg::High => Self::High,
            PriorityArg::Medium => Self::Medium,
            PriorityArg::Low => Self::Low,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if matches!(cli.command, Command::Init) {
        return config::init_config();
    }

    let cfg = config::load_config()?;
    let service = commands::build_service(&cfg)?;
    let user = cli.user.as_str();

    match cli.command {
        Command::Init => {} // handled before the service is built

        Command::Record { start, minutes, pauses, kind, abandoned, category } => {
            let args = commands::RecordArgs {
                start,
                minutes,
                pauses,
                kind: kind.into(),
                abandoned,
                category,
            };
            commands::record(&service, user, args, &cfg.insight.timezone).await?;
        }

        Command::Profile => {
            commands::profile(&service, user).await?;
        }

        Command::Schedule { top } => {
            commands::schedule(&service, user, top).await?;
        }

        Command::Predict { title, description, category, priority } => {
            commands::predict(&service, user, title, description, category, priority.map(Into::into))
                .await?;
        }

        Command::Burnout => {
            commands::burnout(&service, user).await?;
        }

        Command::Rest => {
            commands::rest(&service, user).await?;
        }

        Command::Summary => {
            commands::summary(&service, user).await?;
        }

        Command::Chat { message } => {
            commands::chat(&service, user, &message).await?;
        }

        Command::Parse { text } => {
            commands::parse(&service, user, &text).await?;
        }
    }

    Ok(())
}
