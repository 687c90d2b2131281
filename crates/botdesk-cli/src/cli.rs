//! Command-line interface definition using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use botdesk_models::{BotId, BotType, FeedbackId, FeedbackStatus, Rating};
use botdesk_persistence::paths;

/// Build version string with git hash and build date.
fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const BUILD_DATE: &str = env!("BUILD_DATE");

    static VERSION_STRING: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} ({}, {})", VERSION, GIT_HASH, BUILD_DATE))
}

/// BotDesk - create, deploy and monitor Telegram bots
#[derive(Parser, Debug)]
#[command(name = "botdesk")]
#[command(author, version = version_string(), about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to state directory
    #[arg(short, long, env = paths::STATE_DIR_ENV, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Backend base URL (overrides BOTDESK_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with email and password
    Login {
        /// Account email
        #[arg(required = true)]
        email: String,

        /// Account password
        #[arg(short, long, env = "BOTDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create a new account
    Register {
        /// Account email
        #[arg(required = true)]
        email: String,

        /// Full name
        #[arg(short, long)]
        name: String,

        /// Account password
        #[arg(short, long, env = "BOTDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Confirm an email address with the token from the verification mail
    VerifyEmail {
        /// Verification token
        #[arg(required = true)]
        token: String,
    },

    /// Log in with a Google authorization code
    GoogleAuth {
        /// Authorization code from the Google consent redirect
        #[arg(required = true)]
        code: String,
    },

    /// Show the logged-in user
    Whoami,

    /// Forget the stored session
    Logout,

    /// Manage bots
    #[command(subcommand)]
    Bots(BotCommands),

    /// Manage knowledge bases
    #[command(subcommand)]
    Knowledge(KnowledgeCommands),

    /// Review customer feedback
    #[command(subcommand)]
    Feedback(FeedbackCommands),
}

#[derive(Subcommand, Debug)]
pub enum BotCommands {
    /// List your bots
    List,

    /// Show one bot
    Show {
        /// Bot ID
        id: BotId,

        /// Include the generated code
        #[arg(long)]
        code: bool,
    },

    /// Create a bot
    Create {
        /// Bot name
        #[arg(required = true)]
        name: String,

        /// What the bot should do
        #[arg(short, long)]
        requirements: String,

        /// Telegram bot token from BotFather
        #[arg(short, long)]
        token: String,

        /// Bot type (simple_chat, qa_knowledge_base, qa_feedback)
        #[arg(short = 'k', long = "type", default_value = "simple_chat")]
        bot_type: BotType,
    },

    /// Update a bot
    Update(UpdateArgs),

    /// Delete a bot
    Delete {
        /// Bot ID
        id: BotId,
    },

    /// Generate the bot's code from its requirements
    Generate {
        /// Bot ID
        id: BotId,
    },

    /// Deploy a bot
    Deploy {
        /// Bot ID
        id: BotId,
    },

    /// Stop a deployed bot
    Stop {
        /// Bot ID
        id: BotId,
    },
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Bot ID
    pub id: BotId,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// New requirements
    #[arg(short, long)]
    pub requirements: Option<String>,

    /// New Telegram bot token
    #[arg(short, long)]
    pub token: Option<String>,

    /// New bot type
    #[arg(short = 'k', long = "type")]
    pub bot_type: Option<BotType>,
}

#[derive(Subcommand, Debug)]
pub enum KnowledgeCommands {
    /// Show the knowledge base status of a bot
    Status {
        /// Bot ID
        bot: BotId,
    },

    /// Upload a PDF document to a bot's knowledge base
    Upload {
        /// Bot ID
        bot: BotId,

        /// PDF file to upload
        file: PathBuf,

        /// Wait until processing finishes
        #[arg(short, long)]
        watch: bool,
    },

    /// Wait until a bot's knowledge base finishes processing
    Watch {
        /// Bot ID
        bot: BotId,
    },
}

#[derive(Subcommand, Debug)]
pub enum FeedbackCommands {
    /// List feedback for a bot
    List(FeedbackListArgs),

    /// Show one feedback entry
    Show {
        /// Bot ID
        bot: BotId,
        /// Feedback ID
        id: FeedbackId,
    },

    /// Change the status of a feedback entry
    SetStatus {
        /// Bot ID
        bot: BotId,
        /// Feedback ID
        id: FeedbackId,
        /// New status (new, read, resolved)
        status: FeedbackStatus,
    },

    /// Delete a feedback entry
    Delete {
        /// Bot ID
        bot: BotId,
        /// Feedback ID
        id: FeedbackId,
    },

    /// Show feedback statistics
    Stats {
        /// Bot ID
        bot: BotId,
    },

    /// Mark all feedback of a bot as read
    MarkAllRead {
        /// Bot ID
        bot: BotId,
    },

    /// Submit feedback on behalf of a Telegram user
    Submit(FeedbackSubmitArgs),
}

#[derive(Args, Debug)]
pub struct FeedbackSubmitArgs {
    /// Bot ID
    pub bot: BotId,

    /// Rating (1-5)
    #[arg(short, long)]
    pub rating: Rating,

    /// Feedback text
    #[arg(short, long)]
    pub message: String,

    /// Telegram user ID of the author
    #[arg(long)]
    pub telegram_id: i64,

    /// Telegram username of the author
    #[arg(long)]
    pub username: Option<String>,

    /// Image to attach (repeatable)
    #[arg(long = "image")]
    pub images: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FeedbackListArgs {
    /// Bot ID
    pub bot: BotId,

    /// Only entries with this status
    #[arg(long)]
    pub status: Option<FeedbackStatus>,

    /// Only entries with this rating (1-5)
    #[arg(long)]
    pub rating: Option<Rating>,

    /// Page number, starting at 1
    #[arg(long)]
    pub page: Option<u32>,

    /// Entries per page
    #[arg(long)]
    pub limit: Option<u32>,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Cli {
    /// Returns the state directory path, using default if not specified.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(paths::state_dir)
    }

    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
