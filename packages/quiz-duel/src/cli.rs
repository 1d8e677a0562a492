use clap::{Parser, Subcommand, ValueEnum};

use shared::models::session::WinType;

#[derive(Parser)]
#[command(name = "quiz-duel")]
#[command(about = "Two-player quiz sessions from the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the session API (overrides QUIZ_API_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Bearer token (overrides QUIZ_API_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Use this user id instead of the token's subject
    #[arg(long, global = true)]
    pub user_id: Option<String>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a session and wait for an opponent
    Create {
        /// Track the questions are drawn from
        #[arg(long)]
        track: String,

        #[arg(long, default_value = "30")]
        questions: u32,

        #[arg(long, value_enum, default_value = "highest-percentage")]
        win_type: WinTypeArg,

        /// Error limit for first-to-errors sessions
        #[arg(long)]
        win_value: Option<u32>,
    },

    /// Join a session with the code the creator shared
    Join { code: String },

    /// Play a scripted match between two local clients
    Sandbox {
        /// Poll interval in milliseconds
        #[arg(long, default_value = "200")]
        interval_ms: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum WinTypeArg {
    FirstToErrors,
    HighestPercentage,
}

impl From<WinTypeArg> for WinType {
    fn from(arg: WinTypeArg) -> Self {
        match arg {
            WinTypeArg::FirstToErrors => WinType::FirstToErrors,
            WinTypeArg::HighestPercentage => WinType::HighestPercentage,
        }
    }
}
