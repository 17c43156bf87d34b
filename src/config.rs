use clap::{ArgAction, Parser};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Fridgecipe server configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "fridgecipe", version, about = "Turn a photo of your fridge into a recipe")]
pub struct Config {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease verbosity (-q, -qq, -qqq)
    #[arg(short = 'q', action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Address to bind the HTTP server to
    #[arg(long, env = "FRIDGECIPE_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Log file path (logs are written to stdout + this file)
    #[arg(long, env = "FRIDGECIPE_LOG_FILE", default_value = "fridgecipe.logs")]
    pub log_file: PathBuf,

    /// LLM API key
    #[arg(long, env = "FRIDGECIPE_LLM_API_KEY")]
    pub llm_api_key: Option<String>,

    /// Multimodal model used for both image analysis and chat
    #[arg(long, env = "FRIDGECIPE_LLM_MODEL", default_value = "gpt-4o-mini")]
    pub llm_model: String,

    /// LLM API URL (OpenAI-compatible, without the `/chat/completions` suffix)
    #[arg(long, env = "FRIDGECIPE_LLM_API_URL", default_value = "https://api.openai.com/v1")]
    pub llm_api_url: String,

    /// Upper bound on generated tokens per reply
    #[arg(long, env = "FRIDGECIPE_LLM_MAX_TOKENS", default_value_t = 300)]
    pub llm_max_tokens: u32,

    /// Per-request timeout for the completion endpoint, in seconds
    #[arg(long, env = "FRIDGECIPE_LLM_TIMEOUT_SECS", default_value_t = 120)]
    pub llm_timeout_secs: u64,

    /// Sessions untouched for this many seconds are dropped
    #[arg(long, env = "FRIDGECIPE_SESSION_IDLE_SECS", default_value_t = 3600)]
    pub session_idle_secs: u64,

    /// Upper bound on live sessions; the least recently used one goes first
    #[arg(long, env = "FRIDGECIPE_MAX_SESSIONS", default_value_t = 1000)]
    pub max_sessions: usize,

    /// Instruction sent alongside the photo
    #[arg(long, env = "FRIDGECIPE_ANALYSIS_PROMPT", default_value = DEFAULT_ANALYSIS_PROMPT)]
    pub analysis_prompt: String,
}

pub const DEFAULT_ANALYSIS_PROMPT: &str = "You are a chef. Look at this photo and list every \
ingredient or food you can see as a bulleted list. Then propose a detailed recipe that uses \
those ingredients, with quantities and numbered steps.";

impl Config {
    #[must_use]
    pub fn verbosity_delta(&self) -> i16 {
        i16::from(self.verbose) - i16::from(self.quiet)
    }

    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity_delta() {
            d if d <= -2 => "error",
            -1 => "warn",
            0 => "info,fridgecipe=info,axum=info,tower_http=info",
            1 => "debug,fridgecipe=debug,axum=info,tower_http=info,reqwest=info",
            2 => "trace,fridgecipe=trace,axum=debug,tower_http=trace,hyper=info",
            _ => "trace,fridgecipe=trace,axum=trace,tower_http=trace,hyper=debug",
        }
    }

    #[must_use]
    pub const fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    #[must_use]
    pub const fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    /// Whether a non-blank API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.llm_api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
    }
}
