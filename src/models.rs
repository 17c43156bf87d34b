use crate::config::Config;
use crate::llm::LlmClient;
use crate::session::SessionRegistry;

/* ---------- App state ---------- */
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub llm: LlmClient,
    pub sessions: SessionRegistry,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let llm = LlmClient::from_config(&config, reqwest::Client::new());
        let sessions = SessionRegistry::with_limits(config.session_idle(), config.max_sessions);
        Self {
            config,
            llm,
            sessions,
        }
    }
}
