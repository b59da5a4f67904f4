use std::time::Duration;

pub const SERVICE_NAME: &str = "Gemini Chatbot API";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_CHAT_HISTORY_LIMIT: usize = 20;
pub const DEFAULT_STATIC_DIR: &str = "public";
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 5;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant for PROJECT TOMaS (Tactical Overlay for Mapping and Safety), a flood mapping and analysis system. \
You help users understand flood data, minimum needs, household information, and provide guidance on using the application. \
Be concise, helpful, and focus on flood-related queries and application usage.";
pub const SYSTEM_PROMPT_ACK: &str =
    "I understand. I will help users with PROJECT TOMaS flood mapping and analysis questions.";

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

pub fn server_port() -> u16 {
    non_empty_env("PORT")
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

/// `None` when the key is unset; chat requests then fail with a configuration error.
pub fn gemini_api_key() -> Option<String> {
    non_empty_env("GEMINI_API_KEY")
}

pub fn gemini_model() -> String {
    non_empty_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_owned())
}

pub fn gemini_api_base() -> String {
    non_empty_env("GEMINI_API_BASE")
        .map(|value| value.trim_end_matches('/').to_owned())
        .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_owned())
}

/// `None` means any origin.
pub fn allowed_origin() -> Option<String> {
    non_empty_env("ALLOWED_ORIGIN").filter(|value| value != "*")
}

pub fn chat_history_limit() -> usize {
    non_empty_env("CHAT_HISTORY_LIMIT")
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_CHAT_HISTORY_LIMIT)
}

pub fn static_dir() -> String {
    non_empty_env("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_owned())
}

/// Error bodies carry upstream details only in development.
pub fn expose_error_details() -> bool {
    non_empty_env("APP_ENV")
        .map(|value| value.eq_ignore_ascii_case("development"))
        .unwrap_or(false)
}

pub fn upstream_http_timeout() -> Duration {
    std::env::var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}

/// Settings read once at startup.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub history_limit: usize,
    pub expose_error_details: bool,
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: gemini_api_key(),
            model: gemini_model(),
            api_base: gemini_api_base(),
            history_limit: chat_history_limit(),
            expose_error_details: expose_error_details(),
        }
    }
}
