//! Configuration types for lessoncast

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Trigger API server configuration
///
/// Groups settings for the HTTP surface: bind address, trigger secrets,
/// CORS, Swagger UI, and per-IP rate limiting. Used as a nested sub-config
/// within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8790)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Secret of the scheduled trigger, presented as `Authorization: Bearer`
    #[serde(default)]
    pub cron_secret: Option<String>,

    /// Secret for manual triggers, presented as `X-Api-Secret` or `?secret=`
    #[serde(default)]
    pub api_secret: Option<String>,

    /// Enable CORS for browser access (default: false)
    #[serde(default)]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Per-IP rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cron_secret: None,
            api_secret: None,
            cors_enabled: false,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Per-IP rate limiting configuration for the trigger API
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RateLimitConfig {
    /// Enable rate limiting (default: false)
    #[serde(default)]
    pub enabled: bool,

    /// Requests per second per IP (default: 20)
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Burst size (default: 40)
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,

    /// Endpoints exempt from rate limiting
    #[serde(default = "default_exempt_paths")]
    pub exempt_paths: Vec<String>,

    /// IPs exempt from rate limiting (e.g., localhost)
    #[serde(default = "default_exempt_ips")]
    pub exempt_ips: Vec<std::net::IpAddr>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
            exempt_paths: default_exempt_paths(),
            exempt_ips: default_exempt_ips(),
        }
    }
}

/// Text-generation provider configuration
///
/// The provider speaks an Ollama-compatible generate API:
/// `POST {endpoint}/api/generate` with `{model, prompt, stream: false}`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TextProviderConfig {
    /// Base URL of the generation endpoint (default: http://localhost:11434)
    #[serde(default = "default_text_endpoint")]
    pub endpoint: String,

    /// Model identifier passed on every request (default: "gemma3:12b")
    #[serde(default = "default_text_model")]
    pub model: String,

    /// Optional bearer key for hosted deployments
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds (default: 120)
    #[serde(default = "default_text_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Retries after the initial attempt (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base retry delay in seconds (default: 2)
    #[serde(default = "default_text_base_delay", with = "duration_serde")]
    pub base_delay: Duration,
}

impl Default for TextProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_text_endpoint(),
            model: default_text_model(),
            api_key: None,
            timeout: default_text_timeout(),
            max_retries: default_max_retries(),
            base_delay: default_text_base_delay(),
        }
    }
}

/// Speech-synthesis provider configuration
///
/// The provider speaks a Cloud TTS-compatible API:
/// `POST {endpoint}/text:synthesize` returning base64 `audioContent`.
/// The requests-per-minute ceiling and safety buffer drive the
/// [`RateLimiter`](crate::rate_limit::RateLimiter) spacing.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SpeechProviderConfig {
    /// Base URL of the synthesis endpoint
    #[serde(default = "default_speech_endpoint")]
    pub endpoint: String,

    /// Voice model identifier (default: "gemini-2.5-flash-tts")
    #[serde(default = "default_speech_model")]
    pub model_name: String,

    /// BCP-47 language code of the synthesized speech (default: "en-US")
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Output encoding requested from the provider (default: "MP3")
    #[serde(default = "default_audio_encoding")]
    pub audio_encoding: String,

    /// Per-request timeout in seconds (default: 60)
    #[serde(default = "default_speech_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Retries after the initial attempt (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base retry delay in seconds (default: 1)
    #[serde(default = "default_speech_base_delay", with = "duration_serde")]
    pub base_delay: Duration,

    /// Provider requests-per-minute ceiling (default: 12)
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    /// Extra spacing added on top of the computed inter-call gap, in seconds
    /// (default: 2)
    #[serde(default = "default_rate_buffer", with = "duration_serde")]
    pub rate_buffer: Duration,
}

impl Default for SpeechProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_speech_endpoint(),
            model_name: default_speech_model(),
            language_code: default_language_code(),
            audio_encoding: default_audio_encoding(),
            timeout: default_speech_timeout(),
            max_retries: default_max_retries(),
            base_delay: default_speech_base_delay(),
            requests_per_minute: default_requests_per_minute(),
            rate_buffer: default_rate_buffer(),
        }
    }
}

/// Access-token endpoint configuration for the speech provider
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenProviderConfig {
    /// Token exchange endpoint
    #[serde(default = "default_token_endpoint")]
    pub endpoint: String,

    /// Secret exchanged for short-lived access tokens
    #[serde(default)]
    pub service_secret: Option<String>,

    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_token_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Tokens are refreshed this long before their reported expiry, in
    /// seconds (default: 60)
    #[serde(default = "default_expiry_margin", with = "duration_serde")]
    pub expiry_margin: Duration,
}

impl Default for TokenProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_token_endpoint(),
            service_secret: None,
            timeout: default_token_timeout(),
            expiry_margin: default_expiry_margin(),
        }
    }
}

/// Audio blob store configuration
///
/// The store speaks a Supabase Storage-compatible object API:
/// upload `POST {endpoint}/object/{bucket}/{path}`, public URLs under
/// `{public_base}/{bucket}/{path}`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Base URL of the storage API
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,

    /// Bucket holding lesson audio (default: "lesson-audio")
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Service key presented as a bearer on upload and delete
    #[serde(default)]
    pub service_key: Option<String>,

    /// Base URL for public object links; defaults to
    /// `{endpoint}/object/public` when unset
    #[serde(default)]
    pub public_base: Option<String>,

    /// Per-request timeout in seconds (default: 60)
    #[serde(default = "default_storage_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_storage_endpoint(),
            bucket: default_bucket(),
            service_key: None,
            public_base: None,
            timeout: default_storage_timeout(),
        }
    }
}

/// Run coordination configuration (time budget, pacing, translation targets)
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RunConfig {
    /// Hard execution-time ceiling for a whole run, in seconds (default: 540)
    #[serde(default = "default_execution_ceiling", with = "duration_serde")]
    pub execution_ceiling: Duration,

    /// Slack reserved below the ceiling when projecting whether another
    /// series still fits, in seconds (default: 30)
    #[serde(default = "default_budget_buffer", with = "duration_serde")]
    pub budget_buffer: Duration,

    /// Projected wall time per synthesis call, covering rate-limit spacing,
    /// in seconds (default: 8)
    #[serde(default = "default_synthesis_call_estimate", with = "duration_serde")]
    pub synthesis_call_estimate: Duration,

    /// Pause between consecutive series, in seconds (default: 2)
    #[serde(default = "default_series_pause", with = "duration_serde")]
    pub series_pause: Duration,

    /// Pause between translation languages within a series, in seconds
    /// (default: 1)
    #[serde(default = "default_language_pause", with = "duration_serde")]
    pub language_pause: Duration,

    /// Languages every lesson is translated into unless the trigger
    /// overrides them (default: ["ja"])
    #[serde(default = "default_translation_languages")]
    pub default_translation_languages: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            execution_ceiling: default_execution_ceiling(),
            budget_buffer: default_budget_buffer(),
            synthesis_call_estimate: default_synthesis_call_estimate(),
            series_pause: default_series_pause(),
            language_pause: default_language_pause(),
            default_translation_languages: default_translation_languages(),
        }
    }
}

/// Main configuration for the lesson generator
///
/// Fields are organized into logical sub-configs:
/// - [`server`](ServerConfig) — trigger API surface
/// - [`text`](TextProviderConfig) — text-generation provider
/// - [`speech`](SpeechProviderConfig) — speech-synthesis provider
/// - [`token`](TokenProviderConfig) — speech access-token exchange
/// - [`storage`](StorageConfig) — audio blob store
/// - [`run`](RunConfig) — time budget and pacing
///
/// Every field is defaulted so `Config::default()` yields a working local
/// development setup; [`Config::validate`] checks the cross-field rules.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// SQLite database path (default: "./lessoncast.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Trigger API server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Text-generation provider settings
    #[serde(default)]
    pub text: TextProviderConfig,

    /// Speech-synthesis provider settings
    #[serde(default)]
    pub speech: SpeechProviderConfig,

    /// Access-token exchange settings
    #[serde(default)]
    pub token: TokenProviderConfig,

    /// Audio blob store settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Run coordination settings
    #[serde(default)]
    pub run: RunConfig,

    /// Language code to display name, used when building translation prompts
    #[serde(default = "default_languages")]
    pub languages: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            server: ServerConfig::default(),
            text: TextProviderConfig::default(),
            speech: SpeechProviderConfig::default(),
            token: TokenProviderConfig::default(),
            storage: StorageConfig::default(),
            run: RunConfig::default(),
            languages: default_languages(),
        }
    }
}

impl Config {
    /// Check cross-field rules that serde defaults cannot express
    ///
    /// Rejects a server with no trigger secret at all, a zero
    /// requests-per-minute ceiling, default translation languages missing
    /// from the language map, and endpoints that do not parse as URLs.
    pub fn validate(&self) -> Result<()> {
        if self.server.cron_secret.as_deref().unwrap_or("").is_empty()
            && self.server.api_secret.as_deref().unwrap_or("").is_empty()
        {
            return Err(Error::Config {
                message: "at least one of cron_secret or api_secret must be set".to_string(),
                key: Some("server".to_string()),
            });
        }

        if self.speech.requests_per_minute == 0 {
            return Err(Error::Config {
                message: "requests_per_minute must be greater than zero".to_string(),
                key: Some("speech.requests_per_minute".to_string()),
            });
        }

        for language in &self.run.default_translation_languages {
            if !self.languages.contains_key(language) {
                return Err(Error::Config {
                    message: format!("unknown translation language '{}'", language),
                    key: Some("run.default_translation_languages".to_string()),
                });
            }
        }

        for (key, endpoint) in [
            ("text.endpoint", &self.text.endpoint),
            ("speech.endpoint", &self.speech.endpoint),
            ("token.endpoint", &self.token.endpoint),
            ("storage.endpoint", &self.storage.endpoint),
        ] {
            url::Url::parse(endpoint).map_err(|e| Error::Config {
                message: format!("invalid endpoint URL '{}': {}", endpoint, e),
                key: Some(key.to_string()),
            })?;
        }

        Ok(())
    }

    /// Display name for a language code, falling back to the code itself
    pub fn language_name(&self, code: &str) -> String {
        self.languages
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}

// Default value functions

fn default_database_path() -> PathBuf {
    PathBuf::from("./lessoncast.db")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_true() -> bool {
    true
}

fn default_requests_per_second() -> u32 {
    20
}

fn default_burst_size() -> u32 {
    40
}

fn default_exempt_paths() -> Vec<String> {
    vec![
        "/api/v1/health".to_string(), // Health checks should always work
    ]
}

fn default_exempt_ips() -> Vec<std::net::IpAddr> {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
    vec![
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(Ipv6Addr::LOCALHOST),
    ]
}

fn default_text_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_text_model() -> String {
    "gemma3:12b".to_string()
}

fn default_text_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_max_retries() -> u32 {
    3
}

fn default_text_base_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_speech_endpoint() -> String {
    "https://texttospeech.googleapis.com/v1".to_string()
}

fn default_speech_model() -> String {
    "gemini-2.5-flash-tts".to_string()
}

fn default_language_code() -> String {
    "en-US".to_string()
}

fn default_audio_encoding() -> String {
    "MP3".to_string()
}

fn default_speech_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_speech_base_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_requests_per_minute() -> u32 {
    12
}

fn default_rate_buffer() -> Duration {
    Duration::from_secs(2)
}

fn default_token_endpoint() -> String {
    "http://localhost:8787/token".to_string()
}

fn default_token_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_expiry_margin() -> Duration {
    Duration::from_secs(60)
}

fn default_storage_endpoint() -> String {
    "http://localhost:54321/storage/v1".to_string()
}

fn default_bucket() -> String {
    "lesson-audio".to_string()
}

fn default_storage_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_execution_ceiling() -> Duration {
    Duration::from_secs(540) // 9 minutes
}

fn default_budget_buffer() -> Duration {
    Duration::from_secs(30)
}

fn default_synthesis_call_estimate() -> Duration {
    Duration::from_secs(8)
}

fn default_series_pause() -> Duration {
    Duration::from_secs(2)
}

fn default_language_pause() -> Duration {
    Duration::from_secs(1)
}

fn default_translation_languages() -> Vec<String> {
    vec!["ja".to_string()]
}

fn default_languages() -> HashMap<String, String> {
    [
        ("en", "English"),
        ("ja", "Japanese"),
        ("es", "Spanish"),
        ("fr", "French"),
        ("de", "German"),
        ("ko", "Korean"),
        ("zh", "Chinese"),
    ]
    .into_iter()
    .map(|(code, name)| (code.to_string(), name.to_string()))
    .collect()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
