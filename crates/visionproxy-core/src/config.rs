//! Configuration module
//!
//! Settings are read from the environment (a `.env` file is honoured) into typed
//! sections: server/database basics, clip extraction, the caption service and
//! the generation pipeline.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// Common constants
const SERVER_PORT: u16 = 8000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const YTDLP: &str = "yt-dlp";
const CLIP_CRF: u8 = 28;
const CLIP_PRESET: &str = "veryfast";
const EXTRACT_TIMEOUT_FACTOR: f64 = 10.0;
const EXTRACT_TIMEOUT_FLOOR_SECS: u64 = 60;
const CAPTION_MAX_NEW_TOKENS: u32 = 60;
const CAPTION_TIMEOUT_SECS: u64 = 120;
const CAPTION_ANSWER_MARKER: &str = "ASSISTANT:";
const PIPELINE_MAX_CONCURRENCY: usize = 2;
const PIPELINE_CONCURRENCY_CEILING: usize = 4;
const PIPELINE_RETRY_BACKOFF_MS: u64 = 1000;

/// Server and database settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub log_format: String,
}

/// External media-extraction settings
#[derive(Clone, Debug)]
pub struct ClipConfig {
    pub ffmpeg_path: String,
    /// When set, watch URLs are resolved to a direct media URL with yt-dlp first.
    /// Defaults to `yt-dlp` on the PATH; ffmpeg cannot read watch pages itself.
    pub ytdlp_path: Option<String>,
    /// Root under which every extraction gets its own temporary directory.
    pub scratch_dir: PathBuf,
    pub crf: u8,
    pub preset: String,
    /// Extraction may take this many times the clip length...
    pub timeout_factor: f64,
    /// ...but never less than this.
    pub timeout_floor_secs: u64,
}

/// Caption inference service settings
#[derive(Clone, Debug)]
pub struct CaptionConfig {
    pub service_url: String,
    pub api_key: Option<String>,
    pub max_new_tokens: u32,
    pub timeout_secs: u64,
    pub answer_marker: String,
}

/// Generation pipeline settings
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub max_concurrency: usize,
    pub retry_backoff_ms: u64,
}

impl PipelineConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: PIPELINE_MAX_CONCURRENCY,
            retry_backoff_ms: PIPELINE_RETRY_BACKOFF_MS,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub clip: ClipConfig,
    pub caption: CaptionConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "text".to_string())
                .to_lowercase(),
        };

        let clip = ClipConfig {
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ytdlp_path: resolver_path(env::var("YTDLP_PATH").ok()),
            scratch_dir: env::var("CLIP_SCRATCH_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            crf: env_or("CLIP_CRF", CLIP_CRF),
            preset: env::var("CLIP_PRESET").unwrap_or_else(|_| CLIP_PRESET.to_string()),
            timeout_factor: env_or("EXTRACT_TIMEOUT_FACTOR", EXTRACT_TIMEOUT_FACTOR),
            timeout_floor_secs: env_or("EXTRACT_TIMEOUT_FLOOR_SECS", EXTRACT_TIMEOUT_FLOOR_SECS),
        };

        let caption = CaptionConfig {
            service_url: env::var("CAPTION_SERVICE_URL")
                .map_err(|_| anyhow::anyhow!("CAPTION_SERVICE_URL must be set"))?,
            api_key: env::var("CAPTION_API_KEY").ok().filter(|s| !s.is_empty()),
            max_new_tokens: env_or("CAPTION_MAX_NEW_TOKENS", CAPTION_MAX_NEW_TOKENS),
            timeout_secs: env_or("CAPTION_TIMEOUT_SECS", CAPTION_TIMEOUT_SECS),
            answer_marker: env::var("CAPTION_ANSWER_MARKER")
                .unwrap_or_else(|_| CAPTION_ANSWER_MARKER.to_string()),
        };

        let pipeline = PipelineConfig {
            max_concurrency: clamp_concurrency(env_or(
                "PIPELINE_MAX_CONCURRENCY",
                PIPELINE_MAX_CONCURRENCY,
            )),
            retry_backoff_ms: env_or("PIPELINE_RETRY_BACKOFF_MS", PIPELINE_RETRY_BACKOFF_MS),
        };

        let config = Config {
            base,
            clip,
            caption,
            pipeline,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.base.database_url.starts_with("postgres://")
            || self.base.database_url.starts_with("postgresql://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.is_production() && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if !(self.caption.service_url.starts_with("http://")
            || self.caption.service_url.starts_with("https://"))
        {
            return Err(anyhow::anyhow!(
                "CAPTION_SERVICE_URL must be an http(s) URL"
            ));
        }

        if self.caption.answer_marker.trim().is_empty() {
            return Err(anyhow::anyhow!("CAPTION_ANSWER_MARKER cannot be empty"));
        }

        if self.clip.timeout_factor <= 0.0 {
            return Err(anyhow::anyhow!("EXTRACT_TIMEOUT_FACTOR must be positive"));
        }

        if self.clip.crf > 51 {
            return Err(anyhow::anyhow!("CLIP_CRF must be between 0 and 51"));
        }

        Ok(())
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

/// Parse an environment variable, falling back to `default` when unset or invalid.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// yt-dlp unless explicitly disabled with `none` (for sources ffmpeg can open
/// directly).
fn resolver_path(raw: Option<String>) -> Option<String> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Some(YTDLP.to_string()),
        Some(value) if value.eq_ignore_ascii_case("none") => None,
        Some(value) => Some(value.to_string()),
    }
}

/// Blockers are CPU/GPU heavy; keep the per-run worker count small.
pub fn clamp_concurrency(requested: usize) -> usize {
    requested.clamp(1, PIPELINE_CONCURRENCY_CEILING)
}
