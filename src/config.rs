use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use thiserror::Error;

use crate::pipeline::models::MAX_SCORE;
use crate::pipeline::stages::QualityPolicy;
use crate::util::retry::RetryConfig;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    http_bind: SocketAddr,
    llm_base_url: String,
    llm_api_key: Option<String>,
    llm_model: String,
    llm_request_timeout: Duration,
    http_max_retries: usize,
    http_backoff_base_ms: u64,
    http_backoff_cap_ms: u64,
    quality_threshold: u8,
    max_regenerations: u32,
    pipeline_run_timeout: Duration,
    otel_exporter_endpoint: Option<String>,
    otel_sampling_ratio: f64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数からコンテンツパイプラインの設定値を読み込み、検証する。
    ///
    /// # Errors
    /// `LLM_BASE_URL` が未設定、もしくは各種値のパースに失敗した場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_bind = parse_or(
            "CONTENT_PIPELINE_HTTP_BIND",
            SocketAddr::from(([0, 0, 0, 0], 5000)),
        )?;

        // LLM endpoint (OpenAI compatible)
        let llm_base_url = env_var("LLM_BASE_URL")?;
        let llm_api_key = env::var("LLM_API_KEY").ok().filter(|key| !key.is_empty());
        let llm_model = env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-5-nano".to_string());
        let llm_request_timeout = parse_duration_secs("LLM_REQUEST_TIMEOUT_SECS", 120)?;

        // Retry settings (exponential backoff + jitter)
        let http_max_retries = parse_or("HTTP_MAX_RETRIES", 3_usize)?;
        let http_backoff_base_ms = parse_or("HTTP_BACKOFF_BASE_MS", 250_u64)?;
        let http_backoff_cap_ms = parse_or("HTTP_BACKOFF_CAP_MS", 10_000_u64)?;

        // Quality gate
        let defaults = QualityPolicy::default();
        let quality_threshold = parse_score("QUALITY_THRESHOLD", defaults.threshold)?;
        let max_regenerations = parse_or("MAX_REGENERATIONS", defaults.max_regenerations)?;
        let pipeline_run_timeout = parse_duration_secs("PIPELINE_RUN_TIMEOUT_SECS", 600)?;

        // OpenTelemetry settings
        let otel_exporter_endpoint = env::var("OTEL_EXPORTER_ENDPOINT").ok();
        let otel_sampling_ratio = parse_or("OTEL_SAMPLING_RATIO", 1.0_f64)?;

        Ok(Self {
            http_bind,
            llm_base_url,
            llm_api_key,
            llm_model,
            llm_request_timeout,
            http_max_retries,
            http_backoff_base_ms,
            http_backoff_cap_ms,
            quality_threshold,
            max_regenerations,
            pipeline_run_timeout,
            otel_exporter_endpoint,
            otel_sampling_ratio,
        })
    }

    #[must_use]
    pub fn http_bind(&self) -> SocketAddr {
        self.http_bind
    }

    #[must_use]
    pub fn llm_base_url(&self) -> &str {
        &self.llm_base_url
    }

    #[must_use]
    pub fn llm_api_key(&self) -> Option<&str> {
        self.llm_api_key.as_deref()
    }

    #[must_use]
    pub fn llm_model(&self) -> &str {
        &self.llm_model
    }

    #[must_use]
    pub fn llm_request_timeout(&self) -> Duration {
        self.llm_request_timeout
    }

    #[must_use]
    pub fn http_max_retries(&self) -> usize {
        self.http_max_retries
    }

    #[must_use]
    pub fn http_backoff_base_ms(&self) -> u64 {
        self.http_backoff_base_ms
    }

    #[must_use]
    pub fn http_backoff_cap_ms(&self) -> u64 {
        self.http_backoff_cap_ms
    }

    /// HTTP 再試行ポリシー。`HTTP_MAX_RETRIES` は初回を除いた再試行回数。
    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(
            self.http_max_retries.saturating_add(1),
            self.http_backoff_base_ms,
            self.http_backoff_cap_ms,
        )
    }

    #[must_use]
    pub fn quality_threshold(&self) -> u8 {
        self.quality_threshold
    }

    #[must_use]
    pub fn max_regenerations(&self) -> u32 {
        self.max_regenerations
    }

    #[must_use]
    pub fn quality_policy(&self) -> QualityPolicy {
        QualityPolicy::new(self.quality_threshold, self.max_regenerations)
    }

    #[must_use]
    pub fn pipeline_run_timeout(&self) -> Duration {
        self.pipeline_run_timeout
    }

    #[must_use]
    pub fn otel_exporter_endpoint(&self) -> Option<&str> {
        self.otel_exporter_endpoint.as_deref()
    }

    #[must_use]
    pub fn otel_sampling_ratio(&self) -> f64 {
        self.otel_sampling_ratio
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn invalid(name: &'static str, source: impl Into<anyhow::Error>) -> ConfigError {
    ConfigError::Invalid {
        name,
        source: source.into(),
    }
}

/// 未設定ならデフォルト値、設定済みなら `FromStr` でパースする。
fn parse_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|error| invalid(name, error)),
        Err(_) => Ok(default),
    }
}

fn parse_duration_secs(name: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    match parse_or(name, default_secs)? {
        0 => Err(invalid(name, anyhow::anyhow!("must be greater than zero"))),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn parse_score(name: &'static str, default: u8) -> Result<u8, ConfigError> {
    let score = parse_or(name, default)?;
    if score > MAX_SCORE {
        return Err(invalid(
            name,
            anyhow::anyhow!("value must be between 0 and {MAX_SCORE}"),
        ));
    }
    Ok(score)
}
