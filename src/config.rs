use std::{env, time::Duration};

use thiserror::Error;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

/// Which decision-rule variant drives the eligibility verdict.
///
/// 単純ルール版と加重スコア版が並存しているため、設定で片方を選択する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    HardRule,
    #[default]
    Weighted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    vision_api_base_url: String,
    vision_api_key: String,
    vision_model: String,
    http_connect_timeout: Duration,
    parallel_deadline: Duration,
    multi_image_deadline: Duration,
    image_max_edge: u32,
    image_jpeg_quality: u8,
    decision_strategy: StrategyKind,
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
    /// 環境変数からトリアージワーカーの設定値を読み込み、検証する。
    ///
    /// # Errors
    /// `VISION_API_BASE_URL` / `VISION_API_KEY` が未設定、もしくは各種値の
    /// パースに失敗した場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let vision_api_base_url = env_var("VISION_API_BASE_URL")?;
        let vision_api_key = env_var("VISION_API_KEY")?;
        let vision_model = env::var("VISION_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let http_connect_timeout = parse_duration_ms("HTTP_CONNECT_TIMEOUT_MS", 3000)?;

        // Shared deadline for the concurrent classification attempt. When it
        // expires the orchestrator demotes the whole batch to sequential calls.
        let parallel_deadline = parse_duration_secs("CLASSIFY_PARALLEL_DEADLINE_SECS", 30)?;
        let multi_image_deadline = parse_duration_secs("CLASSIFY_MULTI_IMAGE_DEADLINE_SECS", 90)?;

        let image_max_edge = parse_u32("IMAGE_MAX_EDGE", 512)?;
        let image_jpeg_quality = parse_quality("IMAGE_JPEG_QUALITY", 85)?;

        let decision_strategy = parse_strategy("DECISION_STRATEGY", StrategyKind::Weighted)?;

        Ok(Self {
            vision_api_base_url,
            vision_api_key,
            vision_model,
            http_connect_timeout,
            parallel_deadline,
            multi_image_deadline,
            image_max_edge,
            image_jpeg_quality,
            decision_strategy,
        })
    }

    #[must_use]
    pub fn vision_api_base_url(&self) -> &str {
        &self.vision_api_base_url
    }

    #[must_use]
    pub fn vision_api_key(&self) -> &str {
        &self.vision_api_key
    }

    #[must_use]
    pub fn vision_model(&self) -> &str {
        &self.vision_model
    }

    #[must_use]
    pub fn http_connect_timeout(&self) -> Duration {
        self.http_connect_timeout
    }

    /// Deadline for the concurrent attempt when a single image is supplied.
    #[must_use]
    pub fn parallel_deadline(&self) -> Duration {
        self.parallel_deadline
    }

    /// Deadline for the concurrent attempt in multi-angle mode.
    #[must_use]
    pub fn multi_image_deadline(&self) -> Duration {
        self.multi_image_deadline
    }

    #[must_use]
    pub fn image_max_edge(&self) -> u32 {
        self.image_max_edge
    }

    #[must_use]
    pub fn image_jpeg_quality(&self) -> u8 {
        self.image_jpeg_quality
    }

    #[must_use]
    pub fn decision_strategy(&self) -> StrategyKind {
        self.decision_strategy
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_duration_secs(name: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    let value = parse_u64(name, default_secs)?;
    Ok(Duration::from_secs(value))
}

fn parse_duration_ms(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let ms = parse_u64(name, default_ms)?;
    Ok(Duration::from_millis(ms))
}

fn parse_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u32>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_quality(name: &'static str, default: u8) -> Result<u8, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.parse::<u8>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    if !(1..=100).contains(&parsed) {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("value must be between 1 and 100"),
        });
    }
    Ok(parsed)
}

fn parse_strategy(name: &'static str, default: StrategyKind) -> Result<StrategyKind, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };
    match raw.to_lowercase().as_str() {
        "hard-rule" | "hard_rule" => Ok(StrategyKind::HardRule),
        "weighted" => Ok(StrategyKind::Weighted),
        _ => Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("expected \"hard-rule\" or \"weighted\", got {raw:?}"),
        }),
    }
}
