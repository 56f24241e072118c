use crate::error::Result;
use crate::paths;
use crate::promotion::{PromotionPolicy, FALLBACK_MODEL_NAME};
use crate::readiness::{self, PollSettings};
use crate::types::Stage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// TrackingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Tracking server base URI, e.g. `https://dagshub.com/<owner>/<repo>.mlflow`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default = "default_tracking_timeout")]
    pub request_timeout_secs: u64,
}

fn default_tracking_timeout() -> u64 {
    30
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            uri: None,
            request_timeout_secs: default_tracking_timeout(),
        }
    }
}

// ---------------------------------------------------------------------------
// ReadinessConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_health_url")]
    pub url: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_probe_timeout")]
    pub request_timeout_secs: u64,
}

fn default_health_url() -> String {
    readiness::DEFAULT_URL.to_string()
}

fn default_max_attempts() -> u32 {
    readiness::DEFAULT_MAX_ATTEMPTS
}

fn default_interval() -> u64 {
    readiness::DEFAULT_INTERVAL.as_secs()
}

fn default_probe_timeout() -> u64 {
    readiness::DEFAULT_REQUEST_TIMEOUT.as_secs()
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            url: default_health_url(),
            max_attempts: default_max_attempts(),
            interval_secs: default_interval(),
            request_timeout_secs: default_probe_timeout(),
        }
    }
}

impl ReadinessConfig {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            url: self.url.clone(),
            max_attempts: self.max_attempts,
            interval: Duration::from_secs(self.interval_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// PromotionConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionConfig {
    /// Run descriptor written by the training step, relative to the root.
    #[serde(default = "default_run_info")]
    pub run_info: PathBuf,
    #[serde(default = "default_fallback_name")]
    pub fallback_name: String,
    /// Where to write the promotion record, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<PathBuf>,
    #[serde(default = "default_registration_wait")]
    pub registration_wait_secs: u64,
    #[serde(default = "default_registration_poll")]
    pub registration_poll_secs: u64,
}

fn default_run_info() -> PathBuf {
    PathBuf::from(paths::RUN_INFO_FILE)
}

fn default_fallback_name() -> String {
    FALLBACK_MODEL_NAME.to_string()
}

fn default_registration_wait() -> u64 {
    300
}

fn default_registration_poll() -> u64 {
    1
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            run_info: default_run_info(),
            fallback_name: default_fallback_name(),
            record: None,
            registration_wait_secs: default_registration_wait(),
            registration_poll_secs: default_registration_poll(),
        }
    }
}

impl PromotionConfig {
    pub fn policy(&self) -> PromotionPolicy {
        PromotionPolicy {
            fallback_name: self.fallback_name.clone(),
            registration_wait: Duration::from_secs(self.registration_wait_secs),
            registration_poll: Duration::from_secs(self.registration_poll_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// StatusConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_fallback_name")]
    pub model_name: String,
    #[serde(default = "crate::status::default_stages")]
    pub stages: Vec<Stage>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            model_name: default_fallback_name(),
            stages: crate::status::default_stages(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default)]
    pub promotion: PromotionConfig,
    #[serde(default)]
    pub status: StatusConfig,
}

impl Config {
    /// Load `stagehand.yaml` from `root`, or defaults when the file is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level: WarnLevel, message: String| {
            warnings.push(ConfigWarning { level, message });
        };

        // 1. Tracking endpoint
        match self.tracking.uri.as_deref().map(str::trim) {
            None | Some("") => push(
                WarnLevel::Warning,
                "tracking.uri is not set; promote and status need --tracking-uri or MLFLOW_TRACKING_URI"
                    .to_string(),
            ),
            Some(uri) if !is_http(uri) => push(
                WarnLevel::Error,
                format!("tracking.uri '{uri}' must start with http:// or https://"),
            ),
            Some(_) => {}
        }
        if self.tracking.request_timeout_secs == 0 {
            push(
                WarnLevel::Error,
                "tracking.request_timeout_secs must be greater than 0".to_string(),
            );
        }

        // 2. Readiness polling
        if !is_http(&self.readiness.url) {
            push(
                WarnLevel::Error,
                format!(
                    "readiness.url '{}' must start with http:// or https://",
                    self.readiness.url
                ),
            );
        }
        if self.readiness.max_attempts == 0 {
            push(
                WarnLevel::Error,
                "readiness.max_attempts must be at least 1".to_string(),
            );
        }
        if self.readiness.interval_secs == 0 && self.readiness.max_attempts > 1 {
            push(
                WarnLevel::Warning,
                format!(
                    "readiness.interval_secs is 0; {} attempts will run back to back",
                    self.readiness.max_attempts
                ),
            );
        }
        if self.readiness.request_timeout_secs == 0 {
            push(
                WarnLevel::Error,
                "readiness.request_timeout_secs must be greater than 0".to_string(),
            );
        }

        // 3. Promotion policy
        if self.promotion.fallback_name.trim().is_empty() {
            push(
                WarnLevel::Warning,
                "promotion.fallback_name is empty; the fallback artifact is disabled".to_string(),
            );
        }
        if self.promotion.registration_wait_secs > 0 && self.promotion.registration_poll_secs == 0 {
            push(
                WarnLevel::Warning,
                "promotion.registration_poll_secs is 0; registration status is polled without pause"
                    .to_string(),
            );
        }

        // 4. Status check
        if self.status.stages.is_empty() {
            push(
                WarnLevel::Warning,
                "status.stages is empty; the registry returns the latest version of every stage"
                    .to_string(),
            );
        }

        warnings
    }
}

fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
