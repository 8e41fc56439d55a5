use crate::services::iloveimg::Multiplier;
use anyhow::{Result, anyhow};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Browser identity presented to iLoveIMG on every call.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Request boundary configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum accepted image size in bytes (default: 20 MB)
    pub max_file_size: usize,

    /// Directory where uploaded images are staged for one request
    pub temp_dir: PathBuf,

    /// End-to-end deadline for the whole upscale sequence (default: 120s)
    pub request_deadline: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_file_size: 20 * 1024 * 1024, // 20 MB
            temp_dir: env::temp_dir().join("upscale-uploads"),
            request_deadline: Duration::from_secs(120),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            temp_dir: env::var("UPLOAD_TEMP_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.temp_dir),

            request_deadline: env::var("REQUEST_DEADLINE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(default.request_deadline),
        }
    }
}

/// Endpoints and fixed parameters of the iLoveIMG upscaling service
#[derive(Debug, Clone)]
pub struct IloveImgConfig {
    /// Landing page scraped for the bearer token and task id
    pub landing_url: String,
    pub upload_url: String,
    pub process_url: String,
    /// Download links are `{download_base_url}/{task_id}`
    pub download_base_url: String,
    /// Sent as `Origin` on the process call
    pub origin: String,
    pub user_agent: String,

    /// Default magnification when the caller does not pick one
    pub multiplier: Multiplier,
    pub packaged_filename: String,
    pub tool: String,
    pub version_tag: String,

    /// Timeout applied to each outbound call (default: 60s)
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for IloveImgConfig {
    fn default() -> Self {
        Self {
            landing_url: "https://www.iloveimg.com/id/tingkatkan-gambar".to_string(),
            upload_url: "https://api1g.iloveimg.com/v1/upload".to_string(),
            process_url: "https://api1g.iloveimg.com/v1/process".to_string(),
            download_base_url: "https://api1g.iloveimg.com/v1/download".to_string(),
            origin: "https://www.iloveimg.com".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            multiplier: Multiplier::X2,
            packaged_filename: "ranzz_hd".to_string(),
            tool: "upscaleimage".to_string(),
            version_tag: "web.0".to_string(),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl IloveImgConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            landing_url: env::var("ILOVEIMG_LANDING_URL").unwrap_or(default.landing_url),
            upload_url: env::var("ILOVEIMG_UPLOAD_URL").unwrap_or(default.upload_url),
            process_url: env::var("ILOVEIMG_PROCESS_URL").unwrap_or(default.process_url),
            download_base_url: env::var("ILOVEIMG_DOWNLOAD_URL")
                .unwrap_or(default.download_base_url),
            origin: env::var("ILOVEIMG_ORIGIN").unwrap_or(default.origin),
            user_agent: env::var("UPSCALE_USER_AGENT").unwrap_or(default.user_agent),

            multiplier: env::var("UPSCALE_MULTIPLIER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.multiplier),

            packaged_filename: env::var("UPSCALE_PACKAGED_FILENAME")
                .unwrap_or(default.packaged_filename),
            tool: env::var("UPSCALE_TOOL").unwrap_or(default.tool),
            version_tag: env::var("UPSCALE_VERSION_TAG").unwrap_or(default.version_tag),

            request_timeout: env::var("UPSCALE_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.request_timeout),

            connect_timeout: env::var("UPSCALE_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.connect_timeout),
        }
    }

    /// Reject endpoints that are not absolute http(s) URLs
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("landing_url", &self.landing_url),
            ("upload_url", &self.upload_url),
            ("process_url", &self.process_url),
            ("download_base_url", &self.download_base_url),
            ("origin", &self.origin),
        ] {
            let parsed = url::Url::parse(value)
                .map_err(|e| anyhow!("Invalid {} '{}': {}", name, value, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(anyhow!("Invalid {} '{}': unsupported scheme", name, value));
            }
        }

        if self.request_timeout.is_zero() {
            return Err(anyhow!("request_timeout must be greater than zero"));
        }

        Ok(())
    }

    pub fn download_url(&self, task_id: &str) -> String {
        format!(
            "{}/{}",
            self.download_base_url.trim_end_matches('/'),
            task_id
        )
    }
}
