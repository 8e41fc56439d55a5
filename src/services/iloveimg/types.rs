use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Status literal iLoveIMG returns when a task finished successfully.
pub const TASK_SUCCESS: &str = "TaskSuccess";

/// Magnification factor accepted by the upscale tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Multiplier {
    #[default]
    X2,
    X4,
}

impl Multiplier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Multiplier::X2 => "2",
            Multiplier::X4 => "4",
        }
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMultiplier(pub String);

impl fmt::Display for InvalidMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "multiplier must be 2 or 4, got '{}'", self.0)
    }
}

impl std::error::Error for InvalidMultiplier {}

impl FromStr for Multiplier {
    type Err = InvalidMultiplier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "2" => Ok(Multiplier::X2),
            "4" => Ok(Multiplier::X4),
            other => Err(InvalidMultiplier(other.to_string())),
        }
    }
}

/// Bearer token and task id scraped from the landing page.
///
/// Only lives for one upscale sequence.
#[derive(Clone)]
pub struct SessionCredentials {
    pub token: String,
    pub task_id: String,
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("token", &"<redacted>")
            .field("task_id", &self.task_id)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct UpscaleResult {
    pub status: bool,
    pub job_id: String,
    pub download_url: String,
    pub output_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub server_filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProcessResponse {
    pub status: Option<String>,
    pub download_filename: Option<String>,
}
