use crate::api::CREATOR;
use crate::services::iloveimg::UpscaleResult;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UpscaleEnvelope {
    pub status: bool,
    pub creator: String,
    pub result: UpscaleResult,
}

impl UpscaleEnvelope {
    pub fn success(result: UpscaleResult) -> Self {
        Self {
            status: true,
            creator: CREATOR.to_string(),
            result,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    pub status: bool,
    pub creator: String,
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: false,
            creator: CREATOR.to_string(),
            error: error.into(),
        }
    }
}
