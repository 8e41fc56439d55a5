use crate::services::iloveimg::{Multiplier, UpscaleResult};
use std::path::Path;
use thiserror::Error;

/// Failure of one phase of the upscale sequence
#[derive(Error, Debug)]
pub enum UpscaleError {
    /// Token or task id could not be obtained
    #[error("Failed to start iLoveIMG session: {0}")]
    Session(String),

    /// Upload call failed or returned no server filename
    #[error("Failed to upload image to iLoveIMG: {0}")]
    Upload(String),

    /// Process call failed or did not report success
    #[error("Processing failed on the iLoveIMG server: {0}")]
    Process(String),
}

/// Trait for remote upscaling implementations
#[async_trait::async_trait]
pub trait Upscaler: Send + Sync {
    /// Upscale the image at `path`, presenting it to the remote service as `filename`
    async fn upscale(
        &self,
        path: &Path,
        filename: &str,
        multiplier: Option<Multiplier>,
    ) -> Result<UpscaleResult, UpscaleError>;
}
