//! iLoveIMG upscaling client.
//!
//! One upscale is three strictly sequential calls:
//!
//! 1. `GET` the landing page and scrape a bearer token and task id.
//! 2. `POST` the image as a single-chunk multipart upload.
//! 3. `POST` the process request and check for [`TASK_SUCCESS`].
//!
//! The first failing phase aborts the sequence. Nothing is retried.

mod session;
mod types;

pub use session::SessionScraper;
pub use types::{InvalidMultiplier, Multiplier, SessionCredentials, TASK_SUCCESS, UpscaleResult};

use crate::config::IloveImgConfig;
use crate::services::upscaler::{UpscaleError, Upscaler};
use anyhow::Result;
use reqwest::header::ORIGIN;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};
use types::{ProcessResponse, UploadResponse};

pub struct IloveImgClient {
    http: reqwest::Client,
    scraper: SessionScraper,
    config: IloveImgConfig,
}

impl IloveImgClient {
    pub fn new(config: IloveImgConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http,
            scraper: SessionScraper::new()?,
            config,
        })
    }

    pub fn config(&self) -> &IloveImgConfig {
        &self.config
    }

    /// Phase 1: scrape session credentials from the landing page
    pub async fn acquire_session(&self) -> Result<SessionCredentials, UpscaleError> {
        let response = self
            .http
            .get(&self.config.landing_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| UpscaleError::Session(e.to_string()))?;

        let html = response
            .text()
            .await
            .map_err(|e| UpscaleError::Session(e.to_string()))?;

        let credentials = self.scraper.scrape(&html)?;
        debug!("Acquired iLoveIMG session for task {}", credentials.task_id);
        Ok(credentials)
    }

    /// Phase 2: upload the file as chunk 0 of 1, returning the server filename
    pub async fn upload(
        &self,
        session: &SessionCredentials,
        path: &Path,
        filename: &str,
    ) -> Result<String, UpscaleError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| UpscaleError::Upload(format!("cannot open staged image: {}", e)))?;
        let size = file
            .metadata()
            .await
            .map_err(|e| UpscaleError::Upload(format!("cannot stat staged image: {}", e)))?
            .len();

        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let file_part = Part::stream_with_length(body, size).file_name(filename.to_string());

        let form = Form::new()
            .text("name", filename.to_string())
            .text("chunk", "0")
            .text("chunks", "1")
            .text("task", session.task_id.clone())
            .text("preview", "1")
            .text("v", self.config.version_tag.clone())
            .part("file", file_part);

        let response = self
            .http
            .post(&self.config.upload_url)
            .bearer_auth(&session.token)
            .multipart(form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| UpscaleError::Upload(e.to_string()))?;

        let payload: UploadResponse = response
            .json()
            .await
            .map_err(|e| UpscaleError::Upload(format!("unexpected response: {}", e)))?;

        let server_filename = payload
            .server_filename
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                UpscaleError::Upload("response did not include server_filename".to_string())
            })?;

        debug!(
            "Uploaded {} ({} bytes) as {} for task {}",
            filename, size, server_filename, session.task_id
        );
        Ok(server_filename)
    }

    /// Phase 3: trigger the upscale and return the output filename
    pub async fn process(
        &self,
        session: &SessionCredentials,
        server_filename: &str,
        filename: &str,
        multiplier: Multiplier,
    ) -> Result<String, UpscaleError> {
        let form = Form::new()
            .text("packaged_filename", self.config.packaged_filename.clone())
            .text("multiplier", multiplier.as_str())
            .text("task", session.task_id.clone())
            .text("tool", self.config.tool.clone())
            .text("files[0][server_filename]", server_filename.to_string())
            .text("files[0][filename]", filename.to_string());

        let response = self
            .http
            .post(&self.config.process_url)
            .bearer_auth(&session.token)
            .header(ORIGIN, &self.config.origin)
            .multipart(form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| UpscaleError::Process(e.to_string()))?;

        let payload: ProcessResponse = response
            .json()
            .await
            .map_err(|e| UpscaleError::Process(format!("unexpected response: {}", e)))?;

        match payload.status.as_deref() {
            Some(TASK_SUCCESS) => {}
            Some(status) => {
                return Err(UpscaleError::Process(format!("status {}", status)));
            }
            None => {
                return Err(UpscaleError::Process(
                    "response did not include a status".to_string(),
                ));
            }
        }

        payload
            .download_filename
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                UpscaleError::Process("response did not include download_filename".to_string())
            })
    }
}

#[async_trait::async_trait]
impl Upscaler for IloveImgClient {
    async fn upscale(
        &self,
        path: &Path,
        filename: &str,
        multiplier: Option<Multiplier>,
    ) -> Result<UpscaleResult, UpscaleError> {
        let multiplier = multiplier.unwrap_or(self.config.multiplier);

        let session = self.acquire_session().await?;
        let server_filename = self.upload(&session, path, filename).await?;
        let output_name = self
            .process(&session, &server_filename, filename, multiplier)
            .await?;

        info!(
            "✨ Task {} upscaled {} at {}x -> {}",
            session.task_id, filename, multiplier, output_name
        );

        Ok(UpscaleResult {
            status: true,
            download_url: self.config.download_url(&session.task_id),
            job_id: session.task_id,
            output_name,
        })
    }
}
