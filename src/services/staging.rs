use crate::api::error::AppError;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

const SNIFF_LEN: usize = 512;

/// Scoped temporary storage for uploaded images.
///
/// Every staged file gets a unique name inside `dir`, so concurrent requests
/// never share a path.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
    max_file_size: usize,
}

/// An uploaded image materialized on local disk for the duration of one request.
///
/// The file is removed by [`StagedImage::discard`] or, on early exits, when
/// the value is dropped.
#[derive(Debug)]
pub struct StagedImage {
    path: TempPath,
    original_filename: String,
    size: u64,
    mime_type: Option<String>,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>, max_file_size: usize) -> Self {
        Self {
            dir: dir.into(),
            max_file_size,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Stream `reader` into a fresh file in the staging directory.
    ///
    /// Returns `Ok(None)` when the stream is empty.
    pub async fn stage(
        &self,
        original_filename: &str,
        mut reader: impl AsyncRead + Unpin + Send,
    ) -> Result<Option<StagedImage>, AppError> {
        let temp_file = tempfile::Builder::new()
            .prefix("upscale-")
            .tempfile_in(&self.dir)
            .map_err(|e| AppError::Internal(format!("Cannot create staging file: {}", e)))?;

        let std_file = temp_file
            .reopen()
            .map_err(|e| AppError::Internal(format!("Cannot open staging file: {}", e)))?;
        // From here on the path is removed whenever `path` is dropped.
        let path = temp_file.into_temp_path();
        let mut file = tokio::fs::File::from_std(std_file);

        let mut header = Vec::with_capacity(SNIFF_LEN);
        let mut buffer = [0u8; 8192];
        let mut total_size: u64 = 0;

        loop {
            let n = reader
                .read(&mut buffer)
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
            if n == 0 {
                break;
            }

            total_size += n as u64;
            if total_size > self.max_file_size as u64 {
                return Err(AppError::PayloadTooLarge(format!(
                    "Image exceeds the maximum allowed size of {} bytes",
                    self.max_file_size
                )));
            }

            if header.len() < SNIFF_LEN {
                let take = (SNIFF_LEN - header.len()).min(n);
                header.extend_from_slice(&buffer[..take]);
            }

            file.write_all(&buffer[..n])
                .await
                .map_err(|e| AppError::Internal(format!("Cannot write staging file: {}", e)))?;
        }

        file.flush()
            .await
            .map_err(|e| AppError::Internal(format!("Cannot write staging file: {}", e)))?;

        if total_size == 0 {
            return Ok(None);
        }

        let mime_type = infer::get(&header).map(|kind| kind.mime_type().to_string());

        Ok(Some(StagedImage {
            path,
            original_filename: original_filename.to_string(),
            size: total_size,
            mime_type,
        }))
    }
}

impl StagedImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Content type sniffed from the leading bytes, if recognized
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Delete the staged file. A file that is already gone is not an error.
    pub fn discard(self) -> io::Result<()> {
        match self.path.close() {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
