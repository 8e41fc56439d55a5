use crate::AppState;
use crate::api::envelope::{ErrorEnvelope, UpscaleEnvelope};
use crate::api::error::AppError;
use crate::services::iloveimg::Multiplier;
use crate::services::staging::StagedImage;
use crate::utils::validation::{check_image_payload, sanitize_filename};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

/// Multipart form accepted by `POST /upscale` (documentation only)
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UpscaleForm {
    /// Image to upscale
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
    /// Magnification factor, 2 or 4
    multiplier: Option<u8>,
}

#[derive(Default)]
struct ParsedForm {
    image: Option<StagedImage>,
    /// Raw `multiplier` text, parsed only once an image is known to be present
    multiplier: Option<String>,
}

#[utoipa::path(
    post,
    path = "/upscale",
    request_body(content = UpscaleForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image upscaled", body = UpscaleEnvelope),
        (status = 400, description = "Missing or invalid image field", body = ErrorEnvelope),
        (status = 413, description = "Image too large", body = ErrorEnvelope),
        (status = 500, description = "Remote processing failed", body = ErrorEnvelope),
        (status = 502, description = "Remote session or upload failed", body = ErrorEnvelope),
        (status = 504, description = "Deadline exceeded", body = ErrorEnvelope)
    ),
    tag = "upscale"
)]
pub async fn upscale_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UpscaleEnvelope>, AppError> {
    let mut multipart = multipart.map_err(|e| {
        debug!("Rejected non-multipart upscale request: {}", e);
        AppError::missing_image()
    })?;

    let mut form = ParsedForm::default();
    if let Err(e) = read_form(&state, &mut multipart, &mut form).await {
        // Drain the rest of the body so the client sees our response instead of a reset
        warn!("Upscale request rejected early: {}. Consuming remaining stream...", e);
        while let Ok(Some(mut field)) = multipart.next_field().await {
            while let Ok(Some(_)) = field.chunk().await {}
        }
        return Err(match e {
            AppError::BadRequest(_) if form.image.is_none() => AppError::missing_image(),
            other => other,
        });
    }

    let image = form.image.ok_or_else(AppError::missing_image)?;
    let multiplier = parse_multiplier(form.multiplier.as_deref())?;
    check_image_payload(&image)?;

    info!(
        "🖼️  Upscaling {} ({} bytes, {})",
        image.original_filename(),
        image.size(),
        image.mime_type().unwrap_or("unknown type")
    );

    let outcome = tokio::time::timeout(
        state.config.request_deadline,
        state
            .upscaler
            .upscale(image.path(), image.original_filename(), multiplier),
    )
    .await;

    // The staged file must be gone before the response leaves
    if let Err(e) = image.discard() {
        warn!("Failed to remove staged upload: {}", e);
    }

    let result = match outcome {
        Ok(result) => result?,
        Err(_) => {
            return Err(AppError::Timeout(format!(
                "Upscale did not finish within {} seconds",
                state.config.request_deadline.as_secs_f64()
            )));
        }
    };

    Ok(Json(UpscaleEnvelope::success(result)))
}

async fn read_form(
    state: &AppState,
    multipart: &mut Multipart,
    form: &mut ParsedForm,
) -> Result<(), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        let err_msg = e.to_string();
        if err_msg.contains("length limit exceeded") {
            AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
        } else {
            AppError::BadRequest(err_msg)
        }
    })? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "image" {
            if form.image.is_some() {
                return Err(AppError::Validation(
                    "Only one 'image' field is allowed".to_string(),
                ));
            }

            let filename = sanitize_filename(field.file_name().unwrap_or_default());
            let reader = StreamReader::new(field.map_err(std::io::Error::other));
            form.image = state.staging.stage(&filename, reader).await?;
        } else if name == "multiplier" {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.multiplier = Some(text);
        } else {
            debug!("Ignoring unexpected multipart field '{}'", name);
        }
    }

    Ok(())
}

fn parse_multiplier(raw: Option<&str>) -> Result<Option<Multiplier>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<Multiplier>()
            .map(Some)
            .map_err(|e| AppError::Validation(e.to_string())),
    }
}
