//! HTTP transport: `POST /api/compress`.
//!
//! Accepts `multipart/form-data` with any number of `images` file parts and an
//! optional `options` text part holding the JSON options payload. Answers with
//! the compressed file, a zip archive, or a `{error, details}` JSON envelope.

use crate::batch::{BatchExecutor, SourceImage};
use crate::codec::Codec;
use crate::config::AppConfig;
use crate::error::{CompressionError, Result};
use crate::options::CompressionOptions;
use crate::response::ErrorResponse;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::extract::Multipart;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// Response header carrying how many uploaded images were skipped.
pub const FAILED_IMAGES_HEADER: HeaderName = HeaderName::from_static("x-failed-images");

const IMAGES_FIELD: &str = "images";
const OPTIONS_FIELD: &str = "options";

pub fn router<C: Codec + 'static>(executor: BatchExecutor<C>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/compress", post(compress_images::<C>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(executor))
}

pub async fn serve<C: Codec + 'static>(config: &AppConfig, executor: BatchExecutor<C>) -> Result<()> {
    let app = router(executor, config.server.max_upload_bytes);
    let addr = config.server_address();
    let listener = TcpListener::bind(&addr).await?;

    info!(%addr, workers = config.batch.workers, "listening");
    println!("🚀 Compression API running at http://{}/api/compress", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Maps a [`CompressionError`] onto a status code and the JSON envelope.
#[derive(Debug)]
pub struct ApiError(CompressionError);

impl From<CompressionError> for ApiError {
    fn from(err: CompressionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "compression request failed");
        } else {
            warn!(status = status.as_u16(), error = %self.0, "compression request rejected");
        }
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

struct Upload {
    images: Vec<SourceImage>,
    options: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload> {
    let invalid = |e: axum_extra::extract::multipart::MultipartError| {
        CompressionError::InvalidUpload(e.to_string())
    };

    let mut upload = Upload {
        images: Vec::new(),
        options: None,
    };
    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some(IMAGES_FIELD) => {
                // Text parts under `images` are not files.
                let Some(name) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let bytes = field.bytes().await.map_err(invalid)?;
                upload.images.push(SourceImage::new(name, bytes.to_vec()));
            }
            Some(OPTIONS_FIELD) => {
                upload.options = Some(field.text().await.map_err(invalid)?);
            }
            _ => {}
        }
    }
    Ok(upload)
}

async fn compress_images<C: Codec + 'static>(
    State(executor): State<Arc<BatchExecutor<C>>>,
    multipart: Multipart,
) -> std::result::Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;
    let options = CompressionOptions::from_json(upload.options.as_deref().unwrap_or_default())?;
    if upload.images.is_empty() {
        return Err(CompressionError::NoImagesSupplied.into());
    }

    info!(
        files = upload.images.len(),
        output_format = %options.output_format(),
        "compression request"
    );

    let report = tokio::task::spawn_blocking(move || executor.run(&upload.images, &options))
        .await
        .map_err(|e| CompressionError::WorkerPool(e.to_string()))??;

    let failed = report.failures.len();
    let response = report.into_response()?;
    info!(
        filename = response.filename(),
        bytes = response.bytes().len(),
        failed,
        "compression request finished"
    );

    let headers = [
        (header::CONTENT_TYPE, response.content_type().to_string()),
        (header::CONTENT_DISPOSITION, response.content_disposition()),
        (FAILED_IMAGES_HEADER, failed.to_string()),
    ];
    Ok((StatusCode::OK, headers, response.into_bytes()).into_response())
}
