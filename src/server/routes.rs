use super::error::ApiError;
use super::models::{
    resolve_quality, CompressFilesRequest, CompressFilesResponse, CompressRequest,
    CompressResponse, DownloadBatchRequest, DownloadBatchResponse, FileEntry, FileFailure,
    FileResult, FileSuccess,
};
use super::AppState;
use crate::error::CompressionError;
use crate::processing::{CompressionRequest, Quality};
use crate::report::{format_savings, CompressionOutcome, JobOutput};
use crate::utils::{decode_image_payload, encode_base64, to_data_uri};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

const INDEX_HTML: &str = include_str!("../../static/index.html");

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/compress", post(compress))
        .route("/api/compress-file", post(compress_files))
        .route("/api/download-batch", post(download_batch))
}

async fn index(State(state): State<AppState>) -> Html<String> {
    if let Some(dir) = &state.static_dir {
        let path = dir.join("index.html");
        match tokio::fs::read_to_string(&path).await {
            Ok(page) => return Html(page),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "falling back to built-in page"),
        }
    }
    Html(INDEX_HTML.to_string())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn compress(
    State(state): State<AppState>,
    payload: Result<Json<CompressRequest>, JsonRejection>,
) -> Result<Json<CompressResponse>, ApiError> {
    let Json(request) = payload?;

    let image_data = request
        .image_data
        .filter(|data| !data.is_empty())
        .ok_or(CompressionError::MissingImageData)?;
    let quality = resolve_quality(request.quality.as_ref())?;
    let bytes = decode_image_payload(&image_data)?;

    let outcome = state
        .aggregator
        .run_one(CompressionRequest::buffer("image", bytes, request.format, quality))
        .await;

    match outcome {
        CompressionOutcome {
            error: None,
            format: Some(format),
            output: Some(JobOutput::Data(data)),
            original_size,
            compressed_size,
            savings_percent,
            ..
        } => Ok(Json(CompressResponse {
            success: true,
            compressed_image: to_data_uri(format, &data),
            original_size,
            compressed_size,
            savings: format_savings(savings_percent),
            format: format.name().to_string(),
        })),
        CompressionOutcome { error: Some(error), .. } => {
            tracing::error!(error = %error.message, "compression error");
            Err(error.into())
        }
        _ => Err(ApiError::internal("compression produced no data")),
    }
}

/// Either a job to run or an entry rejected before reaching the codec
enum Prepared {
    Job,
    Rejected(CompressionOutcome),
}

fn prepare_entry(
    index: usize,
    entry: Value,
    format: &Option<String>,
    quality: Quality,
) -> Result<CompressionRequest, CompressionOutcome> {
    let entry = FileEntry::from_value(&entry);
    let name = entry.name.unwrap_or_else(|| format!("image-{}", index + 1));

    let data = match entry.data.filter(|data| !data.is_empty()) {
        Some(data) => data,
        None => return Err(CompressionOutcome::failed(name, CompressionError::MissingImageData)),
    };
    match decode_image_payload(&data) {
        Ok(bytes) => Ok(CompressionRequest::buffer(name, bytes, format.clone(), quality)),
        Err(e) => Err(CompressionOutcome::failed(name, e)),
    }
}

fn file_result(outcome: CompressionOutcome) -> FileResult {
    match outcome {
        CompressionOutcome {
            identifier,
            error: None,
            format: Some(format),
            output: Some(JobOutput::Data(data)),
            original_size,
            compressed_size,
            savings_percent,
        } => FileResult::Success(FileSuccess {
            name: identifier,
            success: true,
            original_size,
            compressed_size,
            savings: format_savings(savings_percent),
            format: format.name().to_string(),
            data: encode_base64(&data),
        }),
        other => FileResult::Failure(FileFailure {
            error: other
                .error_message()
                .unwrap_or("compression produced no data")
                .to_string(),
            name: other.identifier,
            success: false,
        }),
    }
}

async fn compress_files(
    State(state): State<AppState>,
    payload: Result<Json<CompressFilesRequest>, JsonRejection>,
) -> Result<Json<CompressFilesResponse>, ApiError> {
    let Json(request) = payload?;

    let entries = match request.files {
        Some(Value::Array(entries)) if !entries.is_empty() => entries,
        _ => return Err(ApiError::bad_request("No files provided")),
    };
    let quality = resolve_quality(request.quality.as_ref())?;

    let mut prepared = Vec::with_capacity(entries.len());
    let mut jobs = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        match prepare_entry(index, entry, &request.format, quality) {
            Ok(job) => {
                jobs.push(job);
                prepared.push(Prepared::Job);
            }
            Err(rejected) => prepared.push(Prepared::Rejected(rejected)),
        }
    }

    let mut completed = state.aggregator.run(jobs).await.outcomes.into_iter();
    let results = prepared
        .into_iter()
        .filter_map(|slot| match slot {
            Prepared::Job => completed.next(),
            Prepared::Rejected(outcome) => Some(outcome),
        })
        .map(file_result)
        .collect();

    Ok(Json(CompressFilesResponse { success: true, results }))
}

/// Acknowledges the files but builds no archive; the page downloads each
/// result individually.
async fn download_batch(
    payload: Result<Json<DownloadBatchRequest>, JsonRejection>,
) -> Result<Json<DownloadBatchResponse>, ApiError> {
    let Json(request) = payload?;

    let count = match request.files {
        Some(Value::Array(files)) if !files.is_empty() => files.len(),
        _ => return Err(ApiError::bad_request("No files to download")),
    };

    Ok(Json(DownloadBatchResponse {
        success: true,
        message: "Files ready for download".to_string(),
        count,
    }))
}
