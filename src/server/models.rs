use crate::error::{CompressionError, Result};
use crate::processing::Quality;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `quality` as sent by browsers: a JSON number or a numeric string
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum QualityParam {
    Number(f64),
    Text(String),
}

impl QualityParam {
    pub fn to_quality(&self) -> Result<Quality> {
        match self {
            // Fractional values are truncated.
            QualityParam::Number(n) if n.is_finite() => Quality::new(n.trunc() as i64),
            QualityParam::Number(n) => Err(CompressionError::InvalidQuality(n.to_string())),
            QualityParam::Text(s) => s.parse(),
        }
    }
}

/// Missing quality means the default.
pub fn resolve_quality(param: Option<&QualityParam>) -> Result<Quality> {
    param.map_or(Ok(Quality::default()), QualityParam::to_quality)
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompressRequest {
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub quality: Option<QualityParam>,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CompressResponse {
    pub success: bool,
    /// `data:image/<type>;base64,...`
    pub compressed_image: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub savings: String,
    pub format: String,
}

/// `files` is kept loose so a non-list can be answered with a 400.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CompressFilesRequest {
    #[serde(default)]
    pub files: Option<Value>,
    #[serde(default)]
    pub quality: Option<QualityParam>,
    #[serde(default)]
    pub format: Option<String>,
}

/// One element of `files`, read field by field so a malformed `data` never
/// costs the entry its `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileEntry {
    pub name: Option<String>,
    pub data: Option<String>,
}

impl FileEntry {
    pub fn from_value(value: &Value) -> Self {
        let text = |field: &str| value.get(field).and_then(Value::as_str).map(str::to_string);
        Self {
            name: text("name"),
            data: text("data"),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FileSuccess {
    pub name: String,
    pub success: bool,
    pub original_size: u64,
    pub compressed_size: u64,
    pub savings: String,
    pub format: String,
    /// Plain base64, no data-URI prefix
    pub data: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct FileFailure {
    pub name: String,
    pub success: bool,
    pub error: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum FileResult {
    Success(FileSuccess),
    Failure(FileFailure),
}

#[derive(Serialize, Debug, Clone)]
pub struct CompressFilesResponse {
    pub success: bool,
    pub results: Vec<FileResult>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct DownloadBatchRequest {
    #[serde(default)]
    pub files: Option<Value>,
}

#[derive(Serialize, Debug, Clone)]
pub struct DownloadBatchResponse {
    pub success: bool,
    pub message: String,
    pub count: usize,
}
