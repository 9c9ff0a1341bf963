use crate::codec::{Codec, EncodeParams};
use crate::constants::{DEFAULT_QUALITY, DEFAULT_SUFFIX, MAX_QUALITY, MIN_QUALITY};
use crate::error::{CompressionError, Result};
use crate::formats::{resolve_format, ResolvedFormat};
use crate::report::{CompressionOutcome, JobOutput};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Encoder quality, validated to `1..=100`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    /// Out-of-range values are rejected, never clamped.
    pub fn new(value: impl Into<i64>) -> Result<Self> {
        let value = value.into();
        if !(i64::from(MIN_QUALITY)..=i64::from(MAX_QUALITY)).contains(&value) {
            return Err(CompressionError::InvalidQuality(value.to_string()));
        }
        Ok(Self(value as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(DEFAULT_QUALITY)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Quality {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| CompressionError::InvalidQuality(s.to_string()))?;
        Quality::new(value)
    }
}

/// How the CLI names the file it writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    pub suffix: String,
    /// Overwrite the input file instead of writing a sibling
    pub replace: bool,
}

impl Default for OutputNaming {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
            replace: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    /// Read from disk; the result is written next to it (or over it)
    File { path: PathBuf, naming: OutputNaming },
    /// Already in memory; the result is returned in memory
    Buffer { name: String, bytes: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionRequest {
    pub source: JobSource,
    pub requested_format: Option<String>,
    pub quality: Quality,
}

impl CompressionRequest {
    pub fn file(
        path: impl Into<PathBuf>,
        requested_format: Option<String>,
        quality: Quality,
        naming: OutputNaming,
    ) -> Self {
        Self {
            source: JobSource::File {
                path: path.into(),
                naming,
            },
            requested_format,
            quality,
        }
    }

    pub fn buffer(
        name: impl Into<String>,
        bytes: Vec<u8>,
        requested_format: Option<String>,
        quality: Quality,
    ) -> Self {
        Self {
            source: JobSource::Buffer {
                name: name.into(),
                bytes,
            },
            requested_format,
            quality,
        }
    }

    /// Name used in reports: the file's base name, or the buffer's name
    pub fn identifier(&self) -> String {
        match &self.source {
            JobSource::File { path, .. } => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned()),
            JobSource::Buffer { name, .. } => name.clone(),
        }
    }
}

/// Encoded bytes together with the decisions that produced them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    pub format: ResolvedFormat,
    pub original_size: u64,
    pub bytes: Vec<u8>,
}

impl CompressedImage {
    pub fn compressed_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Resolve, decode and re-encode one in-memory image.
pub fn compress_bytes<C: Codec + ?Sized>(
    codec: &C,
    source: &[u8],
    requested_format: Option<&str>,
    quality: Quality,
) -> Result<CompressedImage> {
    let format = resolve_format(codec, requested_format, source);
    let image = codec.decode(source)?;
    let params = EncodeParams::for_format(format, quality);
    let bytes = codec.encode(&image, format, &params)?;

    tracing::debug!(
        format = %format,
        quality = quality.get(),
        original = source.len(),
        compressed = bytes.len(),
        "encoded image"
    );

    Ok(CompressedImage {
        format,
        original_size: source.len() as u64,
        bytes,
    })
}

/// Where the CLI writes the compressed version of `input`.
///
/// With `replace` this is the absolute input path itself. Otherwise it is
/// `<dir>/<stem><suffix>.<ext>` next to the input.
pub fn output_path_for(
    input: &Path,
    format: ResolvedFormat,
    naming: &OutputNaming,
) -> Result<PathBuf> {
    let absolute = std::path::absolute(input)?;
    if naming.replace {
        return Ok(absolute);
    }

    let stem = absolute
        .file_stem()
        .ok_or_else(|| CompressionError::FileNotFound(absolute.clone()))?;
    let file_name = format!(
        "{}{}.{}",
        stem.to_string_lossy(),
        naming.suffix,
        format.extension()
    );

    Ok(match absolute.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    })
}

async fn read_source(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => CompressionError::FileNotFound(path.to_path_buf()),
        _ => CompressionError::Io(e),
    })
}

/// A job whose encoding has finished but whose result is not yet delivered
#[derive(Debug)]
pub struct EncodedJob {
    identifier: String,
    compressed: CompressedImage,
    destination: Option<(PathBuf, OutputNaming)>,
}

/// Read the source and compress it off the async runtime. Nothing touches
/// the filesystem beyond the read.
pub async fn encode_job(codec: Arc<dyn Codec>, request: CompressionRequest) -> Result<EncodedJob> {
    let identifier = request.identifier();
    let CompressionRequest {
        source,
        requested_format,
        quality,
    } = request;

    let (bytes, destination) = match source {
        JobSource::File { path, naming } => {
            let path = std::path::absolute(&path)?;
            (read_source(&path).await?, Some((path, naming)))
        }
        JobSource::Buffer { bytes, .. } => (bytes, None),
    };

    let compressed = tokio::task::spawn_blocking(move || {
        compress_bytes(codec.as_ref(), &bytes, requested_format.as_deref(), quality)
    })
    .await
    .map_err(|e| CompressionError::TaskFailed(e.to_string()))??;

    Ok(EncodedJob {
        identifier,
        compressed,
        destination,
    })
}

impl EncodedJob {
    pub fn format(&self) -> ResolvedFormat {
        self.compressed.format
    }

    /// Write the output file (file jobs) or hand back the bytes (buffer jobs).
    pub async fn finish(self) -> Result<CompressionOutcome> {
        let EncodedJob {
            identifier,
            compressed,
            destination,
        } = self;
        let original_size = compressed.original_size;
        let compressed_size = compressed.compressed_size();
        let format = compressed.format;

        let output = match destination {
            Some((input, naming)) => {
                let output_path = output_path_for(&input, format, &naming)?;
                tokio::fs::write(&output_path, &compressed.bytes).await?;
                tracing::debug!(input = %input.display(), output = %output_path.display(), "wrote compressed file");
                JobOutput::Path(output_path)
            }
            None => JobOutput::Data(compressed.bytes),
        };

        Ok(CompressionOutcome::succeeded(
            identifier,
            original_size,
            compressed_size,
            format,
            output,
        ))
    }
}

/// Run one job end to end. Nothing is written until encoding has completed
/// in memory.
pub async fn run_job(codec: Arc<dyn Codec>, request: CompressionRequest) -> Result<CompressionOutcome> {
    encode_job(codec, request).await?.finish().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ImageCodec;
    use image::{DynamicImage, Rgb, RgbImage};
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 3) as u8, (y * 3) as u8, 90]));
        let mut buffer = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_quality_range() {
        assert_eq!(Quality::new(1).unwrap().get(), 1);
        assert_eq!(Quality::new(100).unwrap().get(), 100);
        assert!(matches!(Quality::new(0), Err(CompressionError::InvalidQuality(_))));
        assert!(matches!(Quality::new(101), Err(CompressionError::InvalidQuality(_))));
        assert!(matches!(Quality::new(-5), Err(CompressionError::InvalidQuality(_))));
    }

    #[test]
    fn test_quality_default_and_parse() {
        assert_eq!(Quality::default().get(), 80);
        assert_eq!("85".parse::<Quality>().unwrap().get(), 85);
        assert_eq!(" 7 ".parse::<Quality>().unwrap().get(), 7);
        assert!("abc".parse::<Quality>().is_err());
        assert!("250".parse::<Quality>().is_err());
    }

    #[test]
    fn test_output_path_default_suffix() {
        let naming = OutputNaming::default();
        let path = output_path_for(Path::new("/photos/photo.png"), ResolvedFormat::WebP, &naming).unwrap();
        assert_eq!(path, PathBuf::from("/photos/photo-compressed.webp"));
    }

    #[test]
    fn test_output_path_uses_jpg_extension() {
        let naming = OutputNaming {
            suffix: "_small".to_string(),
            replace: false,
        };
        let path = output_path_for(Path::new("/photos/photo.png"), ResolvedFormat::Jpeg, &naming).unwrap();
        assert_eq!(path, PathBuf::from("/photos/photo_small.jpg"));
    }

    #[test]
    fn test_output_path_replace_is_absolute_input() {
        let naming = OutputNaming {
            suffix: DEFAULT_SUFFIX.to_string(),
            replace: true,
        };
        let path = output_path_for(Path::new("photo.png"), ResolvedFormat::WebP, &naming).unwrap();
        assert_eq!(path, std::env::current_dir().unwrap().join("photo.png"));
    }

    #[test]
    fn test_output_path_relative_input_is_made_absolute() {
        let path = output_path_for(
            Path::new("photo.png"),
            ResolvedFormat::Png,
            &OutputNaming::default(),
        )
        .unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("photo-compressed.png"));
    }

    #[test]
    fn test_identifier() {
        let request = CompressionRequest::file(
            "/a/b/photo.jpg",
            None,
            Quality::default(),
            OutputNaming::default(),
        );
        assert_eq!(request.identifier(), "photo.jpg");

        let request = CompressionRequest::buffer("upload.png", vec![], None, Quality::default());
        assert_eq!(request.identifier(), "upload.png");
    }

    #[test]
    fn test_compress_bytes_detects_format() {
        let source = png_bytes(24, 24);
        let result = compress_bytes(&ImageCodec::new(), &source, None, Quality::default()).unwrap();
        assert_eq!(result.format, ResolvedFormat::Png);
        assert_eq!(result.original_size, source.len() as u64);
        assert_eq!(image::guess_format(&result.bytes).unwrap(), image::ImageFormat::Png);
    }

    #[test]
    fn test_compress_bytes_is_deterministic() {
        let source = png_bytes(32, 16);
        let codec = ImageCodec::new();
        let quality = Quality::new(60).unwrap();
        let first = compress_bytes(&codec, &source, Some("jpeg"), quality).unwrap();
        let second = compress_bytes(&codec, &source, Some("jpeg"), quality).unwrap();
        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn test_compress_bytes_corrupt_input() {
        let result = compress_bytes(&ImageCodec::new(), b"definitely not an image", None, Quality::default());
        assert!(matches!(result, Err(CompressionError::Image(_))));
    }

    #[tokio::test]
    async fn test_run_job_writes_sibling_file() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("photo.png");
        std::fs::write(&input, png_bytes(20, 20)).unwrap();

        let request = CompressionRequest::file(
            &input,
            Some("webp".to_string()),
            Quality::default(),
            OutputNaming::default(),
        );
        let outcome = run_job(Arc::new(ImageCodec::new()), request).await.unwrap();

        let expected = temp_dir.path().join("photo-compressed.webp");
        assert_eq!(outcome.output, Some(JobOutput::Path(expected.clone())));
        assert_eq!(
            std::fs::metadata(&expected).unwrap().len(),
            outcome.compressed_size
        );
        assert!(input.exists());
    }

    #[test]
    fn test_gif_source_is_written_as_jpeg() {
        let img = RgbImage::from_fn(12, 12, |x, y| Rgb([(x * 20) as u8, (y * 20) as u8, 0]));
        let mut gif = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut gif, image::ImageFormat::Gif)
            .unwrap();

        let compressed =
            compress_bytes(&ImageCodec::new(), gif.get_ref(), None, Quality::default()).unwrap();
        assert_eq!(compressed.format, ResolvedFormat::Jpeg);
        assert!(compressed.bytes.starts_with(&[0xFF, 0xD8]));
    }

    #[tokio::test]
    async fn test_encode_job_defers_write_to_finish() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("photo.png");
        std::fs::write(&input, png_bytes(20, 20)).unwrap();
        let expected = temp_dir.path().join("photo_min.jpg");

        let request = CompressionRequest::file(
            &input,
            Some("jpeg".to_string()),
            Quality::default(),
            OutputNaming {
                suffix: "_min".to_string(),
                replace: false,
            },
        );
        let encoded = encode_job(Arc::new(ImageCodec::new()), request).await.unwrap();
        assert_eq!(encoded.format(), ResolvedFormat::Jpeg);
        assert!(!expected.exists());

        let outcome = encoded.finish().await.unwrap();
        assert_eq!(outcome.output, Some(JobOutput::Path(expected.clone())));
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn test_run_job_missing_file() {
        let request = CompressionRequest::file(
            "/nonexistent/photo.jpg",
            None,
            Quality::default(),
            OutputNaming::default(),
        );
        let result = run_job(Arc::new(ImageCodec::new()), request).await;
        assert!(matches!(result, Err(CompressionError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_run_job_buffer_returns_data() {
        let source = png_bytes(10, 10);
        let request = CompressionRequest::buffer("mem.png", source.clone(), Some("jpg".into()), Quality::default());
        let outcome = run_job(Arc::new(ImageCodec::new()), request).await.unwrap();
        assert_eq!(outcome.identifier, "mem.png");
        assert_eq!(outcome.format, Some(ResolvedFormat::Jpeg));
        assert_eq!(outcome.original_size, source.len() as u64);
        match outcome.output {
            Some(JobOutput::Data(bytes)) => assert!(bytes.starts_with(&[0xFF, 0xD8])),
            other => panic!("unexpected output: {:?}", other),
        }
    }
}
