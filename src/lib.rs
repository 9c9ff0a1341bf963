pub mod batch;
pub mod cli;
pub mod codec;
pub mod constants;
pub mod error;
pub mod formats;
pub mod logger;
pub mod processing;
pub mod report;
pub mod server;
pub mod utils;

pub use batch::BatchAggregator;
pub use codec::{Codec, EncodeParams, ImageCodec};
pub use error::{CompressionError, FailureKind, Result};
pub use formats::{resolve_format, ResolvedFormat};
pub use processing::{
    compress_bytes, encode_job, output_path_for, run_job, CompressedImage, CompressionRequest,
    EncodedJob, JobSource, OutputNaming, Quality,
};
pub use report::{savings_percent, BatchReport, CompressionOutcome, JobError, JobOutput};
