pub const DEFAULT_QUALITY: u8 = 80;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

pub const DEFAULT_SUFFIX: &str = "-compressed";

// PNG encoder policy: maximum zlib level and maximum effort.
pub const PNG_COMPRESSION_LEVEL: u8 = 9;
pub const PNG_EFFORT: u8 = 10;
pub const OXIPNG_MAX_PRESET: u8 = 6;
pub const LIBDEFLATER_HIGH_LEVEL: u8 = 12;
pub const LIBDEFLATER_LOW_LEVEL: u8 = 8;

// ravif speed: 1 (slowest) ..= 10 (fastest).
pub const AVIF_ENCODER_SPEED: u8 = 6;

pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONCURRENCY: usize = 1;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3333;
pub const DEFAULT_BODY_LIMIT_MB: usize = 100;

pub const PROGRESS_BAR_TEMPLATE: &str = "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}";

pub const SUCCESS_PREFIX: &str = "✓";
pub const FAILURE_PREFIX: &str = "✗";
