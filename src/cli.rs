use crate::constants::{DEFAULT_JOB_TIMEOUT_SECS, DEFAULT_SUFFIX};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "compress-img",
    about = "Fast local image compression tool",
    long_about = "compress-img re-encodes images with a chosen quality and output format. \
                  Each file is compressed independently: a failure on one file is reported \
                  and the remaining files are still processed.",
    version,
    after_help = "EXAMPLES:\n  \
    compress-img photo.jpg -q 70\n  \
    compress-img *.png -f webp\n  \
    compress-img \"shots/*.jpg\" -o _small -j 4\n  \
    compress-img photo.png --replace"
)]
pub struct Args {
    #[arg(
        required = true,
        help = "Image file(s) to compress (supports wildcards)",
        long_help = "Image files to compress. Arguments containing wildcards that do not name \
                     an existing file are expanded as glob patterns."
    )]
    pub files: Vec<String>,

    #[arg(
        short = 'q',
        long,
        default_value = "80",
        allow_hyphen_values = true,
        help = "Compression quality (1-100)"
    )]
    pub quality: String,

    #[arg(
        short = 'f',
        long,
        help = "Output format (jpeg|webp|png|avif)",
        long_help = "Force the output format. When omitted the source format is kept; \
                     sources in other formats and unrecognized values are written as JPEG."
    )]
    pub format: Option<String>,

    #[arg(
        short = 'o',
        long,
        default_value = DEFAULT_SUFFIX,
        allow_hyphen_values = true,
        help = "Output filename suffix"
    )]
    pub suffix: String,

    #[arg(long, help = "Overwrite original file (use with caution!)")]
    pub replace: bool,

    #[arg(
        short = 'j',
        long,
        default_value_t = 1,
        help = "Number of files compressed at once (0 = one per CPU)"
    )]
    pub jobs: usize,

    #[arg(
        long,
        default_value_t = DEFAULT_JOB_TIMEOUT_SECS,
        help = "Per-file time limit in seconds"
    )]
    pub timeout: u64,

    #[arg(long, conflicts_with = "verbose", help = "Only print errors")]
    pub quiet: bool,

    #[arg(short = 'v', long, help = "Print extra detail for each file")]
    pub verbose: bool,
}

/// Expand arguments that look like glob patterns and do not name a file.
pub fn expand_inputs(files: &[String]) -> Vec<PathBuf> {
    let mut inputs = Vec::new();
    for file in files {
        let path = PathBuf::from(file);
        let looks_like_pattern = file.contains(['*', '?', '[']);
        if path.exists() || !looks_like_pattern {
            inputs.push(path);
            continue;
        }

        match glob::glob(file) {
            Ok(paths) => {
                let mut matched: Vec<PathBuf> =
                    paths.flatten().filter(|entry| entry.is_file()).collect();
                if matched.is_empty() {
                    // Report it as a missing file rather than dropping it.
                    inputs.push(path);
                } else {
                    matched.sort();
                    inputs.append(&mut matched);
                }
            }
            Err(_) => inputs.push(path),
        }
    }
    inputs
}
