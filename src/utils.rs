/// Helpers shared by the two front ends: human-readable sizes for the CLI
/// and base64 / data-URI plumbing for the HTTP service.
use crate::error::Result;
use crate::formats::ResolvedFormat;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

const SIZE_UNITS: &[&str] = &["Bytes", "KB", "MB", "GB"];

/// Accepts payloads with or without trailing `=` padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Format a byte count with 1024-based units, rounded to at most two decimals
///
/// # Examples
/// ```
/// use compress_img::utils::format_bytes;
///
/// assert_eq!(format_bytes(0), "0 Bytes");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit_index = 0;
    let mut size = bytes as f64;
    while size >= 1024.0 && unit_index < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    let rounded = (size * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit_index])
}

/// Strip a leading `data:image/<type>;base64,` prefix, if present.
pub fn strip_data_uri(payload: &str) -> &str {
    let Some(rest) = payload.strip_prefix("data:image/") else {
        return payload;
    };
    match rest.split_once(";base64,") {
        Some((subtype, data))
            if !subtype.is_empty()
                && subtype.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            data
        }
        _ => payload,
    }
}

/// Decode a base64 image payload, with or without a data-URI prefix.
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>> {
    let data: String = strip_data_uri(payload)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    Ok(LENIENT_BASE64.decode(data)?)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn to_data_uri(format: ResolvedFormat, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", format.mime_type(), encode_base64(bytes))
}
