//! Kubernetes resource quantity parsing
//!
//! Quantities are strings like `500m`, `2`, `1.5Gi` or `1e3`. This module turns
//! them into `f64` base units (cores for CPU, bytes for memory).

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid quantity '{0}'")]
    Invalid(String),

    #[error("unknown quantity suffix '{suffix}' in '{value}'")]
    UnknownSuffix { value: String, suffix: String },
}

/// Bytes per gigabyte as ACI counts them (decimal)
pub const BYTES_PER_GB: f64 = 1_000_000_000.0;

/// Multiplier for a quantity suffix, or None if the suffix is unknown
fn suffix_multiplier(suffix: &str) -> Option<f64> {
    let m = match suffix {
        "" => 1.0,
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => 1024.0,
        "Mi" => 1024.0_f64.powi(2),
        "Gi" => 1024.0_f64.powi(3),
        "Ti" => 1024.0_f64.powi(4),
        "Pi" => 1024.0_f64.powi(5),
        "Ei" => 1024.0_f64.powi(6),
        _ => return None,
    };
    Some(m)
}

/// Parse a quantity string into its value in base units
///
/// # Examples
/// ```ignore
/// assert_eq!(parse_quantity("500m")?, 0.5);
/// assert_eq!(parse_quantity("1Ki")?, 1024.0);
/// assert_eq!(parse_quantity("1e3")?, 1000.0);
/// ```
pub fn parse_quantity(raw: &str) -> Result<f64, QuantityError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(QuantityError::Empty);
    }

    // Split numeric part from suffix. `e`/`E` followed by a digit or sign is an
    // exponent; a trailing `E` alone is the exa suffix.
    let bytes = value.as_bytes();
    let mut end = 0;
    while end < bytes.len() {
        let c = bytes[end];
        let is_exponent = (c == b'e' || c == b'E')
            && end > 0
            && bytes
                .get(end + 1)
                .is_some_and(|n| n.is_ascii_digit() || *n == b'+' || *n == b'-');
        if c.is_ascii_digit() || c == b'.' || ((c == b'+' || c == b'-') && end == 0) {
            end += 1;
        } else if is_exponent {
            // consume the marker and the sign/digit that follows
            end += 2;
        } else {
            break;
        }
    }

    let (number, suffix) = value.split_at(end);
    let number: f64 = number
        .parse()
        .map_err(|_| QuantityError::Invalid(raw.to_string()))?;
    let multiplier = suffix_multiplier(suffix).ok_or_else(|| QuantityError::UnknownSuffix {
        value: raw.to_string(),
        suffix: suffix.to_string(),
    })?;

    let parsed = number * multiplier;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(QuantityError::Invalid(raw.to_string()));
    }
    Ok(parsed)
}

/// CPU cores, rounded up to a whole core
///
/// ACI is handed whole cores here: `500m` becomes 1, `1500m` becomes 2.
pub fn cpu_cores(quantity: &Quantity) -> Result<f64, QuantityError> {
    Ok(parse_quantity(&quantity.0)?.ceil())
}

/// Memory in decimal gigabytes
pub fn memory_gb(quantity: &Quantity) -> Result<f64, QuantityError> {
    Ok(parse_quantity(&quantity.0)?.ceil() / BYTES_PER_GB)
}
