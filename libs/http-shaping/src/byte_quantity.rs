//! Human-readable byte quantities such as `"512K"`, `"10.5GiB"` or `"1TB"`.
//!
//! Decimal-looking (`KB`, `MB`, ...) and binary (`KiB`, `MiB`, ...) suffixes
//! are all interpreted with base-1024 multipliers, so `1KB == 1KiB == 1024`.

use thiserror::Error;

pub const KIBIBYTE: u64 = 1 << 10;
pub const MEBIBYTE: u64 = 1 << 20;
pub const GIBIBYTE: u64 = 1 << 30;
pub const TEBIBYTE: u64 = 1 << 40;
pub const PEBIBYTE: u64 = 1 << 50;
pub const EXBIBYTE: u64 = 1 << 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ByteQuantityError {
    #[error(
        "invalid byte quantity '{input}': expected a non-negative number with a unit like B, K, KB, KiB, M, MB, MiB, G, GB or GiB"
    )]
    InvalidFormat { input: String },
}

impl ByteQuantityError {
    fn invalid(input: &str) -> Self {
        ByteQuantityError::InvalidFormat {
            input: input.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteUnit {
    Byte,
    Kibibyte,
    Mebibyte,
    Gibibyte,
    Tebibyte,
    Pebibyte,
    Exbibyte,
}

impl ByteUnit {
    /// Matches an already uppercased unit suffix.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "B" => Some(ByteUnit::Byte),
            "K" | "KB" | "KIB" => Some(ByteUnit::Kibibyte),
            "M" | "MB" | "MIB" => Some(ByteUnit::Mebibyte),
            "G" | "GB" | "GIB" => Some(ByteUnit::Gibibyte),
            "T" | "TB" | "TIB" => Some(ByteUnit::Tebibyte),
            "P" | "PB" | "PIB" => Some(ByteUnit::Pebibyte),
            "E" | "EB" | "EIB" => Some(ByteUnit::Exbibyte),
            _ => None,
        }
    }

    pub fn multiplier(self) -> u64 {
        match self {
            ByteUnit::Byte => 1,
            ByteUnit::Kibibyte => KIBIBYTE,
            ByteUnit::Mebibyte => MEBIBYTE,
            ByteUnit::Gibibyte => GIBIBYTE,
            ByteUnit::Tebibyte => TEBIBYTE,
            ByteUnit::Pebibyte => PEBIBYTE,
            ByteUnit::Exbibyte => EXBIBYTE,
        }
    }
}

/// Parses a quantity like `"10.5GiB"` into an exact byte count.
///
/// Surrounding whitespace is ignored and the unit is case-insensitive. The
/// result is truncated toward zero, never rounded: `"1.9B"` is one byte.
///
/// ```
/// use http_shaping::parse_byte_quantity;
///
/// assert_eq!(parse_byte_quantity("1KiB").unwrap(), 1024);
/// assert!(parse_byte_quantity("2").is_err());
/// ```
pub fn parse_byte_quantity(input: &str) -> Result<u64, ByteQuantityError> {
    let normalized = input.trim().to_uppercase();

    let split = normalized
        .find(char::is_alphabetic)
        .ok_or_else(|| ByteQuantityError::invalid(input))?;
    let (magnitude, suffix) = normalized.split_at(split);

    let magnitude: f64 = magnitude
        .parse()
        .map_err(|_| ByteQuantityError::invalid(input))?;
    if magnitude < 0.0 {
        return Err(ByteQuantityError::invalid(input));
    }

    let unit = ByteUnit::from_suffix(suffix).ok_or_else(|| ByteQuantityError::invalid(input))?;

    // `as` truncates toward zero and saturates at u64::MAX.
    Ok((magnitude * unit.multiplier() as f64) as u64)
}
