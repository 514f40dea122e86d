//! Human readable byte sizes

use crate::error::{PwnboxError, Result};

const UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Format a byte count with 1024-based units and two decimals.
///
/// Zero is rejected with [`PwnboxError::InvalidSize`].
pub fn format_size(bytes: u64) -> Result<String> {
    if bytes == 0 {
        return Err(PwnboxError::InvalidSize);
    }

    let mut index = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && index < UNITS.len() - 1 {
        scaled /= 1024;
        index += 1;
    }

    let size = bytes as f64 / 1024f64.powi(index as i32);
    Ok(format!("{:.2} {}", size, UNITS[index]))
}
