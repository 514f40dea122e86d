//! Check whether a newer PwnBox CLI release exists

use std::cmp::Ordering;
use std::time::Duration;

use tracing::debug;

use crate::error::{PwnboxError, Result};

pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

pub const VERSION_URL: &str =
    "https://raw.githubusercontent.com/DeadPackets/pwnbox-cli/main/VERSION.txt";

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Parse `v1.2.3` / `1.2.3` into numeric components
pub fn parse_version(raw: &str) -> Result<Vec<u64>> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(PwnboxError::UpdateCheckError(format!(
            "invalid version \"{}\"",
            raw
        )));
    }
    digits
        .split('.')
        .map(|part| {
            part.parse::<u64>().map_err(|_| {
                PwnboxError::UpdateCheckError(format!("invalid version \"{}\"", raw))
            })
        })
        .collect()
}

fn compare_versions(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Whether `candidate` is a strictly newer version than `current`
pub fn is_newer(candidate: &str, current: &str) -> Result<bool> {
    let candidate = parse_version(candidate)?;
    let current = parse_version(current)?;
    Ok(compare_versions(&candidate, &current) == Ordering::Greater)
}

/// Fetch the published version string
pub async fn latest_version(url: &str) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(CHECK_TIMEOUT)
        .build()
        .map_err(|e| PwnboxError::UpdateCheckError(e.to_string()))?;
    let body = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| PwnboxError::UpdateCheckError(e.to_string()))?
        .text()
        .await
        .map_err(|e| PwnboxError::UpdateCheckError(e.to_string()))?;
    Ok(body.trim().to_string())
}

/// Returns the published version when it is newer than `current`
pub async fn check(url: &str, current: &str) -> Result<Option<String>> {
    let latest = latest_version(url).await?;
    debug!(latest = %latest, current, "Fetched published version");
    Ok(is_newer(&latest, current)?.then_some(latest))
}
