//! Best-effort X11 access control through `xhost`

use std::process::{Command, Stdio};

use tracing::debug;

use super::spec::Platform;

fn xhost_args(platform: Platform, allow: bool) -> &'static [&'static str] {
    match (platform, allow) {
        (Platform::Linux, true) => &["+local:root", "+localhost"],
        (Platform::Linux, false) => &["-local:root", "-localhost"],
        (Platform::Other, true) => &["+localhost"],
        (Platform::Other, false) => &["-localhost"],
    }
}

fn run_xhost(platform: Platform, allow: bool) {
    let args = xhost_args(platform, allow);
    let status = Command::new("xhost")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    // best effort, failures are only logged
    match status {
        Ok(status) => debug!(?args, %status, "xhost finished"),
        Err(e) => debug!(?args, error = %e, "xhost could not be run"),
    }
}

/// Allow local X11 clients from the container
pub fn allow(platform: Platform) {
    run_xhost(platform, true);
}

/// Undo [`allow`]
pub fn revoke(platform: Platform) {
    run_xhost(platform, false);
}
