//! Waiting for the container's SSH service and handing off to `ssh`

pub mod handoff;

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

use crate::error::{PwnboxError, Result};
pub use handoff::{ExecHandoff, Handoff};

pub const SSH_HOST: &str = "127.0.0.1";
pub const SSH_PORT: u16 = 2222;

/// Connection attempts per second
pub const POLL_RATE: u64 = 10;

/// How long and how often to poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub attempts: u64,
    pub interval: Duration,
}

impl WaitPolicy {
    /// `timeout_secs × POLL_RATE` attempts, evenly spaced
    pub fn from_timeout(timeout_secs: u64) -> Self {
        Self {
            attempts: timeout_secs.saturating_mul(POLL_RATE).max(1),
            interval: Duration::from_millis(1000 / POLL_RATE),
        }
    }
}

/// Arguments for the interactive shell client
pub fn ssh_args(host: &str, port: u16) -> Vec<String> {
    vec![
        "-o".to_string(),
        "StrictHostKeyChecking=no".to_string(),
        "-X".to_string(),
        format!("root@{}", host),
        "-p".to_string(),
        port.to_string(),
    ]
}

/// Poll `host:port` until a TCP connection succeeds.
///
/// Returns the number of attempts used, or `ConnectivityTimeout` once the
/// policy's attempts are exhausted.
pub async fn wait_for_port(host: &str, port: u16, policy: WaitPolicy) -> Result<u64> {
    for attempt in 1..=policy.attempts {
        let started = Instant::now();
        match timeout(policy.interval, TcpStream::connect((host, port))).await {
            Ok(Ok(_)) => {
                debug!(host, port, attempt, "Port is accepting connections");
                return Ok(attempt);
            }
            Ok(Err(e)) => debug!(host, port, attempt, error = %e, "Connection refused"),
            Err(_) => debug!(host, port, attempt, "Connection attempt timed out"),
        }
        if attempt < policy.attempts {
            let remaining = policy.interval.saturating_sub(started.elapsed());
            sleep(remaining).await;
        }
    }

    Err(PwnboxError::ConnectivityTimeout {
        host: host.to_string(),
        port,
        attempts: policy.attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn fast(attempts: u64) -> WaitPolicy {
        WaitPolicy {
            attempts,
            interval: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_policy_from_timeout() {
        let policy = WaitPolicy::from_timeout(10);
        assert_eq!(policy.attempts, 100);
        assert_eq!(policy.interval, Duration::from_millis(100));
        assert_eq!(WaitPolicy::from_timeout(0).attempts, 1);
    }

    #[test]
    fn test_ssh_args() {
        assert_eq!(
            ssh_args(SSH_HOST, SSH_PORT),
            vec!["-o", "StrictHostKeyChecking=no", "-X", "root@127.0.0.1", "-p", "2222"]
        );
    }

    #[tokio::test]
    async fn test_open_port_succeeds_first_attempt() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert_eq!(wait_for_port("127.0.0.1", port, fast(5)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_closed_port_times_out() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let started = std::time::Instant::now();
        let err = wait_for_port("127.0.0.1", port, fast(5)).await.unwrap_err();
        assert!(matches!(err, PwnboxError::ConnectivityTimeout { attempts: 5, .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_one_second_timeout_bounded() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let started = std::time::Instant::now();
        let err = wait_for_port("127.0.0.1", port, WaitPolicy::from_timeout(1))
            .await
            .unwrap_err();
        assert!(matches!(err, PwnboxError::ConnectivityTimeout { attempts: 10, .. }));
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
