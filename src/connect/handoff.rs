//! Replacing the current process with an interactive client

use std::process::Command;

use crate::error::{PwnboxError, Result};

/// Terminal action that gives the terminal to another program.
///
/// A successful real handoff never returns.
pub trait Handoff: Send + Sync {
    fn hand_off(&self, program: &str, args: &[String]) -> Result<()>;
}

/// Hands off by `exec`-ing the program
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecHandoff;

impl Handoff for ExecHandoff {
    #[cfg(unix)]
    fn hand_off(&self, program: &str, args: &[String]) -> Result<()> {
        use std::os::unix::process::CommandExt;

        let err = Command::new(program).args(args).exec();
        Err(PwnboxError::HandoffError {
            program: program.to_string(),
            reason: err.to_string(),
        })
    }

    #[cfg(not(unix))]
    fn hand_off(&self, program: &str, args: &[String]) -> Result<()> {
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|e| PwnboxError::HandoffError {
                program: program.to_string(),
                reason: e.to_string(),
            })?;
        std::process::exit(status.code().unwrap_or(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_missing_program_reports_error() {
        let err = ExecHandoff
            .hand_off("pwnbox-test-no-such-program", &[])
            .unwrap_err();
        assert!(matches!(
            err,
            PwnboxError::HandoffError { program, .. } if program == "pwnbox-test-no-such-program"
        ));
    }
}
