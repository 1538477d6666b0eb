use std::io::Write;
use std::process::{Command, Stdio};

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("send command is empty or malformed: {0}")]
    BadCommand(String),
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} rejected the message ({status}): {diagnostics}")]
    Rejected {
        program: String,
        status: std::process::ExitStatus,
        diagnostics: String,
    },
}

/// Hands a fully composed message to whatever delivers mail.
pub trait MailTransfer: Send + Sync {
    fn send(&self, message: &str) -> Result<(), TransferError>;
}

/// Pipes the message into an external command such as `msmtp -t`.
#[derive(Debug, Clone)]
pub struct CommandTransfer {
    argv: Vec<String>,
}

impl CommandTransfer {
    pub fn from_command_line(command: &str) -> Result<Self, TransferError> {
        let argv = shell_words::split(command)
            .map_err(|e| TransferError::BadCommand(format!("{}: {}", command, e)))?;
        if argv.is_empty() {
            return Err(TransferError::BadCommand(command.to_string()));
        }
        Ok(Self { argv })
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }
}

impl MailTransfer for CommandTransfer {
    fn send(&self, message: &str) -> Result<(), TransferError> {
        let program = self.program().to_string();
        tracing::debug!(%program, bytes = message.len(), "handing message to transfer");

        let mut child = Command::new(&program)
            .args(&self.argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TransferError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        // Feed stdin on its own thread while stdout and stderr are drained
        let output = std::thread::scope(|scope| {
            if let Some(mut stdin) = stdin {
                let program = &program;
                scope.spawn(move || {
                    // A transfer that exits early closes the pipe; its exit status tells why
                    if let Err(e) = stdin.write_all(message.as_bytes()) {
                        tracing::warn!(%program, "writing to transfer stdin failed: {}", e);
                    }
                });
            }
            child.wait_with_output()
        })
        .map_err(|source| TransferError::Spawn {
            program: program.clone(),
            source,
        })?;

        if output.status.success() {
            tracing::info!(%program, "message accepted");
            return Ok(());
        }

        let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
        diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(TransferError::Rejected {
            program,
            status: output.status,
            diagnostics: diagnostics.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_is_split_like_a_shell() {
        let transfer = CommandTransfer::from_command_line("msmtp -t --account 'work mail'").unwrap();
        assert_eq!(transfer.argv, vec!["msmtp", "-t", "--account", "work mail"]);
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(
            CommandTransfer::from_command_line("   "),
            Err(TransferError::BadCommand(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_zero_exit_is_accepted() {
        let transfer = CommandTransfer::from_command_line("cat").unwrap();
        assert!(transfer.send("To: a@example.com\n\nhi\n").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_carries_diagnostics() {
        let transfer =
            CommandTransfer::from_command_line("sh -c 'cat >/dev/null; echo no route >&2; exit 3'")
                .unwrap();
        match transfer.send("To: a@example.com\n\nhi\n") {
            Err(TransferError::Rejected {
                status,
                diagnostics,
                ..
            }) => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(diagnostics, "no route");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_large_message_echoed_back_does_not_block() {
        let transfer = CommandTransfer::from_command_line("sh -c 'cat; exit 1'").unwrap();
        let message = "x".repeat(1 << 20);
        match transfer.send(&message) {
            Err(TransferError::Rejected {
                status,
                diagnostics,
                ..
            }) => {
                assert_eq!(status.code(), Some(1));
                assert_eq!(diagnostics.len(), message.len());
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let transfer = CommandTransfer::from_command_line("/nonexistent/mailwin-sendmail").unwrap();
        assert!(matches!(
            transfer.send("x"),
            Err(TransferError::Spawn { .. })
        ));
    }
}
