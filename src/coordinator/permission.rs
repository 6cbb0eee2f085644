use anyhow::Result;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionDecision {
    Granted,
    Denied { reason: String },
}

/// One-time host permission dialog shown to the user.
///
/// Waiting on the user is unbounded unless an implementation adds its own
/// timeout.
pub trait PermissionPrompt: Send + Sync {
    fn request_host_access<'a>(
        &'a self,
        origin: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<PermissionDecision>> + Send + 'a>>;
}

pub struct AutoDenyPrompt {
    pub reason: String,
}

impl PermissionPrompt for AutoDenyPrompt {
    fn request_host_access<'a>(
        &'a self,
        _origin: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<PermissionDecision>> + Send + 'a>> {
        Box::pin(async move {
            Ok(PermissionDecision::Denied {
                reason: self.reason.clone(),
            })
        })
    }
}

pub struct AutoGrantPrompt;

impl PermissionPrompt for AutoGrantPrompt {
    fn request_host_access<'a>(
        &'a self,
        _origin: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<PermissionDecision>> + Send + 'a>> {
        Box::pin(async move { Ok(PermissionDecision::Granted) })
    }
}

/// Terminal prompt for the simulation CLI.
pub struct CliPermissionPrompt {
    timeout: Duration,
}

impl CliPermissionPrompt {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn default_timeout() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl PermissionPrompt for CliPermissionPrompt {
    fn request_host_access<'a>(
        &'a self,
        origin: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<PermissionDecision>> + Send + 'a>> {
        Box::pin(async move {
            eprintln!();
            eprintln!("┌─ Site Access Requested ──────────────────────────");
            eprintln!("│ Origin:  {origin}");
            eprintln!("│ Allow linksweep to run on every page of this site?");
            eprintln!("├──────────────────────────────────────────────────");
            eprintln!("│ [A]llow  [D]eny");
            eprintln!("└──────────────────────────────────────────────────");
            eprint!("  > ");

            let answer = tokio::time::timeout(self.timeout, read_single_char()).await;

            match answer {
                Ok(Ok(ch)) => match ch.to_ascii_lowercase() {
                    'a' | 'y' => Ok(PermissionDecision::Granted),
                    'd' | 'n' => Ok(PermissionDecision::Denied {
                        reason: "denied by user".to_string(),
                    }),
                    _ => Ok(PermissionDecision::Denied {
                        reason: format!("unrecognized input: '{ch}'"),
                    }),
                },
                Ok(Err(e)) => Ok(PermissionDecision::Denied {
                    reason: format!("input error: {e}"),
                }),
                Err(_) => Ok(PermissionDecision::Denied {
                    reason: "permission prompt timed out".to_string(),
                }),
            }
        })
    }
}

async fn read_single_char() -> Result<char> {
    // stdin is blocking
    let ch = tokio::task::spawn_blocking(|| {
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        input
            .trim()
            .chars()
            .next()
            .ok_or_else(|| anyhow::anyhow!("no input received"))
    })
    .await??;
    Ok(ch)
}
