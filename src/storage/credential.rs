//! Credentials - Short-lived access tokens gating the connection pool
//!
//! The connection manager fetches a credential before it builds a pool and
//! throws the pool away once the credential is too old. Where the token
//! comes from is up to the [`CredentialSource`].

use std::fmt;
use std::process::Command;
use std::time::{Duration, Instant};
use crate::{Error, Result};

/// Default age after which a credential is considered stale (15 minutes)
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(15 * 60);

/// An access token and the moment it was obtained.
#[derive(Clone)]
pub struct Credential {
    token: String,
    issued_at: Instant,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            issued_at: Instant::now(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn age(&self) -> Duration {
        self.issued_at.elapsed()
    }

    /// A credential at least `max_age` old must be replaced
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.age() >= max_age
    }
}

// Never print the token itself
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("age", &self.age())
            .finish()
    }
}

/// Anything that can hand out a fresh credential.
pub trait CredentialSource: Send + Sync {
    fn fetch(&self) -> Result<Credential>;

    /// Short label for logs
    fn describe(&self) -> String;
}

/// A fixed token, for local stores that need no real secret.
pub struct StaticCredential {
    token: String,
}

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl CredentialSource for StaticCredential {
    fn fetch(&self) -> Result<Credential> {
        Ok(Credential::new(self.token.clone()))
    }

    fn describe(&self) -> String {
        "static token".to_string()
    }
}

/// Reads the token from an environment variable on every fetch.
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvCredential {
    fn fetch(&self) -> Result<Credential> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(Credential::new(token.trim())),
            Ok(_) => Err(Error::Credential(format!("environment variable {} is empty", self.var))),
            Err(_) => Err(Error::Credential(format!("environment variable {} is not set", self.var))),
        }
    }

    fn describe(&self) -> String {
        format!("env ${}", self.var)
    }
}

/// Runs an external command and uses its trimmed stdout as the token.
pub struct CommandCredential {
    program: String,
    args: Vec<String>,
}

impl CommandCredential {
    /// Build from an argv list; the first element is the program
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::Credential("credential command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl CredentialSource for CommandCredential {
    fn fetch(&self) -> Result<Credential> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| Error::Credential(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Credential(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(Error::Credential(format!("{} printed no token", self.program)));
        }
        Ok(Credential::new(token))
    }

    fn describe(&self) -> String {
        format!("command {}", self.program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staleness() {
        let credential = Credential::new("t");
        assert!(!credential.is_stale(DEFAULT_MAX_AGE));
        assert!(credential.is_stale(Duration::ZERO));
    }

    #[test]
    fn test_debug_redacts_token() {
        let credential = Credential::new("super-secret");
        let printed = format!("{:?}", credential);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("redacted"));
    }

    #[test]
    fn test_env_credential_missing_var() {
        let source = EnvCredential::new("GRAPH_EDITOR_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert!(matches!(source.fetch(), Err(Error::Credential(_))));
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(CommandCredential::from_argv(&[]), Err(Error::Credential(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_credential() {
        let argv = vec!["sh".to_string(), "-c".to_string(), "echo '  tok-123  '".to_string()];
        let source = CommandCredential::from_argv(&argv).unwrap();
        assert_eq!(source.fetch().unwrap().token(), "tok-123");

        let failing = vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()];
        let source = CommandCredential::from_argv(&failing).unwrap();
        assert!(matches!(source.fetch(), Err(Error::Credential(_))));
    }
}
