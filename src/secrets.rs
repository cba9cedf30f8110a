//! One-shot credential capture and log redaction.
//!
//! Passwords are prompted at most once, before the first task runs, and
//! reused read-only for every invocation. The live process gets the real
//! values; anything persisted to disk only ever sees the masked form.

use anyhow::{Context, Result};
use dialoguer::Password;

/// Extra-vars key carrying the shared SSH password.
pub const SSH_PASS_VAR: &str = "ansible_password";

/// Extra-vars key carrying the shared privilege-escalation password.
pub const BECOME_PASS_VAR: &str = "ansible_become_pass";

/// Stands in for secret values in logged command lines.
pub const MASK: &str = "***";

/// Shared credentials for a whole batch, captured once at startup.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    ssh_pass: Option<String>,
    become_pass: Option<String>,
}

impl Secrets {
    pub fn new(ssh_pass: Option<String>, become_pass: Option<String>) -> Self {
        Self {
            ssh_pass,
            become_pass,
        }
    }

    /// Interactively prompt for whichever secrets were requested.
    pub fn prompt(ask_pass: bool, ask_become_pass: bool) -> Result<Self> {
        let ssh_pass = if ask_pass {
            Some(read_password("SSH password")?)
        } else {
            None
        };
        let become_pass = if ask_become_pass {
            Some(read_password("BECOME password")?)
        } else {
            None
        };
        Ok(Self {
            ssh_pass,
            become_pass,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.ssh_pass.is_none() && self.become_pass.is_none()
    }

    /// `key=value` pairs handed to the live process via `--extra-vars`.
    pub fn extra_var_pairs(&self) -> Vec<String> {
        self.pairs(false)
    }

    /// The same pairs with every value masked, for persisted logs.
    pub fn redacted_pairs(&self) -> Vec<String> {
        self.pairs(true)
    }

    fn pairs(&self, redacted: bool) -> Vec<String> {
        let mut pairs = Vec::new();
        if let Some(pass) = &self.ssh_pass {
            pairs.push(pair(SSH_PASS_VAR, pass, redacted));
        }
        if let Some(pass) = &self.become_pass {
            pairs.push(pair(BECOME_PASS_VAR, pass, redacted));
        }
        pairs
    }
}

fn pair(key: &str, value: &str, redacted: bool) -> String {
    let value = if redacted { MASK } else { value };
    format!("{key}={value}")
}

fn read_password(prompt: &str) -> Result<String> {
    Password::new()
        .with_prompt(prompt)
        .interact()
        .with_context(|| format!("Failed to read {prompt}"))
}
