//! Secret reference resolver.
//!
//! Credential values in `config.toml` can point outside the file:
//!
//! - `env::VAR_NAME` reads `$VAR_NAME`
//! - `file::/path/to/secret` reads the whole file
//! - `pass::path/in/store` runs `pass show path/in/store`, returns the first line
//! - anything else is returned as-is

use crate::error::CliError;

/// Resolves a value that may contain a secret reference prefix.
pub fn resolve(value: &str) -> Result<String, CliError> {
    if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)
    } else if let Some(var) = value.strip_prefix("env::") {
        resolve_env(var)
    } else if let Some(path) = value.strip_prefix("file::") {
        resolve_file(path)
    } else {
        Ok(value.to_string())
    }
}

/// Returns true if `value` is a reference rather than the secret itself.
pub fn is_reference(value: &str) -> bool {
    ["pass::", "env::", "file::"]
        .iter()
        .any(|prefix| value.starts_with(prefix))
}

/// Runs `pass show <path>` and returns the first line of stdout.
fn resolve_pass(path: &str) -> Result<String, CliError> {
    let output = std::process::Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| CliError::Secret(format!("failed to run `pass show {}`: {}", path, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CliError::Secret(format!(
            "`pass show {}` failed (exit {}): {}",
            path,
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .next()
        .map(|s| s.to_string())
        .ok_or_else(|| CliError::Secret(format!("`pass show {}` produced no output", path)))
}

fn resolve_env(var: &str) -> Result<String, CliError> {
    std::env::var(var)
        .map_err(|_| CliError::Secret(format!("environment variable `{}` is not set", var)))
}

fn resolve_file(path: &str) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map(|content| content.trim_end().to_string())
        .map_err(|e| CliError::Secret(format!("failed to read `{}`: {}", path, e)))
}
