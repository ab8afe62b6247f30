//! Configuration commands.

use std::path::Path;

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Dump the current configuration to stdout.
///
/// Secret references are printed as written; plain-text access tokens are masked.
pub fn dump(config: &AppConfig, path: &Path) -> CliResult<()> {
    let toml_str = toml::to_string_pretty(&masked(config))
        .map_err(|e| CliError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &AppConfig) -> CliResult<()> {
    config.validate()?;

    #[cfg(feature = "google")]
    if let Some(ref google) = config.google {
        google.resolve_credential()?;
        println!("Google credentials resolve.");
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> CliResult<()> {
    println!("config: {}", path.display());
    Ok(())
}

fn masked(config: &AppConfig) -> AppConfig {
    #[allow(unused_mut)]
    let mut config = config.clone();
    #[cfg(feature = "google")]
    if let Some(ref mut google) = config.google {
        for value in [&mut google.access_token, &mut google.credentials]
            .into_iter()
            .flatten()
        {
            if !crate::secret::is_reference(value) {
                *value = "********".to_string();
            }
        }
    }
    config
}

#[cfg(all(test, feature = "google"))]
mod tests {
    use super::*;

    #[test]
    fn dump_masks_inline_secrets() {
        let config = AppConfig::parse(
            "[google]\naccess_token = \"ya29.inline\"\ncredentials = \"env::SA_KEY\"\n",
        )
        .unwrap();

        let google = masked(&config).google.unwrap();
        assert_eq!(google.access_token.as_deref(), Some("********"));
        assert_eq!(google.credentials.as_deref(), Some("env::SA_KEY"));
    }
}
