//! Config subcommand handlers.

use std::path::Path;

use cronwright_config::{Config, ConfigValidator};

use crate::cli::ConfigAction;

/// Handle config subcommands.
pub(crate) fn handle_config_command(
    action: ConfigAction,
    path: &Path,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Validate => {
            if !path.exists() {
                println!("{} not found, validating defaults", path.display());
            }

            let result = ConfigValidator::validate(config)?;
            for warning in &result.warnings {
                println!("warning: {}: {}", warning.path, warning.message);
            }
            for error in &result.errors {
                println!("error: {}: {}", error.path, error.message);
            }

            if result.is_valid() {
                println!("Configuration is valid.");
                Ok(())
            } else {
                Err(format!("{} configuration error(s)", result.errors.len()).into())
            }
        }
    }
}
