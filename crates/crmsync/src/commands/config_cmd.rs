//! `crmsync config`: print the effective configuration.

use crmsync_config::Config;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub fn handle(config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            let body = toml::to_string_pretty(config).map_err(|e| CliError::Render(e.to_string()))?;
            let token = if config.token().is_some() { "set" } else { "unset" };
            format!(
                "# {}\n{body}# token: {token}",
                crmsync_config::config_path().display()
            )
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(config).map_err(|e| CliError::Render(e.to_string()))?
        }
        OutputFormat::JsonCompact => {
            serde_json::to_string(config).map_err(|e| CliError::Render(e.to_string()))?
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
