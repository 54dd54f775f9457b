//! Config command implementation.

use anyhow::{Context, Result};

use ferry_core::config::Config;

use super::{ConfigAction, ConfigArgs};

/// Run the config command.
pub fn run(args: &ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let config = super::load_config();
            let content =
                toml::to_string_pretty(&config).context("failed to serialize configuration")?;
            print!("{}", content);
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path().display());
        }
        ConfigAction::Init { force } => {
            let path = Config::config_path();
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save()?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
