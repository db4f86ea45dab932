//! Configuration file bootstrap

use portweaver_core::config::toml_config::create_default_config;
use portweaver_core::error::PortWeaverError;
use std::path::Path;

/// Write the default configuration file unless one exists
pub fn run_init_config(config_path: &Path) -> Result<(), PortWeaverError> {
    if create_default_config(config_path)? {
        println!("✅ Created {}", config_path.display());
        println!("Edit the [qbittorrent] section before starting portweaver.");
    } else {
        println!("⚠️  {} already exists, leaving it unchanged", config_path.display());
    }
    Ok(())
}
