//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# stricter configuration

# Directory to analyze, relative to this file
root = "src"

# Regular expressions matched against full paths
exclude = ['.*\.json', '/node_modules/']

# Directories of declarative rule files (*.toml)
# rules-dir = "rules"

# Package globs, relative to root (default: first-level dirs with a package.json)
# packages = ["*"]

[[rules."stricter/unused-files"]]
level = "error"
config = { entry = ['/src/index\.[jt]sx?$'] }

[[rules."stricter/circular-dependencies"]]
level = "warn"
"#;

/// File name written by `init`.
pub const CONFIG_NAME: &str = "stricter.toml";

/// Writes a starter configuration into `dir`.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;

    println!("Created {CONFIG_NAME}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_NAME} to configure rules");
    println!("  2. Run: stricter");

    Ok(())
}
