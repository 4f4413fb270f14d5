//! Subcommand implementations.

pub mod check;
pub mod init;
pub mod list_rules;
pub mod output;

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::config_resolver::{self, PROJECT_CONFIG_NAMES};

/// Resolves the configuration file, failing when there is none.
pub fn config_path(project_dir: &Path, explicit: Option<&Path>) -> Result<PathBuf> {
    let location = config_resolver::resolve(project_dir, explicit);
    let Some(path) = location.path() else {
        bail!(
            "No configuration found in {} (looked for {}). Run `stricter init` or pass --config.",
            project_dir.display(),
            PROJECT_CONFIG_NAMES.join(", ")
        );
    };
    Ok(path.to_path_buf())
}
