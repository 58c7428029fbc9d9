// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Read a YAML file and substitute `${VAR}` references from the environment.
pub fn load_yaml_with_env(file_path: &Path) -> Result<String> {
    let content = fs::read_to_string(file_path)?;
    let expanded = shellexpand::env(&content)
        .with_context(|| format!("Could not expand environment in {}", file_path.display()))?;
    Ok(expanded.into_owned())
}
