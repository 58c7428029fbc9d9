// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::fmt;
use std::path::{Path, PathBuf};

use path_clean::clean;

/// Strategy for locating a config file by walking up from a directory.
pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

/// Where the config file in use came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Passed in explicitly by the caller.
    Explicit(PathBuf),
    /// Found in the working directory or one of its parents.
    Discovered(PathBuf),
    /// Fallback in the OS config directory. May not exist.
    Default(PathBuf),
}

impl ConfigLocation {
    pub fn path(&self) -> &Path {
        match self {
            ConfigLocation::Explicit(p) | ConfigLocation::Discovered(p) | ConfigLocation::Default(p) => p,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            ConfigLocation::Explicit(p) | ConfigLocation::Discovered(p) | ConfigLocation::Default(p) => p,
        }
    }
}

impl fmt::Display for ConfigLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self {
            ConfigLocation::Explicit(_) => "explicit",
            ConfigLocation::Discovered(_) => "discovered",
            ConfigLocation::Default(_) => "default",
        };
        write!(f, "{} ({source})", self.path().display())
    }
}

pub fn find_in_parent(start: &Path, filename: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.is_file())
}

/// Pick the config file to load: an explicit file wins, then the nearest `filename` above
/// `cwd`, then the one in `default_dir`.
pub fn resolve_config_path(
    find: FindInParent,
    cwd: impl Into<PathBuf>,
    default_dir: impl Into<PathBuf>,
    filename: &str,
    explicit: Option<PathBuf>,
) -> ConfigLocation {
    let cwd = cwd.into();

    if let Some(file) = explicit {
        if file.is_absolute() {
            return ConfigLocation::Explicit(file);
        }
        return ConfigLocation::Explicit(clean(cwd.join(file)));
    }

    if let Some(found) = find(&cwd, filename) {
        return ConfigLocation::Discovered(found);
    }

    ConfigLocation::Default(clean(default_dir.into().join(filename)))
}
