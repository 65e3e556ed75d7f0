//! Config for the profiler behaviors
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! The following environment variables can be used to override configuration values. All
//! values are optional. Flags are case-insensitive: set the value to `"true"` to enable one.
//!
//! - `PROFILER_VERBOSE`: Print setup failures on stderr (default: `true`)
//! - `PROFILER_LOG`: Enable logging to a file (default: `false`)
//! - `PROFILER_TEAMS_DIR`: Directory searched for teams given by name (default: `teams/` in
//!   the crate directory)
//! - `PROFILER_LAYOUTS_DIR`: Directory searched for layouts (default: `layouts/` in the crate
//!   directory)

use std::path::{Path, PathBuf};

/// Configuration for profiler behaviors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) verbose: bool,
    pub(crate) log: bool,
    pub(crate) teams_dir: PathBuf,
    pub(crate) layouts_dir: PathBuf,
}

fn crate_dir() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - Setup failures are reported on stderr.
    /// - Logging to file is disabled.
    /// - Teams and layouts are looked up next to the crate manifest.
    pub fn new() -> Self {
        Self {
            verbose: true,
            log: false,
            teams_dir: crate_dir().join("teams"),
            layouts_dir: crate_dir().join("layouts"),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Any unset variable keeps its default value. A flag set to anything but `"true"` is off.
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        let defaults = Self::new();
        Self {
            verbose: get_env_flag("PROFILER_VERBOSE", defaults.verbose),
            log: get_env_flag("PROFILER_LOG", defaults.log),
            teams_dir: std::env::var_os("PROFILER_TEAMS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.teams_dir),
            layouts_dir: std::env::var_os("PROFILER_LAYOUTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.layouts_dir),
        }
    }

    /// Enable or disable stderr reports.
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Directory searched for teams given by name.
    pub fn with_teams_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.teams_dir = dir.into();
        self
    }

    /// Directory searched for layouts.
    pub fn with_layouts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.layouts_dir = dir.into();
        self
    }

    /// Whether setup failures are printed on stderr
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Whether a log file is written
    pub fn log(&self) -> bool {
        self.log
    }

    /// Teams directory
    pub fn teams_dir(&self) -> &Path {
        &self.teams_dir
    }

    /// Layouts directory
    pub fn layouts_dir(&self) -> &Path {
        &self.layouts_dir
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_into_the_crate() {
        let config = Configuration::default();
        assert!(config.verbose());
        assert!(!config.log());
        assert!(config.teams_dir().ends_with("teams"));
        assert!(config.layouts_dir().join("tinyCapture.lay").is_file());
    }

    #[test]
    fn builders_override() {
        let config = Configuration::new()
            .with_verbose(false)
            .with_log(true)
            .with_teams_dir("/tmp/teams")
            .with_layouts_dir("/tmp/layouts");
        assert!(!config.verbose());
        assert!(config.log());
        assert_eq!(config.teams_dir(), Path::new("/tmp/teams"));
        assert_eq!(config.layouts_dir(), Path::new("/tmp/layouts"));
    }
}
