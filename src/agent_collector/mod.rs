//! Finding team files from what the user typed.
//!
//! A team is given either as a path or as a bare name. Resolution never fails: when nothing
//! matches, the path inside the known teams directory is returned and loading it later reports
//! the missing file as an agent load failure.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

pub mod team_file;

/// Extension of team files.
pub const TEAM_FILE_EXTENSION: &str = "json";

/// Resolve `team` to a team file path.
///
/// 1. Append `.json` unless `team` already ends with it.
/// 2. If that path exists (absolute, or relative to the working directory), return it as an
///    absolute path.
/// 3. Otherwise look for the same file name inside `teams_dir`.
/// 4. Otherwise return the `teams_dir` candidate anyway.
#[instrument(level = "debug")]
pub fn resolve_team_path(team: &str, teams_dir: &Path) -> PathBuf {
    let suffix = format!(".{TEAM_FILE_EXTENSION}");
    let team_path = if team.ends_with(&suffix) {
        PathBuf::from(team)
    } else {
        PathBuf::from(format!("{team}{suffix}"))
    };

    if team_path.exists() {
        debug!(path = ?team_path, "team found as given");
        return absolute(&team_path);
    }

    let file_name = team_path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| team_path.clone());
    let known_path = absolute(&teams_dir.join(file_name));
    if known_path.exists() {
        debug!(path = ?known_path, "team found in teams directory");
    } else {
        debug!(path = ?known_path, "team not found");
    }
    known_path
}

/// Name displayed for a team: its file stem.
pub fn team_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn existing_path_is_used_as_given() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("my_team.json");
        std::fs::write(&file, "{}").unwrap();

        let resolved = resolve_team_path(file.to_str().unwrap(), Path::new("/nonexistent"));
        assert_eq!(resolved, file.canonicalize().unwrap());
    }

    #[test]
    fn extension_is_appended() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("my_team.json");
        std::fs::write(&file, "{}").unwrap();

        let bare = dir.path().join("my_team");
        let resolved = resolve_team_path(bare.to_str().unwrap(), Path::new("/nonexistent"));
        assert_eq!(resolved, file.canonicalize().unwrap());
    }

    #[test]
    fn falls_back_to_teams_dir() {
        let teams = TempDir::new().unwrap();
        std::fs::write(teams.path().join("unique_team_name_for_test.json"), "{}").unwrap();

        let resolved = resolve_team_path("unique_team_name_for_test", teams.path());
        assert_eq!(
            resolved,
            teams
                .path()
                .join("unique_team_name_for_test.json")
                .canonicalize()
                .unwrap()
        );
    }

    #[test]
    fn missing_team_points_into_teams_dir() {
        let teams = TempDir::new().unwrap();
        let resolved = resolve_team_path("some/where/ghost_team.json", teams.path());
        assert_eq!(resolved, teams.path().join("ghost_team.json"));
        assert!(!resolved.exists());
    }

    #[test]
    fn scratch_teams_are_removed() {
        let teams = TempDir::new().unwrap();
        let path = teams.path().to_path_buf();
        std::fs::write(path.join("red.json"), "{}").unwrap();
        assert!(resolve_team_path("red", &path).exists());

        drop(teams);
        assert!(!path.exists());
    }

    #[test]
    fn name_is_file_stem() {
        assert_eq!(team_name(Path::new("/a/b/baseline_team.json")), "baseline_team");
        assert_eq!(team_name(Path::new("red.json")), "red");
    }
}
