//! Team file format.
//!
//! ```json
//! {
//!   "name": "baseline_team",
//!   "agents": ["offensive", "defensive"],
//!   "seed": 7
//! }
//! ```
//!
//! `agents` lists one strategy per agent of the team, in index order. `seed` is optional; without
//! it agents break ties with a random seed.

use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::instrument;

use crate::game_interface::AgentOptions;

/// Parsed team file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeamFile {
    /// Display name, defaults to the file stem
    #[serde(default)]
    pub name: Option<String>,
    /// One strategy name per agent
    pub agents: Vec<String>,
    /// Seed for the agents' tie-breaking
    #[serde(default)]
    pub seed: Option<u64>,
}

impl TeamFile {
    /// Parse a team file's content.
    pub fn parse(json: &str) -> anyhow::Result<Self> {
        let team: TeamFile = serde_json::from_str(json).context("invalid team file")?;
        if team.agents.is_empty() {
            bail!("team has no agents");
        }
        Ok(team)
    }

    /// Apply loading options on top of the file. Only `seed` is recognized.
    pub fn with_options(mut self, options: &AgentOptions) -> anyhow::Result<Self> {
        if let Some(seed) = options.get("seed") {
            self.seed = Some(
                seed.parse()
                    .with_context(|| format!("could not parse seed '{seed}'"))?,
            );
        }
        Ok(self)
    }
}

/// Read and parse the team file at `path`.
#[instrument(level = "debug")]
pub fn read_team_file(path: &Path) -> anyhow::Result<TeamFile> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("could not read team file {}", path.display()))?;
    TeamFile::parse(&json).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let team = TeamFile::parse(
            r#"{ "name": "baseline", "agents": ["offensive", "defensive"], "seed": 3 }"#,
        )
        .unwrap();
        assert_eq!(team.name.as_deref(), Some("baseline"));
        assert_eq!(team.agents, vec!["offensive", "defensive"]);
        assert_eq!(team.seed, Some(3));
    }

    #[test]
    fn optional_fields() {
        let team = TeamFile::parse(r#"{ "agents": ["random"] }"#).unwrap();
        assert_eq!(team.name, None);
        assert_eq!(team.seed, None);
    }

    #[test]
    fn rejects_empty_or_invalid() {
        assert!(TeamFile::parse(r#"{ "agents": [] }"#).is_err());
        assert!(TeamFile::parse("agents: offensive").is_err());
        assert!(TeamFile::parse(r#"{ "name": "no agents" }"#).is_err());
    }

    #[test]
    fn seed_option_overrides_file() {
        let team = TeamFile::parse(r#"{ "agents": ["stop"], "seed": 1 }"#).unwrap();
        let options = AgentOptions::from([("seed".to_owned(), "99".to_owned())]);
        assert_eq!(team.clone().with_options(&options).unwrap().seed, Some(99));
        assert_eq!(team.clone().with_options(&AgentOptions::new()).unwrap().seed, Some(1));

        let bad = AgentOptions::from([("seed".to_owned(), "abc".to_owned())]);
        assert!(team.with_options(&bad).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = read_team_file(Path::new("/nonexistent/team.json")).unwrap_err();
        assert!(err.to_string().contains("could not read team file"));
    }
}
