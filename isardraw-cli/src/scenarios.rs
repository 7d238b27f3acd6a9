//! Scenario presets for management-plan studies.
//!
//! Each scenario bundles a synthetic population shape with a multi-year
//! simulation configuration, matching the study matrix used for the capture
//! plan reports. Custom scenario sets load from a JSON file with the same
//! shape.

use anyhow::{Context, Result};
use isardraw_engine::{GeneratorCfg, QuotaSchedule, SimulationCfg};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub summary: String,
    pub team_applicants: u32,
    pub individual_applicants: u32,
    pub min_team_size: u32,
    pub max_team_size: u32,
    pub quota_per_year: Vec<u32>,
    #[serde(default)]
    pub entrants_per_year: (u32, u32),
    #[serde(default)]
    pub retirees_per_year: (u32, u32),
}

impl Scenario {
    #[must_use]
    pub const fn generator_cfg(&self) -> GeneratorCfg {
        GeneratorCfg {
            team_applicants: self.team_applicants,
            individual_applicants: self.individual_applicants,
            min_team_size: self.min_team_size,
            max_team_size: self.max_team_size,
        }
    }

    #[must_use]
    pub fn simulation_cfg(&self, seed: Option<u64>) -> SimulationCfg {
        SimulationCfg {
            years: u32::try_from(self.quota_per_year.len()).unwrap_or(u32::MAX),
            quota: QuotaSchedule::PerYear(self.quota_per_year.clone()),
            seed,
            min_team_size: self.min_team_size,
            max_team_size: self.max_team_size,
            entrants_per_year: self.entrants_per_year,
            retirees_per_year: self.retirees_per_year,
        }
    }
}

fn preset(
    name: &str,
    summary: &str,
    min_team_size: u32,
    quota_per_year: Vec<u32>,
    churn: (u32, u32),
) -> Scenario {
    Scenario {
        name: name.to_string(),
        summary: summary.to_string(),
        team_applicants: 175,
        individual_applicants: 190,
        min_team_size,
        max_team_size: 20,
        quota_per_year,
        entrants_per_year: churn,
        retirees_per_year: churn,
    }
}

/// The built-in study matrix: stable and variable quotas, random churn,
/// each at the two candidate minimum team sizes.
#[must_use]
pub fn builtin() -> Vec<Scenario> {
    let variable = vec![60, 150, 100, 300, 120, 80];
    vec![
        preset(
            "base-min-8",
            "Fixed 150-permit quota, stable population, teams of at least 8",
            8,
            vec![150; 6],
            (0, 0),
        ),
        preset(
            "base-min-6",
            "Fixed 150-permit quota, stable population, teams of at least 6",
            6,
            vec![150; 6],
            (0, 0),
        ),
        preset(
            "variable-quota-min-8",
            "Yearly quota swinging between 60 and 300, teams of at least 8",
            8,
            variable.clone(),
            (0, 0),
        ),
        preset(
            "variable-quota-min-6",
            "Yearly quota swinging between 60 and 300, teams of at least 6",
            6,
            variable,
            (0, 0),
        ),
        preset(
            "churn-min-8",
            "Fixed quota with 10-100 entrants and retirees per year, teams of at least 8",
            8,
            vec![150; 6],
            (10, 100),
        ),
        preset(
            "churn-min-6",
            "Fixed quota with 10-100 entrants and retirees per year, teams of at least 6",
            6,
            vec![150; 6],
            (10, 100),
        ),
    ]
}

/// Look up a built-in scenario by name.
#[must_use]
pub fn find(name: &str) -> Option<Scenario> {
    builtin().into_iter().find(|scenario| scenario.name == name)
}

/// Load a custom scenario set from a JSON file.
pub fn load_file(path: &Path) -> Result<Vec<Scenario>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read scenario file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
