//! Multi-year population simulation driving the fair draw.
//!
//! Each year runs the same strictly ordered phases: churn (skipped in year
//! one), team rebalancing, the draw round itself and archiving. Population
//! state threads sequentially from year to year, so a run is single-threaded
//! by construction; Monte Carlo replicates each own an independent stream and
//! population clone.

pub mod churn;
pub mod rebalance;
pub mod tracking;

use crate::applicant::Applicant;
use crate::history::{SimulationHistory, YearOutcome};
use crate::rng;
use crate::round::{AwardRecord, DrawError, run_round};
use crate::sim::churn::{ChurnReport, apply_churn};
use crate::sim::rebalance::{RebalanceReport, rebalance_teams};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Permit quota per simulated year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuotaSchedule {
    /// The same quota every year.
    Fixed(u32),
    /// One quota per year, in year order.
    PerYear(Vec<u32>),
}

impl QuotaSchedule {
    /// Quota for a one-based year number.
    #[must_use]
    pub fn quota_for(&self, year: u32) -> u32 {
        match self {
            Self::Fixed(quota) => *quota,
            Self::PerYear(quotas) => quotas
                .get(year.saturating_sub(1) as usize)
                .copied()
                .unwrap_or(0),
        }
    }

    fn validate(&self, years: u32) -> Result<(), SimulationCfgError> {
        match self {
            Self::Fixed(quota) => {
                if *quota == 0 {
                    return Err(SimulationCfgError::ZeroQuota { year: 1 });
                }
            }
            Self::PerYear(quotas) => {
                let listed = u32::try_from(quotas.len()).unwrap_or(u32::MAX);
                if listed != years {
                    return Err(SimulationCfgError::ScheduleMismatch { listed, years });
                }
                if let Some(position) = quotas.iter().position(|quota| *quota == 0) {
                    return Err(SimulationCfgError::ZeroQuota {
                        year: u32::try_from(position).unwrap_or(u32::MAX) + 1,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationCfg {
    pub years: u32,
    pub quota: QuotaSchedule,
    /// Base seed; absent means every stream draws fresh entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "SimulationCfg::default_min_team_size")]
    pub min_team_size: u32,
    #[serde(default = "SimulationCfg::default_max_team_size")]
    pub max_team_size: u32,
    /// Inclusive range of new entrants per year.
    #[serde(default)]
    pub entrants_per_year: (u32, u32),
    /// Inclusive range of retirees per year.
    #[serde(default)]
    pub retirees_per_year: (u32, u32),
}

impl SimulationCfg {
    #[must_use]
    pub const fn default_min_team_size() -> u32 {
        8
    }

    #[must_use]
    pub const fn default_max_team_size() -> u32 {
        20
    }

    /// Validate the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns a `SimulationCfgError` naming the violated bound.
    pub fn validate(&self) -> Result<(), SimulationCfgError> {
        if self.years == 0 {
            return Err(SimulationCfgError::NoYears);
        }
        if self.min_team_size == 0 || self.min_team_size > self.max_team_size {
            return Err(SimulationCfgError::TeamSizeRange {
                min: self.min_team_size,
                max: self.max_team_size,
            });
        }
        for (field, range) in [
            ("entrants_per_year", self.entrants_per_year),
            ("retirees_per_year", self.retirees_per_year),
        ] {
            if range.0 > range.1 {
                return Err(SimulationCfgError::RangeOrder {
                    field,
                    min: range.0,
                    max: range.1,
                });
            }
        }
        self.quota.validate(self.years)
    }
}

/// Violations of the simulation configuration invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimulationCfgError {
    #[error("simulation must cover at least one year")]
    NoYears,
    #[error("quota schedule lists {listed} years but the simulation runs {years}")]
    ScheduleMismatch { listed: u32, years: u32 },
    #[error("quota for year {year} must be positive")]
    ZeroQuota { year: u32 },
    #[error("minimum team size {min} must be positive and at most the maximum {max}")]
    TeamSizeRange { min: u32, max: u32 },
    #[error("{field} range invalid (min {min} > max {max})")]
    RangeOrder {
        field: &'static str,
        min: u32,
        max: u32,
    },
}

/// Failures that abort a whole simulation run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] SimulationCfgError),
    #[error("year {year}: {source}")]
    Round { year: u32, source: DrawError },
    #[error("tracking needs {needed} first-year winners but only {available} were drawn")]
    NotEnoughWinners { needed: u32, available: u32 },
}

/// Run a full multi-year simulation over an initial population snapshot.
///
/// Any round failure aborts the run; no partial history is returned.
///
/// # Errors
///
/// Returns a `SimulationError` for invalid configuration or a failed round.
pub fn run_simulation(
    initial: Vec<Applicant>,
    cfg: &SimulationCfg,
) -> Result<SimulationHistory, SimulationError> {
    cfg.validate()?;

    let mut population = initial;
    let mut next_id = population.iter().map(|a| a.id).max().map_or(1, |id| id + 1);
    let mut churn_rng = rng::stream_rng(cfg.seed, b"churn");
    let mut history = SimulationHistory::default();

    for year in 1..=cfg.years {
        let (churn_report, rebalance_report) = if year > 1 {
            let churn = apply_churn(&mut population, cfg, &mut next_id, &mut churn_rng);
            let rebalance = rebalance_teams(&mut population, cfg.min_team_size, &mut churn_rng);
            (churn, rebalance)
        } else {
            (ChurnReport::default(), RebalanceReport::default())
        };

        let mut round_rng = rng::round_rng(cfg.seed, year);
        let outcome = run_round(&population, cfg.quota.quota_for(year), &mut round_rng)
            .map_err(|source| SimulationError::Round { year, source })?;

        population = next_population(&outcome.records);
        history.push_year(YearOutcome {
            year,
            records: outcome.records,
            churn: churn_report,
            rebalance: rebalance_report,
        });
    }
    Ok(history)
}

/// Run independent Monte Carlo replicates of the same configuration.
///
/// Each replicate owns its own derived seed, streams and population clone.
///
/// # Errors
///
/// Returns the first replicate failure.
pub fn run_replicates(
    initial: &[Applicant],
    cfg: &SimulationCfg,
    replicates: u32,
) -> Result<Vec<SimulationHistory>, SimulationError> {
    let mut runs = Vec::with_capacity(replicates as usize);
    for replicate in 1..=replicates {
        let mut replicate_cfg = cfg.clone();
        replicate_cfg.seed = cfg
            .seed
            .map(|seed| rng::derive_replicate_seed(seed, replicate));
        runs.push(run_simulation(initial.to_vec(), &replicate_cfg)?);
    }
    Ok(runs)
}

/// Next year's snapshot: identity and membership carry over, award state
/// becomes the post-processed priority and aging counters.
pub(crate) fn next_population(records: &[AwardRecord]) -> Vec<Applicant> {
    records
        .iter()
        .map(|record| Applicant {
            id: record.id,
            modality: record.modality,
            priority: record.next_priority,
            team_id: record.team_id.clone(),
            years_without_award: record.next_years_without_award,
            carried_result: None,
            accumulated_awards: None,
        })
        .collect()
}
