//! Strategic-regrouping simulation: winners banding together each year.
//!
//! Models a cohort of applicants who, after winning once, regroup every
//! following year into a fresh team padded with other recent winners. Running
//! it against the plain simulation shows how much the team regime can be
//! gamed by coordinated winners.

use crate::applicant::{Applicant, ApplicantId, Modality};
use crate::history::{SimulationHistory, YearOutcome};
use crate::rng;
use crate::round::run_round;
use crate::sim::churn::ChurnReport;
use crate::sim::rebalance::RebalanceReport;
use crate::sim::{SimulationCfg, SimulationError, next_population};
use rand::Rng;
use rand::seq::index;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Configuration of the tracked winner cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingCfg {
    /// Cohort size, sampled from the first year's winners.
    pub tracked_count: u32,
}

/// History of a tracked run plus the cohort it followed.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingOutcome {
    pub history: SimulationHistory,
    pub tracked_ids: Vec<ApplicantId>,
}

impl TrackingOutcome {
    /// Mean award totals of the tracked cohort and of everyone else.
    #[must_use]
    pub fn mean_awards(&self) -> (f64, f64) {
        let tracked: BTreeSet<ApplicantId> = self.tracked_ids.iter().copied().collect();
        let totals = self.history.award_totals();
        let (mut tracked_sum, mut tracked_n, mut other_sum, mut other_n) = (0_u64, 0_u64, 0_u64, 0_u64);
        for (id, awards) in totals {
            if tracked.contains(&id) {
                tracked_sum += u64::from(awards);
                tracked_n += 1;
            } else {
                other_sum += u64::from(awards);
                other_n += 1;
            }
        }
        let mean = |sum: u64, n: u64| {
            if n == 0 {
                0.0
            } else {
                crate::numbers::u64_to_f64(sum) / crate::numbers::u64_to_f64(n)
            }
        };
        (mean(tracked_sum, tracked_n), mean(other_sum, other_n))
    }
}

/// Run a churn-free simulation in which the tracked cohort regroups with
/// other recent winners every year after the first.
///
/// # Errors
///
/// Fails like `run_simulation`, plus `NotEnoughWinners` when year one awards
/// fewer applicants than the cohort size.
pub fn run_tracking_simulation(
    initial: Vec<Applicant>,
    cfg: &SimulationCfg,
    tracking: &TrackingCfg,
) -> Result<TrackingOutcome, SimulationError> {
    cfg.validate()?;

    let mut population = initial;
    let mut tracked: Vec<ApplicantId> = Vec::new();
    let mut regroup_rng = rng::stream_rng(cfg.seed, b"tracking");
    let mut history = SimulationHistory::default();

    for year in 1..=cfg.years {
        if year > 1 && !tracked.is_empty() {
            if let Some(last) = history.years().last() {
                regroup(
                    &mut population,
                    last,
                    &tracked,
                    cfg.min_team_size,
                    year,
                    &mut regroup_rng,
                );
            }
        }

        let mut round_rng = rng::round_rng(cfg.seed, year);
        let outcome = run_round(&population, cfg.quota.quota_for(year), &mut round_rng)
            .map_err(|source| SimulationError::Round { year, source })?;

        if year == 1 {
            let winners: Vec<ApplicantId> = outcome
                .records
                .iter()
                .filter(|record| record.awards > 0)
                .map(|record| record.id)
                .collect();
            let available = u32::try_from(winners.len()).unwrap_or(u32::MAX);
            if available < tracking.tracked_count {
                return Err(SimulationError::NotEnoughWinners {
                    needed: tracking.tracked_count,
                    available,
                });
            }
            tracked = index::sample(&mut regroup_rng, winners.len(), tracking.tracked_count as usize)
                .into_iter()
                .map(|slot| winners[slot])
                .collect();
        }

        population = next_population(&outcome.records);
        history.push_year(YearOutcome {
            year,
            records: outcome.records,
            churn: ChurnReport::default(),
            rebalance: RebalanceReport::default(),
        });
    }

    Ok(TrackingOutcome {
        history,
        tracked_ids: tracked,
    })
}

/// Rebuild the tracked team for the coming year: cohort members who won last
/// year form the core; other last-year winners are sampled in until the team
/// reaches the minimum size.
fn regroup(
    population: &mut [Applicant],
    last_year: &YearOutcome,
    tracked: &[ApplicantId],
    min_team_size: u32,
    year: u32,
    rng: &mut impl Rng,
) {
    let tracked_set: BTreeSet<ApplicantId> = tracked.iter().copied().collect();
    let winners: BTreeSet<ApplicantId> = last_year
        .records
        .iter()
        .filter(|record| record.awards > 0)
        .map(|record| record.id)
        .collect();
    let core: Vec<ApplicantId> = winners.intersection(&tracked_set).copied().collect();
    if core.is_empty() {
        return;
    }

    let others: Vec<ApplicantId> = winners
        .iter()
        .filter(|id| !tracked_set.contains(id))
        .copied()
        .collect();
    let needed = (min_team_size as usize).saturating_sub(core.len());
    let fill = needed.min(others.len());
    let mut members: BTreeSet<ApplicantId> = core.into_iter().collect();
    if fill > 0 {
        for slot in index::sample(rng, others.len(), fill) {
            members.insert(others[slot]);
        }
    }

    let team_id = format!("TrackedColla_{year}");
    for applicant in population.iter_mut() {
        if members.contains(&applicant.id) {
            applicant.modality = Modality::Team;
            applicant.team_id = Some(team_id.clone());
        }
    }
}
