//! Between-round population churn: retirements and new entrants.

use crate::applicant::{Applicant, ApplicantId, Modality};
use crate::sim::SimulationCfg;
use rand::Rng;
use rand::seq::index;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What one churn step did to the population.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnReport {
    pub retired: u32,
    pub joined_existing: u32,
    pub joined_new_teams: u32,
    pub joined_individual: u32,
    pub new_team_ids: Vec<String>,
}

impl ChurnReport {
    /// Entrants added across all destinations.
    #[must_use]
    pub const fn entrants(&self) -> u32 {
        self.joined_existing + self.joined_new_teams + self.joined_individual
    }
}

/// Apply one year's churn: retire a random draw of applicants, then admit a
/// random draw of entrants split 30% into existing teams, 30% into fresh
/// minimum-size teams and the remainder into the individual pool.
pub fn apply_churn(
    population: &mut Vec<Applicant>,
    cfg: &SimulationCfg,
    next_id: &mut ApplicantId,
    rng: &mut impl Rng,
) -> ChurnReport {
    let mut report = ChurnReport {
        retired: retire(population, cfg.retirees_per_year, rng),
        ..ChurnReport::default()
    };
    admit(population, cfg, next_id, rng, &mut report);
    report
}

fn draw_in_range(range: (u32, u32), rng: &mut impl Rng) -> u32 {
    let (low, high) = range;
    if high == 0 { 0 } else { rng.gen_range(low..=high) }
}

fn retire(population: &mut Vec<Applicant>, range: (u32, u32), rng: &mut impl Rng) -> u32 {
    let count = draw_in_range(range, rng) as usize;
    if count == 0 || population.len() <= count {
        return 0;
    }
    let mut picked = index::sample(rng, population.len(), count).into_vec();
    picked.sort_unstable_by(|a, b| b.cmp(a));
    for position in picked {
        population.remove(position);
    }
    u32::try_from(count).unwrap_or(u32::MAX)
}

fn admit(
    population: &mut Vec<Applicant>,
    cfg: &SimulationCfg,
    next_id: &mut ApplicantId,
    rng: &mut impl Rng,
    report: &mut ChurnReport,
) {
    let count = draw_in_range(cfg.entrants_per_year, rng);
    if count == 0 {
        return;
    }
    let mut to_existing = count * 3 / 10;
    let to_new_teams = count * 3 / 10;
    let mut to_individual = count - to_existing - to_new_teams;

    let existing: Vec<String> = population
        .iter()
        .filter_map(|applicant| applicant.team_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    // With no team to join, that share of entrants falls back to the
    // individual pool so churn arithmetic stays exact.
    if existing.is_empty() {
        to_individual += to_existing;
        to_existing = 0;
    }

    for _ in 0..to_existing {
        let team_id = existing[rng.gen_range(0..existing.len())].clone();
        population.push(Applicant::new_entrant(
            *next_id,
            Modality::Team,
            Some(team_id),
        ));
        *next_id += 1;
        report.joined_existing += 1;
    }

    let mut remaining = to_new_teams;
    while remaining > 0 {
        let team_id = format!("NovaColla_{next_id}");
        report.new_team_ids.push(team_id.clone());
        let size = remaining.min(cfg.min_team_size);
        for _ in 0..size {
            population.push(Applicant::new_entrant(
                *next_id,
                Modality::Team,
                Some(team_id.clone()),
            ));
            *next_id += 1;
        }
        remaining -= size;
        report.joined_new_teams += size;
    }

    for _ in 0..to_individual {
        population.push(Applicant::new_entrant(*next_id, Modality::Individual, None));
        *next_id += 1;
        report.joined_individual += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::QuotaSchedule;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn rng(seed: u64) -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(seed)
    }

    fn cfg(entrants: (u32, u32), retirees: (u32, u32)) -> SimulationCfg {
        SimulationCfg {
            years: 1,
            quota: QuotaSchedule::Fixed(10),
            seed: Some(1),
            min_team_size: 4,
            max_team_size: 8,
            entrants_per_year: entrants,
            retirees_per_year: retirees,
        }
    }

    fn base_population() -> Vec<Applicant> {
        let mut population = Vec::new();
        for id in 1..=6 {
            population.push(Applicant::new_entrant(
                id,
                Modality::Team,
                Some("Colla_1".to_string()),
            ));
        }
        for id in 7..=12 {
            population.push(Applicant::new_entrant(id, Modality::Individual, None));
        }
        population
    }

    #[test]
    fn churn_conserves_the_population_arithmetic() {
        let mut population = base_population();
        let before = population.len();
        let mut next_id = 13;
        let report = apply_churn(
            &mut population,
            &cfg((10, 10), (2, 2)),
            &mut next_id,
            &mut rng(4),
        );
        assert_eq!(report.retired, 2);
        assert_eq!(report.entrants(), 10);
        assert_eq!(
            population.len(),
            before - report.retired as usize + report.entrants() as usize
        );
    }

    #[test]
    fn entrants_split_thirty_thirty_rest() {
        let mut population = base_population();
        let mut next_id = 13;
        let report = apply_churn(
            &mut population,
            &cfg((10, 10), (0, 0)),
            &mut next_id,
            &mut rng(9),
        );
        assert_eq!(report.joined_existing, 3);
        assert_eq!(report.joined_new_teams, 3);
        assert_eq!(report.joined_individual, 4);
        assert_eq!(report.new_team_ids.len(), 1);
    }

    #[test]
    fn entrants_fall_back_to_individual_without_teams() {
        let mut population: Vec<Applicant> = (1..=5)
            .map(|id| Applicant::new_entrant(id, Modality::Individual, None))
            .collect();
        let mut next_id = 6;
        let report = apply_churn(
            &mut population,
            &cfg((10, 10), (0, 0)),
            &mut next_id,
            &mut rng(2),
        );
        assert_eq!(report.joined_existing, 0);
        assert_eq!(report.joined_individual, 7);
        assert_eq!(report.joined_new_teams, 3);
    }

    #[test]
    fn retirement_never_empties_the_population() {
        let mut population: Vec<Applicant> = (1..=3)
            .map(|id| Applicant::new_entrant(id, Modality::Individual, None))
            .collect();
        let mut next_id = 4;
        let report = apply_churn(
            &mut population,
            &cfg((0, 0), (5, 5)),
            &mut next_id,
            &mut rng(1),
        );
        assert_eq!(report.retired, 0);
        assert_eq!(population.len(), 3);
    }

    #[test]
    fn new_entrants_receive_fresh_sequential_ids() {
        let mut population = base_population();
        let mut next_id = 13;
        let report = apply_churn(
            &mut population,
            &cfg((5, 5), (0, 0)),
            &mut next_id,
            &mut rng(3),
        );
        assert_eq!(next_id, 13 + u64::from(report.entrants()));
        let mut ids: Vec<ApplicantId> = population.iter().map(|a| a.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), population.len());
    }
}
