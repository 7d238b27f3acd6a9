//! Minimum-team-size maintenance between rounds.

use crate::applicant::{Applicant, Modality};
use rand::Rng;
use rand::seq::index;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Individuals converted into one undersized team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamBackfill {
    pub team_id: String,
    pub moved: u32,
}

/// A team left undersized because the individual pool ran dry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamShortfall {
    pub team_id: String,
    pub missing: u32,
}

/// What one rebalance step did to the population.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceReport {
    pub backfills: SmallVec<[TeamBackfill; 4]>,
    pub shortfalls: SmallVec<[TeamShortfall; 4]>,
}

/// Pull uniformly sampled individuals into every team below the minimum
/// size. A team is only backfilled when the pool can cover its whole
/// shortfall; otherwise it stays undersized and is reported, never failed.
pub fn rebalance_teams(
    population: &mut [Applicant],
    min_team_size: u32,
    rng: &mut impl Rng,
) -> RebalanceReport {
    let mut report = RebalanceReport::default();

    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for applicant in population.iter() {
        if let (Modality::Team, Some(team_id)) = (applicant.modality, applicant.team_id.as_deref())
        {
            *counts.entry(team_id.to_string()).or_insert(0) += 1;
        }
    }

    for (team_id, members) in counts {
        if members >= min_team_size {
            continue;
        }
        let needed = min_team_size - members;
        let individuals: Vec<usize> = population
            .iter()
            .enumerate()
            .filter(|(_, applicant)| applicant.modality == Modality::Individual)
            .map(|(position, _)| position)
            .collect();
        if individuals.len() < needed as usize {
            report.shortfalls.push(TeamShortfall {
                team_id,
                missing: needed,
            });
            continue;
        }
        let picked = index::sample(rng, individuals.len(), needed as usize);
        for slot in picked {
            let position = individuals[slot];
            population[position].modality = Modality::Team;
            population[position].team_id = Some(team_id.clone());
        }
        report.backfills.push(TeamBackfill {
            team_id,
            moved: needed,
        });
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn rng(seed: u64) -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(seed)
    }

    fn population(team_sizes: &[(&str, u32)], individuals: u32) -> Vec<Applicant> {
        let mut snapshot = Vec::new();
        let mut id = 1;
        for (team_id, size) in team_sizes {
            for _ in 0..*size {
                snapshot.push(Applicant::new_entrant(
                    id,
                    Modality::Team,
                    Some((*team_id).to_string()),
                ));
                id += 1;
            }
        }
        for _ in 0..individuals {
            snapshot.push(Applicant::new_entrant(id, Modality::Individual, None));
            id += 1;
        }
        snapshot
    }

    fn team_size(population: &[Applicant], team_id: &str) -> usize {
        population
            .iter()
            .filter(|applicant| applicant.team_id.as_deref() == Some(team_id))
            .count()
    }

    #[test]
    fn undersized_teams_pull_from_the_individual_pool() {
        let mut snapshot = population(&[("Colla_1", 3), ("Colla_2", 6)], 10);
        let report = rebalance_teams(&mut snapshot, 5, &mut rng(11));
        assert_eq!(report.backfills.len(), 1);
        assert_eq!(report.backfills[0].moved, 2);
        assert_eq!(team_size(&snapshot, "Colla_1"), 5);
        assert_eq!(
            snapshot
                .iter()
                .filter(|applicant| applicant.modality == Modality::Individual)
                .count(),
            8
        );
    }

    #[test]
    fn starved_pool_leaves_the_team_undersized() {
        let mut snapshot = population(&[("Colla_1", 2)], 1);
        let report = rebalance_teams(&mut snapshot, 5, &mut rng(0));
        assert!(report.backfills.is_empty());
        assert_eq!(report.shortfalls.len(), 1);
        assert_eq!(report.shortfalls[0].missing, 3);
        assert_eq!(team_size(&snapshot, "Colla_1"), 2);
    }

    #[test]
    fn earlier_teams_can_starve_later_ones() {
        // Colla_1 consumes the whole pool; Colla_2 is left short.
        let mut snapshot = population(&[("Colla_1", 1), ("Colla_2", 1)], 4);
        let report = rebalance_teams(&mut snapshot, 5, &mut rng(5));
        assert_eq!(report.backfills.len(), 1);
        assert_eq!(report.backfills[0].team_id, "Colla_1");
        assert_eq!(report.shortfalls.len(), 1);
        assert_eq!(report.shortfalls[0].team_id, "Colla_2");
    }

    #[test]
    fn healthy_teams_are_untouched() {
        let mut snapshot = population(&[("Colla_1", 6)], 3);
        let report = rebalance_teams(&mut snapshot, 5, &mut rng(2));
        assert!(report.backfills.is_empty());
        assert!(report.shortfalls.is_empty());
        assert_eq!(team_size(&snapshot, "Colla_1"), 6);
    }
}
