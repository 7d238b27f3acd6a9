//! Quota splitting between modalities and across teams.

use crate::numbers::{ceil_div, round_half_away};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Teams whose assigned/size ratio is within this distance of the minimum
/// count as tied for the next leftover unit.
const RATIO_TOLERANCE: f64 = 1e-6;

/// Degenerate quota inputs that would otherwise divide by zero.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuotaError {
    #[error("total quota must be positive")]
    NonPositiveQuota,
    #[error("cannot split a quota of {quota} over an empty applicant pool")]
    EmptyPopulation { quota: u32 },
}

/// Modality-level split of one round's quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSplit {
    pub team: u32,
    pub individual: u32,
}

/// Per-team quota ledger for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamQuota {
    pub team_id: String,
    pub size: u32,
    pub assigned: u32,
}

/// Split the round quota proportionally to modality head counts.
///
/// The individual share rounds half away from zero; the team share takes the
/// remainder, so the two always sum to the full quota.
///
/// # Errors
///
/// Fails on a zero quota or an empty applicant pool instead of producing
/// NaN shares.
pub fn split_mode_quota(
    team_applicants: u32,
    individual_applicants: u32,
    total_quota: u32,
) -> Result<ModeSplit, QuotaError> {
    if total_quota == 0 {
        return Err(QuotaError::NonPositiveQuota);
    }
    let total_applicants = team_applicants + individual_applicants;
    if total_applicants == 0 {
        return Err(QuotaError::EmptyPopulation { quota: total_quota });
    }
    let share = f64::from(total_quota) * f64::from(individual_applicants)
        / f64::from(total_applicants);
    let rounded = round_half_away(share).clamp(0, i64::from(total_quota));
    let individual = u32::try_from(rounded).unwrap_or(0);
    Ok(ModeSplit {
        team: total_quota - individual,
        individual,
    })
}

/// Applicant density used as the floor divisor for per-team base quotas.
#[must_use]
pub fn applicants_per_permit(total_applicants: u32, total_quota: u32) -> u64 {
    ceil_div(u64::from(total_applicants), u64::from(total_quota))
}

/// Distribute the team-mode quota across teams.
///
/// Every team starts from `floor(size / ratio)`; leftover units then go one at
/// a time to a uniformly random team among those with the minimal
/// assigned-to-size ratio. `team_sizes` must be in a stable order (sorted by
/// team id) so the outcome is a pure function of input and seed.
///
/// # Errors
///
/// Fails on degenerate totals, or when a positive team quota meets an empty
/// team list.
pub fn assign_team_quotas(
    team_sizes: &[(String, u32)],
    total_applicants: u32,
    total_quota: u32,
    team_quota: u32,
    rng: &mut impl Rng,
) -> Result<Vec<TeamQuota>, QuotaError> {
    if total_quota == 0 {
        return Err(QuotaError::NonPositiveQuota);
    }
    if team_sizes.is_empty() {
        if team_quota == 0 {
            return Ok(Vec::new());
        }
        return Err(QuotaError::EmptyPopulation { quota: team_quota });
    }

    let ratio = applicants_per_permit(total_applicants, total_quota);
    let mut quotas: Vec<TeamQuota> = team_sizes
        .iter()
        .map(|(team_id, size)| TeamQuota {
            team_id: team_id.clone(),
            size: *size,
            assigned: u32::try_from(u64::from(*size) / ratio.max(1)).unwrap_or(0),
        })
        .collect();

    let base: u64 = quotas.iter().map(|team| u64::from(team.assigned)).sum();
    let mut leftover = i64::from(team_quota) - i64::try_from(base).unwrap_or(i64::MAX);
    while leftover > 0 {
        let ratios: Vec<f64> = quotas
            .iter()
            .map(|team| f64::from(team.assigned) / f64::from(team.size))
            .collect();
        let minimum = ratios.iter().copied().fold(f64::INFINITY, f64::min);
        let candidates: Vec<usize> = ratios
            .iter()
            .enumerate()
            .filter(|(_, ratio)| (*ratio - minimum).abs() <= RATIO_TOLERANCE)
            .map(|(index, _)| index)
            .collect();
        let chosen = candidates[rng.gen_range(0..candidates.len())];
        quotas[chosen].assigned += 1;
        leftover -= 1;
    }
    Ok(quotas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn rng(seed: u64) -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(seed)
    }

    fn sizes(entries: &[(&str, u32)]) -> Vec<(String, u32)> {
        entries
            .iter()
            .map(|(id, size)| ((*id).to_string(), *size))
            .collect()
    }

    #[test]
    fn split_is_proportional_and_exact() {
        let split = split_mode_quota(10, 10, 5).unwrap();
        assert_eq!(split.individual, 3);
        assert_eq!(split.team, 2);
        assert_eq!(split.team + split.individual, 5);
    }

    #[test]
    fn split_rounds_half_away_from_zero() {
        // 7 * 5 / 14 = 2.5 exactly.
        let split = split_mode_quota(9, 5, 7).unwrap();
        assert_eq!(split.individual, 3);
        assert_eq!(split.team, 4);
    }

    #[test]
    fn split_rejects_degenerate_inputs() {
        assert_eq!(split_mode_quota(5, 5, 0), Err(QuotaError::NonPositiveQuota));
        assert_eq!(
            split_mode_quota(0, 0, 4),
            Err(QuotaError::EmptyPopulation { quota: 4 })
        );
    }

    #[test]
    fn split_keeps_single_modality_pools_whole() {
        let all_team = split_mode_quota(12, 0, 6).unwrap();
        assert_eq!(all_team.team, 6);
        assert_eq!(all_team.individual, 0);
        let all_individual = split_mode_quota(0, 12, 6).unwrap();
        assert_eq!(all_individual.individual, 6);
    }

    #[test]
    fn density_ratio_rounds_up() {
        assert_eq!(applicants_per_permit(20, 5), 4);
        assert_eq!(applicants_per_permit(21, 5), 5);
    }

    #[test]
    fn team_quotas_sum_to_the_team_share() {
        let teams = sizes(&[("Colla_1", 8), ("Colla_2", 13), ("Colla_3", 9)]);
        for seed in 0..8 {
            let quotas = assign_team_quotas(&teams, 50, 17, 11, &mut rng(seed)).unwrap();
            let total: u32 = quotas.iter().map(|team| team.assigned).sum();
            assert_eq!(total, 11);
        }
    }

    #[test]
    fn base_quota_is_size_over_density() {
        let teams = sizes(&[("Colla_1", 5), ("Colla_2", 5)]);
        let quotas = assign_team_quotas(&teams, 20, 5, 2, &mut rng(0)).unwrap();
        assert_eq!(quotas[0].assigned, 1);
        assert_eq!(quotas[1].assigned, 1);
    }

    #[test]
    fn leftover_prefers_the_least_served_team() {
        // Base quotas: floor(4/4)=1 and floor(11/4)=2; one leftover unit must
        // land on the team with the lower assigned/size ratio.
        let teams = sizes(&[("Colla_1", 4), ("Colla_2", 11)]);
        for seed in 0..8 {
            let quotas = assign_team_quotas(&teams, 15, 4, 4, &mut rng(seed)).unwrap();
            assert_eq!(quotas[0].assigned, 1);
            assert_eq!(quotas[1].assigned, 3);
        }
    }

    #[test]
    fn leftover_ties_are_broken_deterministically_per_seed() {
        let teams = sizes(&[("Colla_1", 10), ("Colla_2", 10)]);
        let first = assign_team_quotas(&teams, 20, 3, 3, &mut rng(9)).unwrap();
        let second = assign_team_quotas(&teams, 20, 3, 3, &mut rng(9)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_team_list_with_positive_share_is_an_error() {
        let err = assign_team_quotas(&[], 10, 5, 2, &mut rng(0)).unwrap_err();
        assert_eq!(err, QuotaError::EmptyPopulation { quota: 2 });
        assert!(assign_team_quotas(&[], 10, 5, 0, &mut rng(0))
            .unwrap()
            .is_empty());
    }
}
