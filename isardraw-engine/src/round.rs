//! Single-round draw orchestration and award post-processing.

use crate::applicant::{
    Applicant, ApplicantId, Modality, PRIORITY_SERVED, PRIORITY_WAITING, SnapshotError,
    validate_snapshot,
};
use crate::assign::{DrawMode, PoolEntry, assign_units};
use crate::quota::{ModeSplit, QuotaError, TeamQuota, assign_team_quotas, split_mode_quota};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Failures that abort a round before any output is produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DrawError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Quota(#[from] QuotaError),
}

/// Per-applicant outcome of one round, in snapshot order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardRecord {
    #[serde(rename = "ID")]
    pub id: ApplicantId,
    #[serde(rename = "Modalitat")]
    pub modality: Modality,
    #[serde(rename = "Prioritat")]
    pub priority: u32,
    #[serde(rename = "Colla_ID")]
    pub team_id: Option<String>,
    #[serde(rename = "anys_sense_captura")]
    pub years_without_award: u32,
    #[serde(rename = "adjudicats")]
    pub awards: u32,
    #[serde(rename = "nova_prioritat")]
    pub next_priority: u32,
    #[serde(rename = "nou_anys_sense_captura")]
    pub next_years_without_award: u32,
}

/// Full result of one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    pub records: Vec<AwardRecord>,
    pub split: ModeSplit,
    pub team_quotas: Vec<TeamQuota>,
}

impl RoundOutcome {
    /// Units actually awarded this round.
    #[must_use]
    pub fn total_awarded(&self) -> u32 {
        self.records.iter().map(|record| record.awards).sum()
    }
}

/// Priority class an applicant carries into the next round.
#[must_use]
pub const fn next_priority(awards: u32) -> u32 {
    if awards > 0 { PRIORITY_SERVED } else { PRIORITY_WAITING }
}

/// Years-without-award counter an applicant carries into the next round.
#[must_use]
pub const fn next_years_without_award(awards: u32, years_without_award: u32) -> u32 {
    if awards > 0 { 0 } else { years_without_award + 1 }
}

/// Run one full draw round over a population snapshot.
///
/// Splits the quota between modalities, distributes the team share across
/// teams, awards each pool with the fair assignment engine and derives every
/// applicant's next-round state. Pools that cannot absorb their share leave
/// the remainder unawarded.
///
/// # Errors
///
/// Returns a `DrawError` for invalid snapshots or degenerate quotas; nothing
/// is awarded in that case.
pub fn run_round(
    snapshot: &[Applicant],
    total_quota: u32,
    rng: &mut impl Rng,
) -> Result<RoundOutcome, DrawError> {
    validate_snapshot(snapshot)?;

    let mut teams: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    let mut individuals: Vec<usize> = Vec::new();
    for (index, applicant) in snapshot.iter().enumerate() {
        match (applicant.modality, applicant.team_id.as_deref()) {
            (Modality::Team, Some(team_id)) => teams.entry(team_id).or_default().push(index),
            _ => individuals.push(index),
        }
    }

    let team_count = snapshot.len() - individuals.len();
    let split = split_mode_quota(
        u32::try_from(team_count).unwrap_or(u32::MAX),
        u32::try_from(individuals.len()).unwrap_or(u32::MAX),
        total_quota,
    )?;

    let team_sizes: Vec<(String, u32)> = teams
        .iter()
        .map(|(team_id, members)| {
            (
                (*team_id).to_string(),
                u32::try_from(members.len()).unwrap_or(u32::MAX),
            )
        })
        .collect();
    let team_quotas = assign_team_quotas(
        &team_sizes,
        u32::try_from(snapshot.len()).unwrap_or(u32::MAX),
        total_quota,
        split.team,
        rng,
    )?;

    let mut awards = vec![0_u32; snapshot.len()];
    for team in &team_quotas {
        let members = &teams[team.team_id.as_str()];
        award_pool(snapshot, members, team.assigned, &mut awards, rng);
    }
    award_pool(snapshot, &individuals, split.individual, &mut awards, rng);

    let records = snapshot
        .iter()
        .zip(&awards)
        .map(|(applicant, &awarded)| AwardRecord {
            id: applicant.id,
            modality: applicant.modality,
            priority: applicant.priority,
            team_id: applicant.team_id.clone(),
            years_without_award: applicant.years_without_award,
            awards: awarded,
            next_priority: next_priority(awarded),
            next_years_without_award: next_years_without_award(
                awarded,
                applicant.years_without_award,
            ),
        })
        .collect();

    Ok(RoundOutcome {
        records,
        split,
        team_quotas,
    })
}

fn award_pool(
    snapshot: &[Applicant],
    members: &[usize],
    quota: u32,
    awards: &mut [u32],
    rng: &mut impl Rng,
) {
    if quota == 0 || members.is_empty() {
        return;
    }
    let pool: Vec<PoolEntry> = members
        .iter()
        .map(|&index| PoolEntry {
            served: 0,
            priority: snapshot[index].priority,
            years_without_award: snapshot[index].years_without_award,
        })
        .collect();
    let granted = assign_units(&pool, quota, DrawMode::SingleAward, rng);
    for (&index, units) in members.iter().zip(granted) {
        awards[index] = units;
    }
}
