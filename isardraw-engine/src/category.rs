//! Multi-category capture draw ranked on accumulated service.
//!
//! Capture plans outside the team regime hand out several capture types in
//! one session (sex, age or trophy classes). Every applicant competes in one
//! shared pool; the ranking key is the total service accumulated across
//! categories this round plus the same-species results carried in from
//! earlier draws, so nobody wins a second capture while someone else has
//! none.

use crate::applicant::{Applicant, ApplicantId, COLUMN_CARRIED_RESULT, Modality, validate_snapshot};
use crate::assign::{DrawMode, PoolEntry, assign_units};
use crate::quota::QuotaError;
use crate::round::{DrawError, next_priority, next_years_without_award};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One capture type and the number of units it hands out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryQuota {
    pub label: String,
    pub count: u32,
}

/// Per-applicant outcome of a multi-category session, in snapshot order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
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
    #[serde(rename = "Resultat_sorteigs_mateixa_sps")]
    pub carried_result: u32,
    #[serde(rename = "Adjudicats")]
    pub awards: u32,
    #[serde(rename = "Nou_Resultat_sorteigs_mateixa_sps")]
    pub next_carried_result: u32,
    #[serde(rename = "nova_prioritat")]
    pub next_priority: u32,
    #[serde(rename = "nou_anys_sense_captura")]
    pub next_years_without_award: u32,
}

/// Full result of one multi-category session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOutcome {
    pub records: Vec<CategoryRecord>,
}

impl CategoryOutcome {
    /// Accumulated units across all applicants, including any counts the
    /// session resumed from.
    #[must_use]
    pub fn total_awarded(&self) -> u32 {
        self.records.iter().map(|record| record.awards).sum()
    }
}

/// Run a multi-category capture session over a snapshot.
///
/// Categories are drawn in the given order; each unit goes to the applicant
/// with the least accumulated service. Priority class only orders applicants
/// who have never been served; once anyone carries history, ties fall to
/// randomness alone.
///
/// # Errors
///
/// Fails when the carried-result column is absent, when no category hands out
/// any unit, or on an invalid or empty snapshot.
pub fn run_category_draw(
    snapshot: &[Applicant],
    categories: &[CategoryQuota],
    rng: &mut impl Rng,
) -> Result<CategoryOutcome, DrawError> {
    validate_snapshot(snapshot)?;
    if snapshot.iter().any(|a| a.carried_result.is_none()) {
        return Err(DrawError::MissingColumns(vec![
            COLUMN_CARRIED_RESULT.to_string(),
        ]));
    }
    let total: u32 = categories.iter().map(|category| category.count).sum();
    if total == 0 {
        return Err(DrawError::Quota(QuotaError::NonPositiveQuota));
    }
    if snapshot.is_empty() {
        return Err(DrawError::Quota(QuotaError::EmptyPopulation {
            quota: total,
        }));
    }

    let carried: Vec<u32> = snapshot
        .iter()
        .map(|a| a.carried_result.unwrap_or(0))
        .collect();
    let mut awards: Vec<u32> = snapshot
        .iter()
        .map(|a| a.accumulated_awards.unwrap_or(0))
        .collect();

    for category in categories {
        let pool: Vec<PoolEntry> = snapshot
            .iter()
            .enumerate()
            .map(|(index, applicant)| PoolEntry {
                served: awards[index] + carried[index],
                priority: applicant.priority,
                years_without_award: applicant.years_without_award,
            })
            .collect();
        let granted = assign_units(&pool, category.count, DrawMode::Accumulated, rng);
        for (index, units) in granted.iter().enumerate() {
            awards[index] += units;
        }
    }

    let records = snapshot
        .iter()
        .zip(&awards)
        .zip(&carried)
        .map(|((applicant, &awarded), &carried_in)| CategoryRecord {
            id: applicant.id,
            modality: applicant.modality,
            priority: applicant.priority,
            team_id: applicant.team_id.clone(),
            years_without_award: applicant.years_without_award,
            carried_result: carried_in,
            awards: awarded,
            next_carried_result: carried_in + awarded,
            next_priority: next_priority(awarded),
            next_years_without_award: next_years_without_award(
                awarded,
                applicant.years_without_award,
            ),
        })
        .collect();

    Ok(CategoryOutcome { records })
}
