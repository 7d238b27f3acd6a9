//! Applicant records and the tabular snapshot schema.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Priority class written after a served round; served applicants queue last.
pub const PRIORITY_SERVED: u32 = 4;
/// Priority class written after an unserved round; waiting applicants queue first.
pub const PRIORITY_WAITING: u32 = 2;
/// Priority class for applicants entering their first draw.
pub const PRIORITY_DEFAULT: u32 = 3;

/// Columns every snapshot must carry, in schema order.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "ID",
    "Modalitat",
    "Prioritat",
    "Colla_ID",
    "anys_sense_captura",
];

/// Carried same-species result column, required by the multi-category draw.
pub const COLUMN_CARRIED_RESULT: &str = "Resultat_sorteigs_mateixa_sps";

pub type ApplicantId = u64;

/// How an applicant takes part in the draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    /// Served as part of a pre-existing team sharing one quota.
    #[serde(rename = "A")]
    Team,
    /// Served from the shared individual pool.
    #[serde(rename = "B")]
    Individual,
}

/// One participant in a draw round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
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
    /// Same-species results carried in from earlier draws; only the
    /// multi-category variant requires it.
    #[serde(rename = "Resultat_sorteigs_mateixa_sps", default)]
    pub carried_result: Option<u32>,
    /// Awards already accumulated this round, when resuming a partial draw.
    #[serde(rename = "Adjudicats", default)]
    pub accumulated_awards: Option<u32>,
}

impl Applicant {
    /// Fresh entrant with default priority and no award history.
    #[must_use]
    pub const fn new_entrant(id: ApplicantId, modality: Modality, team_id: Option<String>) -> Self {
        Self {
            id,
            modality,
            priority: PRIORITY_DEFAULT,
            team_id,
            years_without_award: 0,
            carried_result: None,
            accumulated_awards: None,
        }
    }

    #[must_use]
    pub const fn is_team(&self) -> bool {
        matches!(self.modality, Modality::Team)
    }
}

/// Violations of the population snapshot invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("applicant {id} is in team mode without a team id")]
    MissingTeamId { id: ApplicantId },
    #[error("applicant {id} is in individual mode but carries team id {team_id:?}")]
    UnexpectedTeamId { id: ApplicantId, team_id: String },
    #[error("duplicate applicant id {id}")]
    DuplicateId { id: ApplicantId },
}

/// Check the structural invariants of a population snapshot.
///
/// # Errors
///
/// Returns the first `SnapshotError` encountered in input order.
pub fn validate_snapshot(snapshot: &[Applicant]) -> Result<(), SnapshotError> {
    let mut seen = HashSet::with_capacity(snapshot.len());
    for applicant in snapshot {
        if !seen.insert(applicant.id) {
            return Err(SnapshotError::DuplicateId { id: applicant.id });
        }
        match (applicant.modality, applicant.team_id.as_deref()) {
            (Modality::Team, None) => {
                return Err(SnapshotError::MissingTeamId { id: applicant.id });
            }
            (Modality::Individual, Some(team_id)) => {
                return Err(SnapshotError::UnexpectedTeamId {
                    id: applicant.id,
                    team_id: team_id.to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

/// Required columns absent from a tabular header row.
#[must_use]
pub fn missing_columns<'a>(headers: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let present: HashSet<&str> = headers.into_iter().collect();
    REQUIRED_COLUMNS
        .iter()
        .filter(|column| !present.contains(**column))
        .map(|column| (*column).to_string())
        .collect()
}
