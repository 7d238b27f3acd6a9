//! Synthetic applicant populations for simulations.

use crate::applicant::{Applicant, ApplicantId, Modality};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_PARTITION_ATTEMPTS: u32 = 10_000;

/// Shape of a generated population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorCfg {
    pub team_applicants: u32,
    pub individual_applicants: u32,
    pub min_team_size: u32,
    pub max_team_size: u32,
}

/// Infeasible generation parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("minimum team size {min} must be positive and at most the maximum {max}")]
    SizeRange { min: u32, max: u32 },
    #[error("cannot partition {total} applicants into teams of {min}..={max}")]
    UnreachableTotal { total: u32, min: u32, max: u32 },
}

/// Draw random team sizes in `[min_size, max_size]` summing exactly to
/// `total`.
///
/// Rejection-sampled with a bounded number of attempts: totals no partition
/// can reach fail instead of spinning forever.
///
/// # Errors
///
/// Fails on an empty or inverted size range, or an unreachable total.
pub fn generate_team_sizes(
    total: u32,
    min_size: u32,
    max_size: u32,
    rng: &mut impl Rng,
) -> Result<Vec<u32>, GeneratorError> {
    if min_size == 0 || min_size > max_size {
        return Err(GeneratorError::SizeRange {
            min: min_size,
            max: max_size,
        });
    }
    if total == 0 {
        return Ok(Vec::new());
    }
    if total < min_size {
        return Err(GeneratorError::UnreachableTotal {
            total,
            min: min_size,
            max: max_size,
        });
    }

    for _ in 0..MAX_PARTITION_ATTEMPTS {
        let mut sizes = Vec::new();
        let mut remainder = total;
        while remainder > max_size {
            let size = rng.gen_range(min_size..=max_size);
            sizes.push(size);
            remainder -= size;
        }
        if remainder >= min_size {
            sizes.push(remainder);
            return Ok(sizes);
        }
    }
    Err(GeneratorError::UnreachableTotal {
        total,
        min: min_size,
        max: max_size,
    })
}

/// Generate a fresh population: numbered teams first, individuals after,
/// ids from 1, everyone at default priority with no award history.
///
/// # Errors
///
/// Fails when the team head count cannot be partitioned.
pub fn generate_population(
    cfg: &GeneratorCfg,
    rng: &mut impl Rng,
) -> Result<Vec<Applicant>, GeneratorError> {
    let sizes = generate_team_sizes(
        cfg.team_applicants,
        cfg.min_team_size,
        cfg.max_team_size,
        rng,
    )?;

    let capacity = (cfg.team_applicants + cfg.individual_applicants) as usize;
    let mut population = Vec::with_capacity(capacity);
    let mut id: ApplicantId = 1;
    for (ordinal, size) in sizes.iter().enumerate() {
        let team_id = format!("Colla_{}", ordinal + 1);
        for _ in 0..*size {
            population.push(Applicant::new_entrant(
                id,
                Modality::Team,
                Some(team_id.clone()),
            ));
            id += 1;
        }
    }
    for _ in 0..cfg.individual_applicants {
        population.push(Applicant::new_entrant(id, Modality::Individual, None));
        id += 1;
    }
    Ok(population)
}
