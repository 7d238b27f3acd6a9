//! Simulation history and the reporting series derived from it.

use crate::applicant::{ApplicantId, Modality};
use crate::round::AwardRecord;
use crate::sim::churn::ChurnReport;
use crate::sim::rebalance::RebalanceReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything archived for one simulated year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearOutcome {
    pub year: u32,
    pub records: Vec<AwardRecord>,
    pub churn: ChurnReport,
    pub rebalance: RebalanceReport,
}

impl YearOutcome {
    /// Aggregate counts consumed by the report generator.
    #[must_use]
    pub fn summary(&self) -> YearSummary {
        let captures = self.records.iter().map(|record| record.awards).sum();
        let team = self
            .records
            .iter()
            .filter(|record| record.modality == Modality::Team)
            .count();
        YearSummary {
            year: self.year,
            captures,
            total: u32::try_from(self.records.len()).unwrap_or(u32::MAX),
            team: u32::try_from(team).unwrap_or(u32::MAX),
            individual: u32::try_from(self.records.len() - team).unwrap_or(u32::MAX),
        }
    }
}

/// Per-year aggregate counts, keyed the way the report generator expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSummary {
    #[serde(rename = "any")]
    pub year: u32,
    pub captures: u32,
    pub total: u32,
    #[serde(rename = "colla")]
    pub team: u32,
    pub individual: u32,
}

/// Flat history row, keyed for the chart renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
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
    #[serde(rename = "any")]
    pub year: u32,
}

impl HistoryRecord {
    fn from_award(year: u32, record: &AwardRecord) -> Self {
        Self {
            id: record.id,
            modality: record.modality,
            priority: record.priority,
            team_id: record.team_id.clone(),
            years_without_award: record.years_without_award,
            awards: record.awards,
            next_priority: record.next_priority,
            next_years_without_award: record.next_years_without_award,
            year,
        }
    }
}

/// Consecutive-award streak for one applicant-year. Positive values count
/// awarded years in a row; non-positive values count the dry spell since the
/// last award (zero marks the year a streak broke).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub id: ApplicantId,
    pub year: u32,
    pub modality: Modality,
    pub streak: i32,
}

/// Ordered, append-only sequence of closed years.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationHistory {
    years: Vec<YearOutcome>,
}

impl SimulationHistory {
    /// Close a year and append it; years must arrive in order.
    pub fn push_year(&mut self, outcome: YearOutcome) {
        debug_assert!(
            self.years.last().is_none_or(|last| last.year < outcome.year),
            "years must be archived in order"
        );
        self.years.push(outcome);
    }

    #[must_use]
    pub fn years(&self) -> &[YearOutcome] {
        &self.years
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.years.len()
    }

    /// One aggregate row per year, for the report generator.
    #[must_use]
    pub fn summaries(&self) -> Vec<YearSummary> {
        self.years.iter().map(YearOutcome::summary).collect()
    }

    /// Flat per-applicant rows across all years, for the chart renderer.
    #[must_use]
    pub fn records(&self) -> Vec<HistoryRecord> {
        self.years
            .iter()
            .flat_map(|outcome| {
                outcome
                    .records
                    .iter()
                    .map(|record| HistoryRecord::from_award(outcome.year, record))
            })
            .collect()
    }

    /// Applicants present per year.
    #[must_use]
    pub fn population_per_year(&self) -> Vec<(u32, u32)> {
        self.years
            .iter()
            .map(|outcome| {
                (
                    outcome.year,
                    u32::try_from(outcome.records.len()).unwrap_or(u32::MAX),
                )
            })
            .collect()
    }

    /// Total awards per applicant across the whole run.
    #[must_use]
    pub fn award_totals(&self) -> BTreeMap<ApplicantId, u32> {
        let mut totals = BTreeMap::new();
        for outcome in &self.years {
            for record in &outcome.records {
                *totals.entry(record.id).or_insert(0) += record.awards;
            }
        }
        totals
    }

    /// Consecutive-award streaks per applicant-year, ordered by id then year.
    #[must_use]
    pub fn consecutive_streaks(&self) -> Vec<StreakRecord> {
        let mut per_applicant: BTreeMap<ApplicantId, Vec<(u32, Modality, u32)>> = BTreeMap::new();
        for outcome in &self.years {
            for record in &outcome.records {
                per_applicant.entry(record.id).or_default().push((
                    outcome.year,
                    record.modality,
                    record.awards,
                ));
            }
        }

        let mut streaks = Vec::new();
        for (id, mut rows) in per_applicant {
            rows.sort_by_key(|(year, _, _)| *year);
            let mut streak = 0_i32;
            for (position, (year, modality, awards)) in rows.into_iter().enumerate() {
                let awarded = awards > 0;
                streak = if position == 0 {
                    i32::from(awarded)
                } else if awarded {
                    streak + 1
                } else if streak > 0 {
                    0
                } else {
                    streak - 1
                };
                streaks.push(StreakRecord {
                    id,
                    year,
                    modality,
                    streak,
                });
            }
        }
        streaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applicant::{PRIORITY_SERVED, PRIORITY_WAITING};

    fn record(id: ApplicantId, modality: Modality, awards: u32) -> AwardRecord {
        AwardRecord {
            id,
            modality,
            priority: 3,
            team_id: match modality {
                Modality::Team => Some("Colla_1".to_string()),
                Modality::Individual => None,
            },
            years_without_award: 0,
            awards,
            next_priority: if awards > 0 {
                PRIORITY_SERVED
            } else {
                PRIORITY_WAITING
            },
            next_years_without_award: u32::from(awards == 0),
        }
    }

    fn year(year: u32, records: Vec<AwardRecord>) -> YearOutcome {
        YearOutcome {
            year,
            records,
            churn: ChurnReport::default(),
            rebalance: RebalanceReport::default(),
        }
    }

    fn two_year_history() -> SimulationHistory {
        let mut history = SimulationHistory::default();
        history.push_year(year(
            1,
            vec![
                record(1, Modality::Team, 1),
                record(2, Modality::Team, 0),
                record(3, Modality::Individual, 1),
            ],
        ));
        history.push_year(year(
            2,
            vec![
                record(1, Modality::Team, 1),
                record(2, Modality::Team, 1),
                record(3, Modality::Individual, 0),
            ],
        ));
        history
    }

    #[test]
    fn summaries_follow_the_report_contract() {
        let history = two_year_history();
        let summaries = history.summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].year, 1);
        assert_eq!(summaries[0].captures, 2);
        assert_eq!(summaries[0].total, 3);
        assert_eq!(summaries[0].team, 2);
        assert_eq!(summaries[0].individual, 1);

        let value = serde_json::to_value(summaries[0]).unwrap();
        assert_eq!(value["any"], 1);
        assert_eq!(value["colla"], 2);
    }

    #[test]
    fn flat_records_carry_the_year_tag() {
        let history = two_year_history();
        let rows = history.records();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().take(3).all(|row| row.year == 1));
        assert!(rows.iter().skip(3).all(|row| row.year == 2));
    }

    #[test]
    fn award_totals_accumulate_across_years() {
        let totals = two_year_history().award_totals();
        assert_eq!(totals[&1], 2);
        assert_eq!(totals[&2], 1);
        assert_eq!(totals[&3], 1);
    }

    #[test]
    fn streaks_grow_break_and_go_negative() {
        let mut history = SimulationHistory::default();
        for (year_number, awards) in [(1, 1), (2, 1), (3, 0), (4, 0), (5, 0)] {
            history.push_year(year(
                year_number,
                vec![record(1, Modality::Individual, awards)],
            ));
        }
        let streaks: Vec<i32> = history
            .consecutive_streaks()
            .into_iter()
            .map(|row| row.streak)
            .collect();
        assert_eq!(streaks, vec![1, 2, 0, -1, -2]);
    }

    #[test]
    fn first_year_miss_starts_at_zero() {
        let mut history = SimulationHistory::default();
        history.push_year(year(1, vec![record(4, Modality::Individual, 0)]));
        history.push_year(year(2, vec![record(4, Modality::Individual, 0)]));
        let streaks: Vec<i32> = history
            .consecutive_streaks()
            .into_iter()
            .map(|row| row.streak)
            .collect();
        assert_eq!(streaks, vec![0, -1]);
    }
}
