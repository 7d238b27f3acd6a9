//! Isardraw Engine
//!
//! Platform-agnostic core for the isard capture permit draw: fair-quota
//! distribution of indivisible permits for a single round, the multi-category
//! capture variant, and the multi-year population simulator that drives them.
//! This crate performs no I/O; snapshots come in as typed records and results
//! go out the same way.

pub mod applicant;
pub mod assign;
pub mod category;
pub mod generator;
pub mod history;
pub mod numbers;
pub mod quota;
pub mod rng;
pub mod round;
pub mod sim;

// Re-export commonly used types
pub use applicant::{
    Applicant, ApplicantId, COLUMN_CARRIED_RESULT, Modality, PRIORITY_DEFAULT, PRIORITY_SERVED,
    PRIORITY_WAITING, REQUIRED_COLUMNS, SnapshotError, missing_columns, validate_snapshot,
};
pub use assign::{DrawMode, PoolEntry, assign_units};
pub use category::{CategoryOutcome, CategoryQuota, CategoryRecord, run_category_draw};
pub use generator::{GeneratorCfg, GeneratorError, generate_population, generate_team_sizes};
pub use history::{HistoryRecord, SimulationHistory, StreakRecord, YearOutcome, YearSummary};
pub use quota::{
    ModeSplit, QuotaError, TeamQuota, applicants_per_permit, assign_team_quotas, split_mode_quota,
};
pub use rng::{
    DrawRng, derive_replicate_seed, derive_round_seed, derive_stream_seed, round_rng, stream_rng,
};
pub use round::{
    AwardRecord, DrawError, RoundOutcome, next_priority, next_years_without_award, run_round,
};
pub use sim::churn::{ChurnReport, apply_churn};
pub use sim::rebalance::{RebalanceReport, TeamBackfill, TeamShortfall, rebalance_teams};
pub use sim::tracking::{TrackingCfg, TrackingOutcome, run_tracking_simulation};
pub use sim::{
    QuotaSchedule, SimulationCfg, SimulationCfgError, SimulationError, run_replicates,
    run_simulation,
};
