//! Isardraw batch driver.
//!
//! Command-line front end over the draw engine: synthetic population
//! generation, single rounds, multi-category sessions, multi-year
//! simulations, Monte Carlo batches and named study scenarios, all speaking
//! the capture-plan CSV schema.

mod report;
mod scenarios;
mod snapshot;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use isardraw_engine::{
    CategoryQuota, DrawRng, GeneratorCfg, QuotaSchedule, SimulationCfg, SimulationHistory,
    TrackingCfg, generate_population, run_category_draw, run_replicates, run_round,
    run_simulation, run_tracking_simulation,
};
use rand::SeedableRng;
use report::ReportFormat;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "isardraw", version)]
#[command(about = "Fair-quota capture permit draws and population simulations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Args)]
struct SimArgs {
    /// Input snapshot CSV
    #[arg(long)]
    input: PathBuf,
    /// Years to simulate
    #[arg(long, default_value_t = 6)]
    years: u32,
    /// Quota per year: one value, or a comma-separated list
    #[arg(long, default_value = "150")]
    quota: String,
    /// Base seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 8)]
    min_team_size: u32,
    #[arg(long, default_value_t = 20)]
    max_team_size: u32,
    /// Minimum new entrants per year
    #[arg(long, default_value_t = 0)]
    entrants_min: u32,
    /// Maximum new entrants per year
    #[arg(long, default_value_t = 0)]
    entrants_max: u32,
    /// Minimum retirees per year
    #[arg(long, default_value_t = 0)]
    retirees_min: u32,
    /// Maximum retirees per year
    #[arg(long, default_value_t = 0)]
    retirees_max: u32,
    /// CSV field delimiter
    #[arg(long, default_value_t = ';')]
    delimiter: char,
}

impl SimArgs {
    fn simulation_cfg(&self) -> Result<SimulationCfg> {
        Ok(SimulationCfg {
            years: self.years,
            quota: parse_quota_schedule(&self.quota)?,
            seed: self.seed,
            min_team_size: self.min_team_size,
            max_team_size: self.max_team_size,
            entrants_per_year: (self.entrants_min, self.entrants_max),
            retirees_per_year: (self.retirees_min, self.retirees_max),
        })
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a synthetic applicant snapshot
    Generate {
        #[arg(long, default_value_t = 175)]
        team_applicants: u32,
        #[arg(long, default_value_t = 190)]
        individual_applicants: u32,
        #[arg(long, default_value_t = 8)]
        min_team_size: u32,
        #[arg(long, default_value_t = 20)]
        max_team_size: u32,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "sorteig.csv")]
        output: PathBuf,
        #[arg(long, default_value_t = ';')]
        delimiter: char,
    },
    /// Run one draw round over a snapshot
    Draw {
        #[arg(long)]
        input: PathBuf,
        /// Total permit quota for the round
        #[arg(long)]
        quota: u32,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "resultats.csv")]
        output: PathBuf,
        #[arg(long, default_value_t = ';')]
        delimiter: char,
    },
    /// Run a multi-category capture session over a snapshot
    Categories {
        #[arg(long)]
        input: PathBuf,
        /// Capture category as LABEL=COUNT; repeat for each category
        #[arg(long = "category", value_name = "LABEL=COUNT", required = true)]
        categories: Vec<String>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "resultats.csv")]
        output: PathBuf,
        #[arg(long, default_value_t = ';')]
        delimiter: char,
    },
    /// Simulate consecutive years with churn and team rebalancing
    Simulate {
        #[command(flatten)]
        args: SimArgs,
        /// Where to write the full per-applicant history
        #[arg(long)]
        history: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
        report: ReportFormat,
        /// Write the rendered report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run independent Monte Carlo replicates of a simulation
    Batch {
        #[command(flatten)]
        args: SimArgs,
        #[arg(long, default_value_t = 50)]
        replicates: u32,
        /// Directory receiving per-replicate histories and the summary
        #[arg(long, default_value = "mc_results")]
        output_dir: PathBuf,
    },
    /// Simulate winners regrouping into a tracked team each year
    Track {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = 6)]
        years: u32,
        #[arg(long, default_value = "150")]
        quota: String,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 8)]
        min_team_size: u32,
        #[arg(long, default_value_t = 20)]
        max_team_size: u32,
        /// Size of the tracked winner cohort
        #[arg(long, default_value_t = 10)]
        tracked_count: u32,
        #[arg(long)]
        history: Option<PathBuf>,
        #[arg(long, default_value_t = ';')]
        delimiter: char,
    },
    /// Run a named study scenario end to end
    Scenario {
        /// Scenario name; see --list
        #[arg(long)]
        name: Option<String>,
        /// List available scenarios and exit
        #[arg(long)]
        list: bool,
        /// JSON file with a custom scenario set
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "data")]
        output_dir: PathBuf,
        #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
        report: ReportFormat,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    match Cli::parse().command {
        Command::Generate {
            team_applicants,
            individual_applicants,
            min_team_size,
            max_team_size,
            seed,
            output,
            delimiter,
        } => cmd_generate(
            GeneratorCfg {
                team_applicants,
                individual_applicants,
                min_team_size,
                max_team_size,
            },
            seed,
            &output,
            delimiter_byte(delimiter)?,
        ),
        Command::Draw {
            input,
            quota,
            seed,
            output,
            delimiter,
        } => cmd_draw(&input, quota, seed, &output, delimiter_byte(delimiter)?),
        Command::Categories {
            input,
            categories,
            seed,
            output,
            delimiter,
        } => cmd_categories(&input, &categories, seed, &output, delimiter_byte(delimiter)?),
        Command::Simulate {
            args,
            history,
            report,
            output,
        } => cmd_simulate(&args, history.as_deref(), report, output.as_deref()),
        Command::Batch {
            args,
            replicates,
            output_dir,
        } => cmd_batch(&args, replicates, &output_dir),
        Command::Track {
            input,
            years,
            quota,
            seed,
            min_team_size,
            max_team_size,
            tracked_count,
            history,
            delimiter,
        } => cmd_track(
            &input,
            years,
            &quota,
            seed,
            min_team_size,
            max_team_size,
            tracked_count,
            history.as_deref(),
            delimiter_byte(delimiter)?,
        ),
        Command::Scenario {
            name,
            list,
            file,
            seed,
            output_dir,
            report,
        } => cmd_scenario(name.as_deref(), list, file.as_deref(), seed, &output_dir, report),
    }
}

fn cmd_generate(cfg: GeneratorCfg, seed: Option<u64>, output: &std::path::Path, delimiter: u8) -> Result<()> {
    let mut rng = make_rng(seed);
    let population = generate_population(&cfg, &mut rng)?;
    snapshot::write_records(output, delimiter, &population)?;
    println!(
        "{} {} applicants ({} in teams) to {}",
        "generated".green().bold(),
        population.len(),
        cfg.team_applicants,
        output.display()
    );
    Ok(())
}

fn cmd_draw(
    input: &std::path::Path,
    quota: u32,
    seed: Option<u64>,
    output: &std::path::Path,
    delimiter: u8,
) -> Result<()> {
    let applicants = snapshot::read_snapshot(input, delimiter)?;
    let mut rng = make_rng(seed);
    let outcome = run_round(&applicants, quota, &mut rng)?;
    for team in &outcome.team_quotas {
        log::debug!(
            "team {} ({} members): quota {}",
            team.team_id,
            team.size,
            team.assigned
        );
    }
    snapshot::write_records(output, delimiter, &outcome.records)?;
    println!(
        "{} {} of {} permits ({} team / {} individual) to {}",
        "awarded".green().bold(),
        outcome.total_awarded(),
        quota,
        outcome.split.team,
        outcome.split.individual,
        output.display()
    );
    Ok(())
}

fn cmd_categories(
    input: &std::path::Path,
    specs: &[String],
    seed: Option<u64>,
    output: &std::path::Path,
    delimiter: u8,
) -> Result<()> {
    let categories = specs
        .iter()
        .map(|spec| parse_category(spec))
        .collect::<Result<Vec<_>>>()?;
    let applicants = snapshot::read_snapshot(input, delimiter)?;
    let mut rng = make_rng(seed);
    let outcome = run_category_draw(&applicants, &categories, &mut rng)?;
    snapshot::write_records(output, delimiter, &outcome.records)?;
    println!(
        "{} {} captures across {} categories to {}",
        "awarded".green().bold(),
        outcome.total_awarded(),
        categories.len(),
        output.display()
    );
    Ok(())
}

fn cmd_simulate(
    args: &SimArgs,
    history_out: Option<&std::path::Path>,
    format: ReportFormat,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let delimiter = delimiter_byte(args.delimiter)?;
    let population = snapshot::read_snapshot(&args.input, delimiter)?;
    let cfg = args.simulation_cfg()?;
    let history = run_simulation(population, &cfg)?;
    log_history(&history);

    if let Some(path) = history_out {
        snapshot::write_records(path, delimiter, &history.records())?;
        log::info!("history written to {}", path.display());
    }
    let rendered = report::render(&history.summaries(), format)?;
    match output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("writing report {}", path.display()))?;
            println!("report written to {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn cmd_batch(args: &SimArgs, replicates: u32, output_dir: &std::path::Path) -> Result<()> {
    let delimiter = delimiter_byte(args.delimiter)?;
    let population = snapshot::read_snapshot(&args.input, delimiter)?;
    let cfg = args.simulation_cfg()?;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let runs = run_replicates(&population, &cfg, replicates)?;
    let mut summary = Vec::new();
    for (ordinal, history) in runs.iter().enumerate() {
        let replicate = u32::try_from(ordinal).unwrap_or(u32::MAX) + 1;
        let path = output_dir.join(format!("history_rep_{replicate}.csv"));
        snapshot::write_records(&path, delimiter, &history.records())?;
        log::info!("replicate {replicate} history written to {}", path.display());
        for (year, unique_hunters) in history.population_per_year() {
            summary.push(ReplicateYearRow {
                year,
                unique_hunters,
                replicate,
            });
        }
    }
    let summary_path = output_dir.join("mc_summary.csv");
    snapshot::write_records(&summary_path, b',', &summary)?;
    println!(
        "{} {} replicates; summary at {}",
        "completed".green().bold(),
        replicates,
        summary_path.display()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_track(
    input: &std::path::Path,
    years: u32,
    quota: &str,
    seed: Option<u64>,
    min_team_size: u32,
    max_team_size: u32,
    tracked_count: u32,
    history_out: Option<&std::path::Path>,
    delimiter: u8,
) -> Result<()> {
    let population = snapshot::read_snapshot(input, delimiter)?;
    let cfg = SimulationCfg {
        years,
        quota: parse_quota_schedule(quota)?,
        seed,
        min_team_size,
        max_team_size,
        entrants_per_year: (0, 0),
        retirees_per_year: (0, 0),
    };
    let outcome = run_tracking_simulation(population, &cfg, &TrackingCfg { tracked_count })?;

    if let Some(path) = history_out {
        snapshot::write_records(path, delimiter, &outcome.history.records())?;
        log::info!("history written to {}", path.display());
    }
    let (tracked_mean, other_mean) = outcome.mean_awards();
    println!(
        "{} cohort {:?}",
        "tracked".cyan().bold(),
        outcome.tracked_ids
    );
    println!("mean awards: tracked {tracked_mean:.2}, others {other_mean:.2}");
    Ok(())
}

fn cmd_scenario(
    name: Option<&str>,
    list: bool,
    file: Option<&std::path::Path>,
    seed: Option<u64>,
    output_dir: &std::path::Path,
    format: ReportFormat,
) -> Result<()> {
    let available = match file {
        Some(path) => scenarios::load_file(path)?,
        None => scenarios::builtin(),
    };
    if list {
        for scenario in &available {
            println!("{:<24} {}", scenario.name.bold(), scenario.summary);
        }
        return Ok(());
    }
    let Some(name) = name else {
        bail!("pass --name <scenario> or --list");
    };
    let Some(scenario) = available.into_iter().find(|s| s.name == name) else {
        bail!("unknown scenario {name:?}; try --list");
    };

    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let mut rng = make_rng(seed);
    let population = generate_population(&scenario.generator_cfg(), &mut rng)?;
    let snapshot_path = output_dir.join(format!("{name}_inicial.csv"));
    snapshot::write_records(&snapshot_path, b';', &population)?;

    let history = run_simulation(population, &scenario.simulation_cfg(seed))?;
    log_history(&history);
    let history_path = output_dir.join(format!("{name}_historial.csv"));
    snapshot::write_records(&history_path, b';', &history.records())?;

    let rendered = report::render(&history.summaries(), format)?;
    let report_path = output_dir.join(format!("{name}_report.{}", format.extension()));
    fs::write(&report_path, &rendered)
        .with_context(|| format!("writing report {}", report_path.display()))?;
    println!(
        "{} scenario {name}: snapshot {}, history {}, report {}",
        "completed".green().bold(),
        snapshot_path.display(),
        history_path.display(),
        report_path.display()
    );
    Ok(())
}

#[derive(Debug, serde::Serialize)]
struct ReplicateYearRow {
    #[serde(rename = "any")]
    year: u32,
    unique_hunters: u32,
    replicate: u32,
}

fn log_history(history: &SimulationHistory) {
    for outcome in history.years() {
        if outcome.churn.retired > 0 {
            log::info!("year {}: {} retirees", outcome.year, outcome.churn.retired);
        }
        if outcome.churn.entrants() > 0 {
            log::info!(
                "year {}: {} entrants ({} to existing teams, {} to new teams, {} individual)",
                outcome.year,
                outcome.churn.entrants(),
                outcome.churn.joined_existing,
                outcome.churn.joined_new_teams,
                outcome.churn.joined_individual
            );
        }
        for backfill in &outcome.rebalance.backfills {
            log::info!(
                "year {}: moved {} individuals into team {}",
                outcome.year,
                backfill.moved,
                backfill.team_id
            );
        }
        for shortfall in &outcome.rebalance.shortfalls {
            log::warn!(
                "year {}: team {} stays {} members short",
                outcome.year,
                shortfall.team_id,
                shortfall.missing
            );
        }
    }
}

fn make_rng(seed: Option<u64>) -> DrawRng {
    seed.map_or_else(DrawRng::from_entropy, DrawRng::seed_from_u64)
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    u8::try_from(delimiter).map_err(|_| anyhow::anyhow!("delimiter must be a single ASCII character"))
}

fn parse_quota_schedule(spec: &str) -> Result<QuotaSchedule> {
    if spec.contains(',') {
        let quotas = spec
            .split(',')
            .map(|part| part.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("invalid quota list {spec:?}"))?;
        Ok(QuotaSchedule::PerYear(quotas))
    } else {
        let quota = spec
            .trim()
            .parse()
            .with_context(|| format!("invalid quota {spec:?}"))?;
        Ok(QuotaSchedule::Fixed(quota))
    }
}

fn parse_category(spec: &str) -> Result<CategoryQuota> {
    let Some((label, count)) = spec.split_once('=') else {
        bail!("category {spec:?} must look like LABEL=COUNT");
    };
    let label = label.trim();
    if label.is_empty() {
        bail!("category {spec:?} has an empty label");
    }
    let count = count
        .trim()
        .parse()
        .with_context(|| format!("invalid count in category {spec:?}"))?;
    Ok(CategoryQuota {
        label: label.to_string(),
        count,
    })
}
