//! Rendering of per-year summary series.

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use isardraw_engine::YearSummary;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Markdown,
    Json,
    Csv,
}

impl ReportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Console => "txt",
            Self::Markdown => "md",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// Render the summary series in the requested format.
pub fn render(summaries: &[YearSummary], format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Console => Ok(render_console(summaries)),
        ReportFormat::Markdown => Ok(render_markdown(summaries)),
        ReportFormat::Json => {
            serde_json::to_string_pretty(summaries).context("encoding summary JSON")
        }
        ReportFormat::Csv => render_csv(summaries),
    }
}

fn render_console(summaries: &[YearSummary]) -> String {
    let header = format!(
        "{:>4}  {:>8}  {:>10}  {:>5}  {:>10}",
        "year", "permits", "applicants", "team", "individual"
    );
    let mut out = format!("{}\n", header.bold());
    for summary in summaries {
        let _ = writeln!(
            out,
            "{:>4}  {:>8}  {:>10}  {:>5}  {:>10}",
            summary.year, summary.captures, summary.total, summary.team, summary.individual
        );
    }
    out
}

fn render_markdown(summaries: &[YearSummary]) -> String {
    let mut out = String::from("| Any | Captures | Caçadors Totals | Colla | Individuals |\n");
    out.push_str("|:--:|:--------:|:---------------:|:-----:|:-----------:|\n");
    for summary in summaries {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            summary.year, summary.captures, summary.total, summary.team, summary.individual
        );
    }
    out
}

fn render_csv(summaries: &[YearSummary]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for summary in summaries {
        writer.serialize(summary).context("serializing summary")?;
    }
    let bytes = writer.into_inner().context("finishing summary CSV")?;
    String::from_utf8(bytes).context("summary CSV is not UTF-8")
}
