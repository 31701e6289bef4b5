use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::error::FailureReport;
use crate::filter::MetricSet;
use crate::model::EnrichedRecord;
use crate::pipeline::PipelineRun;
use crate::team_averages::{TeamAverage, all_team_averages};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn opt_text(value: Option<&str>) -> Self {
        value.map(Cell::text).unwrap_or(Cell::Empty)
    }

    fn opt_number(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Empty)
    }

    /// Two decimals for numbers, matching how the terminal table shows values.
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format!("{n:.2}"),
            Cell::Empty => "-".to_string(),
        }
    }
}

pub struct ExportReport {
    pub records: usize,
    pub averages: usize,
    pub failures: usize,
}

pub const RECORD_HEADER: &[&str] = &[
    "Match ID",
    "Period",
    "Metric",
    "Home",
    "Away",
    "Home Value",
    "Away Value",
];

pub fn record_rows(records: &[EnrichedRecord]) -> Vec<Vec<Cell>> {
    let mut rows = vec![header(RECORD_HEADER)];
    rows.extend(records.iter().map(|r| {
        vec![
            Cell::text(r.match_id.as_str()),
            Cell::opt_text(r.period.as_deref()),
            Cell::opt_text(r.name.as_deref()),
            Cell::opt_text(r.home.as_deref()),
            Cell::opt_text(r.away.as_deref()),
            Cell::opt_number(r.home_value),
            Cell::opt_number(r.away_value),
        ]
    }));
    rows
}

pub fn average_rows(averages: &[TeamAverage]) -> Vec<Vec<Cell>> {
    let mut rows = vec![header(&[
        "Team",
        "Metric",
        "Home Avg",
        "Home Matches",
        "Away Avg",
        "Away Matches",
        "Overall Avg",
    ])];
    rows.extend(averages.iter().map(|a| {
        vec![
            Cell::text(a.team.as_str()),
            Cell::text(a.metric.as_str()),
            Cell::opt_number(a.home),
            Cell::Number(a.home_matches as f64),
            Cell::opt_number(a.away),
            Cell::Number(a.away_matches as f64),
            Cell::opt_number(a.overall()),
        ]
    }));
    rows
}

pub fn failure_rows(failures: &[FailureReport]) -> Vec<Vec<Cell>> {
    let mut rows = vec![header(&["Match ID", "Kind", "Message"])];
    rows.extend(failures.iter().map(|f| {
        vec![
            Cell::text(f.match_id.as_str()),
            Cell::text(f.kind.label()),
            Cell::text(f.message.as_str()),
        ]
    }));
    rows
}

/// Writes records, per-team averages for every selected metric, and failures.
pub fn export_run(path: &Path, run: &PipelineRun, metrics: &MetricSet) -> Result<ExportReport> {
    let averages: Vec<TeamAverage> = metrics
        .sorted()
        .into_iter()
        .flat_map(|metric| all_team_averages(&run.records, metric))
        .collect();

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Records")?;
        write_rows(sheet, &record_rows(&run.records))?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("TeamAverages")?;
        write_rows(sheet, &average_rows(&averages))?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Failures")?;
        write_rows(sheet, &failure_rows(&run.failures))?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        records: run.records.len(),
        averages: averages.len(),
        failures: run.failures.len(),
    })
}

/// Fixed-width plain text rendering, first row treated as the header.
pub fn text_table(rows: &[Vec<Cell>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(Cell::display).collect())
        .collect();
    let cols = cells.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; cols];
    for row in &cells {
        for (idx, value) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(value.chars().count());
        }
    }

    let mut out = String::new();
    for (row_idx, row) in cells.iter().enumerate() {
        let line = row
            .iter()
            .enumerate()
            .map(|(idx, value)| format!("{value:<width$}", width = widths[idx]))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
        if row_idx == 0 {
            let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
            out.push_str(&rule.join("  "));
            out.push('\n');
        }
    }
    out
}

fn header(names: &[&str]) -> Vec<Cell> {
    names.iter().map(|name| Cell::text(*name)).collect()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            match value {
                Cell::Text(s) => worksheet.write_string(r, c, s).map(|_| ()),
                Cell::Number(n) => worksheet.write_number(r, c, *n).map(|_| ()),
                Cell::Empty => Ok(()),
            }
            .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
