use std::path::PathBuf;

use anyhow::{Result, anyhow};

use matchstats_terminal::config::{PipelineConfig, arg_value};
use matchstats_terminal::export::{average_rows, export_run, failure_rows, record_rows, text_table};
use matchstats_terminal::logging;
use matchstats_terminal::pipeline::HttpPipeline;
use matchstats_terminal::team_averages::all_team_averages;

fn main() -> Result<()> {
    logging::init_stderr();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = PipelineConfig::from_env();
    config.apply_args(&args);
    if config.match_ids.is_empty() {
        return Err(anyhow!("no match ids; pass --ids=1,2,3 or set MATCH_IDS"));
    }
    let export_path = arg_value(&args, "--export").map(PathBuf::from);

    let match_ids = config.match_ids.clone();
    let metrics = config.metrics.clone();
    let pipeline = HttpPipeline::from_config(config)?;
    let run = pipeline.run(&match_ids, &metrics)?;

    println!("Matches: {}", match_ids.len());
    println!("Metrics: {}", metrics.sorted().join(", "));
    println!();
    print!("{}", text_table(&record_rows(&run.records)));

    for metric in metrics.sorted() {
        let averages = all_team_averages(&run.records, metric);
        if averages.is_empty() {
            continue;
        }
        println!();
        println!("{metric} per team:");
        print!("{}", text_table(&average_rows(&averages)));
    }

    if !run.failures.is_empty() {
        println!();
        println!("Failures: {}", run.failures.len());
        print!("{}", text_table(&failure_rows(&run.failures)));
    }

    if let Some(path) = export_path {
        let report = export_run(&path, &run, &metrics)?;
        println!();
        println!(
            "workbook written: {} ({} records, {} averages, {} failures)",
            path.display(),
            report.records,
            report.averages,
            report.failures
        );
    }

    Ok(())
}
