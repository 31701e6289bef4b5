use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use crate::config::PipelineConfig;
use crate::pipeline::{CancelFlag, HttpPipeline};
use crate::state::Delta;

/// Runs one batch off the UI thread. Matches are still fetched one after another.
pub fn spawn_pipeline(
    config: PipelineConfig,
    tx: Sender<Delta>,
    cancel: CancelFlag,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let match_ids = config.match_ids.clone();
        let metrics = config.metrics.clone();
        let _ = tx.send(Delta::Started {
            total: match_ids.len(),
        });

        let pipeline = match HttpPipeline::from_config(config) {
            Ok(pipeline) => pipeline,
            Err(err) => {
                let _ = tx.send(Delta::Aborted(format!("{err:#}")));
                return;
            }
        };

        let progress_tx = tx.clone();
        let result = pipeline.run_with(&match_ids, &metrics, &cancel, |progress| {
            let _ = progress_tx.send(Delta::Log(format!(
                "[INFO] Match {} ({}/{})",
                progress.match_id, progress.current, progress.total
            )));
            let _ = progress_tx.send(Delta::Progress(progress));
        });
        let delta = match result {
            Ok(run) => Delta::Finished(run),
            Err(err) => Delta::Aborted(format!("{err:#}")),
        };
        let _ = tx.send(delta);
    })
}
