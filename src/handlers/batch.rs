//! Concurrent runs of several scripts, one pooled session each.

use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::sync::Semaphore;

use script_bridge::{
    utils::{Bindings, ScriptSource},
    Outputs, ScriptAdapter, ScriptError, SessionPool,
};

use super::bind_inputs;
use crate::printer::{ErrorPrinter, JsonPrinter};

#[derive(Debug)]
pub struct ScriptRun {
    pub label: String,
    pub result: Result<Outputs, ScriptError>,
}

/// Run every source with the same inputs; results keep the order of `sources`.
pub async fn run(
    adapter: ScriptAdapter,
    pool: Arc<SessionPool>,
    sources: Vec<ScriptSource>,
    bindings: Arc<Bindings>,
    jobs: usize,
) -> Result<Vec<ScriptRun>> {
    let limit = Arc::new(Semaphore::new(jobs.max(1)));
    let mut tasks = Vec::with_capacity(sources.len());

    for source in sources {
        let permit = Arc::clone(&limit).acquire_owned().await?;
        let adapter = adapter.clone();
        let pool = Arc::clone(&pool);
        let bindings = Arc::clone(&bindings);
        tasks.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let mut session = pool.acquire();
            tracing::debug!(script = %source.label, "running script");
            let result = bind_inputs(&adapter, &mut session, bindings.as_slice())
                .and_then(|()| adapter.exec(&mut session, &source.text));
            ScriptRun { label: source.label, result }
        }));
    }

    let mut runs = Vec::with_capacity(tasks.len());
    for task in tasks {
        runs.push(task.await?);
    }
    Ok(runs)
}

/// Print successes as one JSON object keyed by script, failures to stderr.
pub fn report(runs: &[ScriptRun], printer: &JsonPrinter) -> Result<()> {
    let errors = ErrorPrinter::default();
    let mut harvested = serde_json::Map::new();
    let mut failed = 0usize;

    for run in runs {
        match &run.result {
            Ok(outputs) => {
                harvested.insert(run.label.clone(), serde_json::to_value(outputs)?);
            }
            Err(err) => {
                failed += 1;
                errors.print(&run.label, &err.to_string());
            }
        }
    }

    printer.print(&harvested)?;
    if failed > 0 {
        bail!("{} of {} scripts failed", failed, runs.len());
    }
    Ok(())
}
