use crate::error::PipelineError;
use crate::filter::{evaluate, FilteredView};
use crate::reports;
use crate::types::{AggregateResult, Bundle, FilterState, RecordStore, View};
use log::{debug, warn};
use std::panic::{self, AssertUnwindSafe};
use std::thread;

/// Recomputes every view from an immutable record store. Holds no state
/// between calls.
#[derive(Debug)]
pub struct Engine {
    store: RecordStore,
    parallel: bool,
}

impl Engine {
    pub fn new(store: RecordStore) -> Self {
        Engine {
            store,
            parallel: true,
        }
    }

    /// Run the pipelines on the calling thread only.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Filter once, then build all ten views. Always returns a full bundle;
    /// a failed pipeline gets a placeholder in its slot.
    pub fn recompute(&self, filter: &FilterState) -> Bundle {
        let filtered = evaluate(&self.store, filter);
        debug!(
            "recompute: statistic={:?} provinces={} records={}",
            filter.statistic,
            filter.provinces.len(),
            filtered.len()
        );
        let results = if self.parallel {
            fan_out(&filtered)
        } else {
            View::ALL
                .iter()
                .map(|&view| run_contained(view, &filtered))
                .collect()
        };
        Bundle {
            filter: filter.clone(),
            results,
        }
    }
}

fn worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(View::ALL.len())
}

// Split the views across scoped workers and join them back in view order.
fn fan_out(filtered: &FilteredView) -> Vec<AggregateResult> {
    let workers = worker_count();
    let views: &[View] = &View::ALL;
    if workers <= 1 {
        return views.iter().map(|&view| run_contained(view, filtered)).collect();
    }
    let chunk = views.len().div_ceil(workers);

    thread::scope(|scope| {
        let handles: Vec<_> = views
            .chunks(chunk)
            .map(|group| {
                let handle = scope.spawn(move || {
                    group
                        .iter()
                        .map(|&view| run_contained(view, filtered))
                        .collect::<Vec<_>>()
                });
                (group, handle)
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|(group, handle)| match handle.join() {
                Ok(results) => results,
                Err(_) => group
                    .iter()
                    .map(|&view| {
                        let err = PipelineError::Panicked("worker thread died".to_string());
                        reports::placeholder(view, filtered, &err)
                    })
                    .collect(),
            })
            .collect()
    })
}

/// Run one pipeline, turning an error or a panic into a placeholder result.
fn run_contained(view: View, filtered: &FilteredView) -> AggregateResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| reports::run(view, filtered)))
        .unwrap_or_else(|payload| Err(PipelineError::Panicked(panic_message(payload))));
    match outcome {
        Ok(result) => result,
        Err(err) => {
            warn!("{} pipeline failed: {}", view.name(), err);
            reports::placeholder(view, filtered, &err)
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
