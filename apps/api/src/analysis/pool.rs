//! Bounded worker pool for batches of independent evaluations.
//!
//! Every request becomes a task in a `JoinSet`; a semaphore caps how many run
//! at once. Results come back in input order whatever order tasks finish in.

use std::sync::Arc;

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::analysis::errors::{AnalysisError, EvaluationFailure, Stage};
use crate::analysis::models::EvaluationResult;
use crate::analysis::orchestrator::{EvaluationRequest, RelevanceEngine};

pub type EvaluationOutcome = Result<EvaluationResult, EvaluationFailure>;

#[derive(Clone)]
pub struct EvaluationPool {
    engine: RelevanceEngine,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl EvaluationPool {
    pub fn new(engine: RelevanceEngine, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            engine,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub async fn evaluate_all(&self, requests: Vec<EvaluationRequest>) -> Vec<EvaluationOutcome> {
        // The sender lives until this call returns, so shutdown never fires.
        let (_never, shutdown) = watch::channel(false);
        self.evaluate_all_until(requests, shutdown).await
    }

    /// Evaluates every request; once `shutdown` flips to `true`, queued and
    /// in-flight evaluations finish with `Cancelled`.
    pub async fn evaluate_all_until(
        &self,
        requests: Vec<EvaluationRequest>,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<EvaluationOutcome> {
        let total = requests.len();
        let ids: Vec<(String, String)> = requests
            .iter()
            .map(|r| (r.resume_id.clone(), r.jd_id.clone()))
            .collect();

        let mut tasks = JoinSet::new();
        for (idx, request) in requests.into_iter().enumerate() {
            let engine = self.engine.clone();
            let permits = Arc::clone(&self.permits);
            let shutdown = shutdown.clone();

            tasks.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = shutdown_signalled(shutdown.clone()) => None,
                    permit = permits.acquire_owned() => permit.ok(),
                };
                let Some(_permit) = permit else {
                    return (idx, Err(cancelled(&request, Stage::Normalizing)));
                };

                let outcome = engine
                    .evaluate_with_shutdown(&request, shutdown_signalled(shutdown))
                    .await;
                (idx, outcome)
            });
        }

        let mut slots: Vec<Option<EvaluationOutcome>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, outcome)) => slots[idx] = Some(outcome),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => error!(error = %e, "evaluation task ended without a result"),
            }
        }

        let outcomes: Vec<EvaluationOutcome> = slots
            .into_iter()
            .zip(ids)
            .map(|(slot, (resume_id, jd_id))| {
                slot.unwrap_or_else(|| {
                    Err(EvaluationFailure {
                        resume_id,
                        jd_id,
                        stage: Stage::Failed,
                        error: AnalysisError::Cancelled,
                    })
                })
            })
            .collect();

        info!(
            total,
            succeeded = outcomes.iter().filter(|o| o.is_ok()).count(),
            "batch evaluation finished"
        );
        outcomes
    }
}

/// Resolves once the flag is `true`. A dropped sender means shutdown can
/// never be requested, so the future stays pending.
pub async fn shutdown_signalled(mut shutdown: watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn cancelled(request: &EvaluationRequest, stage: Stage) -> EvaluationFailure {
    EvaluationFailure {
        resume_id: request.resume_id.clone(),
        jd_id: request.jd_id.clone(),
        stage,
        error: AnalysisError::Cancelled,
    }
}
