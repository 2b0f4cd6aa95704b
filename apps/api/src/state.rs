use tokio::sync::watch;

use crate::analysis::orchestrator::RelevanceEngine;
use crate::analysis::pool::EvaluationPool;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub engine: RelevanceEngine,
    /// Batch endpoint worker pool; shares the engine above.
    pub pool: EvaluationPool,
    pub config: Config,
    /// Flips to `true` when the server starts shutting down.
    pub shutdown: watch::Receiver<bool>,
}
