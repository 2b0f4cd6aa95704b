mod analysis;
mod config;
mod errors;
mod narrative;
mod routes;
mod similarity;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::orchestrator::RelevanceEngine;
use crate::analysis::pool::EvaluationPool;
use crate::analysis::scoring_config::ScoringConfig;
use crate::analysis::vocabulary::SkillVocabulary;
use crate::config::Config;
use crate::narrative::{FeedbackProvider, HttpChatClient};
use crate::routes::build_router;
use crate::similarity::{
    EmbeddingSimilarity, HashingEmbedder, HttpEmbeddingClient, SimilarityProvider,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Relevance API v{}", env!("CARGO_PKG_VERSION"));

    // Vocabulary and scoring config are validated once and shared read-only
    let vocabulary = match &config.skill_vocabulary_path {
        Some(path) => SkillVocabulary::from_json_file(path)?,
        None => SkillVocabulary::builtin(),
    };
    info!("Skill vocabulary ready ({} skills)", vocabulary.len());

    let scoring = match &config.scoring_config_path {
        Some(path) => ScoringConfig::from_json_file(path)?,
        None => ScoringConfig::default(),
    };

    let provider = build_provider(&config)?;
    info!("Similarity provider: {}", provider.name());

    let mut engine = RelevanceEngine::new(Arc::new(vocabulary), Arc::new(scoring), provider);
    if let Some(narrator) = build_narrator(&config)? {
        info!("Feedback provider: {}", narrator.name());
        engine = engine.with_feedback_provider(narrator);
    }
    let pool = EvaluationPool::new(engine.clone(), config.max_concurrent_evaluations);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let state = AppState {
        engine,
        pool,
        config: config.clone(),
        shutdown: shutdown_rx,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_ctrl_c().await;
            info!("Shutdown requested; cancelling in-flight evaluations");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    Ok(())
}

/// HTTP embeddings when an endpoint is configured, feature hashing otherwise.
fn build_provider(config: &Config) -> Result<Arc<dyn SimilarityProvider>> {
    match &config.embedding_api_url {
        Some(url) => {
            let client = HttpEmbeddingClient::new(
                url.clone(),
                config.embedding_model.clone(),
                config.embedding_api_key.clone(),
            )?;
            Ok(Arc::new(EmbeddingSimilarity::new(client)))
        }
        None => Ok(Arc::new(EmbeddingSimilarity::new(HashingEmbedder::default()))),
    }
}

/// Narrative feedback only when a chat endpoint is configured.
fn build_narrator(config: &Config) -> Result<Option<Arc<dyn FeedbackProvider>>> {
    let Some(url) = &config.feedback_api_url else {
        return Ok(None);
    };
    let client = HttpChatClient::new(
        url.clone(),
        config.feedback_model.clone(),
        config.feedback_api_key.clone(),
    )?;
    Ok(Some(Arc::new(client)))
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
